use super::{
    Order, OrderDirection, OrPart, Part, PartKind, PartTree, QueryAction, Sort, Subject,
};
use crate::model::{EntityModel, FieldKind, MappingContext, PropertyPath};
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

const VERBS: [(&str, QueryAction); 10] = [
    ("find", QueryAction::Find),
    ("read", QueryAction::Find),
    ("get", QueryAction::Find),
    ("query", QueryAction::Find),
    ("search", QueryAction::Find),
    ("stream", QueryAction::Find),
    ("count", QueryAction::Count),
    ("exists", QueryAction::Exists),
    ("delete", QueryAction::Delete),
    ("remove", QueryAction::Delete),
];

const ORDER_BY: &str = "OrderBy";
const ALL_IGNORE_CASE: [&str; 2] = ["AllIgnoreCase", "AllIgnoringCase"];
const IGNORE_CASE: [&str; 2] = ["IgnoreCase", "IgnoringCase"];

///
/// ParseError
///
/// Grammar and schema violations in an operation signature. These are
/// programming defects in the signature itself and never depend on
/// call-time input.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParseError {
    #[error("unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error("entity '{entity}' is embeddable and cannot be queried directly")]
    NotQueryable { entity: String },

    #[error(
        "'{name}' does not start with a query verb (find, read, get, query, search, stream, count, exists, delete, remove)"
    )]
    MissingPrefix { name: String },

    #[error("empty predicate part in '{segment}'")]
    EmptyPart { segment: String },

    #[error("no property '{path}' found on entity '{entity}'")]
    UnresolvedProperty { entity: String, path: String },

    #[error("operator {operator} is not supported for property '{property}' of kind {kind}")]
    IncompatibleOperator {
        property: PropertyPath,
        operator: PartKind,
        kind: FieldKind,
    },

    #[error("ignore-case is not supported for {operator} on property '{property}' of kind {kind}")]
    IgnoreCaseUnsupported {
        property: PropertyPath,
        operator: PartKind,
        kind: FieldKind,
    },

    #[error("property '{property}' of kind {kind} cannot be used for ordering")]
    UnorderableProperty {
        property: PropertyPath,
        kind: FieldKind,
    },

    #[error("'OrderBy' must not be used more than once in '{name}'")]
    DuplicateOrderBy { name: String },

    #[error("'OrderBy' must be followed by at least one property in '{name}'")]
    EmptyOrderBy { name: String },

    #[error("result limit in subject '{subject}' is not a valid count")]
    InvalidLimit { subject: String },

    #[error("'{keyword}' is not allowed on {action} queries")]
    SubjectNotAllowed {
        action: QueryAction,
        keyword: &'static str,
    },
}

/// Parse one operation signature into a predicate tree.
pub(super) fn parse_tree(
    context: &MappingContext,
    entity: &str,
    source: &str,
) -> Result<PartTree, ParseError> {
    let model = context
        .entity(entity)
        .map_err(|_| ParseError::UnknownEntity {
            entity: entity.to_string(),
        })?;
    if model.is_embeddable() {
        return Err(ParseError::NotQueryable {
            entity: entity.to_string(),
        });
    }
    let resolver = PathResolver { context, model };

    let (action, rest) = split_verb(source)?;
    let (subject_text, body) = split_subject(rest);
    let subject = parse_subject(action, subject_text)?;

    let (criteria, order_text) = split_order_by(source, body)?;
    let (criteria, all_ignore_case) = strip_any_suffix(criteria, &ALL_IGNORE_CASE);

    let predicate = parse_predicate(&resolver, criteria, all_ignore_case)?;
    let sort = match order_text {
        Some(text) => parse_order(&resolver, source, text)?,
        None => Sort::unsorted(),
    };

    Ok(PartTree {
        source: source.to_string(),
        entity: entity.to_string(),
        subject,
        predicate,
        sort,
    })
}

// Match the leading verb; the verb must be followed by the end of the name,
// an uppercase letter, or `By`.
fn split_verb(source: &str) -> Result<(QueryAction, &str), ParseError> {
    for (verb, action) in VERBS {
        if let Some(rest) = source.strip_prefix(verb)
            && (rest.is_empty() || starts_upper(rest))
        {
            return Ok((action, rest));
        }
    }

    Err(ParseError::MissingPrefix {
        name: source.to_string(),
    })
}

// Split `<Subject>By<Body>` at the first `By`; names without `By` have an
// empty body (`findAll`, `count`). A first `By` that belongs to `OrderBy`
// leaves the ordering clause in the body (`findAllOrderByAge`).
fn split_subject(rest: &str) -> (&str, &str) {
    match rest.find("By") {
        Some(index) if rest[..index].ends_with("Order") => {
            let order_start = index - "Order".len();
            (&rest[..order_start], &rest[order_start..])
        }
        Some(index) => (&rest[..index], &rest[index + 2..]),
        None => (rest, ""),
    }
}

fn parse_subject(action: QueryAction, subject: &str) -> Result<Subject, ParseError> {
    let distinct = subject.contains("Distinct");
    let max_results = parse_limit(subject)?;

    if max_results.is_some() && action != QueryAction::Find {
        return Err(ParseError::SubjectNotAllowed {
            action,
            keyword: "First/Top",
        });
    }
    if distinct && action != QueryAction::Find {
        return Err(ParseError::SubjectNotAllowed {
            action,
            keyword: "Distinct",
        });
    }

    Ok(Subject {
        action,
        distinct,
        max_results,
    })
}

// `First` / `Top` optionally followed by digits; no digits means one row.
fn parse_limit(subject: &str) -> Result<Option<u32>, ParseError> {
    let Some((index, keyword)) = ["First", "Top"]
        .into_iter()
        .filter_map(|keyword| subject.find(keyword).map(|index| (index, keyword)))
        .min_by_key(|(index, _)| *index)
    else {
        return Ok(None);
    };

    let after = &subject[index + keyword.len()..];
    let digits: &str = &after[..after
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(after.len())];

    if digits.is_empty() {
        return Ok(Some(1));
    }

    digits
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ParseError::InvalidLimit {
            subject: subject.to_string(),
        })
}

fn split_order_by<'a>(
    source: &str,
    body: &'a str,
) -> Result<(&'a str, Option<&'a str>), ParseError> {
    let mut pieces = split_keyword(body, ORDER_BY);
    if body.ends_with(ORDER_BY) {
        return Err(ParseError::EmptyOrderBy {
            name: source.to_string(),
        });
    }

    match pieces.len() {
        1 => Ok((pieces.remove(0), None)),
        2 => {
            let order = pieces.remove(1);
            Ok((pieces.remove(0), Some(order)))
        }
        _ => Err(ParseError::DuplicateOrderBy {
            name: source.to_string(),
        }),
    }
}

fn parse_predicate(
    resolver: &PathResolver<'_>,
    criteria: &str,
    all_ignore_case: bool,
) -> Result<Vec<OrPart>, ParseError> {
    if criteria.is_empty() {
        return Ok(Vec::new());
    }

    split_keyword(criteria, "Or")
        .into_iter()
        .map(|or_text| {
            if or_text.is_empty() {
                return Err(ParseError::EmptyPart {
                    segment: criteria.to_string(),
                });
            }

            split_keyword(or_text, "And")
                .into_iter()
                .map(|part_text| {
                    if part_text.is_empty() {
                        return Err(ParseError::EmptyPart {
                            segment: or_text.to_string(),
                        });
                    }
                    parse_part(resolver, part_text, all_ignore_case)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(OrPart::new)
        })
        .collect()
}

fn parse_part(
    resolver: &PathResolver<'_>,
    text: &str,
    all_ignore_case: bool,
) -> Result<Part, ParseError> {
    let (text, explicit_ignore_case) = strip_any_suffix(text, &IGNORE_CASE);

    // Candidates in keyword priority order; the first whose remaining text
    // names a property wins. The bare text as an equality is the fallback.
    let candidates = PartKind::ALL
        .into_iter()
        .flat_map(|kind| kind.keywords().iter().map(move |keyword| (kind, *keyword)))
        .filter_map(|(kind, keyword)| {
            text.strip_suffix(keyword)
                .filter(|property| !property.is_empty())
                .map(|property| (kind, property))
        })
        .chain(std::iter::once((PartKind::SimpleProperty, text)));

    let mut first_unresolved = None;
    for (kind, property_text) in candidates {
        let Some((property, property_kind)) = resolver.resolve(property_text) else {
            first_unresolved.get_or_insert(property_text);
            continue;
        };

        if !kind.supports(&property_kind) {
            return Err(ParseError::IncompatibleOperator {
                property,
                operator: kind,
                kind: property_kind,
            });
        }

        let ignore_case = if explicit_ignore_case {
            if !(kind.supports_ignore_case() && property_kind.is_text()) {
                return Err(ParseError::IgnoreCaseUnsupported {
                    property,
                    operator: kind,
                    kind: property_kind,
                });
            }
            true
        } else {
            all_ignore_case && kind.supports_ignore_case() && property_kind.is_text()
        };

        return Ok(Part {
            property,
            kind,
            property_kind,
            ignore_case,
        });
    }

    Err(ParseError::UnresolvedProperty {
        entity: resolver.model.name.clone(),
        path: uncapitalize(first_unresolved.unwrap_or(text)),
    })
}

fn parse_order(
    resolver: &PathResolver<'_>,
    source: &str,
    text: &str,
) -> Result<Sort, ParseError> {
    let mut orders = Vec::new();

    for term in split_after_direction(text) {
        let (property_text, direction) = if let Some(property) = term.strip_suffix("Desc") {
            (property, OrderDirection::Desc)
        } else if let Some(property) = term.strip_suffix("Asc") {
            (property, OrderDirection::Asc)
        } else {
            (term, OrderDirection::Asc)
        };

        if property_text.is_empty() {
            return Err(ParseError::EmptyOrderBy {
                name: source.to_string(),
            });
        }

        let (property, kind) =
            resolver
                .resolve(property_text)
                .ok_or_else(|| ParseError::UnresolvedProperty {
                    entity: resolver.model.name.clone(),
                    path: uncapitalize(property_text),
                })?;
        if !kind.is_scalar() {
            return Err(ParseError::UnorderableProperty { property, kind });
        }

        orders.push(Order {
            property,
            direction,
        });
    }

    Ok(Sort::new(orders))
}

///
/// PathResolver
///
/// Resolves camel-case property expressions against an entity, descending
/// into embedded entities. The whole expression is tried first; otherwise
/// it is split at camel-case boundaries from the right (longest head
/// first). `_` forces a split.
///

struct PathResolver<'a> {
    context: &'a MappingContext,
    model: &'a EntityModel,
}

impl PathResolver<'_> {
    fn resolve(&self, text: &str) -> Option<(PropertyPath, FieldKind)> {
        let segments = self.resolve_in(self.model, text)?;
        let path = PropertyPath::new(segments);
        let field = self.context.field_for_path(&self.model.name, &path).ok()?;

        Some((path, field.kind.clone()))
    }

    fn resolve_in(&self, model: &EntityModel, text: &str) -> Option<Vec<String>> {
        match text.split_once('_') {
            Some((head, tail)) if !head.is_empty() && !tail.is_empty() => {
                let mut segments = self.resolve_camel(model, head)?;
                let nested = self.nested_of(model, &segments)?;
                segments.extend(self.resolve_in(nested, tail)?);
                Some(segments)
            }
            Some(_) => None,
            None => self.resolve_camel(model, text),
        }
    }

    fn resolve_camel(&self, model: &EntityModel, text: &str) -> Option<Vec<String>> {
        let name = uncapitalize(text);
        if model.get_field(&name).is_some() {
            return Some(vec![name]);
        }

        let boundaries: Vec<usize> = text
            .char_indices()
            .skip(1)
            .filter(|(_, ch)| ch.is_uppercase())
            .map(|(index, _)| index)
            .collect();

        for index in boundaries.into_iter().rev() {
            let head = uncapitalize(&text[..index]);
            let Some(field) = model.get_field(&head) else {
                continue;
            };
            let Some(target) = field.kind.embedded_entity() else {
                continue;
            };
            let Ok(nested) = self.context.entity(target) else {
                continue;
            };
            if let Some(tail) = self.resolve_camel(nested, &text[index..]) {
                let mut segments = vec![head];
                segments.extend(tail);
                return Some(segments);
            }
        }

        None
    }

    // Entity embedded at the end of `segments`, relative to `model`.
    fn nested_of<'m>(
        &'m self,
        model: &'m EntityModel,
        segments: &[String],
    ) -> Option<&'m EntityModel> {
        let mut current = model;
        for segment in segments {
            let target = current.get_field(segment)?.kind.embedded_entity()?;
            current = self.context.entity(target).ok()?;
        }

        Some(current)
    }
}

///
/// TEXT HELPERS
///

fn starts_upper(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

// Bean-style decapitalization: `LastName` -> `lastName`, `URL` stays `URL`.
fn uncapitalize(text: &str) -> String {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if chars.next().is_some_and(char::is_uppercase) {
        return text.to_string();
    }

    first.to_lowercase().chain(text[first.len_utf8()..].chars()).collect()
}

fn strip_any_suffix<'a>(text: &'a str, suffixes: &[&str]) -> (&'a str, bool) {
    suffixes
        .iter()
        .find_map(|suffix| text.strip_suffix(suffix))
        .map_or((text, false), |stripped| (stripped, true))
}

// Split on `keyword` wherever it is directly followed by an uppercase
// letter (or any non-ASCII character), so `Or` inside `Order` is kept.
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut search = 0;

    while let Some(offset) = text[search..].find(keyword) {
        let index = search + offset;
        let after = &text[index + keyword.len()..];
        let boundary = after
            .chars()
            .next()
            .is_some_and(|ch| ch.is_uppercase() || !ch.is_ascii());

        if boundary {
            pieces.push(&text[start..index]);
            start = index + keyword.len();
        }
        search = index + keyword.len();
    }
    pieces.push(&text[start..]);

    pieces
}

// Split ordering text after each `Asc` / `Desc` that precedes an
// uppercase letter: `AgeDescLastName` -> [`AgeDesc`, `LastName`].
fn split_after_direction(text: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut start = 0;

    for (index, _) in text.char_indices() {
        for direction in ["Asc", "Desc"] {
            let end = index + direction.len();
            if text[index..].starts_with(direction) && starts_upper(&text[end..]) {
                terms.push(&text[start..end]);
                start = end;
            }
        }
    }
    terms.push(&text[start..]);

    terms
}
