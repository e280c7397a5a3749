use super::Dialect;
use crate::query::tree::PartKind;

///
/// Fragment
/// Condition template for one operator in one dialect.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Fragment {
    /// `<column> <op> ?`
    Compare(&'static str),
    /// `<column> >= ? AND <column> <= ?`
    BoundedRange,
    /// `<column> BETWEEN ? AND ?`
    Between,
    /// `<column> IN ?`, the list bound as one value.
    InMarker,
    /// `<column> [NOT] IN (?, ...)`, one marker per element.
    InList { negated: bool },
    /// `<column> <suffix>` with no bound value.
    Suffix(&'static str),
}

/// Lower one operator for a dialect; `None` means the store cannot
/// express it. Every `(Dialect, PartKind)` pair is listed.
pub(super) const fn fragment(
    dialect: Dialect,
    kind: PartKind,
    on_collection: bool,
) -> Option<Fragment> {
    use Dialect::{Cql, Sql};

    match (dialect, kind) {
        (Cql | Sql, PartKind::SimpleProperty) => Some(Fragment::Compare("=")),
        (Cql, PartKind::NegatingSimpleProperty) => None,
        (Sql, PartKind::NegatingSimpleProperty) => Some(Fragment::Compare("<>")),

        (Cql | Sql, PartKind::LessThan | PartKind::Before) => Some(Fragment::Compare("<")),
        (Cql | Sql, PartKind::LessThanEqual) => Some(Fragment::Compare("<=")),
        (Cql | Sql, PartKind::GreaterThan | PartKind::After) => Some(Fragment::Compare(">")),
        (Cql | Sql, PartKind::GreaterThanEqual) => Some(Fragment::Compare(">=")),
        (Cql, PartKind::Between) => Some(Fragment::BoundedRange),
        (Sql, PartKind::Between) => Some(Fragment::Between),

        (Cql | Sql, PartKind::Like | PartKind::StartingWith | PartKind::EndingWith) => {
            Some(Fragment::Compare("LIKE"))
        }
        (Cql, PartKind::NotLike) => None,
        (Sql, PartKind::NotLike) => Some(Fragment::Compare("NOT LIKE")),

        (Cql, PartKind::Containing) => {
            if on_collection {
                Some(Fragment::Compare("CONTAINS"))
            } else {
                Some(Fragment::Compare("LIKE"))
            }
        }
        (Sql, PartKind::Containing) => {
            if on_collection {
                None
            } else {
                Some(Fragment::Compare("LIKE"))
            }
        }
        (Cql, PartKind::NotContaining) => None,
        (Sql, PartKind::NotContaining) => {
            if on_collection {
                None
            } else {
                Some(Fragment::Compare("NOT LIKE"))
            }
        }

        (Cql, PartKind::In) => Some(Fragment::InMarker),
        (Sql, PartKind::In) => Some(Fragment::InList { negated: false }),
        (Cql, PartKind::NotIn) => None,
        (Sql, PartKind::NotIn) => Some(Fragment::InList { negated: true }),

        (Cql, PartKind::IsNull | PartKind::IsNotNull | PartKind::Exists) => None,
        (Sql, PartKind::IsNull) => Some(Fragment::Suffix("IS NULL")),
        (Sql, PartKind::IsNotNull | PartKind::Exists) => Some(Fragment::Suffix("IS NOT NULL")),

        (Cql, PartKind::IsEmpty | PartKind::IsNotEmpty) => None,
        (Sql, PartKind::IsEmpty) => {
            if on_collection {
                None
            } else {
                Some(Fragment::Suffix("= ''"))
            }
        }
        (Sql, PartKind::IsNotEmpty) => {
            if on_collection {
                None
            } else {
                Some(Fragment::Suffix("<> ''"))
            }
        }

        (Cql | Sql, PartKind::Regex) => None,

        (Cql, PartKind::True) => Some(Fragment::Suffix("= true")),
        (Cql, PartKind::False) => Some(Fragment::Suffix("= false")),
        (Sql, PartKind::True) => Some(Fragment::Suffix("= TRUE")),
        (Sql, PartKind::False) => Some(Fragment::Suffix("= FALSE")),
    }
}

/// Quote an identifier unless it is a plain lowercase name.
pub(super) fn quote_ident(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|first| first.is_ascii_lowercase() || first == '_')
        && chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_');

    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
