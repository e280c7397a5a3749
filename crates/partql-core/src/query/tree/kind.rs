use crate::model::FieldKind;
use serde::Serialize;
use std::fmt;

///
/// PartKind
///
/// Comparison operator of one predicate part, selected by the keyword
/// suffix of the part text. `ALL` is the matching priority: longer and
/// negated keywords come before the keywords they end with.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum PartKind {
    Between,
    IsNotNull,
    IsNull,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Before,
    After,
    NotLike,
    Like,
    StartingWith,
    EndingWith,
    IsNotEmpty,
    IsEmpty,
    NotContaining,
    Containing,
    NotIn,
    In,
    Regex,
    Exists,
    True,
    False,
    NegatingSimpleProperty,
    SimpleProperty,
}

impl PartKind {
    /// Keyword matching priority.
    pub const ALL: [Self; 25] = [
        Self::IsNotNull,
        Self::IsNull,
        Self::Between,
        Self::LessThan,
        Self::LessThanEqual,
        Self::GreaterThan,
        Self::GreaterThanEqual,
        Self::Before,
        Self::After,
        Self::NotLike,
        Self::Like,
        Self::StartingWith,
        Self::EndingWith,
        Self::IsNotEmpty,
        Self::IsEmpty,
        Self::NotContaining,
        Self::Containing,
        Self::NotIn,
        Self::In,
        Self::Regex,
        Self::Exists,
        Self::True,
        Self::False,
        Self::NegatingSimpleProperty,
        Self::SimpleProperty,
    ];

    /// Suffix keywords, longest spelling first.
    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Between => &["IsBetween", "Between"],
            Self::IsNotNull => &["IsNotNull", "NotNull"],
            Self::IsNull => &["IsNull", "Null"],
            Self::LessThan => &["IsLessThan", "LessThan"],
            Self::LessThanEqual => &["IsLessThanEqual", "LessThanEqual"],
            Self::GreaterThan => &["IsGreaterThan", "GreaterThan"],
            Self::GreaterThanEqual => &["IsGreaterThanEqual", "GreaterThanEqual"],
            Self::Before => &["IsBefore", "Before"],
            Self::After => &["IsAfter", "After"],
            Self::NotLike => &["IsNotLike", "NotLike"],
            Self::Like => &["IsLike", "Like"],
            Self::StartingWith => &["IsStartingWith", "StartingWith", "StartsWith"],
            Self::EndingWith => &["IsEndingWith", "EndingWith", "EndsWith"],
            Self::IsNotEmpty => &["IsNotEmpty", "NotEmpty"],
            Self::IsEmpty => &["IsEmpty", "Empty"],
            Self::NotContaining => &["IsNotContaining", "NotContaining", "NotContains"],
            Self::Containing => &["IsContaining", "Containing", "Contains"],
            Self::NotIn => &["IsNotIn", "NotIn"],
            Self::In => &["IsIn", "In"],
            Self::Regex => &["MatchesRegex", "Matches", "Regex"],
            Self::Exists => &["Exists"],
            Self::True => &["IsTrue", "True"],
            Self::False => &["IsFalse", "False"],
            Self::NegatingSimpleProperty => &["IsNot", "Not"],
            Self::SimpleProperty => &["Is", "Equals", "Equal"],
        }
    }

    /// Number of call arguments this part consumes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Between => 2,
            Self::IsNotNull
            | Self::IsNull
            | Self::IsNotEmpty
            | Self::IsEmpty
            | Self::Exists
            | Self::True
            | Self::False => 0,
            _ => 1,
        }
    }

    /// Return true when a case-insensitive variant of this operator exists.
    #[must_use]
    pub const fn supports_ignore_case(self) -> bool {
        matches!(
            self,
            Self::SimpleProperty
                | Self::NegatingSimpleProperty
                | Self::Like
                | Self::NotLike
                | Self::StartingWith
                | Self::EndingWith
                | Self::Containing
                | Self::NotContaining
                | Self::In
                | Self::NotIn
        )
    }

    /// Operator/type compatibility gate applied at parse time.
    #[must_use]
    pub fn supports(self, kind: &FieldKind) -> bool {
        if kind.embedded_entity().is_some() {
            return false;
        }

        match self {
            Self::Between
            | Self::LessThan
            | Self::LessThanEqual
            | Self::GreaterThan
            | Self::GreaterThanEqual
            | Self::Before
            | Self::After => kind.is_orderable(),
            Self::Like | Self::NotLike | Self::StartingWith | Self::EndingWith | Self::Regex => {
                kind.is_text()
            }
            Self::Containing | Self::NotContaining | Self::IsEmpty | Self::IsNotEmpty => {
                kind.is_text() || kind.is_collection()
            }
            Self::True | Self::False => kind.is_bool(),
            Self::In | Self::NotIn => kind.is_scalar(),
            Self::SimpleProperty
            | Self::NegatingSimpleProperty
            | Self::IsNull
            | Self::IsNotNull
            | Self::Exists => true,
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SimpleProperty => "Equals",
            Self::NegatingSimpleProperty => "Not",
            Self::IsNull => "IsNull",
            Self::IsNotNull => "IsNotNull",
            Self::IsEmpty => "IsEmpty",
            Self::IsNotEmpty => "IsNotEmpty",
            other => other.keywords().last().copied().unwrap_or("?"),
        };

        f.write_str(label)
    }
}
