use crate::{
    path::{PropertyPath, PropertyReferenceError, decapitalize},
    types::TypeInfo,
};
use serde::Serialize;
use std::fmt;

///
/// PartType
///
/// Operator of one parsed predicate fragment, detected from the keyword
/// suffix of a clause. The enum itself is sorted; `DETECTION_ORDER` is the
/// semantic priority list.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum PartType {
    Between,
    Equal,
    GreaterThan,
    IsNotNull,
    IsNull,
    LessThan,
    Like,
    NotEqual,
    NotLike,
}

impl PartType {
    /// Detection priority. Listed explicitly because the order matters:
    /// IsNotNull and IsNull must be tested before the rest since their
    /// keywords are suffixes other clauses could end in, and NotLike must
    /// precede Like and NotEqual. Equal is the fallback and never tested.
    pub const DETECTION_ORDER: [Self; 8] = [
        Self::IsNotNull,
        Self::IsNull,
        Self::Between,
        Self::LessThan,
        Self::GreaterThan,
        Self::NotLike,
        Self::Like,
        Self::NotEqual,
    ];

    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Between => &["Between"],
            Self::Equal => &[],
            Self::GreaterThan => &["GreaterThan"],
            Self::IsNotNull => &["IsNotNull", "NotNull"],
            Self::IsNull => &["IsNull", "Null"],
            Self::LessThan => &["LessThan"],
            Self::Like => &["Like"],
            Self::NotEqual => &["Not"],
            Self::NotLike => &["NotLike"],
        }
    }

    /// How many method arguments the operator binds.
    #[must_use]
    pub const fn number_of_arguments(self) -> usize {
        match self {
            Self::Between => 2,
            Self::IsNotNull | Self::IsNull => 0,
            _ => 1,
        }
    }

    /// Native operator token, where one exists.
    #[must_use]
    pub const fn operator(self) -> Option<&'static str> {
        match self {
            Self::Between | Self::IsNotNull | Self::IsNull => None,
            Self::Equal => Some("="),
            Self::GreaterThan => Some(">"),
            Self::LessThan => Some("<"),
            Self::Like => Some("like"),
            Self::NotEqual => Some("<>"),
            Self::NotLike => Some("not like"),
        }
    }

    /// Detect the operator for a raw clause. A keyword match is rejected
    /// when the clause, taken as a literal property of the domain type,
    /// already resolves; `Equal` is the fallback.
    #[must_use]
    pub fn from_property(raw: &str, root: &TypeInfo) -> Self {
        Self::DETECTION_ORDER
            .into_iter()
            .find(|t| t.supports(raw, root))
            .unwrap_or(Self::Equal)
    }

    fn supports(self, raw: &str, root: &TypeInfo) -> bool {
        if root.has_property(raw) {
            return false;
        }

        self.keywords().iter().any(|keyword| ends_with(raw, keyword))
    }

    /// Strip the matched keyword suffix to obtain the raw property token.
    #[must_use]
    pub fn extract_property(self, raw: &str) -> String {
        let candidate = decapitalize(raw);

        for keyword in self.keywords() {
            if ends_with(&candidate, keyword) {
                return candidate[..candidate.len() - keyword.len()].to_string();
            }
        }

        candidate
    }
}

fn ends_with(source: &str, keyword: &str) -> bool {
    source.len() >= keyword.len()
        && source[source.len() - keyword.len()..].eq_ignore_ascii_case(keyword)
}

///
/// Part
///
/// One parsed predicate fragment: the detected operator and the property
/// path it applies to. Immutable once created.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Part {
    property: PropertyPath,
    part_type: PartType,
}

impl Part {
    /// Parse one clause against the domain type. Property resolution
    /// failures surface the underlying reference error and are fatal for
    /// the declaring method.
    pub fn new(source: &str, root: &TypeInfo) -> Result<Self, PropertyReferenceError> {
        let part_type = PartType::from_property(source, root);
        let token = part_type.extract_property(source);
        let property = PropertyPath::from(&token, root)?;

        Ok(Self {
            property,
            part_type,
        })
    }

    #[must_use]
    pub const fn property(&self) -> &PropertyPath {
        &self.property
    }

    #[must_use]
    pub const fn part_type(&self) -> PartType {
        self.part_type
    }

    #[must_use]
    pub const fn number_of_arguments(&self) -> usize {
        self.part_type.number_of_arguments()
    }

    #[must_use]
    pub const fn parameter_required(&self) -> bool {
        self.number_of_arguments() > 0
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.property, self.part_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeDef, TypeRef, TypeRegistry};
    use std::sync::Arc;

    fn registry() -> Arc<TypeRegistry> {
        let registry = TypeRegistry::new();
        registry
            .register(
                TypeDef::builder("Person")
                    .field("name", TypeRef::text())
                    .field("age", TypeRef::int())
                    .field("is_null", TypeRef::bool())
                    .build(),
            )
            .expect("register Person");
        registry
    }

    fn person() -> TypeInfo {
        registry().resolve("Person").expect("resolve Person")
    }

    #[test]
    fn detects_null_checks_before_shorter_suffixes() {
        let root = person();

        let part = Part::new("NameIsNotNull", &root).expect("parse");
        assert_eq!(part.part_type(), PartType::IsNotNull);
        assert_eq!(part.property().to_dot_path(), "name");
        assert_eq!(part.number_of_arguments(), 0);

        let part = Part::new("NameIsNull", &root).expect("parse");
        assert_eq!(part.part_type(), PartType::IsNull);
        assert_eq!(part.property().to_dot_path(), "name");
    }

    #[test]
    fn detects_range_and_comparison_operators() {
        let root = person();

        let between = Part::new("AgeBetween", &root).expect("parse");
        assert_eq!(between.part_type(), PartType::Between);
        assert_eq!(between.property().to_dot_path(), "age");
        assert_eq!(between.number_of_arguments(), 2);

        let less = Part::new("AgeLessThan", &root).expect("parse");
        assert_eq!(less.part_type(), PartType::LessThan);
        assert_eq!(less.number_of_arguments(), 1);

        let greater = Part::new("AgeGreaterThan", &root).expect("parse");
        assert_eq!(greater.part_type(), PartType::GreaterThan);
    }

    #[test]
    fn not_like_wins_over_like_and_not() {
        let root = person();

        let part = Part::new("NameNotLike", &root).expect("parse");
        assert_eq!(part.part_type(), PartType::NotLike);
        assert_eq!(part.property().to_dot_path(), "name");

        let part = Part::new("NameLike", &root).expect("parse");
        assert_eq!(part.part_type(), PartType::Like);

        let part = Part::new("NameNot", &root).expect("parse");
        assert_eq!(part.part_type(), PartType::NotEqual);
        assert_eq!(part.property().to_dot_path(), "name");
    }

    #[test]
    fn plain_clause_falls_back_to_equality() {
        let part = Part::new("Name", &person()).expect("parse");
        assert_eq!(part.part_type(), PartType::Equal);
        assert_eq!(part.number_of_arguments(), 1);
        assert!(part.parameter_required());
    }

    #[test]
    fn literal_property_named_like_a_keyword_is_not_an_operator() {
        // The type declares `is_null`, so the whole clause resolves as a
        // property and must not be parsed as the IsNull operator.
        let part = Part::new("IsNull", &person()).expect("parse");
        assert_eq!(part.part_type(), PartType::Equal);
        assert_eq!(part.property().to_dot_path(), "is_null");
        assert_eq!(part.number_of_arguments(), 1);
    }

    #[test]
    fn unresolvable_property_token_is_fatal() {
        let err = Part::new("NicknameIsNull", &person()).expect_err("unknown property");
        assert_eq!(err.property, "nickname");
        assert_eq!(err.ty, "Person");
    }

    #[test]
    fn argument_counts_are_fixed_per_operator() {
        assert_eq!(PartType::Between.number_of_arguments(), 2);
        assert_eq!(PartType::IsNull.number_of_arguments(), 0);
        assert_eq!(PartType::IsNotNull.number_of_arguments(), 0);
        assert_eq!(PartType::Equal.number_of_arguments(), 1);
        assert_eq!(PartType::NotLike.number_of_arguments(), 1);
    }
}
