use crate::{path::PropertyReferenceError, query::part::Part, types::TypeInfo};
use derive_more::Deref;
use thiserror::Error as ThisError;

///
/// PartParseError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PartParseError {
    #[error("empty predicate clause in '{0}'")]
    EmptyClause(String),

    #[error(transparent)]
    Property(#[from] PropertyReferenceError),
}

///
/// OrGroup
///
/// One or-branch of the predicate: its parts combine conjunctively.
///

#[derive(Clone, Debug, Deref, Eq, PartialEq)]
pub struct OrGroup {
    #[deref]
    parts: Vec<Part>,
}

impl OrGroup {
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }
}

impl<'a> IntoIterator for &'a OrGroup {
    type Item = &'a Part;
    type IntoIter = std::slice::Iter<'a, Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

///
/// Parts
///
/// Ordered parse of a method name's predicate-bearing suffix (the leading
/// query intent such as "findBy" is the caller's concern). The suffix is
/// split on `Or`, then on `And`, and each clause becomes one `Part`. A
/// separator only counts when followed by an uppercase character, so
/// properties like `order` never split.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parts {
    groups: Vec<OrGroup>,
}

impl Parts {
    pub fn parse(predicate: &str, root: &TypeInfo) -> Result<Self, PartParseError> {
        let mut groups = Vec::new();

        for or_chunk in split_keyword(predicate, "Or") {
            let mut parts = Vec::new();
            for clause in split_keyword(or_chunk, "And") {
                if clause.is_empty() {
                    return Err(PartParseError::EmptyClause(predicate.to_string()));
                }
                parts.push(Part::new(clause, root)?);
            }
            groups.push(OrGroup { parts });
        }

        Ok(Self { groups })
    }

    /// Or-branches in source order.
    #[must_use]
    pub fn groups(&self) -> &[OrGroup] {
        &self.groups
    }

    /// All parts, flattened in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.groups.iter().flat_map(|group| group.parts.iter())
    }

    #[must_use]
    pub fn number_of_parts(&self) -> usize {
        self.groups.iter().map(|group| group.parts.len()).sum()
    }

    /// Total method arguments bound across all parts; the method must
    /// declare exactly this many bindable parameters.
    #[must_use]
    pub fn number_of_arguments(&self) -> usize {
        self.iter().map(Part::number_of_arguments).sum()
    }
}

/// Split on a separator keyword, honoring it only when it is followed by
/// an uppercase character or ends the source (the latter yields an empty
/// clause, reported by the caller).
fn split_keyword<'a>(source: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut scan = 0;

    while let Some(found) = source[scan..].find(keyword) {
        let at = scan + found;
        let after = at + keyword.len();
        let splits = source[after..]
            .chars()
            .next()
            .is_none_or(char::is_uppercase);

        if splits {
            chunks.push(&source[start..at]);
            start = after;
            scan = after;
        } else {
            scan = at + 1;
        }
    }

    chunks.push(&source[start..]);
    chunks
}
