use crate::types::{PropertyHit, TypeInfo};
use std::fmt;
use thiserror::Error as ThisError;

///
/// PropertyReferenceError
///
/// Raised when a path segment cannot be matched against the declared
/// properties reachable from its context type. Carries the deepest resolved
/// prefix so callers can distinguish "not a property of this domain type"
/// from a broken declared query method.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("no property '{property}' found for type '{ty}'")]
pub struct PropertyReferenceError {
    /// The segment that failed to resolve (decapitalized source spelling).
    pub property: String,
    /// Name of the type the segment was looked up on.
    pub ty: String,
    /// Declared names of the longest successfully resolved prefix.
    pub base: Vec<String>,
}

impl PropertyReferenceError {
    /// Dotted rendering of the resolved prefix, empty when nothing resolved.
    #[must_use]
    pub fn base_path(&self) -> String {
        self.base.join(".")
    }
}

///
/// PathSegment
///
/// One resolved hop: the declared property name, its declared type (when a
/// binding is available) and whether the hop traverses a collection.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathSegment {
    name: String,
    info: Option<TypeInfo>,
    collection: bool,
}

impl PathSegment {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn type_info(&self) -> Option<&TypeInfo> {
        self.info.as_ref()
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.collection
    }
}

///
/// PropertyPath
///
/// Resolved traversal chain rooted at a domain type. Construction is the
/// longest-prefix-first algorithm: the whole token is tried as a single
/// property before camel-case boundaries are split right-to-left, so a
/// literal `address_zip` field always wins over the nested `address`.`zip`
/// decomposition. `.` and `_` act as hard segment separators once the
/// whole-token match has failed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyPath {
    root: TypeInfo,
    segments: Vec<PathSegment>,
}

/// Candidate failure during backtracking; the deepest one wins so the
/// error names the actual unresolvable segment, not an earlier retry.
struct Failure {
    depth: usize,
    property: String,
    ty: String,
    prefix: Vec<String>,
}

impl PropertyPath {
    /// Resolve a dotted or camel-case path against a root type.
    pub fn from(source: &str, root: &TypeInfo) -> Result<Self, PropertyReferenceError> {
        if source.trim().is_empty() {
            return Err(PropertyReferenceError {
                property: source.to_string(),
                ty: root.name(),
                base: Vec::new(),
            });
        }

        let mut segments: Vec<PathSegment> = Vec::new();
        let mut current = Some(root.clone());

        for chunk in source.split('.') {
            let resolved: Vec<String> = segments.iter().map(|s| s.name.clone()).collect();

            if chunk.is_empty() {
                return Err(PropertyReferenceError {
                    property: decapitalize(source),
                    ty: root.name(),
                    base: resolved,
                });
            }

            let Some(ty) = current else {
                return Err(PropertyReferenceError {
                    property: decapitalize(chunk),
                    ty: "<unresolved>".to_string(),
                    base: resolved,
                });
            };

            match resolve_chunk(chunk, &ty) {
                Ok(chain) => {
                    segments.extend(chain);
                    current = segments
                        .last()
                        .and_then(|s| s.info.as_ref())
                        .and_then(TypeInfo::actual_type);
                }
                Err(failure) => {
                    let mut base = resolved;
                    base.extend(failure.prefix);
                    return Err(PropertyReferenceError {
                        property: failure.property,
                        ty: failure.ty,
                        base,
                    });
                }
            }
        }

        Ok(Self {
            root: root.clone(),
            segments,
        })
    }

    #[must_use]
    pub const fn root_type(&self) -> &TypeInfo {
        &self.root
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Terminal segment. Paths always hold at least one segment.
    #[must_use]
    pub fn leaf(&self) -> &PathSegment {
        &self.segments[self.segments.len() - 1]
    }

    /// Declared type of the terminal segment, when a binding is available.
    #[must_use]
    pub fn leaf_type(&self) -> Option<TypeInfo> {
        self.leaf().info.clone()
    }

    /// Whether any hop traverses a collection or array.
    #[must_use]
    pub fn is_collection_traversal(&self) -> bool {
        self.segments.iter().any(|s| s.collection)
    }

    /// Canonical dotted rendering using declared property names.
    #[must_use]
    pub fn to_dot_path(&self) -> String {
        let names: Vec<&str> = self.segments.iter().map(|s| s.name.as_str()).collect();
        names.join(".")
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dot_path())
    }
}

fn segment_from(hit: PropertyHit) -> PathSegment {
    let collection = hit.info.as_ref().is_some_and(TypeInfo::is_collection_like);
    PathSegment {
        name: hit.name,
        info: hit.info,
        collection,
    }
}

/// Resolve one `.`-free chunk against a context type.
fn resolve_chunk(chunk: &str, ty: &TypeInfo) -> Result<Vec<PathSegment>, Failure> {
    // Leading separator noise carries no head token.
    if let Some(stripped) = chunk.strip_prefix('_') {
        if stripped.is_empty() {
            return Err(default_failure(chunk, ty));
        }
        return resolve_chunk(stripped, ty);
    }

    // 1. The whole token as a single property wins over any decomposition.
    if let Some(hit) = ty.field(chunk) {
        return Ok(vec![segment_from(hit)]);
    }

    // 2. An explicit '_' is an authoritative split point.
    if let Some(pos) = chunk.find('_') {
        let (head, tail) = (&chunk[..pos], &chunk[pos + 1..]);
        if tail.is_empty() {
            return Err(default_failure(chunk, ty));
        }

        let Some(hit) = ty.field(head) else {
            return Err(default_failure(chunk, ty));
        };
        return descend(hit, tail);
    }

    // 3. Camel-case fallback: split at the right-most boundary first and
    //    backtrack leftward until the remainder resolves.
    let mut best: Option<Failure> = None;
    for boundary in boundaries(chunk).into_iter().rev() {
        let (head, tail) = chunk.split_at(boundary);
        if let Some(hit) = ty.field(head) {
            match descend(hit, tail) {
                Ok(chain) => return Ok(chain),
                Err(failure) => {
                    if best.as_ref().is_none_or(|b| failure.depth > b.depth) {
                        best = Some(failure);
                    }
                }
            }
        }
    }

    Err(best.unwrap_or_else(|| default_failure(chunk, ty)))
}

/// Continue resolution past a matched head, traversing into element/value
/// types of containers.
fn descend(hit: PropertyHit, rest: &str) -> Result<Vec<PathSegment>, Failure> {
    let next = hit
        .info
        .as_ref()
        .and_then(TypeInfo::actual_type);

    let Some(next) = next else {
        return Err(Failure {
            depth: 1,
            property: decapitalize(rest),
            ty: "<unresolved>".to_string(),
            prefix: vec![hit.name],
        });
    };

    match resolve_chunk(rest, &next) {
        Ok(mut chain) => {
            let mut segments = vec![segment_from(hit)];
            segments.append(&mut chain);
            Ok(segments)
        }
        Err(mut failure) => {
            failure.depth += 1;
            failure.prefix.insert(0, hit.name);
            Err(failure)
        }
    }
}

fn default_failure(chunk: &str, ty: &TypeInfo) -> Failure {
    Failure {
        depth: 0,
        property: decapitalize(chunk),
        ty: ty.name(),
        prefix: Vec::new(),
    }
}

/// Byte offsets of camel-case split boundaries: transitions to an
/// uppercase character. Digits and the leading character never open one.
fn boundaries(s: &str) -> Vec<usize> {
    s.char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .collect()
}

pub(crate) fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().collect::<String>() + chars.as_str()
    })
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
                TypeDef::builder("Address")
                    .field("city", TypeRef::text())
                    .field("zip_code", TypeRef::text())
                    .build(),
            )
            .expect("register Address");
        registry
            .register(
                TypeDef::builder("Role")
                    .field("name", TypeRef::text())
                    .build(),
            )
            .expect("register Role");
        registry
            .register(
                TypeDef::builder("Person")
                    .id_field("id", TypeRef::uint())
                    .field("name", TypeRef::text())
                    .field("age", TypeRef::int())
                    .field("address", TypeRef::named("Address"))
                    .field("address_zip", TypeRef::text())
                    .field("roles", TypeRef::list(TypeRef::named("Role")))
                    .build(),
            )
            .expect("register Person");

        registry.verify().expect("fixture registry should verify");
        registry
    }

    fn person(registry: &Arc<TypeRegistry>) -> crate::types::TypeInfo {
        registry.resolve("Person").expect("Person should resolve")
    }

    #[test]
    fn resolves_dotted_notation() {
        let registry = registry();
        let path = PropertyPath::from("address.city", &person(&registry))
            .expect("dotted path should resolve");

        assert_eq!(path.len(), 2);
        assert_eq!(path.to_dot_path(), "address.city");
        assert_eq!(path.leaf_type().expect("leaf type").name(), "Text");
    }

    #[test]
    fn resolves_camel_case_notation() {
        let registry = registry();
        let path = PropertyPath::from("AddressCity", &person(&registry))
            .expect("camel path should resolve");
        assert_eq!(path.to_dot_path(), "address.city");
    }

    #[test]
    fn concatenated_lowercase_does_not_resolve() {
        let registry = registry();
        let err = PropertyPath::from("addresscity", &person(&registry))
            .expect_err("no boundary to split on");

        assert_eq!(err.property, "addresscity");
        assert_eq!(err.ty, "Person");
        assert!(err.base.is_empty());
    }

    #[test]
    fn literal_field_wins_over_nested_decomposition() {
        let registry = registry();
        let path = PropertyPath::from("AddressZip", &person(&registry))
            .expect("literal field should win");

        assert_eq!(path.len(), 1);
        assert_eq!(path.to_dot_path(), "address_zip");
    }

    #[test]
    fn backtracks_to_an_earlier_boundary() {
        let registry = registry();
        // "AddressZip" matches the literal field, but the trailing "Code"
        // does not resolve on Text, so the split falls back to "Address".
        let path = PropertyPath::from("AddressZipCode", &person(&registry))
            .expect("backtracking should find address.zip_code");

        assert_eq!(path.to_dot_path(), "address.zip_code");
    }

    #[test]
    fn explicit_underscore_acts_as_separator() {
        let registry = registry();
        let path = PropertyPath::from("address_city", &person(&registry))
            .expect("underscore-separated path should resolve");
        assert_eq!(path.to_dot_path(), "address.city");
    }

    #[test]
    fn collection_traversal_continues_against_element_type() {
        let registry = registry();
        let path = PropertyPath::from("RolesName", &person(&registry))
            .expect("collection traversal should resolve");

        assert_eq!(path.to_dot_path(), "roles.name");
        assert!(path.segments()[0].is_collection());
        assert!(path.is_collection_traversal());
        assert_eq!(path.leaf_type().expect("leaf").name(), "Text");
    }

    #[test]
    fn error_carries_the_deepest_resolved_prefix() {
        let registry = registry();
        let err = PropertyPath::from("address.cityy", &person(&registry))
            .expect_err("unknown nested segment should fail");

        assert_eq!(err.property, "cityy");
        assert_eq!(err.ty, "Address");
        assert_eq!(err.base_path(), "address");
    }

    #[test]
    fn error_message_names_property_and_type() {
        let registry = registry();
        let err = PropertyPath::from("nickname", &person(&registry))
            .expect_err("unknown property should fail");
        assert_eq!(
            err.to_string(),
            "no property 'nickname' found for type 'Person'"
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let registry = registry();
        let root = person(&registry);

        let first = PropertyPath::from("AddressZipCode", &root).expect("resolve");
        let second = PropertyPath::from("AddressZipCode", &root).expect("resolve");
        assert_eq!(first, second);
        assert_eq!(first.leaf_type(), second.leaf_type());
    }

    #[test]
    fn empty_source_is_rejected() {
        let registry = registry();
        assert!(PropertyPath::from("", &person(&registry)).is_err());
        assert!(PropertyPath::from("address..city", &person(&registry)).is_err());
    }
}
