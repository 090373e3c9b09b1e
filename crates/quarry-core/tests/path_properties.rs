//! Property-based pinning of the camel-case split rules: declared fields
//! always resolve from their camel spelling, literal fields beat nested
//! decompositions, and resolution is deterministic.

use proptest::collection::vec;
use proptest::prelude::*;
use quarry_core::{
    path::PropertyPath,
    types::{TypeDef, TypeRef, TypeRegistry},
};
use std::collections::HashSet;
use std::sync::Arc;

/// UpperCamel spelling of a snake_case field name.
fn camelize(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect()
}

fn field_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z]{1,6}(_[a-z]{1,6}){0,2}").expect("valid regex")
}

/// Distinct flat forms so no two generated fields collide under the
/// normalized matching.
fn field_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    vec(field_name(), 1..=max).prop_map(|names| {
        let mut seen = HashSet::new();
        names
            .into_iter()
            .filter(|n| seen.insert(n.replace('_', "")))
            .collect()
    })
}

fn entity_with(fields: &[String]) -> Arc<TypeRegistry> {
    let registry = TypeRegistry::new();
    let mut builder = TypeDef::builder("Subject");
    for field in fields {
        builder = builder.field(field, TypeRef::text());
    }
    registry.register(builder.build()).expect("register Subject");
    registry
}

proptest! {
    /// Every declared field resolves from its camel spelling as a single
    /// segment, and the rendered path is the declared name.
    #[test]
    fn declared_fields_resolve_from_camel_tokens(fields in field_names(5)) {
        let registry = entity_with(&fields);
        let root = registry.resolve("Subject").expect("resolve Subject");

        for field in &fields {
            let token = camelize(field);
            let path = PropertyPath::from(&token, &root).expect("declared field resolves");
            prop_assert_eq!(path.len(), 1);
            prop_assert_eq!(path.to_dot_path(), field.clone());
        }
    }

    /// Nested resolution picks the declared head/tail split and does so
    /// deterministically across repeated runs.
    #[test]
    fn nested_resolution_is_deterministic(
        outer in field_name(),
        inner in field_name(),
    ) {
        let registry = TypeRegistry::new();
        registry
            .register(
                TypeDef::builder("Leaf")
                    .field(&inner, TypeRef::text())
                    .build(),
            )
            .expect("register Leaf");
        registry
            .register(
                TypeDef::builder("Root")
                    .field(&outer, TypeRef::named("Leaf"))
                    .build(),
            )
            .expect("register Root");

        let root = registry.resolve("Root").expect("resolve Root");
        let token = camelize(&outer) + &camelize(&inner);

        let first = PropertyPath::from(&token, &root).expect("nested token resolves");
        let second = PropertyPath::from(&token, &root).expect("resolution repeats");

        prop_assert_eq!(first.clone(), second);
        prop_assert_eq!(first.to_dot_path(), format!("{outer}.{inner}"));
        prop_assert_eq!(
            first.leaf_type().expect("leaf type").name(),
            "Text".to_string()
        );
    }

    /// A literal field whose name equals the concatenation of a nested
    /// path is preferred over the decomposition.
    #[test]
    fn literal_fields_beat_nested_decompositions(
        outer in field_name(),
        inner in field_name(),
    ) {
        let literal = format!("{outer}_{inner}");

        let registry = TypeRegistry::new();
        registry
            .register(
                TypeDef::builder("Leaf")
                    .field(&inner, TypeRef::text())
                    .build(),
            )
            .expect("register Leaf");
        registry
            .register(
                TypeDef::builder("Root")
                    .field(&outer, TypeRef::named("Leaf"))
                    .field(&literal, TypeRef::int())
                    .build(),
            )
            .expect("register Root");

        let root = registry.resolve("Root").expect("resolve Root");
        let token = camelize(&outer) + &camelize(&inner);

        let path = PropertyPath::from(&token, &root).expect("token resolves");
        prop_assert_eq!(path.len(), 1, "literal field must win");
        prop_assert_eq!(path.to_dot_path(), literal);
        prop_assert_eq!(
            path.leaf_type().expect("leaf type").name(),
            "Int".to_string()
        );
    }
}
