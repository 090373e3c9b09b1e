//! Core metadata and query-derivation runtime for Quarry: declared type
//! models, property-path resolution, persistent-entity structure, and
//! method-name predicate parsing with parameter binding.
#![warn(unreachable_pub)]

pub mod domain;
pub mod model;
pub mod path;
pub mod query;
pub mod types;
pub mod value;

///
/// Prelude
///
/// Domain vocabulary only. Errors and registry internals are imported from
/// their modules.
///

pub mod prelude {
    pub use crate::{
        domain::{Direction, Order, PageRequest, Sort},
        model::{MappingContext, PersistentEntity, PersistentProperty, PropertyAccess},
        path::PropertyPath,
        query::{DerivedQuery, ParameterDecl, Parameters, Part, PartType, Parts},
        types::{TypeDef, TypeInfo, TypeRef, TypeRegistry},
        value::Value,
    };
}
