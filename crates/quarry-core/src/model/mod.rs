mod context;
mod entity;
mod property;

pub use context::{MappingContext, MappingContextError};
pub use entity::{
    Association, ConstructorParameter, IdentifierAccessor, MappingError, PersistentEntity,
    PreferredConstructor, PropertyComparator,
};
pub use property::{Getter, PersistentProperty, PropertyAccess, PropertyKind, Setter};
