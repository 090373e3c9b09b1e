mod def;
mod info;
mod registry;

pub use def::{FieldAttrs, FieldDef, TypeDef, TypeDefBuilder, TypeFlavor, TypeRef, builtin};
pub use info::TypeInfo;
pub use registry::{TypeRegistry, TypeRegistryError};

pub(crate) use info::PropertyHit;
