use crate::{types::TypeInfo, value::Value};
use std::{any::Any, fmt, hash::Hash, hash::Hasher};

/// Closed read accessor: downcasts the erased instance and lifts the
/// property value into the core's value representation.
pub type Getter = fn(&dyn Any) -> Option<Value>;

/// Closed write accessor. Returns `false` when the instance is of an
/// unexpected type or the value cannot be applied.
pub type Setter = fn(&mut dyn Any, Value) -> bool;

///
/// PropertyKind
///
/// A property is exactly one of these; plain properties are the ones
/// iterated for mapping.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PropertyKind {
    Association,
    #[default]
    Plain,
    Transient,
}

///
/// PropertyAccess
///
/// Capability-tagged accessor strategy, resolved once at model-build time.
/// Runtime get/set is a tagged-union dispatch; there is no reflection.
///

#[derive(Clone, Copy, Debug)]
pub enum PropertyAccess {
    /// Backed by a field read directly off the instance.
    Field { get: Getter, set: Option<Setter> },
    /// Backed by an accessor pair; either side may be missing.
    Accessor {
        get: Option<Getter>,
        set: Option<Setter>,
    },
}

impl PropertyAccess {
    #[must_use]
    pub const fn field(get: Getter) -> Self {
        Self::Field { get, set: None }
    }

    #[must_use]
    pub const fn is_field_backed(&self) -> bool {
        matches!(self, Self::Field { .. })
    }

    #[must_use]
    pub fn get(&self, instance: &dyn Any) -> Option<Value> {
        match self {
            Self::Field { get, .. } => get(instance),
            Self::Accessor { get, .. } => get.and_then(|get| get(instance)),
        }
    }

    pub fn set(&self, instance: &mut dyn Any, value: Value) -> bool {
        match self {
            Self::Field { set, .. } | Self::Accessor { set, .. } => {
                set.is_some_and(|set| set(instance, value))
            }
        }
    }
}

///
/// PersistentProperty
///
/// A named, typed accessor slot on an entity. Equality is (owner, name),
/// which also drives the duplicate no-op on the owning entity.
///

#[derive(Clone, Debug)]
pub struct PersistentProperty {
    name: String,
    owner: String,
    info: Option<TypeInfo>,
    kind: PropertyKind,
    id: bool,
    version: bool,
    access: Option<PropertyAccess>,
}

impl PersistentProperty {
    #[must_use]
    pub fn new(name: impl Into<String>, owner: impl Into<String>, info: Option<TypeInfo>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            info,
            kind: PropertyKind::Plain,
            id: false,
            version: false,
            access: None,
        }
    }

    #[must_use]
    pub fn as_id(mut self) -> Self {
        self.id = true;
        self
    }

    #[must_use]
    pub fn as_version(mut self) -> Self {
        self.version = true;
        self
    }

    #[must_use]
    pub fn as_association(mut self) -> Self {
        self.kind = PropertyKind::Association;
        self
    }

    #[must_use]
    pub fn as_transient(mut self) -> Self {
        self.kind = PropertyKind::Transient;
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: PropertyAccess) -> Self {
        self.access = Some(access);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning entity type (non-owning back-reference).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub const fn type_info(&self) -> Option<&TypeInfo> {
        self.info.as_ref()
    }

    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        self.kind
    }

    #[must_use]
    pub const fn is_id_property(&self) -> bool {
        self.id
    }

    #[must_use]
    pub const fn is_version_property(&self) -> bool {
        self.version
    }

    #[must_use]
    pub const fn is_association(&self) -> bool {
        matches!(self.kind, PropertyKind::Association)
    }

    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, PropertyKind::Transient)
    }

    /// Plain persistent properties are the ones iterated for mapping.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        matches!(self.kind, PropertyKind::Plain)
    }

    #[must_use]
    pub const fn access(&self) -> Option<&PropertyAccess> {
        self.access.as_ref()
    }

    /// Read the property's current value off an instance through the
    /// resolved accessor strategy.
    #[must_use]
    pub fn get(&self, instance: &dyn Any) -> Option<Value> {
        self.access.as_ref().and_then(|access| access.get(instance))
    }

    /// Write through the resolved accessor strategy; `false` when the
    /// property has no writable access or the instance does not match.
    pub fn set(&self, instance: &mut dyn Any, value: Value) -> bool {
        self.access
            .as_ref()
            .is_some_and(|access| access.set(instance, value))
    }
}

impl PartialEq for PersistentProperty {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

impl Eq for PersistentProperty {}

impl Hash for PersistentProperty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for PersistentProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}
