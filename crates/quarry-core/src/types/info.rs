use crate::{
    path::{PropertyPath, PropertyReferenceError},
    types::registry::{TypeInfoId, TypeRegistry},
};
use std::{fmt, sync::Arc};

///
/// TypeInfo
///
/// Handle over one arena node: a raw type plus the bindings of its formal
/// parameters, with a non-owning link to the declaration site that produced
/// it. Cheap to clone; equality is node identity within one registry.
///

#[derive(Clone)]
pub struct TypeInfo {
    registry: Arc<TypeRegistry>,
    id: TypeInfoId,
}

/// Resolved single-property lookup: the declared name and the declared
/// type when a binding is available.
#[derive(Clone, Debug)]
pub(crate) struct PropertyHit {
    pub(crate) name: String,
    pub(crate) info: Option<TypeInfo>,
}

impl TypeInfo {
    pub(crate) fn new(registry: Arc<TypeRegistry>, id: TypeInfoId) -> Self {
        Self { registry, id }
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Rendered raw-type identity, e.g. `Person`, `List<Text>`, `Text[]`.
    #[must_use]
    pub fn name(&self) -> String {
        self.registry.render(self.id)
    }

    /// Name of the underlying def; `None` for array nodes.
    #[must_use]
    pub fn raw_name(&self) -> Option<String> {
        self.registry.def_name_of(self.id)
    }

    /// Declared-property lookup (flat-case matched) through the supertype
    /// chain, substituting bound type variables along the way.
    pub(crate) fn field(&self, token: &str) -> Option<PropertyHit> {
        self.registry.field_hit(self.id, token).map(|hit| PropertyHit {
            name: hit.name,
            info: hit
                .info
                .map(|id| Self::new(Arc::clone(&self.registry), id)),
        })
    }

    /// Resolved type of a single declared property. `None` both when no
    /// such property exists and when no binding is available for its type;
    /// callers that need the distinction go through [`Self::property_path`].
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Self> {
        self.field(name).and_then(|hit| hit.info)
    }

    /// Whether a declared property with the given (flat-case) name exists,
    /// regardless of whether its type resolves.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Full dotted/camel-case path resolution rooted at this type.
    pub fn property_path(&self, path: &str) -> Result<PropertyPath, PropertyReferenceError> {
        PropertyPath::from(path, self)
    }

    /// Element type: arrays collapse nested dimensions to the deepest
    /// element; parameterized types resolve their first formal parameter.
    /// `None` when no binding is available.
    #[must_use]
    pub fn component_type(&self) -> Option<Self> {
        self.registry
            .component_of(self.id)
            .map(|id| Self::new(Arc::clone(&self.registry), id))
    }

    /// Value type of the nearest map-flavored ancestor, resolved through
    /// the inheritance chain.
    #[must_use]
    pub fn map_value_type(&self) -> Option<Self> {
        self.registry
            .map_value_of(self.id)
            .map(|id| Self::new(Arc::clone(&self.registry), id))
    }

    /// The type path traversal continues against: element type for
    /// arrays/collections, value type for maps, the type itself otherwise.
    #[must_use]
    pub fn actual_type(&self) -> Option<Self> {
        if self.is_collection_like() {
            self.component_type()
        } else if self.is_map_like() {
            self.map_value_type()
        } else {
            Some(self.clone())
        }
    }

    /// Declaration site that produced this node, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.registry
            .parent_of(self.id)
            .map(|id| Self::new(Arc::clone(&self.registry), id))
    }

    /// Ordered bindings of the raw type's formal parameters.
    #[must_use]
    pub fn type_arguments(&self) -> Vec<Option<Self>> {
        self.registry
            .args_of(self.id)
            .into_iter()
            .map(|arg| arg.map(|id| Self::new(Arc::clone(&self.registry), id)))
            .collect()
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.registry.is_array(self.id)
    }

    #[must_use]
    pub fn is_collection_like(&self) -> bool {
        self.registry.is_collection_like(self.id)
    }

    #[must_use]
    pub fn is_map_like(&self) -> bool {
        self.registry.is_map_like(self.id)
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry) && self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeInfo({})", self.name())
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
