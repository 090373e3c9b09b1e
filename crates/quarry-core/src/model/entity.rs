use crate::{model::property::PersistentProperty, types::TypeInfo, value::Value};
use std::{any::Any, cmp::Ordering, sync::Arc};
use thiserror::Error as ThisError;

/// Ordering applied to an entity's property collections by `verify()`.
pub type PropertyComparator = fn(&PersistentProperty, &PersistentProperty) -> Ordering;

///
/// MappingError
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MappingError {
    #[error(
        "attempt to add id property '{new}' but '{existing}' is already registered as id; check the mapping configuration"
    )]
    DuplicateIdProperty { new: String, existing: String },

    #[error(
        "attempt to add version property '{new}' but '{existing}' is already registered as version; check the mapping configuration"
    )]
    DuplicateVersionProperty { new: String, existing: String },

    #[error("persistence constructor of '{ty}' references unknown property '{parameter}'")]
    UnknownConstructorParameter { ty: String, parameter: String },
}

///
/// Association
///
/// Pair of properties forming a reference between two persistent entities:
/// the inverse side lives on the owning entity, the obverse side (when
/// known) on the target.
///

#[derive(Clone, Debug)]
pub struct Association {
    inverse: Arc<PersistentProperty>,
    obverse: Option<Arc<PersistentProperty>>,
}

impl Association {
    #[must_use]
    pub fn new(inverse: Arc<PersistentProperty>, obverse: Option<Arc<PersistentProperty>>) -> Self {
        Self { inverse, obverse }
    }

    #[must_use]
    pub fn inverse(&self) -> &PersistentProperty {
        &self.inverse
    }

    #[must_use]
    pub fn obverse(&self) -> Option<&PersistentProperty> {
        self.obverse.as_deref()
    }
}

impl PartialEq for Association {
    fn eq(&self, other: &Self) -> bool {
        self.inverse == other.inverse
    }
}

impl Eq for Association {}

///
/// PreferredConstructor
///
/// Ordered constructor parameters, each bound to a property by name.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConstructorParameter {
    pub name: String,
    pub info: Option<TypeInfo>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PreferredConstructor {
    parameters: Vec<ConstructorParameter>,
}

impl PreferredConstructor {
    #[must_use]
    pub fn new(parameters: Vec<ConstructorParameter>) -> Self {
        Self { parameters }
    }

    #[must_use]
    pub fn parameters(&self) -> &[ConstructorParameter] {
        &self.parameters
    }

    #[must_use]
    pub fn is_constructor_parameter(&self, property: &PersistentProperty) -> bool {
        self.parameters.iter().any(|p| p.name == property.name())
    }
}

///
/// IdentifierAccessor
///
/// Reads the identifier off an instance through the id property's resolved
/// accessor. The null-object variant is handed out for entities without an
/// id property and always yields `None`.
///

pub enum IdentifierAccessor<'a> {
    Absent,
    Bound {
        property: &'a PersistentProperty,
        instance: &'a dyn Any,
    },
}

impl IdentifierAccessor<'_> {
    #[must_use]
    pub fn identifier(&self) -> Option<Value> {
        match self {
            Self::Absent => None,
            Self::Bound { property, instance } => property.get(*instance),
        }
    }
}

///
/// PersistentEntity
///
/// Structural description of one persistable type: its properties, at most
/// one id and one version property, its associations, and the optional
/// persistence constructor.
///

#[derive(Clone, Debug)]
pub struct PersistentEntity {
    info: TypeInfo,
    properties: Vec<Arc<PersistentProperty>>,
    persistent: Vec<Arc<PersistentProperty>>,
    associations: Vec<Association>,
    id: Option<Arc<PersistentProperty>>,
    version: Option<Arc<PersistentProperty>>,
    constructor: Option<PreferredConstructor>,
    comparator: Option<PropertyComparator>,
}

impl PersistentEntity {
    #[must_use]
    pub fn new(info: TypeInfo) -> Self {
        Self {
            info,
            properties: Vec::new(),
            persistent: Vec::new(),
            associations: Vec::new(),
            id: None,
            version: None,
            constructor: None,
            comparator: None,
        }
    }

    /// Entity whose property collections are ordered by the comparator at
    /// `verify()` time.
    #[must_use]
    pub fn with_comparator(info: TypeInfo, comparator: PropertyComparator) -> Self {
        Self {
            comparator: Some(comparator),
            ..Self::new(info)
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.info.name()
    }

    #[must_use]
    pub const fn type_information(&self) -> &TypeInfo {
        &self.info
    }

    /// Add a property. A property already present (by equality) is a
    /// silent no-op; a second id or version property fails before any
    /// mutation, so the first registration survives intact.
    pub fn add_persistent_property(
        &mut self,
        property: PersistentProperty,
    ) -> Result<(), MappingError> {
        if self.properties.iter().any(|p| **p == property) {
            return Ok(());
        }

        if property.is_id_property() {
            if let Some(existing) = &self.id {
                return Err(MappingError::DuplicateIdProperty {
                    new: property.name().to_string(),
                    existing: existing.name().to_string(),
                });
            }
        }

        if property.is_version_property() {
            if let Some(existing) = &self.version {
                return Err(MappingError::DuplicateVersionProperty {
                    new: property.name().to_string(),
                    existing: existing.name().to_string(),
                });
            }
        }

        let property = Arc::new(property);
        self.properties.push(Arc::clone(&property));

        if property.is_persistent() {
            self.persistent.push(Arc::clone(&property));
        }
        if property.is_id_property() {
            self.id = Some(Arc::clone(&property));
        }
        if property.is_version_property() {
            self.version = Some(property);
        }

        Ok(())
    }

    /// Add an association; already-present associations (by inverse
    /// equality) are ignored.
    pub fn add_association(&mut self, association: Association) {
        if !self.associations.contains(&association) {
            self.associations.push(association);
        }
    }

    pub fn set_preferred_constructor(&mut self, constructor: PreferredConstructor) {
        self.constructor = Some(constructor);
    }

    #[must_use]
    pub const fn preferred_constructor(&self) -> Option<&PreferredConstructor> {
        self.constructor.as_ref()
    }

    #[must_use]
    pub fn is_constructor_argument(&self, property: &PersistentProperty) -> bool {
        self.constructor
            .as_ref()
            .is_some_and(|c| c.is_constructor_parameter(property))
    }

    #[must_use]
    pub fn id_property(&self) -> Option<&PersistentProperty> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn version_property(&self) -> Option<&PersistentProperty> {
        self.version.as_deref()
    }

    #[must_use]
    pub const fn has_id_property(&self) -> bool {
        self.id.is_some()
    }

    #[must_use]
    pub const fn has_version_property(&self) -> bool {
        self.version.is_some()
    }

    #[must_use]
    pub fn is_id_property(&self, property: &PersistentProperty) -> bool {
        self.id.as_deref().is_some_and(|id| id == property)
    }

    #[must_use]
    pub fn is_version_property(&self, property: &PersistentProperty) -> bool {
        self.version.as_deref().is_some_and(|v| v == property)
    }

    /// Look up a property by declared name (any kind).
    #[must_use]
    pub fn persistent_property(&self, name: &str) -> Option<&PersistentProperty> {
        self.properties
            .iter()
            .find(|p| p.name() == name)
            .map(Arc::as_ref)
    }

    /// Shared handle to a property, for association wiring.
    #[must_use]
    pub fn property_ref(&self, name: &str) -> Option<Arc<PersistentProperty>> {
        self.properties
            .iter()
            .find(|p| p.name() == name)
            .map(Arc::clone)
    }

    #[must_use]
    pub fn number_of_properties(&self) -> usize {
        self.properties.len()
    }

    /// All declared properties, in (possibly verified) order.
    pub fn properties(&self) -> impl Iterator<Item = &PersistentProperty> {
        self.properties.iter().map(Arc::as_ref)
    }

    /// Plain persistent properties only, the set iterated for mapping.
    pub fn do_with_properties(&self, mut handler: impl FnMut(&PersistentProperty)) {
        for property in &self.persistent {
            handler(property);
        }
    }

    pub fn do_with_associations(&self, mut handler: impl FnMut(&Association)) {
        for association in &self.associations {
            handler(association);
        }
    }

    /// Accessor for the identifier of the given instance; a null-object
    /// accessor when the entity declares no id property.
    #[must_use]
    pub fn identifier_accessor<'a>(&'a self, instance: &'a dyn Any) -> IdentifierAccessor<'a> {
        match &self.id {
            Some(property) => IdentifierAccessor::Bound { property, instance },
            None => IdentifierAccessor::Absent,
        }
    }

    /// Finalize the entity: order all property collections with the
    /// configured comparator (idempotent) and check constructor bindings.
    pub fn verify(&mut self) -> Result<(), MappingError> {
        if let Some(comparator) = self.comparator {
            self.properties
                .sort_by(|a, b| comparator(a.as_ref(), b.as_ref()));
            self.persistent
                .sort_by(|a, b| comparator(a.as_ref(), b.as_ref()));
            self.associations
                .sort_by(|a, b| comparator(a.inverse(), b.inverse()));
        }

        if let Some(constructor) = &self.constructor {
            for parameter in constructor.parameters() {
                if self.persistent_property(&parameter.name).is_none() {
                    return Err(MappingError::UnknownConstructorParameter {
                        ty: self.name(),
                        parameter: parameter.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::property::PropertyAccess,
        types::{TypeDef, TypeRef, TypeRegistry},
    };

    struct Account {
        id: u64,
    }

    fn get_account_id(instance: &dyn Any) -> Option<Value> {
        instance.downcast_ref::<Account>().map(|a| Value::Uint(a.id))
    }

    fn account_info() -> TypeInfo {
        let registry = TypeRegistry::new();
        registry
            .register(
                TypeDef::builder("Account")
                    .id_field("id", TypeRef::uint())
                    .field("balance", TypeRef::int())
                    .build(),
            )
            .expect("register Account");
        registry.resolve("Account").expect("resolve Account")
    }

    fn property(name: &str) -> PersistentProperty {
        PersistentProperty::new(name, "Account", None)
    }

    #[test]
    fn second_id_property_is_rejected_and_first_survives() {
        let mut entity = PersistentEntity::new(account_info());
        entity
            .add_persistent_property(property("id").as_id())
            .expect("first id should register");

        let err = entity
            .add_persistent_property(property("uuid").as_id())
            .expect_err("second id should fail");
        assert_eq!(
            err,
            MappingError::DuplicateIdProperty {
                new: "uuid".to_string(),
                existing: "id".to_string(),
            }
        );

        assert_eq!(entity.id_property().expect("id property").name(), "id");
        assert_eq!(entity.number_of_properties(), 1, "failed add must not mutate");
    }

    #[test]
    fn second_version_property_is_rejected() {
        let mut entity = PersistentEntity::new(account_info());
        entity
            .add_persistent_property(property("version").as_version())
            .expect("first version should register");

        let err = entity
            .add_persistent_property(property("revision").as_version())
            .expect_err("second version should fail");
        assert!(matches!(err, MappingError::DuplicateVersionProperty { .. }));
        assert_eq!(
            entity.version_property().expect("version property").name(),
            "version"
        );
    }

    #[test]
    fn re_adding_an_equal_property_is_a_no_op() {
        let mut entity = PersistentEntity::new(account_info());
        entity
            .add_persistent_property(property("balance"))
            .expect("add");
        entity
            .add_persistent_property(property("balance"))
            .expect("duplicate add is silent");

        assert_eq!(entity.number_of_properties(), 1);
    }

    #[test]
    fn mapped_iteration_skips_transient_and_association_properties() {
        let mut entity = PersistentEntity::new(account_info());
        entity.add_persistent_property(property("id").as_id()).expect("add");
        entity
            .add_persistent_property(property("cache").as_transient())
            .expect("add");
        entity
            .add_persistent_property(property("owner").as_association())
            .expect("add");

        let mut seen = Vec::new();
        entity.do_with_properties(|p| seen.push(p.name().to_string()));
        assert_eq!(seen, vec!["id"]);
    }

    #[test]
    fn verify_orders_properties_and_is_idempotent() {
        fn by_name(a: &PersistentProperty, b: &PersistentProperty) -> Ordering {
            a.name().cmp(b.name())
        }

        let mut entity = PersistentEntity::with_comparator(account_info(), by_name);
        for name in ["zeta", "alpha", "mid"] {
            entity.add_persistent_property(property(name)).expect("add");
        }

        entity.verify().expect("verify");
        let ordered: Vec<String> = entity.properties().map(|p| p.name().to_string()).collect();
        assert_eq!(ordered, vec!["alpha", "mid", "zeta"]);

        entity.verify().expect("verify twice");
        let again: Vec<String> = entity.properties().map(|p| p.name().to_string()).collect();
        assert_eq!(again, ordered);
    }

    #[test]
    fn verify_rejects_unknown_constructor_parameters() {
        let mut entity = PersistentEntity::new(account_info());
        entity.add_persistent_property(property("id").as_id()).expect("add");
        entity.set_preferred_constructor(PreferredConstructor::new(vec![ConstructorParameter {
            name: "ghost".to_string(),
            info: None,
        }]));

        let err = entity.verify().expect_err("unknown parameter should fail");
        assert!(matches!(
            err,
            MappingError::UnknownConstructorParameter { ref parameter, .. } if parameter.as_str() == "ghost"
        ));
    }

    #[test]
    fn identifier_accessor_reads_through_the_id_property() {
        let mut entity = PersistentEntity::new(account_info());
        entity
            .add_persistent_property(
                property("id")
                    .as_id()
                    .with_access(PropertyAccess::field(get_account_id)),
            )
            .expect("add");

        let account = Account { id: 99 };
        let accessor = entity.identifier_accessor(&account);
        assert_eq!(accessor.identifier(), Some(Value::Uint(99)));
    }

    #[test]
    fn identifier_accessor_is_a_null_object_without_an_id() {
        let entity = PersistentEntity::new(account_info());
        let account = Account { id: 1 };

        assert!(entity.identifier_accessor(&account).identifier().is_none());
    }

    #[test]
    fn associations_deduplicate_by_inverse() {
        let mut entity = PersistentEntity::new(account_info());
        entity
            .add_persistent_property(property("owner").as_association())
            .expect("add");

        let inverse = entity.property_ref("owner").expect("owner ref");
        entity.add_association(Association::new(Arc::clone(&inverse), None));
        entity.add_association(Association::new(inverse, None));

        let mut count = 0;
        entity.do_with_associations(|_| count += 1);
        assert_eq!(count, 1);
    }
}
