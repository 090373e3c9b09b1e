use crate::{
    model::{
        entity::{
            Association, ConstructorParameter, MappingError, PersistentEntity,
            PreferredConstructor, PropertyComparator,
        },
        property::PersistentProperty,
    },
    types::{TypeRegistry, TypeRegistryError},
};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use thiserror::Error as ThisError;

///
/// MappingContextError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MappingContextError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Type(#[from] TypeRegistryError),
}

///
/// MappingContext
///
/// Process-wide entity cache. Entities are derived from registered type
/// defs on first request and published compute-once: concurrent builders
/// may race, but every caller converges on the first published instance,
/// and a failed build publishes nothing. Entries are never removed.
///

pub struct MappingContext {
    registry: Arc<TypeRegistry>,
    comparator: Option<PropertyComparator>,
    entities: RwLock<HashMap<String, Arc<PersistentEntity>>>,
}

impl MappingContext {
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            comparator: None,
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Context whose entities order their property collections with the
    /// given comparator at `verify()` time.
    #[must_use]
    pub fn with_comparator(registry: Arc<TypeRegistry>, comparator: PropertyComparator) -> Self {
        Self {
            comparator: Some(comparator),
            ..Self::new(registry)
        }
    }

    #[must_use]
    pub const fn type_registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<PersistentEntity>>> {
        self.entities.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<PersistentEntity>>> {
        self.entities.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Entity for a registered type, building and publishing it on first
    /// request. The build runs outside the lock; insertion is
    /// first-writer-wins.
    pub fn persistent_entity(&self, name: &str) -> Result<Arc<PersistentEntity>, MappingContextError> {
        if let Some(entity) = self.read().get(name) {
            return Ok(Arc::clone(entity));
        }

        let built = Arc::new(self.build_entity(name)?);

        let mut entities = self.write();
        Ok(Arc::clone(
            entities.entry(name.to_string()).or_insert(built),
        ))
    }

    /// Whether an entity has already been built and published.
    #[must_use]
    pub fn has_persistent_entity(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Register a hand-built entity (e.g. one carrying accessors) through
    /// the same publish-once gate. The first registration wins.
    pub fn add_persistent_entity(&self, entity: PersistentEntity) -> Arc<PersistentEntity> {
        let name = entity.name();
        let mut entities = self.write();
        Arc::clone(entities.entry(name).or_insert_with(|| Arc::new(entity)))
    }

    /// Derive an entity from the registered def: one property per field,
    /// flags from the field attrs, associations wired to their inverse
    /// property, constructor parameters bound by name.
    fn build_entity(&self, name: &str) -> Result<PersistentEntity, MappingContextError> {
        let info = self.registry.resolve(name)?;
        let def = self
            .registry
            .def(name)
            .ok_or_else(|| TypeRegistryError::UnknownType(name.to_string()))?;

        let mut entity = match self.comparator {
            Some(comparator) => PersistentEntity::with_comparator(info.clone(), comparator),
            None => PersistentEntity::new(info.clone()),
        };

        for field in &def.fields {
            let resolved = info.field(&field.name).and_then(|hit| hit.info);

            let mut property = PersistentProperty::new(&field.name, &def.name, resolved);
            if field.attrs.id {
                property = property.as_id();
            }
            if field.attrs.version {
                property = property.as_version();
            }
            if field.attrs.transient {
                property = property.as_transient();
            }
            if field.attrs.association {
                property = property.as_association();
            }

            entity.add_persistent_property(property)?;

            if field.attrs.association {
                if let Some(inverse) = entity.property_ref(&field.name) {
                    entity.add_association(Association::new(inverse, None));
                }
            }
        }

        if let Some(parameters) = &def.constructor {
            let parameters = parameters
                .iter()
                .map(|name| ConstructorParameter {
                    name: name.clone(),
                    info: entity
                        .persistent_property(name)
                        .and_then(|p| p.type_info().cloned()),
                })
                .collect();
            entity.set_preferred_constructor(PreferredConstructor::new(parameters));
        }

        entity.verify()?;
        Ok(entity)
    }
}
