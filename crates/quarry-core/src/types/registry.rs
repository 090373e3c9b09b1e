use crate::types::{
    def::{TypeDef, TypeFlavor, TypeRef, builtin, flat},
    info::TypeInfo,
};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use thiserror::Error as ThisError;

///
/// TypeRegistryError
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TypeRegistryError {
    #[error("type '{0}' already registered")]
    DuplicateType(String),

    #[error("type '{ty}' declares a non-nominal supertype '{supertype}'")]
    InvalidSupertype { ty: String, supertype: String },

    #[error("type '{ty}' references unbound type variable '{variable}'")]
    UnboundVariable { ty: String, variable: String },

    #[error("type '{0}' not registered")]
    UnknownType(String),

    #[error("type '{ty}' references unknown type '{reference}'")]
    UnknownTypeReference { ty: String, reference: String },
}

///
/// Identifiers
///
/// Arena indices. `TypeInfoId` is stable for the process lifetime; nodes
/// are append-only and never mutated after publication.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct DefId(usize);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct TypeInfoId(usize);

#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    Class {
        def: DefId,
        args: Vec<Option<TypeInfoId>>,
    },
    Array {
        element: TypeInfoId,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct TypeNode {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<TypeInfoId>,
}

/// Memo key: one node per (def, bindings, declaration site).
#[derive(Eq, Hash, PartialEq)]
enum NodeKey {
    Class(DefId, Vec<Option<TypeInfoId>>, Option<TypeInfoId>),
    Array(TypeInfoId, Option<TypeInfoId>),
}

/// Declared-field lookup result: the declared name and the resolved
/// declared type (`None` when no binding is available).
#[derive(Clone, Debug)]
pub(crate) struct RawFieldHit {
    pub(crate) name: String,
    pub(crate) info: Option<TypeInfoId>,
}

type Env = Vec<(String, Option<TypeInfoId>)>;

///
/// TypeRegistry
///
/// Process-wide registry of declared types plus the memoized `TypeInfo`
/// arena. All mutation happens under one write lock, so every node and def
/// is published exactly once and entries are never removed.
///

pub struct TypeRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    defs: Vec<TypeDef>,
    by_name: HashMap<String, DefId>,
    nodes: Vec<TypeNode>,
    memo: HashMap<NodeKey, TypeInfoId>,
}

impl TypeRegistry {
    /// Fresh registry with the builtin scalar and container defs installed.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let registry = Self {
            inner: RwLock::new(Inner::default()),
        };

        {
            let mut inner = registry.write();
            for scalar in [
                builtin::BOOL,
                builtin::FLOAT,
                builtin::INT,
                builtin::TEXT,
                builtin::TIMESTAMP,
                builtin::UINT,
                builtin::UNIT,
            ] {
                inner.insert(TypeDef::builder(scalar).flavor(TypeFlavor::Scalar).build());
            }
            inner.insert(
                TypeDef::builder(builtin::LIST)
                    .flavor(TypeFlavor::Collection)
                    .param("T")
                    .build(),
            );
            inner.insert(
                TypeDef::builder(builtin::SET)
                    .flavor(TypeFlavor::Collection)
                    .param("T")
                    .build(),
            );
            inner.insert(
                TypeDef::builder(builtin::MAP)
                    .flavor(TypeFlavor::Map)
                    .param("K")
                    .param("V")
                    .build(),
            );
        }

        Arc::new(registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a declared type. Names are unique per registry.
    pub fn register(&self, def: TypeDef) -> Result<(), TypeRegistryError> {
        let mut inner = self.write();

        if inner.by_name.contains_key(&def.name) {
            return Err(TypeRegistryError::DuplicateType(def.name));
        }

        inner.insert(def);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.read().by_name.contains_key(name)
    }

    /// Clone of the declared def, if registered.
    #[must_use]
    pub fn def(&self, name: &str) -> Option<TypeDef> {
        let inner = self.read();
        inner.by_name.get(name).map(|id| inner.defs[id.0].clone())
    }

    /// Fail-fast reference check over every registered def: supertypes must
    /// be nominal, named references must resolve, and type variables must be
    /// bound by the declaring def.
    pub fn verify(&self) -> Result<(), TypeRegistryError> {
        let inner = self.read();

        for def in &inner.defs {
            if let Some(supertype) = &def.supertype {
                if !matches!(supertype, TypeRef::Named { .. }) {
                    return Err(TypeRegistryError::InvalidSupertype {
                        ty: def.name.clone(),
                        supertype: supertype.to_string(),
                    });
                }
                inner.check_ref(def, supertype)?;
            }
            for field in &def.fields {
                inner.check_ref(def, &field.ty)?;
            }
        }

        Ok(())
    }

    /// Resolve a registered type into its root `TypeInfo` node.
    pub fn resolve(self: &Arc<Self>, name: &str) -> Result<TypeInfo, TypeRegistryError> {
        let id = {
            let mut inner = self.write();
            let def = *inner
                .by_name
                .get(name)
                .ok_or_else(|| TypeRegistryError::UnknownType(name.to_string()))?;
            let arity = inner.defs[def.0].params.len();
            inner.alloc_class(def, vec![None; arity], None)
        };

        Ok(TypeInfo::new(Arc::clone(self), id))
    }

    // ── Node operations used by `TypeInfo` ────────────────────────────────

    pub(crate) fn field_hit(&self, id: TypeInfoId, token: &str) -> Option<RawFieldHit> {
        self.write().field_hit(id, token)
    }

    pub(crate) fn component_of(&self, id: TypeInfoId) -> Option<TypeInfoId> {
        self.write().component_of(id)
    }

    pub(crate) fn map_value_of(&self, id: TypeInfoId) -> Option<TypeInfoId> {
        self.write().map_value_of(id)
    }

    pub(crate) fn parent_of(&self, id: TypeInfoId) -> Option<TypeInfoId> {
        self.read().nodes[id.index()].parent
    }

    pub(crate) fn args_of(&self, id: TypeInfoId) -> Vec<Option<TypeInfoId>> {
        match &self.read().nodes[id.index()].kind {
            NodeKind::Class { args, .. } => args.clone(),
            NodeKind::Array { .. } => Vec::new(),
        }
    }

    pub(crate) fn is_array(&self, id: TypeInfoId) -> bool {
        matches!(self.read().nodes[id.index()].kind, NodeKind::Array { .. })
    }

    pub(crate) fn is_collection_like(&self, id: TypeInfoId) -> bool {
        self.read().flavor_chain_contains(id, TypeFlavor::Collection)
    }

    pub(crate) fn is_map_like(&self, id: TypeInfoId) -> bool {
        self.read().flavor_chain_contains(id, TypeFlavor::Map)
    }

    pub(crate) fn render(&self, id: TypeInfoId) -> String {
        self.read().render(id)
    }

    pub(crate) fn def_name_of(&self, id: TypeInfoId) -> Option<String> {
        let inner = self.read();
        match &inner.nodes[id.index()].kind {
            NodeKind::Class { def, .. } => Some(inner.defs[def.0].name.clone()),
            NodeKind::Array { .. } => None,
        }
    }
}

impl TypeInfoId {
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

impl Inner {
    fn insert(&mut self, def: TypeDef) -> DefId {
        let id = DefId(self.defs.len());
        self.by_name.insert(def.name.clone(), id);
        self.defs.push(def);
        id
    }

    fn check_ref(&self, owner: &TypeDef, r: &TypeRef) -> Result<(), TypeRegistryError> {
        match r {
            TypeRef::Named { name, args } => {
                if !self.by_name.contains_key(name) {
                    return Err(TypeRegistryError::UnknownTypeReference {
                        ty: owner.name.clone(),
                        reference: name.clone(),
                    });
                }
                for arg in args {
                    self.check_ref(owner, arg)?;
                }
                Ok(())
            }
            TypeRef::Variable(variable) => {
                if owner.params.iter().any(|p| p == variable) {
                    Ok(())
                } else {
                    Err(TypeRegistryError::UnboundVariable {
                        ty: owner.name.clone(),
                        variable: variable.clone(),
                    })
                }
            }
            TypeRef::Array(element) => self.check_ref(owner, element),
        }
    }

    fn alloc_class(
        &mut self,
        def: DefId,
        args: Vec<Option<TypeInfoId>>,
        parent: Option<TypeInfoId>,
    ) -> TypeInfoId {
        let key = NodeKey::Class(def, args.clone(), parent);
        if let Some(existing) = self.memo.get(&key) {
            return *existing;
        }

        let id = TypeInfoId(self.nodes.len());
        self.nodes.push(TypeNode {
            kind: NodeKind::Class { def, args },
            parent,
        });
        self.memo.insert(key, id);
        id
    }

    fn alloc_array(&mut self, element: TypeInfoId, parent: Option<TypeInfoId>) -> TypeInfoId {
        let key = NodeKey::Array(element, parent);
        if let Some(existing) = self.memo.get(&key) {
            return *existing;
        }

        let id = TypeInfoId(self.nodes.len());
        self.nodes.push(TypeNode {
            kind: NodeKind::Array { element },
            parent,
        });
        self.memo.insert(key, id);
        id
    }

    /// Resolve a declaration-site reference in a binding environment.
    /// Unknown names and unbound variables resolve to `None`; `verify()` is
    /// the eager pass that reports them.
    fn resolve_ref(&mut self, r: &TypeRef, env: &Env, parent: Option<TypeInfoId>) -> Option<TypeInfoId> {
        match r {
            TypeRef::Variable(name) => env
                .iter()
                .find(|(param, _)| param == name)
                .and_then(|(_, binding)| *binding),
            TypeRef::Named { name, args } => {
                let def = *self.by_name.get(name)?;
                let arity = self.defs[def.0].params.len();
                let bound: Vec<Option<TypeInfoId>> = (0..arity)
                    .map(|i| args.get(i).and_then(|arg| self.resolve_ref(arg, env, parent)))
                    .collect();
                Some(self.alloc_class(def, bound, parent))
            }
            TypeRef::Array(element) => {
                let element = self.resolve_ref(element, env, parent)?;
                Some(self.alloc_array(element, parent))
            }
        }
    }

    fn env_of(&self, def: DefId, args: &[Option<TypeInfoId>]) -> Env {
        self.defs[def.0]
            .params
            .iter()
            .cloned()
            .zip(args.iter().copied())
            .collect()
    }

    /// Step one level up the supertype chain, rebinding the superdef's
    /// formal parameters through the current environment.
    fn superdef(&mut self, def: DefId, env: &Env, parent: Option<TypeInfoId>) -> Option<(DefId, Env)> {
        let supertype = self.defs[def.0].supertype.clone()?;
        let TypeRef::Named { name, args } = supertype else {
            return None;
        };

        let sdef = *self.by_name.get(&name)?;
        let params = self.defs[sdef.0].params.clone();
        let env = params
            .into_iter()
            .enumerate()
            .map(|(i, param)| {
                let binding = args.get(i).and_then(|arg| self.resolve_ref(arg, env, parent));
                (param, binding)
            })
            .collect();

        Some((sdef, env))
    }

    /// Walk the def chain for a flat-case field match, resolving the
    /// declared type in the environment accumulated along the way.
    fn field_hit(&mut self, id: TypeInfoId, token: &str) -> Option<RawFieldHit> {
        let NodeKind::Class { def, args } = &self.nodes[id.index()].kind else {
            return None;
        };

        let mut def = *def;
        let mut env = self.env_of(def, &args.clone());
        let flat_token = flat(token);

        loop {
            if let Some(field) = self.defs[def.0].field_flat(&flat_token).cloned() {
                let info = self.resolve_ref(&field.ty, &env, Some(id));
                return Some(RawFieldHit {
                    name: field.name,
                    info,
                });
            }

            (def, env) = self.superdef(def, &env, Some(id))?;
        }
    }

    fn component_of(&mut self, id: TypeInfoId) -> Option<TypeInfoId> {
        match &self.nodes[id.index()].kind {
            // Nested array dimensions collapse to the deepest element type.
            NodeKind::Array { element } => {
                let mut element = *element;
                loop {
                    match &self.nodes[element.index()].kind {
                        NodeKind::Array { element: nested } => element = *nested,
                        NodeKind::Class { .. } => return Some(element),
                    }
                }
            }
            NodeKind::Class { def, args } => {
                if self.defs[def.0].params.is_empty() {
                    None
                } else {
                    args.first().copied().flatten()
                }
            }
        }
    }

    fn map_value_of(&mut self, id: TypeInfoId) -> Option<TypeInfoId> {
        let NodeKind::Class { def, args } = &self.nodes[id.index()].kind else {
            return None;
        };

        let mut def = *def;
        let mut env = self.env_of(def, &args.clone());

        loop {
            if self.defs[def.0].flavor == TypeFlavor::Map {
                let value_param = self.defs[def.0].params.get(1)?.clone();
                return env
                    .iter()
                    .find(|(param, _)| *param == value_param)
                    .and_then(|(_, binding)| *binding);
            }

            (def, env) = self.superdef(def, &env, Some(id))?;
        }
    }

    fn flavor_chain_contains(&self, id: TypeInfoId, flavor: TypeFlavor) -> bool {
        match &self.nodes[id.index()].kind {
            NodeKind::Array { .. } => flavor == TypeFlavor::Collection,
            NodeKind::Class { def, .. } => {
                let mut def = *def;
                loop {
                    if self.defs[def.0].flavor == flavor {
                        return true;
                    }
                    let Some(TypeRef::Named { name, .. }) = &self.defs[def.0].supertype else {
                        return false;
                    };
                    let Some(next) = self.by_name.get(name) else {
                        return false;
                    };
                    def = *next;
                }
            }
        }
    }

    fn render(&self, id: TypeInfoId) -> String {
        match &self.nodes[id.index()].kind {
            NodeKind::Array { element } => format!("{}[]", self.render(*element)),
            NodeKind::Class { def, args } => {
                let name = self.defs[def.0].name.clone();
                if args.is_empty() || args.iter().all(Option::is_none) {
                    name
                } else {
                    let rendered: Vec<String> = args
                        .iter()
                        .map(|arg| arg.map_or_else(|| "?".to_string(), |a| self.render(a)))
                        .collect();
                    format!("{name}<{}>", rendered.join(", "))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_type_registration_is_rejected() {
        let registry = TypeRegistry::new();
        registry
            .register(TypeDef::builder("Person").build())
            .expect("initial registration should succeed");

        let err = registry
            .register(TypeDef::builder("Person").build())
            .expect_err("duplicate registration should fail");
        assert_eq!(err, TypeRegistryError::DuplicateType("Person".to_string()));
    }

    #[test]
    fn unknown_type_resolution_is_rejected() {
        let registry = TypeRegistry::new();
        let err = registry
            .resolve("Ghost")
            .expect_err("unregistered type should not resolve");
        assert_eq!(err, TypeRegistryError::UnknownType("Ghost".to_string()));
    }

    #[test]
    fn verify_reports_unknown_references() {
        let registry = TypeRegistry::new();
        registry
            .register(
                TypeDef::builder("Person")
                    .field("address", TypeRef::named("Address"))
                    .build(),
            )
            .expect("registration should succeed");

        let err = registry.verify().expect_err("dangling reference should fail");
        assert_eq!(
            err,
            TypeRegistryError::UnknownTypeReference {
                ty: "Person".to_string(),
                reference: "Address".to_string(),
            }
        );

        registry
            .register(TypeDef::builder("Address").build())
            .expect("registration should succeed");
        registry
            .verify()
            .expect("verification should pass once the reference exists");
    }

    #[test]
    fn verify_reports_unbound_variables() {
        let registry = TypeRegistry::new();
        registry
            .register(
                TypeDef::builder("Wrapper")
                    .field("content", TypeRef::variable("T"))
                    .build(),
            )
            .expect("registration should succeed");

        let err = registry.verify().expect_err("unbound variable should fail");
        assert_eq!(
            err,
            TypeRegistryError::UnboundVariable {
                ty: "Wrapper".to_string(),
                variable: "T".to_string(),
            }
        );
    }

    #[test]
    fn builtin_defs_are_preinstalled() {
        let registry = TypeRegistry::new();
        for name in ["Bool", "Int", "Text", "List", "Set", "Map"] {
            assert!(registry.contains(name), "builtin '{name}' should exist");
        }
    }
}
