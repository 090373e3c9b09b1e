use convert_case::{Case, Casing};
use serde::Serialize;
use std::fmt;

/// Normalized (flat-case) spelling used whenever a path or clause token is
/// matched against a declared field name. Makes camel tokens from parsed
/// method names line up with snake_case field declarations.
#[must_use]
pub(crate) fn flat(name: &str) -> String {
    name.to_case(Case::Flat)
}

///
/// TypeFlavor
///
/// Structural role of a declared type. Containers get element/value
/// resolution through their formal parameters; everything else is opaque.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum TypeFlavor {
    Collection,
    Map,
    Scalar,
    Struct,
}

///
/// TypeRef
///
/// Reference to a type as written at a declaration site: a named type with
/// actual arguments, a type variable bound by the declaring type, or an
/// array of either.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum TypeRef {
    Named { name: String, args: Vec<TypeRef> },
    Variable(String),
    Array(Box<TypeRef>),
}

impl TypeRef {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn generic(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    #[must_use]
    pub fn array(element: Self) -> Self {
        Self::Array(Box::new(element))
    }

    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::generic(builtin::LIST, vec![element])
    }

    #[must_use]
    pub fn set(element: Self) -> Self {
        Self::generic(builtin::SET, vec![element])
    }

    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::generic(builtin::MAP, vec![key, value])
    }

    #[must_use]
    pub fn text() -> Self {
        Self::named(builtin::TEXT)
    }

    #[must_use]
    pub fn int() -> Self {
        Self::named(builtin::INT)
    }

    #[must_use]
    pub fn uint() -> Self {
        Self::named(builtin::UINT)
    }

    #[must_use]
    pub fn float() -> Self {
        Self::named(builtin::FLOAT)
    }

    #[must_use]
    pub fn bool() -> Self {
        Self::named(builtin::BOOL)
    }

    #[must_use]
    pub fn timestamp() -> Self {
        Self::named(builtin::TIMESTAMP)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Self::Variable(name) => write!(f, "{name}"),
            Self::Array(element) => write!(f, "{element}[]"),
        }
    }
}

///
/// FieldAttrs
///
/// Persistence markers carried by a field declaration, standing in for the
/// source-level mapping annotations of the domain class.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct FieldAttrs {
    pub id: bool,
    pub version: bool,
    pub transient: bool,
    pub association: bool,
}

impl FieldAttrs {
    #[must_use]
    pub const fn id() -> Self {
        Self {
            id: true,
            version: false,
            transient: false,
            association: false,
        }
    }

    #[must_use]
    pub const fn version() -> Self {
        Self {
            id: false,
            version: true,
            transient: false,
            association: false,
        }
    }

    #[must_use]
    pub const fn transient() -> Self {
        Self {
            id: false,
            version: false,
            transient: true,
            association: false,
        }
    }

    #[must_use]
    pub const fn association() -> Self {
        Self {
            id: false,
            version: false,
            transient: false,
            association: true,
        }
    }
}

///
/// FieldDef
///

#[derive(Clone, Debug, Serialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub attrs: FieldAttrs,
}

///
/// TypeDef
///
/// Declared shape of one named type: flavor, formal type parameters,
/// optional supertype (with actual arguments), ordered fields, and the
/// optional persistence-constructor parameter list.
///

#[derive(Clone, Debug, Serialize)]
pub struct TypeDef {
    pub name: String,
    pub flavor: TypeFlavor,
    pub params: Vec<String>,
    pub supertype: Option<TypeRef>,
    pub fields: Vec<FieldDef>,
    pub constructor: Option<Vec<String>>,
}

impl TypeDef {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TypeDefBuilder {
        TypeDefBuilder {
            def: Self {
                name: name.into(),
                flavor: TypeFlavor::Struct,
                params: Vec::new(),
                supertype: None,
                fields: Vec::new(),
                constructor: None,
            },
        }
    }

    /// Exact-name field lookup on this def only (no supertype walk).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Flat-case field lookup on this def only (no supertype walk).
    #[must_use]
    pub(crate) fn field_flat(&self, flat_token: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| flat(&f.name) == flat_token)
    }
}

///
/// TypeDefBuilder
///

pub struct TypeDefBuilder {
    def: TypeDef,
}

impl TypeDefBuilder {
    #[must_use]
    pub fn flavor(mut self, flavor: TypeFlavor) -> Self {
        self.def.flavor = flavor;
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.def.params.push(name.into());
        self
    }

    #[must_use]
    pub fn supertype(mut self, supertype: TypeRef) -> Self {
        self.def.supertype = Some(supertype);
        self
    }

    #[must_use]
    pub fn field(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.field_with(name, ty, FieldAttrs::default())
    }

    #[must_use]
    pub fn field_with(mut self, name: impl Into<String>, ty: TypeRef, attrs: FieldAttrs) -> Self {
        self.def.fields.push(FieldDef {
            name: name.into(),
            ty,
            attrs,
        });
        self
    }

    #[must_use]
    pub fn id_field(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.field_with(name, ty, FieldAttrs::id())
    }

    #[must_use]
    pub fn version_field(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.field_with(name, ty, FieldAttrs::version())
    }

    #[must_use]
    pub fn transient_field(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.field_with(name, ty, FieldAttrs::transient())
    }

    #[must_use]
    pub fn association_field(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.field_with(name, ty, FieldAttrs::association())
    }

    /// Declare the persistence constructor as an ordered list of property
    /// names. Verified against the field list when the entity is built.
    #[must_use]
    pub fn constructor<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.constructor = Some(parameters.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn build(self) -> TypeDef {
        self.def
    }
}

///
/// Builtin type names
///
/// Pre-registered by every `TypeRegistry`.
///

pub mod builtin {
    pub const BOOL: &str = "Bool";
    pub const FLOAT: &str = "Float";
    pub const INT: &str = "Int";
    pub const LIST: &str = "List";
    pub const MAP: &str = "Map";
    pub const SET: &str = "Set";
    pub const TEXT: &str = "Text";
    pub const TIMESTAMP: &str = "Timestamp";
    pub const UINT: &str = "Uint";
    pub const UNIT: &str = "Unit";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields_in_declaration_order() {
        let def = TypeDef::builder("Person")
            .id_field("id", TypeRef::uint())
            .field("name", TypeRef::text())
            .field("address", TypeRef::named("Address"))
            .build();

        let names: Vec<&str> = def.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "address"]);
        assert!(def.fields[0].attrs.id);
        assert!(!def.fields[1].attrs.id);
    }

    #[test]
    fn flat_lookup_matches_across_case_styles() {
        let def = TypeDef::builder("Person")
            .field("address_zip", TypeRef::text())
            .build();

        assert!(def.field_flat(&flat("addressZip")).is_some());
        assert!(def.field_flat(&flat("AddressZip")).is_some());
        assert!(def.field("addressZip").is_none());
    }

    #[test]
    fn type_refs_render_with_arguments() {
        let r = TypeRef::map(TypeRef::text(), TypeRef::list(TypeRef::int()));
        assert_eq!(r.to_string(), "Map<Text, List<Int>>");
        assert_eq!(TypeRef::array(TypeRef::text()).to_string(), "Text[]");
    }
}
