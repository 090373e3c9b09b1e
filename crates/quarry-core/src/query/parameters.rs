use crate::types::TypeRef;
use derive_more::Deref;
use thiserror::Error as ThisError;

///
/// ParameterError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParameterError {
    #[error(
        "either name all bindable parameters or none of them; parameter at index {index} breaks the rule"
    )]
    MixedNamedParameters { index: usize },
}

///
/// ParameterOutOfBoundsError
///
/// A parsed query expects more arguments than the method declares. Always
/// a configuration defect, distinct from any raw index panic.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("invalid parameter index {index}: the method declares {count} parameter(s)")]
pub struct ParameterOutOfBoundsError {
    pub index: usize,
    pub count: usize,
}

///
/// ParameterKind
///
/// Declared type of one method parameter, as supplied by the repository
/// proxy layer. Pageable and Sort are the special parameters; everything
/// else binds to a query predicate.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParameterKind {
    Pageable,
    Sort,
    Value(TypeRef),
}

///
/// ParameterDecl
///
/// One declared parameter: its kind and the optional explicit bind name
/// read from the external naming mechanism.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParameterDecl {
    pub kind: ParameterKind,
    pub name: Option<String>,
}

impl ParameterDecl {
    #[must_use]
    pub fn value(ty: TypeRef) -> Self {
        Self {
            kind: ParameterKind::Value(ty),
            name: None,
        }
    }

    #[must_use]
    pub fn named(ty: TypeRef, name: impl Into<String>) -> Self {
        Self {
            kind: ParameterKind::Value(ty),
            name: Some(name.into()),
        }
    }

    #[must_use]
    pub const fn pageable() -> Self {
        Self {
            kind: ParameterKind::Pageable,
            name: None,
        }
    }

    #[must_use]
    pub const fn sort() -> Self {
        Self {
            kind: ParameterKind::Sort,
            name: None,
        }
    }
}

///
/// Parameter
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parameter {
    index: usize,
    kind: ParameterKind,
    name: Option<String>,
}

impl Parameter {
    /// Position in the list this parameter belongs to (re-indexed in the
    /// bindable view).
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    /// Explicit bind name, when the parameter carries one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn is_named(&self) -> bool {
        self.name.is_some()
    }

    #[must_use]
    pub const fn is_pageable(&self) -> bool {
        matches!(self.kind, ParameterKind::Pageable)
    }

    #[must_use]
    pub const fn is_sort(&self) -> bool {
        matches!(self.kind, ParameterKind::Sort)
    }

    /// Paging and sorting parameters are applied to the query as a whole,
    /// never bound to a predicate.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.is_pageable() || self.is_sort()
    }

    #[must_use]
    pub const fn is_bindable(&self) -> bool {
        !self.is_special()
    }

    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.index == 0
    }
}

///
/// Parameters
///
/// Ordered view over a method's declared parameters. Records the first
/// pageable and first sort positions and eagerly enforces the
/// all-or-nothing naming rule over the bindable subset.
///

#[derive(Clone, Debug, Deref, Eq, PartialEq)]
pub struct Parameters {
    #[deref]
    parameters: Vec<Parameter>,
    pageable_index: Option<usize>,
    sort_index: Option<usize>,
}

impl Parameters {
    pub fn new(decls: Vec<ParameterDecl>) -> Result<Self, ParameterError> {
        let parameters: Vec<Parameter> = decls
            .into_iter()
            .enumerate()
            .map(|(index, decl)| Parameter {
                index,
                kind: decl.kind,
                name: decl.name,
            })
            .collect();

        let pageable_index = parameters.iter().position(Parameter::is_pageable);
        let sort_index = parameters.iter().position(Parameter::is_sort);

        let this = Self {
            parameters,
            pageable_index,
            sort_index,
        };
        this.assert_either_all_named_or_none()?;

        Ok(this)
    }

    /// Either every bindable parameter carries an explicit name or none
    /// does; special parameters are exempt. Checked once, at construction.
    fn assert_either_all_named_or_none(&self) -> Result<(), ParameterError> {
        let bindables: Vec<&Parameter> = self.parameters.iter().filter(|p| p.is_bindable()).collect();
        let named = bindables.iter().filter(|p| p.is_named()).count();

        if named > 0 && named < bindables.len() {
            let offender = bindables
                .iter()
                .find(|p| !p.is_named())
                .map_or(0, |p| p.index);
            return Err(ParameterError::MixedNamedParameters { index: offender });
        }

        Ok(())
    }

    #[must_use]
    pub const fn has_pageable_parameter(&self) -> bool {
        self.pageable_index.is_some()
    }

    /// Index of the first pageable parameter, if any.
    #[must_use]
    pub const fn pageable_index(&self) -> Option<usize> {
        self.pageable_index
    }

    #[must_use]
    pub const fn has_sort_parameter(&self) -> bool {
        self.sort_index.is_some()
    }

    /// Index of the first sort parameter, if any.
    #[must_use]
    pub const fn sort_index(&self) -> Option<usize> {
        self.sort_index
    }

    #[must_use]
    pub const fn has_special_parameter(&self) -> bool {
        self.has_pageable_parameter() || self.has_sort_parameter()
    }

    /// Whether invocations can influence ordering dynamically.
    #[must_use]
    pub const fn potentially_sorts_dynamically(&self) -> bool {
        self.has_special_parameter()
    }

    #[must_use]
    pub fn number_of_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter(&self, index: usize) -> Result<&Parameter, ParameterOutOfBoundsError> {
        self.parameters.get(index).ok_or(ParameterOutOfBoundsError {
            index,
            count: self.parameters.len(),
        })
    }

    #[must_use]
    pub fn has_parameter_at(&self, index: usize) -> bool {
        index < self.parameters.len()
    }

    /// Derived, re-indexed view with the special parameters removed. A pure
    /// function of the underlying list, recomputed on demand.
    #[must_use]
    pub fn bindable_parameters(&self) -> Self {
        let parameters = self
            .parameters
            .iter()
            .filter(|p| p.is_bindable())
            .enumerate()
            .map(|(index, p)| Parameter {
                index,
                kind: p.kind.clone(),
                name: p.name.clone(),
            })
            .collect();

        Self {
            parameters,
            pageable_index: None,
            sort_index: None,
        }
    }

    /// Bindable parameter at the given bindable position.
    pub fn bindable_parameter(&self, index: usize) -> Result<Parameter, ParameterOutOfBoundsError> {
        self.bindable_parameters().parameter(index).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}
