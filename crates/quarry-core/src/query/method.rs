use crate::{
    query::{parameters::Parameters, part::Part, parts::Parts},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// QueryCreationError
///
/// Mismatch between the arguments a parsed predicate binds and the
/// method's declared bindable parameters. Raised when the query model is
/// assembled, so broken repository methods fail before first invocation.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryCreationError {
    #[error(
        "derived predicate binds {expected} argument(s) but the method declares {actual} bindable parameter(s)"
    )]
    ArgumentCountMismatch { expected: usize, actual: usize },
}

///
/// BoundPart
///
/// One predicate fragment paired with the invocation values it consumes,
/// in declaration order.
///

#[derive(Clone, Debug, PartialEq)]
pub struct BoundPart<'a> {
    part: &'a Part,
    arguments: &'a [Value],
}

impl<'a> BoundPart<'a> {
    #[must_use]
    pub const fn part(&self) -> &'a Part {
        self.part
    }

    #[must_use]
    pub const fn arguments(&self) -> &'a [Value] {
        self.arguments
    }
}

///
/// DerivedQuery
///
/// A parsed method-name predicate aligned with the method's parameter
/// model. Construction verifies the argument-count contract; `bind` maps
/// invocation values onto the parts positionally.
///

#[derive(Clone, Debug, PartialEq)]
pub struct DerivedQuery {
    parts: Parts,
    parameters: Parameters,
}

impl DerivedQuery {
    pub fn new(parts: Parts, parameters: Parameters) -> Result<Self, QueryCreationError> {
        let expected = parts.number_of_arguments();
        let actual = parameters.bindable_parameters().number_of_parameters();

        if expected != actual {
            return Err(QueryCreationError::ArgumentCountMismatch { expected, actual });
        }

        Ok(Self { parts, parameters })
    }

    #[must_use]
    pub const fn parts(&self) -> &Parts {
        &self.parts
    }

    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Bind the bindable invocation values to the parts in declaration
    /// order. Special arguments (paging, sorting) travel separately via
    /// their recorded parameter indices.
    pub fn bind<'a>(
        &'a self,
        values: &'a [Value],
    ) -> Result<Vec<BoundPart<'a>>, QueryCreationError> {
        let expected = self.parts.number_of_arguments();
        if values.len() != expected {
            return Err(QueryCreationError::ArgumentCountMismatch {
                expected,
                actual: values.len(),
            });
        }

        let mut bound = Vec::with_capacity(self.parts.number_of_parts());
        let mut cursor = 0;
        for part in self.parts.iter() {
            let take = part.number_of_arguments();
            bound.push(BoundPart {
                part,
                arguments: &values[cursor..cursor + take],
            });
            cursor += take;
        }

        Ok(bound)
    }
}
