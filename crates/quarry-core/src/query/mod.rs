mod method;
mod parameters;
mod part;
mod parts;

pub use method::{BoundPart, DerivedQuery, QueryCreationError};
pub use parameters::{
    Parameter, ParameterDecl, ParameterError, ParameterKind, ParameterOutOfBoundsError, Parameters,
};
pub use part::{Part, PartType};
pub use parts::{OrGroup, PartParseError, Parts};
