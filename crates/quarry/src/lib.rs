//! Quarry — typed repository metadata and query-name derivation.
//!
//! This is the public meta-crate. Downstream users depend on **quarry**
//! only; it re-exports the stable API from `quarry-core`:
//!
//!   - `types`  (declared type defs, the registry, resolved type info)
//!   - `path`   (property-path resolution)
//!   - `model`  (persistent entities, properties, the mapping context)
//!   - `query`  (method-name parts, parameters, derived queries)
//!   - `domain` (sorting and paging vocabulary)
//!   - `value`  (the closed value representation)

pub use quarry_core as core;

pub use quarry_core::{domain, model, path, query, types, value};

//
// Prelude
//

pub mod prelude {
    pub use quarry_core::prelude::*;
}
