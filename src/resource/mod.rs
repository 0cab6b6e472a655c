//! Resource state model.
//!
//! This module holds the types the plan checker consumes: property values and
//! maps, the property diff, URNs and provider references, program goals and
//! recorded resource state.

mod diff;
mod goal;
mod property;
mod state;
mod urn;

pub use diff::{ObjectDiff, ValueDiff};
pub use goal::{CustomTimeouts, DeleteBeforeReplace, Goal, PropertyDependencies};
pub use property::{
    PropertyKey, PropertyMap, PropertyValue, SECRET_SIG, SIG_KEY, UNKNOWN_SENTINEL,
    map_deep_equals_include_unknowns,
};
pub use state::ResourceState;
pub use urn::{ProviderReference, UNKNOWN_ID, Urn};
