//! Dataset criteria: schema derivation, typed values, and validation.
//!
//! - [`schema`] -- the declarative flag-to-field table and schema derivation.
//! - [`values`] -- typed criteria values and completeness validation.
//! - [`admin_level`] -- the cascading administrative-hierarchy selection.

pub mod admin_level;
pub mod schema;
pub mod values;
