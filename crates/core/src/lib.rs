//! Domain logic for the dataport open-data portal.
//!
//! This crate holds everything that can be expressed without a database or
//! HTTP dependency: criteria schema derivation and validation, the
//! administrative-level cascade, the request/review state machines, review
//! aggregation, and the permission policy. The `db` and `api` crates consume
//! these types; nothing here performs I/O.

pub mod audit;
pub mod criteria;
pub mod error;
pub mod permissions;
pub mod roles;
pub mod types;
pub mod workflow;
