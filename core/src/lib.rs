//! Shared types for the Plato coaching platform.
//!
//! Everything the API crate and its tests need to agree on lives here:
//! the JSON error envelope, profile/locale/role types, the read-only
//! plan and lesson projections consumed by the assistant, and the
//! session-token helpers.

pub mod auth;
pub mod error;
pub mod lessons;
pub mod plan;
pub mod profile;
