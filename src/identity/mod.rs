//! Identity provider integration.
//!
//! Resolves a caller's access token into the normalized attribute set that
//! scopes retrieval, and exposes the admin operations behind `/access`
//! (update a user's attributes, list users). Attribute lookups are never
//! cached: values can change out-of-band through the access-modification
//! path, and serving stale grants would be a security defect, not a
//! performance one.

pub mod attributes;
pub mod client;

pub use attributes::AccessAttributeSet;
pub use client::{IdentityClient, UserAttribute, UserRecord};
