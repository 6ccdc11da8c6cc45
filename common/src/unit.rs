//! Marker types.

/// Marker type describing an entity issuance.
#[derive(Clone, Copy, Debug)]
pub struct Issuance;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
