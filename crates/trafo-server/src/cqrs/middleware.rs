//! Marker traits separating write requests from read requests
//!
//! Every mediator request in a feature slice implements exactly one of these.

/// A request that changes state
pub trait Command {}

/// A request that only reads state
pub trait Query {}
