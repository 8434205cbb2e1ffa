//! Networking: base transport, the authenticated client, wire types and
//! domain endpoint functions.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` performs one HTTP exchange, `client` layers bearer auth and
//! token refresh on top, `api` wraps individual endpoints, and `types`
//! defines the shared wire schema.

pub mod api;
pub mod client;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
