//! Client state: session, token storage, and page-level editing models.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` and `tokens` are shared with the HTTP layer; `booking`,
//! `schedule` and `stats` are pure models that pages drive and render.

pub mod booking;
pub mod schedule;
pub mod session;
pub mod stats;
pub mod tokens;
