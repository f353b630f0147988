//! Route handlers, one module per resource.

pub mod admin;
pub mod ai;
pub mod albums;
pub mod auth;
pub mod memories;
