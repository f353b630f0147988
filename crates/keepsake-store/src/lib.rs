//! # keepsake-store
//!
//! HTTP client for the backing store platform. The store owns all
//! durable state; this crate only speaks its REST surfaces:
//!
//! - row CRUD with filter/sort/paginate/embedded-join query building
//!   ([`Query`], PostgREST wire format),
//! - path-addressed object storage ([`StorageBucket`]),
//! - identity (password sign-in, token verification, admin user
//!   creation) ([`client::StoreClient::sign_in`] and friends).
//!
//! Two privilege tiers exist: a restricted key bound by row-level
//! security and an elevated key that bypasses it. Both are just
//! differently-credentialed [`client::StoreClient`] values.

pub mod auth;
pub mod client;
pub mod query;
pub mod storage;
pub mod tags;

pub use auth::{AuthUser, Session};
pub use client::StoreClient;
pub use query::{Order, Query};
pub use storage::{derive_storage_path, StorageBucket, MEMORIES_BUCKET};
