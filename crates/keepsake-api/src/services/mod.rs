//! Handler-facing services.

pub mod tag_resolver;

pub use tag_resolver::{parse_tag_identifiers, resolve_and_link_tags};
