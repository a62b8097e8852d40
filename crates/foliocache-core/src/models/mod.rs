//! Data models shared across the cache layers.
//!
//! This module contains the wire-facing data structures:
//!
//! - `Entity`: a single content record (category, post, media, resume entry)
//! - `SharedEntity`: the in-memory handle guaranteeing one object per ID
//! - `Pagination`: page metadata returned alongside list responses

pub mod entity;

pub use entity::{Entity, Pagination, SharedEntity};
