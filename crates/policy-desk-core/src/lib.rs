//! # Policy Desk Core
//!
//! I/O-free logic for Policy Desk: data models, the sliding-window chunker,
//! chunk search, condition resolution, the conditions session, the policy
//! book, and the store traits those operations run against.
//!
//! This crate contains no tokio, sqlx, or filesystem access. PDF extraction
//! and SQLite persistence live in the `policy-desk` application crate.

pub mod chunk;
pub mod error;
pub mod models;
pub mod policy;
pub mod resolve;
pub mod search;
pub mod session;
pub mod store;

pub use error::{Error, Result};
