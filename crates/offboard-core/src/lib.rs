//! Core types and trait definitions for the offboard deletion cascade.
//!
//! This crate is deliberately free of HTTP, database, and runtime
//! dependencies. It describes *what* a deletion run touches (the reference
//! catalog), *what* it records (ledger and report), and the collaborator
//! seams a backend must implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod entity;
pub mod error;
pub mod ledger;
pub mod report;
pub mod rule;
pub mod store;

pub use error::{Error, Result};
