//! Core types and trait definitions for the Lendit rental coordinator.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod accounts;
pub mod booking;
pub mod catalog;
pub mod comment;
pub mod error;
pub mod item;
pub mod lifecycle;
pub mod store;
pub mod temporal;
pub mod user;

pub use error::{Error, ErrorKind, Result};
