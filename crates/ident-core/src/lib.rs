//! Core types and the identity-linking algorithm.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; backends plug in through
//! [`repository::ContactRepository`] and transports talk to
//! [`store::IdentityStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod error;
pub mod identity;
pub mod memory;
pub mod repository;
pub mod resolver;
pub mod store;

pub use error::{Error, Result};
