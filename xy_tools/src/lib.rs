//! Client library for the XY vending-machine platform.
//!
//! The XY platform exposes an authenticated HTTP API for querying vending-machine transactions.
//! This crate owns the full client-side protocol:
//!
//! 1. The login handshake: fetch a one-time challenge code, derive a two-stage MD5 hash from the
//!    account credentials and the challenge, and capture the session key that must accompany
//!    every subsequent request.
//! 2. The windowed order query, including offset pagination, scope filters, the removal of the
//!    synthetic page-subtotal row the server embeds in results, and the retry/backoff policy for
//!    both hard failures and the platform's intermittent "success but empty" under-reporting.
//!
//! The crate knows nothing about storage. It returns typed [`RawOrder`] wire records and leaves
//! normalization and persistence to the caller.
mod api;
mod config;
mod data_objects;
mod error;
pub mod helpers;

pub use api::XyApi;
pub use config::{XyApiConfig, XyCredentials};
pub use data_objects::{OrderPage, RawOrder, ScopeFilters};
pub use error::XyApiError;
