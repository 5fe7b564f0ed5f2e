//! Backoffice API - REST client for the back-office backend
//!
//! Implements [`backoffice_core::Repository`] over the backend's
//! `{success, data, message}` JSON contract.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::{ApiClient, HttpRepository};
pub use envelope::Envelope;
pub use error::ClientError;
