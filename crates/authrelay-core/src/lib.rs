//! Core library for authrelay - a self-authenticating HTTP client.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use authrelay_core::{AuthenticatedClient, ClientConfig, MemoryAliasStore};
//!
//! # async fn run() -> authrelay_core::Result<()> {
//! let config = ClientConfig::new("alice", "secret").with_api("https://api.example.com/v1");
//! let client = AuthenticatedClient::new(config, Arc::new(MemoryAliasStore::new()))?;
//! let profile = client.get("users/{userUuid}").await?;
//! println!("{}", profile.text());
//! # Ok(())
//! # }
//! ```

pub mod alias;
pub mod api;
pub mod config;

pub use alias::{AliasStore, FileAliasStore, MemoryAliasStore};
pub use api::{
    AuthenticatedClient, ClientError, HttpRequest, HttpResponse, HttpTransport, PendingResponse,
    RequestOptions, Result,
};
pub use config::{ClientConfig, Credentials};
pub use reqwest::Method;
