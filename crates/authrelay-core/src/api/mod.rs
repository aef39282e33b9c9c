//! Authenticated HTTP client module.
//!
//! This module provides the `AuthenticatedClient` for talking to an API that
//! hands out a bearer token from a `login` endpoint. The token and user
//! identifier live in an `AliasStore` as the `authToken` and `userUuid`
//! aliases, and request URIs and headers may reference any alias as
//! `{name}`.

pub mod client;
pub mod error;
pub mod options;
pub mod transport;

pub use client::{AuthenticatedClient, PendingResponse, AUTH_TOKEN_ALIAS, USER_UUID_ALIAS};
pub use error::{ClientError, Result};
pub use options::{merge_json, RequestOptions};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
