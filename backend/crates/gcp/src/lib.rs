//! Thin REST clients for the Google Cloud services the plugin talks to.

pub mod auth;
pub mod bigquery;
pub mod composer;
pub mod error;

pub use auth::{ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenSource};
pub use bigquery::client::{BigQueryClient, BigQueryConfig};
pub use composer::client::{ComposerClient, ComposerConfig};
pub use error::GoogleApiError;
