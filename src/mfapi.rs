use async_trait::async_trait;

pub mod client;
pub mod error;
pub mod types;

pub use client::MfApiClient;
pub use error::NetworkError;
pub use types::{Meta, NavData, Scheme, SchemeDetail};

/// Read-only access to the scheme catalog and per-scheme NAV history.
///
/// The controller only talks to this trait, so tests can swap in an
/// in-memory source for [`MfApiClient`].
#[async_trait]
pub trait SchemeSource: Send + Sync {
    async fn list_schemes(&self) -> Result<Vec<Scheme>, NetworkError>;

    async fn get_scheme_detail(&self, scheme_code: u32) -> Result<SchemeDetail, NetworkError>;
}
