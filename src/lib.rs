//! Client for the CAS camp-management backend.
//!
//! The backend is a HATEOAS REST API: [`discovery::HateoasClient`] discovers
//! link relations on `GET /api`, the [`services`] wrap each domain, and the
//! [`query`] layer caches results for UI code.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use cas_client::{CasClient, ClientConfig};
//! use cas_client::services::calendar::EventFilter;
//!
//! let config = ClientConfig::from_env()?;
//! let client = CasClient::new(&config)?;
//! client.api().discover_api().await?;
//! let events = client.calendar().list_events(&EventFilter::default()).await?;
//! println!("{} events", events.data.items().len());
//! # Ok(())
//! # }
//! ```

pub mod agenda_watcher;
pub mod config;
pub mod discovery;
pub mod error;
pub mod installments;
pub mod models;
pub mod query;
pub mod services;
pub mod traits;
pub mod transport;

pub use agenda_watcher::AgendaWatcher;
pub use config::{ClientConfig, ConfigError, Environment};
pub use discovery::HateoasClient;
pub use error::ApiError;
pub use query::{Mutation, Query, QueryClient, QueryOptions, QueryState};
pub use services::CasClient;
pub use traits::{StaticTokenProvider, TokenProvider};
pub use transport::{ApiResponse, ApiResult, HttpTransport, RequestOptions, fetch_or_throw};
