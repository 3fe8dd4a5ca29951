//! Client for the Fleetline delivery and logistics API
//!
//! Every resource client sends its requests through one [`Dispatcher`], which
//! owns everything that is not specific to a resource.
//!
//! # Features
//!
//! - **Environment-based configuration**: Load the API key and endpoint from environment variables
//! - **Shared rate limiting**: One token bucket per client, fair across concurrent callers
//! - **Bounded retries**: 412, 429 and transport failures are retried a fixed number of times
//! - **Uniform errors**: Every non-2xx body is decoded into a [`StructuredError`]
//! - **Request correlation**: Each call carries a unique `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use fleetline_api_client::{ClientConfig, FleetClient};
//! use fleetline_api_client::endpoints::tasks::TaskListParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FleetClient::with_config(ClientConfig::new("my-api-key"))?;
//!
//!     let task = client.tasks().get("task_123").await?;
//!     println!("Task {} is in state {}", task.id, task.state);
//!
//!     let page = client.tasks().list(&TaskListParams::since(1_455_072_025_000)).await?;
//!     println!("Got {} tasks", page.tasks.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod query;
pub mod request;

pub use client::FleetClient;
pub use config::ClientConfig;
pub use dispatch::{DispatchRequest, Dispatcher};
pub use error::{ApiError, ApiResult, ErrorMessage, StructuredError};
pub use query::{QueryParams, ToQueryParams};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::FleetClient;
    pub use crate::config::ClientConfig;
    pub use crate::dispatch::{DispatchRequest, Dispatcher};
    pub use crate::endpoints::{AdminsApi, OrganizationApi, TasksApi, TeamsApi, WorkersApi};
    pub use crate::error::{ApiError, ApiResult, StructuredError};
    pub use crate::query::{QueryParams, ToQueryParams};
}
