//! Resource-specific API implementations
//!
//! Each module provides a typed interface for one resource. Resource clients
//! only name paths and payloads; rate limiting, retries and error decoding
//! happen in the dispatcher.
//!
//! | Module | Paths | Operations |
//! |--------|-------|------------|
//! | `admins` | `/admins` | list, create, update, delete |
//! | `organization` | `/organization`, `/organizations/{id}` | details, delegatee details |
//! | `tasks` | `/tasks` | get, get by short id, list, create, batch create, update, complete, clone, delete |
//! | `teams` | `/teams` | list, get, create, update, delete |
//! | `workers` | `/workers` | list, get, create, update, delete |

pub mod admins;
pub mod organization;
pub mod tasks;
pub mod teams;
pub mod workers;

pub use admins::AdminsApi;
pub use organization::OrganizationApi;
pub use tasks::TasksApi;
pub use teams::TeamsApi;
pub use workers::WorkersApi;
