//! ==============================================================================
//! lib.rs - pressure hub library root
//! ==============================================================================
//!
//! purpose:
//!     keeps the latest reading pushed by a pressure sensor and serves it,
//!     with freshness and link status, to dashboard clients.
//!
//! relationships:
//!     - core: store.rs (ReadingStore), built on domain.rs, clock.rs, error.rs
//!     - http adapter: server.rs
//!     - configuration: config.rs
//!     - used by: main.rs (binary), tests/http_api.rs
//!
//! ==============================================================================

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::HubConfig;
pub use domain::{Reading, ReadingView, SensorStatus, StatusView};
pub use error::IngestError;
pub use store::ReadingStore;
