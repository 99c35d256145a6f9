//! # cfgstore
//!
//! A versioned configuration store:
//! - Monotonic, contiguous version numbers per key
//! - Append-only durable log holding every version ever written
//! - In-memory latest-version cache for O(1) hot reads
//! - HTTP gateway for updates and (latest or historical) fetches
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Gateway                            │
//! │              POST /update   GET /:key/:version               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Versioned Store                            │
//! │        (per-key write serialization + latest cache)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Latest Cache│          │ Durable Log │
//!   │  (RwLock)   │          │  (Append)   │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod log;
pub mod store;
pub mod gateway;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CfgError, Result};
pub use config::Config;
pub use record::{ConfigRecord, TypeTag};
pub use store::VersionedStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cfgstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
