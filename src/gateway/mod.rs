//! Gateway Module
//!
//! The HTTP layer translating transport requests into store operations.
//!
//! ## Wire Contract
//! - `POST /update` with `{key, data, type}`: `errCode` 0 on success, 1 for
//!   a malformed body, 2 for an unrecognized type string (the store is never
//!   called), 3 with HTTP 500 when the store itself fails.
//! - `GET /:key/:version`: version 0 requests latest; unknown key/version is
//!   `errCode` 4 with HTTP 404.
//!
//! The gateway holds the store as an explicit dependency; it owns no state
//! of its own beyond the listener.

mod routes;
mod server;

pub use routes::{err_code, router, FetchResponse, UpdateRequest, UpdateResponse};
pub use server::Gateway;
