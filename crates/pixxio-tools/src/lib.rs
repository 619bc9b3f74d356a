//! pixx.io DAM access as MCP tools.
//!
//! Layers, leaf first:
//! - [`filter`]: search parameters to the DAM filter-expression grammar
//! - [`client`]: authenticated HTTP gateway with error classification
//! - [`model`], [`normalize`], [`markdown`]: total views over DAM payloads and their renderings
//! - [`download`]: convert requests, file naming and persistence
//! - [`tools`]: the callable tool surface
//!
//! Nothing here is transport-specific; the `pixxio-mcp` binary wires [`tools::PixxioToolSource`]
//! into an MCP server.

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod filter;
pub mod markdown;
pub mod model;
pub mod normalize;
pub mod semantics;
pub mod tools;

pub use config::{ApiContext, CredentialOverrides, PixxioSettings};
pub use error::{PixxioError, Result};
pub use tools::{PixxioToolSource, ToolKind, error_result};
