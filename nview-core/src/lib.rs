//! Nview Core Library
//!
//! Reads nmap XML scan results, flattens host/port/service records into rows,
//! optionally filters and aggregates them, and renders delimited text.
//!
//! # Modules
//!
//! - [`args`] - CLI argument parsing and validation
//! - [`config`] - Resolved run configuration
//! - [`scan`] - Nmap XML reader
//! - [`types`] - Scan hosts, service observations, columns and rows
//! - [`extract`] - Host to row extraction, expanded or packed
//! - [`collect`] - Row collection across scan files
//! - [`columns`] - Column selection parsing
//! - [`filter`] - Row filter expressions
//! - [`table`] - Projection, de-duplication and CSV output
//! - [`pipeline`] - The whole run, end to end
//!
//! # Example
//!
//! ```no_run
//! use nview_core::args::NviewArgs;
//! use nview_core::pipeline;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NviewArgs::from_iter_safe(["nview", "-p", "scan.xml"])?.into_config()?;
//! print!("{}", pipeline::run(&config)?);
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod collect;
pub mod columns;
pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod pipeline;
pub mod scan;
pub mod table;
pub mod types;

pub use error::{Error, Result};
