//! Core data types for scan hosts, service observations and flat rows
//!
//! A [`ScanHost`] is the read-only model produced by the scan-file adapter.
//! Row extraction turns it into [`FlatRow`]s whose field order follows the
//! active [`Column`] schema.
//!
//! # Examples
//!
//! ```
//! use nview_core::types::{ScanHost, ServiceObservation};
//!
//! let host = ScanHost::new(
//!     "192.168.1.1",
//!     vec![ServiceObservation::new(80, "tcp", "open").with_banner("product: nginx")],
//! );
//! assert_eq!(host.service_for(80, "tcp").unwrap().banner, "product: nginx");
//! assert!(host.service_for(80, "udp").is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One target machine from a scan-result file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanHost {
    /// IP address (or MAC when no IP address is recorded)
    pub address: String,

    /// Service observations in document order
    pub services: Vec<ServiceObservation>,
}

impl ScanHost {
    /// Creates a new ScanHost
    pub fn new(address: impl Into<String>, services: Vec<ServiceObservation>) -> Self {
        Self {
            address: address.into(),
            services,
        }
    }

    /// Returns the first observation recorded for `port`/`protocol`
    pub fn service_for(&self, port: u16, protocol: &str) -> Option<&ServiceObservation> {
        self.services
            .iter()
            .find(|s| s.port == port && s.protocol == protocol)
    }
}

/// A single (port, protocol) measurement on a host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceObservation {
    /// Port number
    pub port: u16,

    /// Transport protocol as written in the scan file ("tcp", "udp", ...)
    pub protocol: String,

    /// Port state as written in the scan file ("open", "closed", ...)
    pub state: String,

    /// Fingerprint banner, empty when the service was not probed
    pub banner: String,

    /// Service name (e.g. "http"), possibly empty
    pub service: String,
}

impl ServiceObservation {
    /// Creates an observation with no banner and no service name
    pub fn new(port: u16, protocol: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            port,
            protocol: protocol.into(),
            state: state.into(),
            banner: String::new(),
            service: String::new(),
        }
    }

    /// Sets the banner
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Sets the service name
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Banner if present, otherwise the service name, otherwise empty
    pub fn display_name(&self) -> &str {
        if !self.banner.is_empty() {
            &self.banner
        } else {
            &self.service
        }
    }
}

/// Port states that produce rows, in output order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
}

impl PortState {
    /// Every reportable state in grouping order
    pub const ALL: [PortState; 3] = [PortState::Open, PortState::Closed, PortState::Filtered];

    /// Lowercase name as used in scan files and output
    pub fn as_str(self) -> &'static str {
        match self {
            PortState::Open => "open",
            PortState::Closed => "closed",
            PortState::Filtered => "filtered",
        }
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output columns, declared in schema order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Address,
    Port,
    Protocol,
    Status,
    Banner,
}

impl Column {
    /// The full expanded schema
    pub const ALL: [Column; 5] = [
        Column::Address,
        Column::Port,
        Column::Protocol,
        Column::Status,
        Column::Banner,
    ];

    /// Column header name
    pub fn name(self) -> &'static str {
        match self {
            Column::Address => "address",
            Column::Port => "port",
            Column::Protocol => "protocol",
            Column::Status => "status",
            Column::Banner => "banner",
        }
    }

    /// Looks a column up by header name
    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Active data columns: packing drops the banner
    pub fn data_columns(pack_ports: bool) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|c| !(pack_ports && *c == Column::Banner))
            .collect()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A row of field values, ordered like the schema it was built for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FlatRow(pub Vec<String>);

impl FlatRow {
    /// Field values in schema order
    pub fn values(&self) -> &[String] {
        &self.0
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the row has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FlatRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FlatRow(iter.into_iter().map(Into::into).collect())
    }
}
