//! Host to flat-row extraction
//!
//! Every host is split into state groups (open, closed, filtered). In
//! expanded mode each observation becomes one row
//! `[address, port, protocol, status, banner]`. In packed mode the ports of
//! a group are joined per protocol into `[address, ports, protocol, status]`.

use crate::error::{Error, Result};
use crate::types::{FlatRow, PortState, ScanHost, ServiceObservation};
use tracing::debug;

/// Protocols that get their own bucket when packing ports
const PACKED_PROTOCOLS: [&str; 2] = ["tcp", "udp"];

/// How hosts are turned into rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Aggregate ports sharing (address, protocol, status) into one row
    pub pack_ports: bool,
    /// Separator between packed port numbers
    pub pack_ports_separator: char,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pack_ports: false,
            pack_ports_separator: ',',
        }
    }
}

/// Converts one host into zero or more rows
///
/// Rows are ordered by state group, then by protocol bucket (packed mode) or
/// by document order (expanded mode).
///
/// # Errors
///
/// Returns [`Error::ServiceResolution`] if an extracted (port, protocol) pair
/// cannot be found again on the host.
///
/// # Examples
///
/// ```
/// use nview_core::extract::{extract, ExtractOptions};
/// use nview_core::types::{ScanHost, ServiceObservation};
///
/// let host = ScanHost::new(
///     "10.0.0.1",
///     vec![
///         ServiceObservation::new(80, "tcp", "open").with_banner("Apache"),
///         ServiceObservation::new(443, "tcp", "open"),
///     ],
/// );
///
/// let packed = ExtractOptions { pack_ports: true, ..Default::default() };
/// let rows = extract(&host, &packed).unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].values(), ["10.0.0.1", "80,443", "tcp", "open"]);
/// ```
pub fn extract(host: &ScanHost, options: &ExtractOptions) -> Result<Vec<FlatRow>> {
    let mut rows = Vec::new();

    for state in PortState::ALL {
        let group: Vec<&ServiceObservation> = host
            .services
            .iter()
            .filter(|s| s.state == state.as_str())
            .collect();

        if options.pack_ports {
            rows.extend(packed_rows(host, state, &group, options.pack_ports_separator));
        } else {
            for observation in group {
                rows.push(expanded_row(host, state, observation)?);
            }
        }
    }

    let skipped = host
        .services
        .iter()
        .filter(|s| !PortState::ALL.iter().any(|st| s.state == st.as_str()))
        .count();
    if skipped > 0 {
        debug!(
            "{}: skipped {} observation(s) with unreported states",
            host.address, skipped
        );
    }

    debug!("{}: extracted {} row(s)", host.address, rows.len());
    Ok(rows)
}

fn expanded_row(
    host: &ScanHost,
    state: PortState,
    observation: &ServiceObservation,
) -> Result<FlatRow> {
    let service = host
        .service_for(observation.port, &observation.protocol)
        .ok_or_else(|| Error::ServiceResolution {
            address: host.address.clone(),
            port: observation.port,
            protocol: observation.protocol.clone(),
        })?;

    Ok(FlatRow(vec![
        host.address.clone(),
        observation.port.to_string(),
        observation.protocol.clone(),
        state.as_str().to_string(),
        service.display_name().to_string(),
    ]))
}

fn packed_rows(
    host: &ScanHost,
    state: PortState,
    group: &[&ServiceObservation],
    separator: char,
) -> Vec<FlatRow> {
    let mut rows = Vec::new();

    for protocol in PACKED_PROTOCOLS {
        let ports: Vec<String> = group
            .iter()
            .filter(|s| s.protocol == protocol)
            .map(|s| s.port.to_string())
            .collect();

        if ports.is_empty() {
            continue;
        }

        rows.push(FlatRow(vec![
            host.address.clone(),
            ports.join(&separator.to_string()),
            protocol.to_string(),
            state.as_str().to_string(),
        ]));
    }

    let other = group
        .iter()
        .filter(|s| !PACKED_PROTOCOLS.contains(&s.protocol.as_str()))
        .count();
    if other > 0 {
        debug!(
            "{}: {} {} port(s) on other protocols not packed",
            host.address, other, state
        );
    }

    rows
}

/// Extracts every host in order
pub fn extract_all(hosts: &[ScanHost], options: &ExtractOptions) -> Result<Vec<FlatRow>> {
    let mut rows = Vec::new();
    for host in hosts {
        rows.extend(extract(host, options)?);
    }
    Ok(rows)
}
