//! Nmap XML scan-file reader
//!
//! Turns an nmap `-oX` document into a list of [`ScanHost`] values. Only the
//! parts the row extractor needs are read: the host address and, for every
//! `<port>`, its number, protocol, state, service name and banner.
//!
//! # Example
//!
//! ```
//! use nview_core::scan::parse_str;
//!
//! let xml = r#"<nmaprun>
//!   <host>
//!     <address addr="10.0.0.1" addrtype="ipv4"/>
//!     <ports>
//!       <port protocol="tcp" portid="22">
//!         <state state="open"/>
//!         <service name="ssh" product="OpenSSH" method="probed"/>
//!       </port>
//!     </ports>
//!   </host>
//! </nmaprun>"#;
//!
//! let hosts = parse_str(xml, "inline.xml").unwrap();
//! assert_eq!(hosts[0].address, "10.0.0.1");
//! assert_eq!(hosts[0].services[0].banner, "product: OpenSSH");
//! ```

use crate::error::{Error, Result};
use crate::types::{ScanHost, ServiceObservation};
use roxmltree::{Document, Node, ParsingOptions};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Service attributes that never contribute to the banner
const BANNER_SKIPPED_ATTRS: &[&str] = &["name", "method", "conf", "servicefp", "tunnel"];

/// Address types in order of preference
const ADDRESS_PREFERENCE: &[&str] = &["ipv4", "ipv6", "mac"];

/// Leading banner attributes, in this order
const BANNER_LEADING_ATTRS: &[&str] = &["product", "version", "extrainfo"];

/// Reads and parses an nmap XML file
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Parse`] if
/// it is not a well-formed nmap XML document.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<ScanHost>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let hosts = parse_str(&content, path)?;
    debug!("parsed {} host(s) from {}", hosts.len(), path.display());
    Ok(hosts)
}

/// Parses nmap XML from a string; `origin` is only used in error messages
pub fn parse_str(content: &str, origin: impl AsRef<Path>) -> Result<Vec<ScanHost>> {
    let origin = origin.as_ref();
    // nmap writes `<!DOCTYPE nmaprun>`, which roxmltree rejects by default
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let doc =
        Document::parse_with_options(content, options).map_err(|e| Error::parse(origin, e))?;

    let root = doc.root_element();
    if !root.has_tag_name("nmaprun") {
        return Err(Error::parse(
            origin,
            format!(
                "unexpected root element <{}>, expected <nmaprun>",
                root.tag_name().name()
            ),
        ));
    }

    root.children()
        .filter(|n| n.has_tag_name("host"))
        .map(|host| parse_host(host, origin))
        .collect()
}

fn parse_host(host: Node<'_, '_>, origin: &Path) -> Result<ScanHost> {
    let address = host_address(host);

    let mut services = Vec::new();
    for ports in host.children().filter(|n| n.has_tag_name("ports")) {
        for port in ports.children().filter(|n| n.has_tag_name("port")) {
            services.push(parse_port(port, origin)?);
        }
    }

    Ok(ScanHost { address, services })
}

/// IPv4 address if present, then IPv6, then MAC, otherwise the first address
fn host_address(host: Node<'_, '_>) -> String {
    let addresses: Vec<Node<'_, '_>> = host
        .children()
        .filter(|n| n.has_tag_name("address"))
        .collect();

    ADDRESS_PREFERENCE
        .iter()
        .find_map(|kind| {
            addresses
                .iter()
                .find(|a| a.attribute("addrtype") == Some(*kind))
        })
        .or_else(|| addresses.first())
        .and_then(|a| a.attribute("addr"))
        .unwrap_or_default()
        .to_string()
}

fn parse_port(port: Node<'_, '_>, origin: &Path) -> Result<ServiceObservation> {
    let portid = port
        .attribute("portid")
        .ok_or_else(|| Error::parse(origin, "<port> element without portid"))?;
    let number: u16 = portid
        .trim()
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::parse(origin, format!("invalid port number: {}", portid)))?;

    let protocol = port.attribute("protocol").unwrap_or_default();
    if protocol.is_empty() {
        return Err(Error::parse(
            origin,
            format!("<port portid=\"{}\"> without protocol", number),
        ));
    }

    let state = port
        .children()
        .find(|n| n.has_tag_name("state"))
        .and_then(|n| n.attribute("state"))
        .unwrap_or_default();

    let mut observation = ServiceObservation::new(number, protocol, state);
    if let Some(service) = port.children().find(|n| n.has_tag_name("service")) {
        observation.service = service.attribute("name").unwrap_or_default().to_string();
        observation.banner = banner(service);
    }

    Ok(observation)
}

/// Fingerprint banner for a probed service, e.g. `product: nginx version: 1.18.0`
fn banner(service: Node<'_, '_>) -> String {
    if service.attribute("method") != Some("probed") {
        return String::new();
    }

    let mut parts = Vec::new();
    for key in BANNER_LEADING_ATTRS {
        if let Some(value) = service.attribute(*key) {
            parts.push(format!("{}: {}", key, value));
        }
    }
    for attr in service.attributes() {
        let key = attr.name();
        if BANNER_SKIPPED_ATTRS.contains(&key) || BANNER_LEADING_ATTRS.contains(&key) {
            continue;
        }
        parts.push(format!("{}: {}", key, attr.value()));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(hosts: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -sV 10.0.0.1" version="7.94">
{}
<runstats><finished time="0"/></runstats>
</nmaprun>"#,
            hosts
        )
    }

    #[test]
    fn test_parse_single_host() {
        let xml = wrap(
            r#"<host>
<status state="up"/>
<address addr="10.0.0.1" addrtype="ipv4"/>
<ports>
<port protocol="tcp" portid="80"><state state="open"/><service name="http" product="Apache httpd" version="2.4.6" method="probed" conf="10"/></port>
<port protocol="tcp" portid="443"><state state="open"/><service name="https" method="table" conf="3"/></port>
<port protocol="udp" portid="53"><state state="filtered"/></port>
</ports>
</host>"#,
        );

        let hosts = parse_str(&xml, "test.xml").unwrap();
        assert_eq!(hosts.len(), 1);

        let host = &hosts[0];
        assert_eq!(host.address, "10.0.0.1");
        assert_eq!(host.services.len(), 3);

        let http = &host.services[0];
        assert_eq!(http.port, 80);
        assert_eq!(http.protocol, "tcp");
        assert_eq!(http.state, "open");
        assert_eq!(http.service, "http");
        assert_eq!(http.banner, "product: Apache httpd version: 2.4.6");

        let https = &host.services[1];
        assert_eq!(https.service, "https");
        assert_eq!(https.banner, "");

        let dns = &host.services[2];
        assert_eq!(dns.protocol, "udp");
        assert_eq!(dns.state, "filtered");
        assert_eq!(dns.service, "");
    }

    #[test]
    fn test_banner_includes_extra_attributes() {
        let xml = wrap(
            r#"<host><address addr="10.0.0.2" addrtype="ipv4"/><ports>
<port protocol="tcp" portid="22"><state state="open"/>
<service name="ssh" extrainfo="protocol 2.0" ostype="Linux" product="OpenSSH" version="8.2p1" method="probed" conf="10"><cpe>cpe:/a:openbsd:openssh:8.2p1</cpe></service>
</port></ports></host>"#,
        );

        let hosts = parse_str(&xml, "test.xml").unwrap();
        assert_eq!(
            hosts[0].services[0].banner,
            "product: OpenSSH version: 8.2p1 extrainfo: protocol 2.0 ostype: Linux"
        );
    }

    #[test]
    fn test_address_prefers_ip_over_mac() {
        let xml = wrap(
            r#"<host>
<address addr="00:11:22:33:44:55" addrtype="mac"/>
<address addr="192.168.1.10" addrtype="ipv4"/>
</host>
<host>
<address addr="AA:BB:CC:DD:EE:FF" addrtype="mac"/>
</host>"#,
        );

        let hosts = parse_str(&xml, "test.xml").unwrap();
        assert_eq!(hosts[0].address, "192.168.1.10");
        assert_eq!(hosts[1].address, "AA:BB:CC:DD:EE:FF");
        assert!(hosts[0].services.is_empty());
    }

    #[test]
    fn test_address_prefers_ipv4_over_earlier_ipv6() {
        let xml = wrap(
            r#"<host>
<address addr="fe80::1" addrtype="ipv6"/>
<address addr="00:11:22:33:44:55" addrtype="mac"/>
<address addr="10.0.0.7" addrtype="ipv4"/>
</host>
<host>
<address addr="00:11:22:33:44:55" addrtype="mac"/>
<address addr="fe80::2" addrtype="ipv6"/>
</host>"#,
        );

        let hosts = parse_str(&xml, "test.xml").unwrap();
        assert_eq!(hosts[0].address, "10.0.0.7");
        assert_eq!(hosts[1].address, "fe80::2");
    }

    #[test]
    fn test_banner_keeps_rpc_attributes() {
        let xml = wrap(
            r#"<host><address addr="10.0.0.3" addrtype="ipv4"/><ports>
<port protocol="tcp" portid="111"><state state="open"/>
<service name="rpcbind" product="rpcbind" version="2-4" extrainfo="RPC #100000" method="probed" conf="10" proto="rpc" rpcnum="100000" lowver="2" highver="4" servicefp="SF:x" tunnel="ssl"/>
</port></ports></host>"#,
        );

        let hosts = parse_str(&xml, "test.xml").unwrap();
        assert_eq!(
            hosts[0].services[0].banner,
            "product: rpcbind version: 2-4 extrainfo: RPC #100000 \
proto: rpc rpcnum: 100000 lowver: 2 highver: 4"
        );
    }

    #[test]
    fn test_ipv6_address() {
        let xml = wrap(r#"<host><address addr="2001:db8::1" addrtype="ipv6"/></host>"#);
        let hosts = parse_str(&xml, "test.xml").unwrap();
        assert_eq!(hosts[0].address, "2001:db8::1");
    }

    #[test]
    fn test_empty_scan_has_no_hosts() {
        let hosts = parse_str(&wrap(""), "test.xml").unwrap();
        assert!(hosts.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_str("<nmaprun><host>", "broken.xml").unwrap_err();
        match err {
            Error::Parse { path, .. } => assert_eq!(path, Path::new("broken.xml")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_root_is_parse_error() {
        let err = parse_str("<html><body/></html>", "page.html").unwrap_err();
        assert!(err.to_string().contains("expected <nmaprun>"));
    }

    #[test]
    fn test_invalid_portid_is_parse_error() {
        for portid in ["http", "0", "70000"] {
            let xml = wrap(&format!(
                r#"<host><address addr="10.0.0.1" addrtype="ipv4"/><ports>
<port protocol="tcp" portid="{}"><state state="open"/></port></ports></host>"#,
                portid
            ));
            let err = parse_str(&xml, "test.xml").unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "portid {}", portid);
        }
    }

    #[test]
    fn test_missing_protocol_is_parse_error() {
        let xml = wrap(
            r#"<host><address addr="10.0.0.1" addrtype="ipv4"/><ports>
<port portid="80"><state state="open"/></port></ports></host>"#,
        );
        assert!(matches!(
            parse_str(&xml, "test.xml"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_file_missing_is_io_error() {
        let err = parse_file("/nonexistent/nview/scan.xml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
