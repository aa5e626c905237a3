//! SSRF target policy.
//!
//! Every URL the prober touches is checked here: the original host and,
//! independently, every redirect destination. Blocked targets are:
//! - loopback (`127.0.0.0/8`, `::1`, `localhost`)
//! - RFC 1918 private ranges (`10/8`, `172.16/12`, `192.168/16`)
//! - link-local, including the `169.254/16` cloud metadata range and `fe80::/10`
//! - unique-local IPv6 (`fc00::/7`), unspecified and multicast addresses
//! - cloud metadata hostnames and anything under `.internal`
//! - non-HTTP(S) schemes
//!
//! [`SafeResolver`] applies the same address policy to DNS answers so a public
//! name that resolves to an internal address is refused before connecting.

use hyper::client::connect::dns::Name;
use reqwest::dns::{Addrs, Resolve, Resolving};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use url::{Host, Url};

const METADATA_HOSTS: &[&str] = &[
    "metadata",
    "metadata.google.internal",
    "metadata.goog",
    "instance-data",
    "instance-data.ec2.internal",
];

/// Why a target was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    Scheme(String),
    MissingHost,
    Localhost,
    MetadataHost,
    InternalSuffix,
    PrivateAddress(IpAddr),
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::Scheme(s) => write!(f, "scheme '{}' not allowed", s),
            BlockReason::MissingHost => write!(f, "no host"),
            BlockReason::Localhost => write!(f, "localhost"),
            BlockReason::MetadataHost => write!(f, "cloud metadata host"),
            BlockReason::InternalSuffix => write!(f, ".internal host"),
            BlockReason::PrivateAddress(ip) => write!(f, "non-public address {}", ip),
        }
    }
}

/// Check a URL: scheme first, then its host
pub fn check_url(url: &Url) -> Result<(), BlockReason> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(BlockReason::Scheme(other.to_string())),
    }

    match url.host() {
        Some(Host::Domain(domain)) => check_hostname(domain),
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip)),
        None => Err(BlockReason::MissingHost),
    }
}

/// Check a bare hostname or IP literal (IPv6 may be bracketed)
pub fn check_host(host: &str) -> Result<(), BlockReason> {
    let trimmed = host.trim().trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = trimmed.parse::<IpAddr>() {
        return check_ip(ip);
    }
    check_hostname(trimmed)
}

pub fn is_blocked_host(host: &str) -> bool {
    check_host(host).is_err()
}

pub fn is_blocked_url(url: &Url) -> bool {
    check_url(url).is_err()
}

fn check_hostname(host: &str) -> Result<(), BlockReason> {
    let host = host.trim_end_matches('.').to_lowercase();

    if host.is_empty() {
        return Err(BlockReason::MissingHost);
    }
    if host == "localhost" || host.ends_with(".localhost") || host == "localhost.localdomain" {
        return Err(BlockReason::Localhost);
    }
    if METADATA_HOSTS.contains(&host.as_str()) {
        return Err(BlockReason::MetadataHost);
    }
    if host == "internal" || host.ends_with(".internal") {
        return Err(BlockReason::InternalSuffix);
    }
    Ok(())
}

fn check_ip(ip: IpAddr) -> Result<(), BlockReason> {
    if is_public_ip(ip) {
        Ok(())
    } else {
        Err(BlockReason::PrivateAddress(ip))
    }
}

pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_ipv4(v4),
        IpAddr::V6(v6) => is_public_ipv6(v6),
    }
}

fn is_public_ipv4(ip: Ipv4Addr) -> bool {
    let o = ip.octets();
    // 127.0.0.0/8 loopback
    if o[0] == 127 {
        return false;
    }
    // 10.0.0.0/8
    if o[0] == 10 {
        return false;
    }
    // 172.16.0.0/12
    if o[0] == 172 && (16..=31).contains(&o[1]) {
        return false;
    }
    // 192.168.0.0/16
    if o[0] == 192 && o[1] == 168 {
        return false;
    }
    // 169.254.0.0/16 link-local and cloud metadata
    if o[0] == 169 && o[1] == 254 {
        return false;
    }
    // 0.0.0.0/8
    if o[0] == 0 {
        return false;
    }
    // 100.64.0.0/10 carrier-grade NAT
    if o[0] == 100 && (64..=127).contains(&o[1]) {
        return false;
    }
    // 224.0.0.0/4 multicast and 240.0.0.0/4 reserved
    if o[0] >= 224 {
        return false;
    }
    true
}

fn is_public_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_ipv4(v4);
    }

    let s = ip.segments();
    // ::1 loopback and :: unspecified
    if ip.is_loopback() || ip.is_unspecified() {
        return false;
    }
    // fc00::/7 unique-local
    if (s[0] & 0xfe00) == 0xfc00 {
        return false;
    }
    // fe80::/10 link-local
    if (s[0] & 0xffc0) == 0xfe80 {
        return false;
    }
    // ff00::/8 multicast
    if (s[0] & 0xff00) == 0xff00 {
        return false;
    }
    true
}

/// DNS resolver that drops every non-public answer.
///
/// Wraps the system resolver; if no public address is left the lookup
/// fails, so reqwest never opens a socket to an internal address even when
/// a public name points at one.
#[derive(Debug, Clone, Default)]
pub struct SafeResolver;

impl Resolve for SafeResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let host = name.as_str().to_string();
            if let Err(reason) = check_hostname(&host) {
                return Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("blocked host '{}': {}", host, reason),
                )) as Box<dyn std::error::Error + Send + Sync>);
            }

            let addrs: Vec<SocketAddr> = tokio::net::lookup_host(format!("{}:0", host))
                .await
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?
                .filter(|addr| is_public_ip(addr.ip()))
                .collect();

            if addrs.is_empty() {
                tracing::debug!(host = %host, "All resolved addresses are non-public");
                return Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("all resolved addresses for '{}' are non-public", host),
                )) as Box<dyn std::error::Error + Send + Sync>);
            }

            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}
