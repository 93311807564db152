use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::Url;

static ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];

/// Validate a URL proposed for a network action.
///
/// Accepts only the allowed schemes and rejects anything that resolves into
/// the local or private address space: loopback, RFC 1918 ranges, link-local
/// (cloud metadata endpoints live there), unspecified addresses and their
/// IPv6 equivalents, including IPv4-mapped IPv6. Returns the parsed URL on
/// success and the rejection reason on failure.
pub fn check_url(raw: &str) -> Result<Url, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Empty URL".to_string());
    }

    let url = Url::parse(raw).map_err(|e| format!("Invalid URL: {}", e))?;

    let scheme = url.scheme();
    if !ALLOWED_SCHEMES.contains(&scheme) {
        return Err(format!("URL scheme not allowed: {}", scheme));
    }

    let host = url
        .host_str()
        .ok_or_else(|| "URL has no host".to_string())?;

    // Name-based loopback, checked as a substring so `localhost.evil.com`
    // style spellings are refused too.
    if host.to_lowercase().contains("localhost") {
        return Err(format!("Access to local address not allowed: {}", host));
    }

    if let Ok(ip) = host.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
        if let Some(range) = private_range(&ip) {
            return Err(format!(
                "Access to private address not allowed: {} ({})",
                host, range
            ));
        }
    }

    Ok(url)
}

/// Return the name of the private/local range an address falls in, if any.
fn private_range(ip: &IpAddr) -> Option<&'static str> {
    match ip {
        IpAddr::V4(v4) => private_range_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return private_range_v4(&mapped);
            }
            private_range_v6(v6)
        }
    }
}

fn private_range_v4(ip: &Ipv4Addr) -> Option<&'static str> {
    let octets = ip.octets();
    match octets {
        [127, ..] => Some("loopback"),
        [10, ..] => Some("private 10.0.0.0/8"),
        [172, b, ..] if (16..=31).contains(&b) => Some("private 172.16.0.0/12"),
        [192, 168, ..] => Some("private 192.168.0.0/16"),
        [169, 254, ..] => Some("link-local 169.254.0.0/16"),
        [0, 0, 0, 0] => Some("unspecified"),
        _ => None,
    }
}

fn private_range_v6(ip: &Ipv6Addr) -> Option<&'static str> {
    if *ip == Ipv6Addr::LOCALHOST {
        return Some("loopback");
    }
    if *ip == Ipv6Addr::UNSPECIFIED {
        return Some("unspecified");
    }
    let segments = ip.segments();
    if segments[0] & 0xfe00 == 0xfc00 {
        return Some("unique-local fc00::/7");
    }
    if segments[0] & 0xffc0 == 0xfe80 {
        return Some("link-local fe80::/10");
    }
    None
}
