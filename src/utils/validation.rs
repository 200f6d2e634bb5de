//! Input validation primitives.
//!
//! Structural validators for the interactive parameter collector plus
//! small require-style helpers for mandatory fields.

use regex::Regex;

use crate::error::{Error, Result};

/// Accepts `scheme://host.tld/path` shaped URLs. The host must contain at
/// least one dot-separated label; anything without a scheme is rejected.
pub fn is_valid_repo_url(url: &str) -> bool {
    // Compiled per call; the collector runs a handful of times per process.
    let re = Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^/\s]+\.[^/\s]+/\S+$")
        .expect("repo url pattern is valid");
    re.is_match(url)
}

/// Accepts dotted-quad IPv4 addresses with every octet <= 255.
pub fn is_valid_ipv4(addr: &str) -> bool {
    let octets: Vec<&str> = addr.split('.').collect();
    if octets.len() != 4 {
        return false;
    }

    octets.iter().all(|octet| {
        !octet.is_empty()
            && octet.len() <= 3
            && octet.chars().all(|c| c.is_ascii_digit())
            && octet.parse::<u16>().map(|n| n <= 255).unwrap_or(false)
    })
}

/// Parses a TCP port in [1, 65535]. Zero and non-numeric input are rejected.
pub fn parse_port(value: &str) -> Option<u16> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

/// Require a string to be non-empty after trimming.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::Input(format!("{}: {}", field, message)))
    } else {
        Ok(trimmed)
    }
}
