//! Target specification → ordered list of IPv4 addresses.

use std::net::Ipv4Addr;

use clap::ValueEnum;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TargetError;
use crate::netdetect::usable_hosts;

/// Upper bound on addresses a single target may expand to.
pub const MAX_TARGETS: usize = 256;

/// How the raw target text is interpreted.
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// One host, passed through as given.
    Single,
    /// `start-end` inclusive IPv4 range.
    Range,
    /// IPv4 network in CIDR notation, host bits allowed.
    Cidr,
}

impl TargetMode {
    /// Guess the mode from the text: `/` means CIDR, `-` a range, anything else a single host.
    pub fn detect(raw: &str) -> Self {
        if raw.contains('/') {
            TargetMode::Cidr
        } else if raw.contains('-') {
            TargetMode::Range
        } else {
            TargetMode::Single
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetMode::Single => "single",
            TargetMode::Range => "range",
            TargetMode::Cidr => "cidr",
        }
    }
}

/// Resolve a target into at most `limit` addresses, reporting why it failed.
pub fn try_resolve(raw: &str, mode: TargetMode, limit: usize) -> Result<Vec<String>, TargetError> {
    match mode {
        TargetMode::Single => Ok(vec![raw.trim().to_string()]),
        TargetMode::Range => {
            let parts: Vec<&str> = raw.split('-').collect();
            let [a, b] = parts.as_slice() else {
                return Err(TargetError::MalformedRange(raw.to_string()));
            };
            let start = u32::from(parse_ipv4(a)?);
            let end = u32::from(parse_ipv4(b)?);
            Ok((start..=end)
                .take(limit)
                .map(|n| Ipv4Addr::from(n).to_string())
                .collect())
        }
        TargetMode::Cidr => {
            let net: Ipv4Net = raw
                .trim()
                .parse()
                .map_err(|_| TargetError::InvalidNetwork(raw.trim().to_string()))?;
            Ok(usable_hosts(net, limit)
                .into_iter()
                .map(|ip| ip.to_string())
                .collect())
        }
    }
}

/// Resolve a target into at most [`MAX_TARGETS`] addresses. Never fails:
/// malformed input yields an empty list.
pub fn resolve(raw: &str, mode: TargetMode) -> Vec<String> {
    try_resolve(raw, mode, MAX_TARGETS).unwrap_or_else(|e| {
        debug!(input = raw, mode = mode.as_str(), "unresolvable target: {e}");
        Vec::new()
    })
}

fn parse_ipv4(s: &str) -> Result<Ipv4Addr, TargetError> {
    let s = s.trim();
    s.parse::<Ipv4Addr>().map_err(|source| TargetError::InvalidAddress {
        addr: s.to_string(),
        source,
    })
}
