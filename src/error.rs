use std::net::AddrParseError;

use thiserror::Error;

/// Why a target specification produced no addresses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("range must be `start-end`: {0}")]
    MalformedRange(String),

    #[error("invalid IPv4 address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("invalid IPv4 network `{0}`")]
    InvalidNetwork(String),
}

/// A single failed probe. Never leaves the probe layer; it only feeds
/// diagnostics before being collapsed into "closed" / "absent".
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid URL {0}")]
    InvalidUrl(String),

    #[error("not an IPv4 literal: {0}")]
    NotIpv4(String),

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connect to {0} timed out")]
    Timeout(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),
}
