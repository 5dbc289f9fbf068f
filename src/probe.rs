//! Network probes: TCP liveness and plain HTTP GET.
//!
//! Every failure is swallowed here. A refused port, a timeout, a reset
//! connection and a 404 all look the same to the scanner: nothing there.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode, Url};
use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;

use crate::config::ScanConfig;
use crate::error::ProbeError;

/// Redirect hops followed per GET; hops to named hosts are not followed.
const MAX_REDIRECTS: usize = 10;

/// The two network operations a scan needs. Implemented over real sockets by
/// [`NetProber`]; tests substitute scripted fakes.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Is `ip:port` accepting TCP connections?
    async fn is_open(&self, ip: &str, port: u16) -> bool;

    /// GET `url`; `Some(body)` iff the server answered 200.
    async fn http_get(&self, url: &str) -> Option<String>;
}

/// Socket-backed prober.
#[derive(Debug, Clone)]
pub struct NetProber {
    client: Client,
    connect_timeout: Duration,
}

impl NetProber {
    pub fn new(config: &ScanConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .redirect(redirect::Policy::custom(|attempt| {
                let ipv4_host = attempt
                    .url()
                    .host_str()
                    .is_some_and(|h| h.parse::<Ipv4Addr>().is_ok());
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.error("too many redirects")
                } else if ipv4_host {
                    attempt.follow()
                } else {
                    attempt.stop()
                }
            }))
            .user_agent(concat!("llm-scan-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            connect_timeout: config.connect_timeout,
        })
    }

    async fn try_get(&self, url: &str) -> Result<String, ProbeError> {
        let resp = self.client.get(ipv4_url(url)?).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(ProbeError::Status(resp.status().as_u16()));
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl Prober for NetProber {
    async fn is_open(&self, ip: &str, port: u16) -> bool {
        match connect(ip, port, self.connect_timeout).await {
            Ok(()) => true,
            Err(e) => {
                debug!(ip, port, "closed: {e}");
                false
            }
        }
    }

    async fn http_get(&self, url: &str) -> Option<String> {
        match self.try_get(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                debug!(url, "probe failed: {e}");
                None
            }
        }
    }
}

/// Parse `url`, insisting its host is an IPv4 literal so nothing is looked
/// up by name.
pub fn ipv4_url(url: &str) -> Result<Url, ProbeError> {
    let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl(format!("{url}: {e}")))?;
    let host = parsed.host_str().unwrap_or_default();
    if host.parse::<Ipv4Addr>().is_err() {
        return Err(ProbeError::NotIpv4(host.to_string()));
    }
    Ok(parsed)
}

/// Single TCP connect bounded by `timeout`. No retry, nothing is sent.
pub async fn connect(ip: &str, port: u16, timeout: Duration) -> Result<(), ProbeError> {
    let v4: Ipv4Addr = ip
        .parse()
        .map_err(|_| ProbeError::NotIpv4(ip.to_string()))?;
    let addr = SocketAddr::from((v4, port));
    match time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(source)) => Err(ProbeError::Connect {
            addr: addr.to_string(),
            source,
        }),
        Err(_) => Err(ProbeError::Timeout(addr.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn listening_port_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let prober = NetProber::new(&ScanConfig::default()).unwrap();
        assert!(prober.is_open("127.0.0.1", port).await);
    }

    #[tokio::test]
    async fn closed_port_is_not_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let prober = NetProber::new(&ScanConfig::default()).unwrap();
        assert!(!prober.is_open("127.0.0.1", port).await);
    }

    #[tokio::test]
    async fn hostnames_are_not_resolved() {
        let err = connect("localhost", 80, Duration::from_millis(50)).await;
        assert!(matches!(err, Err(ProbeError::NotIpv4(_))));
    }

    #[test]
    fn http_urls_must_name_an_ipv4_host() {
        assert!(ipv4_url("http://10.0.0.7:11434/api/tags").is_ok());
        assert!(matches!(ipv4_url("http://localhost:11434/api/tags"), Err(ProbeError::NotIpv4(h)) if h == "localhost"));
        assert!(matches!(ipv4_url("http://gpu-box.lan:8000/health"), Err(ProbeError::NotIpv4(_))));
        assert!(matches!(ipv4_url("http://:11434/api/tags"), Err(ProbeError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn http_failure_is_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let prober = NetProber::new(&ScanConfig::default()).unwrap();
        assert_eq!(prober.http_get(&format!("http://127.0.0.1:{port}/")).await, None);
    }
}
