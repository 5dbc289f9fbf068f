use std::time::Duration;

use crate::catalog::{self, ServiceDescriptor, VLLM_PATHS};
use crate::ports;
use crate::target::MAX_TARGETS;

/// Tunables of one scan. `Default` reproduces the built-in catalog, port
/// ranges and timeouts.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Known services, in probing precedence order.
    pub services: Vec<ServiceDescriptor>,
    /// Ports considered by the full-port sweep before exclusions.
    pub sweep_ports: Vec<u16>,
    /// Ports the full-port sweep never tests.
    pub excluded_ports: Vec<u16>,
    /// Paths re-probed on open sweep ports.
    pub vllm_paths: Vec<String>,
    /// TCP liveness timeout.
    pub connect_timeout: Duration,
    /// HTTP GET timeout.
    pub http_timeout: Duration,
    /// Liveness checks in flight at once during the sweep.
    pub sweep_concurrency: usize,
    /// Cap on addresses a target may expand to.
    pub max_targets: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            services: catalog::default_services(),
            sweep_ports: ports::default_sweep_ports(),
            excluded_ports: ports::EXCLUDED_PORTS.to_vec(),
            vllm_paths: VLLM_PATHS.iter().map(|p| p.to_string()).collect(),
            connect_timeout: Duration::from_millis(200),
            http_timeout: Duration::from_secs(3),
            sweep_concurrency: 100,
            max_targets: MAX_TARGETS,
        }
    }
}

impl ScanConfig {
    /// Ports the full-port sweep will test under this configuration.
    pub fn sweep_candidates(&self) -> Vec<u16> {
        let known = catalog::known_ports(&self.services);
        ports::sweep_candidates(&self.sweep_ports, &self.excluded_ports, &known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ScanConfig::default();
        assert_eq!(c.connect_timeout, Duration::from_millis(200));
        assert_eq!(c.http_timeout, Duration::from_secs(3));
        assert_eq!(c.sweep_concurrency, 100);
        assert_eq!(c.max_targets, 256);
        assert_eq!(c.vllm_paths, vec!["/v1/models", "/health"]);
    }

    #[test]
    fn custom_sweep_still_drops_catalog_ports() {
        let c = ScanConfig {
            sweep_ports: vec![8000, 8001, 11434, 22],
            ..Default::default()
        };
        assert_eq!(c.sweep_candidates(), vec![8001]);
    }
}
