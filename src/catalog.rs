//! Registry of the LLM servers this scanner knows how to recognise.
//!
//! Order matters: services are probed top to bottom and the first signature
//! that matches on a port names the finding, so an ambiguous `/v1/models`
//! answer on 8000 is attributed to vLLM before "OpenAI Compatible API".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A monitored service: where it listens and how to recognise it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub ports: Vec<u16>,
    pub http_paths: Vec<String>,
    pub identifier: String,
}

impl ServiceDescriptor {
    pub fn new(name: &str, ports: &[u16], paths: &[&str], identifier: &str) -> Self {
        Self {
            name: name.to_string(),
            ports: ports.to_vec(),
            http_paths: paths.iter().map(|p| p.to_string()).collect(),
            identifier: identifier.to_string(),
        }
    }

    /// Number of HTTP checks this service costs per IP.
    pub fn check_count(&self) -> usize {
        self.ports.len() * self.http_paths.len()
    }
}

/// Paths re-probed on every open port found by the full-port sweep.
pub const VLLM_PATHS: &[&str] = &["/v1/models", "/health"];

/// The built-in catalog in probing precedence order.
pub fn default_services() -> Vec<ServiceDescriptor> {
    vec![
        ServiceDescriptor::new("Ollama", &[11434], &["/api/tags", "/api/version"], "ollama"),
        ServiceDescriptor::new("vLLM", &[8000], &["/v1/models", "/health"], "vllm"),
        ServiceDescriptor::new("LM Studio", &[1234], &["/v1/models"], "lmstudio"),
        ServiceDescriptor::new("llama.cpp", &[8080], &["/health", "/v1/models"], "llama"),
        ServiceDescriptor::new("Mozilla-Llamafile", &[8080], &["/"], "llamafile"),
        ServiceDescriptor::new("Jan AI", &[1337], &["/v1/models"], "jan"),
        ServiceDescriptor::new("Cortex API", &[1337, 39281], &["/v1/models"], "cortex"),
        ServiceDescriptor::new("Local-LLM", &[8000, 8080], &["/v1/models"], "local-llm"),
        ServiceDescriptor::new("LiteLLM API", &[4000], &["/health", "/v1/models"], "litellm"),
        ServiceDescriptor::new("GPT4All API Server", &[4891], &["/v1/models"], "gpt4all"),
        ServiceDescriptor::new(
            "OpenAI Compatible API",
            &[8000, 8080, 3000, 5000],
            &["/v1/models", "/v1/chat/completions"],
            "openai",
        ),
    ]
}

/// Every port mentioned by any catalog entry.
pub fn known_ports(services: &[ServiceDescriptor]) -> BTreeSet<u16> {
    services
        .iter()
        .flat_map(|s| s.ports.iter().copied())
        .collect()
}

/// Total HTTP checks of the known-service sweep for one IP.
pub fn total_checks(services: &[ServiceDescriptor]) -> usize {
    services.iter().map(ServiceDescriptor::check_count).sum()
}
