use serde::{Deserialize, Serialize};

/// Status attached to every finding.
pub const STATUS_VULNERABLE: &str = "Vulnerable";

/// Maximum number of characters of a response body kept in a finding.
pub const RESPONSE_SNIPPET_CHARS: usize = 500;

/// One exposed service discovered on an IP:port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub ip: String,
    pub port: u16,
    pub service: String,
    pub status: String,
    pub vulnerability: String,
    pub timestamp: String,
    pub url: String,
    pub response: String,
    pub details: String,
}

impl ResultRecord {
    /// Build a finding, truncating the body to the snippet limit.
    pub fn vulnerable(
        ip: &str,
        port: u16,
        service: &str,
        url: String,
        body: &str,
        details: String,
    ) -> Self {
        Self {
            ip: ip.to_string(),
            port,
            service: service.to_string(),
            status: STATUS_VULNERABLE.to_string(),
            vulnerability: format!("{service} unauthorized access"),
            timestamp: crate::clock::now_rfc3339(),
            url,
            response: truncate_chars(body, RESPONSE_SNIPPET_CHARS),
            details,
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Severity of a log line in the event stream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// Everything a scan reports to its consumer.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanEvent {
    Log { text: String, level: LogLevel },
    Progress { percent: u8 },
    Done { results: Vec<ResultRecord> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_is_truncated_to_500_chars() {
        let body = "é".repeat(800);
        let rec = ResultRecord::vulnerable("10.0.0.1", 11434, "Ollama", "u".into(), &body, "d".into());
        assert_eq!(rec.response.chars().count(), 500);
        assert_eq!(rec.status, "Vulnerable");
        assert_eq!(rec.vulnerability, "Ollama unauthorized access");
    }

    #[test]
    fn short_response_kept_verbatim() {
        let rec = ResultRecord::vulnerable("10.0.0.1", 1, "vLLM", "u".into(), "{\"ok\":1}", String::new());
        assert_eq!(rec.response, "{\"ok\":1}");
    }

    #[test]
    fn record_serializes_with_flat_field_names() {
        let rec = ResultRecord::vulnerable("10.0.0.1", 8000, "vLLM", "http://10.0.0.1:8000/health".into(), "ok", "x".into());
        let v = serde_json::to_value(&rec).unwrap();
        for key in ["ip", "port", "service", "status", "vulnerability", "timestamp", "url", "response", "details"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert_eq!(v["port"], 8000);
    }
}
