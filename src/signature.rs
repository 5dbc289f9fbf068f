//! Keyword heuristics that attribute a response body to an LLM server.

/// Does `body` look like the service identified by `identifier`?
///
/// The body is lower-cased before testing. Unknown identifiers never match.
pub fn matches(body: &str, identifier: &str) -> bool {
    let r = body.to_lowercase();
    let has = |needle: &str| r.contains(needle);
    match identifier {
        "ollama" => has("ollama") || has("models"),
        "vllm" => is_vllm_lower(&r),
        "lmstudio" => has("lmstudio") || has("lm studio"),
        "llama" => has("llama") || has("ggml"),
        "llamafile" => has("llamafile") || has("mozilla"),
        "jan" => has("jan") || has("models"),
        "cortex" => has("cortex"),
        "local-llm" => has("local") && has("llm"),
        "litellm" => has("litellm") || has("healthy"),
        "gpt4all" => has("gpt4all"),
        "openai" => has("model") || has("openai"),
        _ => false,
    }
}

/// vLLM compound rule, also applied on its own to full-sweep re-probes.
pub fn is_vllm_response(body: &str) -> bool {
    is_vllm_lower(&body.to_lowercase())
}

fn is_vllm_lower(r: &str) -> bool {
    if r.contains("vllm") {
        return true;
    }
    // OpenAI-style model listing: {"object":"list","data":[{"id":..}]}
    if r.contains("\"data\"") && r.contains("\"id\"") && r.contains("\"object\"") {
        return true;
    }
    if r.contains("\"status\"") && r.contains("healthy") {
        return true;
    }
    r.contains("model") && (r.contains("object") || r.contains("models"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vllm_model_listing() {
        assert!(is_vllm_response(r#"{"data":[{"id":"x","object":"model"}]}"#));
        assert!(!is_vllm_response("hello world"));
    }

    #[test]
    fn vllm_clauses() {
        assert!(is_vllm_response("Served by vLLM 0.4"));
        assert!(is_vllm_response(r#"{"STATUS":"Healthy"}"#));
        assert!(is_vllm_response("the model list: models"));
        // quoted literals are required for the data/id/object clause
        assert!(!is_vllm_response("data id"));
        assert!(!is_vllm_response(r#"{"status":"ok"}"#));
    }

    #[test]
    fn ollama_and_jan_accept_model_listings() {
        assert!(matches(r#"{"models":[]}"#, "ollama"));
        assert!(matches("Ollama is running", "ollama"));
        assert!(matches(r#"{"models":[]}"#, "jan"));
        assert!(!matches("nothing here", "ollama"));
    }

    #[test]
    fn local_llm_needs_both_words() {
        assert!(matches("Local LLM server", "local-llm"));
        assert!(!matches("local only", "local-llm"));
        assert!(!matches("llm only", "local-llm"));
    }

    #[test]
    fn keyword_identifiers() {
        assert!(matches("LM Studio", "lmstudio"));
        assert!(matches("ggml backend", "llama"));
        assert!(matches("Mozilla", "llamafile"));
        assert!(matches("cortex.cpp", "cortex"));
        assert!(matches(r#"{"status":"healthy"}"#, "litellm"));
        assert!(matches("GPT4All", "gpt4all"));
        assert!(matches(r#"{"object":"model"}"#, "openai"));
        assert!(matches(r#"{"object":"list","data":[{"id":"m"}]}"#, "vllm"));
    }

    #[test]
    fn unknown_identifier_never_matches() {
        assert!(!matches("ollama vllm llama openai model", "tgi"));
    }
}
