/// Backend used for hosted inference.
///
/// Only the OpenAI REST surface is implemented. Any server speaking the same
/// `/v1/chat/completions` and `/v1/embeddings` protocol (Azure gateways,
/// vLLM, LiteLLM) works by pointing `OPENAI_BASE_URL` at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// OpenAI or an OpenAI-compatible gateway.
    OpenAI,
}

impl LlmProvider {
    /// Parses a provider name as written in `LLM_KIND`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" | "chatgpt" => Some(Self::OpenAI),
            _ => None,
        }
    }
}
