//! Runtime configuration loaded from environment variables.

use thiserror::Error;

/// Retrieval and prompt knobs. All fields have defaults via [`QaConfig::from_env`].
#[derive(Clone, Debug, PartialEq)]
pub struct QaConfig {
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Minimum similarity for a hit to count; `None` keeps every hit.
    pub score_floor: Option<f32>,
    /// Character budget of the context block in the answer prompt.
    pub max_ctx_chars: usize,
    /// Most recent turns kept when prompting; older ones are dropped.
    pub max_history_turns: usize,
    /// Characters of chunk text returned as a source preview.
    pub preview_chars: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            score_floor: None,
            max_ctx_chars: 8000,
            max_history_turns: 10,
            preview_chars: 220,
        }
    }
}

/// Invalid `policy-qa` setting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse `{value}`")]
    Invalid { var: &'static str, value: String },

    #[error("{var}: {detail}")]
    OutOfRange {
        var: &'static str,
        detail: &'static str,
    },
}

impl QaConfig {
    /// Build from environment variables; unset variables keep their default.
    ///
    /// # Errors
    /// [`ConfigError`] when a variable is set but unparsable or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let d = Self::default();

        let top_k = parse(&get, "RAG_TOP_K")?.unwrap_or(d.top_k);
        if top_k == 0 {
            return Err(ConfigError::OutOfRange {
                var: "RAG_TOP_K",
                detail: "must be at least 1",
            });
        }
        let score_floor = parse::<f32>(&get, "RAG_SCORE_FLOOR")?;
        if score_floor.is_some_and(|f| !f.is_finite()) {
            return Err(ConfigError::OutOfRange {
                var: "RAG_SCORE_FLOOR",
                detail: "must be a finite number",
            });
        }
        let max_ctx_chars = parse(&get, "MAX_CTX_CHARS")?.unwrap_or(d.max_ctx_chars);
        if max_ctx_chars == 0 {
            return Err(ConfigError::OutOfRange {
                var: "MAX_CTX_CHARS",
                detail: "must be at least 1",
            });
        }

        Ok(Self {
            top_k,
            score_floor,
            max_ctx_chars,
            max_history_turns: parse(&get, "MAX_HISTORY_TURNS")?.unwrap_or(d.max_history_turns),
            preview_chars: d.preview_chars,
        })
    }
}

fn parse<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    get(var)
        .map(|v| {
            v.parse()
                .map_err(|_| ConfigError::Invalid { var, value: v.clone() })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cfg(pairs: &[(&str, &str)]) -> Result<QaConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        QaConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn unset_variables_keep_defaults() {
        assert_eq!(cfg(&[]).unwrap(), QaConfig::default());
        let c = cfg(&[("RAG_TOP_K", " 8 "), ("RAG_SCORE_FLOOR", "0.25")]).unwrap();
        assert_eq!(c.top_k, 8);
        assert_eq!(c.score_floor, Some(0.25));
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(matches!(
            cfg(&[("RAG_TOP_K", "five")]),
            Err(ConfigError::Invalid { var: "RAG_TOP_K", .. })
        ));
        assert!(matches!(
            cfg(&[("MAX_CTX_CHARS", "0")]),
            Err(ConfigError::OutOfRange { var: "MAX_CTX_CHARS", .. })
        ));
        assert!(matches!(
            cfg(&[("RAG_SCORE_FLOOR", "NaN")]),
            Err(ConfigError::OutOfRange { var: "RAG_SCORE_FLOOR", .. })
        ));
    }
}
