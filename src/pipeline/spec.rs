//! Run specification types.
//!
//! A [`RunSpec`] describes a word-count run declaratively: tokenizer policy,
//! runtime execution limits, and strictness settings. These types are the
//! input to the [`super::validation::ValidationEngine`], and
//! [`RunSpec::to_config`] materializes the equivalent
//! [`WordCountConfig`](crate::types::WordCountConfig).
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "v": 1,
//!   "tokenizer": { "case": "fold", "punctuation": ".,!?" },
//!   "runtime": { "workers": 4, "batch_size": 1024, "max_tokens": 200000 },
//!   "strict": false
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{CasePolicy, WordCountConfig};

/// Top-level run specification (v1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    /// Spec version (currently `1`).
    pub v: u32,

    /// Tokenizer policy. Omitted fields keep their defaults.
    #[serde(default)]
    pub tokenizer: TokenizerSpec,

    /// Runtime execution limits.
    #[serde(default)]
    pub runtime: RuntimeSpec,

    /// If `true`, unrecognized fields are errors; if `false`, warnings.
    #[serde(default)]
    pub strict: bool,

    /// Captures any fields not recognized by the schema.
    /// Used by the strict-mode validation rule.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

/// Tokenizer policy selections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenizerSpec {
    /// Case-folding policy (`"preserve"` or `"fold"`). Defaults to
    /// `"preserve"`: `"The"` and `"the"` count separately.
    #[serde(default)]
    pub case: Option<CasePolicy>,

    /// Override for the punctuation set, given as a string of characters.
    #[serde(default)]
    pub punctuation: Option<String>,

    /// Captures any fields not recognized by the schema.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

/// Runtime execution limits and concurrency policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeSpec {
    /// Worker-pool size for the parallel phases.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Tokens per map task.
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Maximum number of input tokens before rejecting the run.
    #[serde(default)]
    pub max_tokens: Option<usize>,

    /// Captures any fields not recognized by the schema.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl RunSpec {
    /// Materialize the configuration this spec describes.
    ///
    /// Call [`ValidationEngine::validate`](super::validation::ValidationEngine::validate)
    /// first; `to_config` does not re-check limits.
    pub fn to_config(&self) -> WordCountConfig {
        let mut config = WordCountConfig::default();
        if let Some(case) = self.tokenizer.case {
            config.case = case;
        }
        if let Some(punctuation) = &self.tokenizer.punctuation {
            config.punctuation = punctuation.chars().collect();
        }
        config.workers = self.runtime.workers;
        config.batch_size = self.runtime.batch_size;
        config.max_tokens = self.runtime.max_tokens;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_spec() {
        let json = r#"{ "v": 1 }"#;
        let spec: RunSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.v, 1);
        assert!(spec.tokenizer.case.is_none());
        assert!(spec.runtime.workers.is_none());
        assert!(!spec.strict);
    }

    #[test]
    fn test_deserialize_full_spec() {
        let json = r#"{
            "v": 1,
            "tokenizer": { "case": "fold", "punctuation": ".,!?" },
            "runtime": { "workers": 4, "batch_size": 1024, "max_tokens": 200000 },
            "strict": true
        }"#;
        let spec: RunSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.tokenizer.case, Some(CasePolicy::Fold));
        assert_eq!(spec.tokenizer.punctuation.as_deref(), Some(".,!?"));
        assert_eq!(spec.runtime.workers, Some(4));
        assert_eq!(spec.runtime.batch_size, Some(1024));
        assert_eq!(spec.runtime.max_tokens, Some(200000));
        assert!(spec.strict);
    }

    #[test]
    fn test_unknown_fields_captured() {
        let json = r#"{
            "v": 1,
            "bogus_top_level": 42,
            "runtime": { "workers": 2, "bogus_limit": 7 }
        }"#;
        let spec: RunSpec = serde_json::from_str(json).unwrap();
        assert!(spec.unknown_fields.contains_key("bogus_top_level"));
        assert!(spec.runtime.unknown_fields.contains_key("bogus_limit"));
    }

    #[test]
    fn test_to_config_defaults() {
        let spec: RunSpec = serde_json::from_str(r#"{ "v": 1 }"#).unwrap();
        let config = spec.to_config();
        assert_eq!(config.case, CasePolicy::Preserve);
        assert!(config.punctuation.contains(&'.'));
        assert!(config.workers.is_none());
    }

    #[test]
    fn test_to_config_applies_selections() {
        let json = r#"{
            "v": 1,
            "tokenizer": { "case": "fold", "punctuation": "." },
            "runtime": { "workers": 2, "batch_size": 16 }
        }"#;
        let spec: RunSpec = serde_json::from_str(json).unwrap();
        let config = spec.to_config();
        assert_eq!(config.case, CasePolicy::Fold);
        assert!(config.punctuation.contains(&'.'));
        assert!(!config.punctuation.contains(&','));
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.batch_size, Some(16));
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = r#"{"v":1,"tokenizer":{"case":"fold"},"runtime":{"workers":8}}"#;
        let spec: RunSpec = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&spec).unwrap();
        assert_eq!(back["tokenizer"]["case"], "fold");
        assert_eq!(back["runtime"]["workers"], 8);
    }
}
