pub mod schema;
pub mod normalize;
pub mod llm;
pub mod prompt;
pub mod parser;
pub mod visualize;
pub mod compare;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

pub use schema::{AnnotatedDocument, Extraction, ExtractionResult};
pub use llm::{ChatModel, Provider, ProviderClient, StatusError};
pub use compare::{compare, ComparisonRow};
pub use pipeline::{run, DemoReport};

use std::time::Instant;
use tracing::{info, warn};

/// Sampling temperatures for the two kinds of calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub extract_temperature: f32,
    pub optimize_temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            extract_temperature: 0.0,
            optimize_temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub result: ExtractionResult,
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    pub text: String,
    pub warning: Option<String>,
}

pub struct Extractor<M> {
    model: M,
    settings: GenerationSettings,
}

impl<M: ChatModel> Extractor<M> {
    pub fn new(model: M) -> Self {
        Self::with_settings(model, GenerationSettings::default())
    }

    pub fn with_settings(model: M, settings: GenerationSettings) -> Self {
        Self { model, settings }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Extract entities from a block of text.
    ///
    /// Provider failures are not errors here: they come back as a warning
    /// with an empty record set.
    pub async fn extract(&self, text: &str) -> ExtractionOutcome {
        if text.trim().is_empty() {
            return ExtractionOutcome::default();
        }

        let started = Instant::now();
        let prompt = prompt::build_extraction_prompt(text);

        match self.model.complete(&prompt, self.settings.extract_temperature).await {
            Ok(reply) => {
                let extractions = parser::parse_extractions(&reply, text);
                info!(
                    model = %self.model.describe(),
                    chars = text.chars().count(),
                    extractions = extractions.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Extraction finished"
                );
                ExtractionOutcome {
                    result: ExtractionResult { extractions },
                    warning: None,
                }
            }
            Err(e) => {
                warn!(model = %self.model.describe(), error = %e, "Extraction failed");
                ExtractionOutcome {
                    result: ExtractionResult::default(),
                    warning: Some(format!("Extraction failed: {e:#}")),
                }
            }
        }
    }

    /// Ask the model for a rewrite that is easier to extract from.
    ///
    /// On failure, or when the model returns nothing, the original text is
    /// returned unchanged together with a warning.
    pub async fn optimize(&self, text: &str) -> OptimizeOutcome {
        let started = Instant::now();
        let prompt = prompt::build_optimize_prompt(text);

        match self.model.complete(&prompt, self.settings.optimize_temperature).await {
            Ok(reply) => {
                let optimized = parser::parse_optimized_text(&reply);
                if optimized.is_empty() {
                    warn!(model = %self.model.describe(), "Optimization returned empty text");
                    return OptimizeOutcome {
                        text: text.to_string(),
                        warning: Some(
                            "Optimization returned empty text; showing the original text."
                                .to_string(),
                        ),
                    };
                }

                info!(
                    model = %self.model.describe(),
                    original_chars = text.chars().count(),
                    optimized_chars = optimized.chars().count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Optimization finished"
                );
                OptimizeOutcome {
                    text: optimized,
                    warning: None,
                }
            }
            Err(e) => {
                warn!(model = %self.model.describe(), error = %e, "Optimization failed");
                OptimizeOutcome {
                    text: text.to_string(),
                    warning: Some(format!(
                        "Optimization failed: {e:#}. Showing the original text."
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    #[tokio::test]
    async fn test_extract_parses_reply() {
        let model = ScriptedModel::new(vec![Ok(
            r#"[{"extraction_class": "person", "extraction_text": "Ada"}]"#.to_string(),
        )]);
        let extractor = Extractor::new(model);

        let outcome = extractor.extract("Ada wrote code.").await;
        assert!(outcome.warning.is_none());
        assert_eq!(outcome.result.extractions, vec![Extraction::new("person", "Ada")]);
        assert_eq!(extractor.model().temperatures(), vec![0.0]);
    }

    #[tokio::test]
    async fn test_extract_skips_blank_text() {
        let extractor = Extractor::new(ScriptedModel::new(vec![]));
        let outcome = extractor.extract("   ").await;
        assert!(outcome.result.extractions.is_empty());
        assert_eq!(extractor.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_extract_failure_becomes_warning() {
        let extractor = Extractor::new(ScriptedModel::new(vec![Err("timeout".to_string())]));
        let outcome = extractor.extract("Ada wrote code.").await;
        assert!(outcome.result.extractions.is_empty());
        assert!(outcome.warning.unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn test_optimize_returns_rewrite() {
        let model = ScriptedModel::new(vec![Ok("```\nAda Lovelace wrote code.\n```".to_string())]);
        let extractor = Extractor::with_settings(
            model,
            GenerationSettings {
                extract_temperature: 0.1,
                optimize_temperature: 0.7,
            },
        );

        let outcome = extractor.optimize("She wrote code.").await;
        assert_eq!(outcome.text, "Ada Lovelace wrote code.");
        assert!(outcome.warning.is_none());
        assert_eq!(extractor.model().temperatures(), vec![0.7]);
    }

    #[tokio::test]
    async fn test_optimize_failure_keeps_original_text() {
        let extractor = Extractor::new(ScriptedModel::new(vec![Err("quota exceeded".to_string())]));
        let outcome = extractor.optimize("She wrote code.").await;
        assert_eq!(outcome.text, "She wrote code.");
        assert!(outcome.warning.unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_optimize_empty_reply_keeps_original_text() {
        let extractor = Extractor::new(ScriptedModel::new(vec![Ok("  ".to_string())]));
        let outcome = extractor.optimize("She wrote code.").await;
        assert_eq!(outcome.text, "She wrote code.");
        assert!(outcome.warning.is_some());
    }
}
