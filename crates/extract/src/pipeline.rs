use crate::compare::{compare, ComparisonRow};
use crate::llm::ChatModel;
use crate::schema::AnnotatedDocument;
use crate::Extractor;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Everything one form submission produces
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub original: AnnotatedDocument,
    pub optimized_text: String,
    pub optimized: AnnotatedDocument,
    pub comparison: Vec<ComparisonRow>,
    pub warnings: Vec<String>,
}

impl DemoReport {
    pub fn total_extractions(&self) -> usize {
        self.original.extractions.len() + self.optimized.extractions.len()
    }
}

/// Extract, optimize, extract again, compare. Steps run strictly in sequence.
pub async fn run<M: ChatModel>(extractor: &Extractor<M>, text: &str) -> DemoReport {
    let started = Instant::now();
    let mut warnings = Vec::new();

    let original = extractor.extract(text).await;
    warnings.extend(original.warning);
    let original = AnnotatedDocument::new(text, original.result.extractions);

    let optimized_text = extractor.optimize(text).await;
    warnings.extend(optimized_text.warning);
    let optimized_text = optimized_text.text;

    let optimized = extractor.extract(&optimized_text).await;
    warnings.extend(optimized.warning);
    let optimized = AnnotatedDocument::new(optimized_text.clone(), optimized.result.extractions);

    let comparison = compare(&original, &optimized);

    info!(
        model = %extractor.model().describe(),
        original_extractions = original.extractions.len(),
        optimized_extractions = optimized.extractions.len(),
        warnings = warnings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Pipeline finished"
    );

    DemoReport {
        original,
        optimized_text,
        optimized,
        comparison,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FALLBACK_CLASS;
    use crate::testing::ScriptedModel;

    const TEXT: &str = "She met him in London.";

    #[tokio::test]
    async fn test_full_run() {
        let model = ScriptedModel::new(vec![
            Ok(r#"[{"class": "location", "text": "London"}]"#.to_string()),
            Ok("Ada Lovelace met Charles Babbage in London.".to_string()),
            Ok(r#"```json
{"extractions": [
  {"extraction_class": "person", "extraction_text": "Ada Lovelace"},
  {"extraction_class": "person", "extraction_text": "Charles Babbage"},
  {"extraction_class": "location", "extraction_text": "London"}
]}
```"#
                .to_string()),
        ]);
        let extractor = Extractor::new(model);

        let report = run(&extractor, TEXT).await;
        assert!(report.warnings.is_empty());
        assert_eq!(report.original.text, TEXT);
        assert_eq!(report.original.extractions.len(), 1);
        assert_eq!(report.optimized_text, "Ada Lovelace met Charles Babbage in London.");
        assert_eq!(report.optimized.extractions.len(), 3);
        assert_eq!(report.total_extractions(), 4);
        assert_ne!(report.original.document_id, report.optimized.document_id);

        let extractions = report.comparison.iter().find(|r| r.metric == "Extractions").unwrap();
        assert_eq!((extractions.original, extractions.optimized), (1, 3));
        assert_eq!(extractor.model().temperatures(), vec![0.0, 0.3, 0.0]);
    }

    #[tokio::test]
    async fn test_run_degrades_instead_of_failing() {
        let model = ScriptedModel::new(vec![
            Ok("no json here".to_string()),
            Err("service unavailable".to_string()),
            Err("service unavailable".to_string()),
        ]);
        let extractor = Extractor::new(model);

        let report = run(&extractor, TEXT).await;
        assert_eq!(report.original.extractions.len(), 1);
        assert_eq!(report.original.extractions[0].extraction_class, FALLBACK_CLASS);
        assert_eq!(report.optimized_text, TEXT);
        assert!(report.optimized.extractions.is_empty());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].starts_with("Optimization failed"));
        assert!(report.warnings[1].starts_with("Extraction failed"));
        assert_eq!(report.comparison.len(), 5);
    }
}
