use crate::normalize::normalize_entity;
use crate::schema::AnnotatedDocument;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One line of the before/after table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub metric: String,
    pub original: usize,
    pub optimized: usize,
}

impl ComparisonRow {
    fn new(metric: &str, original: usize, optimized: usize) -> Self {
        Self {
            metric: metric.to_string(),
            original,
            optimized,
        }
    }

    /// Signed change from original to optimized
    pub fn delta(&self) -> i64 {
        self.optimized as i64 - self.original as i64
    }
}

/// Compare the original document with its optimized counterpart
pub fn compare(original: &AnnotatedDocument, optimized: &AnnotatedDocument) -> Vec<ComparisonRow> {
    let a = DocumentStats::of(original);
    let b = DocumentStats::of(optimized);

    vec![
        ComparisonRow::new("Length", a.length, b.length),
        ComparisonRow::new("Unique Words", a.unique_words, b.unique_words),
        ComparisonRow::new("Extractions", a.extractions, b.extractions),
        ComparisonRow::new("Distinct Classes", a.distinct_classes, b.distinct_classes),
        ComparisonRow::new("Distinct Entities", a.distinct_entities, b.distinct_entities),
    ]
}

struct DocumentStats {
    length: usize,
    unique_words: usize,
    extractions: usize,
    distinct_classes: usize,
    distinct_entities: usize,
}

impl DocumentStats {
    fn of(doc: &AnnotatedDocument) -> Self {
        let unique_words: HashSet<&str> = doc.text.split_whitespace().collect();
        let classes: HashSet<String> = doc
            .extractions
            .iter()
            .map(|e| e.extraction_class.to_lowercase())
            .collect();
        let entities: HashSet<String> = doc
            .extractions
            .iter()
            .map(|e| normalize_entity(&e.extraction_text))
            .filter(|name| !name.is_empty())
            .collect();

        Self {
            length: doc.text.chars().count(),
            unique_words: unique_words.len(),
            extractions: doc.extractions.len(),
            distinct_classes: classes.len(),
            distinct_entities: entities.len(),
        }
    }
}
