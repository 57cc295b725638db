//! Fixed lookup-table classifier.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{Classification, Classifier, ClassifierError, UNCLASSIFIED};

/// Maps exact (trimmed) queries to categories.
///
/// Queries missing from the table, and entries whose category is
/// [`UNCLASSIFIED`], classify as `Unclassified`. Entries naming a category
/// the registry does not have are returned as-is; the router treats those as
/// unsupported.
#[derive(Debug, Clone, Default)]
pub struct TableClassifier {
    table: HashMap<String, Classification>,
}

impl TableClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut classifier = Self::new();
        for (query, category) in entries {
            classifier = classifier.with(query, category);
        }
        classifier
    }

    pub fn with(mut self, query: &str, category: &str) -> Self {
        let classification = if category == UNCLASSIFIED {
            Classification::Unclassified
        } else {
            Classification::Category(category.to_string())
        };
        self.table.insert(query.trim().to_string(), classification);
        self
    }
}

#[async_trait]
impl Classifier for TableClassifier {
    fn name(&self) -> &str {
        "table"
    }

    async fn classify(&self, query: &str, _categories: &[String]) -> Result<Classification, ClassifierError> {
        Ok(self
            .table
            .get(query.trim())
            .cloned()
            .unwrap_or(Classification::Unclassified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<String> {
        vec!["English".into(), "Chinese".into(), "French".into()]
    }

    fn demo_table() -> TableClassifier {
        TableClassifier::from_entries([
            ("Comment allez-vous?", "French"),
            ("How are you?", "English"),
            ("你好吗？", "Chinese"),
            ("Come stai?", UNCLASSIFIED),
        ])
    }

    #[tokio::test]
    async fn known_queries_map_to_categories() {
        let c = demo_table();
        let cats = categories();
        assert_eq!(
            c.classify("Comment allez-vous?", &cats).await.unwrap(),
            Classification::Category("French".into())
        );
        assert_eq!(
            c.classify("  你好吗？ ", &cats).await.unwrap(),
            Classification::Category("Chinese".into())
        );
    }

    #[tokio::test]
    async fn sentinel_and_unknown_queries_are_unclassified() {
        let c = demo_table();
        let cats = categories();
        assert_eq!(c.classify("Come stai?", &cats).await.unwrap(), Classification::Unclassified);
        assert_eq!(c.classify("Wie geht's?", &cats).await.unwrap(), Classification::Unclassified);
    }
}
