//! Document catalog: the static list of records the shelf browses

use serde::Deserialize;
use thiserror::Error;

/// How a document is previewed, decided once from its file suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Lightweight text markup (`.md`), fetched and rendered to blocks
    Markup,
    /// Anything else, handed to the viewer surface as-is
    Binary,
}

impl DocumentKind {
    /// Classify a file path by suffix, case-insensitively
    pub fn from_path(file: &str) -> Self {
        if file.to_lowercase().ends_with(".md") {
            DocumentKind::Markup
        } else {
            DocumentKind::Binary
        }
    }
}

/// One entry in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub title: String,
    pub category: String,
    /// Pre-formatted display date
    pub date: String,
    /// Path or URL of the underlying asset
    pub file: String,
    kind: DocumentKind,
}

impl DocumentRecord {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        date: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        let file = file.into();
        let kind = DocumentKind::from_path(&file);
        Self {
            title: title.into(),
            category: category.into(),
            date: date.into(),
            file,
            kind,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}

/// Errors raised while turning a catalog payload into records
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index} has an empty title")]
    EmptyTitle { index: usize },
}

/// Wire shape of a record. Every field is optional here so a missing one is
/// reported by name instead of as a generic decode error.
#[derive(Debug, Deserialize)]
struct RawRecord {
    title: Option<String>,
    category: Option<String>,
    date: Option<String>,
    file: Option<String>,
}

impl RawRecord {
    fn into_record(self, index: usize) -> Result<DocumentRecord, CatalogError> {
        let title = self
            .title
            .ok_or(CatalogError::MissingField { index, field: "title" })?;
        let category = self
            .category
            .ok_or(CatalogError::MissingField { index, field: "category" })?;
        let date = self
            .date
            .ok_or(CatalogError::MissingField { index, field: "date" })?;
        let file = self
            .file
            .ok_or(CatalogError::MissingField { index, field: "file" })?;

        if title.trim().is_empty() {
            return Err(CatalogError::EmptyTitle { index });
        }

        Ok(DocumentRecord::new(title, category, date, file))
    }
}

/// Ordered, immutable list of documents loaded once per session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<DocumentRecord>,
}

impl Catalog {
    #[allow(dead_code)]
    pub fn new(records: Vec<DocumentRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON catalog. The load is all-or-nothing: one bad record
    /// rejects the whole payload.
    pub fn from_json(payload: &str) -> Result<Self, CatalogError> {
        let raw: Vec<RawRecord> = serde_json::from_str(payload)?;
        let records = raw
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_record(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&DocumentRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_suffix() {
        assert_eq!(DocumentKind::from_path("notes/n.md"), DocumentKind::Markup);
        assert_eq!(DocumentKind::from_path("NOTES.MD"), DocumentKind::Markup);
        assert_eq!(DocumentKind::from_path("a.pdf"), DocumentKind::Binary);
        assert_eq!(DocumentKind::from_path("readme.md.pdf"), DocumentKind::Binary);
        assert_eq!(DocumentKind::from_path("no_extension"), DocumentKind::Binary);
    }

    #[test]
    fn test_parse_catalog_keeps_order_and_ignores_extra_fields() {
        let payload = r#"[
            {"title": "Report A", "category": "Finance", "date": "2024-01-01", "file": "a.pdf", "pages": 12},
            {"title": "Notes", "category": "Eng", "date": "2024-02-01", "file": "n.md"}
        ]"#;
        let catalog = Catalog::from_json(payload).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].title, "Report A");
        assert_eq!(catalog.records()[0].kind(), DocumentKind::Binary);
        assert_eq!(catalog.records()[1].title, "Notes");
        assert_eq!(catalog.records()[1].kind(), DocumentKind::Markup);
    }

    #[test]
    fn test_empty_array_is_a_valid_catalog() {
        let catalog = Catalog::from_json("[]").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_missing_field_is_reported_by_name() {
        let payload = r#"[
            {"title": "Ok", "category": "A", "date": "d", "file": "ok.pdf"},
            {"title": "Broken", "category": "A", "date": "d"}
        ]"#;
        match Catalog::from_json(payload) {
            Err(CatalogError::MissingField { index, field }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "file");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_title_rejected() {
        let payload = r#"[{"title": "  ", "category": "A", "date": "d", "file": "x.pdf"}]"#;
        assert!(matches!(
            Catalog::from_json(payload),
            Err(CatalogError::EmptyTitle { index: 0 })
        ));
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            Catalog::from_json("{\"title\": \"not a list\"}"),
            Err(CatalogError::Malformed(_))
        ));
        assert!(matches!(
            Catalog::from_json("<html>404</html>"),
            Err(CatalogError::Malformed(_))
        ));
    }
}
