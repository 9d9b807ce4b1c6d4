//! MIME type → content category classification.

use loadstone_core::content::ContentCategory;
use std::collections::HashMap;

pub const CATALOG_MIME: &str = "application/vnd.example.catalog";
pub const TOOL_GROUP_MIME: &str = "application/vnd.example.toolgroup";
pub const TOOL_MIME: &str = "application/vnd.example.tool";

/// Maps MIME types to categories.
///
/// Keys are stored lowercased without parameters, so lookups ignore ASCII
/// case and anything after `;`. Unknown types are `Unclassified`.
#[derive(Debug, Clone)]
pub struct MimeTable {
    entries: HashMap<String, ContentCategory>,
}

impl MimeTable {
    /// A table with no entries; everything is `Unclassified`.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, mime: &str, category: ContentCategory) {
        self.entries.insert(essence(mime), category);
    }

    pub fn with(mut self, mime: &str, category: ContentCategory) -> Self {
        self.insert(mime, category);
        self
    }

    /// Add every mapping from `extra`, overriding existing ones.
    pub fn extend<'a, I>(&mut self, extra: I)
    where
        I: IntoIterator<Item = (&'a String, &'a ContentCategory)>,
    {
        for (mime, category) in extra {
            self.insert(mime, *category);
        }
    }

    pub fn classify(&self, mime: &str) -> ContentCategory {
        self.entries
            .get(&essence(mime))
            .copied()
            .unwrap_or(ContentCategory::Unclassified)
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::empty()
            .with(CATALOG_MIME, ContentCategory::Catalog)
            .with(TOOL_GROUP_MIME, ContentCategory::ToolGroup)
            .with(TOOL_MIME, ContentCategory::Tool)
    }
}

/// `Application/Vnd.Example.Tool; charset=utf-8` → `application/vnd.example.tool`
fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_classifies_known_types() {
        let table = MimeTable::default();
        assert_eq!(table.classify(TOOL_MIME), ContentCategory::Tool);
        assert_eq!(table.classify(TOOL_GROUP_MIME), ContentCategory::ToolGroup);
        assert_eq!(table.classify(CATALOG_MIME), ContentCategory::Catalog);
        assert_eq!(
            table.classify("application/json"),
            ContentCategory::Unclassified
        );
    }

    #[test]
    fn lookup_ignores_case_and_parameters() {
        let table = MimeTable::default();
        assert_eq!(
            table.classify("Application/VND.example.Tool; charset=UTF-8"),
            ContentCategory::Tool
        );
        assert_eq!(table.classify(""), ContentCategory::Unclassified);
    }

    #[test]
    fn extend_overrides_entries() {
        let mut table = MimeTable::default();
        let extra: HashMap<String, ContentCategory> = [
            ("application/x-furniture".to_string(), ContentCategory::Catalog),
            (TOOL_MIME.to_string(), ContentCategory::Unclassified),
        ]
        .into_iter()
        .collect();
        table.extend(&extra);

        assert_eq!(
            table.classify("application/x-furniture"),
            ContentCategory::Catalog
        );
        assert_eq!(table.classify(TOOL_MIME), ContentCategory::Unclassified);
    }
}
