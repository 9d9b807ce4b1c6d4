//! JSON parsers for the typed catalog formats.

use loadstone_core::content::{Catalog, Content, ContentCategory, ContentParser, Tool, ToolGroup};
use loadstone_core::error::ParseError;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// A domain type that always parses into one content category.
pub trait CategorizedContent: DeserializeOwned + Into<Content> {
    const CATEGORY: ContentCategory;
}

impl CategorizedContent for Catalog {
    const CATEGORY: ContentCategory = ContentCategory::Catalog;
}

impl CategorizedContent for ToolGroup {
    const CATEGORY: ContentCategory = ContentCategory::ToolGroup;
}

impl CategorizedContent for Tool {
    const CATEGORY: ContentCategory = ContentCategory::Tool;
}

/// Deserializes a JSON payload into `T` and tags it as `Content`.
pub struct JsonParser<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T: CategorizedContent> JsonParser<T> {
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T: CategorizedContent> Default for JsonParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonParser<Catalog> {
    pub fn catalog() -> Self {
        Self::new()
    }
}

impl JsonParser<ToolGroup> {
    pub fn tool_group() -> Self {
        Self::new()
    }
}

impl JsonParser<Tool> {
    pub fn tool() -> Self {
        Self::new()
    }
}

impl<T: CategorizedContent> ContentParser for JsonParser<T> {
    fn category(&self) -> ContentCategory {
        T::CATEGORY
    }

    fn parse(&self, input: &[u8]) -> Result<Content, ParseError> {
        if input.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::Empty {
                category: T::CATEGORY,
            });
        }

        serde_json::from_slice::<T>(input)
            .map(Into::into)
            .map_err(|e| ParseError::Malformed {
                category: T::CATEGORY,
                reason: e.to_string(),
            })
    }
}
