//! Typed catalog content and the parser contract.
//!
//! Parsers are stateless: they turn a byte payload into one of the domain
//! objects below. The `Content` enum is the tagged union handed back by the
//! handler chain; callers narrow it with `into_tool()` and friends.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::ParseError;

/// The domain category a MIME type classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Catalog,
    ToolGroup,
    Tool,
    Unclassified,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Catalog => "catalog",
            ContentCategory::ToolGroup => "tool_group",
            ContentCategory::Tool => "tool",
            ContentCategory::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "catalog" => Ok(ContentCategory::Catalog),
            "tool_group" | "toolgroup" => Ok(ContentCategory::ToolGroup),
            "tool" => Ok(ContentCategory::Tool),
            "unclassified" => Ok(ContentCategory::Unclassified),
            other => Err(format!("unknown content category: {other}")),
        }
    }
}

/// A single editing tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Icon resource URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// URI of the model the tool places
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_uri: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,
}

/// A named group of tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolGroup {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub tools: Vec<Tool>,
}

/// A top-level catalog of tool groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub groups: Vec<ToolGroup>,
}

impl Catalog {
    /// Iterate over every tool in every group.
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.groups.iter().flat_map(|g| g.tools.iter())
    }
}

/// Parsed content, tagged by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Content {
    Catalog(Catalog),
    ToolGroup(ToolGroup),
    Tool(Tool),
}

impl Content {
    pub fn category(&self) -> ContentCategory {
        match self {
            Content::Catalog(_) => ContentCategory::Catalog,
            Content::ToolGroup(_) => ContentCategory::ToolGroup,
            Content::Tool(_) => ContentCategory::Tool,
        }
    }

    pub fn into_catalog(self) -> Option<Catalog> {
        match self {
            Content::Catalog(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_tool_group(self) -> Option<ToolGroup> {
        match self {
            Content::ToolGroup(g) => Some(g),
            _ => None,
        }
    }

    pub fn into_tool(self) -> Option<Tool> {
        match self {
            Content::Tool(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Catalog> for Content {
    fn from(c: Catalog) -> Self {
        Content::Catalog(c)
    }
}

impl From<ToolGroup> for Content {
    fn from(g: ToolGroup) -> Self {
        Content::ToolGroup(g)
    }
}

impl From<Tool> for Content {
    fn from(t: Tool) -> Self {
        Content::Tool(t)
    }
}

/// A stateless parser bound to one content category.
pub trait ContentParser: Send + Sync {
    /// The category this parser produces.
    fn category(&self) -> ContentCategory;

    /// Parse a complete payload.
    fn parse(&self, input: &[u8]) -> std::result::Result<Content, ParseError>;
}
