use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Name and version of either side of the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub server_info: Implementation,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// A remote-callable operation advertised by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// One named call with its argument map.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub name: String,
    pub arguments: JsonMap<String, Value>,
}

impl InvocationRequest {
    pub fn new(name: impl Into<String>, arguments: JsonMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Short rendering of the argument keys and values for log lines.
    pub fn summary(&self) -> String {
        let mut pairs: Vec<String> = self
            .arguments
            .iter()
            .map(|(key, value)| match value {
                Value::String(text) => format!("{key}={text}"),
                other => format!("{key}={other}"),
            })
            .collect();
        pairs.sort();
        pairs.join(", ")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallToolParams<'a> {
    pub name: &'a str,
    pub arguments: &'a JsonMap<String, Value>,
}

impl<'a> From<&'a InvocationRequest> for CallToolParams<'a> {
    fn from(request: &'a InvocationRequest) -> Self {
        Self {
            name: &request.name,
            arguments: &request.arguments,
        }
    }
}

/// A typed content item of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: Value,
    },
    #[serde(other)]
    Other,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// The envelope returned by `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl InvocationResult {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            ..Self::default()
        }
    }

    /// Text of the first content item, when that item is text.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(ContentItem::as_text)
    }

    /// All text items joined by newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentItem::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
