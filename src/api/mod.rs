use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::message::MessageRole;

pub mod client;

pub type ChatId = u64;
pub type ToolId = u64;
pub type PromptId = u64;

/// A conversation record with ordered message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub active_tool_id: Option<ToolId>,
    #[serde(default)]
    pub stop_tool_id: Option<ToolId>,
    #[serde(default)]
    pub system_prompt_id: Option<PromptId>,
    #[serde(default)]
    pub auto_tool_ids: Vec<ToolId>,
    #[serde(default)]
    pub auto_run: bool,
    #[serde(default)]
    pub is_running: bool,
}

impl Chat {
    /// Display name for the sidebar and tab bar. Falls back to the first
    /// user message, then to a numbered placeholder.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref() {
            if !name.trim().is_empty() {
                return name.to_string();
            }
        }
        if let Some(first) = self.history.iter().find(|m| m.role.is_user()) {
            let mut title: String = first.content.chars().take(30).collect();
            if first.content.chars().count() > 30 {
                title.push('…');
            }
            return title;
        }
        format!("Chat {}", self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }
}

/// A callable or schema-described capability attachable to a chat.
///
/// The service stores both variants in one table; the wire record carries
/// the union of their fields and `is_callable` discriminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_callable: bool,

    // Schema-based variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_schema: Option<bool>,

    // Callable variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl Tool {
    pub fn display_name(&self) -> &str {
        let name = if self.is_callable {
            self.name.as_deref()
        } else {
            self.schema_name.as_deref()
        };
        name.unwrap_or("(unnamed tool)")
    }

    pub fn display_description(&self) -> &str {
        let description = if self.is_callable {
            self.description.as_deref()
        } else {
            self.schema_description.as_deref()
        };
        description.unwrap_or("")
    }
}

/// Creation/update payload for a schema-based tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaToolSpec {
    pub schema_name: String,
    pub schema_description: String,
    pub instruction_string: String,
    pub json_schema: Value,
    pub strict_schema: bool,
}

/// Creation/update payload for a callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallableToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Value,
    pub is_callable: bool,
}

/// Either tool payload; serializes to the variant's flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolSpec {
    Callable(CallableToolSpec),
    Schema(SchemaToolSpec),
}

impl ToolSpec {
    pub fn is_callable(&self) -> bool {
        matches!(self, ToolSpec::Callable(_))
    }

    pub fn display_name(&self) -> &str {
        match self {
            ToolSpec::Callable(spec) => &spec.name,
            ToolSpec::Schema(spec) => &spec.schema_name,
        }
    }

    /// The JSON schema a client should validate before submitting.
    pub fn schema(&self) -> &Value {
        match self {
            ToolSpec::Callable(spec) => &spec.input_schema,
            ToolSpec::Schema(spec) => &spec.json_schema,
        }
    }
}

/// A reusable instruction text assignable to a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPrompt {
    pub id: PromptId,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPromptCreate {
    pub name: String,
    pub content: String,
}

/// Wire form of the auto-run flag endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AutoRunState {
    pub auto_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    Json,
    JsonObject,
    FunctionCall,
    Tool,
    AutoTools,
}

impl ResponseFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseFormat::Text => "text",
            ResponseFormat::Json => "json",
            ResponseFormat::JsonObject => "json_object",
            ResponseFormat::FunctionCall => "function_call",
            ResponseFormat::Tool => "tool",
            ResponseFormat::AutoTools => "auto_tools",
        }
    }
}

/// LLM configuration attached to a chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub frequency_penalty: Option<f64>,
    #[serde(default)]
    pub presence_penalty: Option<f64>,
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Partial LLM configuration update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchSummary {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub key_points: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<WebSearchSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    pub query: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub results: Vec<WebSearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_display_name_prefers_explicit_name() {
        let chat = Chat {
            id: 7,
            name: Some("Market research".into()),
            created_at: None,
            history: vec![Message::new(MessageRole::User, "hello")],
            active_tool_id: None,
            stop_tool_id: None,
            system_prompt_id: None,
            auto_tool_ids: vec![],
            auto_run: false,
            is_running: false,
        };
        assert_eq!(chat.display_name(), "Market research");
    }

    #[test]
    fn chat_display_name_falls_back_to_first_user_message() {
        let chat = Chat {
            id: 7,
            name: None,
            created_at: None,
            history: vec![
                Message::new(MessageRole::System, "you are helpful"),
                Message::new(MessageRole::User, "summarize the quarterly earnings call"),
            ],
            active_tool_id: None,
            stop_tool_id: None,
            system_prompt_id: None,
            auto_tool_ids: vec![],
            auto_run: false,
            is_running: false,
        };
        assert_eq!(chat.display_name(), "summarize the quarterly earnin…");
    }

    #[test]
    fn chat_display_name_placeholder_when_empty() {
        let chat = Chat {
            id: 12,
            name: Some("   ".into()),
            created_at: None,
            history: vec![],
            active_tool_id: None,
            stop_tool_id: None,
            system_prompt_id: None,
            auto_tool_ids: vec![],
            auto_run: false,
            is_running: false,
        };
        assert_eq!(chat.display_name(), "Chat 12");
    }

    #[test]
    fn tool_display_name_tracks_variant() {
        let mut tool: Tool = serde_json::from_value(json!({
            "id": 1,
            "schema_name": "extract_entities",
            "schema_description": "Pull entities from text",
            "json_schema": {"type": "object"},
            "strict_schema": true
        }))
        .unwrap();
        assert_eq!(tool.display_name(), "extract_entities");

        tool.is_callable = true;
        tool.name = Some("web_search".into());
        assert_eq!(tool.display_name(), "web_search");
    }

    #[test]
    fn tool_spec_serializes_flat() {
        let spec = ToolSpec::Schema(SchemaToolSpec {
            schema_name: "sentiment".into(),
            schema_description: "Classify sentiment".into(),
            instruction_string: "Respond with the schema".into(),
            json_schema: json!({"type": "object", "properties": {"label": {"type": "string"}}}),
            strict_schema: true,
        });
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["schema_name"], "sentiment");
        assert!(value.get("is_callable").is_none());
    }

    #[test]
    fn response_format_wire_names() {
        assert_eq!(
            serde_json::to_string(&ResponseFormat::AutoTools).unwrap(),
            "\"auto_tools\""
        );
        let parsed: ResponseFormat = serde_json::from_str("\"json_object\"").unwrap();
        assert_eq!(parsed, ResponseFormat::JsonObject);
    }

    #[test]
    fn config_update_skips_absent_fields() {
        let update = LlmConfigUpdate {
            temperature: Some(0.2),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, json!({"temperature": 0.2}));
    }

    #[test]
    fn chat_deserializes_with_missing_optionals() {
        let chat: Chat = serde_json::from_value(json!({
            "id": 3,
            "history": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();
        assert_eq!(chat.id, 3);
        assert!(!chat.is_running);
        assert!(chat.auto_tool_ids.is_empty());
        assert_eq!(chat.history.len(), 1);
    }
}
