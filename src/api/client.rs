use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::api::{
    AutoRunState, Chat, ChatId, LlmConfig, LlmConfigUpdate, PromptId, ResearchResult,
    SystemPrompt, SystemPromptCreate, Tool, ToolId, ToolSpec,
};
use crate::utils::url::construct_api_url;

/// Failure reaching or talking to the conversation service.
#[derive(Debug)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, bad TLS).
    Transport(reqwest::Error),

    /// The service answered with a non-success status.
    Status {
        status: StatusCode,
        detail: String,
    },

    /// The response body did not match the expected record shape.
    Decode(reqwest::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(source) => write!(f, "request failed: {source}"),
            ApiError::Status { status, detail } => {
                if detail.is_empty() {
                    write!(f, "server returned {status}")
                } else {
                    write!(f, "server returned {status}: {detail}")
                }
            }
            ApiError::Decode(source) => write!(f, "invalid response body: {source}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(source) | ApiError::Decode(source) => Some(source),
            ApiError::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(source: reqwest::Error) -> Self {
        ApiError::Transport(source)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The remote conversation-management surface.
///
/// Implemented over HTTP by [`HttpApi`]; tests drive the state layer with an
/// in-memory implementation instead.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn list_chats(&self) -> ApiResult<Vec<Chat>>;
    async fn create_chat(&self) -> ApiResult<Chat>;
    async fn fetch_chat(&self, id: ChatId) -> ApiResult<Chat>;
    async fn delete_chat(&self, id: ChatId) -> ApiResult<()>;
    async fn rename_chat(&self, id: ChatId, name: &str) -> ApiResult<Chat>;

    async fn send_message(&self, id: ChatId, content: &str) -> ApiResult<Chat>;
    async fn trigger_assistant(&self, id: ChatId) -> ApiResult<Chat>;
    async fn clear_history(&self, id: ChatId) -> ApiResult<Chat>;

    async fn fetch_config(&self, id: ChatId) -> ApiResult<LlmConfig>;
    async fn update_config(&self, id: ChatId, update: &LlmConfigUpdate) -> ApiResult<LlmConfig>;
    async fn fetch_auto_run(&self, id: ChatId) -> ApiResult<bool>;
    async fn set_auto_run(&self, id: ChatId, enabled: bool) -> ApiResult<Chat>;
    async fn set_auto_tools(&self, id: ChatId, tool_ids: &[ToolId]) -> ApiResult<Chat>;

    async fn assign_tool(&self, id: ChatId, tool_id: ToolId) -> ApiResult<Chat>;
    async fn remove_tool(&self, id: ChatId) -> ApiResult<Chat>;
    async fn set_stop_tool(&self, id: ChatId, tool_id: ToolId) -> ApiResult<Chat>;
    async fn remove_stop_tool(&self, id: ChatId) -> ApiResult<Chat>;
    async fn assign_prompt(&self, id: ChatId, prompt_id: PromptId) -> ApiResult<Chat>;
    async fn remove_prompt(&self, id: ChatId) -> ApiResult<Chat>;

    async fn list_tools(&self) -> ApiResult<Vec<Tool>>;
    async fn create_tool(&self, spec: &ToolSpec) -> ApiResult<Tool>;
    async fn update_tool(&self, id: ToolId, spec: &ToolSpec) -> ApiResult<Tool>;
    async fn delete_tool(&self, id: ToolId, callable: bool) -> ApiResult<()>;

    async fn list_prompts(&self) -> ApiResult<Vec<SystemPrompt>>;
    async fn create_prompt(&self, create: &SystemPromptCreate) -> ApiResult<SystemPrompt>;
    async fn delete_prompt(&self, id: PromptId) -> ApiResult<()>;

    async fn research_search(&self, query: &str) -> ApiResult<ResearchResult>;
    async fn research_history(&self) -> ApiResult<Vec<ResearchResult>>;
}

/// HTTP client for the conversation service.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = construct_api_url(&self.base_url, endpoint);
        debug!(%method, %url, "api request");
        self.client
            .request(method, url)
            .header("Content-Type", "application/json")
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            debug!(%status, "api error response");
            return Err(ApiError::Status { status, detail });
        }
        response.json::<T>().await.map_err(ApiError::Decode)
    }

    async fn execute_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, detail });
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.execute(self.request(Method::GET, endpoint)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.execute(self.request(Method::POST, endpoint).json(body))
            .await
    }

    async fn post_bare<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.execute(self.request(Method::POST, endpoint)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.execute(self.request(Method::PUT, endpoint).json(body))
            .await
    }

    async fn put_bare<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.execute(self.request(Method::PUT, endpoint)).await
    }

    async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.execute(self.request(Method::DELETE, endpoint)).await
    }
}

#[async_trait]
impl ConversationApi for HttpApi {
    async fn list_chats(&self) -> ApiResult<Vec<Chat>> {
        self.get("chats").await
    }

    async fn create_chat(&self) -> ApiResult<Chat> {
        self.post_bare("chats").await
    }

    async fn fetch_chat(&self, id: ChatId) -> ApiResult<Chat> {
        self.get(&format!("chats/{id}")).await
    }

    async fn delete_chat(&self, id: ChatId) -> ApiResult<()> {
        self.execute_empty(self.request(Method::DELETE, &format!("chats/{id}")))
            .await
    }

    async fn rename_chat(&self, id: ChatId, name: &str) -> ApiResult<Chat> {
        self.execute(
            self.request(Method::PATCH, &format!("chats/{id}/name"))
                .json(&serde_json::json!({ "name": name })),
        )
        .await
    }

    async fn send_message(&self, id: ChatId, content: &str) -> ApiResult<Chat> {
        self.post(
            &format!("chats/{id}/messages"),
            &serde_json::json!({ "content": content }),
        )
        .await
    }

    async fn trigger_assistant(&self, id: ChatId) -> ApiResult<Chat> {
        self.post_bare(&format!("chats/{id}/trigger")).await
    }

    async fn clear_history(&self, id: ChatId) -> ApiResult<Chat> {
        self.post_bare(&format!("chats/{id}/clear")).await
    }

    async fn fetch_config(&self, id: ChatId) -> ApiResult<LlmConfig> {
        self.get(&format!("chats/{id}/config")).await
    }

    async fn update_config(&self, id: ChatId, update: &LlmConfigUpdate) -> ApiResult<LlmConfig> {
        self.put(&format!("chats/{id}/config"), update).await
    }

    async fn fetch_auto_run(&self, id: ChatId) -> ApiResult<bool> {
        let state: AutoRunState = self.get(&format!("chats/{id}/auto_run")).await?;
        Ok(state.auto_run)
    }

    async fn set_auto_run(&self, id: ChatId, enabled: bool) -> ApiResult<Chat> {
        self.put(
            &format!("chats/{id}/auto_run"),
            &serde_json::json!({ "auto_run": enabled }),
        )
        .await
    }

    async fn set_auto_tools(&self, id: ChatId, tool_ids: &[ToolId]) -> ApiResult<Chat> {
        self.put(
            &format!("chats/{id}/auto_tools"),
            &serde_json::json!({ "tool_ids": tool_ids }),
        )
        .await
    }

    async fn assign_tool(&self, id: ChatId, tool_id: ToolId) -> ApiResult<Chat> {
        self.put_bare(&format!("chats/{id}/tool/{tool_id}")).await
    }

    async fn remove_tool(&self, id: ChatId) -> ApiResult<Chat> {
        self.delete(&format!("chats/{id}/tool")).await
    }

    async fn set_stop_tool(&self, id: ChatId, tool_id: ToolId) -> ApiResult<Chat> {
        self.put_bare(&format!("chats/{id}/stop_tool/{tool_id}"))
            .await
    }

    async fn remove_stop_tool(&self, id: ChatId) -> ApiResult<Chat> {
        self.delete(&format!("chats/{id}/stop_tool")).await
    }

    async fn assign_prompt(&self, id: ChatId, prompt_id: PromptId) -> ApiResult<Chat> {
        self.put_bare(&format!("chats/{id}/prompt/{prompt_id}"))
            .await
    }

    async fn remove_prompt(&self, id: ChatId) -> ApiResult<Chat> {
        self.delete(&format!("chats/{id}/prompt")).await
    }

    async fn list_tools(&self) -> ApiResult<Vec<Tool>> {
        self.get("tools").await
    }

    async fn create_tool(&self, spec: &ToolSpec) -> ApiResult<Tool> {
        let endpoint = if spec.is_callable() {
            "tools/callable"
        } else {
            "tools"
        };
        self.post(endpoint, spec).await
    }

    async fn update_tool(&self, id: ToolId, spec: &ToolSpec) -> ApiResult<Tool> {
        let endpoint = if spec.is_callable() {
            format!("tools/callable/{id}")
        } else {
            format!("tools/{id}")
        };
        self.put(&endpoint, spec).await
    }

    async fn delete_tool(&self, id: ToolId, callable: bool) -> ApiResult<()> {
        let endpoint = if callable {
            format!("tools/callable/{id}")
        } else {
            format!("tools/{id}")
        };
        self.execute_empty(self.request(Method::DELETE, &endpoint))
            .await
    }

    async fn list_prompts(&self) -> ApiResult<Vec<SystemPrompt>> {
        self.get("prompts").await
    }

    async fn create_prompt(&self, create: &SystemPromptCreate) -> ApiResult<SystemPrompt> {
        self.post("prompts", create).await
    }

    async fn delete_prompt(&self, id: PromptId) -> ApiResult<()> {
        self.execute_empty(self.request(Method::DELETE, &format!("prompts/{id}")))
            .await
    }

    async fn research_search(&self, query: &str) -> ApiResult<ResearchResult> {
        self.post(
            "research/search",
            &serde_json::json!({ "query": query }),
        )
        .await
    }

    async fn research_history(&self) -> ApiResult<Vec<ResearchResult>> {
        self.get("research/history").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_includes_detail() {
        let err = ApiError::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: "name must not be empty".into(),
        };
        let text = err.to_string();
        assert!(text.contains("422"));
        assert!(text.contains("name must not be empty"));
    }

    #[test]
    fn status_error_without_detail_is_terse() {
        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            detail: String::new(),
        };
        assert_eq!(err.to_string(), "server returned 404 Not Found");
    }
}
