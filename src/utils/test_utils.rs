#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::Mutex;
#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use serde_json::json;

#[cfg(test)]
use crate::api::client::{ApiError, ApiResult, ConversationApi};
#[cfg(test)]
use crate::api::{
    Chat, ChatId, LlmConfig, LlmConfigUpdate, Message, PromptId, ResearchResult, SystemPrompt,
    SystemPromptCreate, Tool, ToolId, ToolSpec,
};
#[cfg(test)]
use crate::core::message::MessageRole;
#[cfg(test)]
use crate::core::workspace::Workspace;

#[cfg(test)]
pub fn test_chat(id: ChatId) -> Chat {
    Chat {
        id,
        name: None,
        created_at: None,
        history: Vec::new(),
        active_tool_id: None,
        stop_tool_id: None,
        system_prompt_id: None,
        auto_tool_ids: Vec::new(),
        auto_run: false,
        is_running: false,
    }
}

#[cfg(test)]
pub fn chat_with_history(id: ChatId, user_lines: &[&str]) -> Chat {
    let mut chat = test_chat(id);
    chat.history = user_lines
        .iter()
        .map(|line| test_message(MessageRole::User, line))
        .collect();
    chat
}

#[cfg(test)]
pub fn test_message(role: MessageRole, content: &str) -> Message {
    Message::new(role, content)
}

#[cfg(test)]
pub fn test_workspace() -> Workspace {
    Workspace::new(Duration::from_millis(2000))
}

#[cfg(test)]
pub fn test_tool(id: ToolId, name: &str) -> Tool {
    Tool {
        id,
        created_at: None,
        is_callable: false,
        schema_name: Some(name.to_string()),
        schema_description: Some(format!("{name} tool")),
        instruction_string: Some("use when relevant".to_string()),
        json_schema: Some(json!({"type": "object", "properties": {}})),
        strict_schema: Some(true),
        name: None,
        description: None,
        input_schema: None,
        output_schema: None,
    }
}

#[cfg(test)]
pub fn test_prompt(id: PromptId, name: &str) -> SystemPrompt {
    SystemPrompt {
        id,
        name: name.to_string(),
        content: format!("You are {name}."),
        created_at: None,
    }
}

/// In-memory stand-in for the remote service, used by async command and
/// event tests.
#[cfg(test)]
pub struct MockApi {
    pub chats: Mutex<HashMap<ChatId, Chat>>,
    pub tools: Mutex<Vec<Tool>>,
    pub prompts: Mutex<Vec<SystemPrompt>>,
    pub configs: Mutex<HashMap<ChatId, LlmConfig>>,
    next_id: Mutex<u64>,
    /// When set, every call fails with this message.
    pub fail_with: Mutex<Option<String>>,
}

#[cfg(test)]
impl MockApi {
    pub fn new() -> Self {
        Self {
            chats: Mutex::new(HashMap::new()),
            tools: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            configs: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
            fail_with: Mutex::new(None),
        }
    }

    pub fn with_chats(chats: Vec<Chat>) -> Self {
        let api = Self::new();
        {
            let mut map = api.chats.lock().unwrap();
            let mut next = api.next_id.lock().unwrap();
            for chat in chats {
                *next = (*next).max(chat.id + 1);
                map.insert(chat.id, chat);
            }
        }
        api
    }

    pub fn fail_next(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    fn check_failure(&self) -> ApiResult<()> {
        if let Some(detail) = self.fail_with.lock().unwrap().take() {
            return Err(ApiError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                detail,
            });
        }
        Ok(())
    }

    fn alloc_id(&self) -> u64 {
        let mut next = self.next_id.lock().unwrap();
        let id = *next;
        *next += 1;
        id
    }

    fn chat(&self, id: ChatId) -> ApiResult<Chat> {
        self.chats
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ApiError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
                detail: format!("chat {id} not found"),
            })
    }

    fn update_chat(&self, id: ChatId, f: impl FnOnce(&mut Chat)) -> ApiResult<Chat> {
        let mut chats = self.chats.lock().unwrap();
        let chat = chats.get_mut(&id).ok_or(ApiError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            detail: format!("chat {id} not found"),
        })?;
        f(chat);
        Ok(chat.clone())
    }
}

#[cfg(test)]
#[async_trait]
impl ConversationApi for MockApi {
    async fn list_chats(&self) -> ApiResult<Vec<Chat>> {
        self.check_failure()?;
        let mut chats: Vec<Chat> = self.chats.lock().unwrap().values().cloned().collect();
        chats.sort_by_key(|chat| chat.id);
        Ok(chats)
    }

    async fn create_chat(&self) -> ApiResult<Chat> {
        self.check_failure()?;
        let chat = test_chat(self.alloc_id());
        self.chats.lock().unwrap().insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn fetch_chat(&self, id: ChatId) -> ApiResult<Chat> {
        self.check_failure()?;
        self.chat(id)
    }

    async fn delete_chat(&self, id: ChatId) -> ApiResult<()> {
        self.check_failure()?;
        self.chats.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn rename_chat(&self, id: ChatId, name: &str) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.name = Some(name.to_string()))
    }

    async fn send_message(&self, id: ChatId, content: &str) -> ApiResult<Chat> {
        self.check_failure()?;
        let content = content.to_string();
        self.update_chat(id, move |chat| {
            chat.history.push(Message::new(MessageRole::User, content));
            chat.is_running = true;
        })
    }

    async fn trigger_assistant(&self, id: ChatId) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.is_running = true)
    }

    async fn clear_history(&self, id: ChatId) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.history.clear())
    }

    async fn fetch_config(&self, id: ChatId) -> ApiResult<LlmConfig> {
        self.check_failure()?;
        Ok(self
            .configs
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_config(&self, id: ChatId, update: &LlmConfigUpdate) -> ApiResult<LlmConfig> {
        self.check_failure()?;
        let mut configs = self.configs.lock().unwrap();
        let config = configs.entry(id).or_default();
        if update.model.is_some() {
            config.model = update.model.clone();
        }
        if update.temperature.is_some() {
            config.temperature = update.temperature;
        }
        if update.max_tokens.is_some() {
            config.max_tokens = update.max_tokens;
        }
        if update.response_format.is_some() {
            config.response_format = update.response_format;
        }
        Ok(config.clone())
    }

    async fn fetch_auto_run(&self, id: ChatId) -> ApiResult<bool> {
        self.check_failure()?;
        Ok(self.chat(id)?.auto_run)
    }

    async fn set_auto_run(&self, id: ChatId, enabled: bool) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.auto_run = enabled)
    }

    async fn set_auto_tools(&self, id: ChatId, tool_ids: &[ToolId]) -> ApiResult<Chat> {
        self.check_failure()?;
        let ids = tool_ids.to_vec();
        self.update_chat(id, move |chat| chat.auto_tool_ids = ids)
    }

    async fn assign_tool(&self, id: ChatId, tool_id: ToolId) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.active_tool_id = Some(tool_id))
    }

    async fn remove_tool(&self, id: ChatId) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.active_tool_id = None)
    }

    async fn set_stop_tool(&self, id: ChatId, tool_id: ToolId) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.stop_tool_id = Some(tool_id))
    }

    async fn remove_stop_tool(&self, id: ChatId) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.stop_tool_id = None)
    }

    async fn assign_prompt(&self, id: ChatId, prompt_id: PromptId) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.system_prompt_id = Some(prompt_id))
    }

    async fn remove_prompt(&self, id: ChatId) -> ApiResult<Chat> {
        self.check_failure()?;
        self.update_chat(id, |chat| chat.system_prompt_id = None)
    }

    async fn list_tools(&self) -> ApiResult<Vec<Tool>> {
        self.check_failure()?;
        Ok(self.tools.lock().unwrap().clone())
    }

    async fn create_tool(&self, spec: &ToolSpec) -> ApiResult<Tool> {
        self.check_failure()?;
        let mut tool = test_tool(self.alloc_id(), spec.display_name());
        tool.is_callable = spec.is_callable();
        self.tools.lock().unwrap().push(tool.clone());
        Ok(tool)
    }

    async fn update_tool(&self, id: ToolId, spec: &ToolSpec) -> ApiResult<Tool> {
        self.check_failure()?;
        let mut tools = self.tools.lock().unwrap();
        let tool = tools
            .iter_mut()
            .find(|tool| tool.id == id)
            .ok_or(ApiError::Status {
                status: reqwest::StatusCode::NOT_FOUND,
                detail: format!("tool {id} not found"),
            })?;
        tool.schema_name = Some(spec.display_name().to_string());
        Ok(tool.clone())
    }

    async fn delete_tool(&self, id: ToolId, _callable: bool) -> ApiResult<()> {
        self.check_failure()?;
        self.tools.lock().unwrap().retain(|tool| tool.id != id);
        Ok(())
    }

    async fn list_prompts(&self) -> ApiResult<Vec<SystemPrompt>> {
        self.check_failure()?;
        Ok(self.prompts.lock().unwrap().clone())
    }

    async fn create_prompt(&self, create: &SystemPromptCreate) -> ApiResult<SystemPrompt> {
        self.check_failure()?;
        let prompt = SystemPrompt {
            id: self.alloc_id(),
            name: create.name.clone(),
            content: create.content.clone(),
            created_at: None,
        };
        self.prompts.lock().unwrap().push(prompt.clone());
        Ok(prompt)
    }

    async fn delete_prompt(&self, id: PromptId) -> ApiResult<()> {
        self.check_failure()?;
        self.prompts.lock().unwrap().retain(|prompt| prompt.id != id);
        Ok(())
    }

    async fn research_search(&self, query: &str) -> ApiResult<ResearchResult> {
        self.check_failure()?;
        Ok(ResearchResult {
            query: query.to_string(),
            timestamp: None,
            results: Vec::new(),
        })
    }

    async fn research_history(&self) -> ApiResult<Vec<ResearchResult>> {
        self.check_failure()?;
        Ok(Vec::new())
    }
}
