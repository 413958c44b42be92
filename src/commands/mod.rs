//! Slash-command handling for the chat input line.
//!
//! Input beginning with `/` is dispatched through the registry; anything
//! else is sent to the active chat as a message. Handlers either mutate the
//! workspace directly (pure view changes) or emit a [`CommandEffect`] for
//! the event loop to run against the service.

mod registry;

pub use registry::{all_commands, CommandInvocation};

use crate::api::{ChatId, LlmConfigUpdate, PromptId, ResponseFormat, SystemPromptCreate, ToolId, ToolSpec};
use crate::core::workspace::Workspace;

/// A remote operation requested by a command, executed asynchronously by the
/// event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEffect {
    CreateChat { name: Option<String> },
    RenameChat { id: ChatId, name: String },
    ClearHistory { id: ChatId },
    DeleteChat { id: ChatId },
    FetchConfig { id: ChatId },
    UpdateConfig { id: ChatId, update: LlmConfigUpdate },
    SetAutoRun { id: ChatId, enabled: bool },
    ToggleAutoRun { id: ChatId },
    SetAutoTools { id: ChatId, tool_ids: Vec<ToolId> },
    CreateTool { spec: ToolSpec },
    UpdateTool { id: ToolId, spec: ToolSpec },
    DeleteTool { id: ToolId, callable: bool },
    AssignTool { id: ChatId, tool_id: ToolId },
    UnassignTool { id: ChatId },
    SetStopTool { id: ChatId, tool_id: ToolId },
    RemoveStopTool { id: ChatId },
    CreatePrompt { create: SystemPromptCreate },
    DeletePrompt { id: PromptId },
    AssignPrompt { id: ChatId, prompt_id: PromptId },
    UnassignPrompt { id: ChatId },
    Search { query: String },
    ResearchHistory,
    RefreshAll,
}

pub enum CommandResult {
    /// Handled entirely inside the workspace.
    Continue,
    /// Send the input to the active chat as a message.
    SendAsMessage(String),
    /// Show text in the active pane (help output, listings, usage errors).
    Notice(String),
    /// Run a remote operation.
    Effect(CommandEffect),
}

pub fn process_input(workspace: &mut Workspace, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::SendAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        // A bare "/" is not a command; send it like any other text.
        _ => return CommandResult::SendAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(workspace, CommandInvocation { args })
    } else {
        CommandResult::Notice(format!(
            "Unknown command /{command_name}. Type /help for the list."
        ))
    }
}

fn active_chat(workspace: &Workspace) -> Result<ChatId, CommandResult> {
    workspace
        .tabs
        .active()
        .ok_or_else(|| CommandResult::Notice("No chat is open.".to_string()))
}

macro_rules! require_active {
    ($workspace:expr) => {
        match active_chat($workspace) {
            Ok(id) => id,
            Err(result) => return result,
        }
    };
}

pub(super) fn handle_help(_: &mut Workspace, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut text = String::from("Commands:\n");
    for command in all_commands() {
        text.push_str(&format!("  /{:<8} {}\n", command.name, command.help));
    }
    CommandResult::Notice(text)
}

pub(super) fn handle_new(_: &mut Workspace, invocation: CommandInvocation<'_>) -> CommandResult {
    let name = if invocation.args.is_empty() {
        None
    } else {
        Some(invocation.args.to_string())
    };
    CommandResult::Effect(CommandEffect::CreateChat { name })
}

pub(super) fn handle_rename(
    workspace: &mut Workspace,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let id = require_active!(workspace);
    if invocation.args.is_empty() {
        return CommandResult::Notice("Usage: /rename <name>".to_string());
    }
    CommandResult::Effect(CommandEffect::RenameChat {
        id,
        name: invocation.args.to_string(),
    })
}

pub(super) fn handle_clear(
    workspace: &mut Workspace,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    let id = require_active!(workspace);
    CommandResult::Effect(CommandEffect::ClearHistory { id })
}

pub(super) fn handle_delete(
    workspace: &mut Workspace,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    let id = require_active!(workspace);
    CommandResult::Effect(CommandEffect::DeleteChat { id })
}

pub(super) fn handle_grid(
    workspace: &mut Workspace,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    workspace.toggle_view_mode();
    CommandResult::Continue
}

pub(super) fn handle_config(
    workspace: &mut Workspace,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let id = require_active!(workspace);
    if invocation.args.is_empty() {
        return CommandResult::Effect(CommandEffect::FetchConfig { id });
    }

    let mut parts = invocation.args.splitn(2, ' ');
    let key = parts.next().unwrap_or("");
    let value = parts.next().unwrap_or("").trim();
    if value.is_empty() {
        return CommandResult::Notice("Usage: /config <key> <value>".to_string());
    }

    match config_update(key, value) {
        Ok(update) => CommandResult::Effect(CommandEffect::UpdateConfig { id, update }),
        Err(message) => CommandResult::Notice(message),
    }
}

fn config_update(key: &str, value: &str) -> Result<LlmConfigUpdate, String> {
    let mut update = LlmConfigUpdate::default();
    match key {
        "client" => update.client = Some(value.to_string()),
        "model" => update.model = Some(value.to_string()),
        "temperature" => {
            update.temperature =
                Some(value.parse().map_err(|_| {
                    format!("temperature must be a number, got '{value}'")
                })?)
        }
        "max_tokens" => {
            update.max_tokens =
                Some(value.parse().map_err(|_| {
                    format!("max_tokens must be an integer, got '{value}'")
                })?)
        }
        "top_p" => {
            update.top_p = Some(
                value
                    .parse()
                    .map_err(|_| format!("top_p must be a number, got '{value}'"))?,
            )
        }
        "frequency_penalty" => {
            update.frequency_penalty = Some(
                value
                    .parse()
                    .map_err(|_| format!("frequency_penalty must be a number, got '{value}'"))?,
            )
        }
        "presence_penalty" => {
            update.presence_penalty = Some(
                value
                    .parse()
                    .map_err(|_| format!("presence_penalty must be a number, got '{value}'"))?,
            )
        }
        "response_format" => {
            let format: ResponseFormat = serde_json::from_value(serde_json::Value::String(
                value.to_string(),
            ))
            .map_err(|_| format!("unknown response format '{value}'"))?;
            update.response_format = Some(format);
        }
        "system_prompt" => update.system_prompt = Some(value.to_string()),
        _ => {
            return Err(format!(
                "unknown config key '{key}' (try model, temperature, max_tokens, top_p, \
                 frequency_penalty, presence_penalty, response_format, system_prompt, client)"
            ))
        }
    }
    Ok(update)
}

pub(super) fn handle_autorun(
    workspace: &mut Workspace,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let id = require_active!(workspace);
    let enabled = match invocation.args {
        "on" => true,
        "off" => false,
        // No argument: flip the server's current value, not the mirror's.
        "" => return CommandResult::Effect(CommandEffect::ToggleAutoRun { id }),
        other => {
            return CommandResult::Notice(format!(
                "Usage: /autorun [on|off], got '{other}'"
            ))
        }
    };
    CommandResult::Effect(CommandEffect::SetAutoRun { id, enabled })
}

pub(super) fn handle_tool(
    workspace: &mut Workspace,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let mut parts = invocation.args.splitn(2, ' ');
    let verb = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    match verb {
        "" | "list" => {
            if workspace.tools.is_empty() {
                return CommandResult::Notice("No tools defined.".to_string());
            }
            let mut text = String::from("Tools:\n");
            for tool in &workspace.tools {
                let kind = if tool.is_callable { "callable" } else { "schema" };
                text.push_str(&format!(
                    "  [{}] {} ({kind}): {}\n",
                    tool.id,
                    tool.display_name(),
                    tool.display_description()
                ));
            }
            CommandResult::Notice(text)
        }
        "new" => match parse_tool_spec(rest) {
            Ok(spec) => CommandResult::Effect(CommandEffect::CreateTool { spec }),
            Err(message) => CommandResult::Notice(message),
        },
        "edit" => {
            let mut parts = rest.splitn(2, ' ');
            let Some(id) = parts.next().and_then(|raw| raw.parse::<ToolId>().ok()) else {
                return CommandResult::Notice("Usage: /tool edit <id> <json>".to_string());
            };
            match parse_tool_spec(parts.next().unwrap_or("").trim()) {
                Ok(spec) => CommandResult::Effect(CommandEffect::UpdateTool { id, spec }),
                Err(message) => CommandResult::Notice(message),
            }
        }
        "delete" => {
            let Some(id) = rest.parse::<ToolId>().ok() else {
                return CommandResult::Notice("Usage: /tool delete <id>".to_string());
            };
            let Some(tool) = workspace.tools.iter().find(|tool| tool.id == id) else {
                return CommandResult::Notice(format!("No tool with id {id}."));
            };
            CommandResult::Effect(CommandEffect::DeleteTool {
                id,
                callable: tool.is_callable,
            })
        }
        "assign" => {
            let chat = require_active!(workspace);
            let Some(tool_id) = rest.parse::<ToolId>().ok() else {
                return CommandResult::Notice("Usage: /tool assign <id>".to_string());
            };
            CommandResult::Effect(CommandEffect::AssignTool { id: chat, tool_id })
        }
        "unassign" => {
            let chat = require_active!(workspace);
            CommandResult::Effect(CommandEffect::UnassignTool { id: chat })
        }
        "stop" => {
            let chat = require_active!(workspace);
            let Some(tool_id) = rest.parse::<ToolId>().ok() else {
                return CommandResult::Notice("Usage: /tool stop <id>".to_string());
            };
            CommandResult::Effect(CommandEffect::SetStopTool { id: chat, tool_id })
        }
        "unstop" => {
            let chat = require_active!(workspace);
            CommandResult::Effect(CommandEffect::RemoveStopTool { id: chat })
        }
        "auto" => {
            let chat = require_active!(workspace);
            let mut tool_ids = Vec::new();
            for raw in rest.split_whitespace() {
                match raw.parse::<ToolId>() {
                    Ok(id) => tool_ids.push(id),
                    Err(_) => {
                        return CommandResult::Notice(format!(
                            "Tool ids must be numbers, got '{raw}'"
                        ))
                    }
                }
            }
            CommandResult::Effect(CommandEffect::SetAutoTools { id: chat, tool_ids })
        }
        other => CommandResult::Notice(format!(
            "Unknown tool action '{other}'. Try list, new, edit, delete, assign, unassign, stop, unstop, or auto."
        )),
    }
}

/// Parse a tool definition given as JSON and check its schema actually
/// compiles, so malformed schemas fail here instead of server-side.
fn parse_tool_spec(raw: &str) -> Result<ToolSpec, String> {
    if raw.is_empty() {
        return Err("Usage: /tool new <json>".to_string());
    }
    let spec: ToolSpec =
        serde_json::from_str(raw).map_err(|err| format!("Invalid tool definition: {err}"))?;
    jsonschema::validator_for(spec.schema())
        .map_err(|err| format!("Invalid tool schema: {err}"))?;
    Ok(spec)
}

pub(super) fn handle_prompt(
    workspace: &mut Workspace,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let mut parts = invocation.args.splitn(2, ' ');
    let verb = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    match verb {
        "" | "list" => {
            if workspace.prompts.is_empty() {
                return CommandResult::Notice("No system prompts defined.".to_string());
            }
            let mut text = String::from("System prompts:\n");
            for prompt in &workspace.prompts {
                text.push_str(&format!("  [{}] {}\n", prompt.id, prompt.name));
            }
            CommandResult::Notice(text)
        }
        "new" => {
            let mut parts = rest.splitn(2, ' ');
            let name = parts.next().unwrap_or("");
            let content = parts.next().unwrap_or("").trim();
            if name.is_empty() || content.is_empty() {
                return CommandResult::Notice("Usage: /prompt new <name> <content>".to_string());
            }
            CommandResult::Effect(CommandEffect::CreatePrompt {
                create: SystemPromptCreate {
                    name: name.to_string(),
                    content: content.to_string(),
                },
            })
        }
        "delete" => {
            let Some(id) = rest.parse::<PromptId>().ok() else {
                return CommandResult::Notice("Usage: /prompt delete <id>".to_string());
            };
            CommandResult::Effect(CommandEffect::DeletePrompt { id })
        }
        "assign" => {
            let chat = require_active!(workspace);
            let Some(prompt_id) = rest.parse::<PromptId>().ok() else {
                return CommandResult::Notice("Usage: /prompt assign <id>".to_string());
            };
            CommandResult::Effect(CommandEffect::AssignPrompt {
                id: chat,
                prompt_id,
            })
        }
        "unassign" => {
            let chat = require_active!(workspace);
            CommandResult::Effect(CommandEffect::UnassignPrompt { id: chat })
        }
        other => CommandResult::Notice(format!(
            "Unknown prompt action '{other}'. Try list, new, delete, assign, or unassign."
        )),
    }
}

pub(super) fn handle_search(
    _: &mut Workspace,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        return CommandResult::Notice("Usage: /search <query>".to_string());
    }
    CommandResult::Effect(CommandEffect::Search {
        query: invocation.args.to_string(),
    })
}

pub(super) fn handle_history(
    _: &mut Workspace,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    CommandResult::Effect(CommandEffect::ResearchHistory)
}

pub(super) fn handle_refresh(
    _: &mut Workspace,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    CommandResult::Effect(CommandEffect::RefreshAll)
}

pub(super) fn handle_quit(
    workspace: &mut Workspace,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    workspace.exit_requested = true;
    CommandResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{test_chat, test_tool, test_workspace};

    fn workspace_with_open_chat() -> Workspace {
        let mut ws = test_workspace();
        ws.chat_updated(test_chat(1));
        ws.open_tab(test_chat(1));
        ws
    }

    #[test]
    fn plain_text_is_sent_as_message() {
        let mut ws = workspace_with_open_chat();
        match process_input(&mut ws, "hello there") {
            CommandResult::SendAsMessage(text) => assert_eq!(text, "hello there"),
            _ => panic!("expected message"),
        }
    }

    #[test]
    fn unknown_command_is_reported_not_sent() {
        let mut ws = workspace_with_open_chat();
        match process_input(&mut ws, "/frobnicate") {
            CommandResult::Notice(text) => assert!(text.contains("/frobnicate")),
            _ => panic!("expected notice"),
        }
    }

    #[test]
    fn new_passes_optional_name() {
        let mut ws = test_workspace();
        match process_input(&mut ws, "/new standup notes") {
            CommandResult::Effect(CommandEffect::CreateChat { name }) => {
                assert_eq!(name.as_deref(), Some("standup notes"));
            }
            _ => panic!("expected effect"),
        }
        match process_input(&mut ws, "/new") {
            CommandResult::Effect(CommandEffect::CreateChat { name }) => assert!(name.is_none()),
            _ => panic!("expected effect"),
        }
    }

    #[test]
    fn chat_scoped_commands_require_an_open_chat() {
        let mut ws = test_workspace();
        match process_input(&mut ws, "/rename fresh name") {
            CommandResult::Notice(text) => assert!(text.contains("No chat")),
            _ => panic!("expected notice"),
        }
    }

    #[test]
    fn config_without_args_fetches() {
        let mut ws = workspace_with_open_chat();
        match process_input(&mut ws, "/config") {
            CommandResult::Effect(CommandEffect::FetchConfig { id }) => assert_eq!(id, 1),
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn config_update_parses_typed_values() {
        let mut ws = workspace_with_open_chat();
        match process_input(&mut ws, "/config temperature 0.7") {
            CommandResult::Effect(CommandEffect::UpdateConfig { update, .. }) => {
                assert_eq!(update.temperature, Some(0.7));
                assert!(update.model.is_none());
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn config_rejects_bad_values() {
        let mut ws = workspace_with_open_chat();
        match process_input(&mut ws, "/config temperature warm") {
            CommandResult::Notice(text) => assert!(text.contains("temperature")),
            _ => panic!("expected notice"),
        }
    }

    #[test]
    fn config_accepts_response_format_names() {
        let mut ws = workspace_with_open_chat();
        match process_input(&mut ws, "/config response_format auto_tools") {
            CommandResult::Effect(CommandEffect::UpdateConfig { update, .. }) => {
                assert_eq!(update.response_format, Some(ResponseFormat::AutoTools));
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn autorun_parses_explicit_and_toggle_forms() {
        let mut ws = workspace_with_open_chat();
        match process_input(&mut ws, "/autorun off") {
            CommandResult::Effect(CommandEffect::SetAutoRun { enabled, .. }) => assert!(!enabled),
            _ => panic!("expected effect"),
        }
        match process_input(&mut ws, "/autorun") {
            CommandResult::Effect(CommandEffect::ToggleAutoRun { id }) => assert_eq!(id, 1),
            _ => panic!("expected effect"),
        }
    }

    #[test]
    fn tool_new_rejects_malformed_json() {
        let mut ws = workspace_with_open_chat();
        match process_input(&mut ws, "/tool new {not json") {
            CommandResult::Notice(text) => assert!(text.contains("Invalid tool definition")),
            _ => panic!("expected notice"),
        }
    }

    #[test]
    fn tool_new_rejects_invalid_schema() {
        let mut ws = workspace_with_open_chat();
        let raw = r#"{"schema_name":"x","schema_description":"d","instruction_string":"i","json_schema":{"type":"nonsense"},"strict_schema":true}"#;
        match process_input(&mut ws, &format!("/tool new {raw}")) {
            CommandResult::Notice(text) => assert!(text.contains("schema")),
            _ => panic!("expected notice"),
        }
    }

    #[test]
    fn tool_new_accepts_a_valid_schema_tool() {
        let mut ws = workspace_with_open_chat();
        let raw = r#"{"schema_name":"extract","schema_description":"pull fields","instruction_string":"use for extraction","json_schema":{"type":"object","properties":{"title":{"type":"string"}}},"strict_schema":true}"#;
        match process_input(&mut ws, &format!("/tool new {raw}")) {
            CommandResult::Effect(CommandEffect::CreateTool { spec }) => {
                assert!(!spec.is_callable());
                assert_eq!(spec.display_name(), "extract");
            }
            _ => panic!("expected effect"),
        }
    }

    #[test]
    fn tool_delete_resolves_the_callable_flag_locally() {
        let mut ws = workspace_with_open_chat();
        let mut tool = test_tool(9, "runner");
        tool.is_callable = true;
        ws.set_tools(vec![tool]);
        match process_input(&mut ws, "/tool delete 9") {
            CommandResult::Effect(CommandEffect::DeleteTool { id, callable }) => {
                assert_eq!(id, 9);
                assert!(callable);
            }
            _ => panic!("expected effect"),
        }
    }

    #[test]
    fn tool_auto_collects_ids() {
        let mut ws = workspace_with_open_chat();
        match process_input(&mut ws, "/tool auto 3 5 8") {
            CommandResult::Effect(CommandEffect::SetAutoTools { tool_ids, .. }) => {
                assert_eq!(tool_ids, vec![3, 5, 8]);
            }
            _ => panic!("expected effect"),
        }
    }

    #[test]
    fn prompt_new_splits_name_and_content() {
        let mut ws = test_workspace();
        match process_input(&mut ws, "/prompt new concise Answer briefly.") {
            CommandResult::Effect(CommandEffect::CreatePrompt { create }) => {
                assert_eq!(create.name, "concise");
                assert_eq!(create.content, "Answer briefly.");
            }
            _ => panic!("expected effect"),
        }
    }

    #[test]
    fn quit_sets_exit_flag() {
        let mut ws = test_workspace();
        match process_input(&mut ws, "/quit") {
            CommandResult::Continue => {}
            _ => panic!("expected continue"),
        }
        assert!(ws.exit_requested);
    }

    #[test]
    fn grid_toggles_view_mode_directly() {
        let mut ws = test_workspace();
        process_input(&mut ws, "/grid");
        assert_eq!(ws.view_mode, crate::core::workspace::ViewMode::Grid);
    }

    #[test]
    fn commands_are_case_insensitive() {
        let mut ws = test_workspace();
        match process_input(&mut ws, "/QUIT") {
            CommandResult::Continue => {}
            _ => panic!("expected continue"),
        }
        assert!(ws.exit_requested);
    }
}
