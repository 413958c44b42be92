use super::CommandResult;
use crate::core::workspace::Workspace;

pub type CommandHandler = fn(&mut Workspace, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        help: "Show available commands and usage information.",
        handler: super::handle_help,
    },
    Command {
        name: "new",
        help: "Create a chat: /new [name]",
        handler: super::handle_new,
    },
    Command {
        name: "rename",
        help: "Rename the active chat: /rename <name>",
        handler: super::handle_rename,
    },
    Command {
        name: "clear",
        help: "Clear the active chat's transcript.",
        handler: super::handle_clear,
    },
    Command {
        name: "delete",
        help: "Delete the active chat on the server.",
        handler: super::handle_delete,
    },
    Command {
        name: "grid",
        help: "Toggle between tabbed and grid view.",
        handler: super::handle_grid,
    },
    Command {
        name: "config",
        help: "Show or change the active chat's model settings: /config [key value]",
        handler: super::handle_config,
    },
    Command {
        name: "autorun",
        help: "Toggle auto-run for the active chat: /autorun [on|off]",
        handler: super::handle_autorun,
    },
    Command {
        name: "tool",
        help: "Manage tools: /tool list|new|edit|delete|assign|unassign|stop|unstop|auto",
        handler: super::handle_tool,
    },
    Command {
        name: "prompt",
        help: "Manage system prompts: /prompt list|new|delete|assign|unassign",
        handler: super::handle_prompt,
    },
    Command {
        name: "search",
        help: "Run a research web search: /search <query>",
        handler: super::handle_search,
    },
    Command {
        name: "history",
        help: "Show past research searches.",
        handler: super::handle_history,
    },
    Command {
        name: "refresh",
        help: "Re-fetch the chat list, tools, and prompts.",
        handler: super::handle_refresh,
    },
    Command {
        name: "quit",
        help: "Exit the console.",
        handler: super::handle_quit,
    },
];
