//! Command-line interface parsing and handling.

use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::api::client::{ConversationApi, HttpApi};
use crate::core::config::Config;
use crate::ui::chat_loop::run_console;
use crate::utils::logging::{check_log_path, init_tracing};
use crate::utils::url::normalize_base_url;

#[derive(Parser)]
#[command(name = "chatgrid")]
#[command(about = "A terminal console for a multi-chat LLM conversation service")]
#[command(
    long_about = "Chatgrid is a full-screen terminal console for working with many LLM \
conversations at once over a conversation-management API. Chats open as tabs or a grid of \
live panes, with tools and system prompts one keystroke away.\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Ctrl+E / Ctrl+T   Focus the chat sidebar / the tools panel\n\
  Ctrl+N / Ctrl+P   Next / previous tab; Ctrl+W closes a tab\n\
  Ctrl+G            Toggle grid view\n\
  Ctrl+C            Quit\n\n\
Commands:\n\
  /help             Show all slash commands\n\
  /new [name]       Create a chat\n\
  /search <query>   Run a research web search"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the conversation service (overrides the config file)
    #[arg(short = 'u', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostics to the given file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the console (default)
    Console,
    /// List chats on the server
    Chats,
    /// List tool definitions on the server
    Tools,
    /// List system prompts on the server
    Prompts,
    /// Set a configuration value
    Set {
        /// Configuration key (base-url, poll-interval-ms, grid-columns, theme)
        key: String,
        /// Value to set
        value: String,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to revert to its default
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Console);

    match command {
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set_key(&key, &value)?;
            config.save()?;
            println!("Set {key} to {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            config.unset_key(&key)?;
            config.save()?;
            println!("Unset {key}");
            Ok(())
        }
        Commands::Console => {
            if let Some(path) = &args.log {
                check_log_path(path)?;
            }
            init_tracing(args.log.as_deref(), true)?;
            let config = load_config(args.base_url)?;
            let api: Arc<dyn ConversationApi> = Arc::new(build_api(&config));
            run_console(api, &config).await
        }
        Commands::Chats => {
            init_tracing(args.log.as_deref(), false)?;
            let config = load_config(args.base_url)?;
            let api = build_api(&config);
            let chats = api.list_chats().await?;
            if chats.is_empty() {
                println!("No chats.");
            }
            for chat in chats {
                let running = if chat.is_running { " (running)" } else { "" };
                println!(
                    "{:>6}  {}{}  [{} messages]",
                    chat.id,
                    chat.display_name(),
                    running,
                    chat.history.len()
                );
            }
            Ok(())
        }
        Commands::Tools => {
            init_tracing(args.log.as_deref(), false)?;
            let config = load_config(args.base_url)?;
            let api = build_api(&config);
            let tools = api.list_tools().await?;
            if tools.is_empty() {
                println!("No tools.");
            }
            for tool in tools {
                let kind = if tool.is_callable { "callable" } else { "schema" };
                println!(
                    "{:>6}  {} ({kind})  {}",
                    tool.id,
                    tool.display_name(),
                    tool.display_description()
                );
            }
            Ok(())
        }
        Commands::Prompts => {
            init_tracing(args.log.as_deref(), false)?;
            let config = load_config(args.base_url)?;
            let api = build_api(&config);
            let prompts = api.list_prompts().await?;
            if prompts.is_empty() {
                println!("No system prompts.");
            }
            for prompt in prompts {
                println!("{:>6}  {}", prompt.id, prompt.name);
            }
            Ok(())
        }
    }
}

fn load_config(base_url_override: Option<String>) -> Result<Config, Box<dyn Error>> {
    let mut config = Config::load()?;
    if let Some(base_url) = base_url_override {
        config.base_url = Some(base_url);
    }
    Ok(config)
}

fn build_api(config: &Config) -> HttpApi {
    let client = reqwest::Client::new();
    HttpApi::new(client, normalize_base_url(config.base_url()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn base_url_override_wins() {
        let config = load_config(Some("http://other.test/api".into())).unwrap();
        assert_eq!(config.base_url(), "http://other.test/api");
    }
}
