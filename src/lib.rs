//! Chatgrid is a terminal-first console for a remote conversation-management
//! service.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the JSON records mirrored from the remote service and
//!   the HTTP client used to reach it.
//! - [`core`] owns client-side state: configuration, the workspace of open
//!   chat tabs with its cache and activity counters, and the polling
//!   schedule used to refresh busy chats.
//! - [`ui`] renders the three-pane terminal interface and runs the
//!   interactive event loop.
//! - [`commands`] implements slash-command parsing and execution used by the
//!   chat loop.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
