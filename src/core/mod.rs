pub mod activity;
pub mod config;
pub mod message;
pub mod poll;
pub mod tabs;
pub mod workspace;
