//! MCP server exposing GitHub Discussions as agent tools.

pub mod cli;
pub mod config;
pub mod discussions;
pub mod http;
pub mod mcp;
pub mod params;
pub mod server;
pub mod tools;
pub mod types;
