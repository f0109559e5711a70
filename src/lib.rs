//! NEOCORTICA — resolve arXiv paper references to cached markdown and run
//! them through a multi-step LLM reading pipeline.
//!
//! The library is shared by two binaries: the HTTP backend (`neocortica`)
//! and the MCP stdio server (`neocortica-mcp`).

pub mod error;
pub mod llm;
pub mod mcp;
pub mod paper;
pub mod reader;
pub mod routes;
pub mod state;
