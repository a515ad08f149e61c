//! MCP server surface for the meters engine

pub mod tools;

pub use tools::AstrometersServer;
