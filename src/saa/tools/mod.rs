//! Built-in tools for tool-enabled assistants.

pub mod filesystem;

pub use filesystem::FileSystemTool;
