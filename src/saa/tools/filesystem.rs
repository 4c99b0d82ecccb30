//! Workspace file tool
//!
//! Gives tool-enabled assistants a small file system rooted at one directory, normally the
//! orchestrator's `output_dir`. Workers can leave artifacts there and the refiner can read
//! them back while writing the final answer.
//!
//! # Tools
//!
//! | Tool          | Parameters                 | Success output             |
//! |---------------|----------------------------|----------------------------|
//! | `create_file` | `path`, `content`          | `File created: <full path>` |
//! | `read_file`   | `path`                     | the file content           |
//! | `list_files`  | `directory` (optional)     | entry names, `/` for dirs  |
//!
//! Failures come back as tool failures carrying messages such as
//! `File not found: <full path>` or `Directory not found: <full path>`.
//!
//! # Security
//!
//! - Paths are relative to the root; absolute paths are rejected
//! - `..` may not climb above the root
//! - Symlinks are resolved before the containment check
//!
//! # Example
//!
//! ```rust,no_run
//! use saa_orchestrator::tools::FileSystemTool;
//! use std::path::PathBuf;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let fs = FileSystemTool::new().with_root_path(PathBuf::from("output"));
//!
//! let created = fs.create_file("docs/plan.md", "# Plan").await?;
//! println!("wrote {}", created.display());
//!
//! let content = fs.read_file("docs/plan.md").await?;
//! assert_eq!(content, "# Plan");
//!
//! for entry in fs.list_files("docs").await? {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! # Ok(())
//! # }
//! ```

use crate::tool_protocol::{
    ToolError, ToolMetadata, ToolParameter, ToolParameterType, ToolProtocol, ToolRegistry,
    ToolResult,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::error::Error;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

pub const CREATE_FILE: &str = "create_file";
pub const READ_FILE: &str = "read_file";
pub const LIST_FILES: &str = "list_files";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileSystemError {
    /// The path would leave the root directory.
    #[error("Path escapes the workspace: {0}")]
    PathTraversal(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("Is a directory: {0}")]
    IsDirectory(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FileSystemError {
    fn from(err: std::io::Error) -> Self {
        FileSystemError::Io(err.to_string())
    }
}

/// Entry in a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
    /// Size in bytes (0 for directories)
    pub size: u64,
}

/// File operations restricted to one root directory.
#[derive(Debug, Clone)]
pub struct FileSystemTool {
    root_path: PathBuf,
}

impl Default for FileSystemTool {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemTool {
    /// A tool rooted at the current directory.
    pub fn new() -> Self {
        Self {
            root_path: PathBuf::from("."),
        }
    }

    /// Restrict every operation to `path` and its subdirectories.
    pub fn with_root_path(mut self, path: PathBuf) -> Self {
        self.root_path = path;
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Descriptions of the three workspace tools.
    pub fn tool_metadata() -> Vec<ToolMetadata> {
        let path = |description: &str| {
            ToolParameter::new("path", ToolParameterType::String)
                .with_description(description)
                .required()
        };
        vec![
            ToolMetadata::new(
                CREATE_FILE,
                "Create or overwrite a file in the workspace, creating parent directories as needed",
            )
            .with_parameter(path("File path relative to the workspace"))
            .with_parameter(
                ToolParameter::new("content", ToolParameterType::String)
                    .with_description("Full file content")
                    .required(),
            ),
            ToolMetadata::new(READ_FILE, "Read a file from the workspace")
                .with_parameter(path("File path relative to the workspace")),
            ToolMetadata::new(LIST_FILES, "List the entries of a workspace directory")
                .with_parameter(
                    ToolParameter::new("directory", ToolParameterType::String)
                        .with_description("Directory relative to the workspace; omit for the root"),
                ),
        ]
    }

    /// A registry exposing this tool's operations.
    pub fn into_registry(self) -> ToolRegistry {
        ToolRegistry::from_metadata(Arc::new(self), Self::tool_metadata())
    }

    /// Map a workspace-relative path onto the root, rejecting anything that leaves it.
    fn resolve(&self, path: &str) -> Result<PathBuf, FileSystemError> {
        let mut normalized = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(FileSystemError::PathTraversal(path.to_string()));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(FileSystemError::InvalidPath(format!(
                        "absolute paths are not allowed: {}",
                        path
                    )));
                }
            }
        }

        let effective = self.root_path.join(&normalized);

        // The missing tail of a path cannot hold symlinks, so checking the nearest
        // existing ancestor is enough.
        let root_canonical = self.root_path.canonicalize()?;
        let existing = effective
            .ancestors()
            .find(|ancestor| ancestor.exists())
            .unwrap_or(self.root_path.as_path());
        if !existing.canonicalize()?.starts_with(&root_canonical) {
            return Err(FileSystemError::PathTraversal(path.to_string()));
        }

        Ok(effective)
    }

    async fn ensure_root(&self) -> Result<(), FileSystemError> {
        tokio::fs::create_dir_all(&self.root_path).await?;
        Ok(())
    }

    /// Write `content` to `path`, replacing any existing file. Returns the full path.
    pub async fn create_file(&self, path: &str, content: &str) -> Result<PathBuf, FileSystemError> {
        self.ensure_root().await?;
        let target = self.resolve(path)?;
        if target.is_dir() {
            return Err(FileSystemError::IsDirectory(target.display().to_string()));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content).await?;
        log::debug!("FileSystemTool: created {}", target.display());
        Ok(target)
    }

    pub async fn read_file(&self, path: &str) -> Result<String, FileSystemError> {
        self.ensure_root().await?;
        let target = self.resolve(path)?;
        if !target.exists() {
            return Err(FileSystemError::NotFound(target.display().to_string()));
        }
        if target.is_dir() {
            return Err(FileSystemError::IsDirectory(target.display().to_string()));
        }
        Ok(tokio::fs::read_to_string(&target).await?)
    }

    /// Entries of `directory` (empty for the root), sorted by name.
    pub async fn list_files(&self, directory: &str) -> Result<Vec<DirectoryEntry>, FileSystemError> {
        self.ensure_root().await?;
        let target = self.resolve(directory)?;
        if !target.exists() {
            return Err(FileSystemError::DirectoryNotFound(
                target.display().to_string(),
            ));
        }
        if !target.is_dir() {
            return Err(FileSystemError::NotADirectory(target.display().to_string()));
        }

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&target).await?;
        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_directory: metadata.is_dir(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

fn required_str<'a>(parameters: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    parameters
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing string parameter '{}'", name)))
}

#[async_trait]
impl ToolProtocol for FileSystemTool {
    async fn execute(
        &self,
        tool_name: &str,
        parameters: Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        let outcome = match tool_name {
            CREATE_FILE => {
                let path = required_str(&parameters, "path")?;
                let content = required_str(&parameters, "content")?;
                self.create_file(path, content)
                    .await
                    .map(|full| json!(format!("File created: {}", full.display())))
            }
            READ_FILE => {
                let path = required_str(&parameters, "path")?;
                self.read_file(path).await.map(Value::String)
            }
            LIST_FILES => {
                let directory = parameters
                    .get("directory")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                self.list_files(directory).await.map(|entries| {
                    let names: Vec<String> = entries
                        .into_iter()
                        .map(|e| {
                            if e.is_directory {
                                format!("{}/", e.name)
                            } else {
                                e.name
                            }
                        })
                        .collect();
                    json!(names)
                })
            }
            other => return Err(Box::new(ToolError::NotFound(other.to_string()))),
        };

        Ok(match outcome {
            Ok(output) => ToolResult::success(output),
            Err(err) => {
                log::warn!("FileSystemTool: {} failed: {}", tool_name, err);
                ToolResult::failure(err.to_string())
            }
        })
    }

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
        Ok(Self::tool_metadata())
    }

    fn protocol_name(&self) -> &str {
        "filesystem"
    }
}
