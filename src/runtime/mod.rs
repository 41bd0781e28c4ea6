//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over system operations,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `path` - Path utility functions (normalize, resolve_relative_path)
//! - `env` - Environment variables and the process working directory
//! - `fs` - File system queries (read, exists)
//! - `process` - External command execution with captured/streamed output
//! - `scoped_dir` - Working-directory change that is always undone

mod env;
mod fs;
pub mod path;
mod process;
pub mod scoped_dir;

use anyhow::Result;
use async_trait::async_trait;
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use path::resolve_relative_path;
pub use process::{HostCommand, RunOptions, WRAP_WIDTH, wrap_lines};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // Working directory
    fn current_dir(&self) -> Result<PathBuf>;
    fn set_current_dir(&self, path: &Path) -> Result<()>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;

    // Processes
    /// Run an external command to completion and return its trimmed stdout.
    /// A nonzero exit status is an error carrying the trimmed stderr.
    async fn run(&self, command: &HostCommand, options: &RunOptions) -> Result<String>;
}

pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    fn set_current_dir(&self, path: &Path) -> Result<()> {
        self.set_current_dir_impl(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    async fn run(&self, command: &HostCommand, options: &RunOptions) -> Result<String> {
        self.run_impl(command, options).await
    }
}
