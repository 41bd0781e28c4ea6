//! Host package manager commands.
//!
//! linky never creates symlinks itself. Registering a package in the global
//! link registry, consuming it from another package, and installing
//! dependencies are all delegated to the host package manager.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runtime::{HostCommand, RunOptions, Runtime};

/// Programs used for linking and installing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Owns the global link registry (`link`, `link <name>`, `root -g`).
    pub linker: String,
    /// Installs a package's dependencies.
    pub installer: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            linker: "npm".to_string(),
            installer: "yarn".to_string(),
        }
    }
}

impl Toolchain {
    pub fn new(linker: impl Into<String>, installer: impl Into<String>) -> Self {
        Self {
            linker: linker.into(),
            installer: installer.into(),
        }
    }

    /// Register the package in the working directory globally.
    pub fn register(&self) -> HostCommand {
        HostCommand::new(&self.linker, ["link"])
    }

    /// Link an already registered package into the working directory.
    pub fn consume(&self, name: &str) -> HostCommand {
        HostCommand::new(&self.linker, ["link", name])
    }

    pub fn registry_root(&self) -> HostCommand {
        HostCommand::new(&self.linker, ["root", "-g"])
    }

    /// Install dependencies with lifecycle scripts suppressed.
    pub fn install(&self) -> HostCommand {
        HostCommand::new(&self.installer, ["install", "--ignore-scripts"])
    }
}

/// A runtime paired with the toolchain it drives.
pub struct Host<'a, R: Runtime> {
    runtime: &'a R,
    toolchain: &'a Toolchain,
    timeout: Option<Duration>,
}

// Manual impls: derive would require `R: Clone`.
impl<R: Runtime> Clone for Host<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Runtime> Copy for Host<'_, R> {}

impl<'a, R: Runtime> Host<'a, R> {
    pub fn new(runtime: &'a R, toolchain: &'a Toolchain, timeout: Option<Duration>) -> Self {
        Self {
            runtime,
            toolchain,
            timeout,
        }
    }

    pub fn runtime(&self) -> &'a R {
        self.runtime
    }

    fn options(&self, dir: &Path) -> RunOptions {
        RunOptions::in_dir(dir).with_timeout(self.timeout)
    }

    #[tracing::instrument(skip(self))]
    pub async fn register(&self, dir: &Path) -> Result<String> {
        self.runtime
            .run(&self.toolchain.register(), &self.options(dir))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn consume(&self, dir: &Path, name: &str, indent: usize) -> Result<String> {
        self.runtime
            .run(
                &self.toolchain.consume(name),
                &self.options(dir).streamed(indent),
            )
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn install(&self, dir: &Path, indent: usize) -> Result<String> {
        self.runtime
            .run(&self.toolchain.install(), &self.options(dir).streamed(indent))
            .await
    }

    /// Directory holding globally registered packages. Not cached.
    pub async fn registry_root(&self) -> Result<PathBuf> {
        let opts = RunOptions::default().with_timeout(self.timeout);
        let root = self
            .runtime
            .run(&self.toolchain.registry_root(), &opts)
            .await?;
        Ok(PathBuf::from(root))
    }

    /// Whether `name` is present in the global link registry.
    #[tracing::instrument(skip(self))]
    pub async fn link_exists(&self, name: &str) -> Result<bool> {
        let root = self.registry_root().await?;
        let exists = self.runtime.exists(&root.join(name));
        log::debug!("{} registered under {:?}: {}", name, root, exists);
        Ok(exists)
    }
}
