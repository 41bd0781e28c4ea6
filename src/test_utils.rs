//! Test utilities.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::env::VarError;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::LinkyError;
use crate::package::Manifest;
use crate::runtime::{HostCommand, MockRuntime, RunOptions, Runtime};

/// Where [`FakeRuntime`] keeps globally registered packages.
pub const REGISTRY_ROOT: &str = "/registry";

/// Configure a mock runtime with common defaults for tests.
/// - no environment variables set
/// - current_dir is `/work`, set_current_dir always succeeds
pub fn configure_mock_runtime_basics(runtime: &mut MockRuntime) {
    runtime
        .expect_env_var()
        .returning(|_| Err(VarError::NotPresent));
    runtime
        .expect_current_dir()
        .returning(|| Ok(PathBuf::from("/work")));
    runtime.expect_set_current_dir().returning(|_| Ok(()));
}

/// An in-memory package tree that plays the host package manager.
///
/// Every command is recorded as `"<command> @ <working dir>"`. `<linker>
/// link` registers the package found in the working directory, `root -g`
/// answers [`REGISTRY_ROOT`]. Starting a command while another one is
/// still running panics.
pub struct FakeRuntime {
    manifests: HashMap<PathBuf, String>,
    env: HashMap<String, String>,
    failures: HashMap<String, String>,
    registered: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<String>>,
    cwd: Mutex<PathBuf>,
    busy: AtomicBool,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            manifests: HashMap::new(),
            env: HashMap::new(),
            failures: HashMap::new(),
            registered: Mutex::new(BTreeSet::new()),
            calls: Mutex::new(Vec::new()),
            cwd: Mutex::new(PathBuf::from("/work")),
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_package(mut self, dir: &str, manifest: serde_json::Value) -> Self {
        self.manifests.insert(
            Path::new(dir).join(Manifest::FILE_NAME),
            manifest.to_string(),
        );
        self
    }

    pub fn with_registered(self, name: &str) -> Self {
        self.registered.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Make the call recorded as `call` exit nonzero with `stderr`.
    pub fn failing(mut self, call: &str, stderr: &str) -> Self {
        self.failures.insert(call.to_string(), stderr.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.contains(needle))
            .collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.lock().unwrap().contains(name)
    }

    pub fn cwd(&self) -> PathBuf {
        self.cwd.lock().unwrap().clone()
    }

    fn register_dir(&self, dir: &Path) -> Result<()> {
        let content = self.read_to_string(&dir.join(Manifest::FILE_NAME))?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        self.registered.lock().unwrap().insert(manifest.name);
        Ok(())
    }

    fn respond(&self, command: &HostCommand, dir: &Path, call: &str) -> Result<String> {
        if let Some(stderr) = self.failures.get(call) {
            return Err(LinkyError::Subprocess {
                command: command.to_string(),
                code: Some(1),
                stderr: stderr.clone(),
            }
            .into());
        }
        match command.args.as_slice() {
            [root, global] if root == "root" && global == "-g" => Ok(REGISTRY_ROOT.to_string()),
            [link] if link == "link" => {
                self.register_dir(dir)?;
                Ok(String::new())
            }
            _ => Ok(String::new()),
        }
    }
}

#[async_trait]
impl Runtime for FakeRuntime {
    fn env_var(&self, key: &str) -> Result<String, VarError> {
        self.env.get(key).cloned().ok_or(VarError::NotPresent)
    }

    fn current_dir(&self) -> Result<PathBuf> {
        Ok(self.cwd())
    }

    fn set_current_dir(&self, path: &Path) -> Result<()> {
        *self.cwd.lock().unwrap() = path.to_path_buf();
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.manifests
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("ENOENT: no such file {}", path.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        if self.manifests.contains_key(path) {
            return true;
        }
        match path.strip_prefix(REGISTRY_ROOT) {
            Ok(name) => self.is_registered(&name.to_string_lossy()),
            Err(_) => false,
        }
    }

    async fn run(&self, command: &HostCommand, options: &RunOptions) -> Result<String> {
        assert!(
            !self.busy.swap(true, Ordering::SeqCst),
            "`{}` started while another command was running",
            command
        );

        let dir = options.cwd.clone().unwrap_or_else(|| self.cwd());
        let call = format!("{} @ {}", command, dir.display());
        self.calls.lock().unwrap().push(call.clone());

        // Give any concurrently polled work a chance to start
        tokio::task::yield_now().await;

        let result = self.respond(command, &dir, &call);
        self.busy.store(false, Ordering::SeqCst);
        result
    }
}
