//! A package on disk and the recursive link/install traversal.
//!
//! Traversal is strictly sequential: every child is handled, and every host
//! command awaited, before the next one starts. Host commands mutate the
//! global link registry and the process working directory, so two of them
//! must never run at the same time.

use anyhow::Result;
use futures_util::future::{BoxFuture, FutureExt};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::sync::OnceCell;

use super::{Environment, InstallProgress, Manifest, resolve_links};
use crate::host::Host;
use crate::runtime::{Runtime, resolve_relative_path, scoped_dir};

/// Indentation added per level of recursion in progress output.
const DEPTH_STEP: usize = 2;

/// Dependency name -> package, ordered by name.
pub type LinkSet<'a, R> = BTreeMap<String, PackageNode<'a, R>>;

/// Format a progress line: `[linky][<label>] <message>`, indented by `depth`.
pub fn progress_line(label: &str, depth: usize, message: &str) -> String {
    format!("{:depth$}[linky][{}] {}", "", label, message, depth = depth)
}

fn join_names<R: Runtime>(links: &LinkSet<'_, R>) -> String {
    links.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub struct PackageNode<'a, R: Runtime> {
    host: Host<'a, R>,
    path: PathBuf,
    depth: usize,
    manifest: OnceLock<Manifest>,
    production_links: OnceLock<LinkSet<'a, R>>,
    development_links: OnceLock<LinkSet<'a, R>>,
    linked: OnceCell<bool>,
}

impl<R: Runtime> fmt::Debug for PackageNode<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageNode")
            .field("path", &self.path)
            .field("depth", &self.depth)
            .field("manifest", &self.manifest.get())
            .finish_non_exhaustive()
    }
}

impl<'a, R: Runtime> PackageNode<'a, R> {
    pub fn new(host: Host<'a, R>, path: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            host,
            path: path.into(),
            depth,
            manifest: OnceLock::new(),
            production_links: OnceLock::new(),
            development_links: OnceLock::new(),
            linked: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The parsed manifest, read from disk on first use.
    pub fn manifest(&self) -> Result<&Manifest> {
        if let Some(manifest) = self.manifest.get() {
            return Ok(manifest);
        }
        let loaded = Manifest::load(self.host.runtime(), &self.path)?;
        Ok(self.manifest.get_or_init(|| loaded))
    }

    pub fn name(&self) -> Result<&str> {
        Ok(&self.manifest()?.name)
    }

    /// Packages linked by this one under `env`, computed once per environment.
    pub fn links(&self, env: Environment) -> Result<&LinkSet<'a, R>> {
        let cache = match env {
            Environment::Production => &self.production_links,
            Environment::Development => &self.development_links,
        };
        if let Some(links) = cache.get() {
            return Ok(links);
        }

        let links: LinkSet<'a, R> = resolve_links(self.manifest()?, env)
            .into_iter()
            .map(|(name, relative)| {
                let dir = resolve_relative_path(&self.path, Path::new(&relative));
                (name, PackageNode::new(self.host, dir, self.depth + DEPTH_STEP))
            })
            .collect();
        Ok(cache.get_or_init(|| links))
    }

    /// Whether this package is registered in the global link registry.
    /// The registry is queried at most once per node.
    pub async fn is_linked(&self) -> Result<bool> {
        let name = self.name()?;
        let linked = self
            .linked
            .get_or_try_init(|| self.host.link_exists(name))
            .await?;
        Ok(*linked)
    }

    fn report(&self, message: &str) {
        let label = match self.manifest.get() {
            Some(manifest) => manifest.name.clone(),
            None => self.path.display().to_string(),
        };
        println!("{}", progress_line(&label, self.depth, message));
    }

    /// Register this package globally, after wiring up its own links.
    pub async fn link(&self, requiree: &str, env: Environment) -> Result<()> {
        let name = self.name()?;
        self.report(&format!(
            "Linking package: {} (required by {})",
            name, requiree
        ));

        scoped_dir::within(self.host.runtime(), &self.path, || async move {
            self.setup_links(env).await?;
            self.host.register(&self.path).await?;
            Ok(())
        })
        .await?;

        self.report("DONE Linking package");
        Ok(())
    }

    /// Link every package this one declares into it, registering any that
    /// are not in the global registry yet.
    pub fn setup_links(&self, env: Environment) -> BoxFuture<'_, Result<()>> {
        async move {
            let links = self.links(env)?;
            if links.is_empty() {
                self.report("No linked dependencies found.");
                return Ok(());
            }

            let name = self.name()?;
            self.report(&format!(
                "Setting up linked dependencies: {}",
                join_names(links)
            ));

            for child in links.values() {
                if !child.is_linked().await? {
                    // Consumers only see a dependency's production links.
                    child.link(name, Environment::Production).await?;
                }
                self.host
                    .consume(&self.path, child.name()?, self.depth + DEPTH_STEP)
                    .await?;
            }

            self.report("DONE linking dependencies");
            Ok(())
        }
        .boxed()
    }

    /// Install every linked package reachable from this one, each exactly
    /// once per `progress`, dependencies before their consumers.
    ///
    /// `requiree` is `None` for the root package, which is not installed.
    pub fn install_links<'s>(
        &'s self,
        env: Environment,
        requiree: Option<&'s str>,
        progress: &'s mut InstallProgress,
    ) -> BoxFuture<'s, Result<()>> {
        async move {
            let links = self.links(env)?;
            let name = self.name()?;
            progress.queue(links.keys().cloned());

            if requiree.is_some() && !progress.is_installable(name) {
                self.report(&format!("Not re-installing {}", name));
                return Ok(());
            }

            if links.is_empty() {
                self.report("No linked dependencies found.");
            } else {
                self.report(&format!(
                    "Installing linked dependencies: {}",
                    join_names(links)
                ));
                for child in links.values() {
                    child.install_links(env, Some(name), progress).await?;
                }
                self.report(&format!("DONE installing {} dependencies", name));
            }

            if let Some(requiree) = requiree {
                self.report(&format!(
                    "Installing {} because it is a linked dependency of {}",
                    name, requiree
                ));
                self.host
                    .install(&self.path, self.depth + DEPTH_STEP)
                    .await?;
                self.report(&format!("DONE installing {}", name));
            }

            progress.mark_installed(name);
            Ok(())
        }
        .boxed()
    }
}
