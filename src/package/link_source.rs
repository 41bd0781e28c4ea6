//! Where a package's links come from.
//!
//! Each manifest field that can declare a link is a [`LinkSource`]. Sources
//! produce `name -> relative path` entries independently and are merged in
//! [`LinkSource::PRECEDENCE`] order, later sources overwriting earlier ones.

use std::collections::BTreeMap;

use super::{Environment, Manifest};

/// Version specifiers that point at a directory on disk.
const LOCAL_PREFIXES: [&str; 2] = ["link:", "file:"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    /// `link:`/`file:` entries of `dependencies`
    Dependencies,
    /// the `links` field
    Links,
    /// `link:`/`file:` entries of `devDependencies`
    DevDependencies,
    /// the `devLinks` field
    DevLinks,
}

impl LinkSource {
    /// Merge order, lowest precedence first. Explicit link fields beat
    /// prefixed dependencies, development beats production.
    pub const PRECEDENCE: [LinkSource; 4] = [
        LinkSource::Dependencies,
        LinkSource::Links,
        LinkSource::DevDependencies,
        LinkSource::DevLinks,
    ];

    pub fn is_development(self) -> bool {
        matches!(self, LinkSource::DevDependencies | LinkSource::DevLinks)
    }

    pub fn applies_to(self, env: Environment) -> bool {
        !self.is_development() || !env.is_production()
    }

    pub fn produce(self, manifest: &Manifest) -> BTreeMap<String, String> {
        match self {
            LinkSource::Dependencies => extract_local(&manifest.dependencies),
            LinkSource::Links => manifest.links.clone(),
            LinkSource::DevDependencies => extract_local(&manifest.dev_dependencies),
            LinkSource::DevLinks => manifest.dev_links.clone(),
        }
    }
}

/// Keep dependencies whose version is a local path, with the prefix stripped.
pub fn extract_local(dependencies: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    dependencies
        .iter()
        .filter_map(|(name, spec)| {
            LOCAL_PREFIXES
                .iter()
                .find_map(|prefix| spec.strip_prefix(prefix))
                .map(|path| (name.clone(), path.to_string()))
        })
        .collect()
}

/// All links `manifest` declares for `env`, as `name -> relative path`.
pub fn resolve_links(manifest: &Manifest, env: Environment) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();
    for source in LinkSource::PRECEDENCE {
        if source.applies_to(env) {
            links.extend(source.produce(manifest));
        }
    }
    links
}
