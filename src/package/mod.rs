//! Package graph module
//!
//! This module models packages on disk, the links their manifests declare,
//! and the recursive link/install traversal over them.

mod link_source;
mod manifest;
mod node;
mod progress;

use std::fmt;

pub use link_source::{LinkSource, extract_local, resolve_links};
pub use manifest::Manifest;
pub use node::{LinkSet, PackageNode, progress_line};
pub use progress::InstallProgress;

/// Which links apply. Anything other than `production` is development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    pub const PRODUCTION: &'static str = "production";
    pub const DEVELOPMENT: &'static str = "development";

    pub fn from_name(name: &str) -> Self {
        if name == Self::PRODUCTION {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str(Self::PRODUCTION),
            Environment::Development => f.write_str(Self::DEVELOPMENT),
        }
    }
}
