use anyhow::Result;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::LinkyError;
use crate::runtime::Runtime;

/// The parts of a `package.json` that linky reads. Other fields are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    /// name -> relative path, always linked
    #[serde(default, deserialize_with = "null_as_empty")]
    pub links: BTreeMap<String, String>,
    /// name -> relative path, linked outside production only
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dev_links: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dev_dependencies: BTreeMap<String, String>,
}

/// `"links": null` and friends read as an empty map.
fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

impl Manifest {
    pub const FILE_NAME: &'static str = "package.json";

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime + ?Sized>(runtime: &R, package_dir: &Path) -> Result<Self> {
        let path = package_dir.join(Self::FILE_NAME);
        if !runtime.exists(&path) {
            return Err(LinkyError::ManifestNotFound { path }.into());
        }
        let content = runtime.read_to_string(&path)?;
        let manifest = serde_json::from_str(&content)
            .map_err(|source| LinkyError::ManifestInvalid { path, source })?;
        Ok(manifest)
    }
}
