use anyhow::Result;
use log::debug;

use crate::host::Host;
use crate::package::{InstallProgress, PackageNode, progress_line};
use crate::runtime::Runtime;

pub mod config;

pub use config::{Config, Operation, Overrides};

/// Resolve configuration and run the selected operation.
#[tracing::instrument(skip(runtime, overrides))]
pub async fn linky<R: Runtime>(runtime: &R, overrides: Overrides) -> Result<()> {
    let config = Config::new(runtime, overrides)?;
    run(runtime, &config).await
}

/// Run `config.operation` on the package at `config.root`.
///
/// `links:install` links the whole graph first, then installs it.
#[tracing::instrument(skip(runtime, config))]
pub async fn run<R: Runtime>(runtime: &R, config: &Config) -> Result<()> {
    let host = Host::new(runtime, &config.toolchain, config.timeout);
    let root = PackageNode::new(host, config.root.clone(), 0);

    println!(
        "{}",
        progress_line(
            root.name()?,
            0,
            &format!("Running {} ({})", config.operation, config.env_name)
        )
    );

    match config.operation {
        Operation::Setup => root.setup_links(config.environment).await,
        Operation::Install => {
            root.setup_links(config.environment).await?;
            let mut progress = InstallProgress::new();
            root.install_links(config.environment, None, &mut progress)
                .await?;
            debug!("Install finished: {:?}", progress.installed());
            Ok(())
        }
    }
}
