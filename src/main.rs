use anyhow::Result;
use clap::Parser;
use linky::commands::{self, Overrides};
use linky::runtime::RealRuntime;
use std::path::PathBuf;

/// linky - link local packages declared in package.json
///
/// Meant to run as an npm script. The script key selects the operation:
///   "links:setup"    link every package in "links"/"devLinks"
///   "links:install"  link as above, then install each linked package
///                    (lifecycle scripts suppressed)
///
/// The environment comes from --env, LINKY_ENV or NODE_ENV (default "development").
/// Only "production" skips "devLinks" and "link:"/"file:" devDependencies.
#[derive(Parser, Debug)]
#[command(author, version = env!("LINKY_VERSION"), about)]
struct Cli {
    /// Lifecycle script key (defaults to the running npm script)
    #[arg(value_name = "SCRIPT", env = "npm_lifecycle_event")]
    script: Option<String>,

    /// Environment name; overrides LINKY_ENV and NODE_ENV
    #[arg(long, value_name = "ENV")]
    env: Option<String>,

    /// Root package directory (defaults to the current directory)
    #[arg(long, short = 'C', value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Program owning the global link registry
    #[arg(long, env = "LINKY_LINKER", value_name = "PROGRAM")]
    linker: Option<String>,

    /// Program installing linked packages' dependencies
    #[arg(long, env = "LINKY_INSTALLER", value_name = "PROGRAM")]
    installer: Option<String>,

    /// Abort any host command running longer than this (0 disables)
    #[arg(long, env = "LINKY_TIMEOUT", value_name = "SECONDS")]
    timeout: Option<u64>,
}

impl From<Cli> for Overrides {
    fn from(cli: Cli) -> Self {
        Overrides {
            script: cli.script,
            env: cli.env,
            cwd: cli.cwd,
            linker: cli.linker,
            installer: cli.installer,
            timeout_secs: cli.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    commands::linky(&runtime, cli.into()).await
}
