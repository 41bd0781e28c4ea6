use anyhow::Result;
use log::debug;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::LinkyError;
use crate::host::Toolchain;
use crate::package::Environment;
use crate::runtime::{Runtime, resolve_relative_path};

/// Highest-precedence environment variable selecting the environment.
pub const LINKY_ENV: &str = "LINKY_ENV";
/// Consulted when `LINKY_ENV` is unset.
pub const NODE_ENV: &str = "NODE_ENV";

/// What a run does, selected by the npm lifecycle script key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `links:setup` - link only
    Setup,
    /// `links:install` - link, then install every linked package
    Install,
}

impl Operation {
    pub const SETUP: &'static str = "links:setup";
    pub const INSTALL: &'static str = "links:install";
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Setup => Self::SETUP,
            Operation::Install => Self::INSTALL,
        })
    }
}

impl FromStr for Operation {
    type Err = LinkyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::SETUP => Ok(Operation::Setup),
            Self::INSTALL => Ok(Operation::Install),
            other => Err(LinkyError::UnknownOperation(other.to_string())),
        }
    }
}

/// Values taken from the command line. `None` means "use the default".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub script: Option<String>,
    pub env: Option<String>,
    pub cwd: Option<PathBuf>,
    pub linker: Option<String>,
    pub installer: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub operation: Operation,
    /// Environment name as given, e.g. `staging`.
    pub env_name: String,
    pub environment: Environment,
    /// Directory of the root package.
    pub root: PathBuf,
    pub toolchain: Toolchain,
    pub timeout: Option<Duration>,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// `explicit`, then `LINKY_ENV`, then `NODE_ENV`, then `development`.
/// Empty values count as unset.
pub fn resolve_env_name<R: Runtime + ?Sized>(runtime: &R, explicit: Option<String>) -> String {
    explicit
        .and_then(non_empty)
        .or_else(|| runtime.env_var(LINKY_ENV).ok().and_then(non_empty))
        .or_else(|| runtime.env_var(NODE_ENV).ok().and_then(non_empty))
        .unwrap_or_else(|| Environment::DEVELOPMENT.to_string())
}

impl Config {
    pub fn new<R: Runtime + ?Sized>(runtime: &R, overrides: Overrides) -> Result<Self> {
        let script = overrides
            .script
            .and_then(non_empty)
            .ok_or(LinkyError::MissingOperation)?;
        let operation = script.parse::<Operation>()?;

        let env_name = resolve_env_name(runtime, overrides.env);
        let environment = Environment::from_name(&env_name);

        let cwd = runtime.current_dir()?;
        let root = match overrides.cwd {
            Some(dir) => resolve_relative_path(&cwd, &dir),
            None => cwd,
        };

        let defaults = Toolchain::default();
        let toolchain = Toolchain::new(
            overrides.linker.and_then(non_empty).unwrap_or(defaults.linker),
            overrides
                .installer
                .and_then(non_empty)
                .unwrap_or(defaults.installer),
        );

        let timeout = overrides
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        debug!(
            "Config: {:?} env={} ({}) root={:?} toolchain={:?} timeout={:?}",
            operation, env_name, environment, root, toolchain, timeout
        );

        Ok(Self {
            operation,
            env_name,
            environment,
            root,
            toolchain,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::configure_mock_runtime_basics;
    use mockall::predicate::eq;

    fn runtime_with_env(linky_env: Option<&'static str>, node_env: Option<&'static str>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(LINKY_ENV))
            .returning(move |_| linky_env.map(String::from).ok_or(std::env::VarError::NotPresent));
        runtime
            .expect_env_var()
            .with(eq(NODE_ENV))
            .returning(move |_| node_env.map(String::from).ok_or(std::env::VarError::NotPresent));
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/work/app")));
        runtime
    }

    fn setup() -> Overrides {
        Overrides {
            script: Some(Operation::SETUP.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_operation_from_str() {
        assert_eq!("links:setup".parse::<Operation>().unwrap(), Operation::Setup);
        assert_eq!("links:install".parse::<Operation>().unwrap(), Operation::Install);

        let err = "links:bogus".parse::<Operation>().unwrap_err();
        assert_eq!(err.to_string(), "unknown script key: links:bogus");
    }

    #[test]
    fn test_linky_env_wins_over_node_env() {
        let runtime = runtime_with_env(Some("linky_env"), Some("production"));
        assert_eq!(resolve_env_name(&runtime, None), "linky_env");
    }

    #[test]
    fn test_node_env_used_when_linky_env_unset() {
        let runtime = runtime_with_env(None, Some("node_env"));
        assert_eq!(resolve_env_name(&runtime, None), "node_env");
    }

    #[test]
    fn test_default_env_is_development() {
        let runtime = runtime_with_env(None, None);
        assert_eq!(resolve_env_name(&runtime, None), "development");

        let runtime = runtime_with_env(Some(""), Some("  "));
        assert_eq!(resolve_env_name(&runtime, None), "development");
    }

    #[test]
    fn test_explicit_env_wins() {
        let runtime = runtime_with_env(Some("linky_env"), Some("node_env"));
        assert_eq!(
            resolve_env_name(&runtime, Some("production".into())),
            "production"
        );
    }

    #[test]
    fn test_config_defaults() {
        let runtime = runtime_with_env(None, Some("production"));
        let config = Config::new(&runtime, setup()).unwrap();

        assert_eq!(config.operation, Operation::Setup);
        assert_eq!(config.env_name, "production");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.root, PathBuf::from("/work/app"));
        assert_eq!(config.toolchain, Toolchain::default());
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_config_non_production_env_is_development() {
        let runtime = runtime_with_env(Some("staging"), None);
        let config = Config::new(&runtime, setup()).unwrap();
        assert_eq!(config.env_name, "staging");
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_config_overrides() {
        let runtime = runtime_with_env(None, None);
        let config = Config::new(
            &runtime,
            Overrides {
                script: Some(Operation::INSTALL.into()),
                cwd: Some(PathBuf::from("../lib")),
                linker: Some("pnpm".into()),
                installer: Some("npm".into()),
                timeout_secs: Some(90),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(config.operation, Operation::Install);
        assert_eq!(config.root, PathBuf::from("/work/lib"));
        assert_eq!(config.toolchain, Toolchain::new("pnpm", "npm"));
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_config_zero_timeout_disables_timeout() {
        let runtime = runtime_with_env(None, None);
        let config = Config::new(
            &runtime,
            Overrides {
                timeout_secs: Some(0),
                ..setup()
            },
        )
        .unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_config_missing_script() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);

        let err = Config::new(&runtime, Overrides::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkyError>(),
            Some(LinkyError::MissingOperation)
        ));

        let err = Config::new(
            &runtime,
            Overrides {
                script: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LinkyError>(),
            Some(LinkyError::MissingOperation)
        ));
    }

    #[test]
    fn test_config_unknown_script() {
        let mut runtime = MockRuntime::new();
        configure_mock_runtime_basics(&mut runtime);

        let err = Config::new(
            &runtime,
            Overrides {
                script: Some("links:bogus".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "unknown script key: links:bogus");
    }
}
