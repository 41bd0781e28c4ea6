use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Printed when linky is started without a lifecycle script key.
pub const USAGE: &str = r#"It seems you may be running linky from the command-line directly.
linky is meant to run as an npm script specified in your package.json.

Example package.json entry:

  "scripts": {
    "links:setup": "linky",
    "links:install": "linky"
  },
  "links": {
    "@pkg/name": "../pkg/path"
  },
  "devLinks": {
    "@otherPkg/name": "../otherPkg/path"
  }

Then exercise your linking power like:
  npm run links:setup                          # links "links" and "devLinks"
  NODE_ENV=production npm run links:setup      # links only "links"
  npm run links:install                        # links, then installs each linked package

Or name the script explicitly: linky links:setup"#;

#[derive(Debug, Error)]
pub enum LinkyError {
    #[error("No lifecycle script key given.\n{}", USAGE)]
    MissingOperation,

    #[error("unknown script key: {0}")]
    UnknownOperation(String),

    #[error("Manifest not found: {}", .path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("Invalid manifest {}: {source}", .path.display())]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}", describe_failure(.command, .code, .stderr))]
    Subprocess {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` did not finish within {limit:?}")]
    Timeout { command: String, limit: Duration },
}

/// The captured stderr is the message; fall back to the command and status
/// when the command printed nothing.
fn describe_failure(command: &str, code: &Option<i32>, stderr: &str) -> String {
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    match code {
        Some(code) => format!("`{}` exited with status {}", command, code),
        None => format!("`{}` was terminated by a signal", command),
    }
}
