//! Scoped working-directory change.

use anyhow::Result;
use std::future::Future;
use std::path::Path;

use super::Runtime;

/// Change into `dir`, await `f`, then change back to the original directory.
///
/// The original directory is restored whether or not `f` succeeds. When
/// both `f` and the restore fail, the error from `f` is returned.
pub async fn within<R, F, Fut, T>(runtime: &R, dir: &Path, f: F) -> Result<T>
where
    R: Runtime + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let original = runtime.current_dir()?;
    runtime.set_current_dir(dir)?;
    log::trace!("Entered {:?} (from {:?})", dir, original);

    let result = f().await;

    let restored = runtime.set_current_dir(&original);
    if let Err(e) = &restored {
        log::warn!("Failed to restore working directory {:?}: {}", original, e);
    }

    let value = result?;
    restored?;
    Ok(value)
}
