use std::collections::BTreeSet;

/// Dedup state of one `links:install` run.
///
/// Names are queued as soon as a consumer declares them and move to
/// `installed` once their install finishes, so a package shared by several
/// consumers is installed once.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallProgress {
    installable: BTreeSet<String>,
    installed: Vec<String>,
}

impl InstallProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `names`, skipping anything already installed this run.
    pub fn queue<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installable.extend(names.into_iter().map(Into::into));
        let installed = &self.installed;
        self.installable.retain(|name| !installed.contains(name));
    }

    pub fn is_installable(&self, name: &str) -> bool {
        self.installable.contains(name)
    }

    pub fn mark_installed(&mut self, name: &str) {
        self.installable.remove(name);
        if !self.installed.iter().any(|n| n == name) {
            self.installed.push(name.to_string());
        }
    }

    pub fn installable(&self) -> impl Iterator<Item = &str> {
        self.installable.iter().map(String::as_str)
    }

    /// Installed names, in completion order.
    pub fn installed(&self) -> &[String] {
        &self.installed
    }
}
