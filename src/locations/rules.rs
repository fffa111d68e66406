use std::path::PathBuf;

use crate::locations::registry::{HostEnvironment, HostOs};

/// A cloud-sync provider that takes over some standard locations when present.
///
/// Rules are applied in order after the default locations are registered, so
/// a later rule wins over an earlier one for the same name.
#[derive(Debug, Clone, Copy)]
pub struct OverrideRule {
    /// Name the provider root is registered under
    pub provider: &'static str,
    /// Provider root, relative to the home directory
    pub root: &'static str,
    /// Whether the rule applies on this host
    pub predicate: fn(&HostEnvironment) -> bool,
    /// Location name and its path relative to the provider root
    pub overrides: &'static [(&'static str, &'static str)],
}

impl OverrideRule {
    pub fn applies(&self, env: &HostEnvironment) -> bool {
        (self.predicate)(env)
    }

    pub fn root(&self, env: &HostEnvironment) -> PathBuf {
        env.home.join(self.root)
    }
}

/// OneDrive redirects Desktop, Documents and Pictures on Windows
pub const ONEDRIVE: OverrideRule = OverrideRule {
    provider: "onedrive",
    root: "OneDrive",
    predicate: |env| env.os == HostOs::Windows && env.home.join("OneDrive").is_dir(),
    overrides: &[
        ("desktop", "Desktop"),
        ("documents", "Documents"),
        ("pictures", "Pictures"),
    ],
};

pub fn default_rules() -> Vec<OverrideRule> {
    vec![ONEDRIVE]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::LocationRegistry;
    use std::path::Path;
    use tempfile::TempDir;

    fn onedrive_home() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("OneDrive")).unwrap();
        temp_dir
    }

    #[test]
    fn test_onedrive_overrides_on_windows() {
        let home = onedrive_home();
        let env = HostEnvironment::new(home.path(), HostOs::Windows);
        let registry = LocationRegistry::discover_with(&env, &default_rules());
        let onedrive = home.path().join("OneDrive");

        assert_eq!(registry.get("onedrive"), Some(onedrive.as_path()));
        assert_eq!(registry.get("desktop"), Some(onedrive.join("Desktop").as_path()));
        assert_eq!(
            registry.get("documents"),
            Some(onedrive.join("Documents").as_path())
        );
        assert_eq!(
            registry.get("pictures"),
            Some(onedrive.join("Pictures").as_path())
        );
        // Untouched by the provider
        assert_eq!(
            registry.get("downloads"),
            Some(home.path().join("Downloads").as_path())
        );
        assert_eq!(registry.get("music"), Some(home.path().join("Music").as_path()));
        assert_eq!(registry.get("videos"), Some(home.path().join("Videos").as_path()));
    }

    #[test]
    fn test_onedrive_ignored_on_other_platforms() {
        let home = onedrive_home();
        let env = HostEnvironment::new(home.path(), HostOs::Linux);
        let registry = LocationRegistry::discover_with(&env, &default_rules());

        assert!(!registry.contains("onedrive"));
        assert_eq!(
            registry.get("desktop"),
            Some(home.path().join("Desktop").as_path())
        );
    }

    #[test]
    fn test_onedrive_requires_existing_root() {
        let home = TempDir::new().unwrap();
        let env = HostEnvironment::new(home.path(), HostOs::Windows);
        let registry = LocationRegistry::discover_with(&env, &default_rules());

        assert!(!registry.contains("onedrive"));
    }

    #[test]
    fn test_rules_apply_in_order() {
        const FIRST: OverrideRule = OverrideRule {
            provider: "first",
            root: "first",
            predicate: |_| true,
            overrides: &[("documents", "docs")],
        };
        const SECOND: OverrideRule = OverrideRule {
            provider: "second",
            root: "second",
            predicate: |_| true,
            overrides: &[("documents", "docs")],
        };

        let env = HostEnvironment::new("/home/ada", HostOs::Linux);
        let registry = LocationRegistry::discover_with(&env, &[FIRST, SECOND]);

        assert_eq!(
            registry.get("documents"),
            Some(Path::new("/home/ada/second/docs"))
        );
        assert!(registry.contains("first"));
        assert!(registry.contains("second"));
    }
}
