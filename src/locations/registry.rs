use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::locations::rules::{OverrideRule, default_rules};

/// Operating system families that change where user directories live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl HostOs {
    /// OS of the running process
    pub fn current() -> Self {
        Self::from_name(std::env::consts::OS)
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "windows" => HostOs::Windows,
            "macos" => HostOs::MacOs,
            "linux" => HostOs::Linux,
            _ => HostOs::Other,
        }
    }
}

/// Everything registry discovery reads from the host
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    pub home: PathBuf,
    pub os: HostOs,
}

impl HostEnvironment {
    pub fn new(home: impl Into<PathBuf>, os: HostOs) -> Self {
        Self {
            home: home.into(),
            os,
        }
    }

    /// Read the home directory and OS of the running process.
    ///
    /// Falls back to the working directory when no home directory is known.
    pub fn detect() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| {
            let fallback =
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from(std::path::MAIN_SEPARATOR_STR));
            warn!(
                "Could not determine home directory, using {} instead",
                fallback.display()
            );
            fallback
        });

        Self::new(home, HostOs::current())
    }
}

/// One symbolic name and the directory it stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Immutable map from lower-cased symbolic name to directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationRegistry {
    entries: BTreeMap<String, PathBuf>,
}

impl LocationRegistry {
    /// Discover locations for the running host with the default override rules
    pub fn discover() -> Self {
        Self::discover_with(&HostEnvironment::detect(), &default_rules())
    }

    /// Build the registry for `env`, then apply `rules` in order.
    ///
    /// Directories are registered whether or not they exist.
    pub fn discover_with(env: &HostEnvironment, rules: &[OverrideRule]) -> Self {
        let mut registry = Self::default();
        let home = env.home.as_path();

        registry.insert("home", home);
        registry.insert("desktop", home.join("Desktop"));
        registry.insert("documents", home.join("Documents"));
        registry.insert("downloads", home.join("Downloads"));
        registry.insert("pictures", home.join("Pictures"));
        registry.insert("music", home.join("Music"));
        registry.insert(
            "videos",
            home.join(if env.os == HostOs::MacOs {
                "Movies"
            } else {
                "Videos"
            }),
        );

        for rule in rules {
            if !rule.applies(env) {
                continue;
            }

            let root = rule.root(env);
            info!("Cloud sync root '{}' found at {}", rule.provider, root.display());
            registry.insert(rule.provider, &root);
            for (name, relative) in rule.overrides {
                registry.insert(name, root.join(relative));
            }
        }

        debug!("Discovered {} locations", registry.len());
        registry
    }

    /// Register `path` under `name`, replacing any earlier entry with the same name
    pub fn insert(&mut self, name: &str, path: impl AsRef<Path>) {
        let key = name.to_lowercase();
        if let Some(previous) = self.entries.insert(key.clone(), path.as_ref().to_path_buf()) {
            debug!(
                "Location '{}' overridden: {} -> {}",
                key,
                previous.display(),
                path.as_ref().display()
            );
        }
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with_location(mut self, name: &str, path: impl AsRef<Path>) -> Self {
        self.insert(name, path);
        self
    }

    /// Look up a name, ignoring case
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(&name.to_lowercase()).map(PathBuf::as_path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by name
    pub fn entries(&self) -> impl Iterator<Item = LocationEntry> + '_ {
        self.entries.iter().map(|(name, path)| LocationEntry {
            name: name.clone(),
            path: path.clone(),
        })
    }

    /// Entries whose directory exists right now
    pub fn existing(&self) -> BTreeMap<String, PathBuf> {
        self.entries
            .iter()
            .filter(|(_, path)| path.is_dir())
            .map(|(name, path)| (name.clone(), path.clone()))
            .collect()
    }
}
