use std::path::{Component, Path, PathBuf};

use crate::locations::registry::LocationRegistry;

/// Maps caller path expressions onto absolute native paths.
///
/// Resolution is a pure function of the expression, the registry and the
/// working directory captured at construction. It never touches the
/// filesystem and never fails.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    locations: &'a LocationRegistry,
    working_directory: &'a Path,
}

impl<'a> PathResolver<'a> {
    pub fn new(locations: &'a LocationRegistry, working_directory: &'a Path) -> Self {
        Self {
            locations,
            working_directory,
        }
    }

    pub fn resolve(&self, expression: &str) -> PathBuf {
        if Path::new(expression).is_absolute() {
            return PathBuf::from(expression);
        }

        let normalized = expression.replace('\\', "/");
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

        if let Some((first, rest)) = segments.split_first() {
            if let Some(base) = self.locations.get(first) {
                let mut resolved = base.to_path_buf();
                resolved.extend(rest);
                return resolved;
            }
        }

        let mut joined = self.working_directory.to_path_buf();
        joined.extend(&segments);
        normalize_lexically(&joined)
    }
}

/// Drop `.` components and fold `..` into its parent without consulting the disk
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pops past the root or a drive prefix
                if matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
