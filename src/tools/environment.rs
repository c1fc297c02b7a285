//! Bundle environment validation.
//!
//! Runs synchronously before every launch attempt and is never cached: the
//! user may reinstall or delete a bundle's runtime between launches.

use super::registry::ToolDescriptor;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Why a bundle's environment cannot be launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EnvironmentIssue {
    /// The runtime binary does not exist.
    RuntimeMissing { path: PathBuf },
    /// The runtime exists but is not an executable file.
    RuntimeNotExecutable { path: PathBuf },
    /// `root_path/entry_point` does not exist.
    EntryPointMissing { path: PathBuf },
}

impl EnvironmentIssue {
    /// The path the user needs to fix.
    pub fn path(&self) -> &Path {
        match self {
            EnvironmentIssue::RuntimeMissing { path }
            | EnvironmentIssue::RuntimeNotExecutable { path }
            | EnvironmentIssue::EntryPointMissing { path } => path,
        }
    }
}

impl fmt::Display for EnvironmentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentIssue::RuntimeMissing { path } => {
                write!(f, "runtime not found: {}", path.display())
            }
            EnvironmentIssue::RuntimeNotExecutable { path } => {
                write!(f, "runtime is not executable: {}", path.display())
            }
            EnvironmentIssue::EntryPointMissing { path } => {
                write!(f, "entry point not found: {}", path.display())
            }
        }
    }
}

/// Check that `descriptor`'s runtime and entry point are in place. No side effects.
pub fn validate(descriptor: &ToolDescriptor) -> Result<(), EnvironmentIssue> {
    let runtime = &descriptor.runtime_path;
    let metadata = match std::fs::metadata(runtime) {
        Ok(metadata) => metadata,
        Err(_) => {
            return Err(EnvironmentIssue::RuntimeMissing {
                path: runtime.clone(),
            })
        }
    };
    if !is_executable(&metadata) {
        return Err(EnvironmentIssue::RuntimeNotExecutable {
            path: runtime.clone(),
        });
    }

    let entry = descriptor.entry_path();
    if !entry.exists() {
        return Err(EnvironmentIssue::EntryPointMissing { path: entry });
    }

    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    metadata.is_file()
}
