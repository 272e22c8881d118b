//! npm package manifest handling for the contract package

use crate::error::{TypegenError, TypegenResult};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.json";
const LOCK_FILE: &str = "package-lock.json";

/// Version change applied to a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    pub previous: String,
    pub current: String,
}

/// Current version of the package in `dir`
pub fn read_version(dir: &Path) -> TypegenResult<String> {
    let path = dir.join(MANIFEST_FILE);
    let manifest = read_json(&path)?;
    manifest
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TypegenError::manifest(&path, "missing \"version\" field"))
}

/// Increment the patch version of the package in `dir` the way
/// `npm version patch --no-git-tag-version` does. A lockfile next to the
/// manifest is kept in step.
pub fn bump_patch_version(dir: &Path) -> TypegenResult<VersionBump> {
    let path = dir.join(MANIFEST_FILE);
    let mut manifest = read_json(&path)?;
    let previous = manifest
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TypegenError::manifest(&path, "missing \"version\" field"))?;
    let current = next_patch(&previous)
        .ok_or_else(|| TypegenError::manifest(&path, format!("invalid version \"{}\"", previous)))?;

    manifest["version"] = Value::String(current.clone());
    write_json(&path, &manifest)?;

    let lock_path = dir.join(LOCK_FILE);
    if lock_path.exists() {
        let mut lock = read_json(&lock_path)?;
        if let Some(object) = lock.as_object_mut() {
            object.insert("version".to_string(), Value::String(current.clone()));
        }
        if let Some(root) = lock.pointer_mut("/packages/").and_then(Value::as_object_mut) {
            root.insert("version".to_string(), Value::String(current.clone()));
        }
        write_json(&lock_path, &lock)?;
    }

    tracing::info!("Bumped {} from {} to {}", path.display(), previous, current);
    Ok(VersionBump { previous, current })
}

/// `1.2.3` -> `1.2.4`; a prerelease is released instead: `1.2.3-beta.1` -> `1.2.3`
pub fn next_patch(version: &str) -> Option<String> {
    let version = version.trim().trim_start_matches('v');
    let core_end = version.find(['-', '+']).unwrap_or(version.len());
    let (core, suffix) = version.split_at(core_end);
    let prerelease = suffix.starts_with('-');

    let parts: Vec<u64> = core
        .split('.')
        .map(|part| part.parse().ok())
        .collect::<Option<_>>()?;
    let [major, minor, patch] = parts.as_slice() else {
        return None;
    };

    let patch = if prerelease { *patch } else { patch + 1 };
    Some(format!("{}.{}.{}", major, minor, patch))
}

/// Parent directory of the contract, used when no package directory is given
pub fn default_package_dir(contract_path: &Path) -> PathBuf {
    contract_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn read_json(path: &Path) -> TypegenResult<Value> {
    let content = fs::read_to_string(path).map_err(|e| TypegenError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json(path: &Path, value: &Value) -> TypegenResult<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    fs::write(path, content).map_err(|e| TypegenError::io(path, e))
}
