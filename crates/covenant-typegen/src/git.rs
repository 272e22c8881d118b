//! Working-tree diff of the generated contract

use crate::error::{TypegenError, TypegenResult};
use git2::{DiffFormat, DiffOptions, Repository};
use std::path::{Path, PathBuf};

/// Unstaged changes under `path`, rendered as a patch, or `None` when the
/// contract is unchanged since the index.
pub fn contract_diff(path: &Path) -> TypegenResult<Option<String>> {
    let repo = Repository::discover(path)?;
    let pathspec = relative_to_workdir(&repo, path)?;

    let mut options = DiffOptions::new();
    options.pathspec(pathspec.as_path());
    let diff = repo.diff_index_to_workdir(None, Some(&mut options))?;

    let mut patch = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            patch.push(line.origin());
        }
        patch.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;

    Ok((!patch.is_empty()).then_some(patch))
}

fn relative_to_workdir(repo: &Repository, path: &Path) -> TypegenResult<PathBuf> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| git2::Error::from_str("repository has no working directory"))?;
    let workdir = workdir
        .canonicalize()
        .map_err(|e| TypegenError::io(workdir, e))?;
    let absolute = path.canonicalize().map_err(|e| TypegenError::io(path, e))?;

    Ok(absolute
        .strip_prefix(&workdir)
        .map(Path::to_path_buf)
        .unwrap_or(absolute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{IndexAddOption, Signature};
    use std::fs;
    use tempfile::TempDir;

    fn commit_all(repo: &Repository) {
        let mut index = repo.index().unwrap();
        index.add_all(["*"], IndexAddOption::DEFAULT, None).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("covenant", "covenant@localhost").unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "contract", &tree, &[])
            .unwrap();
    }

    #[test]
    fn test_contract_diff() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let contract = dir.path().join("contract");
        fs::create_dir_all(&contract).unwrap();
        fs::write(contract.join("server.ts"), "export interface paths {}\n").unwrap();
        fs::write(dir.path().join("README.md"), "readme\n").unwrap();
        commit_all(&repo);

        assert_eq!(contract_diff(&contract).unwrap(), None);

        fs::write(dir.path().join("README.md"), "changed\n").unwrap();
        assert_eq!(contract_diff(&contract).unwrap(), None);

        fs::write(contract.join("server.ts"), "export interface paths { a: 1 }\n").unwrap();
        let patch = contract_diff(&contract).unwrap().unwrap();
        assert!(patch.contains("-export interface paths {}"));
        assert!(patch.contains("+export interface paths { a: 1 }"));
        assert!(!patch.contains("README"));
    }

    #[test]
    fn test_outside_repository() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(contract_diff(dir.path()), Err(TypegenError::Git(_))));
    }
}
