//! velum-sync: fetch a vault out of a git repository.
//!
//! Clones a remote repository into a local directory and opens the
//! working tree as a [`DirVault`]. The encrypted format is
//! diff-friendly (fixed superblocks, per-superblock IVs), so a vault
//! versioned in git stays mergeable at the file level; this crate only
//! does the acquisition.

use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, RemoteCallbacks};
use tracing::info;

use velum_core::{VelumError, VelumResult};
use velum_fs::DirVault;

/// Credentials for the remote.
#[derive(Debug, Clone, Default)]
pub enum GitAuth {
    #[default]
    Anonymous,
    UserPass {
        username: String,
        password: String,
    },
    SshKey {
        username: String,
        private_key: PathBuf,
    },
}

/// Clone `from` into `into` anonymously and open the result.
pub fn clone(from: &str, into: &Path) -> VelumResult<DirVault> {
    clone_with_auth(from, into, GitAuth::Anonymous)
}

/// Clone `from` into `into` with explicit credentials and open the
/// result as a directory vault.
pub fn clone_with_auth(from: &str, into: &Path, auth: GitAuth) -> VelumResult<DirVault> {
    let mut callbacks = RemoteCallbacks::new();
    match auth {
        GitAuth::Anonymous => {}
        GitAuth::UserPass { username, password } => {
            callbacks.credentials(move |_url, _username_from_url, _allowed| {
                Cred::userpass_plaintext(&username, &password)
            });
        }
        GitAuth::SshKey {
            username,
            private_key,
        } => {
            callbacks.credentials(move |_url, username_from_url, _allowed| {
                let user = username_from_url.unwrap_or(&username);
                Cred::ssh_key(user, None, &private_key, None)
            });
        }
    }

    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(callbacks);

    RepoBuilder::new()
        .fetch_options(fetch)
        .clone(from, into)
        .map_err(|e| VelumError::Sync(format!("cloning {from}: {}", e.message())))?;

    info!(from, into = %into.display(), "vault repository cloned");

    Ok(DirVault::open(into))
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature};
    use velum_core::{ItemRef, Vault};

    /// A local repository with one committed file, to clone from by path.
    fn seed_repo(path: &Path) {
        let repo = Repository::init(path).unwrap();
        std::fs::write(path.join("readme.txt"), b"seeded").unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new("readme.txt")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let sig = Signature::now("tester", "tester@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "seed", &tree, &[])
            .unwrap();
    }

    #[test]
    fn test_clone_local_and_open() {
        let tmp = tempfile::tempdir().unwrap();
        let origin = tmp.path().join("origin");
        std::fs::create_dir(&origin).unwrap();
        seed_repo(&origin);

        let target = tmp.path().join("clone");
        let vault = clone(origin.to_str().unwrap(), &target).unwrap();

        let root = vault.root();
        let names: Vec<_> = vault
            .list(&root)
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .filter(|n| n != ".git")
            .collect();
        assert_eq!(names, ["readme.txt"]);
    }

    #[test]
    fn test_clone_missing_remote_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let result = clone(
            tmp.path().join("no-such-origin").to_str().unwrap(),
            &tmp.path().join("clone"),
        );
        assert!(matches!(result, Err(VelumError::Sync(_))));
    }
}
