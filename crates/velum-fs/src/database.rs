//! The vault database: encrypted vaults as subdirectories of one base
//! directory.

use std::fs;
use std::io;
use std::path::PathBuf;

use velum_core::{VelumError, VelumResult};
use velum_crypt::{CryptVault, KdfParams};

use crate::vault::DirVault;

/// Enumerates and opens the vaults under a base directory. Each
/// immediate subdirectory is one candidate vault.
#[derive(Debug, Clone)]
pub struct VaultDatabase {
    base: PathBuf,
}

impl VaultDatabase {
    pub fn open(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Names of the candidate vaults. Whether a directory really is a
    /// vault is only known once it is opened (the header decides).
    pub fn list(&self) -> VelumResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a new vault directory and initialize it with the given
    /// password and default KDF parameters.
    pub fn create_vault(&self, name: &str, password: &[u8]) -> VelumResult<CryptVault<DirVault>> {
        self.create_vault_with_params(name, password, KdfParams::default())
    }

    pub fn create_vault_with_params(
        &self,
        name: &str,
        password: &[u8],
        params: KdfParams,
    ) -> VelumResult<CryptVault<DirVault>> {
        check_vault_name(name)?;

        let path = self.base.join(name);
        fs::create_dir(&path).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => VelumError::AlreadyExists(name.to_string()),
            _ => VelumError::Io(e),
        })?;

        CryptVault::create_with_params(DirVault::open(path), password, params)
    }

    /// Open an existing vault by name.
    pub fn open_vault(&self, name: &str, password: &[u8]) -> VelumResult<CryptVault<DirVault>> {
        check_vault_name(name)?;

        let path = self.base.join(name);
        if !path.is_dir() {
            return Err(VelumError::NotFound(name.to_string()));
        }

        CryptVault::open(DirVault::open(path), password)
    }
}

fn check_vault_name(name: &str) -> VelumResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(VelumError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid vault name: {name:?}"),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use velum_core::{ItemKind, ItemRef, Vault};

    fn fast_params() -> KdfParams {
        KdfParams {
            time: 1,
            memory: 1024,
            threads: 1,
        }
    }

    #[test]
    fn test_list_empty_base() {
        let tmp = tempfile::tempdir().unwrap();
        let db = VaultDatabase::open(tmp.path());
        assert!(db.list().unwrap().is_empty());
    }

    #[test]
    fn test_create_then_list_then_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let db = VaultDatabase::open(tmp.path());

        let mut vault = db
            .create_vault_with_params("journal", b"hunter2", fast_params())
            .unwrap();
        let root = vault.root();
        let file = vault.create(&root, "day-one.md", ItemKind::File).unwrap();
        vault.write(&file, b"dear diary").unwrap();
        drop(vault);

        assert_eq!(db.list().unwrap(), ["journal"]);

        let reopened = db.open_vault("journal", b"hunter2").unwrap();
        let root = reopened.root();
        let entries = reopened.list(&root).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "day-one.md");
        assert_eq!(reopened.read(&entries[0]).unwrap(), b"dear diary");
    }

    #[test]
    fn test_create_duplicate_vault_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let db = VaultDatabase::open(tmp.path());

        db.create_vault_with_params("v", b"pw", fast_params())
            .unwrap();
        assert!(matches!(
            db.create_vault_with_params("v", b"pw", fast_params()),
            Err(VelumError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_open_missing_vault() {
        let tmp = tempfile::tempdir().unwrap();
        let db = VaultDatabase::open(tmp.path());
        assert!(matches!(
            db.open_vault("ghost", b"pw"),
            Err(VelumError::NotFound(_))
        ));
    }

    #[test]
    fn test_open_dir_without_header() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("plain")).unwrap();

        let db = VaultDatabase::open(tmp.path());
        assert!(matches!(
            db.open_vault("plain", b"pw"),
            Err(VelumError::BadHeader(_))
        ));
    }

    #[test]
    fn test_bad_vault_names_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let db = VaultDatabase::open(tmp.path());
        for name in ["", ".", "..", "a/b"] {
            assert!(db.open_vault(name, b"pw").is_err());
            assert!(db.create_vault_with_params(name, b"pw", fast_params()).is_err());
        }
    }
}
