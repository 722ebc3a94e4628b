//! The local-directory backend.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use velum_core::{ItemKind, ItemRef, Vault, VelumError, VelumResult};

use crate::atomic::write_atomic;

/// A handle to an entry under a [`DirVault`]'s base directory, as a
/// relative path. The root is the empty path.
#[derive(Debug, Clone)]
pub struct DirRef {
    path: PathBuf,
    kind: ItemKind,
}

impl ItemRef for DirRef {
    fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    fn kind(&self) -> ItemKind {
        self.kind
    }
}

/// A vault backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirVault {
    base: PathBuf,
}

impl DirVault {
    /// Open an existing base directory. No I/O happens until the first
    /// operation.
    pub fn open(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Create the base directory (and its parents) if needed, then open.
    pub fn create(base: impl Into<PathBuf>) -> VelumResult<Self> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    fn full_path(&self, item: &DirRef) -> PathBuf {
        self.base.join(&item.path)
    }

    fn require_dir(dir: &DirRef) -> VelumResult<()> {
        if dir.kind != ItemKind::Dir {
            return Err(VelumError::NotDir(dir.path.display().to_string()));
        }
        Ok(())
    }

    fn require_file(file: &DirRef) -> VelumResult<()> {
        if file.kind != ItemKind::File {
            return Err(VelumError::NotFile(file.path.display().to_string()));
        }
        Ok(())
    }

    /// A child name must be a single, normal path component; anything
    /// that could escape the directory is rejected.
    fn check_name(name: &str) -> VelumResult<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(VelumError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid entry name: {name:?}"),
            )));
        }
        Ok(())
    }
}

fn map_io(path: &Path, err: io::Error) -> VelumError {
    match err.kind() {
        io::ErrorKind::NotFound => VelumError::NotFound(path.display().to_string()),
        io::ErrorKind::AlreadyExists => VelumError::AlreadyExists(path.display().to_string()),
        _ => VelumError::Io(err),
    }
}

impl Vault for DirVault {
    type Ref = DirRef;

    fn root(&self) -> DirRef {
        DirRef {
            path: PathBuf::new(),
            kind: ItemKind::Dir,
        }
    }

    fn list(&self, dir: &DirRef) -> VelumResult<Vec<DirRef>> {
        Self::require_dir(dir)?;

        let search = self.full_path(dir);
        let entries = fs::read_dir(&search).map_err(|e| map_io(&search, e))?;

        let mut items = Vec::new();
        for entry in entries {
            let entry = entry.map_err(VelumError::Io)?;
            let file_type = entry.file_type().map_err(VelumError::Io)?;
            let kind = if file_type.is_file() {
                ItemKind::File
            } else if file_type.is_dir() {
                ItemKind::Dir
            } else {
                // Symlinks and specials are not part of the contract.
                continue;
            };
            items.push(DirRef {
                path: dir.path.join(entry.file_name()),
                kind,
            });
        }

        Ok(items)
    }

    fn entry(&self, dir: &DirRef, name: &str) -> VelumResult<DirRef> {
        Self::require_dir(dir)?;
        Self::check_name(name)?;

        let path = dir.path.join(name);
        let full = self.base.join(&path);
        let metadata = fs::metadata(&full).map_err(|e| map_io(&full, e))?;

        let kind = if metadata.is_dir() {
            ItemKind::Dir
        } else {
            ItemKind::File
        };

        Ok(DirRef { path, kind })
    }

    fn create(&mut self, dir: &DirRef, name: &str, kind: ItemKind) -> VelumResult<DirRef> {
        Self::require_dir(dir)?;
        Self::check_name(name)?;

        let path = dir.path.join(name);
        let full = self.base.join(&path);

        match kind {
            ItemKind::Dir => {
                fs::create_dir(&full).map_err(|e| map_io(&full, e))?;
            }
            ItemKind::File => {
                fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&full)
                    .map_err(|e| map_io(&full, e))?;
            }
        }

        Ok(DirRef { path, kind })
    }

    fn read(&self, file: &DirRef) -> VelumResult<Vec<u8>> {
        Self::require_file(file)?;

        let full = self.full_path(file);
        fs::read(&full).map_err(|e| map_io(&full, e))
    }

    fn write(&mut self, file: &DirRef, data: &[u8]) -> VelumResult<()> {
        Self::require_file(file)?;

        let full = self.full_path(file);
        write_atomic(&full, data).map_err(|e| map_io(&full, e))
    }

    fn delete(&mut self, item: &DirRef) -> VelumResult<()> {
        let full = self.full_path(item);
        let result = match item.kind {
            ItemKind::File => fs::remove_file(&full),
            ItemKind::Dir => fs::remove_dir_all(&full),
        };

        match result {
            Ok(()) => Ok(()),
            // Deleting a stale handle is a no-op.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VelumError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_vault() -> (tempfile::TempDir, DirVault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = DirVault::create(dir.path().join("store")).unwrap();
        (dir, vault)
    }

    #[test]
    fn test_root_lists_empty() {
        let (_tmp, vault) = new_vault();
        let root = vault.root();
        assert_eq!(root.name(), "");
        assert!(vault.list(&root).unwrap().is_empty());
    }

    #[test]
    fn test_create_write_read() {
        let (_tmp, mut vault) = new_vault();
        let root = vault.root();

        let file = vault.create(&root, "notes.txt", ItemKind::File).unwrap();
        assert_eq!(vault.read(&file).unwrap(), b"");

        vault.write(&file, b"hello disk").unwrap();
        assert_eq!(vault.read(&file).unwrap(), b"hello disk");
    }

    #[test]
    fn test_nested_dirs() {
        let (_tmp, mut vault) = new_vault();
        let root = vault.root();

        let dir = vault.create(&root, "d", ItemKind::Dir).unwrap();
        let file = vault.create(&dir, "inner", ItemKind::File).unwrap();
        vault.write(&file, b"deep").unwrap();

        let resolved = vault.entry(&dir, "inner").unwrap();
        assert_eq!(resolved.kind(), ItemKind::File);
        assert_eq!(vault.read(&resolved).unwrap(), b"deep");
    }

    #[test]
    fn test_entry_not_found() {
        let (_tmp, vault) = new_vault();
        assert!(matches!(
            vault.entry(&vault.root(), "absent"),
            Err(VelumError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_duplicate_fails() {
        let (_tmp, mut vault) = new_vault();
        let root = vault.root();
        vault.create(&root, "f", ItemKind::File).unwrap();

        assert!(matches!(
            vault.create(&root, "f", ItemKind::File),
            Err(VelumError::AlreadyExists(_))
        ));
        assert!(matches!(
            vault.create(&root, "f", ItemKind::Dir),
            Err(VelumError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_kind_mismatches() {
        let (_tmp, mut vault) = new_vault();
        let root = vault.root();
        let file = vault.create(&root, "f", ItemKind::File).unwrap();
        let dir = vault.create(&root, "d", ItemKind::Dir).unwrap();

        assert!(matches!(vault.list(&file), Err(VelumError::NotDir(_))));
        assert!(matches!(vault.read(&dir), Err(VelumError::NotFile(_))));
        assert!(matches!(
            vault.write(&dir, b"x"),
            Err(VelumError::NotFile(_))
        ));
    }

    #[test]
    fn test_path_escape_rejected() {
        let (_tmp, mut vault) = new_vault();
        let root = vault.root();

        for name in ["..", ".", "a/b", "a\\b", ""] {
            assert!(
                vault.entry(&root, name).is_err(),
                "entry must reject {name:?}"
            );
            assert!(
                vault.create(&root, name, ItemKind::File).is_err(),
                "create must reject {name:?}"
            );
        }
    }

    #[test]
    fn test_delete_recursive_and_idempotent() {
        let (_tmp, mut vault) = new_vault();
        let root = vault.root();

        let dir = vault.create(&root, "d", ItemKind::Dir).unwrap();
        let sub = vault.create(&dir, "sub", ItemKind::Dir).unwrap();
        vault.create(&sub, "deep", ItemKind::File).unwrap();

        vault.delete(&dir).unwrap();
        assert!(vault.list(&root).unwrap().is_empty());

        // Stale handle: deleting again is a no-op.
        vault.delete(&dir).unwrap();
    }

    #[test]
    fn test_list_skips_symlinks() {
        #[cfg(unix)]
        {
            let (_tmp, mut vault) = new_vault();
            let root = vault.root();
            vault.create(&root, "real", ItemKind::File).unwrap();

            std::os::unix::fs::symlink(
                vault.base_path().join("real"),
                vault.base_path().join("link"),
            )
            .unwrap();

            let names: Vec<_> = vault
                .list(&root)
                .unwrap()
                .iter()
                .map(|r| r.name().to_string())
                .collect();
            assert_eq!(names, ["real"]);
        }
    }
}
