//! An in-memory vault backend.
//!
//! Entries live in a path-keyed map (`"a/b/c"`, root is the empty path).
//! This backend exists so the layers above can be exercised without
//! touching a filesystem; it honors the full contract, including the
//! structural failure kinds and recursive delete.

use std::collections::BTreeMap;
use std::io;

use crate::error::{VelumError, VelumResult};
use crate::vault::{ItemKind, ItemRef, Vault};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

impl Node {
    fn kind(&self) -> ItemKind {
        match self {
            Node::File(_) => ItemKind::File,
            Node::Dir => ItemKind::Dir,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryRef {
    path: String,
    kind: ItemKind,
}

impl ItemRef for MemoryRef {
    fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    fn kind(&self) -> ItemKind {
        self.kind
    }
}

#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: BTreeMap<String, Node>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn child_path(dir: &MemoryRef, name: &str) -> VelumResult<String> {
        if name.is_empty() || name.contains('/') {
            return Err(VelumError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid entry name: {name:?}"),
            )));
        }
        if dir.path.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{}/{name}", dir.path))
        }
    }

    fn require_dir(&self, dir: &MemoryRef) -> VelumResult<()> {
        if dir.kind != ItemKind::Dir {
            return Err(VelumError::NotDir(dir.path.clone()));
        }
        if dir.path.is_empty() {
            return Ok(());
        }
        match self.entries.get(&dir.path) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(VelumError::NotDir(dir.path.clone())),
            None => Err(VelumError::NotFound(dir.path.clone())),
        }
    }
}

impl Vault for MemoryVault {
    type Ref = MemoryRef;

    fn root(&self) -> MemoryRef {
        MemoryRef {
            path: String::new(),
            kind: ItemKind::Dir,
        }
    }

    fn list(&self, dir: &MemoryRef) -> VelumResult<Vec<MemoryRef>> {
        self.require_dir(dir)?;

        let prefix = if dir.path.is_empty() {
            String::new()
        } else {
            format!("{}/", dir.path)
        };

        let items = self
            .entries
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| !path[prefix.len()..].contains('/'))
            .map(|(path, node)| MemoryRef {
                path: path.clone(),
                kind: node.kind(),
            })
            .collect();

        Ok(items)
    }

    fn entry(&self, dir: &MemoryRef, name: &str) -> VelumResult<MemoryRef> {
        self.require_dir(dir)?;

        let path = Self::child_path(dir, name)?;
        match self.entries.get(&path) {
            Some(node) => Ok(MemoryRef {
                path,
                kind: node.kind(),
            }),
            None => Err(VelumError::NotFound(path)),
        }
    }

    fn create(&mut self, dir: &MemoryRef, name: &str, kind: ItemKind) -> VelumResult<MemoryRef> {
        self.require_dir(dir)?;

        let path = Self::child_path(dir, name)?;
        if self.entries.contains_key(&path) {
            return Err(VelumError::AlreadyExists(path));
        }

        let node = match kind {
            ItemKind::File => Node::File(Vec::new()),
            ItemKind::Dir => Node::Dir,
        };
        self.entries.insert(path.clone(), node);

        Ok(MemoryRef { path, kind })
    }

    fn read(&self, file: &MemoryRef) -> VelumResult<Vec<u8>> {
        match self.entries.get(&file.path) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Dir) => Err(VelumError::NotFile(file.path.clone())),
            None => Err(VelumError::NotFound(file.path.clone())),
        }
    }

    fn write(&mut self, file: &MemoryRef, data: &[u8]) -> VelumResult<()> {
        match self.entries.get_mut(&file.path) {
            Some(Node::File(contents)) => {
                *contents = data.to_vec();
                Ok(())
            }
            Some(Node::Dir) => Err(VelumError::NotFile(file.path.clone())),
            None => Err(VelumError::NotFound(file.path.clone())),
        }
    }

    fn delete(&mut self, item: &MemoryRef) -> VelumResult<()> {
        if item.path.is_empty() {
            self.entries.clear();
            return Ok(());
        }
        let prefix = format!("{}/", item.path);
        self.entries
            .retain(|path, _| path != &item.path && !path.starts_with(&prefix));
        Ok(())
    }
}
