//! The hierarchical store contract.

use crate::error::VelumResult;

/// What a directory entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Dir,
}

/// A handle to one entry in a vault.
///
/// Handles are opaque values paired with the backend that produced them;
/// a handle becomes stale if the underlying entry is deleted.
pub trait ItemRef: Clone {
    /// The raw name of the entry as stored by this backend. For an
    /// encrypting layer this is the decrypted, user-visible name; the root
    /// is the only entry whose name is empty.
    fn name(&self) -> &str;

    fn kind(&self) -> ItemKind;
}

/// A rooted, hierarchical store.
///
/// All operations are synchronous and blocking. `list` carries no ordering
/// guarantee, `delete` removes directories recursively, and `write`
/// replaces the full contents of a file (it need not be crash-atomic).
pub trait Vault {
    type Ref: ItemRef;

    /// The root directory. Always succeeds; the root always exists.
    fn root(&self) -> Self::Ref;

    fn list(&self, dir: &Self::Ref) -> VelumResult<Vec<Self::Ref>>;

    /// Resolve the child of `dir` named `name`.
    fn entry(&self, dir: &Self::Ref, name: &str) -> VelumResult<Self::Ref>;

    fn create(&mut self, dir: &Self::Ref, name: &str, kind: ItemKind) -> VelumResult<Self::Ref>;

    fn read(&self, file: &Self::Ref) -> VelumResult<Vec<u8>>;

    fn write(&mut self, file: &Self::Ref, data: &[u8]) -> VelumResult<()>;

    fn delete(&mut self, item: &Self::Ref) -> VelumResult<()>;
}
