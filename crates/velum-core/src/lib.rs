//! velum-core: the backend contract for velum vaults
//!
//! A vault is any hierarchical store that can list, resolve, create, read,
//! write, and delete named entries. Everything above this crate (the
//! encryption layer, the filesystem backend, git acquisition) either
//! implements or consumes the [`Vault`] trait.

pub mod error;
pub mod memory;
pub mod vault;

pub use error::{VelumError, VelumResult};
pub use memory::{MemoryRef, MemoryVault};
pub use vault::{ItemKind, ItemRef, Vault};
