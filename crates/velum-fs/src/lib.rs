//! velum-fs: the local-directory backend.
//!
//! [`DirVault`] maps the vault contract onto a directory tree with
//! `std::fs`; [`VaultDatabase`] enumerates and opens encrypted vaults
//! under a base directory.

pub mod atomic;
pub mod database;
pub mod vault;

pub use database::VaultDatabase;
pub use vault::{DirRef, DirVault};
