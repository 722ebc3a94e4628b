//! velum-crypt: the encryption layer for velum vaults
//!
//! Composes over any [`velum_core::Vault`] to produce an encrypted vault
//! exposing the same contract. On disk:
//!
//! ```text
//! <root>/crypt.json          plaintext header: {salt, kdf_parameters}
//! <root>/<name ciphertext>   url-safe base64 of IV || CBC(padded name)
//!     file contents          sequence of 256-byte superblocks:
//!                            [IV: 16][CBC([payload: 239][length: 1]): 240]
//! ```
//!
//! Key hierarchy is flat: one 256-bit key, Argon2id-derived from the
//! password and the header's salt, encrypts both names and contents.
//! The scheme is confidentiality-only CBC; nothing authenticates the
//! ciphertext, and a wrong password decrypts to garbage rather than
//! failing.

pub mod cipher;
pub mod content;
pub mod header;
pub mod kdf;
pub mod name;
pub mod vault;

pub use cipher::CbcCipher;
pub use content::{decrypt_file, encrypt_file};
pub use header::{VaultHeader, HEADER_NAME};
pub use kdf::{derive_key, KdfParams, Key, Salt};
pub use name::{decrypt_name, encrypt_name};
pub use vault::{CryptRef, CryptVault};

/// Size of the derived encryption key in bytes (256-bit).
pub const KEY_LEN: usize = 32;

/// Size of the per-vault salt in bytes.
pub const SALT_LEN: usize = 32;

/// AES block size; also the IV size for every ciphertext envelope.
pub const BLOCK_LEN: usize = 16;

/// On-disk size of one content superblock.
pub const SUPERBLOCK_LEN: usize = 256;

/// Ciphertext body of a superblock (everything after the IV).
pub const SUPERBLOCK_BODY_LEN: usize = SUPERBLOCK_LEN - BLOCK_LEN;

/// Plaintext payload capacity of one superblock; the body's last byte
/// holds the payload length.
pub const SUPERBLOCK_PAYLOAD_LEN: usize = SUPERBLOCK_BODY_LEN - 1;
