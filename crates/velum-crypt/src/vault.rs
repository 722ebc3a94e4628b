//! The encrypted vault adapter: a [`Vault`] layered over any other vault.
//!
//! `CryptVault` rewrites names and contents on the way through and leaves
//! the tree shape to the inner backend. The header entry `crypt.json` at
//! the inner root holds the salt and KDF parameters; it is invisible to
//! callers.
//!
//! A wrong password is not detected here: the derived key decrypts
//! listings and contents to garbage (or fails name decoding), and it is a
//! higher layer's job to probe for validity if it wants to.

use velum_core::{ItemKind, ItemRef, Vault, VelumError, VelumResult};

use crate::cipher::CbcCipher;
use crate::content::{decrypt_file, encrypt_file};
use crate::header::{VaultHeader, HEADER_NAME};
use crate::kdf::{derive_key, KdfParams};
use crate::name::{decrypt_name, encrypt_name};

/// A handle into an encrypted vault: the inner backend's handle plus the
/// decrypted, user-visible name.
#[derive(Debug, Clone)]
pub struct CryptRef<R> {
    inner: R,
    name: String,
    is_root: bool,
}

impl<R: ItemRef> ItemRef for CryptRef<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ItemKind {
        self.inner.kind()
    }
}

/// An open encrypted vault over an inner backend.
pub struct CryptVault<B: Vault> {
    inner: B,
    cipher: CbcCipher,
}

impl<B: Vault> CryptVault<B> {
    /// Initialize a new vault inside `inner` and open it.
    ///
    /// Writes the header entry at the inner root, then derives the key.
    /// Fails `AlreadyExists` if the inner root already carries a header.
    pub fn create(inner: B, password: &[u8]) -> VelumResult<Self> {
        Self::create_with_params(inner, password, KdfParams::default())
    }

    /// Like [`CryptVault::create`] with explicit KDF parameters. The
    /// parameters are fixed for the vault's lifetime once written.
    pub fn create_with_params(
        mut inner: B,
        password: &[u8],
        params: KdfParams,
    ) -> VelumResult<Self> {
        let header = VaultHeader {
            salt: crate::kdf::Salt::generate()?,
            kdf_parameters: params,
        };

        let root = inner.root();
        let header_ref = inner.create(&root, HEADER_NAME, ItemKind::File)?;
        inner.write(&header_ref, &header.to_bytes()?)?;

        Self::unlock(inner, password, &header)
    }

    /// Open an existing vault inside `inner`.
    ///
    /// A missing or unparseable header fails `BadHeader`. A wrong
    /// password succeeds; see the module docs.
    pub fn open(inner: B, password: &[u8]) -> VelumResult<Self> {
        let root = inner.root();
        let header_ref = inner.entry(&root, HEADER_NAME).map_err(|e| match e {
            VelumError::NotFound(_) => {
                VelumError::BadHeader(format!("{HEADER_NAME} not found at the vault root"))
            }
            other => other,
        })?;

        let bytes = inner.read(&header_ref)?;
        let header = VaultHeader::from_bytes(&bytes)?;

        Self::unlock(inner, password, &header)
    }

    fn unlock(inner: B, password: &[u8], header: &VaultHeader) -> VelumResult<Self> {
        let key = derive_key(password, &header.salt, &header.kdf_parameters)?;
        let cipher = CbcCipher::new(key.as_bytes())?;
        Ok(Self { inner, cipher })
    }

    /// Hand back the inner backend, consuming the open vault.
    pub fn into_inner(self) -> B {
        self.inner
    }

    fn wrap(&self, inner: B::Ref) -> VelumResult<CryptRef<B::Ref>> {
        let name = decrypt_name(&self.cipher, inner.name())?;
        Ok(CryptRef {
            inner,
            name,
            is_root: false,
        })
    }
}

impl<B: Vault> Vault for CryptVault<B> {
    type Ref = CryptRef<B::Ref>;

    fn root(&self) -> Self::Ref {
        CryptRef {
            inner: self.inner.root(),
            name: String::new(),
            is_root: true,
        }
    }

    /// List a directory, decrypting every entry name. One undecryptable
    /// name fails the whole listing. The header entry is skipped at the
    /// root.
    fn list(&self, dir: &Self::Ref) -> VelumResult<Vec<Self::Ref>> {
        let entries = self.inner.list(&dir.inner)?;

        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            if dir.is_root && entry.name() == HEADER_NAME {
                continue;
            }
            items.push(self.wrap(entry)?);
        }

        Ok(items)
    }

    /// Resolve a child by plaintext name.
    ///
    /// Fresh IVs make name encryption non-deterministic, so there is no
    /// raw name to hand to the inner backend; the directory is enumerated
    /// and matched on decrypted names instead.
    fn entry(&self, dir: &Self::Ref, name: &str) -> VelumResult<Self::Ref> {
        self.list(dir)?
            .into_iter()
            .find(|item| item.name == name)
            .ok_or_else(|| VelumError::NotFound(name.to_string()))
    }

    fn create(&mut self, dir: &Self::Ref, name: &str, kind: ItemKind) -> VelumResult<Self::Ref> {
        // Raw names are never equal across encryptions, so the inner
        // backend cannot catch a duplicate plaintext name itself.
        if self.list(dir)?.iter().any(|item| item.name == name) {
            return Err(VelumError::AlreadyExists(name.to_string()));
        }

        let raw = encrypt_name(&self.cipher, name)?;
        let inner = self.inner.create(&dir.inner, &raw, kind)?;

        Ok(CryptRef {
            inner,
            name: name.to_string(),
            is_root: false,
        })
    }

    fn read(&self, file: &Self::Ref) -> VelumResult<Vec<u8>> {
        let ciphertext = self.inner.read(&file.inner)?;
        decrypt_file(&self.cipher, &ciphertext)
    }

    fn write(&mut self, file: &Self::Ref, data: &[u8]) -> VelumResult<()> {
        let ciphertext = encrypt_file(&self.cipher, data)?;
        self.inner.write(&file.inner, &ciphertext)
    }

    fn delete(&mut self, item: &Self::Ref) -> VelumResult<()> {
        self.inner.delete(&item.inner)
    }
}
