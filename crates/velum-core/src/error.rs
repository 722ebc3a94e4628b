use thiserror::Error;

pub type VelumResult<T> = Result<T, VelumError>;

#[derive(Debug, Error)]
pub enum VelumError {
    #[error("file ciphertext is {0} bytes, not a multiple of the superblock size")]
    BadCiphertextLength(usize),

    #[error("malformed name ciphertext: {0}")]
    BadNameCiphertext(String),

    #[error("bad vault header: {0}")]
    BadHeader(String),

    #[error("cipher init: {0}")]
    CipherInit(String),

    #[error("key derivation: {0}")]
    Kdf(String),

    #[error("random source: {0}")]
    Rng(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotDir(String),

    #[error("not a file: {0}")]
    NotFile(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("sync error: {0}")]
    Sync(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
