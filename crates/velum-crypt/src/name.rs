//! Filename codec.
//!
//! A directory entry name is stored as `base64url(IV || CBC(padded name))`:
//! the name's bytes zero-padded up to the next multiple of 16 (no extra
//! block when already aligned, nothing at all for the empty name), a fresh
//! 16-byte IV per encryption. Decoding truncates at the first zero byte,
//! so names containing NUL do not round-trip; callers must not supply
//! them.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

use velum_core::{VelumError, VelumResult};

use crate::cipher::{random_iv, CbcCipher};
use crate::BLOCK_LEN;

/// Encrypt a single filename.
///
/// Fresh IVs make this non-deterministic: encrypting the same name twice
/// yields two different ciphertexts.
pub fn encrypt_name(cipher: &CbcCipher, name: &str) -> VelumResult<String> {
    let raw = name.as_bytes();
    let padded_len = raw.len().div_ceil(BLOCK_LEN) * BLOCK_LEN;

    let mut buf = vec![0u8; BLOCK_LEN + padded_len];
    let iv = random_iv()?;
    buf[..BLOCK_LEN].copy_from_slice(&iv);
    buf[BLOCK_LEN..BLOCK_LEN + raw.len()].copy_from_slice(raw);

    cipher.encrypt(&iv, &mut buf[BLOCK_LEN..]);

    Ok(URL_SAFE.encode(&buf))
}

/// Decrypt a single filename ciphertext.
///
/// The decoded envelope must be at least one block (the IV) and a whole
/// number of blocks; a bare IV decodes to the empty name.
pub fn decrypt_name(cipher: &CbcCipher, encrypted: &str) -> VelumResult<String> {
    let envelope = URL_SAFE
        .decode(encrypted)
        .map_err(|e| VelumError::BadNameCiphertext(e.to_string()))?;

    if envelope.len() < BLOCK_LEN || envelope.len() % BLOCK_LEN != 0 {
        return Err(VelumError::BadNameCiphertext(format!(
            "envelope is {} bytes, want a positive multiple of {BLOCK_LEN}",
            envelope.len()
        )));
    }

    let (iv, ciphertext) = envelope.split_at(BLOCK_LEN);
    let mut name = ciphertext.to_vec();
    cipher.decrypt(iv, &mut name);

    if let Some(nul) = name.iter().position(|&b| b == 0) {
        name.truncate(nul);
    }

    String::from_utf8(name).map_err(|e| VelumError::BadNameCiphertext(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> CbcCipher {
        CbcCipher::new(&[0x24u8; 32]).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let cipher = test_cipher();
        for name in ["greet.txt", "d", "a name with spaces", "säkerhet.md"] {
            let encrypted = encrypt_name(&cipher, name).unwrap();
            assert_ne!(encrypted, name);
            assert_eq!(decrypt_name(&cipher, &encrypted).unwrap(), name);
        }
    }

    #[test]
    fn test_roundtrip_boundary_lengths() {
        let cipher = test_cipher();
        for len in [0usize, 1, 15, 16, 17, 255] {
            let name: String = "x".repeat(len);
            let encrypted = encrypt_name(&cipher, &name).unwrap();
            assert_eq!(
                decrypt_name(&cipher, &encrypted).unwrap(),
                name,
                "roundtrip failed at name length {len}"
            );
        }
    }

    #[test]
    fn test_envelope_geometry() {
        let cipher = test_cipher();
        for (len, padded) in [(0usize, 0usize), (1, 16), (15, 16), (16, 16), (17, 32)] {
            let name = "y".repeat(len);
            let encrypted = encrypt_name(&cipher, &name).unwrap();
            let envelope = URL_SAFE.decode(&encrypted).unwrap();
            assert_eq!(
                envelope.len(),
                BLOCK_LEN + padded,
                "wrong envelope size for a {len}-byte name"
            );
        }
    }

    #[test]
    fn test_fresh_ivs_give_fresh_ciphertexts() {
        let cipher = test_cipher();
        let a = encrypt_name(&cipher, "same.txt").unwrap();
        let b = encrypt_name(&cipher, "same.txt").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_name_is_bare_iv() {
        let cipher = test_cipher();
        let encrypted = encrypt_name(&cipher, "").unwrap();
        assert_eq!(URL_SAFE.decode(&encrypted).unwrap().len(), BLOCK_LEN);
        assert_eq!(decrypt_name(&cipher, &encrypted).unwrap(), "");
    }

    #[test]
    fn test_bad_base64_rejected() {
        let cipher = test_cipher();
        assert!(matches!(
            decrypt_name(&cipher, "not base64!!"),
            Err(VelumError::BadNameCiphertext(_))
        ));
    }

    #[test]
    fn test_bad_envelope_lengths_rejected() {
        let cipher = test_cipher();
        // 8 bytes: shorter than one block. 17 bytes: not block-aligned.
        for len in [8usize, 17] {
            let encoded = URL_SAFE.encode(vec![0u8; len]);
            assert!(
                matches!(
                    decrypt_name(&cipher, &encoded),
                    Err(VelumError::BadNameCiphertext(_))
                ),
                "envelope of {len} bytes must be rejected"
            );
        }
    }

    #[test]
    fn test_interior_nul_truncates() {
        // Accepted limitation: a NUL in the name cuts it short on decode.
        let cipher = test_cipher();
        let encrypted = encrypt_name(&cipher, "ab\0cd").unwrap();
        assert_eq!(decrypt_name(&cipher, &encrypted).unwrap(), "ab");
    }
}
