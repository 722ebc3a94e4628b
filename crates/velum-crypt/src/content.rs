//! File content codec: superblock framing.
//!
//! Encrypted file layout (repeated per superblock):
//! ```text
//! [16 bytes: random IV][240 bytes: CBC ciphertext]
//! ciphertext decrypts to [239 bytes: payload][1 byte: payload length]
//! ```
//!
//! Superblocks are independent: per-superblock IVs, no chaining across
//! them. The encrypted size is `256 * ceil(n / 239)`; an empty file is
//! zero bytes on disk.

use velum_core::{VelumError, VelumResult};

use crate::cipher::{random_iv, CbcCipher};
use crate::{BLOCK_LEN, SUPERBLOCK_BODY_LEN, SUPERBLOCK_LEN, SUPERBLOCK_PAYLOAD_LEN};

/// Encrypt full file contents into a sequence of superblocks.
pub fn encrypt_file(cipher: &CbcCipher, plaintext: &[u8]) -> VelumResult<Vec<u8>> {
    let superblocks = plaintext.len().div_ceil(SUPERBLOCK_PAYLOAD_LEN);
    let mut ciphertext = vec![0u8; superblocks * SUPERBLOCK_LEN];

    for (index, out) in ciphertext.chunks_exact_mut(SUPERBLOCK_LEN).enumerate() {
        let start = index * SUPERBLOCK_PAYLOAD_LEN;
        let end = usize::min(start + SUPERBLOCK_PAYLOAD_LEN, plaintext.len());
        encrypt_superblock(cipher, out, &plaintext[start..end])?;
    }

    Ok(ciphertext)
}

/// Encrypt one superblock. `payload` holds at most 239 bytes; the rest of
/// the body is zero-filled and the last byte records the payload length.
fn encrypt_superblock(cipher: &CbcCipher, out: &mut [u8], payload: &[u8]) -> VelumResult<()> {
    debug_assert_eq!(out.len(), SUPERBLOCK_LEN);
    debug_assert!(payload.len() <= SUPERBLOCK_PAYLOAD_LEN);

    let iv = random_iv()?;
    let (iv_out, body) = out.split_at_mut(BLOCK_LEN);
    iv_out.copy_from_slice(&iv);

    body[..payload.len()].copy_from_slice(payload);
    body[payload.len()..SUPERBLOCK_PAYLOAD_LEN].fill(0);
    body[SUPERBLOCK_PAYLOAD_LEN] = payload.len() as u8;

    cipher.encrypt(&iv, body);
    Ok(())
}

/// Decrypt a sequence of superblocks back into file contents.
///
/// Fails `BadCiphertextLength` unless the input is a whole number of
/// superblocks. A decrypted length byte above 239 is clamped; decoding
/// never reads past the payload area.
pub fn decrypt_file(cipher: &CbcCipher, ciphertext: &[u8]) -> VelumResult<Vec<u8>> {
    if ciphertext.len() % SUPERBLOCK_LEN != 0 {
        return Err(VelumError::BadCiphertextLength(ciphertext.len()));
    }

    let superblocks = ciphertext.len() / SUPERBLOCK_LEN;
    let mut plaintext = Vec::with_capacity(superblocks * SUPERBLOCK_PAYLOAD_LEN);
    let mut body = [0u8; SUPERBLOCK_BODY_LEN];

    for superblock in ciphertext.chunks_exact(SUPERBLOCK_LEN) {
        let (iv, encrypted) = superblock.split_at(BLOCK_LEN);
        body.copy_from_slice(encrypted);
        cipher.decrypt(iv, &mut body);

        let length = usize::min(body[SUPERBLOCK_PAYLOAD_LEN] as usize, SUPERBLOCK_PAYLOAD_LEN);
        plaintext.extend_from_slice(&body[..length]);
    }

    Ok(plaintext)
}
