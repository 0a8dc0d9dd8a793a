//! AES-128-CBC segment decryption.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};

use crate::error::{Error, Result};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// The source service encrypts every segment from an all-zero IV, regardless
/// of media sequence numbers or any `IV=` attribute.
pub const ZERO_IV: [u8; 16] = [0u8; 16];

/// Decryptor bound to one key.
///
/// Every call starts a fresh CBC chain from [`ZERO_IV`]: segments are
/// independent units, never chained to each other.
#[derive(Clone)]
pub struct SegmentDecryptor {
    key: [u8; 16],
}

impl SegmentDecryptor {
    pub fn new(key: [u8; 16]) -> Self {
        Self { key }
    }

    /// Decrypt one segment and strip its PKCS#7 padding.
    pub fn decrypt(&self, index: usize, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() % 16 != 0 {
            return Err(Error::SegmentDecrypt {
                index,
                message: format!(
                    "ciphertext length {} is not a multiple of the block size",
                    ciphertext.len()
                ),
            });
        }

        Aes128CbcDec::new(&self.key.into(), &ZERO_IV.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| Error::SegmentDecrypt {
                index,
                message: e.to_string(),
            })
    }
}

impl std::fmt::Debug for SegmentDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentDecryptor").finish_non_exhaustive()
    }
}
