// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Named privacy (encryption) algorithms (RFC 3414 §8, RFC 3826).

use aes::Aes128;
use cfb_mode::{Decryptor as CfbDecryptor, Encryptor as CfbEncryptor};
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher, block_padding::NoPadding};
use des::Des;

use crate::error::{SnmpClientError, UsmErrorKind};

/// 8-byte value embedded verbatim (DES) or partially (AES) into
/// `priv_params`.
pub type Salt = [u8; 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivProtocol {
    Des,
    Aes128,
}

impl PrivProtocol {
    /// Encrypts `plaintext` under `localized_key`. `salt` is random
    /// per-message entropy supplied by the caller (the LCD-held counter or
    /// an RNG); `engine_boots`/`engine_time` come from the LCD.
    pub fn encrypt(
        self,
        localized_key: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt: Salt,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Salt), SnmpClientError> {
        match self {
            PrivProtocol::Des => {
                let (key, pre_iv) = des_key_and_pre_iv(localized_key)?;
                let boots_salt = des_salt(engine_boots, salt);
                let iv = xor8(pre_iv, boots_salt);

                let mut buf = pad_to_block(plaintext, 8);
                let encryptor = cbc::Encryptor::<Des>::new(&key.into(), &iv.into());
                encryptor
                    .encrypt_padded_mut::<NoPadding>(&mut buf, plaintext.len())
                    .map_err(|_| SnmpClientError::encoding("DES-CBC encrypt failed"))?;
                Ok((buf, boots_salt))
            },
            PrivProtocol::Aes128 => {
                let key = aes_key(localized_key)?;
                let iv = aes_iv(engine_boots, engine_time, salt);
                let mut buf = plaintext.to_vec();
                let mut encryptor = CfbEncryptor::<Aes128>::new(&key.into(), &iv.into());
                encryptor.apply_keystream(&mut buf);
                Ok((buf, salt))
            },
        }
    }

    /// Decrypts `ciphertext` using `localized_key` and the `salt` carried
    /// in the received `priv_params`.
    pub fn decrypt(
        self,
        localized_key: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt: Salt,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, SnmpClientError> {
        match self {
            PrivProtocol::Des => {
                if ciphertext.len() % 8 != 0 {
                    return Err(UsmErrorKind::DecryptionError.into());
                }
                let (key, pre_iv) = des_key_and_pre_iv(localized_key)?;
                let iv = xor8(pre_iv, salt);
                let mut buf = ciphertext.to_vec();
                let decryptor = cbc::Decryptor::<Des>::new(&key.into(), &iv.into());
                let len = decryptor
                    .decrypt_padded_mut::<NoPadding>(&mut buf)
                    .map_err(|_| UsmErrorKind::DecryptionError)?
                    .len();
                buf.truncate(len);
                Ok(buf)
            },
            PrivProtocol::Aes128 => {
                let key = aes_key(localized_key)?;
                let iv = aes_iv(engine_boots, engine_time, salt);
                let mut buf = ciphertext.to_vec();
                let mut decryptor = CfbDecryptor::<Aes128>::new(&key.into(), &iv.into());
                decryptor.apply_keystream(&mut buf);
                Ok(buf)
            },
        }
    }
}

fn des_key_and_pre_iv(localized_key: &[u8]) -> Result<([u8; 8], [u8; 8]), SnmpClientError> {
    if localized_key.len() < 16 {
        return Err(SnmpClientError::encoding("DES privacy key shorter than 16 bytes"));
    }
    let mut key = [0u8; 8];
    key.copy_from_slice(&localized_key[..8]);
    let mut pre_iv = [0u8; 8];
    pre_iv.copy_from_slice(&localized_key[8..16]);
    Ok((key, pre_iv))
}

fn des_salt(engine_boots: u32, random: Salt) -> Salt {
    let mut salt = [0u8; 8];
    salt[..4].copy_from_slice(&engine_boots.to_be_bytes());
    salt[4..].copy_from_slice(&random[4..]);
    salt
}

fn xor8(a: [u8; 8], b: [u8; 8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = a[i] ^ b[i];
    }
    out
}

fn aes_key(localized_key: &[u8]) -> Result<[u8; 16], SnmpClientError> {
    if localized_key.len() < 16 {
        return Err(SnmpClientError::encoding("AES privacy key shorter than 16 bytes"));
    }
    let mut key = [0u8; 16];
    key.copy_from_slice(&localized_key[..16]);
    Ok(key)
}

fn aes_iv(engine_boots: u32, engine_time: u32, salt: Salt) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..4].copy_from_slice(&engine_boots.to_be_bytes());
    iv[4..8].copy_from_slice(&engine_time.to_be_bytes());
    iv[8..].copy_from_slice(&salt);
    iv
}

fn pad_to_block(data: &[u8], block: usize) -> Vec<u8> {
    let pad = (block - data.len() % block) % block;
    let mut out = data.to_vec();
    out.resize(data.len() + pad, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn des_round_trips() {
        let key = [0x11u8; 16];
        let salt = [0u8, 0, 0, 1, 0xAA, 0xBB, 0xCC, 0xDD];
        let plaintext = b"0123456789ABCDEF";
        let (ct, used_salt) = PrivProtocol::Des.encrypt(&key, 1, 0, salt, plaintext).unwrap();
        let pt = PrivProtocol::Des.decrypt(&key, 1, 0, used_salt, &ct).unwrap();
        assert_eq!(&pt[..plaintext.len()], plaintext);
    }

    #[test]
    fn aes_round_trips() {
        let key = [0x22u8; 16];
        let salt = [1, 2, 3, 4, 5, 6, 7, 8];
        let plaintext = b"some scoped pdu bytes of arbitrary length";
        let (ct, used_salt) = PrivProtocol::Aes128
            .encrypt(&key, 7, 3600, salt, plaintext)
            .unwrap();
        let pt = PrivProtocol::Aes128
            .decrypt(&key, 7, 3600, used_salt, &ct)
            .unwrap();
        assert_eq!(pt, plaintext);
    }

    #[test]
    fn tampered_ciphertext_yields_different_plaintext() {
        let key = [0x33u8; 16];
        let salt = [9, 9, 9, 9, 9, 9, 9, 9];
        let plaintext = b"authenticated-and-encrypted-body";
        let (mut ct, used_salt) = PrivProtocol::Aes128
            .encrypt(&key, 1, 1, salt, plaintext)
            .unwrap();
        ct[0] ^= 0xFF;
        let pt = PrivProtocol::Aes128
            .decrypt(&key, 1, 1, used_salt, &ct)
            .unwrap();
        assert_ne!(pt, plaintext);
    }
}
