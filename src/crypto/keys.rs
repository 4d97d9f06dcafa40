//! X25519 identities, recipients and data key wrapping
//!
//! A recipient is a base64 X25519 public key, an identity the matching secret key. The
//! per-document data key is wrapped for every recipient: an ephemeral key agreement feeds
//! HKDF-SHA256, and the derived key seals the data key with XChaCha20-Poly1305.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::error::{BananaError, Result};

const WRAP_INFO: &[u8] = b"banana-envelope-v1";
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

/// A public key documents are encrypted to
#[derive(Clone, PartialEq, Eq)]
pub struct Recipient {
    public: PublicKey,
}

/// A secret key able to unwrap data keys sealed for its recipient
pub struct Identity {
    secret: StaticSecret,
}

/// A data key sealed for one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    pub recipient: String,
    pub ephemeral: String,
    pub nonce: String,
    pub key: String,
}

impl Recipient {
    pub fn parse(encoded: &str) -> Result<Self> {
        let bytes = decode_key(encoded.trim()).map_err(|reason| BananaError::EncryptionFailed {
            reason: format!("malformed recipient '{}': {reason}", encoded.trim()),
        })?;
        Ok(Self {
            public: PublicKey::from(bytes),
        })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.public.as_bytes())
    }

    /// Seal a data key so only this recipient's identity can open it
    pub(crate) fn wrap(&self, data_key: &[u8]) -> Result<WrappedKey> {
        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&self.public);

        let kek = derive_kek(shared.as_bytes(), ephemeral_public.as_bytes(), self.public.as_bytes())
            .map_err(|reason| BananaError::EncryptionFailed { reason })?;
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&kek));
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: data_key,
                    aad: self.public.as_bytes(),
                },
            )
            .map_err(|_| BananaError::EncryptionFailed {
                reason: "failed to wrap data key".to_string(),
            })?;

        Ok(WrappedKey {
            recipient: self.to_base64(),
            ephemeral: STANDARD.encode(ephemeral_public.as_bytes()),
            nonce: STANDARD.encode(nonce),
            key: STANDARD.encode(sealed),
        })
    }
}

impl std::fmt::Debug for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Recipient").field(&self.to_base64()).finish()
    }
}

impl Identity {
    pub fn generate() -> Self {
        Self {
            secret: StaticSecret::random_from_rng(OsRng),
        }
    }

    pub fn parse(encoded: &str) -> Result<Self> {
        let bytes = decode_key(encoded.trim()).map_err(|reason| BananaError::DecryptionFailed {
            reason: format!("malformed identity: {reason}"),
        })?;
        Ok(Self {
            secret: StaticSecret::from(bytes),
        })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.secret.to_bytes())
    }

    pub fn recipient(&self) -> Recipient {
        Recipient {
            public: PublicKey::from(&self.secret),
        }
    }

    /// Open the first wrapped key addressed to this identity
    pub(crate) fn unwrap(&self, wrapped: &[WrappedKey]) -> Result<Vec<u8>> {
        let own = self.recipient();
        let own_encoded = own.to_base64();
        let entry = wrapped
            .iter()
            .find(|w| w.recipient == own_encoded)
            .ok_or_else(|| BananaError::DecryptionFailed {
                reason: "no data key is wrapped for this identity".to_string(),
            })?;

        let failed = |reason: String| BananaError::DecryptionFailed { reason };
        let ephemeral = PublicKey::from(decode_key(&entry.ephemeral).map_err(failed)?);
        let nonce = decode_fixed::<NONCE_LEN>(&entry.nonce).map_err(failed)?;
        let sealed = STANDARD
            .decode(&entry.key)
            .map_err(|e| failed(format!("wrapped key is not base64: {e}")))?;

        let shared = self.secret.diffie_hellman(&ephemeral);
        let kek = derive_kek(shared.as_bytes(), ephemeral.as_bytes(), own.public.as_bytes())
            .map_err(failed)?;
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&kek));
        cipher
            .decrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: &sealed,
                    aad: own.public.as_bytes(),
                },
            )
            .map_err(|_| failed("failed to unwrap data key".to_string()))
    }
}

fn derive_kek(shared: &[u8], ephemeral: &[u8], recipient: &[u8]) -> std::result::Result<[u8; KEY_LEN], String> {
    let mut salt = Vec::with_capacity(ephemeral.len() + recipient.len());
    salt.extend_from_slice(ephemeral);
    salt.extend_from_slice(recipient);

    let hk = Hkdf::<Sha256>::new(Some(&salt), shared);
    let mut kek = [0u8; KEY_LEN];
    hk.expand(WRAP_INFO, &mut kek)
        .map_err(|e| format!("hkdf expand: {e}"))?;
    Ok(kek)
}

fn decode_key(encoded: &str) -> std::result::Result<[u8; KEY_LEN], String> {
    decode_fixed::<KEY_LEN>(encoded)
}

fn decode_fixed<const N: usize>(encoded: &str) -> std::result::Result<[u8; N], String> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| format!("not valid base64: {e}"))?;
    <[u8; N]>::try_from(bytes.as_slice())
        .map_err(|_| format!("expected {N} bytes, found {}", bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_round_trips_through_base64() {
        let identity = Identity::generate();
        let parsed = Identity::parse(&identity.to_base64()).unwrap();
        assert_eq!(parsed.recipient(), identity.recipient());
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let identity = Identity::generate();
        let data_key = [7u8; KEY_LEN];

        let wrapped = identity.recipient().wrap(&data_key).unwrap();
        assert_eq!(wrapped.recipient, identity.recipient().to_base64());

        let opened = identity.unwrap(&[wrapped]).unwrap();
        assert_eq!(opened, data_key);
    }

    #[test]
    fn test_unwrap_with_other_identity_fails() {
        let owner = Identity::generate();
        let stranger = Identity::generate();
        let wrapped = owner.recipient().wrap(&[1u8; KEY_LEN]).unwrap();

        let err = stranger.unwrap(&[wrapped]).unwrap_err();
        assert!(matches!(err, BananaError::DecryptionFailed { .. }));
    }

    #[test]
    fn test_tampered_wrapped_key_fails() {
        let identity = Identity::generate();
        let mut wrapped = identity.recipient().wrap(&[1u8; KEY_LEN]).unwrap();
        wrapped.ephemeral = Identity::generate().recipient().to_base64();

        assert!(identity.unwrap(&[wrapped]).is_err());
    }

    #[test]
    fn test_malformed_recipient() {
        for encoded in ["", "not base64!", "AAAA"] {
            let err = Recipient::parse(encoded).unwrap_err();
            assert!(matches!(err, BananaError::EncryptionFailed { .. }), "{encoded}");
        }
    }
}
