//! Selective envelope encryption of YAML documents
//!
//! Only scalar values below a mapping key matching one of the field patterns are
//! encrypted; everything else stays readable so reviewers can diff bundles. Each
//! encrypted value is written as
//! `ENC[XCHACHA20_POLY1305,data:…,iv:…,tag:…,type:str|int|float|bool]` with its key path
//! as associated data, and an `envelope` block records the wrapped data keys and a MAC
//! over every value of the document.
//!
//! ## Module Organization
//!
//! - `keys.rs`: identities, recipients and data key wrapping

pub mod keys;

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Number, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{BananaError, Result};

pub use keys::{Identity, Recipient, WrappedKey};

/// Top-level key holding encryption metadata
pub const ENVELOPE_KEY: &str = "envelope";

const ENVELOPE_VERSION: &str = "1.0.0";
const CIPHER_NAME: &str = "XCHACHA20_POLY1305";
const TAG_LEN: usize = 16;

/// Encrypts selected fields of a document for a set of recipients
pub trait Encryptor {
    fn encrypt(&self, doc: &[u8], recipients: &[String], field_patterns: &[String]) -> Result<Vec<u8>>;
}

/// X25519 + XChaCha20-Poly1305 envelope encryption
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeEncryptor;

impl Encryptor for EnvelopeEncryptor {
    fn encrypt(&self, doc: &[u8], recipients: &[String], field_patterns: &[String]) -> Result<Vec<u8>> {
        let value: Value = serde_yaml::from_slice(doc).map_err(|e| BananaError::EncryptionFailed {
            reason: format!("document is not valid YAML: {e}"),
        })?;
        let encrypted = encrypt_value(value, recipients, field_patterns)?;
        let out = serde_yaml::to_string(&encrypted).map_err(|e| BananaError::EncryptionFailed {
            reason: e.to_string(),
        })?;
        Ok(out.into_bytes())
    }
}

/// Metadata appended to every encrypted document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub recipients: Vec<WrappedKey>,
    pub encrypted_regex: String,
    pub lastmodified: String,
    pub mac: String,
    pub version: String,
}

/// Generate a new identity, returned with its recipient
pub fn generate_identity() -> (Identity, Recipient) {
    let identity = Identity::generate();
    let recipient = identity.recipient();
    (identity, recipient)
}

/// Encrypt the matching fields of a document
pub fn encrypt_value(mut doc: Value, recipients: &[String], field_patterns: &[String]) -> Result<Value> {
    if recipients.is_empty() {
        return Err(BananaError::EncryptionFailed {
            reason: "no recipients configured".to_string(),
        });
    }
    let recipients = recipients
        .iter()
        .map(|r| Recipient::parse(r))
        .collect::<Result<Vec<_>>>()?;

    if !doc.is_mapping() {
        return Err(BananaError::EncryptionFailed {
            reason: "only mapping documents can be encrypted".to_string(),
        });
    }
    if doc.get(ENVELOPE_KEY).is_some() {
        return Err(BananaError::EncryptionFailed {
            reason: format!("document already carries an '{ENVELOPE_KEY}' block"),
        });
    }

    let encrypted_regex = field_regex(field_patterns);
    let matcher = Regex::new(&encrypted_regex).map_err(|e| BananaError::EncryptionFailed {
        reason: format!("invalid field pattern: {e}"),
    })?;

    let data_key = XChaCha20Poly1305::generate_key(&mut OsRng);
    let cipher = XChaCha20Poly1305::new(&data_key);

    let mut hasher = Sha256::new();
    let mut encrypted_fields = 0usize;
    let mut failure = None;
    visit_scalars(&mut doc, &mut Vec::new(), false, &matcher, &mut |value, path, matched| {
        if failure.is_some() {
            return;
        }
        let Some((plain, kind)) = scalar_text(value) else {
            return;
        };
        hasher.update(plain.as_bytes());
        if matched {
            match seal(&cipher, &plain, kind, &aad_for(path)) {
                Ok(sealed) => {
                    *value = Value::String(sealed);
                    encrypted_fields += 1;
                }
                Err(err) => failure = Some(err),
            }
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }

    let lastmodified = timestamp();
    let mac = format!("{:X}", hasher.finalize());
    let mac = seal(&cipher, &mac, ScalarKind::Str, &lastmodified)?;
    let wrapped = recipients
        .iter()
        .map(|recipient| recipient.wrap(data_key.as_slice()))
        .collect::<Result<Vec<_>>>()?;

    let metadata = EnvelopeMetadata {
        recipients: wrapped,
        encrypted_regex,
        lastmodified,
        mac,
        version: ENVELOPE_VERSION.to_string(),
    };
    let metadata = serde_yaml::to_value(metadata).map_err(|e| BananaError::EncryptionFailed {
        reason: e.to_string(),
    })?;
    if let Some(map) = doc.as_mapping_mut() {
        map.insert(Value::from(ENVELOPE_KEY), metadata);
    }

    debug!(fields = encrypted_fields, recipients = recipients.len(), "encrypted document");
    Ok(doc)
}

/// Decrypt a document produced by [`encrypt_value`], verifying its MAC
pub fn decrypt_value(mut doc: Value, identity: &Identity) -> Result<Value> {
    let failed = |reason: String| BananaError::DecryptionFailed { reason };

    let metadata = doc
        .as_mapping_mut()
        .and_then(|map| map.remove(ENVELOPE_KEY))
        .ok_or_else(|| failed(format!("document has no '{ENVELOPE_KEY}' block")))?;
    let metadata: EnvelopeMetadata =
        serde_yaml::from_value(metadata).map_err(|e| failed(format!("malformed envelope: {e}")))?;
    let matcher = Regex::new(&metadata.encrypted_regex)
        .map_err(|e| failed(format!("malformed encrypted_regex: {e}")))?;

    let data_key = identity.unwrap(&metadata.recipients)?;
    if data_key.len() != Key::default().len() {
        return Err(failed("unwrapped data key has the wrong length".to_string()));
    }
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&data_key));

    let mut hasher = Sha256::new();
    let mut failure = None;
    visit_scalars(&mut doc, &mut Vec::new(), false, &matcher, &mut |value, path, matched| {
        if failure.is_some() {
            return;
        }
        if matched {
            if let Some(sealed) = value.as_str() {
                match open(&cipher, sealed, &aad_for(path)) {
                    Ok(plain) => *value = plain,
                    Err(err) => {
                        failure = Some(err);
                        return;
                    }
                }
            }
        }
        if let Some((plain, _)) = scalar_text(value) {
            hasher.update(plain.as_bytes());
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }

    let expected = open(&cipher, &metadata.mac, &metadata.lastmodified)?;
    let actual = format!("{:X}", hasher.finalize());
    if expected.as_str() != Some(actual.as_str()) {
        return Err(failed("MAC mismatch, the document was modified".to_string()));
    }

    Ok(doc)
}

/// Decrypt every enveloped document of a YAML stream, passing others through
pub fn decrypt_stream(content: &str, identity: &Identity) -> Result<String> {
    let mut out = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let doc = Value::deserialize(document).map_err(|e| BananaError::DecryptionFailed {
            reason: format!("input is not valid YAML: {e}"),
        })?;
        if doc.is_null() {
            continue;
        }
        let doc = if doc.get(ENVELOPE_KEY).is_some() {
            decrypt_value(doc, identity)?
        } else {
            doc
        };
        out.push(serde_yaml::to_string(&doc).map_err(|e| BananaError::DecryptionFailed {
            reason: e.to_string(),
        })?);
    }
    Ok(out.join("---\n"))
}

/// `^(?:p1|p2)$` with every pattern matched literally
fn field_regex(patterns: &[String]) -> String {
    let alternatives: Vec<String> = patterns.iter().map(|p| regex::escape(p)).collect();
    format!("^(?:{})$", alternatives.join("|"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarKind {
    Str,
    Int,
    Float,
    Bool,
}

impl ScalarKind {
    fn as_str(self) -> &'static str {
        match self {
            ScalarKind::Str => "str",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "str" => Some(ScalarKind::Str),
            "int" => Some(ScalarKind::Int),
            "float" => Some(ScalarKind::Float),
            "bool" => Some(ScalarKind::Bool),
            _ => None,
        }
    }
}

fn scalar_text(value: &Value) -> Option<(String, ScalarKind)> {
    match value {
        Value::String(s) => Some((s.clone(), ScalarKind::Str)),
        Value::Bool(b) => Some((b.to_string(), ScalarKind::Bool)),
        Value::Number(n) if n.is_f64() => Some((n.to_string(), ScalarKind::Float)),
        Value::Number(n) => Some((n.to_string(), ScalarKind::Int)),
        _ => None,
    }
}

/// Walk every scalar leaf, reporting its key path and whether a matching key is above it
fn visit_scalars(
    value: &mut Value,
    path: &mut Vec<String>,
    matched: bool,
    matcher: &Regex,
    visit: &mut dyn FnMut(&mut Value, &[String], bool),
) {
    match value {
        Value::Mapping(map) => visit_mapping(map, path, matched, matcher, visit),
        Value::Sequence(items) => {
            for item in items {
                visit_scalars(item, path, matched, matcher, visit);
            }
        }
        Value::Tagged(tagged) => visit_scalars(&mut tagged.value, path, matched, matcher, visit),
        _ => visit(value, path, matched),
    }
}

fn visit_mapping(
    map: &mut Mapping,
    path: &mut Vec<String>,
    matched: bool,
    matcher: &Regex,
    visit: &mut dyn FnMut(&mut Value, &[String], bool),
) {
    for (key, child) in map.iter_mut() {
        let Some(key) = key.as_str() else {
            continue;
        };
        if path.is_empty() && key == ENVELOPE_KEY {
            continue;
        }
        let child_matched = matched || matcher.is_match(key);
        path.push(key.to_string());
        visit_scalars(child, path, child_matched, matcher, visit);
        path.pop();
    }
}

fn aad_for(path: &[String]) -> String {
    let mut aad = path.join(":");
    aad.push(':');
    aad
}

fn seal(cipher: &XChaCha20Poly1305, plain: &str, kind: ScalarKind, aad: &str) -> Result<String> {
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let mut sealed = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plain.as_bytes(),
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| BananaError::EncryptionFailed {
            reason: "failed to encrypt value".to_string(),
        })?;
    let tag = sealed.split_off(sealed.len() - TAG_LEN);

    Ok(format!(
        "ENC[{CIPHER_NAME},data:{},iv:{},tag:{},type:{}]",
        STANDARD.encode(sealed),
        STANDARD.encode(nonce),
        STANDARD.encode(tag),
        kind.as_str()
    ))
}

fn open(cipher: &XChaCha20Poly1305, sealed: &str, aad: &str) -> Result<Value> {
    let failed = |reason: &str| BananaError::DecryptionFailed {
        reason: reason.to_string(),
    };

    let body = sealed
        .strip_prefix("ENC[")
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| failed("value is not an ENC[...] envelope"))?;
    let mut parts = body.split(',');
    if parts.next() != Some(CIPHER_NAME) {
        return Err(failed("unsupported cipher"));
    }

    let (mut data, mut iv, mut tag, mut kind) = (None, None, None, None);
    for part in parts {
        match part.split_once(':') {
            Some(("data", v)) => data = Some(v),
            Some(("iv", v)) => iv = Some(v),
            Some(("tag", v)) => tag = Some(v),
            Some(("type", v)) => kind = ScalarKind::parse(v),
            _ => return Err(failed("malformed ENC[...] field")),
        }
    }
    let (Some(data), Some(iv), Some(tag), Some(kind)) = (data, iv, tag, kind) else {
        return Err(failed("ENC[...] value is missing a field"));
    };

    let decode = |v: &str| STANDARD.decode(v).map_err(|_| failed("ENC[...] field is not base64"));
    let mut ciphertext = decode(data)?;
    let nonce = decode(iv)?;
    if nonce.len() != XNonce::default().len() {
        return Err(failed("ENC[...] iv has the wrong length"));
    }
    ciphertext.extend(decode(tag)?);

    let plain = cipher
        .decrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: &ciphertext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| failed("authentication failed, wrong key or tampered value"))?;
    let plain = String::from_utf8(plain).map_err(|_| failed("decrypted value is not UTF-8"))?;

    restore_scalar(&plain, kind).ok_or_else(|| failed("decrypted value does not match its type"))
}

fn restore_scalar(plain: &str, kind: ScalarKind) -> Option<Value> {
    match kind {
        ScalarKind::Str => Some(Value::String(plain.to_string())),
        ScalarKind::Bool => plain.parse::<bool>().ok().map(Value::Bool),
        ScalarKind::Int => plain
            .parse::<i64>()
            .map(Number::from)
            .or_else(|_| plain.parse::<u64>().map(Number::from))
            .ok()
            .map(Value::Number),
        ScalarKind::Float => plain.parse::<f64>().ok().map(|f| Value::Number(Number::from(f))),
    }
}

fn timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
        .to_string()
}
