//!
//! Resolve user-supplied key material into usable key handles
//!

use super::algorithm::{Algorithm, Digest, Family, Scheme};
use super::sign::SigningKey as SigningKeyTrait;
use const_oid::db::rfc5912::RSA_ENCRYPTION;
use miette::Diagnostic;
use pkcs8::{Document, PrivateKeyInfo, SecretDocument, SubjectPublicKeyInfoRef};
use ring::{
    hmac, pbkdf2,
    rand::SystemRandom,
    signature::{
        RsaEncoding, RsaKeyPair, RsaParameters, UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA256,
        RSA_PKCS1_SHA256, RSA_PSS_2048_8192_SHA512, RSA_PSS_SHA512,
    },
};
use std::num::NonZeroU32;
use thiserror::Error;

const PBKDF2_ITERATIONS_DEFAULT: u32 = 8192;
const PBKDF2_ITERATIONS_MIN: u64 = 50;
const PBKDF2_ITERATIONS_MAX: u64 = 100_001;

/// Key resolution error
#[derive(Debug, Diagnostic, Error)]
pub enum KeyError {
    /// Failed to decode a Base64-coded secret or salt
    #[error(transparent)]
    Base64(#[from] base64_simd::Error),

    /// Malformed DER structure
    #[error(transparent)]
    Der(#[from] pkcs8::der::Error),

    /// Failed to decode a hex-coded secret or salt
    #[error(transparent)]
    Hex(#[from] hex_simd::Error),

    /// Symmetric key material is too short for the scheme
    #[error("insufficient key length, need at least {required} key bytes, got {actual}")]
    InsufficientKeyLength { required: usize, actual: usize },

    /// Key rejected
    #[error(transparent)]
    KeyRejected(#[from] ring::error::KeyRejected),

    /// Malformed key
    #[error("malformed key")]
    MalformedKey,

    /// Key material belongs to the wrong primitive family for the algorithm
    #[error("`{algorithm}` cannot be used with {family} key material")]
    Mismatch { algorithm: Algorithm, family: Family },

    /// Malformed PKCS#8 document
    #[error(transparent)]
    Pkcs8(#[from] pkcs8::Error),

    /// PEM carries a key type this implementation does not handle
    #[error("unknown key type")]
    UnknownKeyType,
}

/// Non-fatal configuration fallback, collected alongside a completed operation
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("iteration count is not a number, defaulting to {fallback}")]
    IterationCountNotNumeric { fallback: u32 },

    #[error("iteration count {requested} out of range, defaulting to {fallback}")]
    IterationCountOutOfRange { requested: u64, fallback: u32 },
}

/// Text-to-bytes codings accepted for symmetric secrets and PBKDF2 salts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coding {
    Utf8,
    Base64,
    Hex,
}

impl Coding {
    /// Decode `text` into raw bytes
    pub fn decode(self, text: &str) -> Result<Vec<u8>, KeyError> {
        let bytes = match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Base64 => base64_simd::STANDARD.decode_to_vec(text)?,
            Self::Hex => hex_simd::decode_to_vec(text)?,
        };

        Ok(bytes)
    }
}

/// PBKDF2 derivation inputs, taken verbatim from the caller
#[derive(Clone, Copy, Debug)]
pub struct Pbkdf2Params<'a> {
    /// Low-entropy secret, always consumed as UTF-8
    pub secret: &'a str,

    /// Salt text, decoded per `salt_coding`
    pub salt: &'a str,
    pub salt_coding: Coding,

    /// Raw iteration-count input; out-of-range or non-numeric values fall
    /// back to the default and surface a [`ConfigWarning`]
    pub iterations: &'a str,
}

/// Symmetric key material as supplied by the caller
#[derive(Clone, Copy, Debug)]
pub enum SymmetricSecret<'a> {
    /// A coded secret used as-is once decoded
    Raw { secret: &'a str, coding: Coding },

    /// A secret stretched through PBKDF2
    Pbkdf2(Pbkdf2Params<'a>),
}

/// Key material for a single sign or verify call
#[derive(Clone, Copy, Debug)]
pub enum KeySource<'a> {
    Symmetric(SymmetricSecret<'a>),
    Pem(&'a str),
}

impl KeySource<'_> {
    /// Primitive family this material can serve
    #[must_use]
    pub fn family(&self) -> Family {
        match self {
            Self::Symmetric(_) => Family::Hmac,
            Self::Pem(_) => Family::Rsa,
        }
    }
}

/// Enum dispatch over resolved signing key material
pub enum SigningKey {
    /// Symmetric HMAC key
    Hmac(hmac::Key),

    /// RSA private key plus the padding the scheme mandates
    Rsa {
        key_pair: RsaKeyPair,
        padding: &'static (dyn RsaEncoding + Send + Sync),
    },
}

impl SigningKeyTrait for SigningKey {
    type Output = Vec<u8>;

    fn sign(&self, msg: &[u8]) -> Self::Output {
        match self {
            Self::Hmac(key) => hmac::sign(key, msg).as_ref().to_vec(),
            Self::Rsa { key_pair, padding } => {
                let mut buf = vec![0; key_pair.public().modulus_len()];

                let rng = SystemRandom::new();
                key_pair
                    .sign(*padding, &rng, msg, &mut buf)
                    .expect("Failed to sign message");

                buf
            }
        }
    }
}

/// Enum dispatch over resolved verifying key material
pub enum VerifyingKey {
    /// Symmetric HMAC key
    Hmac(hmac::Key),

    /// RSA public key with the scheme's verification parameters
    Rsa(UnparsedPublicKey<Vec<u8>>),
}

/// Resolve key material for a signing operation
pub fn resolve_sign(
    scheme: Scheme,
    source: &KeySource<'_>,
) -> Result<(SigningKey, Vec<ConfigWarning>), KeyError> {
    let mut warnings = Vec::new();

    let key = match (scheme, source) {
        (Scheme::HmacSha256 | Scheme::Hs2019Hmac, KeySource::Symmetric(secret)) => {
            SigningKey::Hmac(symmetric_key(scheme, secret, &mut warnings)?)
        }
        (Scheme::RsaSha256, KeySource::Pem(pem)) => SigningKey::Rsa {
            key_pair: private_key(pem)?,
            padding: &RSA_PKCS1_SHA256,
        },
        (Scheme::Hs2019Rsa, KeySource::Pem(pem)) => SigningKey::Rsa {
            key_pair: private_key(pem)?,
            padding: &RSA_PSS_SHA512,
        },
        (scheme, source) => {
            return Err(KeyError::Mismatch {
                algorithm: scheme.algorithm(),
                family: source.family(),
            })
        }
    };

    Ok((key, warnings))
}

/// Resolve key material for a verification operation
pub fn resolve_verify(
    scheme: Scheme,
    source: &KeySource<'_>,
) -> Result<(VerifyingKey, Vec<ConfigWarning>), KeyError> {
    let mut warnings = Vec::new();

    let key = match (scheme, source) {
        (Scheme::HmacSha256 | Scheme::Hs2019Hmac, KeySource::Symmetric(secret)) => {
            VerifyingKey::Hmac(symmetric_key(scheme, secret, &mut warnings)?)
        }
        (Scheme::RsaSha256, KeySource::Pem(pem)) => {
            VerifyingKey::Rsa(public_key(&RSA_PKCS1_2048_8192_SHA256, pem)?)
        }
        (Scheme::Hs2019Rsa, KeySource::Pem(pem)) => {
            VerifyingKey::Rsa(public_key(&RSA_PSS_2048_8192_SHA512, pem)?)
        }
        (scheme, source) => {
            return Err(KeyError::Mismatch {
                algorithm: scheme.algorithm(),
                family: source.family(),
            })
        }
    };

    Ok((key, warnings))
}

fn symmetric_key(
    scheme: Scheme,
    secret: &SymmetricSecret<'_>,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<hmac::Key, KeyError> {
    let bytes = match secret {
        SymmetricSecret::Raw { secret, coding } => coding.decode(secret)?,
        SymmetricSecret::Pbkdf2(params) => derive_pbkdf2(params, warnings)?,
    };

    if let Some(required) = scheme.min_symmetric_key_bytes() {
        if bytes.len() < required {
            return Err(KeyError::InsufficientKeyLength {
                required,
                actual: bytes.len(),
            });
        }
    }

    let algorithm = match scheme.digest() {
        Digest::Sha256 => hmac::HMAC_SHA256,
        Digest::Sha512 => hmac::HMAC_SHA512,
    };

    Ok(hmac::Key::new(algorithm, &bytes))
}

fn derive_pbkdf2(
    params: &Pbkdf2Params<'_>,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<Vec<u8>, KeyError> {
    let salt = params.salt_coding.decode(params.salt)?;
    let iterations = iteration_count(params.iterations, warnings);

    // SHA-256 output size
    let mut derived = vec![0; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        params.secret.as_bytes(),
        &mut derived,
    );

    Ok(derived)
}

fn iteration_count(raw: &str, warnings: &mut Vec<ConfigWarning>) -> NonZeroU32 {
    let count = match raw.trim().parse::<u64>() {
        Ok(count) if (PBKDF2_ITERATIONS_MIN..=PBKDF2_ITERATIONS_MAX).contains(&count) => {
            u32::try_from(count).unwrap_or(PBKDF2_ITERATIONS_DEFAULT)
        }
        Ok(count) => {
            warnings.push(ConfigWarning::IterationCountOutOfRange {
                requested: count,
                fallback: PBKDF2_ITERATIONS_DEFAULT,
            });
            PBKDF2_ITERATIONS_DEFAULT
        }
        Err(_) => {
            warnings.push(ConfigWarning::IterationCountNotNumeric {
                fallback: PBKDF2_ITERATIONS_DEFAULT,
            });
            PBKDF2_ITERATIONS_DEFAULT
        }
    };

    NonZeroU32::new(count).expect("clamped iteration count is non-zero")
}

/// Parse an RSA private key from its PEM form
///
/// Accepts both the PKCS#8 interchange form (`PRIVATE KEY`) and the legacy
/// PKCS#1 form (`RSA PRIVATE KEY`).
fn private_key(pem: &str) -> Result<RsaKeyPair, KeyError> {
    let (label, document) = SecretDocument::from_pem(pem)?;

    let key_pair = match label {
        "PRIVATE KEY" => {
            let private_key_info: PrivateKeyInfo<'_> = document.decode_msg()?;
            if private_key_info.algorithm.oid != RSA_ENCRYPTION {
                return Err(KeyError::UnknownKeyType);
            }

            RsaKeyPair::from_der(private_key_info.private_key)?
        }
        "RSA PRIVATE KEY" => RsaKeyPair::from_der(document.as_bytes())?,
        _ => return Err(KeyError::UnknownKeyType),
    };

    Ok(key_pair)
}

/// Parse an RSA public key from its SPKI PEM form
fn public_key(
    verification: &'static RsaParameters,
    pem: &str,
) -> Result<UnparsedPublicKey<Vec<u8>>, KeyError> {
    let (_label, document) = Document::from_pem(pem)?;
    let spki: SubjectPublicKeyInfoRef<'_> = document.decode_msg()?;

    if spki.algorithm.oid != RSA_ENCRYPTION {
        return Err(KeyError::UnknownKeyType);
    }

    let raw_bytes = spki
        .subject_public_key
        .as_bytes()
        .ok_or(KeyError::MalformedKey)?
        .to_vec();

    Ok(UnparsedPublicKey::new(verification, raw_bytes))
}

#[cfg(test)]
mod test {
    use super::{
        iteration_count, symmetric_key, Coding, ConfigWarning, KeyError, Pbkdf2Params,
        SymmetricSecret, PBKDF2_ITERATIONS_DEFAULT,
    };
    use crate::crypto::algorithm::Scheme;

    #[test]
    fn iteration_count_in_range() {
        let mut warnings = Vec::new();
        assert_eq!(iteration_count("10000", &mut warnings).get(), 10000);
        assert!(warnings.is_empty());
    }

    #[test]
    fn iteration_count_out_of_range_falls_back() {
        let mut warnings = Vec::new();
        assert_eq!(
            iteration_count("999999999", &mut warnings).get(),
            PBKDF2_ITERATIONS_DEFAULT
        );
        assert_eq!(
            warnings,
            [ConfigWarning::IterationCountOutOfRange {
                requested: 999_999_999,
                fallback: PBKDF2_ITERATIONS_DEFAULT,
            }]
        );
    }

    #[test]
    fn iteration_count_not_numeric_falls_back() {
        let mut warnings = Vec::new();
        assert_eq!(
            iteration_count("lots", &mut warnings).get(),
            PBKDF2_ITERATIONS_DEFAULT
        );
        assert!(matches!(
            warnings[0],
            ConfigWarning::IterationCountNotNumeric { .. }
        ));
    }

    #[test]
    fn decode_codings() {
        assert_eq!(Coding::Utf8.decode("abc").unwrap(), b"abc");
        assert_eq!(Coding::Base64.decode("YWJj").unwrap(), b"abc");
        assert_eq!(Coding::Hex.decode("616263").unwrap(), b"abc");
        assert!(Coding::Hex.decode("zz").is_err());
    }

    #[test]
    fn short_symmetric_key_is_rejected() {
        let mut warnings = Vec::new();
        let secret = SymmetricSecret::Raw {
            secret: "too short",
            coding: Coding::Utf8,
        };

        let err = symmetric_key(Scheme::HmacSha256, &secret, &mut warnings).unwrap_err();
        assert!(matches!(
            err,
            KeyError::InsufficientKeyLength { required: 32, .. }
        ));
        assert!(err.to_string().contains("32"));
    }

    #[test]
    fn pbkdf2_derivation_is_deterministic() {
        let mut warnings = Vec::new();
        let params = Pbkdf2Params {
            secret: "Definitely-Fresh-Orbit-1234-5678901",
            salt: "73616c74",
            salt_coding: Coding::Hex,
            iterations: "100",
        };

        let first = symmetric_key(
            Scheme::Hs2019Hmac,
            &SymmetricSecret::Pbkdf2(params),
            &mut warnings,
        )
        .unwrap();
        let second = symmetric_key(
            Scheme::Hs2019Hmac,
            &SymmetricSecret::Pbkdf2(params),
            &mut warnings,
        )
        .unwrap();
        assert!(warnings.is_empty());

        let tag = ring::hmac::sign(&first, b"payload");
        assert!(ring::hmac::verify(&second, b"payload", tag.as_ref()).is_ok());
    }
}
