//!
//! Sign and verify Cavage `Signature` headers end to end
//!
//! Every call is an independent, stateless operation: all inputs are captured
//! up front, key material lives for exactly one call, and the cryptographic
//! work runs on the blocking pool.
//!

use super::{
    serialise, signature_string,
    temporal::{self, Verdict},
    HeaderSet, SignatureHeader, Times,
};
use crate::crypto::{
    self,
    algorithm::{Algorithm, Scheme},
    key::{self, ConfigWarning, KeyError, KeySource},
};
use derive_builder::Builder;
use miette::Diagnostic;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, instrument};

/// Engine error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Signature payload failed to decode
    #[error(transparent)]
    Base64(#[from] base64_simd::Error),

    /// Signature header parsing failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidSignatureHeader(#[from] super::ParseError),

    /// Key material failed to resolve
    #[error(transparent)]
    #[diagnostic(transparent)]
    Key(#[from] KeyError),

    /// Signature string construction failure
    #[error(transparent)]
    #[diagnostic(transparent)]
    SignatureString(#[from] signature_string::Error),

    /// System clock is set before the epoch
    #[error(transparent)]
    SystemTime(#[from] SystemTimeError),

    /// Blocking pool communication failure
    #[error(transparent)]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Inputs captured for a single signing operation
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct SignRequest<'a> {
    /// Headers to cover, signed in their insertion order
    pub headers: &'a HeaderSet,

    /// Concrete signing scheme
    pub scheme: Scheme,

    /// Identifier of the key, emitted verbatim into `keyId`
    pub key_id: &'a str,

    /// Key material to sign with
    pub key: KeySource<'a>,

    /// Optional validity bounds (`hs2019`)
    #[builder(default)]
    pub times: Times,
}

impl<'a> SignRequest<'a> {
    /// Return a builder for the signing request
    pub fn builder() -> SignRequestBuilder<'a> {
        SignRequestBuilder::default()
    }
}

/// Result of a signing operation
#[derive(Debug)]
pub struct SignedHeader {
    /// Raw signature bytes
    pub signature: Vec<u8>,

    /// Base64 form of the signature
    pub encoded_signature: String,

    /// Complete `Signature …` header text
    pub header: String,

    /// Non-fatal configuration fallbacks hit while resolving the key
    pub warnings: Vec<ConfigWarning>,
}

/// Sign a header set and produce the complete `Signature` header
#[instrument(skip_all, fields(key_id = request.key_id))]
pub async fn sign(request: SignRequest<'_>) -> Result<SignedHeader, Error> {
    let signature_string = signature_string::construct(request.headers, request.times, None)?;
    let (signing_key, warnings) = key::resolve_sign(request.scheme, &request.key)?;

    debug!(scheme = %request.scheme, "signing header set");
    let signature =
        tokio::task::spawn_blocking(move || crypto::sign(signature_string.as_bytes(), &signing_key))
            .await?;
    let encoded_signature = base64_simd::STANDARD.encode_to_string(&signature);

    let mut header_names: Vec<&str> = request.headers.names().collect();
    if request.times.created.is_some() {
        header_names.push("created");
    }
    if request.times.expires.is_some() {
        header_names.push("expires");
    }

    let header = serialise(&SignatureHeader {
        algorithm: request.scheme.algorithm(),
        key_id: request.key_id,
        headers: header_names,
        signature: &encoded_signature,
        created: request.times.created,
        expires: request.times.expires,
    });

    Ok(SignedHeader {
        signature,
        encoded_signature,
        header,
        warnings,
    })
}

/// Inputs captured for a single verification operation
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct VerifyRequest<'a> {
    /// Raw `Signature …` header text to check
    pub signature_header: &'a str,

    /// Headers of the message being verified
    pub headers: &'a HeaderSet,

    /// Key material appropriate to the parsed algorithm
    pub key: KeySource<'a>,
}

impl<'a> VerifyRequest<'a> {
    /// Return a builder for the verification request
    pub fn builder() -> VerifyRequestBuilder<'a> {
        VerifyRequestBuilder::default()
    }
}

/// Result of a verification operation
#[derive(Debug)]
pub struct Verification {
    /// Did the cryptographic check succeed
    pub valid: bool,

    /// Temporal verdict, attached for cryptographically valid `hs2019` signatures
    pub temporal: Option<Verdict>,

    /// Non-fatal configuration fallbacks hit while resolving the key
    pub warnings: Vec<ConfigWarning>,
}

/// Verify a raw `Signature` header against a header set
///
/// A malformed header fails fast with a parse error and never reaches the
/// cryptographic provider.
#[instrument(skip_all)]
pub async fn verify(request: VerifyRequest<'_>) -> Result<Verification, Error> {
    let parsed = super::parse(request.signature_header)?;
    let times = parsed.times();

    let family = request.key.family();
    let Some(scheme) = Scheme::select(parsed.algorithm, family) else {
        return Err(KeyError::Mismatch {
            algorithm: parsed.algorithm,
            family,
        }
        .into());
    };

    let signature_string =
        signature_string::construct(request.headers, times, Some(&parsed.headers))?;
    let (verifying_key, warnings) = key::resolve_verify(scheme, &request.key)?;

    debug!(scheme = %scheme, key_id = parsed.key_id, "verifying signature");
    let encoded_signature = parsed.signature.to_owned();
    let valid = tokio::task::spawn_blocking(move || {
        crypto::verify(signature_string.as_bytes(), &encoded_signature, &verifying_key)
    })
    .await??;

    let temporal = if parsed.algorithm == Algorithm::Hs2019 {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let verdict = temporal::check(now, times);

        debug!(valid, clean = verdict.is_clean(), "checked validity bounds");
        valid.then_some(verdict)
    } else {
        None
    };

    Ok(Verification {
        valid,
        temporal,
        warnings,
    })
}
