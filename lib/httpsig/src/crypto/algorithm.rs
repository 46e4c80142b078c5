//!
//! Algorithm registry: wire tokens and the concrete schemes behind them
//!

use miette::Diagnostic;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Unknown `algorithm` token
#[derive(Debug, Diagnostic, Error)]
#[error("unsupported algorithm `{0}`")]
#[diagnostic(help("supported algorithms: rsa-sha256, hmac-sha256, hs2019"))]
pub struct UnsupportedAlgorithm(pub String);

/// Wire-level algorithm token carried in the `algorithm` parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// RSA PKCS#1 v1.5 over SHA-256
    RsaSha256,

    /// HMAC over SHA-256
    HmacSha256,

    /// Generalised scheme; the concrete primitive is inferred from the key material
    Hs2019,
}

impl Algorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RsaSha256 => "rsa-sha256",
            Self::HmacSha256 => "hmac-sha256",
            Self::Hs2019 => "hs2019",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let algorithm = match s {
            "rsa-sha256" => Self::RsaSha256,
            "hmac-sha256" => Self::HmacSha256,
            "hs2019" => Self::Hs2019,
            other => return Err(UnsupportedAlgorithm(other.to_owned())),
        };

        Ok(algorithm)
    }
}

/// Digest fed into the signature primitive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Digest {
    Sha256,
    Sha512,
}

/// Primitive family the key material belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    Hmac,
    Rsa,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hmac => "hmac",
            Self::Rsa => "rsa",
        })
    }
}

/// One row of the algorithm table: a wire token pinned to a key family
///
/// `hs2019` deliberately leaves the primitive open; both sub-flavours share
/// the token and are told apart by the key material the caller supplies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// RSA PKCS#1 v1.5 with SHA-256
    RsaSha256,

    /// HMAC with SHA-256
    HmacSha256,

    /// `hs2019` over a symmetric key: HMAC with SHA-512
    Hs2019Hmac,

    /// `hs2019` over an RSA key: RSA-PSS with SHA-512
    ///
    /// The PSS salt length equals the digest output length (64 bytes),
    /// matching what ring produces and what JWT-adjacent systems expect.
    Hs2019Rsa,
}

impl Scheme {
    /// Resolve the wire token against the family of the supplied key material
    #[must_use]
    pub fn select(algorithm: Algorithm, family: Family) -> Option<Self> {
        let scheme = match (algorithm, family) {
            (Algorithm::RsaSha256, Family::Rsa) => Self::RsaSha256,
            (Algorithm::HmacSha256, Family::Hmac) => Self::HmacSha256,
            (Algorithm::Hs2019, Family::Hmac) => Self::Hs2019Hmac,
            (Algorithm::Hs2019, Family::Rsa) => Self::Hs2019Rsa,
            _ => return None,
        };

        Some(scheme)
    }

    #[must_use]
    pub const fn algorithm(self) -> Algorithm {
        match self {
            Self::RsaSha256 => Algorithm::RsaSha256,
            Self::HmacSha256 => Algorithm::HmacSha256,
            Self::Hs2019Hmac | Self::Hs2019Rsa => Algorithm::Hs2019,
        }
    }

    #[must_use]
    pub const fn digest(self) -> Digest {
        match self {
            Self::RsaSha256 | Self::HmacSha256 => Digest::Sha256,
            Self::Hs2019Hmac | Self::Hs2019Rsa => Digest::Sha512,
        }
    }

    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::RsaSha256 | Self::Hs2019Rsa => Family::Rsa,
            Self::HmacSha256 | Self::Hs2019Hmac => Family::Hmac,
        }
    }

    /// Minimum accepted symmetric key length in bytes; `None` for the RSA rows
    #[must_use]
    pub const fn min_symmetric_key_bytes(self) -> Option<usize> {
        match self {
            Self::HmacSha256 | Self::Hs2019Hmac => Some(32),
            Self::RsaSha256 | Self::Hs2019Rsa => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RsaSha256 => "rsa-sha256",
            Self::HmacSha256 => "hmac-sha256",
            Self::Hs2019Hmac => "hs2019 (hmac)",
            Self::Hs2019Rsa => "hs2019 (rsa)",
        })
    }
}

#[cfg(test)]
mod test {
    use super::{Algorithm, Family, Scheme};

    #[test]
    fn parse_wire_tokens() {
        assert_eq!("rsa-sha256".parse::<Algorithm>().unwrap(), Algorithm::RsaSha256);
        assert_eq!("hmac-sha256".parse::<Algorithm>().unwrap(), Algorithm::HmacSha256);
        assert_eq!("hs2019".parse::<Algorithm>().unwrap(), Algorithm::Hs2019);
        assert!("rsa-sha512".parse::<Algorithm>().is_err());
    }

    #[test]
    fn select_hs2019_flavour_by_key_family() {
        assert_eq!(
            Scheme::select(Algorithm::Hs2019, Family::Hmac),
            Some(Scheme::Hs2019Hmac)
        );
        assert_eq!(
            Scheme::select(Algorithm::Hs2019, Family::Rsa),
            Some(Scheme::Hs2019Rsa)
        );
        assert_eq!(Scheme::select(Algorithm::RsaSha256, Family::Hmac), None);
    }

    #[test]
    fn registry_rows() {
        assert_eq!(Scheme::Hs2019Hmac.min_symmetric_key_bytes(), Some(32));
        assert_eq!(Scheme::Hs2019Rsa.min_symmetric_key_bytes(), None);
        assert_eq!(Scheme::Hs2019Rsa.algorithm(), Algorithm::Hs2019);
        assert_eq!(Scheme::HmacSha256.algorithm(), Algorithm::HmacSha256);
    }
}
