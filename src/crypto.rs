//! Keyed-hash and digest primitives, parameterized by the configured hash algorithm.

use {
    crate::EscherError,
    hmac::{Hmac, Mac},
    sha2::{Digest, Sha256, Sha384, Sha512},
    std::{
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// A hash algorithm usable for Escher signatures.
///
/// Parsed from the hash algorithm identifier (e.g. `SHA256`) carried in the configuration and in the algorithm
/// name of the authorization header.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HashAlgorithm {
    /// SHA-256
    Sha256,

    /// SHA-384
    Sha384,

    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// The identifier used in algorithm names, e.g. `SHA256`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
        }
    }

    /// Length of the digest in bytes.
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Compute the plain digest of `data`.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Compute the lowercase hex digest of `data`.
    #[inline(always)]
    pub fn digest_hex(self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }

    /// Compute `HMAC(key, message)`.
    pub fn hmac(self, key: &[u8], message: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length; longer keys are hashed and shorter keys padded.
        match self {
            Self::Sha256 => Hmac::<Sha256>::new_from_slice(key)
                .expect("HMAC accepts keys of any length")
                .chain_update(message)
                .finalize()
                .into_bytes()
                .to_vec(),
            Self::Sha384 => Hmac::<Sha384>::new_from_slice(key)
                .expect("HMAC accepts keys of any length")
                .chain_update(message)
                .finalize()
                .into_bytes()
                .to_vec(),
            Self::Sha512 => Hmac::<Sha512>::new_from_slice(key)
                .expect("HMAC accepts keys of any length")
                .chain_update(message)
                .finalize()
                .into_bytes()
                .to_vec(),
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = EscherError;

    /// Resolve a hash algorithm identifier. Matching is case-insensitive.
    fn from_str(name: &str) -> Result<Self, EscherError> {
        [Self::Sha256, Self::Sha384, Self::Sha512]
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| EscherError::UnsupportedHashAlgorithm(name.to_string()))
    }
}
