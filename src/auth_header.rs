//! Building and parsing the Escher authorization header.
//!
//! The header has exactly one accepted shape:
//!
//! ```text
//! <prefix>-HMAC-<HASH> Credential=<accessKeyId>/<YYYYMMDD>/<scope>, SignedHeaders=<a;b;c>, Signature=<hex>
//! ```
//!
//! Anything else (reordered fields, trailing text, stray whitespace) is rejected.

use {
    crate::{
        auth::algorithm_id,
        chronoutil::short_date,
        crypto::HashAlgorithm,
        EscherError,
    },
    chrono::{DateTime, Utc},
    lazy_static::lazy_static,
    regex::Regex,
    std::{
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

lazy_static! {
    static ref AUTH_HEADER_REGEX: Regex = Regex::new(
        r"^([A-Za-z0-9_]+)-HMAC-([A-Z0-9,]+) Credential=([A-Za-z0-9_\-]+)/([0-9]{8})/([A-Za-z0-9_\-/]+), SignedHeaders=([A-Za-z\-;]+), Signature=([0-9a-f]+)$"
    )
    .unwrap();
}

/// The elements of a parsed authorization header.
///
/// Only obtainable by parsing a header that matches the grammar in full.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthElements {
    algo_prefix: String,
    hash_algo: String,
    access_key_id: String,
    credential_date: String,
    credential_scope: String,
    signed_headers: Vec<String>,
    signature: String,
}

impl AuthElements {
    /// The algorithm prefix, e.g. `ESR`.
    #[inline(always)]
    pub fn algo_prefix(&self) -> &str {
        &self.algo_prefix
    }

    /// The hash algorithm name as it appears in the header, e.g. `SHA256`.
    #[inline(always)]
    pub fn hash_algo(&self) -> &str {
        &self.hash_algo
    }

    /// The access key id claimed by the request.
    #[inline(always)]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The `YYYYMMDD` credential date.
    #[inline(always)]
    pub fn credential_date(&self) -> &str {
        &self.credential_date
    }

    /// The credential scope, e.g. `eu/host/escher_request`.
    #[inline(always)]
    pub fn credential_scope(&self) -> &str {
        &self.credential_scope
    }

    /// The signed header names, in the order they appear in the header.
    #[inline(always)]
    pub fn signed_headers(&self) -> &[String] {
        &self.signed_headers
    }

    /// The lowercase hex signature.
    #[inline(always)]
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl FromStr for AuthElements {
    type Err = EscherError;

    fn from_str(s: &str) -> Result<Self, EscherError> {
        let captures =
            AUTH_HEADER_REGEX.captures(s).ok_or_else(|| EscherError::MalformedAuthorizationHeader(s.to_string()))?;
        let group = |i: usize| captures.get(i).map(|m| m.as_str().to_string()).unwrap_or_default();

        Ok(Self {
            algo_prefix: group(1),
            hash_algo: group(2),
            access_key_id: group(3),
            credential_date: group(4),
            credential_scope: group(5),
            signed_headers: group(6).split(';').map(str::to_string).collect(),
            signature: group(7),
        })
    }
}

impl Display for AuthElements {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}-HMAC-{} Credential={}/{}/{}, SignedHeaders={}, Signature={}",
            self.algo_prefix,
            self.hash_algo,
            self.access_key_id,
            self.credential_date,
            self.credential_scope,
            self.signed_headers.join(";"),
            self.signature
        )
    }
}

/// Build the authorization header value. The signed header names are lowercased and sorted.
pub fn build_auth_header<S: AsRef<str>>(
    algo_prefix: &str,
    hash: HashAlgorithm,
    access_key_id: &str,
    timestamp: &DateTime<Utc>,
    credential_scope: &str,
    signed_headers: &[S],
    signature: &str,
) -> String {
    let mut names: Vec<String> = signed_headers.iter().map(|name| name.as_ref().to_lowercase()).collect();
    names.sort();

    format!(
        "{} Credential={}/{}/{}, SignedHeaders={}, Signature={}",
        algorithm_id(algo_prefix, hash),
        access_key_id,
        short_date(timestamp),
        credential_scope,
        names.join(";"),
        signature
    )
}
