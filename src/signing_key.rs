use {
    crate::{chronoutil::short_date, crypto::HashAlgorithm},
    chrono::{DateTime, Utc},
    log::trace,
    std::{
        collections::{BTreeMap, HashMap},
        fmt::{Debug, Display, Formatter, Result as FmtResult},
        hash::BuildHasher,
    },
};

/// The derived key used to sign the string to sign.
///
/// `key = HMAC(algoPrefix + secret, shortDate)`, then `key = HMAC(key, segment)` for each `/`-separated segment of
/// the credential scope, in order.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    /// The resulting raw signing key.
    key: Vec<u8>,
}

impl SigningKey {
    /// Derive a signing key from a secret, the request date, and the credential scope.
    pub fn derive(
        hash: HashAlgorithm,
        algo_prefix: &str,
        secret: &str,
        date: &DateTime<Utc>,
        credential_scope: &str,
    ) -> Self {
        let mut prefixed_secret = Vec::with_capacity(algo_prefix.len() + secret.len());
        prefixed_secret.extend_from_slice(algo_prefix.as_bytes());
        prefixed_secret.extend_from_slice(secret.as_bytes());

        let mut key = hash.hmac(&prefixed_secret, short_date(date).as_bytes());
        for segment in credential_scope.split('/') {
            key = hash.hmac(&key, segment.as_bytes());
        }

        trace!("Derived {} signing key for scope {}", hash, credential_scope);

        Self {
            key,
        }
    }
}

impl AsRef<[u8]> for SigningKey {
    fn as_ref(&self) -> &[u8] {
        &self.key
    }
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("SigningKey")
    }
}

impl Display for SigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("SigningKey")
    }
}

/// A lookup from access key id to secret, consulted when verifying a request.
///
/// Implemented for maps of strings and, through [`key_store_fn`], for plain functions. If you need to encapsulate
/// additional data (e.g. a database connection) to look up a secret, implement this on a struct.
pub trait KeyStore {
    /// Return the secret for `access_key_id`, or `None` if the key is unknown.
    fn secret(&self, access_key_id: &str) -> Option<String>;
}

impl<S: BuildHasher> KeyStore for HashMap<String, String, S> {
    fn secret(&self, access_key_id: &str) -> Option<String> {
        self.get(access_key_id).cloned()
    }
}

impl KeyStore for BTreeMap<String, String> {
    fn secret(&self, access_key_id: &str) -> Option<String> {
        self.get(access_key_id).cloned()
    }
}

impl<K: KeyStore + ?Sized> KeyStore for &K {
    fn secret(&self, access_key_id: &str) -> Option<String> {
        (**self).secret(access_key_id)
    }
}

/// A [`KeyStore`] backed by a function. Created by [`key_store_fn`].
#[derive(Clone, Copy)]
pub struct KeyStoreFn<F> {
    f: F,
}

impl<F> Debug for KeyStoreFn<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("KeyStoreFn")
    }
}

impl<F> KeyStore for KeyStoreFn<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn secret(&self, access_key_id: &str) -> Option<String> {
        (self.f)(access_key_id)
    }
}

/// Create a [`KeyStore`] that wraps a function that can produce a secret.
pub fn key_store_fn<F>(f: F) -> KeyStoreFn<F>
where
    F: Fn(&str) -> Option<String>,
{
    KeyStoreFn {
        f,
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{key_store_fn, KeyStore, SigningKey},
        crate::crypto::HashAlgorithm,
        chrono::{DateTime, Duration, NaiveDate, Utc},
        std::collections::{BTreeMap, HashMap},
    };

    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
    const SCOPE: &str = "us-east-1/host/aws4_request";

    fn date() -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(
            NaiveDate::from_ymd_opt(2011, 9, 9).unwrap().and_hms_opt(23, 36, 0).unwrap(),
            Utc,
        )
    }

    #[test_log::test]
    fn test_signing_key_derived() {
        let key = SigningKey::derive(HashAlgorithm::Sha256, "AWS4", SECRET, &date(), SCOPE);
        assert_eq!(hex::encode(key.as_ref()), "e220a8ee99f059729066fd06efe5c0f949d6aa8973360d189dd0e0eddd7a9596");

        let key = SigningKey::derive(HashAlgorithm::Sha256, "ESR", SECRET, &date(), SCOPE);
        assert_eq!(hex::encode(key.as_ref()), "72ab4844840f6b815b8eaefb1410d9daf5d1941742a3f23032821cad7376180c");

        let key = SigningKey::derive(HashAlgorithm::Sha512, "ESR", SECRET, &date(), SCOPE);
        assert_eq!(key.as_ref().len(), 64);
    }

    #[test_log::test]
    fn test_signing_key_inputs() {
        let base = SigningKey::derive(HashAlgorithm::Sha256, "ESR", SECRET, &date(), SCOPE);
        assert_eq!(base, SigningKey::derive(HashAlgorithm::Sha256, "ESR", SECRET, &date(), SCOPE));

        // Only the calendar date participates.
        let later = date() - Duration::hours(1);
        assert_eq!(base, SigningKey::derive(HashAlgorithm::Sha256, "ESR", SECRET, &later, SCOPE));

        let next_day = date() + Duration::hours(1);
        assert_ne!(base, SigningKey::derive(HashAlgorithm::Sha256, "ESR", SECRET, &next_day, SCOPE));
        assert_ne!(base, SigningKey::derive(HashAlgorithm::Sha256, "AWS4", SECRET, &date(), SCOPE));
        assert_ne!(base, SigningKey::derive(HashAlgorithm::Sha256, "ESR", "other", &date(), SCOPE));
        assert_ne!(base, SigningKey::derive(HashAlgorithm::Sha256, "ESR", SECRET, &date(), "eu/host/aws4_request"));
    }

    #[test_log::test]
    fn test_signing_key_redacted() {
        let key = SigningKey::derive(HashAlgorithm::Sha256, "ESR", SECRET, &date(), SCOPE);
        assert_eq!(format!("{}", key), "SigningKey");
        assert_eq!(format!("{:?}", key), "SigningKey");
    }

    #[test_log::test]
    fn test_key_stores() {
        let mut hash_map = HashMap::new();
        hash_map.insert("AKIDEXAMPLE".to_string(), SECRET.to_string());
        assert_eq!(hash_map.secret("AKIDEXAMPLE").as_deref(), Some(SECRET));
        assert_eq!(hash_map.secret("AKIDOTHER"), None);

        let mut btree_map = BTreeMap::new();
        btree_map.insert("AKIDEXAMPLE".to_string(), SECRET.to_string());
        assert_eq!((&btree_map).secret("AKIDEXAMPLE").as_deref(), Some(SECRET));

        let store = key_store_fn(|id: &str| (id == "AKIDEXAMPLE").then(|| SECRET.to_string()));
        assert_eq!(store.secret("AKIDEXAMPLE").as_deref(), Some(SECRET));
        assert_eq!(store.secret("akidexample"), None);
        assert_eq!(format!("{:?}", store), "KeyStoreFn");
    }
}
