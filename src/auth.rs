//! Escher signature calculation and validation routines.
//!
//! **Stability of this module is not guaranteed except for items exposed at the crate root**.
//! The functions and types are subject to change in minor/patch versions. This is exposed for
//! testing purposes only.

use {
    crate::{
        chronoutil::{long_date, short_date},
        constants::{ALGORITHM_INFIX, LONG_DATE_FORMAT, MSG_REQUEST_SIGNATURE_MISMATCH},
        crypto::HashAlgorithm,
        signing_key::{KeyStore, SigningKey},
        EscherError,
    },
    chrono::{DateTime, Duration, Utc},
    derive_builder::Builder,
    log::{debug, trace},
    qualifier_attr::qualifiers,
    std::fmt::{Debug, Formatter, Result as FmtResult},
    subtle::ConstantTimeEq,
};

/// Return the algorithm identifier, e.g. `ESR-HMAC-SHA256`.
pub fn algorithm_id(algo_prefix: &str, hash: HashAlgorithm) -> String {
    format!("{}{}{}", algo_prefix, ALGORITHM_INFIX, hash.name())
}

/// Return the string to sign for a canonical request:
///
/// ```text
/// <prefix>-HMAC-<HASH> \n LongDate \n ShortDate/credentialScope \n hex(hash(canonicalRequest))
/// ```
pub fn string_to_sign(
    algo_prefix: &str,
    hash: HashAlgorithm,
    timestamp: &DateTime<Utc>,
    credential_scope: &str,
    canonical_request: &str,
) -> String {
    let result = format!(
        "{}\n{}\n{}/{}\n{}",
        algorithm_id(algo_prefix, hash),
        long_date(timestamp),
        short_date(timestamp),
        credential_scope,
        hash.digest_hex(canonical_request.as_bytes())
    );

    trace!("String to sign:\n{}", result);
    result
}

/// Return the lowercase hex signature, `hex(HMAC(signingKey, stringToSign))`.
pub fn calculate_signature(hash: HashAlgorithm, signing_key: &SigningKey, string_to_sign: &str) -> String {
    hex::encode(hash.hmac(signing_key.as_ref(), string_to_sign.as_bytes()))
}

/// Low-level structure for performing Escher authentication after a canonical request has been generated.
#[derive(Builder, Clone)]
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[builder(derive(Debug))]
pub struct EscherAuthenticator {
    /// The algorithm prefix, e.g. `ESR`.
    #[builder(setter(into))]
    algo_prefix: String,

    /// The hash algorithm used for the canonical request digest and the HMAC chain.
    hash: HashAlgorithm,

    /// The canonical request string.
    #[builder(setter(into))]
    canonical_request: String,

    /// The access key id passed in the credential.
    #[builder(setter(into))]
    access_key_id: String,

    /// The `YYYYMMDD` date passed in the credential. This must match the request timestamp's date.
    #[builder(setter(into))]
    credential_date: String,

    /// The credential scope passed in the credential, without the access key id and date.
    #[builder(setter(into))]
    credential_scope: String,

    /// The signature passed into the request.
    #[builder(setter(into))]
    signature: String,

    /// The timestamp of the request, from the date header.
    request_timestamp: DateTime<Utc>,
}

impl EscherAuthenticator {
    /// Create a builder for `EscherAuthenticator`.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn builder() -> EscherAuthenticatorBuilder {
        EscherAuthenticatorBuilder::default()
    }

    /// Retrieve the access key id passed in the credential.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Retrieve the signature passed into the request.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn signature(&self) -> &str {
        &self.signature
    }

    /// Retrieve the timestamp of the request.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    #[inline(always)]
    fn request_timestamp(&self) -> DateTime<Utc> {
        self.request_timestamp
    }

    /// Verify the request parameters make sense for the credential scope and the server timestamp.
    /// This must be called successfully before calling [validate_signature][Self::validate_signature].
    ///
    /// The request timestamp is accepted when `|request - server| <= allowed_mismatch`.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn prevalidate(
        &self,
        credential_scope: &str,
        server_timestamp: DateTime<Utc>,
        allowed_mismatch: Duration,
    ) -> Result<(), EscherError> {
        let req_ts = self.request_timestamp();
        let min_ts = server_timestamp.checked_sub_signed(allowed_mismatch).unwrap_or(server_timestamp);
        let max_ts = server_timestamp.checked_add_signed(allowed_mismatch).unwrap_or(server_timestamp);

        if req_ts < min_ts {
            trace!("prevalidate: request timestamp {} is before minimum timestamp {}", req_ts, min_ts);
            return Err(EscherError::SignatureDoesNotMatch(Some(format!(
                "Signature expired: {} is now earlier than {} ({} - {}.)",
                req_ts.format(LONG_DATE_FORMAT),
                min_ts.format(LONG_DATE_FORMAT),
                server_timestamp.format(LONG_DATE_FORMAT),
                duration_to_string(allowed_mismatch)
            ))));
        }

        if req_ts > max_ts {
            trace!("prevalidate: request timestamp {} is after maximum timestamp {}", req_ts, max_ts);
            return Err(EscherError::SignatureDoesNotMatch(Some(format!(
                "Signature not yet current: {} is still later than {} ({} + {}.)",
                req_ts.format(LONG_DATE_FORMAT),
                max_ts.format(LONG_DATE_FORMAT),
                server_timestamp.format(LONG_DATE_FORMAT),
                duration_to_string(allowed_mismatch)
            ))));
        }

        let mut cscope_errors = Vec::new();
        let expected_date = short_date(&req_ts);
        if self.credential_date != expected_date {
            trace!(
                "prevalidate: credential date '{}' does not match expected date '{}'",
                self.credential_date,
                expected_date
            );
            cscope_errors.push(format!(
                "Date in Credential does not match YYYYMMDD from the date header: '{}' != '{}', from '{}'.",
                self.credential_date,
                expected_date,
                long_date(&req_ts)
            ));
        }

        if self.credential_scope != credential_scope {
            trace!(
                "prevalidate: credential scope '{}' does not match expected scope '{}'",
                self.credential_scope,
                credential_scope
            );
            cscope_errors.push(format!(
                "Credential should be scoped to '{}', not '{}'.",
                credential_scope, self.credential_scope
            ));
        }

        if !cscope_errors.is_empty() {
            return Err(EscherError::SignatureDoesNotMatch(Some(cscope_errors.join(" "))));
        }

        Ok(())
    }

    /// Return the string to sign for the request.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn string_to_sign(&self) -> String {
        string_to_sign(
            &self.algo_prefix,
            self.hash,
            &self.request_timestamp,
            &self.credential_scope,
            &self.canonical_request,
        )
    }

    /// Look up the secret for the access key id and derive the signing key.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn get_signing_key<K>(&self, key_store: &K) -> Result<SigningKey, EscherError>
    where
        K: KeyStore + ?Sized,
    {
        match key_store.secret(self.access_key_id()) {
            Some(secret) => {
                trace!("get_signing_key: got secret for {}", self.access_key_id());
                Ok(SigningKey::derive(
                    self.hash,
                    &self.algo_prefix,
                    &secret,
                    &self.request_timestamp,
                    &self.credential_scope,
                ))
            }
            None => {
                debug!("get_signing_key: unknown access key id {}", self.access_key_id());
                Err(EscherError::InvalidAccessKeyId(self.access_key_id().to_string()))
            }
        }
    }

    /// Validate the request signature. On success, the access key id is returned.
    #[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
    #[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
    fn validate_signature<K>(
        &self,
        credential_scope: &str,
        server_timestamp: DateTime<Utc>,
        allowed_mismatch: Duration,
        key_store: &K,
    ) -> Result<String, EscherError>
    where
        K: KeyStore + ?Sized,
    {
        self.prevalidate(credential_scope, server_timestamp, allowed_mismatch)?;
        let string_to_sign = self.string_to_sign();
        let signing_key = self.get_signing_key(key_store)?;
        let expected_signature = calculate_signature(self.hash, &signing_key, &string_to_sign);
        let is_equal: bool = self.signature().as_bytes().ct_eq(expected_signature.as_bytes()).into();
        if !is_equal {
            trace!("Signature mismatch: expected '{}', got '{}'", expected_signature, self.signature());
            Err(EscherError::SignatureDoesNotMatch(Some(MSG_REQUEST_SIGNATURE_MISMATCH.to_string())))
        } else {
            Ok(self.access_key_id().to_string())
        }
    }
}

impl Debug for EscherAuthenticator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("EscherAuthenticator")
            .field("algo_prefix", &self.algo_prefix)
            .field("hash", &self.hash)
            .field("access_key_id", &self.access_key_id)
            .field("credential_date", &self.credential_date)
            .field("credential_scope", &self.credential_scope)
            .field("signature", &self.signature)
            .field("request_timestamp", &self.request_timestamp)
            .finish()
    }
}

fn duration_to_string(duration: Duration) -> String {
    let secs = duration.num_seconds();
    if secs % 60 == 0 {
        format!("{} min", duration.num_minutes())
    } else {
        format!("{} sec", secs)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{algorithm_id, calculate_signature, duration_to_string, string_to_sign, EscherAuthenticator},
        crate::{crypto::HashAlgorithm, signing_key::SigningKey, EscherError},
        chrono::{DateTime, Duration, NaiveDate, Utc},
        std::collections::HashMap,
    };

    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
    const SCOPE: &str = "us-east-1/host/aws4_request";
    const CANONICAL: &str =
        "GET\n/\n\nhost:host.foo.com\n\nhost\ne3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn timestamp() -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(
            NaiveDate::from_ymd_opt(2011, 9, 9).unwrap().and_hms_opt(23, 36, 0).unwrap(),
            Utc,
        )
    }

    fn key_store() -> HashMap<String, String> {
        let mut keys = HashMap::new();
        keys.insert("AKIDEXAMPLE".to_string(), SECRET.to_string());
        keys
    }

    fn authenticator(signature: &str) -> EscherAuthenticator {
        EscherAuthenticator::builder()
            .algo_prefix("AWS4")
            .hash(HashAlgorithm::Sha256)
            .canonical_request(CANONICAL)
            .access_key_id("AKIDEXAMPLE")
            .credential_date("20110909")
            .credential_scope(SCOPE)
            .signature(signature)
            .request_timestamp(timestamp())
            .build()
            .unwrap()
    }

    #[test_log::test]
    fn test_algorithm_id() {
        assert_eq!(algorithm_id("ESR", HashAlgorithm::Sha256), "ESR-HMAC-SHA256");
        assert_eq!(algorithm_id("AWS4", HashAlgorithm::Sha512), "AWS4-HMAC-SHA512");
    }

    #[test_log::test]
    fn test_string_to_sign() {
        assert_eq!(
            string_to_sign("AWS4", HashAlgorithm::Sha256, &timestamp(), SCOPE, CANONICAL),
            "AWS4-HMAC-SHA256\n20110909T233600Z\n20110909/us-east-1/host/aws4_request\n657d3f7e1b663d9636b2b7f7cc5cdbe39753c61c4c3e8b35171926498d8d59d4"
        );
        assert_eq!(
            string_to_sign("ESR", HashAlgorithm::Sha256, &timestamp(), SCOPE, CANONICAL),
            "ESR-HMAC-SHA256\n20110909T233600Z\n20110909/us-east-1/host/aws4_request\n657d3f7e1b663d9636b2b7f7cc5cdbe39753c61c4c3e8b35171926498d8d59d4"
        );
    }

    #[test_log::test]
    fn test_calculate_signature() {
        let sts = string_to_sign("AWS4", HashAlgorithm::Sha256, &timestamp(), SCOPE, CANONICAL);
        let key = SigningKey::derive(HashAlgorithm::Sha256, "AWS4", SECRET, &timestamp(), SCOPE);
        assert_eq!(
            calculate_signature(HashAlgorithm::Sha256, &key, &sts),
            "b5e852346e37f475dae8fdb2600aac8eef1d857b7f443d56efd694826875048c"
        );

        let sts = string_to_sign("ESR", HashAlgorithm::Sha256, &timestamp(), SCOPE, CANONICAL);
        let key = SigningKey::derive(HashAlgorithm::Sha256, "ESR", SECRET, &timestamp(), SCOPE);
        assert_eq!(
            calculate_signature(HashAlgorithm::Sha256, &key, &sts),
            "15d8b396cc51ac316a236576b6179220afa35a7210e3779d5d0047fd8e796cf3"
        );
    }

    #[test_log::test]
    fn test_validate_signature() {
        let auth = authenticator("b5e852346e37f475dae8fdb2600aac8eef1d857b7f443d56efd694826875048c");
        let id = auth.validate_signature(SCOPE, timestamp(), Duration::seconds(900), &key_store()).unwrap();
        assert_eq!(id, "AKIDEXAMPLE");

        let auth = authenticator("b5e852346e37f475dae8fdb2600aac8eef1d857b7f443d56efd694826875048d");
        match auth.validate_signature(SCOPE, timestamp(), Duration::seconds(900), &key_store()) {
            Err(EscherError::SignatureDoesNotMatch(Some(msg))) => {
                assert!(msg.starts_with("The request signature we calculated does not match"))
            }
            other => panic!("Expected SignatureDoesNotMatch; got {:?}", other),
        }

        // Truncated signatures never match.
        let auth = authenticator("b5e852346e37f475");
        assert!(auth.validate_signature(SCOPE, timestamp(), Duration::seconds(900), &key_store()).is_err());
    }

    #[test_log::test]
    fn test_unknown_access_key() {
        let auth = authenticator("b5e852346e37f475dae8fdb2600aac8eef1d857b7f443d56efd694826875048c");
        match auth.validate_signature(SCOPE, timestamp(), Duration::seconds(900), &HashMap::<String, String>::new()) {
            Err(EscherError::InvalidAccessKeyId(id)) => assert_eq!(id, "AKIDEXAMPLE"),
            other => panic!("Expected InvalidAccessKeyId; got {:?}", other),
        }
    }

    #[test_log::test]
    fn test_prevalidate_skew() {
        let auth = authenticator("00");
        let skew = Duration::seconds(900);

        auth.prevalidate(SCOPE, timestamp(), skew).unwrap();
        auth.prevalidate(SCOPE, timestamp() + skew, skew).unwrap();
        auth.prevalidate(SCOPE, timestamp() - skew, skew).unwrap();

        match auth.prevalidate(SCOPE, timestamp() + Duration::seconds(901), skew) {
            Err(EscherError::SignatureDoesNotMatch(Some(msg))) => assert_eq!(
                msg,
                "Signature expired: 20110909T233600Z is now earlier than 20110909T233601Z (20110909T235101Z - 15 min.)"
            ),
            other => panic!("Expected SignatureDoesNotMatch; got {:?}", other),
        }

        match auth.prevalidate(SCOPE, timestamp() - Duration::seconds(901), skew) {
            Err(EscherError::SignatureDoesNotMatch(Some(msg))) => assert_eq!(
                msg,
                "Signature not yet current: 20110909T233600Z is still later than 20110909T233559Z (20110909T232059Z + 15 min.)"
            ),
            other => panic!("Expected SignatureDoesNotMatch; got {:?}", other),
        }
    }

    #[test_log::test]
    fn test_prevalidate_scope() {
        let auth = authenticator("00");
        match auth.prevalidate("eu-west-1/host/aws4_request", timestamp(), Duration::seconds(900)) {
            Err(EscherError::SignatureDoesNotMatch(Some(msg))) => assert_eq!(
                msg,
                "Credential should be scoped to 'eu-west-1/host/aws4_request', not 'us-east-1/host/aws4_request'."
            ),
            other => panic!("Expected SignatureDoesNotMatch; got {:?}", other),
        }

        let auth = EscherAuthenticator::builder()
            .algo_prefix("ESR")
            .hash(HashAlgorithm::Sha256)
            .canonical_request(CANONICAL)
            .access_key_id("AKIDEXAMPLE")
            .credential_date("20110908")
            .credential_scope(SCOPE)
            .signature("00")
            .request_timestamp(timestamp())
            .build()
            .unwrap();
        match auth.prevalidate(SCOPE, timestamp(), Duration::seconds(900)) {
            Err(EscherError::SignatureDoesNotMatch(Some(msg))) => assert_eq!(
                msg,
                "Date in Credential does not match YYYYMMDD from the date header: '20110908' != '20110909', from '20110909T233600Z'."
            ),
            other => panic!("Expected SignatureDoesNotMatch; got {:?}", other),
        }
    }

    #[test_log::test]
    fn test_duration_formatting() {
        assert_eq!(duration_to_string(Duration::seconds(900)), "15 min");
        assert_eq!(duration_to_string(Duration::seconds(61)), "61 sec");
    }

    #[test_log::test]
    fn test_debug_and_builder() {
        let auth = authenticator("abcd");
        let debug = format!("{:?}", auth);
        assert!(debug.starts_with("EscherAuthenticator {"));
        assert!(debug.contains("AKIDEXAMPLE"));

        let err = EscherAuthenticator::builder().hash(HashAlgorithm::Sha256).build().unwrap_err();
        assert_eq!(err.to_string(), "`algo_prefix` must be initialized");
    }
}
