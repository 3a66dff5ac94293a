use {
    crate::{
        auth::{calculate_signature, string_to_sign, EscherAuthenticator},
        auth_header::{build_auth_header, AuthElements},
        canonical::CanonicalRequest,
        chronoutil::{long_date, ParseLongDate},
        config::EscherConfig,
        constants::{HDR_HOST, QP_SIGNATURE},
        crypto::HashAlgorithm,
        presign::{append_query_params, presign_param_name, presign_params},
        request::{header_names_match, EscherRequest, Header, PresignRequest},
        signing_key::{KeyStore, SigningKey},
        EscherError,
    },
    chrono::{DateTime, Utc},
    http::{
        header::{HeaderName, HeaderValue},
        request::Request,
        uri::Uri,
    },
    log::{debug, trace},
};

/// Signs requests and presigns URLs, and authenticates signed requests, under a single [EscherConfig].
///
/// The configuration is read-only, so one `Escher` can be shared across threads.
#[derive(Clone, Debug)]
pub struct Escher {
    config: EscherConfig,
}

impl Escher {
    /// Create a new `Escher` from a configuration.
    pub fn new(config: EscherConfig) -> Self {
        Self {
            config,
        }
    }

    /// Retrieve the configuration.
    #[inline]
    pub fn config(&self) -> &EscherConfig {
        &self.config
    }

    /// Sign an HTTP request in place.
    ///
    /// The date header is set to the current time, then the headers named in `signed_headers` (plus the date header)
    /// are canonicalized along with the method, URI, and body. The resulting authorization header is added to the
    /// request. Headers not named in `signed_headers` are left on the request but are not signed.
    pub fn sign_request<B>(
        &self,
        request: &mut Request<B>,
        access_key_id: &str,
        secret: &str,
        signed_headers: &[&str],
    ) -> Result<(), EscherError>
    where
        B: AsRef<[u8]>,
    {
        let hash = self.config.hash_algorithm()?;
        let now = self.config.now();
        let date_header_name = self.config.date_header_name();

        request.headers_mut().insert(to_header_name(date_header_name)?, to_header_value(&long_date(&now))?);

        let headers: Vec<Header> = request
            .request_headers()
            .into_iter()
            .filter(|header| {
                header.is_named(date_header_name) || signed_headers.iter().any(|name| header.is_named(name))
            })
            .collect();
        let creq =
            CanonicalRequest::from_parts(request.http_method(), request.request_uri(), &headers, request.payload(), hash);
        let signature = self.signature_for(&creq, hash, secret, &now);

        let auth_header = build_auth_header(
            self.config.algo_prefix(),
            hash,
            access_key_id,
            &now,
            self.config.credential_scope(),
            creq.signed_headers(),
            &signature,
        );
        trace!("sign_request: {}: {}", self.config.auth_header_name(), auth_header);

        request.headers_mut().insert(to_header_name(self.config.auth_header_name())?, to_header_value(&auth_header)?);
        Ok(())
    }

    /// Presign a URL, valid for `expires` seconds from now.
    ///
    /// The signing parameters are appended to the URL's existing query, followed by the signature. The URL must be
    /// absolute.
    pub fn presign_url(
        &self,
        url: &str,
        access_key_id: &str,
        secret: &str,
        expires: u64,
    ) -> Result<String, EscherError> {
        let hash = self.config.hash_algorithm()?;
        let now = self.config.now();
        let vendor_key = self.config.vendor_key();

        let uri = url.parse::<Uri>().map_err(|e| EscherError::InvalidUri(format!("{}: {}", e, url)))?;
        let params = presign_params(
            self.config.algo_prefix(),
            vendor_key,
            hash,
            access_key_id,
            &now,
            self.config.credential_scope(),
            expires,
        );
        let uri = append_query_params(&uri, &params)?;

        let pseudo_request = PresignRequest::new(uri.clone())?;
        let creq = CanonicalRequest::from_request(&pseudo_request, hash);
        let signature = self.signature_for(&creq, hash, secret, &now);

        let uri = append_query_params(&uri, [(presign_param_name(vendor_key, QP_SIGNATURE), signature)])?;
        Ok(uri.to_string())
    }

    /// Check the structural preconditions of a signed request and return the access key id it claims.
    ///
    /// The `host`, date, and auth headers must be present (in that order of checking), the date header must be a
    /// valid long date, and the auth header must parse. The signature itself is not checked; use
    /// [verify][Self::verify] for that.
    pub fn authenticate<R>(&self, request: &R) -> Result<String, EscherError>
    where
        R: EscherRequest + ?Sized,
    {
        let (_, elements) = self.parse_request(request)?;
        Ok(elements.access_key_id().to_string())
    }

    /// Fully verify a signed request against the secrets in `key_store`, returning the access key id on success.
    ///
    /// In addition to the checks performed by [authenticate][Self::authenticate]:
    /// * The algorithm in the auth header must match the configured prefix and hash algorithm.
    /// * The `host` and date headers must be signed.
    /// * The credential date must match the date header, and the credential scope must match the configured scope.
    /// * The date header must be within the configured clock skew of the current time.
    /// * The access key id must be known to `key_store`.
    /// * The signature, recomputed over the signed headers, must match.
    pub fn verify<R, K>(&self, request: &R, key_store: &K) -> Result<String, EscherError>
    where
        R: EscherRequest + ?Sized,
        K: KeyStore + ?Sized,
    {
        let hash = self.config.hash_algorithm()?;
        let (timestamp, elements) = self.parse_request(request)?;

        if elements.algo_prefix() != self.config.algo_prefix() || elements.hash_algo() != hash.name() {
            debug!(
                "verify: unexpected algorithm {}-HMAC-{}; expected {}-HMAC-{}",
                elements.algo_prefix(),
                elements.hash_algo(),
                self.config.algo_prefix(),
                hash
            );
            return Err(EscherError::SignatureDoesNotMatch(Some(format!(
                "Unsupported algorithm: {}-HMAC-{}",
                elements.algo_prefix(),
                elements.hash_algo()
            ))));
        }

        for required in [HDR_HOST, self.config.date_header_name()] {
            if !elements.signed_headers().iter().any(|name| header_names_match(name, required)) {
                debug!("verify: header {} is not signed", required);
                return Err(EscherError::SignatureDoesNotMatch(Some(format!(
                    "The {} header is not signed",
                    required.to_lowercase()
                ))));
            }
        }

        let headers: Vec<Header> = request
            .request_headers()
            .into_iter()
            .filter(|header| elements.signed_headers().iter().any(|name| header.is_named(name)))
            .collect();
        let creq =
            CanonicalRequest::from_parts(request.http_method(), request.request_uri(), &headers, request.payload(), hash);

        let authenticator = EscherAuthenticator::builder()
            .algo_prefix(elements.algo_prefix())
            .hash(hash)
            .canonical_request(creq.canonical_request())
            .access_key_id(elements.access_key_id())
            .credential_date(elements.credential_date())
            .credential_scope(elements.credential_scope())
            .signature(elements.signature())
            .request_timestamp(timestamp)
            .build()
            .expect("All fields set");

        let result = authenticator.validate_signature(
            self.config.credential_scope(),
            self.config.now(),
            self.config.allowed_mismatch(),
            key_store,
        );

        if let Err(ref e) = result {
            debug!("verify: rejected request from {}: {}", elements.access_key_id(), e);
        }

        result
    }

    /// Locate the required headers, then parse the date and auth headers.
    fn parse_request<R>(&self, request: &R) -> Result<(DateTime<Utc>, AuthElements), EscherError>
    where
        R: EscherRequest + ?Sized,
    {
        let headers = request.request_headers();
        let find = |name: &str| headers.iter().rev().find(|header| header.is_named(name));

        let auth_header_name = self.config.auth_header_name();
        let date_header_name = self.config.date_header_name();

        if find(HDR_HOST).is_none() {
            return Err(EscherError::MissingRequiredHeader(HDR_HOST.to_string()));
        }

        let date_header =
            find(date_header_name).ok_or_else(|| EscherError::MissingRequiredHeader(date_header_name.to_string()))?;
        let auth_header =
            find(auth_header_name).ok_or_else(|| EscherError::MissingRequiredHeader(auth_header_name.to_string()))?;

        let timestamp = DateTime::<Utc>::parse_from_long_date(date_header.canonical_value())?;
        let elements = auth_header.canonical_value().parse::<AuthElements>()?;

        trace!("parse_request: access key id {}, timestamp {}", elements.access_key_id(), long_date(&timestamp));
        Ok((timestamp, elements))
    }

    fn signature_for(
        &self,
        creq: &CanonicalRequest,
        hash: HashAlgorithm,
        secret: &str,
        timestamp: &DateTime<Utc>,
    ) -> String {
        let algo_prefix = self.config.algo_prefix();
        let credential_scope = self.config.credential_scope();
        let sts = string_to_sign(algo_prefix, hash, timestamp, credential_scope, &creq.canonical_request());
        let signing_key = SigningKey::derive(hash, algo_prefix, secret, timestamp, credential_scope);
        calculate_signature(hash, &signing_key, &sts)
    }
}

fn to_header_name(name: &str) -> Result<HeaderName, EscherError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| EscherError::InvalidHeader(format!("Invalid header name: '{}'", name)))
}

fn to_header_value(value: &str) -> Result<HeaderValue, EscherError> {
    HeaderValue::from_str(value).map_err(|_| EscherError::InvalidHeader(format!("Invalid header value: '{}'", value)))
}
