use {
    crate::{
        clock::{Clock, FixedClock, SystemClock},
        constants::{
            DEFAULT_ALGO_PREFIX, DEFAULT_AUTH_HEADER_NAME, DEFAULT_CLOCK_SKEW_SECONDS, DEFAULT_DATE_HEADER_NAME,
            DEFAULT_HASH_ALGO, DEFAULT_VENDOR_KEY,
        },
        crypto::HashAlgorithm,
        EscherError,
    },
    chrono::{DateTime, Duration, Utc},
    derive_builder::Builder,
    http::header::HeaderName,
    lazy_static::lazy_static,
    regex::Regex,
    std::sync::Arc,
};

lazy_static! {
    /// Characters the auth header grammar accepts in an algorithm prefix.
    static ref ALGO_PREFIX_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();

    /// Characters the auth header grammar accepts in a credential scope.
    static ref CREDENTIAL_SCOPE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_\-/]+$").unwrap();
}

/// Settings shared by every signing and verification call.
///
/// EscherConfig structs are immutable. Use [`EscherConfigBuilder`] to construct one; every field except the
/// credential scope has a default.
#[derive(Builder, Clone, Debug)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct EscherConfig {
    /// The algorithm prefix, e.g. `ESR` in `ESR-HMAC-SHA256`. Also prepended to the secret when deriving keys.
    #[builder(setter(into), default = "DEFAULT_ALGO_PREFIX.to_string()")]
    algo_prefix: String,

    /// The vendor key used in presigned URL parameter names, e.g. `Escher` in `X-Escher-Signature`.
    #[builder(setter(into), default = "DEFAULT_VENDOR_KEY.to_string()")]
    vendor_key: String,

    /// The hash algorithm name, e.g. `SHA256`. Resolved when an operation runs.
    #[builder(setter(into), default = "DEFAULT_HASH_ALGO.to_string()")]
    hash_algo: String,

    /// The `/`-separated credential scope, e.g. `eu/host/escher_request`.
    #[builder(setter(into))]
    credential_scope: String,

    /// Name of the header carrying the authorization elements.
    #[builder(setter(into), default = "DEFAULT_AUTH_HEADER_NAME.to_string()")]
    auth_header_name: String,

    /// Name of the header carrying the request timestamp.
    #[builder(setter(into), default = "DEFAULT_DATE_HEADER_NAME.to_string()")]
    date_header_name: String,

    /// Allowed difference between the request timestamp and the verifier's clock, in seconds.
    #[builder(default = "DEFAULT_CLOCK_SKEW_SECONDS")]
    clock_skew: u32,

    /// The time source.
    #[builder(setter(custom), default = "Arc::new(SystemClock)")]
    clock: Arc<dyn Clock>,
}

impl EscherConfig {
    /// Create an [EscherConfigBuilder] to construct an [EscherConfig].
    #[inline]
    pub fn builder() -> EscherConfigBuilder {
        EscherConfigBuilder::default()
    }

    /// Retrieve the algorithm prefix.
    #[inline]
    pub fn algo_prefix(&self) -> &str {
        &self.algo_prefix
    }

    /// Retrieve the vendor key.
    #[inline]
    pub fn vendor_key(&self) -> &str {
        &self.vendor_key
    }

    /// Retrieve the hash algorithm name as configured.
    #[inline]
    pub fn hash_algo(&self) -> &str {
        &self.hash_algo
    }

    /// Retrieve the credential scope.
    #[inline]
    pub fn credential_scope(&self) -> &str {
        &self.credential_scope
    }

    /// Retrieve the auth header name.
    #[inline]
    pub fn auth_header_name(&self) -> &str {
        &self.auth_header_name
    }

    /// Retrieve the date header name.
    #[inline]
    pub fn date_header_name(&self) -> &str {
        &self.date_header_name
    }

    /// Retrieve the allowed clock skew, in seconds.
    #[inline]
    pub fn clock_skew(&self) -> u32 {
        self.clock_skew
    }

    /// Retrieve the allowed clock skew as a [Duration].
    #[inline]
    pub fn allowed_mismatch(&self) -> Duration {
        Duration::seconds(i64::from(self.clock_skew))
    }

    /// Read the configured clock.
    #[inline]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Resolve the configured hash algorithm name.
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm, EscherError> {
        self.hash_algo.parse()
    }
}

impl EscherConfigBuilder {
    /// Use `clock` as the time source.
    pub fn clock<C: Clock + 'static>(&mut self, clock: C) -> &mut Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Pin the time source to `instant`.
    pub fn current_time(&mut self, instant: DateTime<Utc>) -> &mut Self {
        self.clock(FixedClock::new(instant))
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(scope) = &self.credential_scope {
            if scope.is_empty() {
                return Err("credential_scope must not be empty".to_string());
            }

            if !CREDENTIAL_SCOPE_REGEX.is_match(scope) {
                return Err(format!("Invalid credential_scope: '{}'", scope));
            }
        }

        if let Some(prefix) = &self.algo_prefix {
            if prefix.is_empty() {
                return Err("algo_prefix must not be empty".to_string());
            }

            if !ALGO_PREFIX_REGEX.is_match(prefix) {
                return Err(format!("Invalid algo_prefix: '{}'", prefix));
            }
        }

        if let Some(vendor_key) = &self.vendor_key {
            if vendor_key.is_empty() {
                return Err("vendor_key must not be empty".to_string());
            }
        }

        for name in [&self.auth_header_name, &self.date_header_name].into_iter().flatten() {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(format!("Invalid header name: '{}'", name));
            }
        }

        Ok(())
    }
}
