//! Presigned URL parameters.
//!
//! A presigned URL carries the signing parameters in its query string instead of a header. Each parameter name is
//! prefixed with `X-<vendorKey>-`, e.g. `X-Escher-Algorithm`.

use {
    crate::{
        auth::algorithm_id,
        canonical::percent_encode,
        chronoutil::{long_date, short_date},
        constants::{HDR_HOST, QP_ALGORITHM, QP_CREDENTIALS, QP_DATE, QP_EXPIRES, QP_SIGNED_HEADERS},
        crypto::HashAlgorithm,
        EscherError,
    },
    chrono::{DateTime, Utc},
    http::uri::Uri,
    std::collections::BTreeMap,
};

/// Return the full name of a presigned URL parameter, e.g. `X-Escher-Signature`.
#[inline]
pub fn presign_param_name(vendor_key: &str, param: &str) -> String {
    format!("X-{}-{}", vendor_key, param)
}

/// Build the presigned URL parameters, keyed by their full (prefixed) name. Iteration order is sorted by name.
pub fn presign_params(
    algo_prefix: &str,
    vendor_key: &str,
    hash: HashAlgorithm,
    access_key_id: &str,
    timestamp: &DateTime<Utc>,
    credential_scope: &str,
    expires: u64,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert(presign_param_name(vendor_key, QP_ALGORITHM), algorithm_id(algo_prefix, hash));
    params.insert(
        presign_param_name(vendor_key, QP_CREDENTIALS),
        format!("{}/{}/{}", access_key_id, short_date(timestamp), credential_scope),
    );
    params.insert(presign_param_name(vendor_key, QP_DATE), long_date(timestamp));
    params.insert(presign_param_name(vendor_key, QP_EXPIRES), expires.to_string());
    params.insert(presign_param_name(vendor_key, QP_SIGNED_HEADERS), HDR_HOST.to_string());
    params
}

/// Append `params` to the query string of `uri`, keeping any existing query parameters. Names and values are
/// percent-encoded.
///
/// The URI must be absolute.
pub fn append_query_params<I, K, V>(uri: &Uri, params: I) -> Result<Uri, EscherError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let (scheme, authority) = match (uri.scheme_str(), uri.authority()) {
        (Some(scheme), Some(authority)) => (scheme, authority),
        _ => return Err(EscherError::InvalidUri(format!("URI is not absolute: {}", uri))),
    };

    let mut query = uri.query().unwrap_or("").to_string();
    for (name, value) in params {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&percent_encode(name.as_ref()));
        query.push('=');
        query.push_str(&percent_encode(value.as_ref()));
    }

    let result = format!("{}://{}{}?{}", scheme, authority, uri.path(), query);
    result.parse::<Uri>().map_err(|e| EscherError::InvalidUri(format!("{}: {}", e, result)))
}
