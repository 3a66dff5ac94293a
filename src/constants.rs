//! Common constants used throughout the crate.
//!
//! Tests that are testing the content of an error code or message should not use these constants;
//! they should use hard-coded strings so the tests are also testing for misspellings.
//!
//! Please keep this file organized alphabetically. (This can be a bit hard with comments, etc.)

/// Separator between the algorithm prefix and the hash algorithm name, e.g. `ESR-HMAC-SHA256`.
pub(crate) const ALGORITHM_INFIX: &str = "-HMAC-";

/// Default algorithm prefix.
pub(crate) const DEFAULT_ALGO_PREFIX: &str = "ESR";

/// Default name of the header carrying the authorization elements.
pub(crate) const DEFAULT_AUTH_HEADER_NAME: &str = "X-Escher-Auth";

/// Default allowed timestamp mismatch in seconds.
pub(crate) const DEFAULT_CLOCK_SKEW_SECONDS: u32 = 900;

/// Default name of the header carrying the request timestamp.
pub(crate) const DEFAULT_DATE_HEADER_NAME: &str = "X-Escher-Date";

/// Default hash algorithm name.
pub(crate) const DEFAULT_HASH_ALGO: &str = "SHA256";

/// Default vendor key, used to build presigned URL parameter names.
pub(crate) const DEFAULT_VENDOR_KEY: &str = "Escher";

/// Error code: InvalidAccessKeyId
pub(crate) const ERR_CODE_INVALID_ACCESS_KEY_ID: &str = "InvalidAccessKeyId";

/// Error code: InvalidDateFormat
pub(crate) const ERR_CODE_INVALID_DATE_FORMAT: &str = "InvalidDateFormat";

/// Error code: InvalidHeader
pub(crate) const ERR_CODE_INVALID_HEADER: &str = "InvalidHeader";

/// Error code: InvalidUri
pub(crate) const ERR_CODE_INVALID_URI: &str = "InvalidUri";

/// Error code: MalformedAuthorizationHeader
pub(crate) const ERR_CODE_MALFORMED_AUTHORIZATION_HEADER: &str = "MalformedAuthorizationHeader";

/// Error code: MissingRequiredHeader
pub(crate) const ERR_CODE_MISSING_REQUIRED_HEADER: &str = "MissingRequiredHeader";

/// Error code: SignatureDoesNotMatch
pub(crate) const ERR_CODE_SIGNATURE_DOES_NOT_MATCH: &str = "SignatureDoesNotMatch";

/// Error code: UnsupportedHashAlgorithm
pub(crate) const ERR_CODE_UNSUPPORTED_HASH_ALGORITHM: &str = "UnsupportedHashAlgorithm";

/// Header for `host`
pub(crate) const HDR_HOST: &str = "host";

/// Uppercase hex digits.
pub(crate) const HEX_DIGITS_UPPER: [u8; 16] =
    [b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'A', b'B', b'C', b'D', b'E', b'F'];

/// Compact ISO8601 format used for the request timestamp and the string to sign.
pub(crate) const LONG_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Error message: `"The request signature we calculated does not match the signature you provided."`
pub(crate) const MSG_REQUEST_SIGNATURE_MISMATCH: &str =
    "The request signature we calculated does not match the signature you provided. Check your secret key and signing method.";

/// Method used for the pseudo-request of a presigned URL.
pub(crate) const PRESIGN_METHOD: &str = "GET";

/// Presigned URL parameter for the signature algorithm
pub(crate) const QP_ALGORITHM: &str = "Algorithm";

/// Presigned URL parameter for the credentials (`accessKeyId/shortDate/credentialScope`)
pub(crate) const QP_CREDENTIALS: &str = "Credentials";

/// Presigned URL parameter for the request timestamp
pub(crate) const QP_DATE: &str = "Date";

/// Presigned URL parameter for the expiration, in seconds
pub(crate) const QP_EXPIRES: &str = "Expires";

/// Presigned URL parameter for the signature
pub(crate) const QP_SIGNATURE: &str = "Signature";

/// Presigned URL parameter for the signed headers
pub(crate) const QP_SIGNED_HEADERS: &str = "SignedHeaders";

/// SHA-256 of an empty string.
#[cfg(test)]
pub(crate) const SHA256_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Short date format used in the credential scope.
pub(crate) const SHORT_DATE_FORMAT: &str = "%Y%m%d";

/// Token hashed in place of the body when there is no payload to sign.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
