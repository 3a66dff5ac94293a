use {
    crate::constants::*,
    http::status::StatusCode,
    scratchstack_errors::ServiceError,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    },
};

/// Error returned when signing a request or authenticating an Escher-signed request fails.
///
/// Errors never carry secrets or derived key material; they carry only the offending input (a header name, a
/// date string, a URL) so the caller can log and reject the request.
#[derive(Debug)]
#[non_exhaustive]
pub enum EscherError {
    /// The access key id named in the authorization header is not known to the key store.
    InvalidAccessKeyId(/* access key id */ String),

    /// The date header value is not in `YYYYMMDD'T'HHMMSS'Z'` format.
    InvalidDateFormat(/* offending value */ String),

    /// A header name or value cannot be represented on an HTTP request.
    InvalidHeader(/* message */ String),

    /// The URL to presign is not an absolute URI, or the resulting URI could not be built.
    InvalidUri(/* message */ String),

    /// The authorization header does not match the Escher authorization header grammar.
    MalformedAuthorizationHeader(/* offending value */ String),

    /// The request is missing a required header.
    MissingRequiredHeader(/* header name */ String),

    /// Signature did not match the calculated signature value, or the request was signed outside of the allowed
    /// clock skew or for a different credential scope.
    SignatureDoesNotMatch(Option</* message */ String>),

    /// The configured hash algorithm is not supported.
    UnsupportedHashAlgorithm(/* algorithm name */ String),
}

impl EscherError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAccessKeyId(_) => ERR_CODE_INVALID_ACCESS_KEY_ID,
            Self::InvalidDateFormat(_) => ERR_CODE_INVALID_DATE_FORMAT,
            Self::InvalidHeader(_) => ERR_CODE_INVALID_HEADER,
            Self::InvalidUri(_) => ERR_CODE_INVALID_URI,
            Self::MalformedAuthorizationHeader(_) => ERR_CODE_MALFORMED_AUTHORIZATION_HEADER,
            Self::MissingRequiredHeader(_) => ERR_CODE_MISSING_REQUIRED_HEADER,
            Self::SignatureDoesNotMatch(_) => ERR_CODE_SIGNATURE_DOES_NOT_MATCH,
            Self::UnsupportedHashAlgorithm(_) => ERR_CODE_UNSUPPORTED_HASH_ALGORITHM,
        }
    }

    fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidDateFormat(_)
            | Self::InvalidHeader(_)
            | Self::InvalidUri(_)
            | Self::MalformedAuthorizationHeader(_)
            | Self::MissingRequiredHeader(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedHashAlgorithm(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::FORBIDDEN,
        }
    }
}

impl ServiceError for EscherError {
    fn error_code(&self) -> &'static str {
        EscherError::error_code(self)
    }

    fn http_status(&self) -> StatusCode {
        EscherError::http_status(self)
    }
}

impl Display for EscherError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::InvalidAccessKeyId(id) => write!(f, "Invalid access key id: {}", id),
            Self::InvalidDateFormat(value) => write!(f, "Invalid date format: '{}'", value),
            Self::InvalidHeader(msg) => f.write_str(msg),
            Self::InvalidUri(msg) => f.write_str(msg),
            Self::MalformedAuthorizationHeader(value) => write!(f, "Malformed authorization header: '{}'", value),
            Self::MissingRequiredHeader(name) => write!(f, "Missing header: {}", name),
            Self::SignatureDoesNotMatch(msg) => {
                if let Some(msg) = msg {
                    f.write_str(msg)
                } else {
                    Ok(())
                }
            }
            Self::UnsupportedHashAlgorithm(name) => write!(f, "Unsupported hash algorithm: '{}'", name),
        }
    }
}

impl Error for EscherError {}
