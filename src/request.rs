//! The request capability consumed by canonicalization.
//!
//! There are exactly two implementations: [`http::Request`] for live requests, and [`PresignRequest`] for the
//! URI-only pseudo-request built while presigning a URL.

use {
    crate::{
        canonical::latin1_to_string,
        constants::{HDR_HOST, PRESIGN_METHOD, UNSIGNED_PAYLOAD},
        EscherError,
    },
    http::{request::Request, uri::Uri},
    std::fmt::{Debug, Formatter, Result as FmtResult},
};

/// A single header field of a request, as supplied.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    /// Create a new header.
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The field name as supplied.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field value as supplied.
    #[inline(always)]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The lowercased field name used for canonicalization.
    #[inline(always)]
    pub fn canonical_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// The field value used for canonicalization, with leading and trailing characters at or below U+0020 removed.
    ///
    /// Other whitespace, such as U+00A0 widened from a Latin-1 header byte, is kept.
    #[inline(always)]
    pub fn canonical_value(&self) -> &str {
        self.value.trim_matches(|c: char| c <= ' ')
    }

    /// Whether this header has the given name, ignoring ASCII case and treating `_` and `-` as equivalent.
    #[inline(always)]
    pub fn is_named(&self, name: &str) -> bool {
        header_names_match(&self.name, name)
    }
}

/// Compare two header names, ignoring ASCII case and treating `_` and `-` as equivalent.
pub(crate) fn header_names_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes().zip(b.bytes()).all(|(a, b)| {
            let a = if a == b'_' { b'-' } else { a };
            let b = if b == b'_' { b'-' } else { b };
            a.eq_ignore_ascii_case(&b)
        })
}

/// The body of a request as seen by the signer.
#[derive(Clone, Copy, Eq, PartialEq)]
pub enum Payload<'a> {
    /// The literal body bytes.
    Bytes(&'a [u8]),

    /// No real body is available or relevant; the `UNSIGNED-PAYLOAD` token is hashed instead.
    Unsigned,
}

impl Payload<'_> {
    /// The bytes that are hashed for the canonical request.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Unsigned => UNSIGNED_PAYLOAD.as_bytes(),
        }
    }
}

impl Debug for Payload<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Bytes(bytes) => write!(f, "Payload::Bytes({} bytes)", bytes.len()),
            Self::Unsigned => f.write_str("Payload::Unsigned"),
        }
    }
}

/// A request that can be canonicalized for signing or verification.
pub trait EscherRequest {
    /// The HTTP method, e.g. `GET`.
    fn http_method(&self) -> &str;

    /// The request URI.
    fn request_uri(&self) -> &Uri;

    /// The request headers, in the order they were supplied.
    fn request_headers(&self) -> Vec<Header>;

    /// The body of the request.
    fn payload(&self) -> Payload<'_>;
}

impl<B> EscherRequest for Request<B>
where
    B: AsRef<[u8]>,
{
    fn http_method(&self) -> &str {
        self.method().as_str()
    }

    fn request_uri(&self) -> &Uri {
        self.uri()
    }

    fn request_headers(&self) -> Vec<Header> {
        // Header values are Latin-1 on the wire.
        self.headers().iter().map(|(name, value)| Header::new(name.as_str(), latin1_to_string(value.as_bytes()))).collect()
    }

    fn payload(&self) -> Payload<'_> {
        Payload::Bytes(self.body().as_ref())
    }
}

/// The pseudo-request signed when presigning a URL.
///
/// Its only header is `host`, taken from the URI authority, and its body is the `UNSIGNED-PAYLOAD` token.
#[derive(Clone, Debug)]
pub struct PresignRequest {
    uri: Uri,
    host: String,
}

impl PresignRequest {
    /// Create a pseudo-request for an absolute URI.
    pub fn new(uri: Uri) -> Result<Self, EscherError> {
        let authority = uri
            .authority()
            .ok_or_else(|| EscherError::InvalidUri(format!("URI has no authority: {}", uri)))?;

        // Drop any userinfo; the host header carries only host and port.
        let host = match authority.port() {
            Some(port) => format!("{}:{}", authority.host(), port),
            None => authority.host().to_string(),
        };

        Ok(Self {
            uri,
            host,
        })
    }

    /// The host header value derived from the URI.
    #[inline(always)]
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl EscherRequest for PresignRequest {
    fn http_method(&self) -> &str {
        PRESIGN_METHOD
    }

    fn request_uri(&self) -> &Uri {
        &self.uri
    }

    fn request_headers(&self) -> Vec<Header> {
        vec![Header::new(HDR_HOST, self.host.as_str())]
    }

    fn payload(&self) -> Payload<'_> {
        Payload::Unsigned
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{EscherRequest, Header, Payload, PresignRequest},
        crate::EscherError,
        bytes::Bytes,
        http::{header::HeaderValue, request::Request, uri::Uri},
    };

    #[test_log::test]
    fn test_header_names() {
        let header = Header::new("X-Escher_Date", "  20110909T233600Z ");
        assert_eq!(header.canonical_name(), "x-escher_date");
        assert_eq!(header.canonical_value(), "20110909T233600Z");
        assert!(header.is_named("x-escher-date"));
        assert!(header.is_named("X_ESCHER_DATE"));
        assert!(!header.is_named("x-escher-auth"));
        assert!(!header.is_named("x-escher-dat"));
    }

    #[test_log::test]
    fn test_header_value_trim_keeps_non_ascii_whitespace() {
        let request = Request::builder()
            .uri("http://host.foo.com/")
            .header("X-A", HeaderValue::from_bytes(b"foo\xa0").unwrap())
            .header("X-B", HeaderValue::from_bytes(b"\t bar \t").unwrap())
            .header("X-C", HeaderValue::from_bytes(b"\x85baz").unwrap())
            .body(Vec::new())
            .unwrap();

        let headers = request.request_headers();
        assert_eq!(headers[0].value(), "foo\u{a0}");
        assert_eq!(headers[0].canonical_value(), "foo\u{a0}");
        assert_eq!(headers[1].canonical_value(), "bar");
        assert_eq!(headers[2].canonical_value(), "\u{85}baz");
        assert_eq!(crate::canonicalize_headers(&headers), vec!["x-a:foo\u{a0}", "x-b:bar", "x-c:\u{85}baz"]);
    }

    #[test_log::test]
    fn test_http_request() {
        let request = Request::builder()
            .method("POST")
            .uri("http://host.foo.com/path?a=1")
            .header("Host", "host.foo.com")
            .header("X-Multi", "one")
            .header("X-Multi", "two")
            .body(Bytes::from_static(b"body"))
            .unwrap();

        assert_eq!(request.http_method(), "POST");
        assert_eq!(request.request_uri().path(), "/path");
        assert_eq!(request.payload(), Payload::Bytes(b"body"));

        let headers = request.request_headers();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0], Header::new("host", "host.foo.com"));
        assert_eq!(headers[1], Header::new("x-multi", "one"));
        assert_eq!(headers[2], Header::new("x-multi", "two"));
    }

    #[test_log::test]
    fn test_presign_request() {
        let uri: Uri = "https://user@example.com:8443/path?x=1".parse().unwrap();
        let request = PresignRequest::new(uri).unwrap();
        assert_eq!(request.http_method(), "GET");
        assert_eq!(request.host(), "example.com:8443");
        assert_eq!(request.request_headers(), vec![Header::new("host", "example.com:8443")]);
        assert_eq!(request.payload(), Payload::Unsigned);
        assert_eq!(request.payload().as_bytes(), b"UNSIGNED-PAYLOAD");

        let uri: Uri = "/relative/path".parse().unwrap();
        match PresignRequest::new(uri) {
            Err(EscherError::InvalidUri(_)) => (),
            other => panic!("Expected InvalidUri; got {:?}", other),
        }
    }
}
