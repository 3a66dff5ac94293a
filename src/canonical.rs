//! Canonicalization functionality for signature generation and validation.
//!
//! A request is reduced to a single deterministic string:
//!
//! ```text
//! METHOD \n PATH \n CanonicalQuery \n CanonicalHeaders \n \n SignedHeaderNames \n HexDigest(Body)
//! ```
//!
//! Header and query ordering on the incoming request does not affect the result.

use {
    crate::{
        constants::HEX_DIGITS_UPPER,
        crypto::HashAlgorithm,
        request::{EscherRequest, Header, Payload},
    },
    http::uri::Uri,
    log::trace,
    qualifier_attr::qualifiers,
    std::fmt::{Display, Formatter, Result as FmtResult},
};

/// A canonicalized Escher request.
///
/// Created and discarded within a single signing or verification call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanonicalRequest {
    /// The HTTP method for the request (e.g., "GET", "POST", etc.)
    method: String,

    /// The URI path, as it appears on the request.
    path: String,

    /// The canonical query string.
    query: String,

    /// `name:value` lines, sorted.
    headers: Vec<String>,

    /// Lowercase header names, sorted and de-duplicated.
    signed_headers: Vec<String>,

    /// Lowercase hex digest of the body (or of the `UNSIGNED-PAYLOAD` token).
    payload_digest: String,
}

impl CanonicalRequest {
    /// Canonicalize every header, the URI, and the body of `request`.
    pub fn from_request<R>(request: &R, hash: HashAlgorithm) -> Self
    where
        R: EscherRequest + ?Sized,
    {
        Self::from_parts(
            request.http_method(),
            request.request_uri(),
            &request.request_headers(),
            request.payload(),
            hash,
        )
    }

    /// Canonicalize a request given as its parts. Every header in `headers` participates; the caller decides which
    /// headers to pass.
    pub fn from_parts(method: &str, uri: &Uri, headers: &[Header], payload: Payload<'_>, hash: HashAlgorithm) -> Self {
        let path = match uri.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        Self {
            method: method.to_string(),
            path,
            query: canonicalize_query(uri.query().unwrap_or("")),
            headers: canonicalize_headers(headers),
            signed_headers: signed_header_names(headers),
            payload_digest: hash.digest_hex(payload.as_bytes()),
        }
    }

    /// Retrieve the HTTP request method.
    #[inline(always)]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Retrieve the URI path.
    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Retrieve the canonical query string.
    #[inline(always)]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Retrieve the canonical header lines.
    #[inline(always)]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Retrieve the sorted, lowercase names of the headers that were canonicalized.
    #[inline(always)]
    pub fn signed_headers(&self) -> &[String] {
        &self.signed_headers
    }

    /// Retrieve the hex digest of the payload.
    #[inline(always)]
    pub fn payload_digest(&self) -> &str {
        &self.payload_digest
    }

    /// Get the canonical request string.
    pub fn canonical_request(&self) -> String {
        let mut result = String::with_capacity(1024);
        result.push_str(&self.method);
        result.push('\n');
        result.push_str(&self.path);
        result.push('\n');
        result.push_str(&self.query);
        result.push('\n');
        result.push_str(&self.headers.join("\n"));
        result.push('\n');
        result.push('\n');
        result.push_str(&self.signed_headers.join(";"));
        result.push('\n');
        result.push_str(&self.payload_digest);

        trace!("Canonical request:\n{}", result);

        result
    }
}

impl Display for CanonicalRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.canonical_request())
    }
}

/// Canonicalize a raw query string.
///
/// Components are separated by `&` or `;`. Each `name=value` component is form-decoded, the value is re-encoded with
/// RFC 3986 percent-encoding, and the resulting `name=value` strings are sorted and joined with `&`. Duplicate names
/// are kept as separate entries; components with an empty name (`=x`) are dropped.
pub fn canonicalize_query(query: &str) -> String {
    let mut params: Vec<String> = query
        .split(['&', ';'])
        .filter_map(|component| {
            let (name, value) = component.split_once('=').unwrap_or((component, ""));
            if name.is_empty() {
                return None;
            }

            Some(format!("{}={}", form_decode(name), percent_encode(&form_decode(value))))
        })
        .collect();

    params.sort();
    params.join("&")
}

/// Convert headers into sorted `lowercase(name):trim(value)` lines.
pub fn canonicalize_headers(headers: &[Header]) -> Vec<String> {
    let mut lines: Vec<String> =
        headers.iter().map(|header| format!("{}:{}", header.canonical_name(), header.canonical_value())).collect();
    lines.sort();
    lines
}

/// Return the lowercase names of `headers`, sorted and de-duplicated.
pub fn signed_header_names(headers: &[Header]) -> Vec<String> {
    let mut names: Vec<String> = headers.iter().map(Header::canonical_name).collect();
    names.sort();
    names.dedup();
    names
}

/// Decode one side of an `application/x-www-form-urlencoded` pair: `+` becomes a space and `%XX` becomes the byte
/// `XX`. Malformed escapes are kept literally. The bytes are decoded as UTF-8, replacing invalid sequences.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn form_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                result.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() && is_hex_pair(bytes[i + 1], bytes[i + 2]) => {
                result.push((hex_value(bytes[i + 1]) << 4) | hex_value(bytes[i + 2]));
                i += 3;
            }
            c => {
                result.push(c);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&result).into_owned()
}

/// Percent-encode a string according to RFC 3986: unreserved characters are left alone, everything else is
/// encoded as `%XX` with uppercase hex digits. Spaces become `%20`.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.bytes() {
        if is_rfc3986_unreserved(c) {
            result.push(c as char);
        } else {
            let [hi, lo] = u8_to_upper_hex(c);
            result.push('%');
            result.push(hi as char);
            result.push(lo as char);
        }
    }
    result
}

/// Indicates whether the specified byte is RFC3986 unreserved -- i.e., can be represented without being
/// percent-encoded, e.g. '?' -> '%3F'.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[inline(always)]
fn is_rfc3986_unreserved(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'.' || c == b'_' || c == b'~'
}

/// Convert a Latin-1 slice of bytes to a UTF-8 string.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
fn latin1_to_string(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len());
    for b in bytes {
        result.push(*b as char);
    }
    result
}

/// Convert a byte to uppercase hex representation.
#[cfg_attr(any(doc, feature = "unstable"), qualifiers(pub))]
#[cfg_attr(not(any(doc, feature = "unstable")), qualifiers(pub(crate)))]
#[inline(always)]
const fn u8_to_upper_hex(b: u8) -> [u8; 2] {
    [HEX_DIGITS_UPPER[((b >> 4) & 0xf) as usize], HEX_DIGITS_UPPER[(b & 0xf) as usize]]
}

#[inline(always)]
fn is_hex_pair(a: u8, b: u8) -> bool {
    a.is_ascii_hexdigit() && b.is_ascii_hexdigit()
}

#[inline(always)]
fn hex_value(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => c - b'A' + 10,
    }
}
