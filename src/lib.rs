//! The `escher_signature` crate signs and authenticates HTTP requests using the Escher protocol, a symmetric-key
//! request signing scheme in the AWS SigV4 family.
//!
//! A request is reduced to a canonical string (method, path, sorted query, sorted headers, signed header names, and
//! a body digest). A signing key is derived from the caller's secret, the request date, and a credential scope by
//! chained HMACs, and the signature is the HMAC of a string to sign that binds the algorithm, timestamp, scope, and
//! canonical request digest. The signature travels either in an auth header (default `X-Escher-Auth`, next to an
//! `X-Escher-Date` header) or in the query string of a presigned URL.
//!
//! # Workflow
//! 1. Build an [`EscherConfig`] with your credential scope and, optionally, a non-default algorithm prefix, hash
//!    algorithm, header names, or clock.
//! 2. Wrap it in an [`Escher`].
//! 3. Clients call [`Escher::sign_request`] or [`Escher::presign_url`].
//! 4. Servers call [`Escher::authenticate`] to learn the claimed access key id, or [`Escher::verify`] with a
//!    [`KeyStore`] to fully check the signature and timestamp.
//!
//! ## Example
//! ```rust
//! use escher_signature::{key_store_fn, Escher, EscherConfig};
//! use http::Request;
//!
//! const ACCESS_KEY_ID: &str = "AKIDEXAMPLE";
//! const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
//!
//! let escher = Escher::new(EscherConfig::builder().credential_scope("eu/host/escher_request").build().unwrap());
//!
//! let mut request = Request::post("https://example.com/api?a=1")
//!     .header("Host", "example.com")
//!     .header("Content-Type", "application/json")
//!     .body(br#"{"hello":"world"}"#.to_vec())
//!     .unwrap();
//! escher.sign_request(&mut request, ACCESS_KEY_ID, SECRET, &["host", "content-type"]).unwrap();
//! assert!(request.headers().contains_key("x-escher-auth"));
//!
//! // On the receiving side, look up the secret for the claimed access key id.
//! let keys = key_store_fn(|id| (id == ACCESS_KEY_ID).then(|| SECRET.to_string()));
//! assert_eq!(escher.authenticate(&request).unwrap(), ACCESS_KEY_ID);
//! assert_eq!(escher.verify(&request, &keys).unwrap(), ACCESS_KEY_ID);
//! ```
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

#[cfg(any(doc, feature = "unstable"))]
pub mod auth;
#[cfg(not(any(doc, feature = "unstable")))]
mod auth;

mod auth_header;
mod canonical;
mod chronoutil;
mod clock;
mod config;
mod constants;
mod crypto;
mod error;
mod presign;
mod request;
mod signature;
mod signing_key;

pub use crate::{
    auth::{algorithm_id, calculate_signature, string_to_sign},
    auth_header::{build_auth_header, AuthElements},
    canonical::{canonicalize_headers, canonicalize_query, signed_header_names, CanonicalRequest},
    chronoutil::ParseLongDate,
    clock::{Clock, FixedClock, SystemClock},
    config::{EscherConfig, EscherConfigBuilder, EscherConfigBuilderError},
    constants::UNSIGNED_PAYLOAD,
    crypto::HashAlgorithm,
    error::EscherError,
    presign::{append_query_params, presign_param_name, presign_params},
    request::{EscherRequest, Header, Payload, PresignRequest},
    signature::Escher,
    signing_key::{key_store_fn, KeyStore, KeyStoreFn, SigningKey},
};
