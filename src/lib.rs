/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

//! # mail-auth-check
//!
//! _mail-auth-check_ gives a quick authenticity signal for a single e-mail by
//! comparing the `From` and `Return-Path` domains and checking whether the
//! sender domain publishes SPF, DKIM and DMARC records in the DNS.
//!
//! Only record *presence* is checked. DKIM signatures are not verified, SPF
//! mechanisms are not evaluated against a sending IP and DMARC policies are
//! not parsed.
//!
//! ```rust,ignore
//! let authenticator = Authenticator::new_cloudflare_tls().unwrap();
//! let verdict = authenticator
//!     .check_email("billing@example.org", "bounces@example.org")
//!     .await
//!     .unwrap();
//! println!("{}: {}", verdict.result(), verdict.message());
//! ```

use std::{fmt::Display, sync::Arc, time::Duration};

use common::lru::LruCache;
use serde::{Deserialize, Serialize};
use trust_dns_resolver::{proto::op::ResponseCode, TokioAsyncResolver};

pub mod authenticator;
pub mod common;
pub mod dkim;
pub mod dmarc;
pub mod spf;

pub use common::resolver::{IntoFqdn, TxtResolver};

/// Caching DNS resolver backed by `trust-dns`.
#[derive(Debug)]
pub struct Resolver {
    pub(crate) resolver: TokioAsyncResolver,
    pub(crate) cache_txt: LruCache<String, Txt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Txt {
    Records(Arc<Vec<TxtRecord>>),
    Error(Error),
}

/// A single DNS TXT record, kept as the character-strings it was split into.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxtRecord {
    pub(crate) parts: Vec<String>,
}

/// Runs the domain authentication check pipeline against a [`TxtResolver`].
#[derive(Debug)]
pub struct Authenticator<R = Resolver> {
    pub(crate) resolver: Arc<R>,
    pub(crate) config: Arc<Config>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(with = "common::config::duration_secs")]
    pub(crate) lookup_timeout: Duration,
    pub(crate) cache_capacity: usize,
    pub(crate) dkim_selectors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Present,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPresence {
    pub spf: Presence,
    pub dkim: Presence,
    pub dmarc: Presence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictResult {
    Legitimate,
    Suspicious,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub(crate) result: VerdictResult,
    pub(crate) message: String,
}

/// Detailed outcome of a check, including the per-record presence when the
/// DNS phase was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthReport {
    pub(crate) from_domain: String,
    pub(crate) return_path_domain: String,
    pub(crate) records: Option<RecordPresence>,
    pub(crate) verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    MissingFields,
    InvalidEmail,

    DnsError(String),
    DnsRecordNotFound(ResponseCode),
    DnsTimeout,

    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Lookup,
    Internal,
}

/// Caller-facing failure body, `{"message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingFields | Error::InvalidEmail => ErrorKind::InvalidInput,
            Error::DnsError(_) | Error::DnsRecordNotFound(_) | Error::DnsTimeout => {
                ErrorKind::Lookup
            }
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidInput => 400,
            ErrorKind::Lookup | ErrorKind::Internal => 500,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingFields => write!(f, "Missing required fields."),
            Error::InvalidEmail => write!(f, "Invalid email format."),
            Error::DnsError(err) => write!(f, "DNS resolution error: {err}"),
            Error::DnsRecordNotFound(code) => write!(f, "DNS record not found: {code}."),
            Error::DnsTimeout => write!(f, "DNS lookup timed out."),
            Error::Internal(_) => write!(f, "Error while checking DNS records."),
        }
    }
}

impl std::error::Error for Error {}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        ErrorResponse {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(err.to_string())
    }
}
