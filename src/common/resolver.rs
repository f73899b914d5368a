/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{
    borrow::Cow,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    AsyncResolver,
};

use crate::{Config, Error, Resolver, Txt, TxtRecord};

use super::lru::{DnsCache, LruCache};

/// Capability to resolve DNS TXT records by name.
///
/// Each returned [`TxtRecord`] is one resource record. Implementations fail
/// with [`Error::DnsRecordNotFound`], [`Error::DnsError`] or
/// [`Error::DnsTimeout`].
#[async_trait]
pub trait TxtResolver: Send + Sync {
    async fn txt_lookup(&self, name: &str) -> crate::Result<Arc<Vec<TxtRecord>>>;
}

#[async_trait]
impl<T: TxtResolver + ?Sized> TxtResolver for Arc<T> {
    async fn txt_lookup(&self, name: &str) -> crate::Result<Arc<Vec<TxtRecord>>> {
        self.as_ref().txt_lookup(name).await
    }
}

impl Resolver {
    pub fn with_capacity(
        config: ResolverConfig,
        options: ResolverOpts,
        capacity: usize,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            resolver: AsyncResolver::tokio(config, options)?,
            cache_txt: LruCache::with_capacity(capacity),
        })
    }

    /// Builds a resolver whose per-query timeout and cache size follow `settings`.
    pub fn with_config(
        config: ResolverConfig,
        mut options: ResolverOpts,
        settings: &Config,
    ) -> Result<Self, ResolveError> {
        options.timeout = settings.lookup_timeout;
        Self::with_capacity(config, options, settings.cache_capacity)
    }

    #[cfg(test)]
    pub(crate) fn txt_add<'x>(
        &self,
        name: impl IntoFqdn<'x>,
        value: crate::Result<Vec<TxtRecord>>,
        valid_until: Instant,
    ) {
        let value = match value {
            Ok(records) => Txt::Records(Arc::new(records)),
            Err(err) => Txt::Error(err),
        };
        self.cache_txt
            .insert(name.into_fqdn().into_owned(), value, valid_until);
    }
}

#[async_trait]
impl TxtResolver for Resolver {
    async fn txt_lookup(&self, name: &str) -> crate::Result<Arc<Vec<TxtRecord>>> {
        let key = name.into_fqdn();
        if let Some(value) = self.cache_txt.get(key.as_ref()) {
            return value.unwrap_records();
        }

        let result = self.resolver.txt_lookup(key.as_ref()).await;
        match result {
            Ok(txt_lookup) => {
                let records = txt_lookup
                    .as_lookup()
                    .record_iter()
                    .filter_map(|r| {
                        let txt_data = r.data()?.as_txt()?.txt_data();
                        Some(TxtRecord::from_bytes(txt_data))
                    })
                    .collect::<Vec<_>>();

                self.cache_txt
                    .insert(
                        key.into_owned(),
                        Txt::Records(Arc::new(records)),
                        txt_lookup.valid_until(),
                    )
                    .unwrap_records()
            }
            Err(err) => {
                // Only authoritative negative answers carry a TTL worth caching
                let negative_ttl = match err.kind() {
                    ResolveErrorKind::NoRecordsFound {
                        negative_ttl: Some(ttl),
                        ..
                    } => Some(Duration::from_secs(u64::from(*ttl))),
                    _ => None,
                };
                let err = Error::from(err);
                if let Some(ttl) = negative_ttl {
                    self.cache_txt.insert(
                        key.into_owned(),
                        Txt::Error(err.clone()),
                        Instant::now() + ttl,
                    );
                }
                Err(err)
            }
        }
    }
}

impl Txt {
    fn unwrap_records(self) -> crate::Result<Arc<Vec<TxtRecord>>> {
        match self {
            Txt::Records(records) => Ok(records),
            Txt::Error(err) => Err(err),
        }
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. } => {
                Error::DnsRecordNotFound(*response_code)
            }
            ResolveErrorKind::Timeout => Error::DnsTimeout,
            _ => Error::DnsError(err.to_string()),
        }
    }
}

impl TxtRecord {
    pub fn new<T: Into<String>>(parts: impl IntoIterator<Item = T>) -> Self {
        TxtRecord {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn from_bytes(txt_data: &[Box<[u8]>]) -> Self {
        TxtRecord {
            parts: txt_data
                .iter()
                .map(|data| String::from_utf8_lossy(data).into_owned())
                .collect(),
        }
    }

    /// Character-strings of the record, in wire order.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Record text with all character-strings concatenated.
    pub fn text(&self) -> Cow<'_, str> {
        match self.parts.as_slice() {
            [part] => Cow::from(part.as_str()),
            parts => Cow::from(parts.concat()),
        }
    }
}

impl From<&str> for TxtRecord {
    fn from(value: &str) -> Self {
        TxtRecord::new([value])
    }
}

impl From<String> for TxtRecord {
    fn from(value: String) -> Self {
        TxtRecord { parts: vec![value] }
    }
}

pub trait IntoFqdn<'x> {
    fn into_fqdn(self) -> Cow<'x, str>;
}

impl<'x> IntoFqdn<'x> for String {
    fn into_fqdn(self) -> Cow<'x, str> {
        if self.ends_with('.') {
            self.to_lowercase().into()
        } else {
            format!("{}.", self.to_lowercase()).into()
        }
    }
}

impl<'x> IntoFqdn<'x> for &'x str {
    fn into_fqdn(self) -> Cow<'x, str> {
        if self.ends_with('.') {
            self.to_lowercase().into()
        } else {
            format!("{}.", self.to_lowercase()).into()
        }
    }
}

impl<'x> IntoFqdn<'x> for &String {
    fn into_fqdn(self) -> Cow<'x, str> {
        self.as_str().to_string().into_fqdn()
    }
}


#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};

    use trust_dns_resolver::{
        config::{ResolverConfig, ResolverOpts},
        proto::op::ResponseCode,
    };

    use crate::{Config, Error, Resolver, TxtRecord};

    use super::{IntoFqdn, TxtResolver};

    #[test]
    fn fqdn_normalization() {
        assert_eq!("Example.ORG".into_fqdn(), "example.org.");
        assert_eq!("example.org.".into_fqdn(), "example.org.");
        assert_eq!(
            "_dmarc.Example.org".to_string().into_fqdn(),
            "_dmarc.example.org."
        );
        assert_eq!(
            (&"default._domainkey.X.com".to_string()).into_fqdn(),
            "default._domainkey.x.com."
        );
    }

    #[test]
    fn txt_record_text() {
        let record = TxtRecord::new([
            "v=spf1 ip4:192.0.2.0/24 ",
            "include:_spf.example.com -all",
        ]);
        assert_eq!(record.parts().len(), 2);
        assert_eq!(
            record.text(),
            "v=spf1 ip4:192.0.2.0/24 include:_spf.example.com -all"
        );
        assert_eq!(TxtRecord::from("v=DMARC1; p=none").text(), "v=DMARC1; p=none");
        assert_eq!(TxtRecord::default().text(), "");

        let record = TxtRecord::from_bytes(&[
            b"v=DKIM1; k=rsa; ".to_vec().into_boxed_slice(),
            b"p=MIGf".to_vec().into_boxed_slice(),
        ]);
        assert_eq!(record.text(), "v=DKIM1; k=rsa; p=MIGf");
    }

    #[tokio::test]
    async fn resolver_cached_answers() {
        let resolver = Resolver::with_config(
            ResolverConfig::cloudflare(),
            ResolverOpts::default(),
            &Config::default(),
        )
        .unwrap();
        let valid_until = Instant::now() + Duration::from_secs(3600);

        resolver.txt_add(
            "Example.org",
            Ok(vec!["v=spf1 -all".into()]),
            valid_until,
        );
        resolver.txt_add(
            "_dmarc.example.org.",
            Err(Error::DnsRecordNotFound(ResponseCode::NXDomain)),
            valid_until,
        );

        assert_eq!(
            resolver.txt_lookup("example.org").await.unwrap().as_ref(),
            &vec![TxtRecord::from("v=spf1 -all")]
        );
        assert_eq!(
            resolver.txt_lookup("_DMARC.example.org").await.unwrap_err(),
            Error::DnsRecordNotFound(ResponseCode::NXDomain)
        );
    }
}
