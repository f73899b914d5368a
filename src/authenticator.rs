/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::{future::Future, sync::Arc, time::Duration};

use tracing::{error, info, warn};
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    error::ResolveError,
    system_conf::read_system_conf,
};

use crate::{
    common::{address::extract_domain, resolver::TxtResolver},
    dkim::check_dkim_selectors,
    dmarc::check_dmarc,
    spf::check_spf,
    AuthReport, Authenticator, Config, Error, RecordPresence, Resolver, Verdict,
};

impl Authenticator<Resolver> {
    pub fn new_cloudflare_tls() -> Result<Self, ResolveError> {
        Self::with_resolver_config(
            ResolverConfig::cloudflare_tls(),
            ResolverOpts::default(),
            Config::default(),
        )
    }

    pub fn new_cloudflare() -> Result<Self, ResolveError> {
        Self::with_resolver_config(
            ResolverConfig::cloudflare(),
            ResolverOpts::default(),
            Config::default(),
        )
    }

    pub fn new_google() -> Result<Self, ResolveError> {
        Self::with_resolver_config(
            ResolverConfig::google(),
            ResolverOpts::default(),
            Config::default(),
        )
    }

    pub fn new_system_conf() -> Result<Self, ResolveError> {
        let (config, options) = read_system_conf()?;
        Self::with_resolver_config(config, options, Config::default())
    }

    pub fn with_resolver_config(
        config: ResolverConfig,
        options: ResolverOpts,
        settings: Config,
    ) -> Result<Self, ResolveError> {
        Ok(Authenticator {
            resolver: Arc::new(Resolver::with_config(config, options, &settings)?),
            config: Arc::new(settings),
        })
    }
}

impl<R: TxtResolver + 'static> Authenticator<R> {
    pub fn with_resolver(resolver: R) -> Self {
        Authenticator {
            resolver: Arc::new(resolver),
            config: Arc::new(Config::default()),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Checks the authenticity of an e-mail from its `From` and
    /// `Return-Path` addresses.
    pub async fn check_email(&self, from: &str, return_path: &str) -> crate::Result<Verdict> {
        self.check_email_report(from, return_path)
            .await
            .map(AuthReport::into_verdict)
    }

    /// Same as [`Authenticator::check_email`], also returning the domains
    /// and the presence of each record.
    pub async fn check_email_report(
        &self,
        from: &str,
        return_path: &str,
    ) -> crate::Result<AuthReport> {
        if from.is_empty() || return_path.is_empty() {
            return Err(Error::MissingFields);
        }

        let (from_domain, return_path_domain) =
            match (extract_domain(from), extract_domain(return_path)) {
                (Some(from_domain), Some(return_path_domain)) => {
                    (from_domain, return_path_domain)
                }
                _ => return Err(Error::InvalidEmail),
            };

        // Mismatching domains are suspicious regardless of their DNS records
        if from_domain != return_path_domain {
            info!(
                from_domain = %from_domain,
                return_path_domain = %return_path_domain,
                "From and Return-Path domains do not match"
            );
            return Ok(AuthReport {
                from_domain,
                return_path_domain,
                records: None,
                verdict: Verdict::domain_mismatch(),
            });
        }

        let records = self.check_records(&from_domain).await.map_err(|err| {
            error!(domain = %from_domain, error = ?err, "DNS lookup error");
            err
        })?;
        let verdict = Verdict::from_records(&records);
        info!(
            domain = %from_domain,
            spf = records.spf.is_present(),
            dkim = records.dkim.is_present(),
            dmarc = records.dmarc.is_present(),
            issues = records.issues(),
            result = %verdict.result(),
            "Email authenticity checked"
        );

        Ok(AuthReport {
            from_domain,
            return_path_domain,
            records: Some(records),
            verdict,
        })
    }

    /// Looks up the SPF, DKIM and DMARC records of `domain` concurrently.
    ///
    /// Lookup failures and timeouts count as missing records. An error is
    /// only returned when a lookup task itself fails.
    pub async fn check_records(&self, domain: &str) -> crate::Result<RecordPresence> {
        let timeout = self.config.lookup_timeout;

        let spf = {
            let resolver = self.resolver.clone();
            let domain = domain.to_string();
            tokio::spawn(async move {
                within(timeout, "SPF", &domain, async {
                    Ok(check_spf(resolver.as_ref(), &domain).await)
                })
                .await
            })
        };
        let dkim = {
            let resolver = self.resolver.clone();
            let config = self.config.clone();
            let domain = domain.to_string();
            tokio::spawn(async move {
                within(
                    timeout,
                    "DKIM",
                    &domain,
                    check_dkim_selectors(&resolver, &domain, config.dkim_selectors.iter()),
                )
                .await
            })
        };
        let dmarc = {
            let resolver = self.resolver.clone();
            let domain = domain.to_string();
            tokio::spawn(async move {
                within(timeout, "DMARC", &domain, async {
                    Ok(check_dmarc(resolver.as_ref(), &domain).await)
                })
                .await
            })
        };

        let (spf, dkim, dmarc) = tokio::join!(spf, dkim, dmarc);
        Ok(RecordPresence {
            spf: spf??.into(),
            dkim: dkim??.into(),
            dmarc: dmarc??.into(),
        })
    }
}

impl<R> Clone for Authenticator<R> {
    fn clone(&self) -> Self {
        Authenticator {
            resolver: self.resolver.clone(),
            config: self.config.clone(),
        }
    }
}

async fn within(
    timeout: Duration,
    record: &str,
    domain: &str,
    check: impl Future<Output = crate::Result<bool>>,
) -> crate::Result<bool> {
    match tokio::time::timeout(timeout, check).await {
        Ok(valid) => valid,
        Err(_) => {
            warn!(domain, record, ?timeout, "DNS lookup timed out");
            Ok(false)
        }
    }
}
