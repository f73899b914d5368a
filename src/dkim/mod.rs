/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use tokio::task::JoinSet;
use tracing::debug;

use crate::common::resolver::TxtResolver;

/// Selector queried by [`check_dkim`]. Senders choose their own selectors,
/// so a domain signing with any other selector is reported as missing DKIM.
pub const DEFAULT_SELECTOR: &str = "default";

/// Name of the DKIM key record for `selector` under `domain`.
pub fn domain_key_name(selector: &str, domain: &str) -> String {
    format!("{selector}._domainkey.{domain}")
}

/// Checks whether `domain` publishes a DKIM key for the `default` selector.
pub async fn check_dkim<R: TxtResolver + ?Sized>(resolver: &R, domain: &str) -> bool {
    check_dkim_selector(resolver, domain, DEFAULT_SELECTOR).await
}

/// Checks whether any TXT record exists at `<selector>._domainkey.<domain>`.
///
/// The key itself is not parsed.
pub async fn check_dkim_selector<R: TxtResolver + ?Sized>(
    resolver: &R,
    domain: &str,
    selector: &str,
) -> bool {
    let name = domain_key_name(selector, domain);
    match resolver.txt_lookup(&name).await {
        Ok(records) => {
            let valid = !records.is_empty();
            debug!(domain, name = %name, records = ?records, valid, "DKIM records");
            valid
        }
        Err(err) => {
            debug!(domain, name = %name, error = %err, "Could not find DKIM record");
            false
        }
    }
}

/// Looks up all `selectors` concurrently, DKIM is present if any resolves.
///
/// Lookup failures count as a missing key; an error is only returned when a
/// selector task itself fails.
pub async fn check_dkim_selectors<R, I>(
    resolver: &R,
    domain: &str,
    selectors: I,
) -> crate::Result<bool>
where
    R: TxtResolver + Clone + 'static,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut lookups = JoinSet::new();
    for selector in selectors {
        let resolver = resolver.clone();
        let domain = domain.to_string();
        let selector = selector.as_ref().to_string();
        lookups.spawn(async move { check_dkim_selector(&resolver, &domain, &selector).await });
    }

    while let Some(result) = lookups.join_next().await {
        if result? {
            return Ok(true);
        }
    }
    Ok(false)
}
