/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use tracing::debug;

use crate::common::resolver::TxtResolver;

/// Name of the DMARC policy record for `domain`.
pub fn dmarc_record_name(domain: &str) -> String {
    format!("_dmarc.{domain}")
}

/// Checks whether `domain` publishes a DMARC record at `_dmarc.<domain>`.
///
/// Any TXT record found there counts, the policy itself is not parsed.
pub async fn check_dmarc<R: TxtResolver + ?Sized>(resolver: &R, domain: &str) -> bool {
    let name = dmarc_record_name(domain);
    match resolver.txt_lookup(&name).await {
        Ok(records) => {
            let valid = !records.is_empty();
            debug!(domain, name = %name, records = ?records, valid, "DMARC records");
            valid
        }
        Err(err) => {
            debug!(domain, name = %name, error = %err, "Could not find DMARC record");
            false
        }
    }
}

#[cfg(test)]
mod test {
    use trust_dns_resolver::proto::op::ResponseCode;

    use crate::{common::resolver::mock::MockResolver, Error};

    use super::check_dmarc;

    #[tokio::test]
    async fn dmarc_record_presence() {
        let resolver = MockResolver::new()
            .with_txt("_dmarc.example.com", &["v=DMARC1; p=reject; rua=mailto:d@example.com"])
            .with_txt("_dmarc.odd.example.com", &["not a dmarc policy"])
            .with_txt("_dmarc.empty.example.com", &[])
            .with_txt("example.org", &["v=DMARC1; p=none"])
            .with_error("_dmarc.slow.example.com", Error::DnsTimeout)
            .with_error(
                "_dmarc.refused.example.com",
                Error::DnsRecordNotFound(ResponseCode::Refused),
            );

        for (domain, expected) in [
            ("example.com", true),
            ("odd.example.com", true),
            ("empty.example.com", false),
            ("example.org", false),
            ("slow.example.com", false),
            ("refused.example.com", false),
        ] {
            assert_eq!(
                check_dmarc(&resolver, domain).await,
                expected,
                "failed for {domain}"
            );
        }
        assert_eq!(resolver.lookups()[0], "_dmarc.example.com");
    }
}
