/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use tracing::debug;

use crate::{common::resolver::TxtResolver, TxtRecord};

/// Version tag every SPF record starts with.
pub const SPF_VERSION: &str = "v=spf1";

/// Checks whether `domain` publishes an SPF record.
///
/// The record is looked up at the domain itself and counts as present when
/// any TXT record contains `v=spf1`, case-insensitively, after its
/// character-strings are joined. Mechanisms are not evaluated. Any lookup
/// failure is reported as a missing record.
pub async fn check_spf<R: TxtResolver + ?Sized>(resolver: &R, domain: &str) -> bool {
    match resolver.txt_lookup(domain).await {
        Ok(records) => {
            let valid = records.iter().any(is_spf_record);
            debug!(domain, records = ?records, valid, "SPF records");
            valid
        }
        Err(err) => {
            debug!(domain, error = %err, "Could not find SPF record");
            false
        }
    }
}

fn is_spf_record(record: &TxtRecord) -> bool {
    record.text().to_lowercase().contains(SPF_VERSION)
}
