/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

/// Extracts the lowercased domain of an `local-part@domain` address.
///
/// Returns `None` unless the address contains exactly one `@` with a
/// non-empty local part and a non-empty domain.
pub fn extract_domain(address: &str) -> Option<String> {
    let mut parts = address.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
            Some(domain.to_lowercase())
        }
        _ => None,
    }
}
