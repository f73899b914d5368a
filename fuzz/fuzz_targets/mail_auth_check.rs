/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

#![no_main]
use libfuzzer_sys::fuzz_target;

use mail_auth_check::{common::address::extract_domain, IntoFqdn, TxtRecord, Verdict};

static ADDRESS_ALPHABET: &[u8] = b"abcXYZ019@.-_ ";

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let address = into_alphabet(data, ADDRESS_ALPHABET);

    for address in [text.as_ref(), address.as_str()] {
        if let Some(domain) = extract_domain(address) {
            assert_eq!(address.matches('@').count(), 1);
            assert_eq!(domain, domain.to_lowercase());
            let _ = domain.as_str().into_fqdn();

            let flags = data.first().copied().unwrap_or_default();
            let verdict =
                Verdict::compose(&domain, &domain, flags & 1 != 0, flags & 2 != 0, flags & 4 != 0);
            assert_eq!(verdict.is_legitimate(), flags & 1 != 0 && flags & 4 != 0);
        }
    }

    TxtRecord::new(text.split(';')).text();
});

fn into_alphabet(data: &[u8], alphabet: &[u8]) -> String {
    data.iter()
        .map(|&byte| alphabet[byte as usize % alphabet.len()] as char)
        .collect()
}
