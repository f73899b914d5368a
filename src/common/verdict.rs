/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use std::fmt::Display;

use crate::{AuthReport, Presence, RecordPresence, Verdict, VerdictResult};

pub const DOMAIN_MISMATCH: &str = "From and Return-Path domains do not match.";
pub const LEGITIMATE: &str = "Email appears to be legitimate with proper SPF, DKIM, and DMARC.";
pub const MANUAL_CHECKS: &str = concat!(
    "\n\nFor manual checks use external tools:\n",
    "- SPF: https://mxtoolbox.com/spf.aspx\n",
    "- DKIM: https://dkimvalidator.com/\n",
    "- DMARC: https://dmarcian.com/dmarc-inspector/"
);

impl Verdict {
    /// Composes the verdict for a pair of already lowercased domains and the
    /// presence of their SPF, DKIM and DMARC records.
    pub fn compose(
        from_domain: &str,
        return_path_domain: &str,
        spf: bool,
        dkim: bool,
        dmarc: bool,
    ) -> Self {
        if from_domain != return_path_domain {
            Self::domain_mismatch()
        } else {
            Self::from_records(&RecordPresence {
                spf: spf.into(),
                dkim: dkim.into(),
                dmarc: dmarc.into(),
            })
        }
    }

    pub fn domain_mismatch() -> Self {
        Verdict {
            result: VerdictResult::Suspicious,
            message: DOMAIN_MISMATCH.to_string(),
        }
    }

    /// Verdict for a domain whose records were looked up. A missing SPF or
    /// DMARC record is an issue; a missing DKIM record is only reported.
    pub fn from_records(records: &RecordPresence) -> Self {
        let mut message = if records.issues() > 0 {
            let mut message = String::from("Email authenticity checks: ");
            for (name, presence) in [
                ("SPF", records.spf),
                ("DKIM", records.dkim),
                ("DMARC", records.dmarc),
            ] {
                if presence == Presence::Absent {
                    message.push_str(name);
                    message.push_str(" missing or invalid; ");
                }
            }
            message
        } else {
            LEGITIMATE.to_string()
        };
        message.push_str(MANUAL_CHECKS);

        Verdict {
            result: if records.issues() > 0 {
                VerdictResult::Suspicious
            } else {
                VerdictResult::Legitimate
            },
            message,
        }
    }

    pub fn result(&self) -> VerdictResult {
        self.result
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_legitimate(&self) -> bool {
        self.result == VerdictResult::Legitimate
    }
}

impl RecordPresence {
    /// Number of missing records that make a message suspicious.
    pub fn issues(&self) -> u32 {
        u32::from(self.spf == Presence::Absent) + u32::from(self.dmarc == Presence::Absent)
    }
}

impl Presence {
    pub fn is_present(&self) -> bool {
        matches!(self, Presence::Present)
    }
}

impl From<bool> for Presence {
    fn from(present: bool) -> Self {
        if present {
            Presence::Present
        } else {
            Presence::Absent
        }
    }
}

impl AuthReport {
    pub fn from_domain(&self) -> &str {
        &self.from_domain
    }

    pub fn return_path_domain(&self) -> &str {
        &self.return_path_domain
    }

    /// Record presence, `None` when the domains did not match and no DNS
    /// lookup took place.
    pub fn records(&self) -> Option<&RecordPresence> {
        self.records.as_ref()
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn into_verdict(self) -> Verdict {
        self.verdict
    }
}

impl Display for VerdictResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VerdictResult::Legitimate => "Legitimate",
            VerdictResult::Suspicious => "Suspicious",
        })
    }
}

#[cfg(test)]
mod test {
    use crate::{Presence, RecordPresence, Verdict, VerdictResult};

    use super::{DOMAIN_MISMATCH, LEGITIMATE, MANUAL_CHECKS};

    #[test]
    fn verdict_compose() {
        for (spf, dkim, dmarc, result, message) in [
            (true, true, true, VerdictResult::Legitimate, LEGITIMATE),
            // DKIM alone never raises an issue
            (true, false, true, VerdictResult::Legitimate, LEGITIMATE),
            (
                false,
                true,
                true,
                VerdictResult::Suspicious,
                "Email authenticity checks: SPF missing or invalid; ",
            ),
            (
                true,
                true,
                false,
                VerdictResult::Suspicious,
                "Email authenticity checks: DMARC missing or invalid; ",
            ),
            (
                false,
                true,
                false,
                VerdictResult::Suspicious,
                "Email authenticity checks: SPF missing or invalid; DMARC missing or invalid; ",
            ),
            (
                true,
                false,
                false,
                VerdictResult::Suspicious,
                "Email authenticity checks: DKIM missing or invalid; DMARC missing or invalid; ",
            ),
            (
                false,
                false,
                false,
                VerdictResult::Suspicious,
                concat!(
                    "Email authenticity checks: SPF missing or invalid; ",
                    "DKIM missing or invalid; DMARC missing or invalid; "
                ),
            ),
        ] {
            let verdict = Verdict::compose("example.org", "example.org", spf, dkim, dmarc);
            assert_eq!(verdict.result(), result, "{spf} {dkim} {dmarc}");
            assert_eq!(verdict.message(), format!("{message}{MANUAL_CHECKS}"));
        }
    }

    #[test]
    fn verdict_domain_mismatch() {
        let verdict = Verdict::compose("x.com", "y.com", true, true, true);
        assert_eq!(verdict.result(), VerdictResult::Suspicious);
        assert_eq!(verdict.message(), DOMAIN_MISMATCH);
        assert!(!verdict.is_legitimate());
    }

    #[test]
    fn issue_count() {
        let records = RecordPresence {
            spf: Presence::Absent,
            dkim: Presence::Present,
            dmarc: Presence::Absent,
        };
        assert_eq!(records.issues(), 2);
        assert_eq!(
            RecordPresence {
                spf: Presence::Present,
                dkim: Presence::Absent,
                dmarc: Presence::Present,
            }
            .issues(),
            0
        );
    }

    #[test]
    fn verdict_serialize() {
        let verdict = Verdict::compose("x.com", "y.com", true, true, true);
        assert_eq!(
            serde_json::to_string(&verdict).unwrap(),
            r#"{"result":"Suspicious","message":"From and Return-Path domains do not match."}"#
        );
        assert_eq!(
            serde_json::to_value(Verdict::compose("x.com", "x.com", true, true, true)).unwrap()
                ["result"],
            "Legitimate"
        );
    }
}
