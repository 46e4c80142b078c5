//!
//! Validity-bound checking for `hs2019` signatures
//!

use super::Times;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Outcome of checking `created`/`expires` against the clock
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Problems that make the signature temporally questionable
    pub reasons: Vec<String>,

    /// Informational notes about the remaining validity window
    pub notes: Vec<String>,
}

impl Verdict {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Human-readable summary of the verdict
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.is_clean() {
            format!("The signature is valid, but {}", self.reasons.join("; "))
        } else if self.notes.is_empty() {
            "The signature is valid.".to_owned()
        } else {
            format!("The signature is valid. {}", self.notes.join("; "))
        }
    }
}

/// Check validity bounds against the given current time (seconds since epoch)
#[must_use]
pub fn check(now: u64, times: Times) -> Verdict {
    let mut verdict = Verdict::default();

    if let Some(created) = times.created {
        if created > now {
            verdict
                .reasons
                .push("the created time is in the future".to_owned());
        }
    }

    if let Some(expires) = times.expires {
        if now > expires {
            let delta = now - expires;
            verdict.reasons.push(format!(
                "the expiry time is in the past, {delta} {} ago (expired at {})",
                quantify(delta, "second"),
                rfc3339(expires),
            ));
        } else {
            let remaining = expires - now;
            verdict.notes.push(format!("expires: {}", rfc3339(expires)));
            verdict.notes.push(format!("now: {}", rfc3339(now)));
            verdict.notes.push(format!(
                "time remaining: {remaining} {}",
                quantify(remaining, "second"),
            ));
        }
    }

    verdict
}

fn quantify(quantity: u64, unit: &str) -> String {
    if quantity == 1 {
        unit.to_owned()
    } else {
        format!("{unit}s")
    }
}

fn rfc3339(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .and_then(|instant| instant.format(&Rfc3339).ok())
        .unwrap_or_else(|| timestamp.to_string())
}
