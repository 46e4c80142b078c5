//!
//! Utilities for building the canonical string-to-sign
//!

use super::{HeaderSet, Times};
use miette::Diagnostic;
use std::fmt::Write;
use thiserror::Error;

/// Signature string error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// A name from the signing order has no value in the header set
    #[error("no `{name}` header to sign")]
    MissingHeaderValue { name: String },

    /// The signing order references a pseudo-header the header never carried
    #[error("the signing order names `({name})` but no `{name}` timestamp is present")]
    MissingTimestamp { name: &'static str },
}

/// Build the exact byte string that is signed
///
/// With an explicit `ordering` (the verification path, taken from the parsed
/// `headers` parameter) the names are walked in that exact order, mapping the
/// `created`/`expires` entries to their pseudo-header lines; both the bare
/// and the parenthesised spellings are accepted. Without an ordering (the
/// generation path) the headers are walked in insertion order and the
/// pseudo-header lines are appended at the end.
///
/// Lines are joined with a single `\n`, no trailing newline. Any deviation
/// produces a different signature, so this must stay bit-exact and symmetric
/// between generation and verification.
#[inline]
pub fn construct(
    headers: &HeaderSet,
    times: Times,
    ordering: Option<&[&str]>,
) -> Result<String, Error> {
    let mut signature_string = String::new();

    if let Some(ordering) = ordering {
        for name in ordering {
            match *name {
                "created" | "(created)" => {
                    let created = times.created.ok_or(Error::MissingTimestamp { name: "created" })?;
                    let _ = writeln!(signature_string, "(created): {created}");
                }
                "expires" | "(expires)" => {
                    let expires = times.expires.ok_or(Error::MissingTimestamp { name: "expires" })?;
                    let _ = writeln!(signature_string, "(expires): {expires}");
                }
                name => {
                    let value = headers.get(name).ok_or_else(|| Error::MissingHeaderValue {
                        name: name.to_owned(),
                    })?;

                    let _ = writeln!(signature_string, "{}: {value}", name.to_lowercase());
                }
            }
        }
    } else {
        for (name, value) in headers.iter() {
            let _ = writeln!(signature_string, "{name}: {value}");
        }

        if let Some(created) = times.created {
            let _ = writeln!(signature_string, "(created): {created}");
        }
        if let Some(expires) = times.expires {
            let _ = writeln!(signature_string, "(expires): {expires}");
        }
    }

    // Remove the last new-line
    signature_string.pop();

    Ok(signature_string)
}
