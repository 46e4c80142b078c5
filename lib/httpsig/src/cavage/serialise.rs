use super::SignatureHeader;
use std::fmt::Write;

/// Render a parameter set into the full `Signature …` header text
#[inline]
#[must_use]
pub fn serialise(header: &SignatureHeader<'_>) -> String {
    let mut buffer = String::from("Signature ");

    let _ = write!(buffer, "keyId=\"{}\"", header.key_id);
    let _ = write!(buffer, ", algorithm=\"{}\"", header.algorithm);

    buffer.push_str(", headers=\"");
    for item in itertools::intersperse(header.headers.iter().copied(), " ") {
        buffer.push_str(item);
    }
    buffer.push('"');

    if let Some(created) = header.created {
        let _ = write!(buffer, ", created={created}");
    }
    if let Some(expires) = header.expires {
        let _ = write!(buffer, ", expires={expires}");
    }

    let _ = write!(buffer, ", signature=\"{}\"", header.signature);

    buffer
}
