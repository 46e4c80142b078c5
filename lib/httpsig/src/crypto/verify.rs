use super::key::VerifyingKey;
use ring::hmac;

/// Verify that the message corresponds with the Base64-coded signature
///
/// A cryptographic mismatch is a normal `false` result; only an undecodable
/// signature payload is an error.
#[inline]
pub fn verify(
    msg: &[u8],
    encoded_signature: &str,
    key: &VerifyingKey,
) -> Result<bool, base64_simd::Error> {
    let signature = base64_simd::STANDARD.decode_to_vec(encoded_signature)?;

    let valid = match key {
        VerifyingKey::Hmac(key) => hmac::verify(key, msg, &signature).is_ok(),
        VerifyingKey::Rsa(key) => key.verify(msg, &signature).is_ok(),
    };

    Ok(valid)
}
