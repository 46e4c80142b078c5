use ring::hmac;

/// Signing key definition
pub trait SigningKey {
    /// Type the signature algorithm outputs
    type Output: AsRef<[u8]>;

    /// Sign a message
    fn sign(&self, msg: &[u8]) -> Self::Output;
}

impl SigningKey for hmac::Key {
    type Output = hmac::Tag;

    #[inline]
    fn sign(&self, msg: &[u8]) -> Self::Output {
        hmac::sign(self, msg)
    }
}

/// Sign a message with the provided signing key and return the raw signature bytes
#[inline]
pub fn sign<SK>(payload: &[u8], key: &SK) -> Vec<u8>
where
    SK: SigningKey,
{
    key.sign(payload).as_ref().to_vec()
}
