use crate::util::{error_kaomoji, success_kaomoji};
use httpsig::cavage;

pub fn do_it(header: &'static str) -> miette::Result<()> {
    let parsed = match cavage::parse(header) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("❌ Header failed to parse {}", error_kaomoji());
            return Err(miette::Error::new(err).with_source_code(header));
        }
    };

    println!("✅ Header is valid! {}", success_kaomoji());
    println!();
    println!("algorithm: {}", parsed.algorithm);
    println!("keyId:     {}", parsed.key_id);
    println!("headers:   {}", parsed.headers.join(" "));
    if let Some(created) = parsed.created {
        println!("created:   {created}");
    }
    if let Some(expires) = parsed.expires {
        println!("expires:   {expires}");
    }
    println!("signature: {}", parsed.signature);

    Ok(())
}
