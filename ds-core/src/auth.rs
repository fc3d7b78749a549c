use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pwhash::md5_crypt;

/// Produces the value stored in the basic-auth annotation: the base64 encoding of
/// `username:hash`, where `hash` is a salted MD5-crypt (`$1$`) digest of the password.  This is
/// the one htpasswd format both nginx (through crypt(3)) and Traefik accept.
pub fn encode_basic_auth(username: &str, password: &str) -> anyhow::Result<String> {
    let hash = md5_crypt::hash(password).context("hashing basic auth password")?;
    Ok(STANDARD.encode(format!("{username}:{hash}")))
}

pub fn verify_basic_auth(encoded: &str, username: &str, password: &str) -> bool {
    let Ok(decoded) = STANDARD.decode(encoded) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };

    match decoded.split_once(':') {
        Some((user, hash)) => user == username && md5_crypt::verify(password, hash),
        None => false,
    }
}
