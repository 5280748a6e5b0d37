use super::MediaPk;
use crate::error::PlatformError;
use url::Url;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Private posts carry a 28-character suffix after the public shortcode.
const PRIVATE_SUFFIX_LEN: usize = 28;

/// Decode a post shortcode into its media primary key.
pub fn media_pk_from_code(code: &str) -> Option<MediaPk> {
    if !code.is_ascii() {
        return None;
    }
    let code = if code.len() > PRIVATE_SUFFIX_LEN {
        &code[..code.len() - PRIVATE_SUFFIX_LEN]
    } else {
        code
    };
    if code.is_empty() {
        return None;
    }

    let mut pk: u64 = 0;
    for byte in code.bytes() {
        let digit = ALPHABET.iter().position(|&c| c == byte)? as u64;
        pk = pk.checked_mul(64)?.checked_add(digit)?;
    }
    Some(MediaPk(pk))
}

/// Extract the media primary key from a post URL such as
/// `https://www.instagram.com/p/<code>/`. Reel and IGTV links work too.
pub fn media_pk_from_url(post_url: &str) -> Result<MediaPk, PlatformError> {
    let invalid = || PlatformError::InvalidMediaUrl(post_url.to_string());

    let url = Url::parse(post_url).map_err(|_| invalid())?;
    let code = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(invalid)?;

    media_pk_from_code(code).ok_or_else(invalid)
}
