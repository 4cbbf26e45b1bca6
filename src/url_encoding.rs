use pct_str::{Encoder, InvalidPctString, PctStr, PctString};

// An owned error instead of InvalidPctString, which borrows the
// input and could then not travel inside anyhow::Error.

#[derive(Debug, thiserror::Error)]
#[error("url decoding error: {0}")]
pub struct UrlDecodingError(Box<String>);

impl From<InvalidPctString<&str>> for UrlDecodingError {
    fn from(e: InvalidPctString<&str>) -> Self {
        Self(Box::new(format!("{}", e)))
    }
}

/// Characters left alone in `application/x-www-form-urlencoded`
/// text; everything else is percent-encoded.
struct FormUnreserved;

impl Encoder for FormUnreserved {
    fn encode(&self, c: char) -> bool {
        !(c.is_ascii_alphanumeric() || matches!(c, '*' | '-' | '.' | '_'))
    }
}

/// Encode a key or value for a query string, with a space as `+`.
pub fn form_encode(s: &str) -> String {
    PctString::encode(s.chars(), FormUnreserved)
        .to_string()
        .replace("%20", "+")
}

pub fn url_decode(s: &str) -> Result<String, UrlDecodingError> {
    let p = PctStr::new(s)?;
    Ok(p.decode())
}

/// Decode a key or value of an `application/x-www-form-urlencoded`
/// query string, where `+` stands for a space.
pub fn form_decode(s: &str) -> Result<String, UrlDecodingError> {
    if s.contains('+') {
        url_decode(&s.replace('+', " "))
    } else {
        url_decode(s)
    }
}
