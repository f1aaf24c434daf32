//! Decoding of `application/x-www-form-urlencoded` data.
//!
//! Bodies are checked for malformed escapes and `;` separators before
//! `url::form_urlencoded` decodes them. Invalid UTF-8 in a decoded value is
//! replaced, not rejected.

use thiserror::Error;
use url::form_urlencoded;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid percent escape at byte {0}")]
    InvalidEscape(usize),

    #[error("invalid semicolon separator")]
    Semicolon,
}

/// Decoded key/value pairs in their original order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormValues {
    pairs: Vec<(String, String)>,
}

impl FormValues {
    /// Decodes a form body, failing on a malformed escape or separator.
    pub fn parse(input: &[u8]) -> Result<Self, FormError> {
        validate(input)?;
        Ok(Self::parse_lenient(input))
    }

    /// Decodes form data as is. Used for query strings.
    pub fn parse_lenient(input: &[u8]) -> Self {
        let pairs = form_urlencoded::parse(input)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        FormValues { pairs }
    }

    /// Returns the first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn validate(input: &[u8]) -> Result<(), FormError> {
    if input.contains(&b';') {
        return Err(FormError::Semicolon);
    }

    for (i, _) in input.iter().enumerate().filter(|(_, b)| **b == b'%') {
        let escape = input.get(i + 1..i + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            return Err(FormError::InvalidEscape(i));
        }
    }

    Ok(())
}
