use crate::unicode::{utf8_to_utf16, utf16_to_display};

/// Largest valid array index, 2^32 - 2.
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(String),
    /// A key containing unpaired surrogates, kept as raw UTF-16 code units.
    /// Well-formed keys are always stored as `String`.
    Utf16(Vec<u16>),
}

impl PropertyKey {
    /// Returns the numeric value of this key when it is a canonical array
    /// index: no sign, no leading zeros except "0" itself, and below 2^32 - 1.
    pub fn as_array_index(&self) -> Option<u32> {
        let PropertyKey::String(s) = self else {
            return None;
        };
        if s.is_empty() || (s.len() > 1 && s.starts_with('0')) || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match s.parse::<u64>() {
            Ok(n) if n <= MAX_ARRAY_INDEX as u64 => Some(n as u32),
            _ => None,
        }
    }

    /// Build a key from UTF-16 code units without losing lone surrogates.
    pub fn from_utf16(units: &[u16]) -> Self {
        match String::from_utf16(units) {
            Ok(s) => PropertyKey::String(s),
            Err(_) => PropertyKey::Utf16(units.to_vec()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Utf16(_) => None,
        }
    }

    pub fn to_utf16(&self) -> Vec<u16> {
        match self {
            PropertyKey::String(s) => utf8_to_utf16(s),
            PropertyKey::Utf16(units) => units.clone(),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::String(s)
    }
}

impl From<&String> for PropertyKey {
    fn from(s: &String) -> Self {
        PropertyKey::String(s.clone())
    }
}

impl From<usize> for PropertyKey {
    fn from(index: usize) -> Self {
        PropertyKey::String(index.to_string())
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        PropertyKey::String(index.to_string())
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Utf16(units) => write!(f, "{}", utf16_to_display(units)),
        }
    }
}
