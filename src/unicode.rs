// Helper functions for UTF-16 string operations
pub fn utf8_to_utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

pub fn utf16_to_utf8(v: &[u16]) -> String {
    String::from_utf16_lossy(v)
}

/// Render a UTF-16 string for diagnostics, escaping lone surrogates
/// instead of replacing them so that messages stay faithful to the input.
pub fn utf16_to_display(v: &[u16]) -> String {
    let mut out = String::with_capacity(v.len());
    for item in char::decode_utf16(v.iter().copied()) {
        match item {
            Ok(c) => out.push(c),
            Err(e) => out.push_str(&format!("\\u{:04x}", e.unpaired_surrogate())),
        }
    }
    out
}
