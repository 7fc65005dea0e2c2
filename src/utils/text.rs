use encoding_rs::WINDOWS_1252;
use std::fmt;

/// Bytes Windows-1252 leaves unassigned. WHATWG (and so `encoding_rs`)
/// maps them to C1 controls, but a body containing them is not cp1252.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Windows1252,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Windows1252 => write!(f, "windows-1252"),
        }
    }
}

/// Decode as UTF-8, falling back to Windows-1252. `None` when neither fits.
pub fn decode_text(bytes: &[u8]) -> Option<(String, TextEncoding)> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some((text.to_string(), TextEncoding::Utf8));
    }

    decode_windows_1252(bytes).map(|text| (text, TextEncoding::Windows1252))
}

fn decode_windows_1252(bytes: &[u8]) -> Option<String> {
    if bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
        return None;
    }

    WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}
