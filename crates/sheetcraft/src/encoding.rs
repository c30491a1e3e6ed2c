//! Character encoding applied to every string a writer emits

use std::borrow::Cow;
use std::fmt;

use crate::error::{ExcelIoError, Result};

/// A character set that written text is normalized through.
///
/// XLSX stores text as UTF-8 regardless; normalizing means characters the
/// chosen charset cannot represent are replaced with `?`, as they would be
/// after a byte-level round trip through that charset.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Encoding(&'static encoding_rs::Encoding);

impl Encoding {
    pub const UTF_8: Encoding = Encoding(encoding_rs::UTF_8);

    /// Look up a charset by WHATWG label (`"utf-8"`, `"ISO-8859-1"`, `"Shift_JIS"`, ...)
    pub fn for_label(label: &str) -> Result<Self> {
        encoding_rs::Encoding::for_label(label.trim().as_bytes())
            .map(Encoding)
            .ok_or_else(|| ExcelIoError::new(format!("Unsupported encoding: {}", label)))
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Round-trip `text` through this charset
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        // UTF-16 labels encode to UTF-8 per WHATWG
        let charset = self.0.output_encoding();
        if charset == encoding_rs::UTF_8 || text.is_ascii() {
            return Cow::Borrowed(text);
        }
        let (_, _, unmappable) = charset.encode(text);
        if !unmappable {
            return Cow::Borrowed(text);
        }

        let mut buf = [0u8; 4];
        let replaced = text
            .chars()
            .map(|c| {
                let (_, _, bad) = charset.encode(c.encode_utf8(&mut buf));
                if bad {
                    '?'
                } else {
                    c
                }
            })
            .collect();
        Cow::Owned(replaced)
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self::UTF_8
    }
}

impl fmt::Debug for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Encoding").field(&self.name()).finish()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
