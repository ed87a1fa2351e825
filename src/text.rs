//! Conversion of free-form text of unknown encoding to UTF-8.

use std::{borrow::Cow, env};

use encoding_rs::{Encoding, WINDOWS_1252};

/// Environment variables consulted by default for the encoding of `COM` segments.
pub const DEFAULT_ENCODING_ENV: &[&str] = &["JPEGPARSE_TAG_ENCODING", "JPEGPARSE_ENCODING"];

/// Converts `data` to a UTF-8 string.
///
/// Valid UTF-8 is taken as-is. Otherwise, each variable in `env_vars` is read in order; a variable
/// may contain a list of encoding labels separated by `:` or `,`, which are tried in order. If
/// none of them decodes `data` without errors, it is decoded as ISO-8859-1.
///
/// Trailing NUL bytes and whitespace are removed. Returns `None` if nothing remains.
pub fn freeform_to_utf8<S: AsRef<str>>(data: &[u8], env_vars: &[S]) -> Option<String> {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let data = &data[..end];

    let text = match std::str::from_utf8(data) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => decode_with_env(data, env_vars).unwrap_or_else(|| {
            log::debug!("falling back to ISO-8859-1 for {} bytes of text", data.len());
            WINDOWS_1252.decode_without_bom_handling(data).0
        }),
    };

    let text = text.trim_end();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn decode_with_env<'a, S: AsRef<str>>(data: &'a [u8], env_vars: &[S]) -> Option<Cow<'a, str>> {
    for var in env_vars {
        let Ok(labels) = env::var(var.as_ref()) else {
            continue;
        };
        for label in labels.split([':', ',']) {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
                log::debug!("{}: unknown encoding '{}'", var.as_ref(), label);
                continue;
            };
            match encoding.decode_without_bom_handling_and_without_replacement(data) {
                Some(text) => return Some(text),
                None => log::debug!("text is not valid {}", encoding.name()),
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ENV: &[&str] = &[];

    #[test]
    fn utf8_passes_through() {
        assert_eq!(
            freeform_to_utf8("Grüße\0\0".as_bytes(), NO_ENV).as_deref(),
            Some("Grüße")
        );
        assert_eq!(
            freeform_to_utf8(b"  padded \n", NO_ENV).as_deref(),
            Some("  padded")
        );
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(freeform_to_utf8(b"", NO_ENV), None);
        assert_eq!(freeform_to_utf8(b"\0\0", NO_ENV), None);
        assert_eq!(freeform_to_utf8(b" \t ", NO_ENV), None);
    }

    #[test]
    fn latin1_fallback() {
        assert_eq!(
            freeform_to_utf8(b"caf\xe9", NO_ENV).as_deref(),
            Some("café")
        );
    }

    #[test]
    fn env_override() {
        // Variable names are unique to this test, since tests run concurrently.
        env::set_var("JPEGPARSE_TEST_ENCODING_A", "bogus-label, shift_jis");
        let vars = ["JPEGPARSE_TEST_ENCODING_UNSET", "JPEGPARSE_TEST_ENCODING_A"];
        // "日本" in Shift_JIS
        let sjis = b"\x93\xfa\x96\x7b";
        assert_eq!(freeform_to_utf8(sjis, &vars).as_deref(), Some("日本"));
    }

    #[test]
    fn env_override_that_fails_falls_back() {
        env::set_var("JPEGPARSE_TEST_ENCODING_B", "utf-8");
        let text = freeform_to_utf8(b"caf\xe9", &["JPEGPARSE_TEST_ENCODING_B"]);
        assert_eq!(text.as_deref(), Some("café"));
    }
}
