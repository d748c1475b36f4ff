//! Flattening of the base64 page.
//!
//! The page is a list of entries separated by `***`. Entry links are often
//! published base64-encoded inside inline code spans, with the `=` padding
//! removed. Each entry becomes one searchable line.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;
use tracing::trace;

/// Section separator on the page.
const SECTION_SEPARATOR: &str = "***";

/// Standard alphabet, tolerant of non-zero trailing bits in the last quantum.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// An inline code span, backticks included.
static CODE_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]+`").expect("code span regex"));

/// Split the page into sections and flatten each one into a single line
/// prefixed with a link to `page_url`.
///
/// One line is produced per `***`-separated section, in page order.
pub fn extract_sections(page: &str, page_url: &str, decode: bool) -> Vec<String> {
    page.split(SECTION_SEPARATOR)
        .map(|section| {
            let flattened = section
                .trim()
                .replace("#### ", "")
                .replace("\n\n", " - ")
                .replace('\n', ", ");
            let flattened = remove_blank_lines(&flattened);
            let body = if decode {
                decode_backtick_spans(&flattened)
            } else {
                flattened
            };
            format!("[🔑Base64]({page_url}) ► {body}")
        })
        .collect()
}

/// Replace every code span whose content decodes to readable text.
///
/// Spans that are not valid base64, or that decode to bytes which are not
/// UTF-8 text, are left exactly as they were.
pub fn decode_backtick_spans(text: &str) -> String {
    CODE_SPAN_RE
        .replace_all(text, |caps: &regex::Captures| {
            let span = &caps[0];
            let inner = &span[1..span.len() - 1];
            match decode_readable(inner) {
                Some(decoded) => decoded,
                None => {
                    trace!(span, "code span left undecoded");
                    span.to_string()
                }
            }
        })
        .into_owned()
}

/// Append `=` until the length is a multiple of four.
pub fn restore_padding(encoded: &str) -> String {
    let missing = encoded.len() % 4;
    if missing == 0 {
        return encoded.to_string();
    }
    format!("{encoded}{}", "=".repeat(4 - missing))
}

fn decode_readable(encoded: &str) -> Option<String> {
    let bytes = LENIENT.decode(restore_padding(encoded)).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return None;
    }
    Some(text)
}

fn remove_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
