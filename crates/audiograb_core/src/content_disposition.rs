//! Suggested file name from a `Content-Disposition` header.

use percent_encoding::percent_decode_str;

/// Name used when the response carries no usable file name.
pub const FALLBACK_FILE_NAME: &str = "audio.mp3";

/// Extracts the suggested file name from an optional `Content-Disposition` value.
///
/// Preference order:
/// - `filename*=UTF-8''percent-encoded` (RFC 5987; decoded)
/// - `filename="value"` or `filename=value` (trimmed)
/// - [`FALLBACK_FILE_NAME`]
pub fn suggested_file_name(header_value: Option<&str>) -> String {
    header_value
        .and_then(parse_file_name)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

fn parse_file_name(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for param in header_value.split(';') {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("filename*") {
            if let Some(decoded) = decode_extended(value) {
                return Some(decoded);
            }
        } else if name.eq_ignore_ascii_case("filename") && plain.is_none() {
            let unquoted = value
                .strip_prefix('"')
                .map(|rest| rest.strip_suffix('"').unwrap_or(rest))
                .unwrap_or(value)
                .trim();
            if !unquoted.is_empty() {
                plain = Some(unquoted.to_string());
            }
        }
    }

    plain
}

fn decode_extended(value: &str) -> Option<String> {
    let value = value.trim_matches('"');
    let (charset, rest) = value.split_once('\'')?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    // Skip the language tag between the two single quotes.
    let (_language, encoded) = rest.split_once('\'')?;
    let decoded = percent_decode_str(encoded).decode_utf8_lossy();
    let decoded = decoded.trim();
    (!decoded.is_empty()).then(|| decoded.to_string())
}
