const MAX_STEM_LEN: usize = 100;
const MAX_EXTENSION_LEN: usize = 8;
const DEFAULT_STEM: &str = "audio";

/// Makes a server-suggested file name safe to create on Windows and Unix.
///
/// Path separators and other forbidden characters become `_`, the stem is
/// trimmed and capped, reserved device names get a trailing `_`, and the
/// extension is kept.
pub fn safe_file_name(suggested: &str) -> String {
    let cleaned: String = suggested
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&[' ', '.'][..]);

    let (stem, extension) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) if is_plausible_extension(ext) => (stem, Some(ext)),
        _ => (cleaned, None),
    };

    let mut stem = collapse_underscores(stem.trim_matches(&['_', ' ', '.'][..]));
    if stem.is_empty() {
        stem = DEFAULT_STEM.to_string();
    }
    truncate_on_char_boundary(&mut stem, MAX_STEM_LEN);
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }

    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn is_plausible_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= MAX_EXTENSION_LEN && ext.chars().all(char::is_alphanumeric)
}

fn collapse_underscores(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    compacted
}

fn truncate_on_char_boundary(value: &mut String, max_len: usize) {
    if value.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value.truncate(end);
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
