//! Control-character escaping for free-form payloads
//!
//! The companion escapes newline, carriage return and space in free-form
//! payloads so that one reply always fits on one line. A payload that
//! literally contains one of the bracket tokens is not representable.

/// Character/token pairs of the escape mapping
pub const ESCAPES: [(char, &str); 3] = [('\n', "[LF]"), ('\r', "[CR]"), (' ', "[SP]")];

/// Replace control characters with their bracket tokens
#[must_use]
pub fn escape(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    for c in payload.chars() {
        match ESCAPES.iter().find(|(raw, _)| *raw == c) {
            Some((_, token)) => out.push_str(token),
            None => out.push(c),
        }
    }
    out
}

/// Replace bracket tokens with the control characters they stand for
///
/// Single left-to-right pass, so a token produced by a replacement is never
/// reinterpreted.
#[must_use]
pub fn unescape(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len());
    let mut rest = payload;

    while let Some(pos) = rest.find('[') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        match ESCAPES.iter().find(|(_, token)| rest.starts_with(token)) {
            Some((raw, token)) => {
                out.push(*raw);
                rest = &rest[token.len()..];
            }
            None => {
                out.push('[');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

