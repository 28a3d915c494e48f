//! ASCII armor inspection.

/// Armor type named by the first `-----BEGIN <type>-----` line, if any.
///
/// Only the header is inspected; the body is decoded by rPGP.
pub fn block_type(input: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(input).ok()?;
    text.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("-----BEGIN ")?.strip_suffix("-----"))
        .map(str::to_string)
}
