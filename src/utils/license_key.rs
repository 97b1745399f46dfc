/// Characters per block in the displayed key
pub const BLOCK_WIDTH: usize = 4;

/// Strip separators and case: the form sent to verification
/// "abcd-1234 efgh" -> "ABCD1234EFGH"
pub fn normalize_license_key(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Display form while typing: upper-cased blocks of four joined by '-'
/// "abcd1234ef" -> "ABCD-1234-EF"
pub fn format_license_key(input: &str) -> String {
    let normalized = normalize_license_key(input);
    normalized
        .as_bytes()
        .chunks(BLOCK_WIDTH)
        // normalized is ASCII only
        .map(|block| String::from_utf8_lossy(block).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}
