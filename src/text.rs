//! Turkish-aware text helpers shared by the pipeline stages.
//!
//! Rust's `str::to_lowercase` follows the root Unicode mapping, which turns
//! `I` into `i` and `İ` into `i` plus a combining dot. Turkish distinguishes
//! dotted and dotless i, so every stage that lowercases text for matching
//! goes through [`lowercase_turkish`] instead.

/// Lowercase a string with Turkish casing semantics: `I → ı`, `İ → i`,
/// everything else through the standard Unicode mapping.
pub fn lowercase_turkish(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            'I' => out.push('ı'),
            'İ' => out.push('i'),
            _ => out.extend(ch.to_lowercase()),
        }
    }
    out
}

/// Character positions of every occurrence of `term` in `text`, overlapping
/// occurrences included (the scan advances one character past each match).
///
/// Both arguments are expected to be lowercased already. Positions are in
/// character units, so distances between them are character distances even
/// in the presence of multi-byte Turkish letters.
pub fn char_positions(text: &str, term: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    if term.is_empty() {
        return positions;
    }
    let mut from = 0;
    while let Some(rel) = text[from..].find(term) {
        let byte_pos = from + rel;
        positions.push(text[..byte_pos].chars().count());
        let step = text[byte_pos..]
            .chars()
            .next()
            .map(|c| c.len_utf8())
            .unwrap_or(1);
        from = byte_pos + step;
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turkish_dotted_and_dotless_i() {
        assert_eq!(lowercase_turkish("Iğdır"), "ığdır");
        assert_eq!(lowercase_turkish("İstanbul"), "istanbul");
        assert_eq!(lowercase_turkish("KAYIT"), "kayıt");
    }

    #[test]
    fn test_other_turkish_letters_lowercase_normally() {
        assert_eq!(lowercase_turkish("ÇĞÖŞÜ"), "çğöşü");
        assert_eq!(lowercase_turkish("Öğrenci"), "öğrenci");
    }

    #[test]
    fn test_char_positions_are_overlapping() {
        // "aaaa" contains "aa" at 0, 1 and 2 when overlaps are allowed.
        assert_eq!(char_positions("aaaa", "aa"), vec![0, 1, 2]);
    }

    #[test]
    fn test_char_positions_count_characters_not_bytes() {
        // The match after two-byte letters must still be reported in
        // character units.
        assert_eq!(char_positions("öğrenci kaydı", "kaydı"), vec![8]);
    }

    #[test]
    fn test_char_positions_empty_term() {
        assert!(char_positions("kayıt", "").is_empty());
    }
}
