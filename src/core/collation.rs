use std::cmp::Ordering;

/// Collation weight class of a character. Lower classes sort first.
fn char_class(c: char) -> u8 {
    if c.is_whitespace() || c.is_control() {
        0
    } else if c.is_alphabetic() {
        3
    } else if c.is_numeric() {
        2
    } else {
        1
    }
}

fn primary_weights(name: &str) -> impl Iterator<Item = (u8, char)> + '_ {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| (char_class(c), c))
}

fn case_weights(name: &str) -> impl Iterator<Item = bool> + '_ {
    name.chars().map(char::is_uppercase)
}

/// Locale-style ordering for community names.
///
/// The primary key walks the case-folded characters, ranking whitespace,
/// then punctuation and symbols, then digits, then letters, so `_meta` sorts
/// before `3dprinting` and `a_b` before `a1`. Names that differ only in case
/// put the lowercase spelling first.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_weights(a)
        .cmp(primary_weights(b))
        .then_with(|| case_weights(a).cmp(case_weights(b)))
        .then_with(|| a.cmp(b))
}
