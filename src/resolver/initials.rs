//! Name-to-initials derivation.

use std::sync::LazyLock;

use regex::Regex;

/// Runs of underscores, hyphens and whitespace separating name segments.
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\-\s]+").expect("separator pattern is valid"));

/// First and last code points of the CJK ideograph block that triggers the
/// "last two characters" rule.
const CJK_FIRST: char = '\u{4E00}';
const CJK_LAST: char = '\u{9FA5}';

/// Whether `c` is a CJK unified ideograph in U+4E00..=U+9FA5.
#[must_use]
pub fn is_cjk_ideograph(c: char) -> bool {
    (CJK_FIRST..=CJK_LAST).contains(&c)
}

/// Derive the badge text for a non-empty `name`.
///
/// `small` selects the single-character form used when the avatar's
/// shorter side is below the small-size threshold. Lengths are counted in
/// characters, not bytes.
#[must_use]
pub fn derive(name: &str, small: bool) -> String {
    let chars: Vec<char> = name.chars().collect();
    let Some(&first) = chars.first() else {
        return String::new();
    };

    if small {
        return first.to_uppercase().collect();
    }

    if chars.len() < 2 {
        return name.to_string();
    }

    if is_cjk_ideograph(first) {
        chars[chars.len() - 2..].iter().collect()
    } else if first.is_ascii_alphabetic() {
        if SEPARATORS.is_match(name) {
            segment_initials(name)
        } else {
            chars[..2].iter().collect::<String>().to_uppercase()
        }
    } else {
        chars[..2].iter().collect()
    }
}

/// Uppercased first letters of the first two separator-delimited segments.
/// An empty or missing second segment contributes nothing.
fn segment_initials(name: &str) -> String {
    SEPARATORS
        .split(name)
        .take(2)
        .filter_map(|segment| segment.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
