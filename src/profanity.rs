//! Disallowed-word policy for review texts
//!
//! The host configures a list of disallowed substrings
//! (`reviews.profanity_list`); matching is case-insensitive and applies to
//! the review body and every segment text. Offending words are reported in
//! the validation message with their middle masked, so the error itself
//! stays printable.

/// Find configured words contained in `text`, case-insensitively.
/// Returned words keep the casing they have in the configured list.
pub fn disallowed_words<'a>(text: &str, word_list: &'a [String]) -> Vec<&'a str> {
    let lower = text.to_lowercase();
    word_list
        .iter()
        .filter(|w| !w.is_empty() && lower.contains(&w.to_lowercase()))
        .map(|w| w.as_str())
        .collect()
}

/// Mask the middle of a word: "frogs" becomes "f---s".
/// One- and two-letter words are returned unchanged.
pub fn mask(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() <= 2 {
        return word.to_string();
    }
    let mut masked = String::new();
    masked.push(chars[0]);
    for _ in 0..chars.len() - 2 {
        masked.push('-');
    }
    masked.push(chars[chars.len() - 1]);
    masked
}

/// Check `text` against the configured policy.
///
/// Returns the validation message naming the offending word(s) when the
/// policy is enabled and at least one disallowed word appears.
pub fn check(text: &str) -> Result<(), String> {
    let policy = crate::app_config::reviews();
    if policy.allow_profanities {
        return Ok(());
    }

    let bad_words = disallowed_words(text, &policy.profanity_list);
    if bad_words.is_empty() {
        return Ok(());
    }

    let listed = bad_words
        .iter()
        .map(|w| format!("\"{}\"", mask(w)))
        .collect::<Vec<_>>()
        .join(" and ");
    if bad_words.len() == 1 {
        Err(format!(
            "Watch your mouth! The word {} is not allowed here.",
            listed
        ))
    } else {
        Err(format!(
            "Watch your mouth! The words {} are not allowed here.",
            listed
        ))
    }
}
