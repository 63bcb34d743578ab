//! Channel name hygiene shared by every reader.

use std::collections::HashSet;

/// Characters that cannot appear in a cleaned channel name
pub const ILLEGAL_CHANNEL_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Clean a raw channel name: trim, strip surrounding quotes, normalise path
/// separators to `/`, and replace illegal characters with `_`.
pub fn clean_channel_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .trim_matches(|c| c == '\'' || c == '"')
        .trim();

    unquoted
        .chars()
        .map(|c| match c {
            '\\' => '/',
            c if c.is_control() || ILLEGAL_CHANNEL_CHARS.contains(&c) => '_',
            c => c,
        })
        .collect()
}

/// Keep the first occurrence of every name, preserving order
pub fn dedupe_channels<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(Into::into)
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_quotes_and_whitespace() {
        assert_eq!(clean_channel_name("  'Pressure'  "), "Pressure");
        assert_eq!(clean_channel_name("\"Temp 1\""), "Temp 1");
    }

    #[test]
    fn test_clean_normalises_separators_and_illegal_chars() {
        assert_eq!(clean_channel_name("Group\\Channel"), "Group/Channel");
        assert_eq!(clean_channel_name("Flow<l/min>"), "Flow_l/min_");
        assert_eq!(clean_channel_name("a:b|c?d*"), "a_b_c_d_");
    }

    #[test]
    fn test_dedupe_first_occurrence_wins() {
        let names = dedupe_channels(["Time", "P1", "Time", "P2", "P1"]);
        assert_eq!(names, vec!["Time", "P1", "P2"]);
    }
}
