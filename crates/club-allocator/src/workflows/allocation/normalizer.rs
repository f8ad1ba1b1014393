/// Folds text for comparisons: strips zero-width marks, collapses whitespace, lowercases.
pub(crate) fn normalize_text(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Key under which a pupil's prior allocations are stored.
pub(crate) fn history_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Upper-cases the first letter of every word and leaves the rest untouched.
pub(crate) fn capitalize_words(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if at_word_start && !ch.is_whitespace() {
            result.extend(ch.to_uppercase());
        } else {
            result.push(ch);
        }
        at_word_start = ch.is_whitespace();
    }
    result
}

/// Lowercases everything, then capitalizes each word.
///
/// Intentional inner capitals are lost ("McDonald" becomes "Mcdonald").
pub fn title_case(value: &str) -> String {
    capitalize_words(&value.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_removes_whitespace_and_case() {
        let source = "\u{feff}Art  and   Craft ";
        assert_eq!(normalize_text(source), "art and craft");
    }

    #[test]
    fn capitalize_words_keeps_inner_capitals() {
        assert_eq!(capitalize_words("iMovie club"), "IMovie Club");
        assert_eq!(capitalize_words("ICT  club"), "ICT  Club");
    }

    #[test]
    fn title_case_lowercases_first() {
        assert_eq!(title_case("ANNA mcDonald"), "Anna Mcdonald");
    }

    #[test]
    fn history_key_trims_and_lowercases() {
        assert_eq!(history_key("  Anna Smith "), "anna smith");
    }
}
