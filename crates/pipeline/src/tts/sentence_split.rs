//! Sentence boundary detection tolerant of abbreviations and decimals, used
//! by the TTS bridge to synthesise one sentence at a time.

const TERMINATORS: &[char] = &['.', '!', '?'];
const ABBREVIATIONS: &[&str] = &["mr", "mrs", "ms", "dr", "prof", "sr", "jr", "vs", "etc", "approx", "no"];

/// Splits `text` into sentences. A terminator is treated as a boundary
/// unless it is immediately preceded by a digit and followed by another
/// digit (a decimal point) or the word just before it is a known
/// abbreviation.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if TERMINATORS.contains(&c) {
            let next_is_digit = chars.get(i + 1).is_some_and(|c| c.is_ascii_digit());
            let prev_is_digit = i > 0 && chars[i - 1].is_ascii_digit();
            let is_decimal = c == '.' && prev_is_digit && next_is_digit;

            let followed_by_boundary =
                chars.get(i + 1).map_or(true, |c| c.is_whitespace());

            let is_abbreviation = preceding_word(&chars[start..i])
                .map(|w| ABBREVIATIONS.contains(&w.to_lowercase().as_str()))
                .unwrap_or(false);

            if followed_by_boundary && !is_decimal && !is_abbreviation {
                let sentence: String = chars[start..=i].iter().collect();
                let trimmed = sentence.trim();
                if !trimmed.is_empty() {
                    sentences.push(trimmed.to_string());
                }
                start = i + 1;
            }
        }
        i += 1;
    }

    if start < chars.len() {
        let remainder: String = chars[start..].iter().collect();
        let trimmed = remainder.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
    }

    sentences
}

fn preceding_word(chars: &[char]) -> Option<String> {
    let word: String = chars
        .iter()
        .rev()
        .take_while(|c| c.is_alphabetic())
        .collect();
    if word.is_empty() {
        None
    } else {
        Some(word.chars().rev().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_sentences() {
        let result = split_sentences("Hello there. How are you? I am fine!");
        assert_eq!(result, vec!["Hello there.", "How are you?", "I am fine!"]);
    }

    #[test]
    fn test_decimal_not_split() {
        let result = split_sentences("The rate is 3.5 percent.");
        assert_eq!(result, vec!["The rate is 3.5 percent."]);
    }

    #[test]
    fn test_abbreviation_not_split() {
        let result = split_sentences("Dr. Smith will see you now.");
        assert_eq!(result, vec!["Dr. Smith will see you now."]);
    }

    #[test]
    fn test_no_trailing_terminator() {
        let result = split_sentences("Just keep talking without stopping");
        assert_eq!(result, vec!["Just keep talking without stopping"]);
    }
}
