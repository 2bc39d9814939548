use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Lowercased forms, trailing period dropped, of abbreviations that end with a
/// period without ending the sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "rev", "hon", "gen", "col", "lt", "sgt", "capt", "st",
    "jr", "sr", "vs", "e.g", "i.e", "cf", "al", "etc", "approx", "dept", "inc", "co", "corp",
    "ltd", "no", "fig", "vol", "pp", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec", "u.s", "u.k",
];

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\W\d_](?:[^\W\d_]|['-])*$").expect("word pattern is valid")
});

/// Splits plain text into sentences the way a reader would see them.
///
/// Blank lines separate paragraphs. Lines written entirely in upper case are
/// headings and never become sentences. The remaining lines of a paragraph are
/// rejoined with spaces before segmenting, so hard-wrapped text does not break
/// mid-sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut sentences);
        } else if !is_heading(line) {
            paragraph.push(line);
        }
    }
    flush_paragraph(&mut paragraph, &mut sentences);

    sentences
}

fn flush_paragraph(paragraph: &mut Vec<&str>, sentences: &mut Vec<String>) {
    if paragraph.is_empty() {
        return;
    }
    let joined = paragraph.join(" ");
    let mut pending: Option<String> = None;

    for segment in joined.unicode_sentences().map(str::trim).filter(|s| !s.is_empty()) {
        let sentence = match pending.take() {
            Some(mut head) => {
                head.push(' ');
                head.push_str(segment);
                head
            }
            None => segment.to_string(),
        };
        if ends_with_abbreviation(&sentence) {
            pending = Some(sentence);
        } else {
            sentences.push(sentence);
        }
    }
    sentences.extend(pending);
    paragraph.clear();
}

/// `"Dr."`, `"(e.g."`, `"Acme Inc."`: the segment stops on a known abbreviation
/// rather than a sentence end.
fn ends_with_abbreviation(segment: &str) -> bool {
    let Some(stem) = segment.strip_suffix('.') else {
        return false;
    };
    let Some(last) = stem.split_whitespace().last() else {
        return false;
    };
    let last = last.trim_start_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
    ABBREVIATIONS.contains(&last.as_str())
}

fn is_heading(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}

/// Lowercased words of a sentence. Tokens with digits or underscores, and
/// bare punctuation, are dropped.
pub fn sentence_words(sentence: &str) -> Vec<String> {
    sentence
        .unicode_words()
        .filter(|w| WORD_PATTERN.is_match(w))
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_lines_are_rejoined() {
        let text = "The quick brown fox\njumps over the dog. It ran away.";
        assert_eq!(
            split_sentences(text),
            vec!["The quick brown fox jumps over the dog.", "It ran away."]
        );
    }

    #[test]
    fn upper_case_lines_are_headings() {
        let text = "INTRODUCTION\nThis is the body.\n\nSECOND PART\nMore text here.";
        assert_eq!(split_sentences(text), vec!["This is the body.", "More text here."]);
    }

    #[test]
    fn titles_do_not_end_sentences() {
        let text = "Dr. Smith arrived in town. He spoke at length. They left early.";
        assert_eq!(
            split_sentences(text),
            vec!["Dr. Smith arrived in town.", "He spoke at length.", "They left early."]
        );
    }

    #[test]
    fn abbreviations_inside_sentences_are_kept() {
        let text = "Acme Inc. hired Mrs. Jones. Sales grew (e.g. In Ohio) fast.";
        assert_eq!(
            split_sentences(text),
            vec!["Acme Inc. hired Mrs. Jones.", "Sales grew (e.g. In Ohio) fast."]
        );
    }

    #[test]
    fn numbers_are_not_words() {
        assert_eq!(sentence_words("She started in 2020."), vec!["she", "started", "in"]);
    }
}
