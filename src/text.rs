// Text normalization
// Sentence split, word tokenize, lowercase, drop short/non-alphabetic tokens and stopwords

use std::collections::HashSet;

use regex::Regex;

/// NLTK's English stopword list.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

/// Tokens must be longer than this many characters.
const MIN_TOKEN_CHARS: usize = 3;

/// English endings split off a word before filtering, as separate tokens.
const CLITICS: &[&str] = &[
    "n't", "'s", "'re", "'ve", "'ll", "'d", "'m",
    "n’t", "’s", "’re", "’ve", "’ll", "’d", "’m",
];

lazy_static::lazy_static! {
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]+(?:\s+|$)").unwrap();
    static ref WORD: Regex = Regex::new(r"\w+(?:['’\-]\w+)*").unwrap();
}

pub struct TextNormalizer {
    stopwords: HashSet<String>,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::with_stopwords(ENGLISH_STOPWORDS.iter().copied())
    }

    pub fn with_stopwords<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            stopwords: words.into_iter().map(str::to_lowercase).collect(),
        }
    }

    /// Lazy token stream over `text`; iterate it as many times as needed.
    pub fn normalize<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens {
            normalizer: self,
            text,
        }
    }

    fn keep(&self, token: &str) -> bool {
        token.chars().count() > MIN_TOKEN_CHARS
            && token.chars().any(|c| c.is_ascii_alphabetic())
            && !self.stopwords.contains(token)
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub struct Tokens<'a> {
    normalizer: &'a TextNormalizer,
    text: &'a str,
}

impl<'a> Tokens<'a> {
    pub fn iter(&self) -> impl Iterator<Item = String> + 'a {
        let normalizer = self.normalizer;
        SENTENCE_BREAK
            .split(self.text)
            .flat_map(|sentence| WORD.find_iter(sentence))
            .flat_map(|m| split_clitic(m.as_str().to_lowercase()))
            .filter(move |token| normalizer.keep(token))
    }
}

/// `layer's` -> `layer`, `'s`; `doesn't` -> `does`, `n't`.
fn split_clitic(token: String) -> Vec<String> {
    for suffix in CLITICS {
        if token.len() > suffix.len() && token.ends_with(suffix) {
            let stem = &token[..token.len() - suffix.len()];
            return vec![stem.to_string(), suffix.to_string()];
        }
    }
    vec![token]
}

impl<'a> IntoIterator for Tokens<'a> {
    type Item = String;
    type IntoIter = Box<dyn Iterator<Item = String> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        let normalizer = TextNormalizer::new();
        let out = normalizer.normalize(text).iter().collect();
        out
    }

    #[test]
    fn lowercases_and_drops_short_tokens() {
        assert_eq!(
            tokens("The Gradient of the LOSS is zero. Why?"),
            vec!["gradient", "loss", "zero"]
        );
    }

    #[test]
    fn drops_numeric_and_stopword_tokens() {
        let out = tokens("Question 2021 about matrices should have 12345 rows");
        assert_eq!(out, vec!["question", "matrices", "rows"]);
    }

    #[test]
    fn keeps_mixed_alphanumeric_tokens() {
        assert_eq!(tokens("See hw3b and x_1234"), vec!["hw3b", "x_1234"]);
    }

    #[test]
    fn splits_on_sentences_and_punctuation() {
        let out = tokens("Kernel trick works.Really? Yes! Regularization, please.");
        assert!(out.contains(&"kernel".to_string()));
        assert!(out.contains(&"regularization".to_string()));
        assert!(out.contains(&"please".to_string()));
        assert!(out.iter().all(|t| !t.contains(',')));
    }

    #[test]
    fn possessives_share_the_base_term() {
        assert_eq!(
            tokens("The layer's output feeds the next layer"),
            vec!["layer", "output", "feeds", "next", "layer"]
        );
    }

    #[test]
    fn contractions_are_split_off() {
        assert_eq!(split_clitic("couldn't".into()), vec!["could", "n't"]);
        assert_eq!(split_clitic("they’ll".into()), vec!["they", "’ll"]);
        assert_eq!(split_clitic("o'brien".into()), vec!["o'brien"]);
        assert_eq!(
            tokens("Gradient doesn’t vanish, weights won't explode"),
            vec!["gradient", "vanish", "weights", "explode"]
        );
    }

    #[test]
    fn normalizing_twice_is_idempotent() {
        let once = tokens("Does the Softmax layer's output sum to one? Hint: normalization!");
        let twice = tokens(&once.join(" "));
        assert_eq!(once, twice);
    }

    #[test]
    fn stream_can_be_restarted() {
        let normalizer = TextNormalizer::new();
        let stream = normalizer.normalize("Backpropagation through convolution layers");
        let first: Vec<String> = stream.iter().collect();
        let second: Vec<String> = stream.into_iter().collect();
        assert_eq!(first, second);
        // "through" is a stopword.
        assert_eq!(first, vec!["backpropagation", "convolution", "layers"]);
    }

    #[test]
    fn short_or_symbolic_tokens_never_survive() {
        let out = tokens("a an ab abc !!!! ---- 1234 2.5e10 ok");
        assert!(out.iter().all(|t| t.chars().count() > 3));
        assert!(out.iter().all(|t| t.chars().any(|c| c.is_ascii_alphabetic())));
    }
}
