//! Extractive summarization.
//!
//! [`TextRank`] scores every sentence of a text by running weighted PageRank
//! over a graph whose edges are word-overlap similarities, then returns the
//! highest scoring sentences verbatim.

use anyhow::Result;
use std::collections::HashSet;

/// Picks representative sentences out of plain text.
pub trait Summarizer: Send + Sync {
    /// Returns at most `count` sentences from `text`, best first. An empty
    /// vector means the text had no usable sentence.
    fn key_sentences(&self, text: &str, count: usize) -> Result<Vec<String>>;
}

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "he",
    "her", "his", "i", "if", "in", "into", "is", "it", "its", "of", "on", "or", "our", "she",
    "so", "that", "the", "their", "them", "then", "there", "these", "they", "this", "to", "was",
    "we", "were", "what", "when", "which", "who", "will", "with", "you", "your", "的", "了", "是",
    "在", "和", "也", "就", "都", "而", "及", "与", "着", "或", "之", "其", "这", "那", "个", "我",
    "你", "他", "她", "它", "们", "吗", "呢", "吧", "啊",
];

#[derive(Debug, Clone)]
pub struct TextRank {
    /// Sentences shorter than this many characters are scored but never returned.
    pub min_sentence_len: usize,
    pub damping: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Only this many leading sentences become graph nodes; the similarity
    /// matrix grows with its square.
    pub max_sentences: usize,
}

impl Default for TextRank {
    fn default() -> Self {
        Self {
            min_sentence_len: 6,
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1.0e-6,
            max_sentences: 200,
        }
    }
}

impl TextRank {
    pub fn new(min_sentence_len: usize) -> Self {
        Self {
            min_sentence_len,
            ..Self::default()
        }
    }

    /// Sentences of `text` paired with their score, in original order.
    pub fn rank(&self, text: &str) -> Vec<(String, f64)> {
        let mut sentences = split_sentences(text);
        sentences.truncate(self.max_sentences);
        let words: Vec<Vec<String>> = sentences.iter().map(|s| sentence_words(s)).collect();

        let n = sentences.len();
        let mut weights = vec![vec![0.0; n]; n];
        for x in 0..n {
            for y in x..n {
                let w = similarity(&words[x], &words[y]);
                weights[x][y] = w;
                weights[y][x] = w;
            }
        }

        let scores = self.pagerank(&weights);
        sentences.into_iter().zip(scores).collect()
    }

    fn pagerank(&self, weights: &[Vec<f64>]) -> Vec<f64> {
        let n = weights.len();
        if n == 0 {
            return Vec::new();
        }

        let uniform = 1.0 / n as f64;
        let out_weight: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();
        let mut scores = vec![uniform; n];

        for _ in 0..self.max_iterations {
            let dangling: f64 = (0..n)
                .filter(|&j| out_weight[j] <= 0.0)
                .map(|j| scores[j])
                .sum();

            let next: Vec<f64> = (0..n)
                .map(|i| {
                    let incoming: f64 = (0..n)
                        .filter(|&j| out_weight[j] > 0.0)
                        .map(|j| scores[j] * weights[j][i] / out_weight[j])
                        .sum();
                    self.damping * (incoming + dangling * uniform) + (1.0 - self.damping) * uniform
                })
                .collect();

            let delta: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
            scores = next;
            if delta < n as f64 * self.tolerance {
                break;
            }
        }

        scores
    }
}

impl Summarizer for TextRank {
    fn key_sentences(&self, text: &str, count: usize) -> Result<Vec<String>> {
        let mut ranked: Vec<(usize, String, f64)> = self
            .rank(text)
            .into_iter()
            .enumerate()
            .map(|(idx, (sentence, score))| (idx, sentence, score))
            .collect();

        ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));

        Ok(ranked
            .into_iter()
            .filter(|(_, sentence, _)| sentence.chars().count() >= self.min_sentence_len)
            .take(count)
            .map(|(_, sentence, _)| sentence)
            .collect())
    }
}

/// Splits on CJK sentence punctuation, newlines, and ASCII `. ! ? ;` when they
/// are followed by whitespace or the end of text. Delimiters are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let boundary = match c {
            '\n' | '。' | '？' | '！' | '；' | '…' => true,
            '.' | '!' | '?' | ';' => chars.get(i + 1).map_or(true, |next| next.is_whitespace()),
            _ => false,
        };

        if boundary {
            flush_sentence(&mut sentences, &mut current);
        } else {
            current.push(c);
        }
    }
    flush_sentence(&mut sentences, &mut current);

    sentences
}

fn flush_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{F900}'..='\u{FAFF}')
}

/// Lower-cased word tokens with stop words removed. CJK text has no spaces,
/// so each ideograph counts as its own token.
fn sentence_words(sentence: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    for c in sentence.chars() {
        if is_cjk(c) {
            flush_word(&mut words, &mut current);
            words.push(c.to_string());
        } else if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else {
            flush_word(&mut words, &mut current);
        }
    }
    flush_word(&mut words, &mut current);

    words.retain(|w| !STOP_WORDS.contains(&w.as_str()));
    words
}

fn flush_word(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

/// Distinct shared words over the log-lengths of both sentences.
fn similarity(a: &[String], b: &[String]) -> f64 {
    let a_set: HashSet<&String> = a.iter().collect();
    let shared = b
        .iter()
        .collect::<HashSet<_>>()
        .intersection(&a_set)
        .count();
    if shared == 0 {
        return 0.0;
    }

    let denominator = (a.len() as f64).ln() + (b.len() as f64).ln();
    if denominator.abs() < 1.0e-12 {
        return 0.0;
    }
    shared as f64 / denominator
}
