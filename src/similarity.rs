//! # Text Similarity Module
//!
//! Token-level similarity between two OCR transcriptions. Both texts are split on
//! whitespace and compared with a unit-cost Levenshtein distance over words, giving
//! a percentage where 100 means the word sequences are identical.

/// Minimum number of word insertions, deletions and substitutions turning `a` into `b`.
///
/// Standard O(n·m) dynamic-programming table.
pub fn word_edit_distance<S: AsRef<str>>(a: &[S], b: &[S]) -> usize {
    let n = a.len();
    let m = b.len();

    let mut d = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        d[0][j] = j;
    }

    for i in 1..=n {
        for j in 1..=m {
            d[i][j] = if a[i - 1].as_ref() == b[j - 1].as_ref() {
                d[i - 1][j - 1]
            } else {
                1 + d[i - 1][j].min(d[i][j - 1]).min(d[i - 1][j - 1])
            };
        }
    }

    d[n][m]
}

/// Word-level accuracy of `text` against `reference`, in percent.
///
/// `accuracy = (max(n, m) - distance) / max(n, m) * 100`. Two texts without any
/// words are treated as a perfect match and score 100.
///
/// # Examples
///
/// ```
/// use scan_sweep::similarity::calculate_accuracy;
///
/// assert_eq!(calculate_accuracy("HELLO WORLD", "HELLO WORLD"), 100.0);
/// assert_eq!(calculate_accuracy("HXLLO WORLD", "HELLO WORLD"), 50.0);
/// assert_eq!(calculate_accuracy("", "  \n"), 100.0);
/// ```
pub fn calculate_accuracy(text: &str, reference: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    let reference_words: Vec<&str> = reference.split_whitespace().collect();

    let max_len = words.len().max(reference_words.len());
    if max_len == 0 {
        return 100.0;
    }

    let distance = word_edit_distance(&words, &reference_words);
    (max_len - distance) as f64 / max_len as f64 * 100.0
}
