//! Candidate password generation
//!
//! Candidates are ordered arrangements of distinct vocabulary positions,
//! concatenated without a separator. For a vocabulary of N words and an
//! arrangement length r there are N!/(N-r)! candidates.
//!
//! Ordering is fixed: every length in the range is emitted in ascending
//! order, and within one length the arrangements follow lexicographic order
//! of the word positions. The partitioner relies on this to make chunk
//! assignment reproducible between runs.

use crate::error::ConfigError;
use std::ops::RangeInclusive;

/// Default shortest candidate (in vocabulary items)
pub const DEFAULT_MIN_LEN: usize = 2;

/// Default longest candidate (in vocabulary items)
pub const DEFAULT_MAX_LEN: usize = 3;

/// Upper bound on the up-front reservation in `generate`
const MAX_PREALLOCATED: usize = 1 << 24;

/// Inclusive range of vocabulary items per candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRange {
    min: usize,
    max: usize,
}

impl LengthRange {
    /// Create a validated range (`1 <= min <= max`)
    pub fn new(min: usize, max: usize) -> Result<Self, ConfigError> {
        if min == 0 || min > max {
            return Err(ConfigError::InvalidLengthRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Shortest arrangement length
    pub fn min(&self) -> usize {
        self.min
    }

    /// Longest arrangement length
    pub fn max(&self) -> usize {
        self.max
    }

    /// Iterate the lengths in ascending order
    pub fn lengths(&self) -> RangeInclusive<usize> {
        self.min..=self.max
    }
}

impl Default for LengthRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_LEN,
            max: DEFAULT_MAX_LEN,
        }
    }
}

impl std::fmt::Display for LengthRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// Lazy iterator over the r-arrangements of `0..n` in lexicographic order
///
/// Yields nothing when `r > n`.
#[derive(Debug, Clone)]
pub struct Permutations {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Permutations {
    /// Arrangements of `r` distinct positions drawn from `0..n`
    pub fn new(n: usize, r: usize) -> Self {
        let current = if r <= n { Some((0..r).collect()) } else { None };
        Self { n, current }
    }

    /// Step `current` to its lexicographic successor
    fn advance(&mut self) {
        let n = self.n;
        let Some(cur) = self.current.as_mut() else {
            return;
        };

        let r = cur.len();
        let mut used = vec![false; n];
        for &i in cur.iter() {
            used[i] = true;
        }

        for pos in (0..r).rev() {
            used[cur[pos]] = false;

            if let Some(next) = (cur[pos] + 1..n).find(|&v| !used[v]) {
                cur[pos] = next;
                used[next] = true;

                // Tail gets the smallest free positions, ascending
                let tail: Vec<usize> = (0..n).filter(|&v| !used[v]).take(r - pos - 1).collect();
                cur[pos + 1..].copy_from_slice(&tail);
                return;
            }
        }

        self.current = None;
    }
}

impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.current.clone()?;
        self.advance();
        Some(out)
    }
}

/// Number of r-arrangements of n items: n!/(n-r)!
pub fn arrangements(n: usize, r: usize) -> u64 {
    if r > n {
        return 0;
    }
    ((n - r + 1)..=n).fold(1u64, |acc, k| acc.saturating_mul(k as u64))
}

/// Total candidates a vocabulary of `n` words yields over `range`
pub fn candidate_count(n: usize, range: LengthRange) -> u64 {
    range
        .lengths()
        .fold(0u64, |acc, r| acc.saturating_add(arrangements(n, r)))
}

/// Generate the full ordered candidate list
///
/// Duplicate words are not collapsed, so a vocabulary with repeats yields
/// repeated candidates.
pub fn generate(vocabulary: &[String], range: LengthRange) -> Vec<String> {
    // Saturated counts must not turn into a capacity overflow panic
    let capacity = usize::try_from(candidate_count(vocabulary.len(), range))
        .unwrap_or(0)
        .min(MAX_PREALLOCATED);
    let mut candidates = Vec::with_capacity(capacity);

    for r in range.lengths() {
        for arrangement in Permutations::new(vocabulary.len(), r) {
            let password: String = arrangement
                .iter()
                .map(|&i| vocabulary[i].as_str())
                .collect();
            candidates.push(password);
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_length_range_validation() {
        assert!(LengthRange::new(0, 3).is_err());
        assert!(LengthRange::new(3, 2).is_err());
        let range = LengthRange::new(1, 1).unwrap();
        assert_eq!(range.lengths().collect::<Vec<_>>(), vec![1]);
        assert_eq!(LengthRange::default().to_string(), "2..=3");
    }

    #[test]
    fn test_permutation_order() {
        let perms: Vec<Vec<usize>> = Permutations::new(3, 2).collect();
        assert_eq!(
            perms,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 2],
                vec![2, 0],
                vec![2, 1],
            ]
        );
    }

    #[test]
    fn test_permutations_longer_than_pool() {
        assert_eq!(Permutations::new(2, 3).count(), 0);
        assert_eq!(Permutations::new(3, 0).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_arrangement_counts() {
        assert_eq!(arrangements(5, 2), 20);
        assert_eq!(arrangements(5, 3), 60);
        assert_eq!(arrangements(2, 3), 0);
        assert_eq!(candidate_count(5, LengthRange::default()), 80);
        assert_eq!(candidate_count(usize::MAX, LengthRange::default()), u64::MAX);
    }

    #[test]
    fn test_two_word_vocabulary() {
        let candidates = generate(&vocab(&["12", "ab"]), LengthRange::default());
        assert_eq!(candidates, vec!["12ab", "ab12"]);
    }

    #[test]
    fn test_lengths_emitted_in_order() {
        let candidates = generate(&vocab(&["a", "b", "c"]), LengthRange::default());
        assert_eq!(candidates.len(), 12);
        assert_eq!(&candidates[..6], &["ab", "ac", "ba", "bc", "ca", "cb"]);
        assert_eq!(candidates[6], "abc");
        assert_eq!(candidates[11], "cba");
        assert!(candidates.contains(&"cab".to_string()));
    }

    #[test]
    fn test_count_matches_generation_for_all_ranges() {
        let words = vocab(&["w", "x", "y", "z", "q"]);
        for n in 1..=words.len() {
            for min in 1..=n {
                for max in min..=n {
                    let range = LengthRange::new(min, max).unwrap();
                    let candidates = generate(&words[..n], range);
                    assert_eq!(candidates.len() as u64, candidate_count(n, range));
                    assert!(candidates.iter().all(|c| c.len() >= min && c.len() <= max));
                }
            }
        }
    }

    #[test]
    fn test_no_word_reused_within_candidate() {
        let words = vocab(&["a", "b", "c", "d"]);
        for candidate in generate(&words, LengthRange::new(2, 4).unwrap()) {
            let mut chars: Vec<char> = candidate.chars().collect();
            chars.sort_unstable();
            chars.dedup();
            assert_eq!(chars.len(), candidate.len(), "repeat in {}", candidate);
        }
    }

    #[test]
    fn test_duplicate_words_not_collapsed() {
        let candidates = generate(&vocab(&["x", "x"]), LengthRange::new(2, 2).unwrap());
        assert_eq!(candidates, vec!["xx", "xx"]);
    }
}
