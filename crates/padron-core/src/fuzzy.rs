// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Approximate text search.
//!
//! Each searchable key is scored by aligning the query against the best
//! matching substring of the field (edit distance), with a penalty for matches
//! that start far from the beginning of the field. Scores run from `0.0`
//! (exact match at the start) upward; a key matches when its score is at or
//! below the matcher's threshold, so larger thresholds tolerate more typos.

/// Threshold for promoter-name search.
pub const PROMOTER_THRESHOLD: f64 = 0.3;

/// Threshold for household list search.
pub const HOUSEHOLD_THRESHOLD: f64 = 0.35;

/// How many characters of offset cost a full point of score.
const LOCATION_DISTANCE: f64 = 100.0;

/// Items that expose named text fields to the matcher.
pub trait Searchable {
    /// Text for `key`, or an empty string for unknown keys.
    fn search_text(&self, key: &str) -> &str;
}

/// Ranked approximate matcher over a fixed set of keys.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    keys: Vec<&'static str>,
    threshold: f64,
}

impl FuzzyMatcher {
    #[must_use]
    pub fn new(keys: &[&'static str], threshold: f64) -> Self {
        Self {
            keys: keys.to_vec(),
            threshold,
        }
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Items matching `query`, best first. A blank query returns every item in input order.
    pub fn search<'a, T, I>(&self, items: I, query: &str) -> Vec<&'a T>
    where
        T: Searchable + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let query = query.trim();
        if query.is_empty() {
            return items.into_iter().collect();
        }

        let pattern: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
        let mut scored: Vec<(f64, &'a T)> = items
            .into_iter()
            .filter_map(|item| self.best_score(item, &pattern).map(|s| (s, item)))
            .collect();

        // Stable sort keeps input order for equal scores.
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.into_iter().map(|(_, item)| item).collect()
    }

    /// Best key score for `item`, if any key is within the threshold.
    #[must_use]
    pub fn score<T: Searchable>(&self, item: &T, query: &str) -> Option<f64> {
        let pattern: Vec<char> = query.trim().chars().flat_map(char::to_lowercase).collect();
        if pattern.is_empty() {
            return Some(0.0);
        }
        self.best_score(item, &pattern)
    }

    fn best_score<T: Searchable>(&self, item: &T, pattern: &[char]) -> Option<f64> {
        self.keys
            .iter()
            .map(|key| alignment_score(pattern, item.search_text(key)))
            .filter(|score| *score <= self.threshold)
            .min_by(f64::total_cmp)
    }
}

/// Score the best approximate occurrence of `pattern` inside `text`.
///
/// Semi-global edit distance: the alignment may start and end anywhere in
/// `text`. Ties on error count prefer the earlier start.
fn alignment_score(pattern: &[char], text: &str) -> f64 {
    let m = pattern.len();
    if m == 0 {
        return 0.0;
    }
    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();

    #[allow(clippy::cast_precision_loss, reason = "field lengths are tiny")]
    let score = |errors: usize, start: usize| errors as f64 / m as f64 + start as f64 / LOCATION_DISTANCE;

    // (errors, start) for pattern prefix of length i aligned to end at column j
    let mut prev: Vec<(usize, usize)> = (0..=m).map(|i| (i, 0)).collect();
    let mut cur = vec![(0, 0); m + 1];
    let mut best = score(m, 0);

    for (j, &tc) in text.iter().enumerate() {
        cur[0] = (0, j + 1);
        for i in 1..=m {
            let substitute = (prev[i - 1].0 + usize::from(pattern[i - 1] != tc), prev[i - 1].1);
            let skip_pattern = (cur[i - 1].0 + 1, cur[i - 1].1);
            let skip_text = (prev[i].0 + 1, prev[i].1);
            cur[i] = substitute.min(skip_pattern).min(skip_text);
        }
        let (errors, start) = cur[m];
        best = best.min(score(errors, start));
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

/// Case-insensitive substring test. A blank query matches everything.
#[must_use]
pub fn matches_ignore_case(text: &str, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty() || text.to_lowercase().contains(&needle)
}

/// Strict case-insensitive substring filter on a single key. Blank query keeps everything.
pub fn contains_ignore_case<'a, T, I>(items: I, key: &str, query: &str) -> Vec<&'a T>
where
    T: Searchable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .filter(|item| matches_ignore_case(item.search_text(key), query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Name(&'static str);

    impl Searchable for Name {
        fn search_text(&self, key: &str) -> &str {
            match key {
                "name" => self.0,
                _ => "",
            }
        }
    }

    fn names() -> Vec<Name> {
        vec![Name("Rosa Mamani"), Name("Ana Quispe"), Name("Luis Huamán"), Name("Anabel Rojas")]
    }

    #[test]
    fn test_blank_query_keeps_order() {
        let items = names();
        let matcher = FuzzyMatcher::new(&["name"], PROMOTER_THRESHOLD);
        let result: Vec<&str> = matcher.search(&items, "   ").iter().map(|n| n.0).collect();
        assert_eq!(result, vec!["Rosa Mamani", "Ana Quispe", "Luis Huamán", "Anabel Rojas"]);
    }

    #[test]
    fn test_exact_prefix_ranks_first() {
        let items = names();
        let matcher = FuzzyMatcher::new(&["name"], PROMOTER_THRESHOLD);
        let result: Vec<&str> = matcher.search(&items, "ana").iter().map(|n| n.0).collect();
        assert_eq!(result.first(), Some(&"Ana Quispe"));
        assert!(result.contains(&"Anabel Rojas"));
        assert!(!result.contains(&"Luis Huamán"));
    }

    #[test]
    fn test_tolerates_a_typo() {
        let items = names();
        let matcher = FuzzyMatcher::new(&["name"], PROMOTER_THRESHOLD);
        let result: Vec<&str> = matcher.search(&items, "quspe").iter().map(|n| n.0).collect();
        assert_eq!(result, vec!["Ana Quispe"]);
    }

    #[test]
    fn test_case_insensitive() {
        let items = names();
        let matcher = FuzzyMatcher::new(&["name"], PROMOTER_THRESHOLD);
        assert_eq!(matcher.search(&items, "MAMANI").len(), 1);
    }

    #[test]
    fn test_tighter_threshold_admits_less() {
        let items = names();
        let loose = FuzzyMatcher::new(&["name"], 0.6);
        let tight = FuzzyMatcher::new(&["name"], 0.1);
        assert!(loose.search(&items, "rsa").len() >= tight.search(&items, "rsa").len());
        assert!(tight.search(&items, "rsa").is_empty());
    }

    #[test]
    fn test_alignment_score() {
        let pattern: Vec<char> = "quispe".chars().collect();
        assert!(alignment_score(&pattern, "quispe").abs() < 1e-9);
        assert!((alignment_score(&pattern, "Ana Quispe") - 0.04).abs() < 1e-9);
        assert!(alignment_score(&pattern, "") >= 1.0);
    }

    #[test]
    fn test_contains_ignore_case() {
        let items = names();
        let hits: Vec<&str> = contains_ignore_case(&items, "name", "AN").iter().map(|n| n.0).collect();
        assert_eq!(hits, vec!["Rosa Mamani", "Ana Quispe", "Anabel Rojas"]);
        assert_eq!(contains_ignore_case(&items, "name", "quspe").len(), 0);
        assert_eq!(contains_ignore_case(&items, "name", "").len(), 4);
    }
}
