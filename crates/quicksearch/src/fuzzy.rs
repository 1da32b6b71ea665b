//! Fuzzy subsequence matching and relevance scoring.
//!
//! A query matches a target when its characters appear, case-insensitively,
//! as a subsequence of the target. Positions are found greedily left to
//! right. The score blends four signals:
//!
//! | signal      | weight | meaning                                           |
//! |-------------|--------|---------------------------------------------------|
//! | base        | 0.4    | matched characters over query length              |
//! | prefix      | 0.3    | how much of the query the target starts with      |
//! | consecutive | 0.2    | adjacency of matched positions, penalizing gaps   |
//! | position    | 0.1    | earlier matches score higher                      |
//!
//! An exact case-insensitive match always scores 1.0.

const BASE_WEIGHT: f64 = 0.4;
const PREFIX_WEIGHT: f64 = 0.3;
const CONSECUTIVE_WEIGHT: f64 = 0.2;
const POSITION_WEIGHT: f64 = 0.1;

/// Result of matching one query against one target.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    /// Relevance in `[0, 1]`.
    pub score: f64,
    pub matched: bool,
    /// Character indices into the lowercased target, ascending.
    pub positions: Vec<usize>,
}

impl FuzzyMatch {
    fn none() -> Self {
        Self {
            score: 0.0,
            matched: false,
            positions: Vec::new(),
        }
    }

    /// True if this is a match scoring at least `min_score`.
    pub fn accepts(&self, min_score: f64) -> bool {
        self.matched && self.score >= min_score
    }
}

/// Matches `query` against `target`.
pub fn fuzzy_match(query: &str, target: &str) -> FuzzyMatch {
    if query.is_empty() {
        return FuzzyMatch {
            score: 1.0,
            matched: true,
            positions: Vec::new(),
        };
    }
    if target.is_empty() {
        return FuzzyMatch::none();
    }

    let query = lowercase_chars(query);
    let target = lowercase_chars(target);

    let positions = match_positions(&query, &target);
    if positions.is_empty() {
        return FuzzyMatch::none();
    }

    let base = positions.len() as f64 / query.len() as f64;
    let prefix = prefix_bonus(&query, &target);
    let consecutive = consecutive_bonus(&positions);
    let mean_position = positions.iter().sum::<usize>() as f64 / positions.len() as f64;
    let position = 1.0 - mean_position / target.len() as f64;

    let mut score = base * BASE_WEIGHT
        + prefix * PREFIX_WEIGHT
        + consecutive * CONSECUTIVE_WEIGHT
        + position * POSITION_WEIGHT;
    if query == target {
        score = 1.0;
    }

    FuzzyMatch {
        score: score.clamp(0.0, 1.0),
        matched: true,
        positions,
    }
}

/// Convenience wrapper returning only the score (0.0 for no match).
pub fn fuzzy_score(query: &str, target: &str) -> f64 {
    fuzzy_match(query, target).score
}

fn lowercase_chars(value: &str) -> Vec<char> {
    value.chars().flat_map(char::to_lowercase).collect()
}

/// Greedy subsequence scan. Returns an empty list unless every query
/// character was found.
fn match_positions(query: &[char], target: &[char]) -> Vec<usize> {
    let mut positions = Vec::with_capacity(query.len());
    let mut query_idx = 0;

    for (target_idx, c) in target.iter().enumerate() {
        if query_idx == query.len() {
            break;
        }
        if *c == query[query_idx] {
            positions.push(target_idx);
            query_idx += 1;
        }
    }

    if query_idx < query.len() {
        positions.clear();
    }
    positions
}

fn prefix_bonus(query: &[char], target: &[char]) -> f64 {
    if target.starts_with(query) {
        return 1.0;
    }
    let leading = query
        .iter()
        .zip(target)
        .take_while(|(q, t)| q == t)
        .count();
    leading as f64 / query.len() as f64
}

fn consecutive_bonus(positions: &[usize]) -> f64 {
    if positions.len() < 2 {
        return 0.0;
    }

    let mut consecutive = 0usize;
    let mut excess_gap = 0usize;
    for pair in positions.windows(2) {
        let gap = pair[1] - pair[0];
        if gap == 1 {
            consecutive += 1;
        }
        excess_gap += gap - 1;
    }

    let ratio = consecutive as f64 / (positions.len() - 1) as f64;
    let gap_penalty = 1.0 / (1.0 + excess_gap as f64);
    ratio * 0.7 + gap_penalty * 0.3
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_query_matches_everything() {
        let result = fuzzy_match("", "anything");
        assert!(result.matched);
        assert_eq!(result.score, 1.0);
        assert!(result.positions.is_empty());
        assert_eq!(fuzzy_match("", "").score, 1.0);
    }

    #[test]
    fn empty_target_never_matches() {
        let result = fuzzy_match("a", "");
        assert!(!result.matched);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn greedy_positions() {
        let result = fuzzy_match("ap", "apple.txt");
        assert!(result.matched);
        assert_eq!(result.positions, vec![0, 1]);

        let result = fuzzy_match("at", "banana.txt");
        assert_eq!(result.positions, vec![1, 7]);
    }

    #[test]
    fn missing_character_is_no_match() {
        let result = fuzzy_match("ap", "banana.txt");
        assert!(!result.matched);
        assert!(result.positions.is_empty());
    }

    #[test]
    fn case_insensitive() {
        let result = fuzzy_match("FIRE", "firefox");
        assert!(result.matched);
        assert_eq!(result.positions, vec![0, 1, 2, 3]);
        assert_eq!(fuzzy_match("Firefox", "FIREFOX").score, 1.0);
    }

    #[test]
    fn prefix_match_score() {
        // base 1.0, prefix 1.0, consecutive 1.0, position 1 - 0.5/9
        let expected = 0.4 + 0.3 + 0.2 + 0.1 * (1.0 - 0.5 / 9.0);
        assert!(approx(fuzzy_match("ap", "apple.txt").score, expected));
    }

    #[test]
    fn gapped_match_score() {
        // positions [0, 2]: prefix 1/2, ratio 0, gap penalty 1/2, mean 1 of 3
        let expected = 0.4 + 0.3 * 0.5 + 0.2 * (0.3 * 0.5) + 0.1 * (1.0 - 1.0 / 3.0);
        assert!(approx(fuzzy_match("ac", "abc").score, expected));
    }

    #[test]
    fn single_character_has_no_consecutive_bonus() {
        assert_eq!(consecutive_bonus(&[3]), 0.0);
        // prefix 0, position 1 - 1/2
        let expected = 0.4 + 0.1 * 0.5;
        assert!(approx(fuzzy_match("b", "ab").score, expected));
    }

    #[test]
    fn earlier_and_tighter_matches_rank_higher() {
        let tight = fuzzy_score("doc", "documents");
        let loose = fuzzy_score("doc", "a_dir_of_cats");
        assert!(tight > loose);
    }

    #[test]
    fn accepts_respects_min_score() {
        let result = fuzzy_match("ac", "abc");
        assert!(result.accepts(0.3));
        assert!(!result.accepts(0.99));
        assert!(!fuzzy_match("z", "abc").accepts(0.0));
    }

    fn is_subsequence(query: &str, target: &str) -> bool {
        let target: Vec<char> = target.chars().flat_map(char::to_lowercase).collect();
        let mut remaining = target.iter();
        query
            .chars()
            .flat_map(char::to_lowercase)
            .all(|q| remaining.any(|t| *t == q))
    }

    proptest! {
        #[test]
        fn matched_iff_subsequence(query in "[a-dA-D]{1,4}", target in "[a-fA-F._]{0,12}") {
            let result = fuzzy_match(&query, &target);
            prop_assert_eq!(result.matched, is_subsequence(&query, &target));
        }

        #[test]
        fn score_is_bounded(query in "\\PC{0,8}", target in "\\PC{0,16}") {
            let score = fuzzy_match(&query, &target).score;
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn exact_match_scores_one(query in "\\PC{1,12}") {
            prop_assert_eq!(fuzzy_match(&query, &query).score, 1.0);
        }

        #[test]
        fn positions_are_strictly_increasing(query in "[a-c]{1,4}", target in "[a-c]{0,16}") {
            let result = fuzzy_match(&query, &target);
            prop_assert!(result.positions.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }
}
