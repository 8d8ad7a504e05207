// String distance metrics used to compare a block's own translation with
// candidate spans of the full-page translation.
//
// Every metric returns a distance in [0, 1]: 0 for identical content and
// 1 when nothing is shared. The syncer only relies on that contract, so
// any implementation can be swapped in through the factory.

use std::collections::{HashMap, HashSet};

use crate::config::MetricKind;

/// Normalized string distance between a reference and a candidate
pub trait SimilarityMetric: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Distance in [0, 1]; 0 means identical content, 1 means nothing shared
    fn distance(&self, reference: &str, candidate: &str) -> f64;
}

/// Factory for creating metric instances
pub struct MetricFactory;

impl MetricFactory {
    /// Create the metric selected in the configuration
    pub fn create_metric(kind: MetricKind) -> Box<dyn SimilarityMetric> {
        match kind {
            MetricKind::Jaccard => Box::new(TrigramJaccard::default()),
            MetricKind::SorensenDice => Box::new(SorensenDice::default()),
            MetricKind::Cosine => Box::new(CosineProfile::default()),
            MetricKind::NormalizedLevenshtein => Box::new(NormalizedLevenshtein),
        }
    }
}

/// Jaccard distance over sets of character k-grams (trigrams by default)
#[derive(Debug, Clone, Copy)]
pub struct TrigramJaccard {
    k: usize,
}

impl Default for TrigramJaccard {
    fn default() -> Self {
        Self { k: 3 }
    }
}

impl SimilarityMetric for TrigramJaccard {
    fn name(&self) -> &'static str {
        "jaccard"
    }

    fn distance(&self, reference: &str, candidate: &str) -> f64 {
        if reference == candidate {
            return 0.0;
        }
        if char_len(reference) < self.k || char_len(candidate) < self.k {
            return 1.0;
        }

        let a = shingle_set(reference, self.k);
        let b = shingle_set(candidate, self.k);
        let union = a.union(&b).count();
        if union == 0 {
            return 1.0;
        }
        let inter = a.intersection(&b).count();

        clamp_unit(1.0 - inter as f64 / union as f64)
    }
}

/// Sorensen-Dice distance over sets of character k-grams (bigrams by default)
#[derive(Debug, Clone, Copy)]
pub struct SorensenDice {
    k: usize,
}

impl Default for SorensenDice {
    fn default() -> Self {
        Self { k: 2 }
    }
}

impl SimilarityMetric for SorensenDice {
    fn name(&self) -> &'static str {
        "sorensen-dice"
    }

    fn distance(&self, reference: &str, candidate: &str) -> f64 {
        if reference == candidate {
            return 0.0;
        }

        let a = shingle_set(reference, self.k);
        let b = shingle_set(candidate, self.k);
        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        let inter = a.intersection(&b).count();

        clamp_unit(1.0 - 2.0 * inter as f64 / total as f64)
    }
}

/// Cosine distance between k-gram frequency profiles (single characters by default)
#[derive(Debug, Clone, Copy)]
pub struct CosineProfile {
    k: usize,
}

impl Default for CosineProfile {
    fn default() -> Self {
        Self { k: 1 }
    }
}

impl SimilarityMetric for CosineProfile {
    fn name(&self) -> &'static str {
        "cosine"
    }

    fn distance(&self, reference: &str, candidate: &str) -> f64 {
        if reference == candidate {
            return 0.0;
        }
        if char_len(reference) < self.k || char_len(candidate) < self.k {
            return 1.0;
        }

        let a = shingle_profile(reference, self.k);
        let b = shingle_profile(candidate, self.k);

        let dot: f64 = a
            .iter()
            .filter_map(|(gram, &count)| b.get(gram).map(|&other| (count * other) as f64))
            .sum();
        let norm = |profile: &HashMap<String, usize>| {
            profile.values().map(|&c| (c * c) as f64).sum::<f64>().sqrt()
        };
        let denominator = norm(&a) * norm(&b);
        if denominator == 0.0 {
            return 1.0;
        }

        clamp_unit(1.0 - dot / denominator)
    }
}

/// Levenshtein edit distance divided by the length of the longer string
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl SimilarityMetric for NormalizedLevenshtein {
    fn name(&self) -> &'static str {
        "normalized-levenshtein"
    }

    fn distance(&self, reference: &str, candidate: &str) -> f64 {
        if reference == candidate {
            return 0.0;
        }

        let a: Vec<char> = reference.chars().collect();
        let b: Vec<char> = candidate.chars().collect();
        let longest = a.len().max(b.len());
        if longest == 0 {
            return 0.0;
        }

        // Two-row dynamic programming table
        let mut previous: Vec<usize> = (0..=b.len()).collect();
        let mut current = vec![0; b.len() + 1];
        for (i, ca) in a.iter().enumerate() {
            current[0] = i + 1;
            for (j, cb) in b.iter().enumerate() {
                let cost = if ca == cb { 0 } else { 1 };
                current[j + 1] = (previous[j + 1] + 1)
                    .min(current[j] + 1)
                    .min(previous[j] + cost);
            }
            std::mem::swap(&mut previous, &mut current);
        }

        clamp_unit(previous[b.len()] as f64 / longest as f64)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Collapse whitespace runs into a single space before shingling
fn normalize_spaces(s: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn shingles(s: &str, k: usize) -> impl Iterator<Item = String> {
    let chars = normalize_spaces(s);
    let grams: Vec<String> = if k == 0 || chars.len() < k {
        Vec::new()
    } else {
        chars.windows(k).map(|w| w.iter().collect()).collect()
    };
    grams.into_iter()
}

fn shingle_set(s: &str, k: usize) -> HashSet<String> {
    shingles(s, k).collect()
}

fn shingle_profile(s: &str, k: usize) -> HashMap<String, usize> {
    let mut profile = HashMap::new();
    for gram in shingles(s, k) {
        *profile.entry(gram).or_insert(0) += 1;
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_metrics() -> Vec<Box<dyn SimilarityMetric>> {
        vec![
            MetricFactory::create_metric(MetricKind::Jaccard),
            MetricFactory::create_metric(MetricKind::SorensenDice),
            MetricFactory::create_metric(MetricKind::Cosine),
            MetricFactory::create_metric(MetricKind::NormalizedLevenshtein),
        ]
    }

    #[test]
    fn identical_strings_have_zero_distance() {
        for metric in all_metrics() {
            assert_eq!(metric.distance("hola mundo", "hola mundo"), 0.0, "{}", metric.name());
        }
    }

    #[test]
    fn distances_stay_in_unit_interval() {
        let pairs = [
            ("hola mundo", "adios"),
            ("el gato negro", "el perro negro"),
            ("a", "abc"),
            ("xyz", "qqq qqq qqq"),
        ];
        for metric in all_metrics() {
            for (a, b) in pairs {
                let d = metric.distance(a, b);
                assert!((0.0..=1.0).contains(&d), "{} gave {} for {:?}", metric.name(), d, (a, b));
            }
        }
    }

    #[test]
    fn jaccard_counts_shared_trigrams() {
        // "abcd" -> {abc, bcd}; "abce" -> {abc, bce}; 1 shared of 3
        let d = TrigramJaccard::default().distance("abcd", "abce");
        assert!((d - (1.0 - 1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn jaccard_short_candidate_shares_nothing() {
        assert_eq!(TrigramJaccard::default().distance("hola mundo", "ho"), 1.0);
        assert_eq!(TrigramJaccard::default().distance("hola mundo", "xyz"), 1.0);
    }

    #[test]
    fn jaccard_ignores_whitespace_runs() {
        assert_eq!(TrigramJaccard::default().distance("hola  mundo", "hola mundo"), 0.0);
    }

    #[test]
    fn levenshtein_is_normalized_by_longer_string() {
        let d = NormalizedLevenshtein.distance("kitten", "sitting");
        assert!((d - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn sorensen_dice_on_bigrams() {
        // "night" bigrams {ni, ig, gh, ht}; "nacht" {na, ac, ch, ht}; 1 shared
        let d = SorensenDice::default().distance("night", "nacht");
        assert!((d - (1.0 - 2.0 / 8.0)).abs() < 1e-12);
    }
}
