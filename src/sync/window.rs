use std::collections::VecDeque;

/// Distance observed for a candidate of `token_count` tokens
#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    token_count: usize,
    distance: f64,
}

/// Bounded history of the most recent distances
#[derive(Debug, Clone)]
pub struct AlignmentWindow {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl AlignmentWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a sample, evicting the oldest one when full
    pub fn push(&mut self, token_count: usize, distance: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample {
            token_count,
            distance,
        });
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Mean of consecutive differences; positive when distances are worsening
    pub fn slope(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let diffs: Vec<f64> = self
            .samples
            .iter()
            .zip(self.samples.iter().skip(1))
            .map(|(a, b)| b.distance - a.distance)
            .collect();
        diffs.iter().sum::<f64>() / diffs.len() as f64
    }

    /// Mean distance; an empty window counts as no similarity at all
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 1.0;
        }
        self.samples.iter().map(|s| s.distance).sum::<f64>() / self.samples.len() as f64
    }

    /// Token count with the lowest distance, preferring the longest on ties
    pub fn best_token_count(&self) -> Option<usize> {
        let min = self
            .samples
            .iter()
            .map(|s| s.distance)
            .fold(f64::INFINITY, f64::min);

        self.samples
            .iter()
            .filter(|s| s.distance == min)
            .map(|s| s.token_count)
            .max()
    }
}
