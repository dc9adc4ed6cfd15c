//! Walker/Vose alias tables for O(1) categorical draws.

use rand::Rng;

/// A categorical distribution over `0..len()` prepared for constant-time draws.
#[derive(Debug, Clone)]
pub struct AliasTable {
    alias: Vec<u32>,
    prob: Vec<f64>,
}

impl AliasTable {
    /// Build from non-negative, unnormalized weights.
    ///
    /// Returns `None` if `weights` is empty or carries no mass (sum not > 0 or
    /// not finite); there is no distribution to draw from in that case.
    pub fn new(weights: &[f64]) -> Option<Self> {
        let n = weights.len();
        let sum: f64 = weights.iter().sum();
        if n == 0 || !(sum > 0.0) || !sum.is_finite() {
            return None;
        }

        let mut prob: Vec<f64> = weights.iter().map(|&w| w.max(0.0) * n as f64 / sum).collect();
        let mut alias = vec![0u32; n];

        let mut smaller: Vec<usize> = Vec::with_capacity(n);
        let mut larger: Vec<usize> = Vec::with_capacity(n);
        for (i, &p) in prob.iter().enumerate() {
            if p < 1.0 {
                smaller.push(i);
            } else {
                larger.push(i);
            }
        }

        // Leftovers on either side are exactly 1 up to rounding; pin them so a
        // slot never falls through to an unset alias.
        while let Some(small) = smaller.pop() {
            let Some(large) = larger.pop() else {
                prob[small] = 1.0;
                continue;
            };
            alias[small] = large as u32;
            prob[large] = prob[large] + prob[small] - 1.0;
            if prob[large] < 1.0 {
                smaller.push(large);
            } else {
                larger.push(large);
            }
        }
        for i in larger {
            prob[i] = 1.0;
        }

        Some(Self { alias, prob })
    }

    pub fn len(&self) -> usize {
        self.prob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    /// Draw one index.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let k = rng.random_range(0..self.prob.len());
        if rng.random::<f64>() < self.prob[k] {
            k
        } else {
            self.alias[k] as usize
        }
    }
}
