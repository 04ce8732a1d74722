//! Deterministic and random enumeration of subsets.
//!
//! [`powerset`] walks all `2^n` subsets by growing size and backs the exact
//! computation. [`random_subset`] is the "random subset of a finite set"
//! primitive used by the combinatorial and Owen estimators: every element is
//! kept independently with probability `q` (a fair coin when `q = 0.5`, which
//! makes the subset uniform over the powerset).

use rand::Rng;

use crate::types::{DataIndex, Subset};

/// Sample a subset of `universe` keeping each element with probability `q`.
///
/// `q` is clamped to `[0, 1]`.
pub fn random_subset<R: Rng + ?Sized>(universe: &[DataIndex], q: f64, rng: &mut R) -> Subset {
    let q = q.clamp(0.0, 1.0);
    Subset::new(universe.iter().copied().filter(|_| rng.gen_bool(q)))
}

/// Iterator over up to `max_subsets` random subsets of a universe.
///
/// Created by [`random_powerset`].
pub struct RandomPowerset<'a, R: Rng + ?Sized> {
    universe: &'a [DataIndex],
    q: f64,
    remaining: usize,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Iterator for RandomPowerset<'_, R> {
    type Item = Subset;

    fn next(&mut self) -> Option<Subset> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(random_subset(self.universe, self.q, self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R: Rng + ?Sized> ExactSizeIterator for RandomPowerset<'_, R> {}

/// Draw `max_subsets` independent random subsets of `universe`, each element
/// included with probability `q`, without materialising the powerset.
pub fn random_powerset<'a, R: Rng + ?Sized>(
    universe: &'a [DataIndex],
    max_subsets: usize,
    q: f64,
    rng: &'a mut R,
) -> RandomPowerset<'a, R> {
    RandomPowerset {
        universe,
        q,
        remaining: max_subsets,
        rng,
    }
}

/// Iterator over every subset of a universe, by growing size.
///
/// Created by [`powerset`].
pub struct Powerset<'a> {
    universe: &'a [DataIndex],
    /// Positions into `universe` of the current combination.
    positions: Vec<usize>,
    /// Size of the combinations currently being produced.
    size: usize,
    done: bool,
}

impl Iterator for Powerset<'_> {
    type Item = Subset;

    fn next(&mut self) -> Option<Subset> {
        if self.done {
            return None;
        }
        let n = self.universe.len();
        let subset = Subset::new(self.positions.iter().map(|&p| self.universe[p]));

        // Advance to the next combination of the same size, or grow.
        let k = self.size;
        let mut i = k;
        while i > 0 && self.positions[i - 1] == n - k + i - 1 {
            i -= 1;
        }
        if i > 0 {
            self.positions[i - 1] += 1;
            for j in i..k {
                self.positions[j] = self.positions[j - 1] + 1;
            }
        } else if k < n {
            self.size += 1;
            self.positions = (0..self.size).collect();
        } else {
            self.done = true;
        }

        Some(subset)
    }
}

/// Enumerate all `2^n` subsets of `universe`: `{}`, then singletons, then
/// pairs, and so on up to the full set.
///
/// ```
/// use shapley_oracle::statistics::powerset;
///
/// let all: Vec<Vec<usize>> = powerset(&[1, 2]).map(|s| s.as_slice().to_vec()).collect();
/// assert_eq!(all, vec![vec![], vec![1], vec![2], vec![1, 2]]);
/// ```
pub fn powerset(universe: &[DataIndex]) -> Powerset<'_> {
    Powerset {
        universe,
        positions: Vec::new(),
        size: 0,
        done: false,
    }
}

/// Binomial coefficient `C(n, k)` as a float.
///
/// Computed as a running product of ratios, so the partial products never
/// exceed the result and stay finite whenever `C(n, k)` fits an `f64`.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut acc = 1.0f64;
    for i in 0..k {
        acc *= (n - i) as f64 / (i + 1) as f64;
    }
    acc.round()
}
