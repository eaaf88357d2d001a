//! Uniform dispatch to one of several branches.

use crate::common::*;

/// Evaluates exactly one of `num_cases` branches, chosen uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RandomSelector {
    num_cases: NonZeroUsize,
}

impl RandomSelector {
    pub fn new(num_cases: usize) -> Result<Self> {
        let num_cases = NonZeroUsize::new(num_cases)
            .ok_or_else(|| format_err!("the number of cases must be at least 1"))?;
        Ok(Self { num_cases })
    }

    /// Draws `sel` in `[0, num_cases)` and returns `func(rng, input, sel)`.
    ///
    /// The generator is handed on to the chosen branch for its own draws.
    pub fn apply<R, T, U, F>(&self, rng: &mut R, input: T, func: F) -> U
    where
        R: Rng + ?Sized,
        F: FnOnce(&mut R, T, usize) -> U,
    {
        let sel = rng.gen_range(0..self.num_cases.get());
        func(rng, input, sel)
    }
}
