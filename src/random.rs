use rand::Rng;

/// Source of randomness for gating, fallback selection and reply delays.
/// Swappable so tests can drive exact branches.
pub trait RandomSource: Send + Sync {
    /// Uniform draw in `[0, 1)`.
    fn next_f64(&self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick(&self, len: usize) -> usize;
}

/// Thread-local RNG from the `rand` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}
