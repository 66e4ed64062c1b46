//! Seeded linear congruential generator.
//!
//! The estimator draws its point subset and minimal samples from this
//! generator so a fixed seed reproduces a run exactly on every platform.

/// 32-bit LCG with the classic `1103515245 / 12345` constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        // The low bits of a power-of-two LCG have short periods.
        self.state >> 1
    }

    /// Uniform integer in `0..=max`.
    pub fn next_int(&mut self, max: usize) -> usize {
        let span = max as u64 + 1;
        (self.next_u32() as u64 % span) as usize
    }

    /// Fill `out` with `k` distinct indices from `0..n`.
    ///
    /// When `n < k` the sample is truncated to `n` indices.
    pub fn distinct_sample(&mut self, k: usize, n: usize, out: &mut Vec<usize>) {
        out.clear();
        let k = k.min(n);
        // Floyd's algorithm: one draw per output index, no rejection loop.
        for j in (n - k)..n {
            let t = self.next_int(j);
            if out.contains(&t) {
                out.push(j);
            } else {
                out.push(t);
            }
        }
    }
}
