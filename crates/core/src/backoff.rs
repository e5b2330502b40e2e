// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backoff sequences for retry policy
//!
//! A backoff is a finite sequence of delays: one entry per retry, so a
//! sequence of length N allows N+1 attempts in total. Sequences are built
//! once from config and shared by every delivery task.

use std::time::Duration;

/// A finite sequence of retry delays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    delays: Vec<Duration>,
}

impl Backoff {
    /// No retries: a single attempt only
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    /// The same delay before every retry
    pub fn constant(delay: Duration, retries: u32) -> Self {
        Self {
            delays: vec![delay; retries as usize],
        }
    }

    /// Delays growing by `delay` on each step: d, 2d, 3d, ...
    pub fn linear(delay: Duration, retries: u32) -> Self {
        let delays = (1..=retries as u64).map(|i| delay * i as u32).collect();
        Self { delays }
    }

    /// Delays growing multiplicatively: base, base*factor, base*factor^2, ...
    ///
    /// `factor` is clamped to at least 1.0 so the sequence never shrinks.
    pub fn exponential(base: Duration, retries: u32, factor: f64) -> Self {
        let factor = factor.max(1.0);
        let mut delays = Vec::with_capacity(retries as usize);
        let mut current = base;
        for _ in 0..retries {
            delays.push(current);
            current = current.mul_f64(factor);
        }
        Self { delays }
    }

    /// Truncate the sequence so the summed delays stay within `total`
    pub fn deadline(mut self, total: Duration) -> Self {
        let mut sum = Duration::ZERO;
        let mut keep = 0;
        for delay in &self.delays {
            sum += *delay;
            if sum > total {
                break;
            }
            keep += 1;
        }
        self.delays.truncate(keep);
        self
    }

    /// Delay to wait before the given 1-based attempt number.
    ///
    /// Returns `None` for the first attempt (no wait) and once the sequence
    /// is exhausted, which is the signal to stop retrying.
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt < 2 {
            return None;
        }
        self.delays.get(attempt as usize - 2).copied()
    }

    /// Total attempts this sequence allows (initial attempt plus retries)
    pub fn max_attempts(&self) -> u32 {
        self.delays.len() as u32 + 1
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
