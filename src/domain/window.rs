//! Fixed-size sliding window with O(1) amortized max/min/mean/stddev.
//!
//! Max and min use monotonic deques of `(sequence, value)` pairs; mean and
//! variance use a running Welford accumulator that supports removal. The
//! accumulator is rebuilt from the slots once per window length so removal
//! error cannot build up, and a window holding one repeated value reports
//! that value and a deviation of exactly zero.
//!
//! A missing input (`None` or NaN) occupies a slot like any other value but
//! makes every aggregate undefined until it slides out. Aggregates are only
//! defined once the window is full.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

#[derive(Debug, Clone)]
pub struct WindowBuffer {
    capacity: usize,
    slots: VecDeque<Option<f64>>,
    missing: usize,
    seq: usize,
    maxima: VecDeque<(usize, f64)>,
    minima: VecDeque<(usize, f64)>,
    count: usize,
    mean: f64,
    m2: f64,
    last: Option<f64>,
    equal_run: usize,
}

impl WindowBuffer {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            capacity,
            slots: VecDeque::with_capacity(capacity + 1),
            missing: 0,
            seq: 0,
            maxima: VecDeque::new(),
            minima: VecDeque::new(),
            count: 0,
            mean: 0.0,
            m2: 0.0,
            last: None,
            equal_run: 0,
        }
    }

    pub fn push(&mut self, value: Option<f64>) {
        let value = value.filter(|v| !v.is_nan());
        let seq = self.seq;
        self.seq += 1;

        self.slots.push_back(value);
        self.equal_run = match (value, self.last) {
            (Some(v), Some(prev)) if v == prev => self.equal_run + 1,
            (Some(_), _) => 1,
            (None, _) => 0,
        };
        self.last = value;
        match value {
            Some(v) => {
                while self.maxima.back().is_some_and(|&(_, m)| m <= v) {
                    self.maxima.pop_back();
                }
                self.maxima.push_back((seq, v));
                while self.minima.back().is_some_and(|&(_, m)| m >= v) {
                    self.minima.pop_back();
                }
                self.minima.push_back((seq, v));
                self.add(v);
            }
            None => self.missing += 1,
        }

        if self.slots.len() > self.capacity {
            match self.slots.pop_front().flatten() {
                Some(old) => self.remove(old),
                None => self.missing -= 1,
            }
            if self.seq % self.capacity == 0 {
                self.resync();
            }
        }

        // Oldest sequence number still inside the window.
        let oldest = self.seq.saturating_sub(self.capacity);
        while self.maxima.front().is_some_and(|&(s, _)| s < oldest) {
            self.maxima.pop_front();
        }
        while self.minima.front().is_some_and(|&(s, _)| s < oldest) {
            self.minima.pop_front();
        }
    }

    fn add(&mut self, v: f64) {
        self.count += 1;
        let delta = v - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v - self.mean);
    }

    fn remove(&mut self, v: f64) {
        if self.count <= 1 {
            self.count = 0;
            self.mean = 0.0;
            self.m2 = 0.0;
            return;
        }
        self.count -= 1;
        let delta = v - self.mean;
        self.mean -= delta / self.count as f64;
        self.m2 -= delta * (v - self.mean);
    }

    fn resync(&mut self) {
        self.count = 0;
        self.mean = 0.0;
        self.m2 = 0.0;
        let present: Vec<f64> = self.slots.iter().flatten().copied().collect();
        for v in present {
            self.add(v);
        }
    }

    /// Every slot holds the same value.
    fn is_flat(&self) -> bool {
        self.equal_run >= self.capacity
    }

    /// Full window with no missing slot.
    pub fn is_ready(&self) -> bool {
        self.slots.len() == self.capacity && self.missing == 0
    }

    pub fn max(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        self.maxima.front().map(|&(_, v)| v)
    }

    pub fn min(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        self.minima.front().map(|&(_, v)| v)
    }

    pub fn mean(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        match self.last {
            Some(v) if self.is_flat() => Some(v),
            _ => Some(self.mean),
        }
    }

    /// Sample standard deviation (divisor `w - 1`); undefined for `w == 1`.
    pub fn std(&self) -> Option<f64> {
        if !self.is_ready() || self.count < 2 {
            return None;
        }
        if self.is_flat() {
            return Some(0.0);
        }
        Some((self.m2.max(0.0) / (self.count - 1) as f64).sqrt())
    }
}

fn rolling(
    values: &[Option<f64>],
    window: NonZeroUsize,
    stat: impl Fn(&WindowBuffer) -> Option<f64>,
) -> Vec<Option<f64>> {
    let mut buffer = WindowBuffer::new(window);
    values
        .iter()
        .map(|v| {
            buffer.push(*v);
            stat(&buffer)
        })
        .collect()
}

pub fn rolling_max(values: &[Option<f64>], window: NonZeroUsize) -> Vec<Option<f64>> {
    rolling(values, window, WindowBuffer::max)
}

pub fn rolling_min(values: &[Option<f64>], window: NonZeroUsize) -> Vec<Option<f64>> {
    rolling(values, window, WindowBuffer::min)
}

pub fn rolling_mean(values: &[Option<f64>], window: NonZeroUsize) -> Vec<Option<f64>> {
    rolling(values, window, WindowBuffer::mean)
}

pub fn rolling_std(values: &[Option<f64>], window: NonZeroUsize) -> Vec<Option<f64>> {
    rolling(values, window, WindowBuffer::std)
}
