use crate::util::{BoundedHistory, Vec3D};

/// The most recent `capacity` timestamped states, oldest first.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    samples: BoundedHistory<(f64, Vec3D<f64>)>,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self { Self { samples: BoundedHistory::new(capacity) } }

    /// Appends a sample, evicting the oldest one once the window is full.
    pub fn push(&mut self, t: f64, state: Vec3D<f64>) { self.samples.push((t, state)); }

    /// Iterates over the stored states, oldest first.
    pub fn states(&self) -> impl ExactSizeIterator<Item = &Vec3D<f64>> + Clone {
        self.samples.iter().map(|(_, s)| s)
    }

    /// Iterates over the stored timestamps, oldest first.
    pub fn times(&self) -> impl ExactSizeIterator<Item = f64> + '_ { self.samples.iter().map(|(t, _)| *t) }

    pub fn latest(&self) -> Option<(f64, Vec3D<f64>)> { self.samples.latest().copied() }

    pub fn len(&self) -> usize { self.samples.len() }

    pub fn is_empty(&self) -> bool { self.samples.is_empty() }

    pub fn capacity(&self) -> usize { self.samples.size() }

    pub fn is_full(&self) -> bool { self.samples.is_full() }

    /// Fraction of the capacity currently filled, in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity() == 0 { 1.0 } else { self.len() as f64 / self.capacity() as f64 }
    }
}
