use tracing::debug;

use crate::error::{Error, Result};
use crate::stream::Marker;

/// Saved stream positions, one per loop currently being executed.
///
/// Capacity is tracked explicitly rather than left to `Vec`, so growth follows
/// the configured factor and every resize is visible to the caller.
#[derive(Debug, Clone)]
pub struct LoopStack {
    entries: Vec<Marker>,
    capacity: usize,
    growth: f64,
}

impl LoopStack {
    pub fn new(capacity: usize, growth: f64) -> Result<Self> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(capacity).map_err(|_| Error::Resource {
            what: "loop stack",
            size: capacity,
        })?;
        Ok(Self {
            entries,
            capacity,
            growth,
        })
    }

    /// Push a marker, growing first if the stack is full.
    pub fn push(&mut self, marker: Marker) -> Result<()> {
        if self.is_full() {
            self.grow()?;
        }
        self.entries.push(marker);
        Ok(())
    }

    /// Remove the innermost marker. `None` means there is no open loop.
    pub fn pop(&mut self) -> Option<Marker> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<Marker> {
        self.entries.last().copied()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Enlarge capacity by the growth factor, and always by at least one entry.
    pub fn grow(&mut self) -> Result<()> {
        let current = self.capacity;
        let scaled = (current as f64 * (1.0 + self.growth)) as usize;
        let target = current
            .checked_add(1)
            .map(|min| scaled.max(min))
            .ok_or(Error::Resource {
                what: "loop stack",
                size: current,
            })?;
        self.entries
            .try_reserve_exact(target - self.entries.len())
            .map_err(|_| Error::Resource {
                what: "loop stack",
                size: target,
            })?;
        debug!(from = current, to = target, "loop stack grown");
        self.capacity = target;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
