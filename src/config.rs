use crate::error::{Error, Result};

/// Default number of tape cells.
pub const TAPE_SIZE: usize = 30000;
/// Default initial loop stack capacity.
pub const STACK_CAPACITY: usize = 1000;
/// Default fraction of capacity added when the loop stack is full.
pub const STACK_GROWTH: f64 = 0.1;

/// What happens when the tape pointer leaves `0..tape_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsPolicy {
    /// Abort the run with [`Error::OutOfBounds`].
    #[default]
    Checked,
    /// Wrap the pointer modulo the tape size.
    Wrap,
}

/// Value stored by `,` once the input source is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// Store 255, the low byte of C's `EOF`.
    #[default]
    Max,
    /// Store 0.
    Zero,
    /// Leave the current cell as it is.
    Unchanged,
}

impl EofPolicy {
    /// The byte to store, or `None` to leave the cell alone.
    pub fn sentinel(self) -> Option<u8> {
        match self {
            EofPolicy::Max => Some(u8::MAX),
            EofPolicy::Zero => Some(0),
            EofPolicy::Unchanged => None,
        }
    }
}

/// Configuration for a single engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of byte cells on the tape.
    pub tape_size: usize,
    /// Loop stack entries allocated up front.
    pub stack_capacity: usize,
    /// Multiplicative growth factor applied when the loop stack is full.
    pub stack_growth: f64,
    pub bounds: BoundsPolicy,
    pub eof: EofPolicy,
    /// Stop with [`Error::StepLimit`] after this many dispatched bytes.
    pub max_steps: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tape_size: TAPE_SIZE,
            stack_capacity: STACK_CAPACITY,
            stack_growth: STACK_GROWTH,
            bounds: BoundsPolicy::default(),
            eof: EofPolicy::default(),
            max_steps: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tape_size == 0 {
            return Err(Error::Config("tape size must be positive".to_string()));
        }
        if !self.stack_growth.is_finite() || self.stack_growth < 0.0 {
            return Err(Error::Config(format!(
                "stack growth factor must be a finite non-negative number, got {}",
                self.stack_growth
            )));
        }
        if self.max_steps == Some(0) {
            return Err(Error::Config("step limit must be positive".to_string()));
        }
        Ok(())
    }
}
