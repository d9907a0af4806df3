use crate::config::BoundsPolicy;
use crate::error::{Error, Result};

/// A fixed-size row of byte cells with a single movable pointer.
///
/// Cell arithmetic wraps modulo 256. Pointer movement follows the
/// [`BoundsPolicy`] chosen at construction, so `pointer < len` always holds.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u8>,
    pointer: usize,
    bounds: BoundsPolicy,
}

impl Tape {
    /// Allocate `len` zeroed cells. Allocation failure is reported, not aborted on.
    pub fn new(len: usize, bounds: BoundsPolicy) -> Result<Self> {
        if len == 0 {
            return Err(Error::Config("tape size must be positive".to_string()));
        }
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| Error::Resource { what: "tape", size: len })?;
        cells.resize(len, 0);
        Ok(Self {
            cells,
            pointer: 0,
            bounds,
        })
    }

    pub fn read(&self) -> u8 {
        self.cells[self.pointer]
    }

    pub fn write(&mut self, value: u8) {
        self.cells[self.pointer] = value;
    }

    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_add(1);
    }

    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_sub(1);
    }

    /// Move the pointer by `delta` cells.
    ///
    /// Under [`BoundsPolicy::Checked`] a move off either end fails and leaves
    /// the pointer where it was.
    pub fn move_by(&mut self, delta: isize) -> Result<()> {
        let len = self.cells.len();
        self.pointer = match self.bounds {
            BoundsPolicy::Checked => self
                .pointer
                .checked_add_signed(delta)
                .filter(|&p| p < len)
                .ok_or(Error::OutOfBounds {
                    pointer: self.pointer,
                    delta,
                    len,
                })?,
            BoundsPolicy::Wrap => {
                // rem_euclid keeps the offset in 0..len for negative deltas.
                let offset = (delta % len as isize).rem_euclid(len as isize) as usize;
                (self.pointer + offset) % len
            }
        };
        Ok(())
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new_is_zeroed() {
        let tape = Tape::new(16, BoundsPolicy::Checked).unwrap();
        assert_eq!(tape.len(), 16);
        assert_eq!(tape.pointer(), 0);
        assert!(tape.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_increment_wraps_at_255() {
        let mut tape = Tape::new(1, BoundsPolicy::Checked).unwrap();
        tape.write(255);
        tape.increment();
        assert_eq!(tape.read(), 0);
    }

    #[test]
    fn test_decrement_wraps_at_zero() {
        let mut tape = Tape::new(1, BoundsPolicy::Checked).unwrap();
        tape.decrement();
        assert_eq!(tape.read(), 255);
    }

    #[test]
    fn test_move_only_touches_current_cell() {
        let mut tape = Tape::new(4, BoundsPolicy::Checked).unwrap();
        tape.move_by(2).unwrap();
        tape.increment();
        tape.move_by(-1).unwrap();
        tape.decrement();
        assert_eq!(tape.cells(), &[0, 255, 1, 0]);
        assert_eq!(tape.pointer(), 1);
    }

    #[test]
    fn test_checked_rejects_left_of_zero() {
        let mut tape = Tape::new(8, BoundsPolicy::Checked).unwrap();
        let err = tape.move_by(-1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert_eq!(tape.pointer(), 0);
    }

    #[test]
    fn test_checked_rejects_past_end() {
        let mut tape = Tape::new(3, BoundsPolicy::Checked).unwrap();
        tape.move_by(2).unwrap();
        assert!(tape.move_by(1).is_err());
        assert_eq!(tape.pointer(), 2);
    }

    #[test]
    fn test_wrap_both_directions() {
        let mut tape = Tape::new(5, BoundsPolicy::Wrap).unwrap();
        tape.move_by(-1).unwrap();
        assert_eq!(tape.pointer(), 4);
        tape.move_by(1).unwrap();
        assert_eq!(tape.pointer(), 0);
        tape.move_by(-12).unwrap();
        assert_eq!(tape.pointer(), 3);
        tape.move_by(isize::MAX).unwrap();
        assert!(tape.pointer() < 5);
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(Tape::new(0, BoundsPolicy::Wrap).is_err());
    }

    #[test]
    fn test_huge_allocation_is_resource_error() {
        let err = Tape::new(usize::MAX, BoundsPolicy::Checked).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
    }
}
