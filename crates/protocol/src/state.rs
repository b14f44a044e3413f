//! Persistent per-device axis state

use serde::{Deserialize, Serialize};

/// Number of numeric axis slots (translation X/Y/Z, rotation X/Y/Z)
pub const AXIS_COUNT: usize = 6;

/// Number of button slots
pub const BUTTON_COUNT: usize = 2;

/// Axis and button state of one device
///
/// Slots keep their last-written value until a report of the kind that
/// owns them arrives again. The numeric slots are stored in reduced form
/// (-1, 0 or 1) between reports; see [`crate::decode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisState {
    axes: [i32; AXIS_COUNT],
    buttons: [bool; BUTTON_COUNT],
    /// Slots written since the last reduction pass
    #[serde(skip)]
    unreduced: [bool; AXIS_COUNT],
}

impl AxisState {
    /// Create a zeroed state
    pub fn new() -> Self {
        Self::default()
    }

    /// All six numeric slots
    pub fn axes(&self) -> &[i32; AXIS_COUNT] {
        &self.axes
    }

    /// Translation slots (X, Y, Z)
    pub fn translation(&self) -> [i32; 3] {
        [self.axes[0], self.axes[1], self.axes[2]]
    }

    /// Rotation slots (X, Y, Z)
    pub fn rotation(&self) -> [i32; 3] {
        [self.axes[3], self.axes[4], self.axes[5]]
    }

    /// Button slots
    pub fn buttons(&self) -> [bool; BUTTON_COUNT] {
        self.buttons
    }

    pub(crate) fn set_translation(&mut self, values: [i16; 3]) {
        self.write_axes(0, values);
    }

    pub(crate) fn set_rotation(&mut self, values: [i16; 3]) {
        self.write_axes(3, values);
    }

    fn write_axes(&mut self, start: usize, values: [i16; 3]) {
        for (offset, value) in values.into_iter().enumerate() {
            self.axes[start + offset] = i32::from(value);
            self.unreduced[start + offset] = true;
        }
    }

    pub(crate) fn set_buttons(&mut self, button1: bool, button2: bool) {
        self.buttons = [button1, button2];
    }

    /// Run the reduction pass over the numeric slots in place
    ///
    /// Slots written since the previous pass are mapped through
    /// [`crate::reduce_axis`]. Slots already in reduced form keep their
    /// value, so running the pass again changes nothing.
    pub fn reduce(&mut self) {
        for (slot, unreduced) in self.axes.iter_mut().zip(&mut self.unreduced) {
            if *unreduced {
                *slot = crate::reduce_axis(*slot);
                *unreduced = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_zeroed() {
        let state = AxisState::new();
        assert_eq!(state.axes(), &[0; AXIS_COUNT]);
        assert_eq!(state.buttons(), [false, false]);
    }

    #[test]
    fn test_setters_touch_only_their_slots() {
        let mut state = AxisState::new();
        state.set_rotation([7, -8, 9]);
        state.set_translation([1, -2, 3]);
        assert_eq!(state.translation(), [1, -2, 3]);
        assert_eq!(state.rotation(), [7, -8, 9]);

        state.set_buttons(true, false);
        assert_eq!(state.buttons(), [true, false]);
        assert_eq!(state.axes(), &[1, -2, 3, 7, -8, 9]);
    }

    #[test]
    fn test_reduce_all_slots() {
        let mut state = AxisState::new();
        state.set_translation([51, 50, -51]);
        state.set_rotation([-50, 32767, -32768]);
        state.reduce();
        assert_eq!(state.axes(), &[1, 0, -1, 0, 1, -1]);
    }

    #[test]
    fn test_reduce_keeps_already_reduced_slots() {
        let mut state = AxisState::new();
        state.set_rotation([100, 0, -100]);
        state.reduce();
        assert_eq!(state.rotation(), [1, 0, -1]);

        state.set_translation([1, -1, 60]);
        state.reduce();
        assert_eq!(state.axes(), &[0, 0, 1, 1, 0, -1]);

        let before = state;
        state.reduce();
        assert_eq!(state, before);
    }
}
