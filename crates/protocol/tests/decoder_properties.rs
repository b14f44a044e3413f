//! Property tests for the report decoder
//!
//! Covers signed reconstruction, reduction idempotence, and the
//! sticky-slot behavior across report kinds.

use proptest::prelude::*;
use protocol::{AxisState, Snapshot, decode, decode16, reduce_axis};

fn axis_report(kind: u8, values: [i16; 3]) -> [u8; 8] {
    let mut raw = [0u8; 8];
    raw[0] = kind;
    for (i, value) in values.iter().enumerate() {
        let [low, high] = value.to_le_bytes();
        raw[1 + i * 2] = low;
        raw[2 + i * 2] = high;
    }
    raw
}

fn button_report(mask: u8) -> [u8; 8] {
    [3, mask, 0, 0, 0, 0, 0, 0]
}

/// Arbitrary valid report
fn any_report() -> impl Strategy<Value = [u8; 8]> {
    prop_oneof![
        any::<[i16; 3]>().prop_map(|v| axis_report(1, v)),
        any::<[i16; 3]>().prop_map(|v| axis_report(2, v)),
        any::<u8>().prop_map(button_report),
    ]
}

proptest! {
    #[test]
    fn decode16_matches_twos_complement(low in any::<u8>(), high in any::<u8>()) {
        let expected = u16::from_le_bytes([low, high]) as i16;
        prop_assert_eq!(decode16(low, high), expected);
    }

    #[test]
    fn reduction_is_idempotent(
        history in prop::collection::vec(any_report(), 0..16),
        value in any::<i32>(),
    ) {
        prop_assert!((-1..=1).contains(&reduce_axis(value)));

        let mut state = AxisState::new();
        for raw in &history {
            decode(raw, &mut state).unwrap();
        }
        let reduced = state;
        state.reduce();
        prop_assert_eq!(state, reduced);
    }

    #[test]
    fn translation_keeps_rotation_slots(
        history in prop::collection::vec(any_report(), 0..16),
        values in any::<[i16; 3]>(),
    ) {
        let mut state = AxisState::new();
        for raw in &history {
            decode(raw, &mut state).unwrap();
        }
        let rotation = state.rotation();
        let buttons = state.buttons();

        let snapshot = decode(&axis_report(1, values), &mut state).unwrap();

        prop_assert_eq!(state.rotation(), rotation);
        prop_assert_eq!(state.buttons(), buttons);
        prop_assert_eq!(snapshot.rotation(), rotation);
        prop_assert_eq!(snapshot.translation(), values.map(i32::from));
    }

    #[test]
    fn rotation_keeps_translation_slots(
        history in prop::collection::vec(any_report(), 0..16),
        values in any::<[i16; 3]>(),
    ) {
        let mut state = AxisState::new();
        for raw in &history {
            decode(raw, &mut state).unwrap();
        }
        let translation = state.translation();

        let snapshot = decode(&axis_report(2, values), &mut state).unwrap();

        prop_assert_eq!(state.translation(), translation);
        prop_assert_eq!(snapshot.translation(), translation);
        prop_assert_eq!(snapshot.rotation(), values.map(i32::from));
    }

    #[test]
    fn button_keeps_all_axes(
        history in prop::collection::vec(any_report(), 0..16),
        mask in any::<u8>(),
    ) {
        let mut state = AxisState::new();
        for raw in &history {
            decode(raw, &mut state).unwrap();
        }
        let axes = *state.axes();

        let snapshot = decode(&button_report(mask), &mut state).unwrap();

        prop_assert_eq!(state.axes(), &axes);
        prop_assert_eq!(snapshot.buttons(), [i32::from(mask & 1), i32::from((mask >> 1) & 1)]);
    }

    #[test]
    fn stored_axes_are_always_reduced(history in prop::collection::vec(any_report(), 1..32)) {
        let mut state = AxisState::new();
        for raw in &history {
            decode(raw, &mut state).unwrap();
            prop_assert!(state.axes().iter().all(|v| (-1..=1).contains(v)));
        }
    }

    #[test]
    fn unknown_kind_never_mutates(
        history in prop::collection::vec(any_report(), 0..8),
        tag in 4u8..=255,
        tail in any::<[u8; 7]>(),
    ) {
        let mut state = AxisState::new();
        for raw in &history {
            decode(raw, &mut state).unwrap();
        }
        let before = state;

        let mut raw = [0u8; 8];
        raw[0] = tag;
        raw[1..].copy_from_slice(&tail);
        prop_assert!(decode(&raw, &mut state).is_err());
        prop_assert_eq!(state, before);
    }
}

#[test]
fn documented_examples() {
    let mut state = AxisState::new();

    let snapshot = decode(&[1, 0, 0, 44, 0, 0, 0, 0], &mut state).unwrap();
    assert_eq!(snapshot.translation(), [0, 44, 0]);
    assert_eq!(state.translation(), [0, 0, 0]);

    let snapshot = decode(&[1, 0, 0, 60, 0, 0, 0, 0], &mut state).unwrap();
    assert_eq!(snapshot.translation(), [0, 60, 0]);
    assert_eq!(state.translation(), [0, 1, 0]);

    let snapshot = decode(&[3, 0b0000_0011, 0, 0, 0, 0, 0, 0], &mut state).unwrap();
    assert_eq!(snapshot, Snapshot::new([0, 1, 0, 0, 0, 0, 1, 1]));

    assert_eq!(decode16(0, 200), -14336);
}

#[test]
fn rotation_then_translation_sequence() {
    let mut state = AxisState::new();

    let s1 = decode(&axis_report(2, [-300, 10, 51]), &mut state).unwrap();
    assert_eq!(s1.values(), &[0, 0, 0, -300, 10, 51, 0, 0]);

    let s2 = decode(&axis_report(1, [49, -49, 1000]), &mut state).unwrap();
    assert_eq!(s2.values(), &[49, -49, 1000, -1, 0, 1, 0, 0]);

    let s3 = decode(&axis_report(2, [0, 0, 0]), &mut state).unwrap();
    assert_eq!(s3.values(), &[0, 0, 1, 0, 0, 0, 0, 0]);
}
