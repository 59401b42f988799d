//! Special-room reservoir
//!
//! A fixed number of slots that end up holding a random selection of the
//! rooms placed during one generation pass. Rooms are offered one at a time
//! as they are placed.
//!
//! Once every slot is full, slots are scanned in index order and each one is
//! replaced with probability `1 / room_count`; the scan stops at the first
//! hit. This is not uniform reservoir sampling when there is more than one
//! slot: later slots are only reached after every earlier slot missed, so
//! they are replaced less often than earlier ones. Level layouts depend on
//! this exact behaviour, so it is kept as is.

use crate::layout::RoomId;
use crate::rng::RandomSource;

/// Offer a newly placed room to the reservoir
///
/// Returns the slot the room landed in, if any.
pub fn offer<R: RandomSource>(
    slots: &mut [Option<RoomId>],
    room: RoomId,
    room_count: u32,
    rng: &mut R,
) -> Option<usize> {
    let empty: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_none())
        .map(|(idx, _)| idx)
        .collect();

    if !empty.is_empty() {
        let pick = empty[rng.rn2(empty.len() as u32) as usize];
        slots[pick] = Some(room);
        return Some(pick);
    }

    for (idx, slot) in slots.iter_mut().enumerate() {
        if rng.one_in(room_count) {
            *slot = Some(room);
            return Some(idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{GameRng, ScriptedRng};

    #[test]
    fn test_empty_reservoir_takes_nothing() {
        let mut slots: Vec<Option<RoomId>> = Vec::new();
        let mut rng = GameRng::new(1);
        assert_eq!(offer(&mut slots, RoomId(1), 1, &mut rng), None);
    }

    #[test]
    fn test_fills_empty_slots_first() {
        let mut slots = vec![None; 3];
        let mut rng = GameRng::new(9);
        for room in 1..=3 {
            assert!(offer(&mut slots, RoomId(room), room, &mut rng).is_some());
        }
        let mut held: Vec<u32> = slots.iter().map(|s| s.unwrap().0).collect();
        held.sort_unstable();
        assert_eq!(held, vec![1, 2, 3]);
    }

    #[test]
    fn test_picks_among_empty_slots() {
        let mut slots = vec![Some(RoomId(7)), None, None];
        // second of the two empty slots
        let mut rng = ScriptedRng::new(vec![1]);
        assert_eq!(offer(&mut slots, RoomId(8), 2, &mut rng), Some(2));
        assert_eq!(slots, vec![Some(RoomId(7)), None, Some(RoomId(8))]);
    }

    #[test]
    fn test_first_hit_stops_scan() {
        let mut slots = vec![Some(RoomId(1)), Some(RoomId(2)), Some(RoomId(3))];
        // miss slot 0, hit slot 1; slot 2 is never drawn for
        let mut rng = ScriptedRng::new(vec![4, 0, 0]);
        assert_eq!(offer(&mut slots, RoomId(9), 5, &mut rng), Some(1));
        assert_eq!(slots, vec![Some(RoomId(1)), Some(RoomId(9)), Some(RoomId(3))]);
        assert_eq!(rng.consumed(), 2);
    }

    #[test]
    fn test_all_misses_leave_slots() {
        let mut slots = vec![Some(RoomId(1)), Some(RoomId(2))];
        let mut rng = ScriptedRng::new(vec![3]);
        assert_eq!(offer(&mut slots, RoomId(9), 4, &mut rng), None);
        assert_eq!(slots, vec![Some(RoomId(1)), Some(RoomId(2))]);
    }
}
