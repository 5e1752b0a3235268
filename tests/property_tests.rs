//! Property tests for the randomizer, the move engine and line clearing.

use proptest::prelude::*;

use srs_tetris::core::{Bag, MoveEngine, Playfield};
use srs_tetris::types::{PieceKind, Point};

const COLS: u8 = 10;
const ROWS: u8 = 22;
const FULL: u16 = (1 << COLS) - 1;

fn apply_op(engine: &mut MoveEngine, op: u8) {
    match op {
        0 => engine.shift_left(),
        1 => engine.shift_right(),
        2 => engine.rotate_left(),
        3 => engine.rotate_right(),
        4 => {
            engine.soft_drop();
        }
        5 => {
            engine.hard_drop();
        }
        _ => engine.hold(),
    }
    while engine.pop_event().is_some() {}
    if engine.falling().is_none() {
        engine.spawn();
        while engine.pop_event().is_some() {}
    }
}

fn assert_falling_in_bounds(engine: &MoveEngine) {
    let Some(falling) = engine.falling() else {
        return;
    };
    let field = engine.playfield();
    assert!(!field.collides(&falling.piece, falling.point));
    for p in falling.piece.cells_at(falling.point) {
        assert!(p.x >= 0 && (p.x as usize) < field.cols(), "{p:?}");
        assert!(p.y >= 0, "{p:?}");
    }
}

proptest! {
    #[test]
    fn bag_deals_whole_permutations(seed in any::<u32>()) {
        let mut bag = Bag::new(seed);
        let drawn: Vec<PieceKind> = (0..35).map(|_| bag.next_spawn_candidate().kind).collect();
        let mut all = PieceKind::ALL.to_vec();
        all.sort();
        for window in drawn.chunks(7) {
            let mut window = window.to_vec();
            window.sort();
            prop_assert_eq!(&window, &all);
        }
    }

    #[test]
    fn falling_piece_never_leaves_the_field(
        seed in any::<u32>(),
        ops in prop::collection::vec(0u8..7, 1..300),
    ) {
        let mut engine = MoveEngine::new(COLS, ROWS, Point::new(4, 20));
        engine.start(seed);
        engine.spawn();
        for op in ops {
            apply_op(&mut engine, op);
            if engine.is_stopped() {
                break;
            }
            assert_falling_in_bounds(&engine);
        }
    }

    #[test]
    fn ghost_is_the_landing_point(
        seed in any::<u32>(),
        ops in prop::collection::vec(0u8..7, 0..120),
    ) {
        let mut engine = MoveEngine::new(COLS, ROWS, Point::new(4, 20));
        engine.start(seed);
        engine.spawn();
        for op in ops {
            apply_op(&mut engine, op);
            if engine.is_stopped() {
                return Ok(());
            }
        }
        let falling = engine.falling().unwrap();
        let field = engine.playfield();
        prop_assert_eq!(falling.ghost.x, falling.point.x);
        prop_assert!(falling.ghost.y <= falling.point.y);
        prop_assert!(!field.collides(&falling.piece, falling.ghost));
        prop_assert!(field.collides(&falling.piece, falling.ghost.add_y(-1)));

        let ghost = falling.ghost;
        let distance = engine.clone().hard_drop();
        prop_assert_eq!(distance as i8, falling.point.y - ghost.y);
    }

    #[test]
    fn line_clear_compacts_the_stack(
        masks in prop::collection::vec(prop_oneof![Just(FULL), 1u16..FULL], 0..26),
    ) {
        let mut field = Playfield::new(COLS, ROWS);
        for (y, mask) in masks.iter().enumerate() {
            for x in 0..COLS as i32 {
                if mask & (1 << x) != 0 {
                    field.set(x, y as i32, Some(PieceKind::J));
                }
            }
        }

        let cleared = field.clear_lines();
        let expected_cleared: Vec<usize> = masks
            .iter()
            .enumerate()
            .filter(|(_, m)| **m == FULL)
            .map(|(y, _)| y)
            .collect();
        prop_assert_eq!(&cleared, &expected_cleared);

        let survivors: Vec<u16> = masks.iter().copied().filter(|&m| m != FULL).collect();
        for y in 0..field.height() {
            let mask = survivors.get(y).copied().unwrap_or(0);
            for x in 0..COLS as i32 {
                let filled = mask & (1 << x) != 0;
                prop_assert_eq!(field.is_occupied(x, y as i32), filled, "cell ({}, {})", x, y);
            }
        }
    }
}

#[test]
fn bag_spreads_kinds_evenly_over_many_refills() {
    const REFILLS: usize = 10_000;
    let mut bag = Bag::new(31337);
    let mut totals = [0usize; 7];
    let mut by_slot = [[0usize; 7]; 7];
    for draw in 0..REFILLS * 7 {
        let kind = bag.next_spawn_candidate().kind;
        let index = PieceKind::ALL.iter().position(|&k| k == kind).unwrap();
        totals[index] += 1;
        by_slot[draw % 7][index] += 1;
    }

    // Every refill is a permutation, so the totals are exact.
    assert_eq!(totals, [REFILLS; 7]);

    // Each kind lands in each slot of a refill about a seventh of the time.
    let expected = REFILLS / 7;
    for (slot, counts) in by_slot.iter().enumerate() {
        for (index, &count) in counts.iter().enumerate() {
            assert!(
                count.abs_diff(expected) < expected / 6,
                "kind {:?} in slot {slot}: {count}",
                PieceKind::ALL[index]
            );
        }
    }
}
