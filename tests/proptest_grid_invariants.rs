//! Property-based invariant tests for the grid engine.
//!
//! Verifies:
//! 1. Repeated arrow keys clamp focus to the grid edges
//! 2. Focus stays inside the grid for any key sequence
//! 3. Single selection mode never keeps more than one row selected
//! 4. Discarding an edit leaves every record unchanged
//! 5. Scrolling to a computed position is idempotent
//! 6. Patches equal to the current values never mark a record dirty

mod common;

use common::{Harness, inventory, inventory_columns, press};
use crossterm::event::KeyCode;
use datagrid::geometry::{Bounds, ScrollContainer, calc_scroll_pos};
use datagrid::record::fields;
use datagrid::{Coordinate, DirtyState, SelectionMode};
use proptest::prelude::*;
use serde_json::json;

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_nav_key() -> impl Strategy<Value = KeyCode> {
    prop_oneof![
        Just(KeyCode::Up),
        Just(KeyCode::Down),
        Just(KeyCode::Left),
        Just(KeyCode::Right),
        Just(KeyCode::Tab),
        Just(KeyCode::Backspace),
    ]
}

fn arb_any_key() -> impl Strategy<Value = KeyCode> {
    prop_oneof![
        4 => arb_nav_key(),
        1 => Just(KeyCode::Enter),
        1 => Just(KeyCode::Esc),
        1 => (b'a'..=b'z').prop_map(|b| KeyCode::Char(b as char)),
        1 => (b'0'..=b'9').prop_map(|b| KeyCode::Char(b as char)),
    ]
}

#[derive(Debug, Clone)]
enum SelectionOp {
    Set(Vec<usize>),
    Adjust(Vec<usize>, Vec<usize>),
    All(bool),
}

fn arb_selection_op(rows: usize) -> impl Strategy<Value = SelectionOp> {
    let idx = prop::collection::vec(0..rows + 2, 0..4);
    prop_oneof![
        idx.clone().prop_map(SelectionOp::Set),
        (idx.clone(), idx).prop_map(|(a, r)| SelectionOp::Adjust(a, r)),
        any::<bool>().prop_map(SelectionOp::All),
    ]
}

fn arb_container() -> impl Strategy<Value = ScrollContainer> {
    (0i32..50, 0i32..50, 1i32..80, 1i32..40, 0i32..200, 0i32..200, 0i32..2).prop_map(
        |(left, top, width, height, scroll_top, scroll_left, gutter)| ScrollContainer {
            bounds: Bounds::new(left, top, width, height),
            scroll_top,
            scroll_left,
            gutter_width: gutter,
            gutter_height: 0,
        },
    )
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn repeated_down_clamps_to_last_row(rows in 1usize..20, presses in 0usize..40) {
        let mut h = Harness::inventory(rows);
        h.grid.move_focus_to(Coordinate::new(0, 0));
        for _ in 0..presses {
            h.grid.handle_key(&press(KeyCode::Down));
        }
        prop_assert_eq!(h.grid.focus(), Some(Coordinate::new(presses.min(rows - 1), 0)));
    }

    #[test]
    fn repeated_left_clamps_to_first_column(presses in 0usize..6) {
        let mut h = Harness::inventory(3);
        h.grid.move_focus_to(Coordinate::new(2, 1));
        for _ in 0..presses {
            h.grid.handle_key(&press(KeyCode::Left));
        }
        prop_assert_eq!(h.grid.focus(), Some(Coordinate::new(2, 1usize.saturating_sub(presses))));
    }

    #[test]
    fn focus_stays_inside_grid(
        rows in 1usize..10,
        keys in prop::collection::vec(arb_any_key(), 0..60),
    ) {
        let mut h = Harness::inventory(rows);
        for key in keys {
            h.grid.handle_key(&press(key));
            if let Some(focus) = h.grid.focus() {
                prop_assert!(focus.row < rows);
                prop_assert!(focus.column < 2);
            }
            if let Some(target) = h.grid.edit_target() {
                prop_assert_eq!(Some(target), h.grid.focus());
            }
        }
    }

    #[test]
    fn single_mode_keeps_at_most_one_row(
        ops in prop::collection::vec(arb_selection_op(6), 0..30),
    ) {
        let mut h = Harness::new(inventory_columns(), inventory(6), Some(SelectionMode::Single));
        for op in ops {
            match op {
                SelectionOp::Set(rows) => h.grid.set_selection(&rows),
                SelectionOp::Adjust(added, removed) => h.grid.adjust_selection(&added, &removed),
                SelectionOp::All(selected) => h.grid.select_all(selected),
            };
            prop_assert!(h.grid.selected_rows().len() <= 1);
        }
    }

    #[test]
    fn discarded_edit_leaves_records_unchanged(
        row in 0usize..5,
        column in 0usize..2,
        typed in "[a-z0-9]{0,8}",
    ) {
        let mut h = Harness::inventory(5);
        let before = h.grid.records().clone();
        prop_assert!(h.grid.open_edit(Coordinate::new(row, column), None));
        for c in typed.chars() {
            h.grid.handle_key(&press(KeyCode::Char(c)));
        }
        h.grid.end_edit(false);
        prop_assert_eq!(h.grid.records(), &before);
        prop_assert_eq!(h.grid.edit_target(), None);
    }

    #[test]
    fn scroll_position_is_idempotent(
        parent in arb_container(),
        (left, top, width, height) in (-100i32..300, -100i32..300, 1i32..20, 1i32..5),
    ) {
        // keep the child small enough to fit so a single scroll reveals it
        prop_assume!(width + parent.gutter_width <= parent.bounds.width());
        prop_assume!(height <= parent.bounds.height());
        let child = Bounds::new(left, top, width, height);

        let first = calc_scroll_pos(&parent, &child);
        let new_top = first.top.unwrap_or(parent.scroll_top);
        let new_left = first.left.unwrap_or(parent.scroll_left);
        let scrolled = ScrollContainer {
            scroll_top: new_top,
            scroll_left: new_left,
            ..parent
        };
        let moved = child.offset(parent.scroll_left - new_left, parent.scroll_top - new_top);
        prop_assert!(calc_scroll_pos(&scrolled, &moved).is_noop());
    }

    #[test]
    fn identical_patch_never_dirties(row in 0usize..4) {
        let mut h = Harness::inventory(4);
        let qty = json!(row * 10);
        prop_assert_eq!(h.grid.apply_change(row, fields([("qty", qty)]), None), None);
        prop_assert_eq!(h.grid.records().get(row).map(|r| r.dirty), Some(DirtyState::Clean));
        prop_assert!(h.drain().is_empty());
    }
}
