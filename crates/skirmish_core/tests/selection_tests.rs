//! Selection controller behavior through the full tick loop.

use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{hold_at, press_at, release_at, Harness};

// =============================================================================
// Click selection
// =============================================================================

#[test]
fn test_click_selects_building_singly() {
    let mut harness = Harness::new();
    let unit = harness.dummy(0, -5.0, 0.0);
    let building = harness.building(0, 5.0, 0.0);

    harness.select(&[unit]);
    let events = harness.click(5.0, 0.0, false);

    assert_eq!(harness.sim.selection(), &[building]);
    assert_eq!(events.last_selection(), Some(&[building][..]));
    assert!(harness.entity(building).selectable.is_selected());
    assert!(!harness.entity(unit).selectable.is_selected());
}

#[test]
fn test_every_click_notifies_once() {
    let mut harness = Harness::new();
    harness.dummy(0, 0.0, 0.0);

    let events = harness.click(0.0, 0.0, false);
    assert_eq!(events.selection_change_count(), 1);

    let events = harness.click(20.0, 20.0, false);
    assert_eq!(events.selection_change_count(), 1);
    assert_eq!(events.last_selection(), Some(&[][..]));
}

#[test]
fn test_shift_click_on_empty_ground_keeps_selection() {
    let mut harness = Harness::new();
    let a = harness.dummy(0, 0.0, 0.0);
    harness.select(&[a]);

    let events = harness.click(20.0, 20.0, true);
    assert_eq!(events.selection_change_count(), 0);
    assert_eq!(harness.sim.selection(), &[a]);
}

#[test]
fn test_shift_click_toggle_preserves_order_of_others() {
    let mut harness = Harness::new();
    let a = harness.dummy(0, -4.0, 0.0);
    let b = harness.dummy(0, 0.0, 0.0);
    let c = harness.dummy(0, 4.0, 0.0);
    harness.select(&[a, b, c]);

    harness.click(0.0, 0.0, true);
    assert_eq!(harness.sim.selection(), &[a, c]);

    harness.click(0.0, 0.0, true);
    assert_eq!(harness.sim.selection(), &[a, c, b]);
}

// =============================================================================
// Box selection
// =============================================================================

#[test]
fn test_box_excludes_buildings() {
    let mut harness = Harness::new();
    let a = harness.dummy(0, 1.0, 1.0);
    harness.building(0, 2.0, 2.0);
    let b = harness.dummy(1, 3.0, 1.0);

    let events = harness.drag((0.0, 0.0), (5.0, 5.0), false);
    assert_eq!(harness.sim.selection(), &[a, b]);
    assert_eq!(events.last_selection(), Some(&[a, b][..]));
}

#[test]
fn test_box_replaces_unless_shift() {
    let mut harness = Harness::new();
    let outside = harness.dummy(0, -10.0, -10.0);
    let inside = harness.dummy(0, 2.0, 2.0);

    harness.select(&[outside]);
    harness.drag((0.0, 0.0), (5.0, 5.0), true);
    assert_eq!(harness.sim.selection(), &[outside, inside]);

    harness.drag((0.0, 0.0), (5.0, 5.0), false);
    assert_eq!(harness.sim.selection(), &[inside]);
}

#[test]
fn test_empty_box_without_shift_clears() {
    let mut harness = Harness::new();
    let a = harness.dummy(0, 0.0, 0.0);
    harness.select(&[a]);

    let events = harness.drag((10.0, 10.0), (15.0, 15.0), false);
    assert!(harness.sim.selection().is_empty());
    assert_eq!(events.selection_change_count(), 1);
}

#[test]
fn test_drag_box_events_in_order() {
    let mut harness = Harness::new();
    let start = harness.screen(0.0, 0.0);
    let mid = harness.screen(2.0, 2.0);
    let end = harness.screen(4.0, 3.0);

    assert!(harness.step(&press_at(start)).events.is_empty());

    let began = harness.step(&hold_at(mid));
    assert_eq!(
        began.events,
        vec![
            SimEvent::SelectionBoxBegan { start },
            SimEvent::SelectionBoxDragged {
                rect: ScreenRect::from_corners(start, mid)
            },
        ]
    );
    assert!(harness.sim.is_dragging());

    let dragged = harness.step(&hold_at(end));
    assert_eq!(
        dragged.events,
        vec![SimEvent::SelectionBoxDragged {
            rect: ScreenRect::from_corners(start, end)
        }]
    );

    let released = harness.step(&release_at(end));
    assert_eq!(released.events.first(), Some(&SimEvent::SelectionBoxEnded));
    assert!(!harness.sim.is_dragging());
}

#[test]
fn test_reselecting_in_box_highlights_once() {
    let mut harness = Harness::new();
    let a = harness.dummy(0, 1.0, 1.0);

    let first = harness.drag((0.0, 0.0), (5.0, 5.0), false);
    let highlights = |events: &TickEvents| {
        events
            .iter()
            .filter(|event| matches!(event, SimEvent::SelectionHighlight { selected: true, .. }))
            .count()
    };
    assert_eq!(highlights(&first), 1);

    let second = harness.drag((0.0, 0.0), (5.0, 5.0), true);
    assert_eq!(highlights(&second), 0);
    assert_eq!(harness.sim.selection(), &[a]);
}

// =============================================================================
// Interaction with the rest of the world
// =============================================================================

#[test]
fn test_pointer_over_ui_blocks_selection() {
    let mut harness = Harness::new();
    harness.dummy(0, 0.0, 0.0);
    let at = harness.screen(0.0, 0.0);

    harness.step(&press_at(at).over_ui());
    let events = harness.step(&release_at(at).over_ui());

    assert!(events.events.is_empty());
    assert!(harness.sim.selection().is_empty());
}

#[test]
fn test_dead_entities_leave_the_selection() {
    let mut harness = Harness::new();
    let victim = harness.spawn(EntitySpawnParams {
        health: Some(5.0),
        ..EntitySpawnParams::soldier(1, Vec3::new(3.0, 0.0, 0.0))
    });
    let survivor = harness.dummy(1, -10.0, 0.0);
    harness.select(&[victim, survivor]);
    harness.soldier(0, 0.0, 0.0);

    let died = harness
        .run(60)
        .into_iter()
        .find(|events| events.deaths().contains(&victim))
        .expect("victim should die");

    assert_eq!(died.last_selection(), Some(&[survivor][..]));
    assert_eq!(harness.sim.selection(), &[survivor]);
}

#[test]
fn test_simultaneous_deaths_notify_once_with_settled_selection() {
    let mut harness = Harness::new();
    let first = harness.spawn(EntitySpawnParams {
        team: 0,
        position: Vec3::new(0.0, 0.0, 0.0),
        health: Some(5.0),
        ..EntitySpawnParams::default()
    });
    let second = harness.spawn(EntitySpawnParams {
        team: 0,
        position: Vec3::new(0.0, 0.0, 10.0),
        health: Some(5.0),
        ..EntitySpawnParams::default()
    });
    let survivor = harness.dummy(0, -20.0, 0.0);
    harness.select(&[first, second, survivor]);
    // Mirrored shooters, so both shots land on the same tick
    harness.soldier(1, 3.0, 0.0);
    harness.soldier(1, 3.0, 10.0);

    let history = harness.run(90);
    let died = history
        .iter()
        .find(|events| !events.deaths().is_empty())
        .expect("victims should die");

    assert_eq!(died.deaths(), vec![first, second]);
    assert_eq!(died.selection_change_count(), 1);
    assert_eq!(died.last_selection(), Some(&[survivor][..]));
    assert_eq!(harness.sim.selection(), &[survivor]);
}

#[test]
fn test_removed_entities_cannot_be_clicked() {
    let mut harness = Harness::new();
    let victim = harness.dummy(0, 0.0, 0.0);
    harness.sim.despawn_entity(victim).unwrap();

    harness.click(0.0, 0.0, false);
    assert!(harness.sim.selection().is_empty());
}
