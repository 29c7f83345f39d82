//! Selection controller.
//!
//! Turns left-button pointer input into selection-set mutations:
//!
//! - press records the start point, nothing is decided yet
//! - holding and moving past the drag threshold starts a box drag
//! - release without a drag is a click (shift toggles, otherwise replace)
//! - release after a drag is a box selection over units only
//!
//! Every mutation ends with a [`SimEvent::SelectionChanged`] carrying the
//! full set.

use crate::components::EntityId;
use crate::config::SelectionConfig;
use crate::events::{EventQueue, SimEvent};
use crate::input::PointerInput;
use crate::math::{ScreenRect, Vec2};
use crate::registry::EntityRegistry;
use crate::spatial::SpatialQuery;

/// Insertion-ordered set of selected entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    members: Vec<EntityId>,
}

impl SelectionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Members, first-selected first.
    #[must_use]
    pub fn as_slice(&self) -> &[EntityId] {
        &self.members
    }

    /// Check membership.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    /// Append `id` unless present. Returns whether it was added.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Remove `id`, preserving the order of the rest. Returns whether it was present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.members.iter().position(|&member| member == id) {
            Some(index) => {
                self.members.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every member, returning them in order.
    pub fn take(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.members)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate members in order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().copied()
    }
}

/// Drag-tracking state of the left button.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum DragState {
    #[default]
    Idle,
    /// Button is down; click or drag not decided yet.
    Pressed { start: Vec2 },
    /// Threshold exceeded; a box is being drawn.
    Dragging { start: Vec2 },
}

/// Owns the selection set and the click/drag state machine.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    config: SelectionConfig,
    set: SelectionSet,
    drag: DragState,
}

impl SelectionController {
    /// Create a controller with an empty selection.
    #[must_use]
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            set: SelectionSet::new(),
            drag: DragState::Idle,
        }
    }

    /// The current selection.
    #[must_use]
    pub fn selection(&self) -> &SelectionSet {
        &self.set
    }

    /// Check if a box drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Process one tick of left-button input.
    pub fn handle_input<S: SpatialQuery + ?Sized>(
        &mut self,
        input: &PointerInput,
        registry: &mut EntityRegistry,
        spatial: &S,
        events: &mut EventQueue,
    ) {
        if input.left.just_pressed {
            if self.is_dragging() {
                events.push(SimEvent::SelectionBoxEnded);
            }
            self.drag = DragState::Pressed {
                start: input.position,
            };
        }

        if input.left.pressed {
            self.track_drag(input.position, events);
        }

        if input.left.just_released {
            match std::mem::take(&mut self.drag) {
                DragState::Dragging { start } => {
                    events.push(SimEvent::SelectionBoxEnded);
                    let rect = ScreenRect::from_corners(start, input.position);
                    self.box_select(rect, input.shift_held, registry, spatial, events);
                }
                DragState::Pressed { .. } | DragState::Idle => {
                    self.click_select(input, registry, spatial, events);
                }
            }
        }
    }

    fn track_drag(&mut self, current: Vec2, events: &mut EventQueue) {
        match self.drag {
            DragState::Pressed { start } => {
                if current.distance(start) > self.config.drag_threshold_pixels {
                    self.drag = DragState::Dragging { start };
                    events.push(SimEvent::SelectionBoxBegan { start });
                    events.push(SimEvent::SelectionBoxDragged {
                        rect: ScreenRect::from_corners(start, current),
                    });
                }
            }
            DragState::Dragging { start } => {
                events.push(SimEvent::SelectionBoxDragged {
                    rect: ScreenRect::from_corners(start, current),
                });
            }
            DragState::Idle => {}
        }
    }

    fn click_select<S: SpatialQuery + ?Sized>(
        &mut self,
        input: &PointerInput,
        registry: &mut EntityRegistry,
        spatial: &S,
        events: &mut EventQueue,
    ) {
        let ray = spatial.screen_point_to_ray(input.position);
        let hit = spatial
            .raycast_selectable(registry, &ray)
            .filter(|&id| registry.get(id).is_some_and(|entity| entity.is_alive()));

        match (hit, input.shift_held) {
            (Some(id), true) => {
                if self.set.contains(id) {
                    self.deselect(id, registry, events);
                } else {
                    self.select(id, registry, events);
                }
            }
            (Some(id), false) => {
                self.clear(registry, events);
                self.select(id, registry, events);
            }
            (None, false) => self.clear(registry, events),
            // Additive click on nothing keeps the selection as is
            (None, true) => return,
        }
        tracing::debug!(?hit, count = self.set.len(), "Click selection");
        self.notify(events);
    }

    fn box_select<S: SpatialQuery + ?Sized>(
        &mut self,
        rect: ScreenRect,
        additive: bool,
        registry: &mut EntityRegistry,
        spatial: &S,
        events: &mut EventQueue,
    ) {
        if !additive {
            self.clear(registry, events);
        }

        let inside: Vec<EntityId> = registry
            .iter()
            .filter(|entity| entity.is_unit() && entity.is_alive())
            .filter(|entity| {
                let projected = spatial.world_to_screen(entity.position());
                projected.z >= 0.0 && rect.contains(Vec2::new(projected.x, projected.y))
            })
            .map(|entity| entity.id)
            .collect();

        for id in inside {
            self.select(id, registry, events);
        }
        tracing::debug!(?rect, count = self.set.len(), "Box selection");
        self.notify(events);
    }

    /// Drop an entity that left the world. Returns whether it was selected.
    pub fn forget(&mut self, id: EntityId, events: &mut EventQueue) -> bool {
        self.forget_all(&[id], events) > 0
    }

    /// Drop every entity in `ids` that left the world, then notify once if
    /// any of them was selected. Returns how many were selected.
    pub fn forget_all(&mut self, ids: &[EntityId], events: &mut EventQueue) -> usize {
        let mut removed = 0;
        for &id in ids {
            if self.set.remove(id) {
                removed += 1;
            }
        }
        if removed > 0 {
            self.notify(events);
        }
        removed
    }

    fn select(&mut self, id: EntityId, registry: &mut EntityRegistry, events: &mut EventQueue) {
        self.set.insert(id);
        let changed = registry
            .get_mut(id)
            .is_some_and(|entity| entity.selectable.select());
        if changed {
            events.push(SimEvent::SelectionHighlight {
                entity: id,
                selected: true,
            });
        }
    }

    fn deselect(&mut self, id: EntityId, registry: &mut EntityRegistry, events: &mut EventQueue) {
        self.set.remove(id);
        Self::unhighlight(id, registry, events);
    }

    fn clear(&mut self, registry: &mut EntityRegistry, events: &mut EventQueue) {
        for id in self.set.take() {
            Self::unhighlight(id, registry, events);
        }
    }

    fn unhighlight(id: EntityId, registry: &mut EntityRegistry, events: &mut EventQueue) {
        let changed = registry
            .get_mut(id)
            .is_some_and(|entity| entity.selectable.deselect());
        if changed {
            events.push(SimEvent::SelectionHighlight {
                entity: id,
                selected: false,
            });
        }
    }

    fn notify(&self, events: &mut EventQueue) {
        events.push(SimEvent::SelectionChanged {
            selection: self.set.as_slice().to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ButtonState;
    use crate::math::Vec3;
    use crate::registry::EntitySpawnParams;
    use crate::spatial::TopDownCamera;

    struct Fixture {
        camera: TopDownCamera,
        registry: EntityRegistry,
        controller: SelectionController,
        events: EventQueue,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                camera: TopDownCamera::default(),
                registry: EntityRegistry::new(),
                controller: SelectionController::new(SelectionConfig::default()),
                events: EventQueue::new(),
            }
        }

        fn feed(&mut self, input: PointerInput) {
            self.controller
                .handle_input(&input, &mut self.registry, &self.camera, &mut self.events);
        }

        fn click(&mut self, world: Vec3, shift: bool) {
            let at = self.camera.screen_point_of(world);
            let mut press = PointerInput::at(at).with_left(ButtonState::PRESS);
            let mut release = PointerInput::at(at).with_left(ButtonState::RELEASE);
            press.shift_held = shift;
            release.shift_held = shift;
            self.feed(press);
            self.feed(release);
        }

        fn drag(&mut self, from: Vec2, to: Vec2, shift: bool) {
            let mut steps = vec![
                PointerInput::at(from).with_left(ButtonState::PRESS),
                PointerInput::at(to).with_left(ButtonState::HOLD),
                PointerInput::at(to).with_left(ButtonState::RELEASE),
            ];
            for step in &mut steps {
                step.shift_held = shift;
            }
            for step in steps {
                self.feed(step);
            }
        }
    }

    #[test]
    fn test_click_replaces_selection() {
        let mut fx = Fixture::new();
        let a = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(2.0, 0.0, 0.0)));
        let b = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(-2.0, 0.0, 0.0)));

        fx.click(Vec3::new(2.0, 0.0, 0.0), false);
        assert_eq!(fx.controller.selection().as_slice(), &[a]);

        fx.click(Vec3::new(-2.0, 0.0, 0.0), false);
        assert_eq!(fx.controller.selection().as_slice(), &[b]);
        assert!(!fx.registry.get(a).unwrap().selectable.is_selected());
        assert!(fx.registry.get(b).unwrap().selectable.is_selected());
    }

    #[test]
    fn test_click_on_nothing_clears_unless_shift() {
        let mut fx = Fixture::new();
        let a = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::ZERO));
        fx.click(Vec3::ZERO, false);
        fx.events.drain();

        fx.click(Vec3::new(10.0, 0.0, 10.0), true);
        assert_eq!(fx.controller.selection().as_slice(), &[a]);
        assert!(fx.events.is_empty());

        fx.click(Vec3::new(10.0, 0.0, 10.0), false);
        assert!(fx.controller.selection().is_empty());
        assert_eq!(
            fx.events.drain().last(),
            Some(&SimEvent::SelectionChanged { selection: vec![] })
        );
    }

    #[test]
    fn test_shift_click_toggles() {
        let mut fx = Fixture::new();
        let a = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(2.0, 0.0, 0.0)));
        let b = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(-2.0, 0.0, 0.0)));

        fx.click(Vec3::new(2.0, 0.0, 0.0), false);
        fx.click(Vec3::new(-2.0, 0.0, 0.0), true);
        assert_eq!(fx.controller.selection().as_slice(), &[a, b]);

        fx.click(Vec3::new(2.0, 0.0, 0.0), true);
        assert_eq!(fx.controller.selection().as_slice(), &[b]);
    }

    #[test]
    fn test_small_movement_is_still_a_click() {
        let mut fx = Fixture::new();
        let a = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::ZERO));
        let at = fx.camera.screen_point_of(Vec3::ZERO);

        fx.feed(PointerInput::at(at).with_left(ButtonState::PRESS));
        fx.feed(PointerInput::at(at + Vec2::new(5.0, 0.0)).with_left(ButtonState::HOLD));
        assert!(!fx.controller.is_dragging());
        fx.feed(PointerInput::at(at + Vec2::new(3.0, 0.0)).with_left(ButtonState::RELEASE));

        assert_eq!(fx.controller.selection().as_slice(), &[a]);
    }

    #[test]
    fn test_box_selects_units_only() {
        let mut fx = Fixture::new();
        let a = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(1.0, 0.0, 1.0)));
        fx.registry.spawn(EntitySpawnParams::building(0, Vec3::new(2.0, 0.0, 2.0)));
        let b = fx.registry.spawn(EntitySpawnParams::soldier(1, Vec3::new(3.0, 0.0, 3.0)));
        fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(30.0, 0.0, 3.0)));

        let from = fx.camera.screen_point_of(Vec3::new(0.0, 0.0, 0.0));
        let to = fx.camera.screen_point_of(Vec3::new(5.0, 0.0, 5.0));
        fx.drag(to, from, false);

        assert_eq!(fx.controller.selection().as_slice(), &[a, b]);
        let events = fx.events.drain();
        assert!(events.contains(&SimEvent::SelectionBoxBegan { start: to }));
        assert!(events.contains(&SimEvent::SelectionBoxEnded));
    }

    #[test]
    fn test_box_ignores_points_behind_camera() {
        let mut fx = Fixture::new();
        fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(1.0, 50.0, 1.0)));
        let from = fx.camera.screen_point_of(Vec3::ZERO);
        let to = fx.camera.screen_point_of(Vec3::new(5.0, 0.0, 5.0));
        fx.drag(from, to, false);
        assert!(fx.controller.selection().is_empty());
    }

    #[test]
    fn test_additive_box_highlights_once() {
        let mut fx = Fixture::new();
        let a = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(1.0, 0.0, 1.0)));
        let from = fx.camera.screen_point_of(Vec3::ZERO);
        let to = fx.camera.screen_point_of(Vec3::new(5.0, 0.0, 5.0));

        fx.drag(from, to, false);
        fx.events.drain();
        fx.drag(from, to, true);

        assert_eq!(fx.controller.selection().as_slice(), &[a]);
        let highlights = fx
            .events
            .drain()
            .into_iter()
            .filter(|event| matches!(event, SimEvent::SelectionHighlight { .. }))
            .count();
        assert_eq!(highlights, 0);
    }

    #[test]
    fn test_forget_removes_and_notifies() {
        let mut fx = Fixture::new();
        let a = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::ZERO));
        fx.click(Vec3::ZERO, false);
        fx.events.drain();

        assert!(fx.controller.forget(a, &mut fx.events));
        assert!(!fx.controller.forget(a, &mut fx.events));
        assert_eq!(fx.events.len(), 1);
        assert!(fx.controller.selection().is_empty());
    }

    #[test]
    fn test_forget_all_notifies_once_with_settled_selection() {
        let mut fx = Fixture::new();
        let a = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::ZERO));
        let b = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(3.0, 0.0, 0.0)));
        let c = fx.registry.spawn(EntitySpawnParams::soldier(0, Vec3::new(6.0, 0.0, 0.0)));
        fx.click(Vec3::ZERO, false);
        fx.click(Vec3::new(3.0, 0.0, 0.0), true);
        fx.click(Vec3::new(6.0, 0.0, 0.0), true);
        fx.events.drain();

        assert_eq!(fx.controller.forget_all(&[a, b], &mut fx.events), 2);
        let notified: Vec<Vec<EntityId>> = fx
            .events
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                SimEvent::SelectionChanged { selection } => Some(selection),
                _ => None,
            })
            .collect();
        assert_eq!(notified, vec![vec![c]]);

        assert_eq!(fx.controller.forget_all(&[a, b], &mut fx.events), 0);
        assert!(fx.events.is_empty());
    }
}
