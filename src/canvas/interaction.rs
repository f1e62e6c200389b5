use super::{CanvasState, CollisionPolicy};
use crate::error::ConnectRejection;
use crate::geometry::{Point, Rect};
use crate::model::{ConnectorId, MagnetRef, ShapeId};
use log::debug;

/// The pointer gesture currently in progress. Exactly one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionMode {
    Idle,
    /// The selected shapes follow the pointer. `origins` remembers where each
    /// started so the drag can be reverted.
    DraggingShapes {
        grab: Point,
        origins: Vec<(ShapeId, Point)>,
    },
    /// A new cable is being pulled out of `from`; its loose end sits at `cursor`.
    DraggingConnector { from: MagnetRef, cursor: Point },
    /// Rubber-band selection. `extend` keeps the previous selection.
    BoxSelecting {
        anchor: Point,
        cursor: Point,
        extend: bool,
    },
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    pub(super) fn involves(&self, id: ShapeId) -> bool {
        match self {
            InteractionMode::Idle | InteractionMode::BoxSelecting { .. } => false,
            InteractionMode::DraggingShapes { origins, .. } => origins.iter().any(|(s, _)| *s == id),
            InteractionMode::DraggingConnector { from, .. } => from.shape == id,
        }
    }

    /// The rubber band, if one is being drawn.
    pub fn selection_box(&self) -> Option<Rect> {
        match self {
            InteractionMode::BoxSelecting { anchor, cursor, .. } => {
                Some(Rect::from_corners(*anchor, *cursor))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false };
    pub const SHIFT: Modifiers = Modifiers { shift: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Delete,
    Backspace,
    ArrowUp,
    ArrowDown,
    Char(char),
}

/// Whether an event may continue to page-level handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Stop,
    Continue,
}

/// What releasing the pointer accomplished.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    Nothing,
    Moved(Vec<ShapeId>),
    /// The drop collided and the shapes went back to where they started.
    Reverted(Vec<ShapeId>),
    Connected(ConnectorId),
    /// The cable was dropped on empty space or an incompatible magnet.
    CableDiscarded(Option<ConnectRejection>),
    Selected(usize),
}

impl CanvasState {
    /// Pointer pressed at `screen` (element pixels).
    ///
    /// Magnets take precedence over shape bodies, and both over empty canvas.
    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) {
        if !self.mode.is_idle() {
            self.cancel_gesture();
        }
        let p = self.to_canvas(screen);

        if let Some(magnet) = self.magnet_at(p) {
            debug!("Start cable from {:?}", magnet);
            self.mode = InteractionMode::DraggingConnector {
                from: magnet,
                cursor: p,
            };
        } else if let Some(id) = self.shape_at(p) {
            if modifiers.shift {
                let _ = self.toggle_selection(id);
            } else if !self.is_selected(id) {
                // Joins the moving set; clicking empty canvas is what clears it.
                self.selection.push(id);
            }
            if self.is_selected(id) {
                let origins = self
                    .selection
                    .iter()
                    .filter_map(|s| self.shape(*s).map(|shape| (*s, shape.position)))
                    .collect();
                debug!("Start dragging {} shape(s)", self.selection.len());
                self.mode = InteractionMode::DraggingShapes { grab: p, origins };
            }
        } else {
            if !modifiers.shift {
                self.selection.clear();
            }
            self.mode = InteractionMode::BoxSelecting {
                anchor: p,
                cursor: p,
                extend: modifiers.shift,
            };
        }
        self.valid = false;
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let p = self.to_canvas(screen);
        match &mut self.mode {
            InteractionMode::Idle => return,
            InteractionMode::DraggingConnector { cursor, .. }
            | InteractionMode::BoxSelecting { cursor, .. } => *cursor = p,
            InteractionMode::DraggingShapes { grab, origins } => {
                let delta = p - *grab;
                let targets: Vec<(ShapeId, Point)> =
                    origins.iter().map(|(id, o)| (*id, *o + delta)).collect();
                for (id, to) in targets {
                    let _ = self.move_shape(id, to);
                }
            }
        }
        self.valid = false;
    }

    pub fn pointer_up(&mut self, screen: Point) -> GestureOutcome {
        let p = self.to_canvas(screen);
        let mode = std::mem::replace(&mut self.mode, InteractionMode::Idle);
        self.valid = false;

        match mode {
            InteractionMode::Idle => GestureOutcome::Nothing,
            InteractionMode::DraggingConnector { from, .. } => self.finish_cable(from, p),
            InteractionMode::DraggingShapes { origins, .. } => self.finish_drag(origins),
            InteractionMode::BoxSelecting { anchor, extend, .. } => {
                let band = Rect::from_corners(anchor, p);
                if !extend {
                    self.selection.clear();
                }
                let hits: Vec<ShapeId> = self
                    .shapes
                    .iter()
                    .filter(|s| s.1.bounding_box().intersects(&band))
                    .map(|s| s.1.id())
                    .collect();
                for id in hits {
                    if !self.selection.contains(&id) {
                        self.selection.push(id);
                    }
                }
                GestureOutcome::Selected(self.selection.len())
            }
        }
    }

    fn finish_cable(&mut self, from: MagnetRef, p: Point) -> GestureOutcome {
        let Some(target) = self.magnet_at(p) else {
            debug!("Cable from {:?} dropped on empty canvas", from);
            return GestureOutcome::CableDiscarded(None);
        };
        match self.connect(from, target) {
            Ok(id) => GestureOutcome::Connected(id),
            Err(rejection) => {
                debug!("Cable from {:?} to {:?} rejected: {}", from, target, rejection);
                GestureOutcome::CableDiscarded(Some(rejection))
            }
        }
    }

    fn finish_drag(&mut self, origins: Vec<(ShapeId, Point)>) -> GestureOutcome {
        let moved: Vec<ShapeId> = origins.iter().map(|(id, _)| *id).collect();
        match self.config.drag_collision {
            CollisionPolicy::Allow => GestureOutcome::Moved(moved),
            CollisionPolicy::Nudge => {
                for id in &moved {
                    let _ = self.nudge_to_free_slot(*id);
                }
                GestureOutcome::Moved(moved)
            }
            CollisionPolicy::Reject => {
                let collides = moved.iter().any(|id| {
                    self.shape(*id).is_some_and(|s| {
                        let bbox = s.bounding_box();
                        self.shapes()
                            .filter(|o| !moved.contains(&o.id()))
                            .any(|o| o.bounding_box().intersects(&bbox))
                    })
                });
                if collides {
                    for (id, origin) in origins {
                        let _ = self.move_shape(id, origin);
                    }
                    debug!("Drag of {} shape(s) collided; reverted", moved.len());
                    GestureOutcome::Reverted(moved)
                } else {
                    GestureOutcome::Moved(moved)
                }
            }
        }
    }

    /// Abandons the gesture in progress: dragged shapes return, a pending cable vanishes.
    pub fn cancel_gesture(&mut self) {
        let mode = std::mem::replace(&mut self.mode, InteractionMode::Idle);
        if let InteractionMode::DraggingShapes { origins, .. } = mode {
            for (id, origin) in origins {
                let _ = self.move_shape(id, origin);
            }
        }
        self.valid = false;
    }

    pub fn key_down(&mut self, key: Key) -> Propagation {
        match key {
            Key::Escape if !self.mode.is_idle() => {
                self.cancel_gesture();
                Propagation::Stop
            }
            Key::Delete | Key::Backspace if self.mode.is_idle() && !self.selection.is_empty() => {
                let removed = self.delete_selection();
                debug!("Deleted {} selected shape(s)", removed);
                Propagation::Stop
            }
            _ => Propagation::Continue,
        }
    }
}
