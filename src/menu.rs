//! A popup menu bound to a canvas.
//!
//! Actions are registered once as (id, label, predicate, handler). Opening the
//! menu evaluates every predicate against the click context and lists only the
//! actions that apply. Every way of closing the menu swallows the event that
//! closed it.

use crate::canvas::{CanvasState, Key, Propagation};
use crate::geometry::Point;
use crate::model::ShapeId;
use log::debug;

/// Where the menu was requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuContext {
    /// The shape under the pointer, if any.
    pub target: Option<ShapeId>,
    pub at: Point,
}

type Predicate = Box<dyn Fn(&CanvasState, &MenuContext) -> bool>;
type Handler = Box<dyn Fn(&mut CanvasState, &MenuContext)>;

struct MenuAction {
    id: String,
    label: String,
    applies: Predicate,
    handler: Handler,
}

#[derive(Debug, Clone, PartialEq)]
struct OpenMenu {
    context: MenuContext,
    /// Indices into `actions`, in registration order.
    items: Vec<usize>,
    focused: usize,
}

#[derive(Default)]
pub struct ContextMenu {
    actions: Vec<MenuAction>,
    open: Option<OpenMenu>,
}

impl ContextMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// A menu with the stock canvas actions: delete and disconnect.
    pub fn with_default_actions() -> Self {
        let mut menu = Self::new();
        menu.register(
            "delete",
            "Delete",
            |canvas, ctx| ctx.target.is_some() || !canvas.selection().is_empty(),
            |canvas, ctx| {
                if let Some(target) = ctx.target {
                    if !canvas.is_selected(target) {
                        let _ = canvas.remove_shape(target);
                        return;
                    }
                }
                canvas.delete_selection();
            },
        );
        menu.register(
            "disconnect",
            "Remove cables",
            |canvas, ctx| {
                ctx.target
                    .and_then(|t| canvas.shape(t))
                    .is_some_and(|s| s.all_magnets().any(|(_, m)| m.is_connected()))
            },
            |canvas, ctx| {
                if let Some(target) = ctx.target {
                    let _ = canvas.disconnect_shape(target);
                }
            },
        );
        menu
    }

    /// Adds an action. Returns `false` and changes nothing when `id` is taken.
    pub fn register<P, H>(&mut self, id: &str, label: &str, applies: P, handler: H) -> bool
    where
        P: Fn(&CanvasState, &MenuContext) -> bool + 'static,
        H: Fn(&mut CanvasState, &MenuContext) + 'static,
    {
        if self.actions.iter().any(|a| a.id == id) {
            debug!("Menu action '{}' already registered; ignoring", id);
            return false;
        }
        self.actions.push(MenuAction {
            id: id.to_string(),
            label: label.to_string(),
            applies: Box::new(applies),
            handler: Box::new(handler),
        });
        true
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Opens the menu for a click context. Stays closed when no action applies.
    pub fn open(&mut self, canvas: &CanvasState, context: MenuContext) -> bool {
        let items: Vec<usize> = self
            .actions
            .iter()
            .enumerate()
            .filter(|(_, a)| (a.applies)(canvas, &context))
            .map(|(i, _)| i)
            .collect();
        if items.is_empty() {
            self.open = None;
            return false;
        }
        self.open = Some(OpenMenu {
            context,
            items,
            focused: 0,
        });
        true
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    /// Labels of the visible items, top to bottom.
    pub fn items(&self) -> Vec<&str> {
        self.open
            .as_ref()
            .map(|m| m.items.iter().map(|&i| self.actions[i].label.as_str()).collect())
            .unwrap_or_default()
    }

    /// Ids of the visible items, top to bottom.
    pub fn item_ids(&self) -> Vec<&str> {
        self.open
            .as_ref()
            .map(|m| m.items.iter().map(|&i| self.actions[i].id.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn focused(&self) -> Option<usize> {
        self.open.as_ref().map(|m| m.focused)
    }

    /// Runs the visible item at `index` and closes the menu.
    pub fn click_item(&mut self, index: usize, canvas: &mut CanvasState) -> Propagation {
        let Some(open) = self.open.take() else {
            return Propagation::Continue;
        };
        if let Some(&action) = open.items.get(index) {
            let action = &self.actions[action];
            debug!("Running menu action '{}'", action.id);
            (action.handler)(canvas, &open.context);
        }
        Propagation::Stop
    }

    /// A click anywhere outside the menu closes it.
    pub fn click_outside(&mut self) -> Propagation {
        if self.open.take().is_some() {
            Propagation::Stop
        } else {
            Propagation::Continue
        }
    }

    /// Keyboard handling while open: arrows move focus, Enter activates, Escape closes.
    pub fn key_down(&mut self, key: Key, canvas: &mut CanvasState) -> Propagation {
        let Some(open) = self.open.as_mut() else {
            return Propagation::Continue;
        };
        match key {
            Key::Escape => {
                self.open = None;
                Propagation::Stop
            }
            Key::Enter => {
                let focused = open.focused;
                self.click_item(focused, canvas)
            }
            Key::ArrowDown => {
                open.focused = (open.focused + 1) % open.items.len();
                Propagation::Stop
            }
            Key::ArrowUp => {
                open.focused = (open.focused + open.items.len() - 1) % open.items.len();
                Propagation::Stop
            }
            _ => Propagation::Continue,
        }
    }
}
