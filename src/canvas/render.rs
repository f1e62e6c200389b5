//! Immediate-mode painting of a canvas.
//!
//! Every frame is a full repaint: shapes bottom to top, then cables, then the
//! gesture overlays. The canvas talks to a [`Surface`], so any drawing backend
//! can sit behind it.

use super::CanvasState;
use crate::geometry::{Point, Rect};
use crate::model::{Direction, NodeKind, ShapeId};
use ahash::AHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    InputNode,
    StepNode,
    OutputNode,
    Selected,
    Error,
    Magnet,
    MagnetConnected,
    Cable,
    PendingCable,
    SelectionBox,
    Label,
}

/// A drawing backend.
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64, scale: f64);
    fn fill_rect(&mut self, rect: Rect, paint: Paint);
    fn stroke_rect(&mut self, rect: Rect, paint: Paint);
    fn fill_circle(&mut self, center: Point, radius: f64, paint: Paint);
    fn line(&mut self, from: Point, to: Point, paint: Paint);
    fn text(&mut self, at: Point, text: &str, paint: Paint);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        width: f64,
        height: f64,
        scale: f64,
    },
    FillRect(Rect, Paint),
    StrokeRect(Rect, Paint),
    Circle(Point, f64, Paint),
    Line(Point, Point, Paint),
    Text(Point, String, Paint),
}

/// A surface that records what was drawn.
#[derive(Debug, Default, Clone)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text(_, t, _) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, paint: Paint) -> usize {
        self.commands
            .iter()
            .filter(|c| match c {
                DrawCommand::FillRect(_, p)
                | DrawCommand::StrokeRect(_, p)
                | DrawCommand::Circle(_, _, p)
                | DrawCommand::Line(_, _, p)
                | DrawCommand::Text(_, _, p) => *p == paint,
                DrawCommand::Clear { .. } => false,
            })
            .count()
    }
}

impl Surface for DisplayList {
    fn clear(&mut self, width: f64, height: f64, scale: f64) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear {
            width,
            height,
            scale,
        });
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        self.commands.push(DrawCommand::FillRect(rect, paint));
    }

    fn stroke_rect(&mut self, rect: Rect, paint: Paint) {
        self.commands.push(DrawCommand::StrokeRect(rect, paint));
    }

    fn fill_circle(&mut self, center: Point, radius: f64, paint: Paint) {
        self.commands.push(DrawCommand::Circle(center, radius, paint));
    }

    fn line(&mut self, from: Point, to: Point, paint: Paint) {
        self.commands.push(DrawCommand::Line(from, to, paint));
    }

    fn text(&mut self, at: Point, text: &str, paint: Paint) {
        self.commands
            .push(DrawCommand::Text(at, text.to_string(), paint));
    }
}

impl CanvasState {
    /// Repaints when the canvas is invalid and not mid-update.
    /// Returns whether anything was drawn.
    pub fn draw(&mut self, surface: &mut dyn Surface) -> bool {
        if self.valid || self.updating {
            return false;
        }
        surface.clear(self.width(), self.height(), self.scale);

        let badges: AHashMap<ShapeId, usize> = self
            .execution_order()
            .map(|order| order.into_iter().enumerate().map(|(i, id)| (id, i + 1)).collect())
            .unwrap_or_default();
        let flagged: Vec<ShapeId> = self
            .validate()
            .iter()
            .flat_map(|issue| issue.shapes())
            .collect();

        for shape in self.shapes() {
            let bbox = shape.bounding_box();
            let paint = match shape.kind() {
                NodeKind::RawData { .. } | NodeKind::TypedData { .. } => Paint::InputNode,
                NodeKind::Step { .. } => Paint::StepNode,
                NodeKind::Output { .. } => Paint::OutputNode,
            };
            surface.fill_rect(bbox, paint);
            if flagged.contains(&shape.id()) {
                surface.stroke_rect(bbox.inflate(2.0), Paint::Error);
            }
            if self.selection.contains(&shape.id()) {
                surface.stroke_rect(bbox.inflate(4.0), Paint::Selected);
            }
            surface.text(shape.position, shape.name(), Paint::Label);
            if let Some(n) = badges.get(&shape.id()) {
                let corner = Point::new(bbox.min.x, bbox.min.y - 4.0);
                surface.text(corner, &n.to_string(), Paint::Label);
            }
            for (_, magnet) in shape.all_magnets() {
                let paint = if magnet.is_connected() {
                    Paint::MagnetConnected
                } else {
                    Paint::Magnet
                };
                surface.fill_circle(
                    magnet.center(shape.position),
                    self.config.magnet_radius,
                    paint,
                );
            }
        }

        for connector in self.connectors() {
            if let (Some(from), Some(to)) = (
                self.magnet_center(connector.source),
                self.magnet_center(connector.dest),
            ) {
                let paint = if connector.type_mismatch {
                    Paint::Error
                } else {
                    Paint::Cable
                };
                surface.line(from, to, paint);
            }
        }

        match &self.mode {
            super::InteractionMode::DraggingConnector { from, cursor } => {
                if let Some(start) = self.magnet_center(*from) {
                    // Cables always run output to input, whichever end was grabbed.
                    let (a, b) = match from.direction {
                        Direction::Output => (start, *cursor),
                        Direction::Input => (*cursor, start),
                    };
                    surface.line(a, b, Paint::PendingCable);
                }
            }
            mode => {
                if let Some(band) = mode.selection_box() {
                    surface.stroke_rect(band, Paint::SelectionBox);
                }
            }
        }

        self.valid = true;
        true
    }
}
