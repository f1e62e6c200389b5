use super::{CanvasState, CollisionPolicy};
use crate::error::CanvasError;
use crate::geometry::{Point, Rect};
use crate::model::ShapeId;
use itertools::{Itertools, iproduct};
use log::{debug, warn};

impl CanvasState {
    /// Shapes whose bounding box overlaps the given shape's.
    pub fn collisions(&self, id: ShapeId) -> Result<Vec<ShapeId>, CanvasError> {
        let shape = self.shape(id).ok_or(CanvasError::UnknownShape(id))?;
        let bbox = shape.bounding_box();
        Ok(self.colliders(&bbox, &[id]))
    }

    /// Every overlapping pair, in z-order. Quadratic, which is fine at diagram scale.
    pub fn overlapping_pairs(&self) -> Vec<(ShapeId, ShapeId)> {
        self.shapes()
            .tuple_combinations()
            .filter(|(a, b)| a.bounding_box().intersects(&b.bounding_box()))
            .map(|(a, b)| (a.id(), b.id()))
            .collect()
    }

    fn colliders(&self, rect: &Rect, ignore: &[ShapeId]) -> Vec<ShapeId> {
        self.shapes()
            .filter(|s| !ignore.contains(&s.id()))
            .filter(|s| s.bounding_box().intersects(rect))
            .map(|s| s.id())
            .collect()
    }

    /// Moves the shape to the nearest slot where it overlaps nothing.
    ///
    /// Candidates lie on a square grid of `nudge_step` around the current
    /// position, tried nearest first. Slots leaving the canvas are skipped when
    /// the shape fits the canvas at all. If no slot within `nudge_max_rings`
    /// is free, the shape stays where it is.
    pub fn nudge_to_free_slot(&mut self, id: ShapeId) -> Result<Point, CanvasError> {
        let shape = self.shape(id).ok_or(CanvasError::UnknownShape(id))?;
        let origin = shape.position;
        if self.colliders(&shape.bounding_box(), &[id]).is_empty() {
            return Ok(origin);
        }

        let bounds = self.bounds();
        let (w, h) = shape.kind().size();
        let must_fit = w <= bounds.width() && h <= bounds.height();
        let step = self.config.nudge_step;
        let rings = self.config.nudge_max_rings as i64;

        let slot = iproduct!(-rings..=rings, -rings..=rings)
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .sorted_by_key(|&(dx, dy)| (dx * dx + dy * dy, dy, dx))
            .map(|(dx, dy)| origin + Point::new(dx as f64 * step, dy as f64 * step))
            .find(|candidate| {
                let rect = shape.bounding_box_at(*candidate);
                (!must_fit || bounds.contains_rect(&rect)) && self.colliders(&rect, &[id]).is_empty()
            });

        match slot {
            Some(position) => {
                debug!("Nudged {} from {} to {}", id, origin, position);
                self.move_shape(id, position)?;
                Ok(position)
            }
            None => {
                warn!("No free slot near {} for {}; leaving it overlapped", origin, id);
                Ok(origin)
            }
        }
    }

    /// Applies a collision policy to a shape that was just placed or dropped.
    /// `fallback` is where `Reject` sends it back to.
    pub(crate) fn settle(&mut self, id: ShapeId, fallback: Point, policy: CollisionPolicy) -> bool {
        match policy {
            CollisionPolicy::Allow => true,
            CollisionPolicy::Nudge => self.nudge_to_free_slot(id).is_ok(),
            CollisionPolicy::Reject => {
                let collides = self
                    .collisions(id)
                    .map(|c| !c.is_empty())
                    .unwrap_or(false);
                if collides {
                    debug!("Rejected placement of {}; reverting to {}", id, fallback);
                    let _ = self.move_shape(id, fallback);
                }
                !collides
            }
        }
    }
}
