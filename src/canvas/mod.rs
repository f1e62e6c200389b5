use crate::error::{CanvasError, ConnectRejection};
use crate::geometry::{Point, Rect};
use crate::model::{
    Connector, ConnectorId, Direction, Magnet, MagnetRef, NodeKind, Shape, ShapeId,
};
use log::{debug, warn};
use slotmap::SlotMap;

mod builder;
mod collision;
mod interaction;
mod order;
pub mod render;
mod validation;

pub use builder::{CanvasBuilder, CanvasConfig, CollisionPolicy, MAX_NUDGE_RINGS};
pub use interaction::{GestureOutcome, InteractionMode, Key, Modifiers, Propagation};
pub use order::StepCycle;

/// The aggregate root of one diagram.
///
/// Shapes live in a slot map with a separate z-order list. Insertion order
/// doubles as z-order: later shapes are drawn on top and win hit-tests.
/// Connectors live in an arena indexed by [`ConnectorId`]; magnets only store
/// those ids. Every connector always joins two live magnets of live shapes.
#[derive(Debug, Clone)]
pub struct CanvasState {
    config: CanvasConfig,
    scale: f64,
    shapes: SlotMap<ShapeId, Shape>,
    /// Bottom-most first.
    order: Vec<ShapeId>,
    connectors: SlotMap<ConnectorId, Connector>,
    selection: Vec<ShapeId>,
    mode: InteractionMode,
    valid: bool,
    updating: bool,
}

impl CanvasState {
    pub fn builder(width: f64, height: f64) -> CanvasBuilder {
        CanvasBuilder::new(width, height)
    }

    pub(crate) fn from_config(config: CanvasConfig) -> Self {
        Self {
            config,
            scale: 1.0,
            shapes: SlotMap::with_key(),
            order: Vec::new(),
            connectors: SlotMap::with_key(),
            selection: Vec::new(),
            mode: InteractionMode::Idle,
            valid: false,
            updating: false,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        self.config.width
    }

    pub fn height(&self) -> f64 {
        self.config.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(Point::new(0.0, 0.0), Point::new(self.width(), self.height()))
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<(), CanvasError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CanvasError::InvalidConfig(format!(
                "scale must be positive, got {}",
                scale
            )));
        }
        self.scale = scale;
        self.valid = false;
        Ok(())
    }

    /// Converts a pointer position in element pixels into canvas coordinates.
    pub fn to_canvas(&self, screen: Point) -> Point {
        Point::new(screen.x / self.scale, screen.y / self.scale)
    }

    /// Changes the canvas size and moves every shape so it keeps its relative position.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), CanvasError> {
        let mut config = self.config.clone();
        config.width = width;
        config.height = height;
        config.validate()?;

        let (sx, sy) = (width / self.width(), height / self.height());
        for shape in self.shapes.values_mut() {
            shape.position = Point::new(shape.position.x * sx, shape.position.y * sy);
        }
        self.config = config;
        self.valid = false;
        Ok(())
    }

    /// `false` means the next animation tick must repaint.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// While updating, repaints are suppressed so a half-loaded diagram never shows.
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn set_updating(&mut self, updating: bool) {
        self.updating = updating;
        if !updating {
            self.valid = false;
        }
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    // --- Shapes ---

    /// Shapes in z-order, bottom-most first.
    pub fn shapes(&self) -> impl DoubleEndedIterator<Item = &Shape> + Clone + '_ {
        self.order.iter().filter_map(|id| self.shapes.get(*id))
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id)
    }

    /// Position of the shape in z-order (0 is bottom-most).
    pub fn z_index(&self, id: ShapeId) -> Option<usize> {
        self.order.iter().position(|s| *s == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Shape> {
        self.shapes().find(|s| s.name() == name)
    }

    /// Appends a shape on top of the z-order. No collision handling.
    pub fn add_shape(&mut self, kind: NodeKind, position: Point) -> ShapeId {
        debug!("Adding {} '{}' at {}", kind.kind_label(), kind.name(), position);
        let id = self
            .shapes
            .insert_with_key(|id| Shape::new(id, kind, position));
        self.order.push(id);
        self.valid = false;
        id
    }

    /// Click-to-place: adds the shape and applies the placement collision policy.
    pub fn place_shape(&mut self, kind: NodeKind, position: Point) -> ShapeId {
        let id = self.add_shape(kind, position);
        let policy = self.config.placement_collision;
        self.settle(id, position, policy);
        id
    }

    /// Removes a shape together with every connector touching it.
    pub fn remove_shape(&mut self, id: ShapeId) -> Result<Shape, CanvasError> {
        if !self.shapes.contains_key(id) {
            return Err(CanvasError::UnknownShape(id));
        }

        let touching: Vec<ConnectorId> = self
            .connectors
            .values()
            .filter(|c| c.touches(id))
            .map(|c| c.id)
            .collect();
        for connector in touching {
            self.detach_connector(connector);
        }

        self.selection.retain(|s| *s != id);
        self.order.retain(|s| *s != id);
        if self.mode.involves(id) {
            self.mode = InteractionMode::Idle;
        }
        self.valid = false;
        debug!("Removed shape {}", id);
        self.shapes.remove(id).ok_or(CanvasError::UnknownShape(id))
    }

    pub fn move_shape(&mut self, id: ShapeId, to: Point) -> Result<(), CanvasError> {
        let shape = self.shape_mut(id).ok_or(CanvasError::UnknownShape(id))?;
        shape.position = to;
        self.valid = false;
        Ok(())
    }

    /// Topmost shape whose body contains `p` (canvas coordinates).
    pub fn shape_at(&self, p: Point) -> Option<ShapeId> {
        self.shapes()
            .rev()
            .find(|s| s.contains(p))
            .map(|s| s.id())
    }

    /// Topmost magnet within reach of `p` (canvas coordinates).
    pub fn magnet_at(&self, p: Point) -> Option<MagnetRef> {
        let reach = self.config.magnet_radius + self.config.hit_tolerance;
        self.shapes().rev().find_map(|s| s.magnet_at(p, reach))
    }

    pub fn magnet(&self, r: MagnetRef) -> Option<&Magnet> {
        self.shape(r.shape)
            .and_then(|s| s.magnet(r.direction, r.index))
    }

    pub fn magnet_center(&self, r: MagnetRef) -> Option<Point> {
        self.shape(r.shape)
            .and_then(|s| s.magnet_center(r.direction, r.index))
    }

    // --- Connectors ---

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> + '_ {
        self.connectors.values()
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(id)
    }

    /// The single cable feeding an input magnet, if any.
    pub fn incoming(&self, dest: MagnetRef) -> Option<&Connector> {
        self.connectors.values().find(|c| c.dest == dest)
    }

    pub fn outgoing(&self, source: MagnetRef) -> impl Iterator<Item = &Connector> + '_ {
        self.connectors.values().filter(move |c| c.source == source)
    }

    /// Checks whether two magnets may be joined and orders them as (source, dest).
    pub fn check_connection(
        &self,
        a: MagnetRef,
        b: MagnetRef,
    ) -> Result<(MagnetRef, MagnetRef), ConnectRejection> {
        if self.magnet(a).is_none() {
            return Err(ConnectRejection::MissingMagnet(a));
        }
        if self.magnet(b).is_none() {
            return Err(ConnectRejection::MissingMagnet(b));
        }
        if a.direction == b.direction {
            return Err(ConnectRejection::SameDirection);
        }
        if a.shape == b.shape {
            return Err(ConnectRejection::SameShape);
        }

        let (source, dest) = match a.direction {
            Direction::Output => (a, b),
            Direction::Input => (b, a),
        };
        if self
            .connectors
            .values()
            .any(|c| c.source == source && c.dest == dest)
        {
            return Err(ConnectRejection::AlreadyConnected);
        }
        Ok((source, dest))
    }

    /// Joins two magnets, in either order.
    ///
    /// An input magnet takes only one cable, so an existing cable into the
    /// destination is replaced. A datatype mismatch still produces a cable,
    /// flagged with `type_mismatch`.
    pub fn connect(&mut self, a: MagnetRef, b: MagnetRef) -> Result<ConnectorId, ConnectRejection> {
        let (source, dest) = self.check_connection(a, b)?;

        if let Some(existing) = self.incoming(dest).map(|c| c.id) {
            debug!("Replacing cable {} into {:?}", existing, dest);
            self.detach_connector(existing);
        }

        let source_type = self
            .magnet(source)
            .map(|m| m.datatype)
            .ok_or(ConnectRejection::MissingMagnet(source))?;
        let dest_type = self
            .magnet(dest)
            .map(|m| m.datatype)
            .ok_or(ConnectRejection::MissingMagnet(dest))?;
        let type_mismatch = !source_type.is_compatible_with(&dest_type);
        if type_mismatch {
            warn!(
                "Cable from {} to {} joins {} to {}",
                source.shape, dest.shape, source_type, dest_type
            );
        }

        let id = self.connectors.insert_with_key(|id| Connector {
            id,
            source,
            dest,
            type_mismatch,
        });
        for end in [source, dest] {
            if let Some(magnet) = self
                .shape_mut(end.shape)
                .and_then(|s| s.magnet_mut(end.direction, end.index))
            {
                magnet.connected.push(id);
            }
        }
        self.valid = false;
        debug!("Connected {:?} -> {:?} as {}", source, dest, id);
        Ok(id)
    }

    pub fn remove_connector(&mut self, id: ConnectorId) -> Result<Connector, CanvasError> {
        self.detach_connector(id)
            .ok_or(CanvasError::UnknownConnector(id))
    }

    /// Removes every cable attached to the shape. Returns how many were removed.
    pub fn disconnect_shape(&mut self, id: ShapeId) -> Result<usize, CanvasError> {
        if self.shape(id).is_none() {
            return Err(CanvasError::UnknownShape(id));
        }
        let touching: Vec<ConnectorId> = self
            .connectors
            .values()
            .filter(|c| c.touches(id))
            .map(|c| c.id)
            .collect();
        let count = touching.len();
        for connector in touching {
            self.detach_connector(connector);
        }
        Ok(count)
    }

    fn detach_connector(&mut self, id: ConnectorId) -> Option<Connector> {
        let connector = self.connectors.remove(id)?;
        for end in [connector.source, connector.dest] {
            if let Some(magnet) = self
                .shape_mut(end.shape)
                .and_then(|s| s.magnet_mut(end.direction, end.index))
            {
                magnet.connected.retain(|c| *c != id);
            }
        }
        self.valid = false;
        Some(connector)
    }

    /// Checks the structural invariants: the z-order lists every shape once,
    /// every connector joins live magnets, and magnet back-references match
    /// the arena exactly.
    pub fn is_consistent(&self) -> bool {
        let order_ok = self.order.len() == self.shapes.len()
            && self.order.iter().all(|id| self.shapes.contains_key(*id));
        let arena_ok = self.connectors.values().all(|c| {
            let linked = |r: MagnetRef| {
                self.magnet(r)
                    .is_some_and(|m| m.connected.contains(&c.id))
            };
            c.source.direction == Direction::Output
                && c.dest.direction == Direction::Input
                && linked(c.source)
                && linked(c.dest)
        });
        let refs_ok = self.shapes.values().all(|s| {
            s.all_magnets().all(|(r, m)| {
                (r.direction == Direction::Output || m.connected.len() <= 1)
                    && m.connected.iter().all(|id| {
                        self.connector(*id)
                            .is_some_and(|c| c.source == r || c.dest == r)
                    })
            })
        });
        order_ok && arena_ok && refs_ok
    }

    // --- Selection ---

    pub fn selection(&self) -> &[ShapeId] {
        &self.selection
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.selection.contains(&id)
    }

    pub fn select(&mut self, id: ShapeId) -> Result<(), CanvasError> {
        if self.shape(id).is_none() {
            return Err(CanvasError::UnknownShape(id));
        }
        if !self.is_selected(id) {
            self.selection.push(id);
            self.valid = false;
        }
        Ok(())
    }

    pub fn toggle_selection(&mut self, id: ShapeId) -> Result<bool, CanvasError> {
        if self.is_selected(id) {
            self.selection.retain(|s| *s != id);
            self.valid = false;
            Ok(false)
        } else {
            self.select(id)?;
            Ok(true)
        }
    }

    pub fn select_all(&mut self) {
        self.selection = self.order.clone();
        self.valid = false;
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.valid = false;
        }
    }

    /// Deletes every selected shape. Returns how many were removed.
    pub fn delete_selection(&mut self) -> usize {
        let selected = std::mem::take(&mut self.selection);
        selected
            .into_iter()
            .filter(|id| self.remove_shape(*id).is_ok())
            .count()
    }

    /// Drops every shape and connector, keeping configuration. Ids handed out
    /// before stay invalid.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.order.clear();
        self.connectors.clear();
        self.selection.clear();
        self.mode = InteractionMode::Idle;
        self.valid = false;
    }
}
