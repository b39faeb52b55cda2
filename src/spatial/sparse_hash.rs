//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;

use crate::core::types::{EntityId, Vec2};
use crate::spatial::Metric;

/// Sparse hash grid for radius queries
///
/// Cells store `(id, position)` pairs so a query never has to go back to the
/// entity store. On toroidal maps cell coordinates wrap, so a query near an
/// edge also scans the cells on the opposite side.
#[derive(Debug, Clone)]
pub struct SparseHashGrid {
    cell_w: f32,
    cell_h: f32,
    cells: AHashMap<(i32, i32), Vec<(EntityId, Vec2)>>,
    /// Cell count per axis when wrapping, `None` on bounded maps
    wrap_cells: Option<(i32, i32)>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32, metric: &Metric) -> Self {
        if !metric.toroidal {
            return Self {
                cell_w: cell_size,
                cell_h: cell_size,
                cells: AHashMap::new(),
                wrap_cells: None,
            };
        }

        // Wrapped grids need cells that tile the map exactly, otherwise the
        // last partial column would not line up with the first one.
        let cols = (metric.width / cell_size).ceil().max(1.0);
        let rows = (metric.height / cell_size).ceil().max(1.0);
        Self {
            cell_w: metric.width / cols,
            cell_h: metric.height / rows,
            cells: AHashMap::new(),
            wrap_cells: Some((cols as i32, rows as i32)),
        }
    }

    #[inline]
    fn raw_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_w).floor() as i32,
            (pos.y / self.cell_h).floor() as i32,
        )
    }

    #[inline]
    fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        self.wrap_coord(self.raw_coord(pos))
    }

    #[inline]
    fn wrap_coord(&self, (cx, cy): (i32, i32)) -> (i32, i32) {
        match self.wrap_cells {
            Some((w, h)) => (cx.rem_euclid(w), cy.rem_euclid(h)),
            None => (cx, cy),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, entity: EntityId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((entity, pos));
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }

    /// Entities within `radius` of `center` (inclusive), unordered
    pub fn query_radius(&self, center: Vec2, radius: f32, metric: &Metric) -> Vec<EntityId> {
        if radius < 0.0 || !radius.is_finite() {
            return Vec::new();
        }

        let (cx, cy) = self.raw_coord(center);
        let xs = self.axis_range(cx, (radius / self.cell_w).ceil() as i64, metric.width / self.cell_w, 0);
        let ys = self.axis_range(cy, (radius / self.cell_h).ceil() as i64, metric.height / self.cell_h, 1);

        let mut found = Vec::new();
        for x in xs.clone() {
            for y in ys.clone() {
                if let Some(cell) = self.cells.get(&self.wrap_coord((x, y))) {
                    found.extend(
                        cell.iter()
                            .filter(|(_, pos)| metric.distance(center, *pos) <= radius)
                            .map(|(id, _)| *id),
                    );
                }
            }
        }
        found
    }

    /// Cell range to scan along one axis.
    ///
    /// On wrapped maps a span that would lap the grid collapses to one full
    /// pass so no cell is visited twice; on bounded maps the span is clipped
    /// to the cells the map covers, which also serves query points that lie
    /// outside the map.
    fn axis_range(&self, center: i32, span: i64, extent_cells: f32, axis: usize) -> std::ops::RangeInclusive<i32> {
        let extent = extent_cells.ceil().max(1.0) as i64;
        match self.wrap_cells {
            Some(cells) => {
                let count = if axis == 0 { cells.0 } else { cells.1 };
                if 2 * span + 1 >= count as i64 {
                    0..=count - 1
                } else {
                    let span = span as i32;
                    center - span..=center + span
                }
            }
            None => {
                let lo = (center as i64 - span).max(0);
                let hi = (center as i64 + span).min(extent);
                lo as i32..=hi as i32
            }
        }
    }
}
