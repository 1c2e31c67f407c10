//! Cell grid, footprints and occupancy tracking

use crate::id::InstanceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell position, column `x` and row `y`, origin top-left.
///
/// Signed so that hover positions left of or above a grid can be expressed;
/// those are simply out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoordinate {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl GridCoordinate {
    /// Top-left cell
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a new coordinate
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by a column/row delta
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridCoordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Footprint angle in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Next angle clockwise, wrapping at 360
    pub fn next(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    /// Angle in degrees
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Whether width and height are swapped at this angle
    pub fn is_transposed(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Size of an item in whole cells, with its default and rotated extents.
///
/// At 0 and 180 degrees the current size equals the default size; at 90 and
/// 270 degrees width and height are swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    default_width: u32,
    default_height: u32,
    width: u32,
    height: u32,
    angle: Rotation,
}

impl Footprint {
    /// Create an unrotated footprint. Dimensions are clamped to at least one cell.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            default_width: width,
            default_height: height,
            width,
            height,
            angle: Rotation::Deg0,
        }
    }

    /// Single cell
    pub fn unit() -> Self {
        Self::new(1, 1)
    }

    /// Current width in cells
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Current height in cells
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width before rotation
    #[inline]
    pub fn default_width(&self) -> u32 {
        self.default_width
    }

    /// Height before rotation
    #[inline]
    pub fn default_height(&self) -> u32 {
        self.default_height
    }

    /// Current angle
    #[inline]
    pub fn angle(&self) -> Rotation {
        self.angle
    }

    /// Number of covered cells
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Rotate by 90 degrees
    pub fn rotate(&mut self) {
        self.angle = self.angle.next();
        std::mem::swap(&mut self.width, &mut self.height);
    }

    /// Copy rotated by 90 degrees
    pub fn rotated(mut self) -> Self {
        self.rotate();
        self
    }

    /// Set a specific angle
    pub fn with_angle(mut self, angle: Rotation) -> Self {
        self.angle = angle;
        if angle.is_transposed() {
            self.width = self.default_height;
            self.height = self.default_width;
        } else {
            self.width = self.default_width;
            self.height = self.default_height;
        }
        self
    }

    /// Back to 0 degrees
    pub fn reset(&mut self) {
        *self = self.with_angle(Rotation::Deg0);
    }

    /// Whether the current size is the default size turned to the current angle
    pub fn is_consistent(&self) -> bool {
        self.default_width >= 1 && self.default_height >= 1 && *self == self.with_angle(self.angle)
    }

    /// Whether rotating changes the covered shape
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Cells covered when the top-left corner sits at `top_left`, row-major
    pub fn cells(&self, top_left: GridCoordinate) -> impl Iterator<Item = GridCoordinate> {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |dy| (0..w).map(move |dx| top_left.offset(dx, dy)))
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::unit()
    }
}

/// Largest grid side length. Larger configured dimensions are clamped.
pub const MAX_GRID_DIMENSION: u32 = 4096;

/// Occupancy map of one container: which instance covers each cell.
///
/// `place` and `remove` trust the caller; validate with [`is_area_free`]
/// first.
///
/// [`is_area_free`]: GridModel::is_area_free
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    columns: u32,
    rows: u32,
    cells: Vec<Option<InstanceId>>,
}

impl GridModel {
    /// Create an empty grid. Each dimension is clamped to
    /// `1..=MAX_GRID_DIMENSION`.
    pub fn new(columns: u32, rows: u32) -> Self {
        let columns = columns.clamp(1, MAX_GRID_DIMENSION);
        let rows = rows.clamp(1, MAX_GRID_DIMENSION);
        Self {
            columns,
            rows,
            cells: vec![None; columns as usize * rows as usize],
        }
    }

    /// Number of columns
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Total cells
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn index(&self, cell: GridCoordinate) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let (x, y) = (cell.x as u32, cell.y as u32);
        if x >= self.columns || y >= self.rows {
            return None;
        }
        Some(y as usize * self.columns as usize + x as usize)
    }

    /// Whether the cell lies inside the grid
    pub fn contains(&self, cell: GridCoordinate) -> bool {
        self.index(cell).is_some()
    }

    /// Whether every cell of the footprint at `top_left` lies inside the grid
    pub fn contains_area(&self, top_left: GridCoordinate, footprint: &Footprint) -> bool {
        if top_left.x < 0 || top_left.y < 0 {
            return false;
        }
        let right = top_left.x as i64 + footprint.width() as i64;
        let bottom = top_left.y as i64 + footprint.height() as i64;
        right <= self.columns as i64 && bottom <= self.rows as i64
    }

    /// Occupant of a single cell
    pub fn at(&self, cell: GridCoordinate) -> Option<InstanceId> {
        self.index(cell).and_then(|i| self.cells[i])
    }

    /// True iff every covered cell is in bounds and unoccupied
    pub fn is_area_free(&self, top_left: GridCoordinate, footprint: &Footprint) -> bool {
        self.contains_area(top_left, footprint)
            && footprint.cells(top_left).all(|cell| self.at(cell).is_none())
    }

    /// Like [`is_area_free`](Self::is_area_free) but treats cells held by `ignore` as free
    pub fn is_area_free_ignoring(
        &self,
        top_left: GridCoordinate,
        footprint: &Footprint,
        ignore: InstanceId,
    ) -> bool {
        self.contains_area(top_left, footprint)
            && footprint
                .cells(top_left)
                .all(|cell| self.at(cell).map_or(true, |held| held == ignore))
    }

    /// First distinct instance found overlapping the area, row-major
    pub fn occupant(&self, top_left: GridCoordinate, footprint: &Footprint) -> Option<InstanceId> {
        footprint.cells(top_left).find_map(|cell| self.at(cell))
    }

    /// All distinct instances overlapping the area in first-seen order,
    /// skipping `ignore`
    pub fn occupants(
        &self,
        top_left: GridCoordinate,
        footprint: &Footprint,
        ignore: Option<InstanceId>,
    ) -> Vec<InstanceId> {
        let mut found = Vec::new();
        for id in footprint.cells(top_left).filter_map(|cell| self.at(cell)) {
            if Some(id) != ignore && !found.contains(&id) {
                found.push(id);
            }
        }
        found
    }

    /// Mark the area as held by `id`
    pub fn place(&mut self, id: InstanceId, top_left: GridCoordinate, footprint: &Footprint) {
        debug_assert!(
            self.contains_area(top_left, footprint),
            "placement of {id} at {top_left} leaves the grid"
        );
        for cell in footprint.cells(top_left) {
            if let Some(i) = self.index(cell) {
                debug_assert!(
                    self.cells[i].is_none() || self.cells[i] == Some(id),
                    "cell {cell} already held by {:?}",
                    self.cells[i]
                );
                self.cells[i] = Some(id);
            }
        }
    }

    /// Release every cell held by `id`. Returns the number of cells freed.
    pub fn remove(&mut self, id: InstanceId) -> usize {
        let mut freed = 0;
        for cell in self.cells.iter_mut().filter(|c| **c == Some(id)) {
            *cell = None;
            freed += 1;
        }
        freed
    }

    /// Cells held by `id`, row-major
    pub fn cells_of(&self, id: InstanceId) -> Vec<GridCoordinate> {
        let columns = self.columns as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Some(id))
            .map(|(i, _)| GridCoordinate::new((i % columns) as i32, (i / columns) as i32))
            .collect()
    }

    /// First top-left cell where the footprint fits, scanning rows then columns
    pub fn find_first_fit(&self, footprint: &Footprint) -> Option<GridCoordinate> {
        if footprint.width() > self.columns || footprint.height() > self.rows {
            return None;
        }
        let last_row = (self.rows - footprint.height()) as i32;
        let last_column = (self.columns - footprint.width()) as i32;
        (0..=last_row)
            .flat_map(|y| (0..=last_column).map(move |x| GridCoordinate::new(x, y)))
            .find(|&top_left| self.is_area_free(top_left, footprint))
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Number of free cells
    pub fn free_count(&self) -> usize {
        self.capacity() - self.occupied_count()
    }

    /// Whether no cell is occupied
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    /// Release every cell
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> InstanceId {
        InstanceId::from_raw(raw)
    }

    #[test]
    fn test_oversized_grid_is_clamped() {
        let grid = GridModel::new(u32::MAX, 3);
        assert_eq!(grid.columns(), MAX_GRID_DIMENSION);
        assert_eq!(grid.capacity(), MAX_GRID_DIMENSION as usize * 3);

        let corner = GridCoordinate::new(MAX_GRID_DIMENSION as i32 - 1, 2);
        assert!(grid.contains(corner));
        assert!(!grid.contains(corner.offset(1, 0)));

        let empty = GridModel::new(0, 0);
        assert_eq!((empty.columns(), empty.rows()), (1, 1));
    }

    #[test]
    fn test_rotation_cycle_returns_to_default() {
        let mut fp = Footprint::new(2, 1);
        let original = fp;

        fp.rotate();
        assert_eq!((fp.width(), fp.height()), (1, 2));
        assert_eq!(fp.angle(), Rotation::Deg90);

        fp.rotate();
        assert_eq!((fp.width(), fp.height()), (2, 1));
        assert_eq!(fp.angle().degrees(), 180);

        fp.rotate();
        fp.rotate();
        assert_eq!(fp, original);
        assert_eq!(fp.angle(), Rotation::Deg0);
    }

    #[test]
    fn test_consistency_of_decoded_footprints() {
        let turned = Footprint::new(3, 1).rotated();
        assert!(turned.is_consistent());

        let json = serde_json::to_string(&turned).unwrap();
        let tampered: Footprint = serde_json::from_str(&json.replace("\"width\":1", "\"width\":2")).unwrap();
        assert_eq!(tampered.width(), 2);
        assert!(!tampered.is_consistent());

        let zero: Footprint = serde_json::from_str(
            r#"{"default_width":0,"default_height":1,"width":0,"height":1,"angle":"Deg0"}"#,
        )
        .unwrap();
        assert!(!zero.is_consistent());
    }

    #[test]
    fn test_rotation_preserves_area() {
        let mut fp = Footprint::new(3, 2);
        for _ in 0..8 {
            fp.rotate();
            assert_eq!(fp.area(), 6);
            assert_eq!(fp.default_width() * fp.default_height(), 6);
        }
    }

    #[test]
    fn test_with_angle_matches_rotation() {
        let fp = Footprint::new(2, 3);
        assert_eq!(fp.with_angle(Rotation::Deg270), fp.rotated().rotated().rotated());
        assert_eq!(fp.rotated().with_angle(Rotation::Deg0), fp);
    }

    #[test]
    fn test_area_free_and_bounds() {
        let mut grid = GridModel::new(4, 4);
        let fp = Footprint::new(2, 1);

        assert!(grid.is_area_free(GridCoordinate::new(0, 0), &fp));
        assert!(!grid.is_area_free(GridCoordinate::new(3, 0), &fp));
        assert!(!grid.is_area_free(GridCoordinate::new(-1, 0), &fp));

        grid.place(id(1), GridCoordinate::new(0, 0), &fp);
        assert_eq!(grid.at(GridCoordinate::new(0, 0)), Some(id(1)));
        assert_eq!(grid.at(GridCoordinate::new(1, 0)), Some(id(1)));
        assert!(!grid.is_area_free(GridCoordinate::new(1, 0), &Footprint::unit()));
        assert!(grid.is_area_free_ignoring(GridCoordinate::new(1, 0), &fp, id(1)));
    }

    #[test]
    fn test_occupants_distinct_in_scan_order() {
        let mut grid = GridModel::new(4, 4);
        grid.place(id(7), GridCoordinate::new(1, 0), &Footprint::new(1, 2));
        grid.place(id(3), GridCoordinate::new(0, 1), &Footprint::unit());

        let area = Footprint::new(2, 2);
        assert_eq!(grid.occupant(GridCoordinate::ORIGIN, &area), Some(id(7)));
        assert_eq!(grid.occupants(GridCoordinate::ORIGIN, &area, None), vec![id(7), id(3)]);
        assert_eq!(grid.occupants(GridCoordinate::ORIGIN, &area, Some(id(7))), vec![id(3)]);
    }

    #[test]
    fn test_find_first_fit_is_row_major() {
        let mut grid = GridModel::new(3, 3);
        grid.place(id(1), GridCoordinate::new(0, 0), &Footprint::unit());

        assert_eq!(
            grid.find_first_fit(&Footprint::new(2, 1)),
            Some(GridCoordinate::new(1, 0))
        );
        assert_eq!(
            grid.find_first_fit(&Footprint::new(1, 3)),
            Some(GridCoordinate::new(1, 0))
        );
        assert_eq!(grid.find_first_fit(&Footprint::new(3, 3)), None);
        assert_eq!(grid.find_first_fit(&Footprint::new(4, 1)), None);
    }

    #[test]
    fn test_remove_restores_map() {
        let mut grid = GridModel::new(5, 2);
        let before = grid.clone();

        grid.place(id(9), GridCoordinate::new(2, 0), &Footprint::new(2, 2));
        assert_eq!(grid.occupied_count(), 4);
        assert_eq!(grid.cells_of(id(9)).len(), 4);

        assert_eq!(grid.remove(id(9)), 4);
        assert_eq!(grid, before);
        assert!(grid.is_empty());
    }
}
