//! 3x3 marker grid around a centre placement

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::MarkerPlacement;

/// Row/column position in the cemetery diagram
///
/// Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: i32,
    pub column: i32,
}

impl GridPosition {
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Shifted position, clamped at the i32 limits
    pub fn offset(&self, rows: i32, columns: i32) -> Self {
        Self::new(
            self.row.saturating_add(rows),
            self.column.saturating_add(columns),
        )
    }

    /// Where this position sits relative to `other` ("Top Left", "Right", "Center", ...)
    pub fn relation_to(&self, other: &GridPosition) -> String {
        let vertical = match self.row.cmp(&other.row) {
            std::cmp::Ordering::Less => Some("Top"),
            std::cmp::Ordering::Greater => Some("Bottom"),
            std::cmp::Ordering::Equal => None,
        };
        let horizontal = match self.column.cmp(&other.column) {
            std::cmp::Ordering::Less => Some("Left"),
            std::cmp::Ordering::Greater => Some("Right"),
            std::cmp::Ordering::Equal => None,
        };

        match (vertical, horizontal) {
            (Some(v), Some(h)) => format!("{} {}", v, h),
            (Some(v), None) => v.to_string(),
            (None, Some(h)) => h.to_string(),
            (None, None) => "Center".to_string(),
        }
    }

    /// True when `other` is within one row and one column
    pub fn is_adjacent_or_same(&self, other: &GridPosition) -> bool {
        let rows = i64::from(self.row) - i64::from(other.row);
        let columns = i64::from(self.column) - i64::from(other.column);
        rows.abs() <= 1 && columns.abs() <= 1
    }
}

/// The nine cells centred on one marker
#[derive(Debug, Clone)]
pub struct MarkerGrid {
    center: GridPosition,
    markers: BTreeMap<GridPosition, MarkerPlacement>,
}

impl MarkerGrid {
    /// Keep the placements that fall inside the 3x3 window around `center`
    pub fn around(center: GridPosition, placements: &[MarkerPlacement]) -> Self {
        let markers = placements
            .iter()
            .filter(|p| center.is_adjacent_or_same(&p.position()))
            .map(|p| (p.position(), p.clone()))
            .collect();

        Self { center, markers }
    }

    pub fn center(&self) -> GridPosition {
        self.center
    }

    /// All nine positions, row-major
    pub fn all_positions(&self) -> Vec<GridPosition> {
        (-1..=1)
            .flat_map(|row| (-1..=1).map(move |col| (row, col)))
            .map(|(row, col)| self.center.offset(row, col))
            .collect()
    }

    /// Marker at a relative offset, each in -1..=1
    pub fn marker_at(&self, relative_row: i32, relative_col: i32) -> Option<&MarkerPlacement> {
        self.markers
            .get(&self.center.offset(relative_row, relative_col))
    }

    pub fn marker(&self, position: &GridPosition) -> Option<&MarkerPlacement> {
        self.markers.get(position)
    }

    /// Nine cells in row-major order with their occupant, if any
    pub fn cells(&self) -> Vec<(GridPosition, Option<&MarkerPlacement>)> {
        self.all_positions()
            .into_iter()
            .map(|pos| (pos, self.markers.get(&pos)))
            .collect()
    }

    pub fn occupied(&self) -> usize {
        self.markers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placements(size: i32) -> Vec<MarkerPlacement> {
        (0..size)
            .flat_map(|y| (0..size).map(move |x| MarkerPlacement::new(x, y, format!("{}-{}", y, x))))
            .collect()
    }

    #[test]
    fn test_relation_to() {
        let center = GridPosition::new(2, 2);
        assert_eq!(GridPosition::new(1, 1).relation_to(&center), "Top Left");
        assert_eq!(GridPosition::new(1, 2).relation_to(&center), "Top");
        assert_eq!(GridPosition::new(3, 3).relation_to(&center), "Bottom Right");
        assert_eq!(GridPosition::new(2, 1).relation_to(&center), "Left");
        assert_eq!(GridPosition::new(2, 2).relation_to(&center), "Center");
    }

    #[test]
    fn test_all_positions_row_major() {
        let grid = MarkerGrid::around(GridPosition::new(2, 2), &[]);
        let positions = grid.all_positions();
        assert_eq!(positions.len(), 9);
        assert_eq!(positions[0], GridPosition::new(1, 1));
        assert_eq!(positions[4], GridPosition::new(2, 2));
        assert_eq!(positions[8], GridPosition::new(3, 3));
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_around_keeps_neighbours_only() {
        // 5x5 field, centre at (2, 2)
        let grid = MarkerGrid::around(GridPosition::new(2, 2), &placements(5));
        assert_eq!(grid.occupied(), 9);
        assert_eq!(grid.marker_at(0, 0).unwrap().inscription, "2-2");
        assert_eq!(grid.marker_at(-1, 1).unwrap().inscription, "1-3");
        assert!(grid.marker(&GridPosition::new(0, 0)).is_none());
    }

    #[test]
    fn test_cells_at_edge_have_gaps() {
        let grid = MarkerGrid::around(GridPosition::new(0, 0), &placements(3));
        let cells = grid.cells();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells.iter().filter(|(_, m)| m.is_some()).count(), 4);
        assert!(cells[0].1.is_none());
        assert_eq!(cells[4].1.unwrap().inscription, "0-0");
    }

    #[test]
    fn test_window_at_i32_limits() {
        assert!(!GridPosition::new(i32::MIN, 0).is_adjacent_or_same(&GridPosition::new(i32::MAX, 0)));
        assert!(GridPosition::new(i32::MAX, i32::MIN).is_adjacent_or_same(&GridPosition::new(i32::MAX - 1, i32::MIN + 1)));

        let corner = GridPosition::new(i32::MAX, i32::MAX);
        let placements = vec![
            MarkerPlacement::new(i32::MAX, i32::MAX, "corner"),
            MarkerPlacement::new(i32::MAX - 1, i32::MAX - 1, "inside"),
            MarkerPlacement::new(i32::MIN, i32::MIN, "far"),
        ];
        let grid = MarkerGrid::around(corner, &placements);
        assert_eq!(grid.occupied(), 2);
        assert_eq!(grid.marker_at(0, 0).unwrap().inscription, "corner");
        assert_eq!(grid.marker_at(-1, -1).unwrap().inscription, "inside");
        assert_eq!(grid.all_positions().len(), 9);
        assert_eq!(grid.all_positions()[8], corner);
    }
}
