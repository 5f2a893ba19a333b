//! Presence sets
//!
//! A presence set lists the `(timestep, path)` cells of the simulation grid
//! at which a transaction fires. Cells are unique and ordered by timestep,
//! then path, which is the order the accumulation loop walks the grid.
//!
//! Instantaneous discrete transactions are expanded across every path, so
//! consumers always see the same representation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single firing cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Timestep (row), in `[0, N)`
    pub timestep: usize,
    /// Simulation path (column), in `[0, M)`
    pub path: usize,
}

impl Cell {
    pub fn new(timestep: usize, path: usize) -> Self {
        Self { timestep, path }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((timestep, path): (usize, usize)) -> Self {
        Self { timestep, path }
    }
}

/// Ordered, duplicate-free set of firing cells
///
/// Only the presence generator builds these; consumers get read-only views.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct PresenceSet {
    cells: Vec<Cell>,
}

impl PresenceSet {
    /// Empty set: the transaction never fires
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from cells in any order; sorts and removes duplicates.
    pub(crate) fn from_unordered<I: IntoIterator<Item = Cell>>(cells: I) -> Self {
        let ordered: BTreeSet<Cell> = cells.into_iter().collect();
        Self {
            cells: ordered.into_iter().collect(),
        }
    }

    /// Build from cells already in (timestep, path) order without duplicates.
    pub(crate) fn from_sorted(cells: Vec<Cell>) -> Self {
        debug_assert!(cells.windows(2).all(|w| w[0] < w[1]), "cells must be strictly ordered");
        Self { cells }
    }

    /// Every listed timestep crossed with paths `0..width`.
    pub(crate) fn full_rows<I: IntoIterator<Item = usize>>(timesteps: I, width: usize) -> Self {
        let rows: BTreeSet<usize> = timesteps.into_iter().collect();
        let cells = rows
            .into_iter()
            .flat_map(|t| (0..width).map(move |j| Cell::new(t, j)))
            .collect();
        Self::from_sorted(cells)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether the cell at `(timestep, path)` fires
    pub fn contains(&self, timestep: usize, path: usize) -> bool {
        self.cells.binary_search(&Cell::new(timestep, path)).is_ok()
    }

    /// Distinct timesteps with at least one firing path, ascending
    pub fn timesteps(&self) -> Vec<usize> {
        let mut times: Vec<usize> = self.cells.iter().map(|c| c.timestep).collect();
        times.dedup();
        times
    }

    /// Paths that fire at `timestep`, ascending
    pub fn paths_at(&self, timestep: usize) -> Vec<usize> {
        let start = self.cells.partition_point(|c| c.timestep < timestep);
        self.cells[start..]
            .iter()
            .take_while(|c| c.timestep == timestep)
            .map(|c| c.path)
            .collect()
    }

    /// The single timestep when this set is one full row of `width` paths.
    ///
    /// This is the scalar view of an instantaneous discrete transaction.
    pub fn scalar_timestep(&self, width: usize) -> Option<usize> {
        let first = self.cells.first()?;
        let full_row = self.cells.len() == width
            && self
                .cells
                .iter()
                .enumerate()
                .all(|(j, c)| c.timestep == first.timestep && c.path == j);
        full_row.then_some(first.timestep)
    }
}

impl<'a> IntoIterator for &'a PresenceSet {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unordered_sorts_and_dedups() {
        let set = PresenceSet::from_unordered(vec![
            Cell::new(2, 1),
            Cell::new(0, 3),
            Cell::new(2, 0),
            Cell::new(0, 3),
        ]);
        assert_eq!(
            set.cells(),
            &[Cell::new(0, 3), Cell::new(2, 0), Cell::new(2, 1)]
        );
    }

    #[test]
    fn test_full_rows() {
        let set = PresenceSet::full_rows([4, 0, 2, 2], 2);
        assert_eq!(set.timesteps(), vec![0, 2, 4]);
        assert_eq!(set.len(), 6);
        assert_eq!(set.paths_at(2), vec![0, 1]);
    }

    #[test]
    fn test_paths_at_missing_row() {
        let set = PresenceSet::full_rows([1], 3);
        assert!(set.paths_at(0).is_empty());
        assert!(set.paths_at(5).is_empty());
    }

    #[test]
    fn test_scalar_timestep() {
        assert_eq!(PresenceSet::full_rows([3], 4).scalar_timestep(4), Some(3));
        assert_eq!(PresenceSet::full_rows([3, 4], 4).scalar_timestep(4), None);
        assert_eq!(PresenceSet::empty().scalar_timestep(4), None);

        let partial = PresenceSet::from_unordered(vec![Cell::new(3, 0), Cell::new(3, 2)]);
        assert_eq!(partial.scalar_timestep(3), None);
    }

    #[test]
    fn test_contains() {
        let set = PresenceSet::full_rows([1, 3], 2);
        assert!(set.contains(3, 1));
        assert!(!set.contains(2, 0));
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let set = PresenceSet::full_rows([1], 1);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"[{"timestep":1,"path":0}]"#);
    }
}
