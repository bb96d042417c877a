//! Connected-cluster detection.
//!
//! A cluster is a maximal 4-neighbour-connected set of equal symbols of
//! size >= MIN_MATCH. Scatters never join clusters and are counted
//! separately.

use crate::grid::Cell;
use crate::grid::Grid;
use crate::symbol::Symbol;
use serde::Deserialize;
use serde::Serialize;
use sf_core::COLS;
use sf_core::MIN_MATCH;
use sf_core::ROWS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub symbol: Symbol,
    /// Member cells in column-major order.
    pub cells: Vec<Cell>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

/// All paying clusters on the grid, ordered by their first cell in
/// column-major order. Deterministic for a given grid.
pub fn clusters(grid: &Grid) -> Vec<Cluster> {
    let mut seen = [[false; ROWS]; COLS];
    let mut found = Vec::new();
    for origin in Grid::cells() {
        if seen[origin.col][origin.row] {
            continue;
        }
        let symbol = grid.get(origin);
        if symbol.is_scatter() {
            seen[origin.col][origin.row] = true;
            continue;
        }
        let mut members = Vec::new();
        let mut frontier = vec![origin];
        seen[origin.col][origin.row] = true;
        while let Some(cell) = frontier.pop() {
            members.push(cell);
            for next in neighbours(cell) {
                if !seen[next.col][next.row] && grid.get(next) == symbol {
                    seen[next.col][next.row] = true;
                    frontier.push(next);
                }
            }
        }
        if members.len() >= MIN_MATCH {
            members.sort_by_key(|c| (c.col, c.row));
            found.push(Cluster {
                symbol,
                cells: members,
            });
        }
    }
    found
}

/// Scatter positions in column-major order.
pub fn scatters(grid: &Grid) -> Vec<Cell> {
    Grid::cells()
        .filter(|cell| grid.get(*cell).is_scatter())
        .collect()
}

fn neighbours(cell: Cell) -> impl Iterator<Item = Cell> {
    let mut out = Vec::with_capacity(4);
    if cell.col > 0 {
        out.push(Cell::new(cell.col - 1, cell.row));
    }
    if cell.col + 1 < COLS {
        out.push(Cell::new(cell.col + 1, cell.row));
    }
    if cell.row > 0 {
        out.push(Cell::new(cell.col, cell.row - 1));
    }
    if cell.row + 1 < ROWS {
        out.push(Cell::new(cell.col, cell.row + 1));
    }
    out.into_iter()
}
