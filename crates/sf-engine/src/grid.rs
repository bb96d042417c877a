use crate::symbol::Symbol;
use serde::Deserialize;
use serde::Serialize;
use sf_core::COLS;
use sf_core::Col;
use sf_core::ROWS;
use sf_core::Row;
use sha2::Digest;

/// A single grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: Col,
    pub row: Row,
}

impl Cell {
    pub fn new(col: Col, row: Row) -> Self {
        Self { col, row }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

/// The symbol grid, indexed `[col][row]` with row 0 at the top.
/// Columns are the gravity axis: symbols fall toward higher rows.
///
/// Serializes as nested ordered arrays of symbol names, which is also
/// the canonical form hashed for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid([[Symbol; ROWS]; COLS]);

impl Grid {
    pub fn new(columns: [[Symbol; ROWS]; COLS]) -> Self {
        Self(columns)
    }
    /// A grid with every cell set to the same symbol.
    pub fn filled(symbol: Symbol) -> Self {
        Self([[symbol; ROWS]; COLS])
    }
    pub fn get(&self, cell: Cell) -> Symbol {
        self.0[cell.col][cell.row]
    }
    pub fn set(&mut self, cell: Cell, symbol: Symbol) {
        self.0[cell.col][cell.row] = symbol;
    }
    pub fn column(&self, col: Col) -> &[Symbol; ROWS] {
        &self.0[col]
    }
    pub fn column_mut(&mut self, col: Col) -> &mut [Symbol; ROWS] {
        &mut self.0[col]
    }
    /// All cells in column-major order (the canonical iteration order).
    pub fn cells() -> impl Iterator<Item = Cell> {
        (0..COLS).flat_map(|col| (0..ROWS).map(move |row| Cell::new(col, row)))
    }
    /// Canonical serialization: nested ordered arrays, UTF-8 JSON.
    pub fn canonical(&self) -> String {
        serde_json::to_string(self).expect("grid serialization is infallible")
    }
    /// Hex-encoded SHA-256 over the canonical serialization.
    pub fn digest(&self) -> String {
        hex::encode(sha2::Sha256::digest(self.canonical().as_bytes()))
    }
}

impl std::ops::Index<Cell> for Grid {
    type Output = Symbol;
    fn index(&self, cell: Cell) -> &Symbol {
        &self.0[cell.col][cell.row]
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in 0..ROWS {
            for col in 0..COLS {
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:>13}", self.0[col][row].name())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A grid mid-cascade: cleared cells are `None` until gravity and
/// refill repopulate them. Serializes with `null` holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GapGrid([[Option<Symbol>; ROWS]; COLS]);

impl GapGrid {
    pub fn get(&self, cell: Cell) -> Option<Symbol> {
        self.0[cell.col][cell.row]
    }
    /// Number of cleared cells.
    pub fn holes(&self) -> usize {
        self.0
            .iter()
            .flat_map(|col| col.iter())
            .filter(|slot| slot.is_none())
            .count()
    }
}

impl From<Grid> for GapGrid {
    fn from(grid: Grid) -> Self {
        let mut gaps = [[None; ROWS]; COLS];
        for cell in Grid::cells() {
            gaps[cell.col][cell.row] = Some(grid.get(cell));
        }
        Self(gaps)
    }
}

impl GapGrid {
    pub fn clear(&mut self, cell: Cell) {
        self.0[cell.col][cell.row] = None;
    }
}
