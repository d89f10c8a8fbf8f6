use std::fmt;

use crate::smartfilm::crm::error::{CrmError, Result};
use crate::smartfilm::crm::schema::SHEET_WIDTH;

/// A single cell address: 1-based row, zero-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub column: u16,
}

impl CellRef {
    pub fn new(row: u32, column: u16) -> Self {
        Self { row, column }
    }

    /// Top-left cell of the worksheet.
    pub fn origin() -> Self {
        Self::new(1, 0)
    }

    /// Column letters in A1 notation (`A`, `J`, `AA`, ...).
    pub fn column_letters(&self) -> String {
        let mut letters = Vec::new();
        let mut index = u32::from(self.column) + 1;
        while index > 0 {
            let remainder = (index - 1) % 26;
            letters.push(char::from(b'A' + remainder as u8));
            index = (index - 1) / 26;
        }
        letters.iter().rev().collect()
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_letters(), self.row)
    }
}

/// Range-based access to the lead worksheet.
pub trait SheetStore {
    /// Returns every row of the lead range (`A:M`), header included. Rows are
    /// padded or truncated to the range width.
    fn read_rows(&self) -> Result<Vec<Vec<String>>>;

    /// Overwrites a block of cells whose top-left corner is `start`.
    fn update(&mut self, start: CellRef, values: Vec<Vec<String>>) -> Result<()>;

    /// Appends rows below the last used row.
    fn append(&mut self, rows: Vec<Vec<String>>) -> Result<()>;
}

/// Pads or truncates a row to the width of the lead range.
pub fn fit_to_range(mut row: Vec<String>) -> Vec<String> {
    row.resize(SHEET_WIDTH, String::new());
    row
}

/// Writes `values` into a dense grid, growing it as needed.
pub(crate) fn write_block(
    grid: &mut Vec<Vec<String>>,
    start: CellRef,
    values: Vec<Vec<String>>,
) -> Result<()> {
    if start.row == 0 {
        return Err(CrmError::InvalidWorkbook("row numbers start at 1".into()));
    }
    let first_row = (start.row - 1) as usize;
    let first_column = usize::from(start.column);
    for (offset, values_row) in values.into_iter().enumerate() {
        let row_index = first_row + offset;
        if grid.len() <= row_index {
            grid.resize_with(row_index + 1, Vec::new);
        }
        let row = &mut grid[row_index];
        let needed = first_column + values_row.len();
        if row.len() < needed {
            row.resize(needed, String::new());
        }
        for (column_offset, value) in values_row.into_iter().enumerate() {
            row[first_column + column_offset] = value;
        }
    }
    Ok(())
}

/// Index just past the last row that holds any text.
pub(crate) fn used_rows(grid: &[Vec<String>]) -> usize {
    grid.iter()
        .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|index| index + 1)
        .unwrap_or(0)
}

/// In-memory worksheet. Counts the write calls it receives.
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    grid: Vec<Vec<String>>,
    writes: usize,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing rows, header included.
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            grid: rows,
            writes: 0,
        }
    }

    /// Number of `update`/`append` calls applied so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn cell(&self, cell: CellRef) -> Option<&str> {
        let row = self.grid.get(cell.row.checked_sub(1)? as usize)?;
        row.get(usize::from(cell.column)).map(String::as_str)
    }
}

impl SheetStore for MemorySheet {
    fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.grid[..used_rows(&self.grid)]
            .iter()
            .cloned()
            .map(fit_to_range)
            .collect())
    }

    fn update(&mut self, start: CellRef, values: Vec<Vec<String>>) -> Result<()> {
        write_block(&mut self.grid, start, values)?;
        self.writes += 1;
        Ok(())
    }

    fn append(&mut self, rows: Vec<Vec<String>>) -> Result<()> {
        let next_row = used_rows(&self.grid) as u32 + 1;
        write_block(&mut self.grid, CellRef::new(next_row, 0), rows)?;
        self.writes += 1;
        Ok(())
    }
}
