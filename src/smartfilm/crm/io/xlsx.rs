use std::fs;
use std::path::PathBuf;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::smartfilm::crm::error::{CrmError, Result};
use crate::smartfilm::crm::io::sheet::{
    CellRef, SheetStore, fit_to_range, used_rows, write_block,
};
use crate::smartfilm::crm::io::staging_path;

/// Worksheet holding the lead range when no other name is configured.
pub const DEFAULT_SHEET_NAME: &str = "Leads";

/// Cell values of one worksheet, row-major, starting at `A1`.
#[derive(Debug, Clone, PartialEq)]
struct SheetGrid {
    name: String,
    rows: Vec<Vec<String>>,
}

/// Lead worksheet stored in an `.xlsx` workbook on disk.
///
/// Every write reloads the workbook, applies the change and rewrites the
/// file. Cell values of the other worksheets are carried over; formatting is
/// not. A missing file reads as an empty worksheet.
#[derive(Debug, Clone)]
pub struct XlsxSheet {
    path: PathBuf,
    sheet_name: String,
}

impl XlsxSheet {
    pub fn new(path: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet_name: sheet_name.into(),
        }
    }

    fn load(&self) -> Result<Vec<SheetGrid>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut workbook: Xlsx<_> = open_workbook(&self.path)?;
        let names = workbook.sheet_names().to_owned();
        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let rows = read_grid(&mut workbook, &name)?;
            sheets.push(SheetGrid { name, rows });
        }
        Ok(sheets)
    }

    fn save(&self, sheets: &[SheetGrid]) -> Result<()> {
        let mut workbook = Workbook::new();

        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for (row_idx, row) in sheet.rows.iter().enumerate() {
                for (col_idx, cell) in row.iter().enumerate() {
                    if cell.is_empty() {
                        continue;
                    }
                    worksheet.write_string(row_idx as u32, col_idx as u16, cell)?;
                }
            }
        }

        let staging = staging_path(&self.path);
        workbook.save(&staging)?;
        fs::rename(&staging, &self.path)?;
        debug!(path = %self.path.display(), sheet_count = sheets.len(), "workbook written");
        Ok(())
    }

    fn modify<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Vec<String>>) -> Result<()>,
    {
        let mut sheets = self.load()?;
        let index = match sheets.iter().position(|sheet| sheet.name == self.sheet_name) {
            Some(index) => index,
            None => {
                sheets.push(SheetGrid {
                    name: self.sheet_name.clone(),
                    rows: Vec::new(),
                });
                sheets.len() - 1
            }
        };
        change(&mut sheets[index].rows)?;
        self.save(&sheets)
    }
}

impl SheetStore for XlsxSheet {
    fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        let sheets = self.load()?;
        let Some(sheet) = sheets.into_iter().find(|sheet| sheet.name == self.sheet_name) else {
            return Ok(Vec::new());
        };
        let used = used_rows(&sheet.rows);
        Ok(sheet
            .rows
            .into_iter()
            .take(used)
            .map(fit_to_range)
            .collect())
    }

    fn update(&mut self, start: CellRef, values: Vec<Vec<String>>) -> Result<()> {
        self.modify(|rows| write_block(rows, start, values))
    }

    fn append(&mut self, new_rows: Vec<Vec<String>>) -> Result<()> {
        self.modify(|rows| {
            let next_row = used_rows(rows) as u32 + 1;
            write_block(rows, CellRef::new(next_row, 0), new_rows)
        })
    }
}

fn read_grid<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Vec<Vec<String>>> {
    let range = workbook
        .worksheet_range(name)
        .ok_or_else(|| CrmError::InvalidWorkbook(format!("missing sheet '{name}'")))?
        .map_err(CrmError::from)?;

    // Ranges begin at the first used cell, not at A1.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut grid = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(|cell| cell_to_string(Some(cell))));
        grid.push(cells);
    }
    Ok(grid)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
