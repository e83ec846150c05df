use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use crate::assemble::{Cell, ReportTable, SHEET_NAME};

const DATE_NUMBER_FORMAT: &str = "dd.mm.yyyy";

pub fn write_report(table: &ReportTable, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .with_context(|| "failed to name the report sheet")?;

    let date_format = Format::new().set_num_format(DATE_NUMBER_FORMAT);

    for (col, column) in table.columns.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, column.title.as_str())
            .with_context(|| format!("failed to write header '{}'", column.title))?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let r = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Empty => {
                    // date columns stay genuinely empty; a "" string would
                    // break date filtering on the sheet
                    if !table.columns[col].is_date {
                        worksheet
                            .write_string(r, c, "")
                            .with_context(|| format!("failed to blank cell {r}:{c}"))?;
                    }
                }
                Cell::Text(value) => {
                    worksheet
                        .write_string(r, c, value)
                        .with_context(|| format!("failed to write cell {r}:{c}"))?;
                }
                Cell::Date(date) => {
                    worksheet
                        .write_datetime_with_format(r, c, date, &date_format)
                        .with_context(|| format!("failed to write date cell {r}:{c}"))?;
                }
                Cell::Link { url, text } => {
                    worksheet
                        .write_url_with_text(r, c, url.as_str(), text)
                        .with_context(|| format!("failed to write link cell {r}:{c}"))?;
                }
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}
