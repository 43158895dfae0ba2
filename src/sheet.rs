use anyhow::{Context, Result};
use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use std::path::Path;

/// One unit of input work from the uploaded spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub title: String,
    pub url: String,
    pub xpath: String,
}

/// Parse the first worksheet of the workbook at `path` into ordered rows.
///
/// The header row must name `title`, `url` and `xpath` columns
/// (case-insensitive). Any failure here aborts the whole upload; there is no
/// partial recovery.
pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("workbook contains no worksheets")?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("worksheet `{sheet_name}` is missing"))?
        .with_context(|| format!("reading worksheet `{sheet_name}`"))?;
    rows_from_range(&range)
}

fn rows_from_range(range: &Range<DataType>) -> Result<Vec<Row>> {
    let mut lines = range.rows();
    let header = lines.next().context("spreadsheet is empty")?;

    let title = find_column(header, "title")?;
    let url = find_column(header, "url")?;
    let xpath = find_column(header, "xpath")?;

    let mut rows = Vec::new();
    for cells in lines {
        let row = Row {
            title: cell_text(cells, title),
            url: cell_text(cells, url),
            xpath: cell_text(cells, xpath),
        };
        // spreadsheet tools leave fully blank lines behind deleted data
        if row.title.is_empty() && row.url.is_empty() && row.xpath.is_empty() {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

fn find_column(header: &[DataType], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|cell| {
            cell.get_string()
                .map(|s| s.trim().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .with_context(|| format!("missing required column `{name}`"))
}

fn cell_text(cells: &[DataType], index: usize) -> String {
    cells
        .get(index)
        .map(|cell| cell.to_string().trim().to_string())
        .unwrap_or_default()
}
