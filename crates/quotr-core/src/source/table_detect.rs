//! Table grids recovered from column-aligned page text.
//!
//! Text extractors flatten tables into lines whose cells are separated by
//! tabs or runs of spaces. Consecutive lines that split into enough cells are
//! grouped into one grid. The first line of a run is the header; a row with
//! fewer cells than the header is placed under the header columns by
//! character offset, so a blank cell in the middle stays blank.

use crate::extract::TableGrid;
use crate::extract::rules::patterns::COLUMN_GAP;

/// One cell of a line and the character columns it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    start: usize,
    end: usize,
    text: String,
}

fn spanned_cells(line: &str) -> Vec<Cell> {
    let mut cells = Vec::new();
    let mut push = |from: usize, to: usize| {
        let raw = &line[from..to];
        let text = raw.trim();
        if text.is_empty() {
            return;
        }
        let lead = raw.len() - raw.trim_start().len();
        let start = line[..from + lead].chars().count();
        cells.push(Cell {
            start,
            end: start + text.chars().count(),
            text: text.to_string(),
        });
    };

    let mut last = 0;
    for gap in COLUMN_GAP.find_iter(line) {
        push(last, gap.start());
        last = gap.end();
    }
    push(last, line.len());
    cells
}

/// Split a raw line on tabs and runs of two or more spaces.
pub fn split_line_into_cells(line: &str) -> Vec<String> {
    spanned_cells(line).into_iter().map(|cell| cell.text).collect()
}

/// Header column whose span overlaps `cell` the most. Column `i` spans from
/// its own start to the start of column `i + 1`.
fn column_for(header: &[Cell], cell: &Cell) -> usize {
    let mut best = (0, 0);
    for (idx, column) in header.iter().enumerate() {
        let end = header.get(idx + 1).map_or(usize::MAX, |next| next.start);
        let overlap = cell.end.min(end).saturating_sub(cell.start.max(column.start));
        if overlap > best.1 {
            best = (idx, overlap);
        }
    }
    best.0
}

/// Lay `row` out under `header`. Rows that are not short, or whose cells
/// cannot be placed in distinct columns, keep their left-to-right order.
fn align(header: &[Cell], row: Vec<Cell>) -> Vec<Option<String>> {
    if row.len() < header.len() {
        let placed: Vec<usize> = row.iter().map(|cell| column_for(header, cell)).collect();
        if placed.windows(2).all(|pair| pair[0] < pair[1]) {
            let mut out = vec![None; header.len()];
            for (idx, cell) in placed.into_iter().zip(row) {
                out[idx] = Some(cell.text);
            }
            return out;
        }
    }
    row.into_iter().map(|cell| Some(cell.text)).collect()
}

fn to_grid(rows: Vec<Vec<Cell>>, page: Option<u32>) -> TableGrid {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return TableGrid::new(page, Vec::new());
    };
    let mut grid = vec![header.iter().map(|cell| Some(cell.text.clone())).collect()];
    grid.extend(rows.map(|row| align(&header, row)));
    TableGrid::new(page, grid)
}

/// Group runs of at least two lines with `min_cols` or more cells into grids.
pub fn detect_tables<'a, I>(lines: I, min_cols: usize, page: Option<u32>) -> Vec<TableGrid>
where
    I: IntoIterator<Item = &'a str>,
{
    let min_cols = min_cols.max(2);
    let mut tables = Vec::new();
    let mut current: Vec<Vec<Cell>> = Vec::new();

    let mut flush = |rows: &mut Vec<Vec<Cell>>| {
        if rows.len() >= 2 {
            tables.push(to_grid(std::mem::take(rows), page));
        } else {
            rows.clear();
        }
    };

    for line in lines {
        let cells = spanned_cells(line);
        if cells.len() >= min_cols {
            current.push(cells);
        } else {
            flush(&mut current);
        }
    }
    flush(&mut current);

    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line_into_cells() {
        assert_eq!(
            split_line_into_cells("  ABC-123   Rack mount kit\t2  $10.00 "),
            vec!["ABC-123", "Rack mount kit", "2", "$10.00"]
        );
        assert!(split_line_into_cells("   ").is_empty());
    }

    #[test]
    fn test_spanned_cells_offsets() {
        let cells = spanned_cells("  AB  Gadget");
        assert_eq!((cells[0].start, cells[0].end), (2, 4));
        assert_eq!((cells[1].start, cells[1].end), (6, 12));
    }

    #[test]
    fn test_detect_tables_groups_runs() {
        let text = "Quote 1001\n\
                    Part      Description    Qty\n\
                    ABC-123   Widget         2\n\
                    XYZ-999   Gadget         1\n\
                    Thank you\n\
                    A  B  C\n";
        let tables = detect_tables(text.lines(), 3, Some(1));

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(tables[0].rows[1][0].as_deref(), Some("ABC-123"));
        assert_eq!(tables[0].page, Some(1));
    }

    #[test]
    fn test_blank_middle_cell_keeps_its_column() {
        let lines = [
            "Part Number  Description  Qty  Unit Price",
            "ABC-123      Widget       2    $5.00",
            "XYZ-999      Gadget            $10.00",
        ];
        let tables = detect_tables(lines, 3, None);

        assert_eq!(
            tables[0].rows[2],
            vec![
                Some("XYZ-999".to_string()),
                Some("Gadget".to_string()),
                None,
                Some("$10.00".to_string()),
            ]
        );
    }

    #[test]
    fn test_unaligned_short_row_keeps_order() {
        let lines = ["Part Number  Description  Qty  Unit Price", "XYZ-999  Gadget  $10.00"];
        let tables = detect_tables(lines, 3, None);

        assert_eq!(tables[0].rows[1].len(), 3);
        assert_eq!(tables[0].rows[1][2].as_deref(), Some("$10.00"));
    }

    #[test]
    fn test_single_row_is_not_a_table() {
        let tables = detect_tables(["a  b  c", "plain text"], 3, None);
        assert!(tables.is_empty());
    }
}
