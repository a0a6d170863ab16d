//! Table normalizer: maps header cells to fields and turns rows into items.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::Candidates;
use super::rules::{PatternLibrary, normalize_line, recover_leading_token};
use crate::models::config::{ExtractionConfig, HeaderRule};
use crate::models::diagnostic::{Diagnostic, DiagnosticCode};
use crate::models::line_item::{Field, LineItem, Source};

const CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];

/// A raw table grid as produced by a page provider. The first non-blank row
/// is the header. Cells may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    pub page: Option<u32>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl TableGrid {
    pub fn new(page: Option<u32>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { page, rows }
    }

    /// Build a grid from string cells; empty strings become missing cells.
    pub fn from_cells<R, C>(page: Option<u32>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| {
                        let cell = cell.as_ref();
                        (!cell.trim().is_empty()).then(|| cell.to_string())
                    })
                    .collect()
            })
            .collect();
        Self { page, rows }
    }

    /// Whether any cell holds data.
    pub fn has_data(&self) -> bool {
        self.rows
            .iter()
            .flatten()
            .any(|cell| cell.as_deref().is_some_and(|c| !c.trim().is_empty()))
    }
}

/// Column index of each canonical field found in one table header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<Field, usize>,
    headers: Vec<String>,
}

impl ColumnMap {
    /// Map header cells using `rules` in order.
    ///
    /// Each rule claims the leftmost unclaimed column containing one of its
    /// keywords, so a strong rule wins over a weaker one wherever their
    /// columns sit. A field maps at most once; a cell maps to at most one
    /// field.
    pub fn from_header(header: &[Option<String>], rules: &[HeaderRule]) -> Self {
        let headers: Vec<String> = header
            .iter()
            .map(|cell| cell.as_deref().map(normalize_line).unwrap_or_default())
            .collect();
        let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let mut columns: HashMap<Field, usize> = HashMap::new();

        for rule in rules {
            if columns.contains_key(&rule.field) {
                continue;
            }
            let column = lower
                .iter()
                .enumerate()
                .find(|(idx, text)| {
                    !text.is_empty()
                        && !columns.values().any(|claimed| claimed == idx)
                        && rule.keywords.iter().any(|k| text.contains(k.as_str()))
                })
                .map(|(idx, _)| idx);
            if let Some(idx) = column {
                columns.insert(rule.field, idx);
            }
        }

        Self { columns, headers }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    /// Header column count; every row is padded or truncated to it.
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn header(&self, idx: usize) -> &str {
        self.headers.get(idx).map(String::as_str).unwrap_or_default()
    }

    fn field_at(&self, idx: usize) -> Option<Field> {
        self.columns
            .iter()
            .find_map(|(field, col)| (*col == idx).then_some(*field))
    }

    /// A table is usable only with a manufacturer or a description column.
    pub fn is_usable(&self) -> bool {
        self.contains(Field::ManufacturerNumber) || self.contains(Field::Description)
    }
}

/// Turns table grids into line items.
pub struct TableNormalizer<'a> {
    library: &'a PatternLibrary,
    merge_continuation_rows: bool,
}

impl<'a> TableNormalizer<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self {
            library,
            merge_continuation_rows: true,
        }
    }

    pub fn from_config(library: &'a PatternLibrary, config: &ExtractionConfig) -> Self {
        Self::new(library).with_continuation_rows(config.merge_continuation_rows)
    }

    /// Append identifier-less description rows to the previous row.
    pub fn with_continuation_rows(mut self, enabled: bool) -> Self {
        self.merge_continuation_rows = enabled;
        self
    }

    /// Normalize every table, in order. Tables are numbered from zero in
    /// diagnostics.
    pub fn normalize<'t, I>(&self, tables: I) -> Candidates
    where
        I: IntoIterator<Item = &'t TableGrid>,
    {
        let mut out = Candidates::default();
        for (index, table) in tables.into_iter().enumerate() {
            self.normalize_table(index, table, &mut out);
        }
        out
    }

    fn normalize_table(&self, index: usize, table: &TableGrid, out: &mut Candidates) {
        let mut rows = table.rows.iter().enumerate().skip_while(|(_, row)| {
            row.iter()
                .all(|cell| cell.as_deref().is_none_or(|c| c.trim().is_empty()))
        });

        let Some((_, header)) = rows.next() else {
            debug!("Table {} has no rows", index);
            return;
        };

        let map = ColumnMap::from_header(header, self.library.header_rules());
        if !map.is_usable() {
            warn!("Skipping table {}: no manufacturer or description column", index);
            out.diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::TableSkipped,
                    "no manufacturer number or description column in header",
                )
                .with_page(table.page)
                .with_table(index),
            );
            return;
        }
        debug!("Table {} column map: {:?}", index, map);

        // Index into out.items of the last row accepted from this table.
        let mut last_accepted: Option<usize> = None;

        for (row_idx, row) in rows {
            if row.len() != map.width() {
                debug!(
                    "Table {} row {}: {} cells, header has {}",
                    index,
                    row_idx,
                    row.len(),
                    map.width()
                );
                out.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::RaggedRow,
                        format!("row has {} cells, header has {}", row.len(), map.width()),
                    )
                    .with_page(table.page)
                    .with_table(index)
                    .with_row(row_idx),
                );
            }

            let mut cells: Vec<String> = (0..map.width())
                .map(|i| {
                    row.get(i)
                        .and_then(|cell| cell.as_deref())
                        .map(normalize_line)
                        .unwrap_or_default()
                })
                .collect();
            if cells.iter().all(String::is_empty) {
                continue;
            }

            // Money in the quantity column means the row lost a cell.
            let misplaced = map
                .get(Field::Quantity)
                .filter(|&q| cells[q].contains(CURRENCY_SYMBOLS))
                .map(|q| (q, std::mem::take(&mut cells[q])));

            let mut item = self.row_to_item(&map, &cells, table.page);

            if let Some((q, value)) = misplaced {
                debug!("Table {} row {}: money {:?} in quantity column", index, row_idx, value);
                out.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::CellTypeMismatch,
                        format!("quantity column holds {value:?}; kept as a note"),
                    )
                    .with_page(table.page)
                    .with_table(index)
                    .with_row(row_idx),
                );
                item.push_note(format!("{}: {}", map.header(q), value));
            }

            if item.has_identifier() {
                out.items.push(item);
                last_accepted = Some(out.items.len() - 1);
                continue;
            }

            match last_accepted {
                Some(prev) if self.merge_continuation_rows && is_continuation(&item) => {
                    let target = &mut out.items[prev];
                    for fragment in item.description {
                        target.push_description(fragment);
                    }
                    for note in item.notes {
                        target.push_note(note);
                    }
                    out.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::ContinuationMerged,
                            "row without identifier appended to previous row",
                        )
                        .with_page(table.page)
                        .with_table(index)
                        .with_row(row_idx),
                    );
                }
                _ => {
                    debug!("Table {} row {}: no identifier, dropped", index, row_idx);
                    out.diagnostics.push(
                        Diagnostic::new(DiagnosticCode::RowDropped, "row has no manufacturer number")
                            .with_page(table.page)
                            .with_table(index)
                            .with_row(row_idx),
                    );
                }
            }
        }
    }

    fn row_to_item(&self, map: &ColumnMap, cells: &[String], page: Option<u32>) -> LineItem {
        let mut item = LineItem::new(Source::Table).with_page(page);

        for (idx, value) in cells.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match map.field_at(idx) {
                Some(field) => item.set(field, value.clone()),
                None => match map.header(idx) {
                    "" => item.push_note(value.clone()),
                    header => item.push_note(format!("{header}: {value}")),
                },
            }
        }

        if !map.contains(Field::ManufacturerNumber) {
            if let Some(recovered) = item
                .description
                .first()
                .and_then(|first| recover_leading_token(first))
            {
                let (token, rest) = recovered;
                item.manufacturer_number = Some(token);
                item.description[0] = rest;
            }
        }

        if let Some(number) = item.manufacturer_number.as_deref() {
            item.profile = self
                .library
                .detect_manufacturer(number)
                .map(|found| found.profile);
        }

        item
    }
}

/// Description-only rows continue the row above.
fn is_continuation(item: &LineItem) -> bool {
    !item.description.is_empty()
        && item.quantity.is_none()
        && item.unit_price.is_none()
        && item.list_price.is_none()
        && item.net_price.is_none()
        && item.discount.is_none()
}
