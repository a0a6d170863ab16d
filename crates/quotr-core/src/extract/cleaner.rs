//! Record cleaner: coerces accumulated items into typed records and removes
//! exact duplicates.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use super::rules::PatternLibrary;
use super::rules::sanitize::{
    clean_money, clean_part_number, digits_only, has_fraction, normalize_line, strip_zero_fraction,
};
use crate::models::config::{DescriptionFallback, ExtractionConfig, QuantityDefault};
use crate::models::diagnostic::{Diagnostic, DiagnosticCode};
use crate::models::line_item::{LineItem, LineItemRecord};

/// Separator between note fragments in a finalized record.
pub const NOTES_SEPARATOR: &str = " | ";

/// Records produced by one cleaning pass.
#[derive(Debug, Default)]
pub struct Cleaned {
    pub records: Vec<LineItemRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-field sanitization and finalization.
#[derive(Debug, Clone, Copy)]
pub struct RecordCleaner<'a> {
    library: &'a PatternLibrary,
    quantity_default: QuantityDefault,
    description_fallback: DescriptionFallback,
    decimal_separator: char,
    price_scale: Option<u32>,
}

impl<'a> RecordCleaner<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self {
            library,
            quantity_default: QuantityDefault::Absent,
            description_fallback: DescriptionFallback::Notes,
            decimal_separator: '.',
            price_scale: None,
        }
    }

    pub fn from_config(library: &'a PatternLibrary, config: &ExtractionConfig) -> Self {
        Self::new(library)
            .with_quantity_default(config.quantity_default)
            .with_description_fallback(config.description_fallback)
            .with_decimal_separator(config.decimal_separator)
            .with_price_scale(config.price_scale)
    }

    /// Quantity used when none was found, unless the item's profile says otherwise.
    pub fn with_quantity_default(mut self, default: QuantityDefault) -> Self {
        self.quantity_default = default;
        self
    }

    /// Description fallback, unless the item's profile says otherwise.
    pub fn with_description_fallback(mut self, fallback: DescriptionFallback) -> Self {
        self.description_fallback = fallback;
        self
    }

    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    pub fn with_price_scale(mut self, scale: Option<u32>) -> Self {
        self.price_scale = scale;
        self
    }

    /// Finalize `items`, drop those without an identifier, and remove exact
    /// duplicates. Order is preserved.
    pub fn clean(&self, items: Vec<LineItem>) -> Cleaned {
        let mut diagnostics = Vec::new();
        let records: Vec<LineItemRecord> = items
            .into_iter()
            .filter_map(|item| self.clean_item(item, &mut diagnostics))
            .collect();

        let before = records.len();
        let records = dedup(records);
        let removed = before - records.len();
        if removed > 0 {
            debug!("Removed {} duplicate records", removed);
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::DuplicatesRemoved,
                format!("{removed} identical record(s) collapsed"),
            ));
        }

        Cleaned {
            records,
            diagnostics,
        }
    }

    /// Re-run the cleaner on finalized records. Records hold canonical
    /// decimals, so the '.' separator is used regardless of configuration.
    pub fn clean_records(&self, records: &[LineItemRecord]) -> Vec<LineItemRecord> {
        let canonical = self.with_decimal_separator('.');
        canonical
            .clean(records.iter().map(LineItem::from).collect())
            .records
    }

    /// Finalize one item. Returns `None` when the identifier is empty after
    /// sanitization.
    pub fn clean_item(
        &self,
        item: LineItem,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<LineItemRecord> {
        let page = item.page;
        let manufacturer_number = clean_part_number(item.manufacturer_number.as_deref().unwrap_or_default());
        if manufacturer_number.is_empty() {
            debug!("Dropping record without identifier: {:?}", item.description);
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::RecordDropped,
                    "record has no manufacturer number after sanitization",
                )
                .with_page(page),
            );
            return None;
        }

        let profile = item.profile.as_deref().and_then(|name| self.library.profile(name));
        let quantity_default = profile
            .and_then(|p| p.quantity_default())
            .unwrap_or(self.quantity_default);
        let description_fallback = profile
            .and_then(|p| p.description_fallback())
            .unwrap_or(self.description_fallback);

        let mut description = normalize_line(&item.description.join(" "));
        let mut notes = item.notes;
        if description.is_empty()
            && description_fallback == DescriptionFallback::Notes
            && !notes.is_empty()
        {
            description = normalize_line(&notes.remove(0));
        }

        let mut issue = |code: DiagnosticCode, message: String| {
            debug!("{}: {}", manufacturer_number, message);
            diagnostics.push(Diagnostic::new(code, format!("{manufacturer_number}: {message}")).with_page(page));
        };

        let quantity = match item.quantity.as_deref() {
            Some(raw) => self.quantity(raw, quantity_default, &mut issue),
            None => default_quantity(quantity_default),
        };
        let unit_price = self.money(item.unit_price.as_deref(), &mut issue);
        let list_price = self.money(item.list_price.as_deref(), &mut issue);
        let net_price = self.money(item.net_price.as_deref(), &mut issue);
        let discount = self.discount(item.discount.as_deref(), &mut issue);

        let sku = item
            .sku
            .as_deref()
            .map(clean_part_number)
            .filter(|s| !s.is_empty());
        let upc = item
            .upc
            .as_deref()
            .map(digits_only)
            .filter(|s| !s.is_empty());

        Some(LineItemRecord {
            manufacturer_number,
            description,
            quantity,
            unit_price,
            list_price,
            discount,
            net_price,
            sku,
            upc,
            notes: notes
                .iter()
                .map(|n| normalize_line(n))
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
                .join(NOTES_SEPARATOR),
            source: item.source,
            profile: item.profile,
            page,
        })
    }

    fn quantity(
        &self,
        raw: &str,
        default: QuantityDefault,
        issue: &mut impl FnMut(DiagnosticCode, String),
    ) -> Option<u32> {
        if has_fraction(raw, self.decimal_separator) {
            issue(DiagnosticCode::InvalidQuantity, format!("fractional quantity {raw:?}"));
            return None;
        }
        let digits = digits_only(strip_zero_fraction(raw, self.decimal_separator));
        if digits.is_empty() {
            return default_quantity(default);
        }
        match digits.parse::<u32>() {
            Ok(quantity) => Some(quantity),
            Err(_) => {
                issue(DiagnosticCode::InvalidQuantity, format!("quantity {raw:?} out of range"));
                None
            }
        }
    }

    fn decimal(&self, raw: &str) -> Result<Option<Decimal>, String> {
        let cleaned = clean_money(raw, self.decimal_separator);
        if cleaned.is_empty() {
            return Ok(None);
        }
        let value = Decimal::from_str(&cleaned).map_err(|e| format!("{raw:?}: {e}"))?;
        Ok(Some(value))
    }

    fn money(
        &self,
        raw: Option<&str>,
        issue: &mut impl FnMut(DiagnosticCode, String),
    ) -> Option<Decimal> {
        match self.decimal(raw?) {
            Ok(value) => value.map(|v| match self.price_scale {
                Some(scale) => v.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero),
                None => v,
            }),
            Err(message) => {
                issue(DiagnosticCode::InvalidPrice, format!("invalid price {message}"));
                None
            }
        }
    }

    fn discount(
        &self,
        raw: Option<&str>,
        issue: &mut impl FnMut(DiagnosticCode, String),
    ) -> Option<Decimal> {
        match self.decimal(raw?) {
            Ok(Some(value)) if value <= Decimal::ONE_HUNDRED => Some(value),
            Ok(Some(value)) => {
                issue(DiagnosticCode::InvalidDiscount, format!("discount {value} above 100"));
                None
            }
            Ok(None) => None,
            Err(message) => {
                issue(DiagnosticCode::InvalidDiscount, format!("invalid discount {message}"));
                None
            }
        }
    }
}

fn default_quantity(default: QuantityDefault) -> Option<u32> {
    match default {
        QuantityDefault::Absent => None,
        QuantityDefault::One => Some(1),
    }
}

/// Remove records whose visible fields are all identical to an earlier
/// record's. Records that differ in any visible field are kept.
pub fn dedup(records: Vec<LineItemRecord>) -> Vec<LineItemRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.cells()))
        .collect()
}
