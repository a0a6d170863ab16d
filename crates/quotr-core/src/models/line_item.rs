//! Line item data model.
//!
//! A [`LineItem`] is the mutable accumulator the segmenter and the table
//! normalizer fill field by field. Every value is kept as the raw string that
//! was matched so no precision is lost before the cleaner coerces it. The
//! cleaner turns accepted accumulators into immutable [`LineItemRecord`]s.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical line item fields.
///
/// The same enum names table columns, field detectors and output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ManufacturerNumber,
    Description,
    Quantity,
    UnitPrice,
    ListPrice,
    Discount,
    NetPrice,
    Sku,
    Upc,
    Notes,
}

/// Output schema, in column order.
pub const OUTPUT_COLUMNS: [Field; 10] = [
    Field::ManufacturerNumber,
    Field::Description,
    Field::Quantity,
    Field::UnitPrice,
    Field::ListPrice,
    Field::Discount,
    Field::NetPrice,
    Field::Sku,
    Field::Upc,
    Field::Notes,
];

impl Field {
    /// Column header used by record sinks.
    pub fn header(&self) -> &'static str {
        match self {
            Field::ManufacturerNumber => "Manufacturer Number",
            Field::Description => "Description",
            Field::Quantity => "Quantity",
            Field::UnitPrice => "Unit Price",
            Field::ListPrice => "List Price",
            Field::Discount => "Discount",
            Field::NetPrice => "Net Price",
            Field::Sku => "SKU",
            Field::Upc => "UPC",
            Field::Notes => "Notes",
        }
    }

    /// Whether repeated matches append fragments instead of filling a slot once.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Field::Description | Field::Notes)
    }

    /// Money fields share one sanitizer.
    pub fn is_money(&self) -> bool {
        matches!(self, Field::UnitPrice | Field::ListPrice | Field::NetPrice)
    }
}

/// Where a line item came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Free text lines passed through the segmenter.
    #[default]
    Text,
    /// A field-delimited table row.
    Table,
}

/// In-progress line item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineItem {
    pub manufacturer_number: Option<String>,
    pub description: Vec<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub list_price: Option<String>,
    pub discount: Option<String>,
    pub net_price: Option<String>,
    pub sku: Option<String>,
    pub upc: Option<String>,
    pub notes: Vec<String>,
    pub source: Source,
    /// Profile that recognized the identifier; selects per-profile defaults.
    pub profile: Option<String>,
    /// Page (1-indexed) the identifier was found on.
    pub page: Option<u32>,
}

impl LineItem {
    /// Create an empty accumulator.
    pub fn new(source: Source) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// Create an accumulator seeded with an identifier.
    pub fn with_identifier(source: Source, identifier: impl Into<String>) -> Self {
        Self {
            manufacturer_number: Some(identifier.into()),
            source,
            ..Self::default()
        }
    }

    /// Set the profile that produced the identifier.
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    /// Set the page the item starts on.
    pub fn with_page(mut self, page: Option<u32>) -> Self {
        self.page = page;
        self
    }

    /// True when the item carries a non-blank manufacturer number.
    pub fn has_identifier(&self) -> bool {
        self.manufacturer_number
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty())
    }

    /// True when nothing at all has been accumulated.
    pub fn is_empty(&self) -> bool {
        !self.has_identifier()
            && self.description.is_empty()
            && self.notes.is_empty()
            && self.quantity.is_none()
            && self.unit_price.is_none()
            && self.list_price.is_none()
            && self.discount.is_none()
            && self.net_price.is_none()
            && self.sku.is_none()
            && self.upc.is_none()
    }

    /// Append a description fragment. Blank fragments are ignored.
    pub fn push_description(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        if !fragment.trim().is_empty() {
            self.description.push(fragment.trim().to_string());
        }
    }

    /// Append a note fragment. Blank fragments are ignored.
    pub fn push_note(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        if !fragment.trim().is_empty() {
            self.notes.push(fragment.trim().to_string());
        }
    }

    /// Current value of a single-valued field.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::ManufacturerNumber => self.manufacturer_number.as_deref(),
            Field::Quantity => self.quantity.as_deref(),
            Field::UnitPrice => self.unit_price.as_deref(),
            Field::ListPrice => self.list_price.as_deref(),
            Field::Discount => self.discount.as_deref(),
            Field::NetPrice => self.net_price.as_deref(),
            Field::Sku => self.sku.as_deref(),
            Field::Upc => self.upc.as_deref(),
            Field::Description | Field::Notes => None,
        }
    }

    /// Whether a field already holds a value.
    pub fn is_set(&self, field: Field) -> bool {
        match field {
            Field::Description => !self.description.is_empty(),
            Field::Notes => !self.notes.is_empty(),
            other => self.get(other).is_some(),
        }
    }

    /// Store a matched value. Multi-valued fields append, the rest overwrite.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Description => self.push_description(value),
            Field::Notes => self.push_note(value),
            Field::ManufacturerNumber => self.manufacturer_number = Some(value),
            Field::Quantity => self.quantity = Some(value),
            Field::UnitPrice => self.unit_price = Some(value),
            Field::ListPrice => self.list_price = Some(value),
            Field::Discount => self.discount = Some(value),
            Field::NetPrice => self.net_price = Some(value),
            Field::Sku => self.sku = Some(value),
            Field::Upc => self.upc = Some(value),
        }
    }
}

/// A finalized line item, as handed to record sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub manufacturer_number: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_price: Option<Decimal>,
    /// Percentage, 0 to 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl LineItemRecord {
    /// Render one visible field as a cell.
    pub fn cell(&self, field: Field) -> String {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(ToString::to_string).unwrap_or_default()
        }

        match field {
            Field::ManufacturerNumber => self.manufacturer_number.clone(),
            Field::Description => self.description.clone(),
            Field::Quantity => opt(&self.quantity),
            Field::UnitPrice => opt(&self.unit_price),
            Field::ListPrice => opt(&self.list_price),
            Field::Discount => opt(&self.discount),
            Field::NetPrice => opt(&self.net_price),
            Field::Sku => opt(&self.sku),
            Field::Upc => opt(&self.upc),
            Field::Notes => self.notes.clone(),
        }
    }

    /// Render the visible fields in [`OUTPUT_COLUMNS`] order.
    pub fn cells(&self) -> Vec<String> {
        OUTPUT_COLUMNS.iter().map(|f| self.cell(*f)).collect()
    }
}

impl From<&LineItemRecord> for LineItem {
    fn from(record: &LineItemRecord) -> Self {
        let mut item = LineItem::with_identifier(record.source, record.manufacturer_number.clone())
            .with_profile(record.profile.clone())
            .with_page(record.page);
        item.push_description(record.description.clone());
        item.push_note(record.notes.clone());
        item.quantity = record.quantity.map(|q| q.to_string());
        item.unit_price = record.unit_price.map(|d| d.to_string());
        item.list_price = record.list_price.map(|d| d.to_string());
        item.discount = record.discount.map(|d| d.to_string());
        item.net_price = record.net_price.map(|d| d.to_string());
        item.sku = record.sku.clone();
        item.upc = record.upc.clone();
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_blank_fragments_ignored() {
        let mut item = LineItem::new(Source::Text);
        item.push_description("   ");
        item.push_note("");
        assert!(item.is_empty());

        item.push_description("  Power supply ");
        assert_eq!(item.description, vec!["Power supply".to_string()]);
    }

    #[test]
    fn test_identifier_must_be_non_blank() {
        let item = LineItem::with_identifier(Source::Text, "  ");
        assert!(!item.has_identifier());

        let item = LineItem::with_identifier(Source::Text, "ABC-123");
        assert!(item.has_identifier());
    }

    #[test]
    fn test_set_single_and_multi_valued() {
        let mut item = LineItem::new(Source::Table);
        item.set(Field::Quantity, "5");
        item.set(Field::Description, "first");
        item.set(Field::Description, "second");

        assert!(item.is_set(Field::Quantity));
        assert!(!item.is_set(Field::UnitPrice));
        assert_eq!(item.get(Field::Quantity), Some("5"));
        assert_eq!(item.description.len(), 2);
    }

    #[test]
    fn test_cells_follow_output_columns() {
        let record = LineItemRecord {
            manufacturer_number: "ABC-123".to_string(),
            description: "Widget".to_string(),
            quantity: Some(2),
            unit_price: Some(Decimal::from_str("10.50").unwrap()),
            list_price: None,
            discount: None,
            net_price: Some(Decimal::from_str("21.00").unwrap()),
            sku: None,
            upc: None,
            notes: String::new(),
            source: Source::Text,
            profile: None,
            page: Some(1),
        };

        assert_eq!(
            record.cells(),
            vec!["ABC-123", "Widget", "2", "10.50", "", "", "21.00", "", "", ""]
        );
        assert_eq!(OUTPUT_COLUMNS[0].header(), "Manufacturer Number");
    }
}
