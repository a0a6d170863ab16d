//! Regex patterns for line item extraction.
//!
//! The fixed helpers below are internal plumbing. Everything vendor- or
//! layout-specific is returned as configuration data by the `default_*`
//! functions so it can be overridden from a config file.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::config::{DetectorConfig, HeaderRule, ProfileConfig};
use crate::models::line_item::Field;

lazy_static! {
    // Runs of whitespace (including NBSP, tabs)
    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    // Leading part-number token followed by free text
    pub static ref LEADING_TOKEN: Regex = Regex::new(
        r"^([A-Z0-9][A-Z0-9\-/.]*)\s+(\S.*)$"
    ).unwrap();

    // Column gap inside a line of page text: a tab or two+ spaces
    pub static ref COLUMN_GAP: Regex = Regex::new(r"\t+|[ \u{00a0}]{2,}").unwrap();
}

/// Amount with optional currency symbol, shared by the price detectors.
const AMOUNT: &str = r"((?:[$€£]\s*)?\d[\d,]*(?:\.\d+)?)";

fn profile(name: &str, keywords: &[&str], patterns: &[&str]) -> ProfileConfig {
    ProfileConfig {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        quantity_default: None,
        description_fallback: None,
    }
}

/// Built-in manufacturer profiles, vendor formats first, generic fallbacks last.
pub fn default_profiles() -> Vec<ProfileConfig> {
    vec![
        profile(
            "cisco",
            &["cisco"],
            &[
                r"\b((?:C9\d{3}|WS-C\d{4}|N9K|N3K|ISR\d{4}|AIR|CBS\d{3}|SFP|GLC|CON|LIC)-[A-Z0-9][A-Z0-9\-/=+]*)",
                r"\b([A-Z]{2,}\d[A-Z0-9]*-[A-Z0-9][A-Z0-9\-/=+]*)",
            ],
        ),
        profile(
            "hpe",
            &["hpe", "hewlett packard", "aruba"],
            &[
                r"\b([A-Z0-9]{5,6}-[A-Z]\d{2})\b",
                r"\b([A-Z]{1,2}\d{4}[A-Z]{1,2})\b",
            ],
        ),
        profile("dell", &["dell"], &[r"\b(\d{3}-[A-Z0-9]{4})\b"]),
        profile(
            "labeled",
            &[],
            &[
                r"(?i)\b(?:mfg|mfr|manufacturer)\.?\s*(?:part\s*)?(?:#|no\.?|number)?\s*[:#]\s*([A-Z0-9][A-Z0-9\-/.]*\d[A-Z0-9\-/.]*|\d)",
                r"(?i)\b(?:part|p/n|model)\s*(?:#|no\.?|number)?\s*[:#]\s*([A-Z0-9][A-Z0-9\-/.]*\d[A-Z0-9\-/.]*|\d)",
            ],
        ),
        profile(
            "sku-shaped",
            &[],
            &[
                r"\b([A-Z]{2,}\d[A-Z0-9]*(?:-[A-Z0-9]+)+)\b",
                r"\b([A-Z]{1,4}-?\d{3,}[A-Z0-9]*(?:-[A-Z0-9]+)*)\b",
            ],
        ),
    ]
}

fn detector(kind: Field, pattern: &str) -> DetectorConfig {
    DetectorConfig {
        kind,
        pattern: pattern.to_string(),
    }
}

/// Built-in field detectors in application order: quantity, prices, discount,
/// then identifiers and labeled text.
pub fn default_detectors() -> Vec<DetectorConfig> {
    vec![
        detector(Field::Quantity, r"(?i)\b(?:qty|quantity|qnty)\.?\s*[:=#]?\s*(\d[\d,]*)"),
        detector(Field::Quantity, r"(?i)\b(\d+)\s*(?:x|pcs|pc|ea|each|units?)\b"),
        detector(
            Field::NetPrice,
            &format!(r"(?i)\b(?:net|extended|ext\.?|total)\s*(?:price|amount|amt)?\s*[:=]?\s*{AMOUNT}"),
        ),
        detector(
            Field::ListPrice,
            &format!(r"(?i)\b(?:list|msrp)\s*(?:price)?\s*[:=]?\s*{AMOUNT}"),
        ),
        detector(
            Field::UnitPrice,
            &format!(r"(?i)\b(?:unit\s*price|unit\s*cost|price|cost)\s*[:=]?\s*{AMOUNT}"),
        ),
        detector(Field::UnitPrice, r"([$€£]\s*\d[\d,]*(?:\.\d{1,4})?)"),
        detector(
            Field::Discount,
            r"(?i)\bdisc(?:ount)?\.?\s*[:=]?\s*(\d{1,3}(?:\.\d+)?)\s*%?",
        ),
        detector(Field::Discount, r"(\d{1,3}(?:\.\d+)?)\s*%"),
        detector(Field::Sku, r"(?i)\bsku\s*[:#]?\s*([A-Z0-9][A-Z0-9\-/]*)"),
        detector(Field::Upc, r"(?i)\b(?:upc|ean|gtin)\s*[:#]?\s*(\d[\d -]{10,16}\d)"),
        detector(Field::Description, r"(?i)^\s*(?:description|desc)\.?\s*[:\-]\s*(.+)$"),
        detector(Field::Notes, r"(?i)^\s*(?:notes?|comments?|remarks?)\s*[:\-]\s*(.+)$"),
    ]
}

fn rule(field: Field, keywords: &[&str]) -> HeaderRule {
    HeaderRule {
        field,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

/// Built-in table header rules, most specific first. A field may appear more
/// than once so that strong and weak keywords can sit at different priorities.
pub fn default_header_rules() -> Vec<HeaderRule> {
    vec![
        rule(Field::Upc, &["upc", "ean", "gtin", "barcode"]),
        rule(Field::Sku, &["sku"]),
        rule(Field::Discount, &["discount", "disc", "% off"]),
        rule(Field::ListPrice, &["list", "msrp"]),
        rule(Field::NetPrice, &["net", "extended", "ext.", "ext price", "total", "amount"]),
        rule(Field::UnitPrice, &["unit price", "unit cost", "price", "cost", "rate"]),
        rule(Field::Quantity, &["qty", "quantity", "qnty", "units"]),
        rule(Field::Description, &["description", "desc"]),
        rule(
            Field::ManufacturerNumber,
            &[
                "mfg", "mfr", "manufacturer", "part", "p/n", "model", "item #", "item no",
                "product code", "product id", "catalog",
            ],
        ),
        rule(Field::Description, &["product", "item", "details"]),
        rule(Field::Notes, &["note", "comment", "remark"]),
    ]
}
