//! Line segmenter: turns an ordered stream of text lines into line items.
//!
//! The segmenter keeps exactly one accumulator. A manufacturer number (or a
//! recovered leading part-number token) closes the current item and opens a
//! new one, unless the current item has no identifier yet, in which case the
//! identifier is set on it. Everything else on a line is routed to fields by
//! the detectors of the pattern library, and whatever is left becomes a
//! description fragment.

use tracing::{debug, trace};

use super::Candidates;
use super::rules::{FieldExtractor, PatternLibrary, normalize_line, recover_leading_token};
use crate::models::config::{ExtractionConfig, PreambleMode};
use crate::models::diagnostic::{Diagnostic, DiagnosticCode};
use crate::models::line_item::{LineItem, Source};

/// One line of document text and the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
    pub page: Option<u32>,
}

impl TextLine {
    pub fn new(text: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            text: text.into(),
            page,
        }
    }
}

impl From<&str> for TextLine {
    fn from(text: &str) -> Self {
        Self::new(text, None)
    }
}

/// Text-mode line segmenter.
pub struct LineSegmenter<'a> {
    library: &'a PatternLibrary,
    token_recovery: bool,
    preamble: PreambleMode,
}

impl<'a> LineSegmenter<'a> {
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self {
            library,
            token_recovery: true,
            preamble: PreambleMode::default(),
        }
    }

    pub fn from_config(library: &'a PatternLibrary, config: &ExtractionConfig) -> Self {
        Self::new(library)
            .with_token_recovery(config.text_token_recovery)
            .with_preamble(config.preamble)
    }

    /// Start items on leading part-number tokens when a line also has a
    /// quantity or a price.
    pub fn with_token_recovery(mut self, enabled: bool) -> Self {
        self.token_recovery = enabled;
        self
    }

    /// Choose where text seen before the first identifier goes.
    pub fn with_preamble(mut self, mode: PreambleMode) -> Self {
        self.preamble = mode;
        self
    }

    /// Segment `lines` in order.
    pub fn segment<'l, I>(&self, lines: I) -> Candidates
    where
        I: IntoIterator<Item = &'l TextLine>,
    {
        let mut state = State {
            current: LineItem::new(Source::Text),
            output: Candidates::default(),
            preamble: self.preamble,
        };

        for line in lines {
            let text = normalize_line(&line.text);
            if text.is_empty() {
                continue;
            }
            self.feed(&mut state, &text, line.page);
        }

        state.finish()
    }

    fn feed(&self, state: &mut State, line: &str, page: Option<u32>) {
        let mut rest = match self.library.detect_manufacturer(line) {
            Some(found) => {
                trace!("Manufacturer number {} ({})", found.identifier(), found.profile);
                let seed = LineItem::with_identifier(Source::Text, found.identifier())
                    .with_profile(Some(found.profile.clone()))
                    .with_page(page);
                state.start(seed);
                found.matched.strip_from(line)
            }
            None => match self.recover_token(line) {
                Some((token, rest)) => {
                    trace!("Recovered leading token {}", token);
                    state.start(LineItem::with_identifier(Source::Text, token).with_page(page));
                    rest
                }
                None => line.to_string(),
            },
        };
        if state.current.page.is_none() {
            state.current.page = page;
        }

        for detector in self.library.detectors() {
            let kind = detector.kind();
            if !kind.is_multi_valued() && state.current.is_set(kind) {
                continue;
            }
            if let Some(m) = detector.extract(&rest) {
                rest = m.strip_from(&rest);
                state.current.set(kind, m.value);
            }
            if rest.is_empty() {
                break;
            }
        }

        if !rest.is_empty() {
            state.current.push_description(rest);
        }
    }

    fn recover_token(&self, line: &str) -> Option<(String, String)> {
        if !self.token_recovery {
            return None;
        }
        let (token, rest) = recover_leading_token(line)?;
        let priced = self.library.extract_quantity(&rest).is_some()
            || self.library.extract_price(&rest).is_some();
        priced.then_some((token, rest))
    }
}

struct State {
    current: LineItem,
    output: Candidates,
    preamble: PreambleMode,
}

impl State {
    /// Close the current accumulator and make `seed` current. An accumulator
    /// without an identifier is seeded in place instead.
    fn start(&mut self, seed: LineItem) {
        let previous = std::mem::replace(&mut self.current, seed);
        if previous.has_identifier() {
            self.output.items.push(previous);
        } else if !previous.is_empty() {
            self.seed_in_place(previous);
        }
    }

    fn seed_in_place(&mut self, mut preamble: LineItem) {
        if self.preamble == PreambleMode::Discard {
            self.discard(&preamble);
            return;
        }

        let seed = std::mem::take(&mut self.current);
        preamble.manufacturer_number = seed.manufacturer_number;
        preamble.profile = seed.profile;
        preamble.page = seed.page.or(preamble.page);
        if self.preamble == PreambleMode::Notes {
            let mut notes = std::mem::take(&mut preamble.description);
            notes.append(&mut preamble.notes);
            preamble.notes = notes;
        }
        debug!(
            "Seeded {} in place over {} earlier fragments",
            preamble.manufacturer_number.as_deref().unwrap_or_default(),
            preamble.description.len() + preamble.notes.len()
        );
        self.current = preamble;
    }

    fn discard(&mut self, preamble: &LineItem) {
        let fragments = preamble.description.len() + preamble.notes.len();
        debug!("Discarding {} fragments without an identifier", fragments);
        self.output.diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::PreambleDiscarded,
                format!("{fragments} text fragment(s) appeared outside any line item"),
            )
            .with_page(preamble.page),
        );
    }

    fn finish(mut self) -> Candidates {
        let last = std::mem::take(&mut self.current);
        if last.has_identifier() {
            self.output.items.push(last);
        } else if !last.is_empty() {
            self.discard(&last);
        }
        self.output
    }
}
