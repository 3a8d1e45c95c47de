//! Raw cell input as typed by the user

/// Prefix that marks editor text as a formula
pub const FORMULA_MARKER: char = '=';

/// What a cell holds before evaluation
///
/// A cell is exactly one of these at any time; setting one replaces the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContent {
    /// Plain text, shown as-is (after scalar classification)
    Literal(String),
    /// Formula source with the leading marker stripped (e.g. `A1+B1`)
    Formula(String),
}

impl RawContent {
    /// Classify editor text: a leading `=` makes it a formula
    ///
    /// ```
    /// use gridwire_core::RawContent;
    ///
    /// assert_eq!(RawContent::classify("=A1+B1"), RawContent::Formula("A1+B1".into()));
    /// assert_eq!(RawContent::classify("42"), RawContent::Literal("42".into()));
    /// ```
    pub fn classify(text: &str) -> Self {
        match text.strip_prefix(FORMULA_MARKER) {
            Some(source) => RawContent::Formula(source.to_string()),
            None => RawContent::Literal(text.to_string()),
        }
    }

    /// Check if this is a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, RawContent::Formula(_))
    }

    /// Get the formula source if this is a formula
    pub fn formula_source(&self) -> Option<&str> {
        match self {
            RawContent::Formula(source) => Some(source),
            RawContent::Literal(_) => None,
        }
    }

    /// Text to put back into an editor: the formula with its marker, or the literal
    pub fn editor_text(&self) -> String {
        match self {
            RawContent::Formula(source) => format!("{}{}", FORMULA_MARKER, source),
            RawContent::Literal(text) => text.clone(),
        }
    }
}

impl Default for RawContent {
    fn default() -> Self {
        RawContent::Literal(String::new())
    }
}
