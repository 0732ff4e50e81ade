//! Typed grammar slots and their compilation into a matching pattern.

use crate::error::ExecResult;
use crate::parser::parse_expression;
use crate::program::LineNumber;
use regex::{Regex, RegexBuilder};

/// One typed placeholder in a statement's argument shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// A variable name such as `X` or `TOTAL2`.
    VariableName,
    /// An arithmetic expression over integers and variables.
    Expression,
    /// An unsigned decimal number, used for jump targets.
    IntegerLiteral,
    /// One of `<`, `=` or `>`.
    Comparator,
    /// Fixed text that must appear verbatim and is not captured (`=`, `THEN`).
    Literal(&'static str),
    /// Everything up to the end of the line, used by comments.
    Rest,
}

impl Slot {
    /// Regex fragment for this slot. Captured slots are wrapped in a group.
    fn fragment(&self) -> String {
        match self {
            Slot::VariableName => r"([A-Za-z0-9]+)".to_string(),
            Slot::Expression => r"([-+*/()A-Za-z0-9\s]+)".to_string(),
            Slot::IntegerLiteral => r"([0-9]+)".to_string(),
            Slot::Comparator => r"([<=>])".to_string(),
            Slot::Literal(text) => regex::escape(text),
            Slot::Rest => r"(.*)".to_string(),
        }
    }

    /// Whether the matched text becomes an argument of the statement.
    pub fn is_captured(&self) -> bool {
        !matches!(self, Slot::Literal(_))
    }

    /// Operator-like slots do not need whitespace around them: `X=1`, `A<B`.
    fn is_symbolic(&self) -> bool {
        match self {
            Slot::Comparator => true,
            Slot::Literal(text) => !text.chars().any(|c| c.is_ascii_alphanumeric()),
            _ => false,
        }
    }

    /// Semantic check run after the shape matched.
    ///
    /// `is_keyword` tells whether a word is a registered statement keyword.
    pub fn validate(&self, text: &str, is_keyword: &dyn Fn(&str) -> bool) -> Result<(), String> {
        match self {
            Slot::VariableName => {
                if !text.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    return Err(format!("variable name {text} must start with a letter"));
                }
                if is_keyword(text) {
                    return Err(format!("{text} is a reserved word"));
                }
                Ok(())
            }
            Slot::Expression => parse_expression(text)
                .map(|_| ())
                .map_err(|err| format!("bad expression {:?}: {err:?}", text.trim())),
            Slot::IntegerLiteral if text.parse::<LineNumber>().is_err() => {
                Err(format!("line number {text} is out of range"))
            }
            _ => Ok(()),
        }
    }
}

/// A compiled statement shape.
///
/// Slots are joined by mandatory whitespace, except next to operator-like
/// slots where whitespace is optional. Leading and trailing whitespace is
/// always allowed.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    captured: Vec<Slot>,
}

impl Pattern {
    pub fn compile(slots: &[Slot]) -> ExecResult<Self> {
        let mut source = String::from(r"^\s*");
        for (i, slot) in slots.iter().enumerate() {
            if i > 0 {
                let previous = &slots[i - 1];
                if previous.is_symbolic() || slot.is_symbolic() {
                    source.push_str(r"\s*");
                } else {
                    source.push_str(r"\s+");
                }
            }
            source.push_str(&slot.fragment());
        }
        source.push_str(r"\s*$");

        let regex = RegexBuilder::new(&source).build()?;
        Ok(Self {
            regex,
            captured: slots.iter().copied().filter(Slot::is_captured).collect(),
        })
    }

    /// Matches the whole text.
    ///
    /// On success returns the whole match followed by one string per captured
    /// slot, in pattern order.
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(text)?;
        Some(
            caps.iter()
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        )
    }

    /// Captured slots in the order their text appears in [`Pattern::captures`] (offset by one).
    pub fn captured_slots(&self) -> &[Slot] {
        &self.captured
    }
}
