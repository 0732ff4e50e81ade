use crate::error::{BasicError, ExecResult};
use crate::statement::Statement;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::rc::Rc;

/// Label of a stored program line.
pub type LineNumber = u32;

/// The lines of a stored BASIC program.
///
/// Each line number maps to two components kept in ascending order:
///
/// 1. The source line, the complete text the user entered (including the
///    line number), used by `LIST`.
/// 2. The parsed [`Statement`], used by `RUN`.
#[derive(Debug, Default)]
pub struct Program {
    source_lines: BTreeMap<LineNumber, String>,
    parsed_statements: BTreeMap<LineNumber, Rc<Statement>>,
}

impl Program {
    /// Constructs an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all lines from the program.
    pub fn clear(&mut self) {
        self.source_lines.clear();
        self.parsed_statements.clear();
    }

    /// Stores the source text for a line, replacing any previous text.
    pub fn add_source_line(&mut self, line_number: LineNumber, line: impl Into<String>) {
        self.source_lines.insert(line_number, line.into());
    }

    /// Stores the parsed form for a line, dropping any previous parsed form.
    pub fn set_parsed_statement(&mut self, line_number: LineNumber, statement: Statement) {
        self.parsed_statements.insert(line_number, Rc::new(statement));
    }

    /// Removes both the text and the parsed form of a line.
    ///
    /// Removing a line that does not exist does nothing.
    pub fn remove_line(&mut self, line_number: LineNumber) {
        self.source_lines.remove(&line_number);
        self.parsed_statements.remove(&line_number);
    }

    pub fn source_line(&self, line_number: LineNumber) -> Option<&str> {
        self.source_lines.get(&line_number).map(String::as_str)
    }

    /// The parsed statement for a line.
    ///
    /// Returned as a shared handle so the executor can run it while the
    /// statement itself is free to mutate the program.
    pub fn parsed_statement(&self, line_number: LineNumber) -> Option<Rc<Statement>> {
        self.parsed_statements.get(&line_number).cloned()
    }

    /// Whether the line can be executed.
    pub fn contains(&self, line_number: LineNumber) -> bool {
        self.parsed_statements.contains_key(&line_number)
    }

    /// Smallest executable line number.
    pub fn first_line(&self) -> Option<LineNumber> {
        self.parsed_statements.keys().next().copied()
    }

    /// Next executable line after `line_number`, which must itself still be stored.
    ///
    /// `Ok(None)` means the program has run off its end.
    pub fn line_after(&self, line_number: LineNumber) -> ExecResult<Option<LineNumber>> {
        if !self.contains(line_number) {
            return Err(BasicError::LineReference(line_number));
        }
        Ok(self
            .parsed_statements
            .range((Excluded(line_number), Unbounded))
            .next()
            .map(|(number, _)| *number))
    }

    /// Iterates over `(line number, source text)` in ascending order.
    pub fn lines(&self) -> impl Iterator<Item = (LineNumber, &str)> + '_ {
        self.source_lines
            .iter()
            .map(|(number, text)| (*number, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.source_lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_lines.is_empty()
    }
}
