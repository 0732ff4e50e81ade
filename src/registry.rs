use crate::error::{BasicError, ExecResult};
use crate::grammar::{Pattern, Slot};
use crate::program::LineNumber;
use crate::statement::{Flow, Handler, Session, Statement};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Where a statement may be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineContext {
    /// Only as an immediate command, without a line number.
    DirectOnly,
    /// Only as a numbered program line.
    ProgramOnly,
    /// Either way.
    Either,
}

impl LineContext {
    fn allows(self, line_number: Option<LineNumber>) -> bool {
        match self {
            LineContext::DirectOnly => line_number.is_none(),
            LineContext::ProgramOnly => line_number.is_some(),
            LineContext::Either => true,
        }
    }
}

/// Grammar and behaviour of one keyword.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pattern: Pattern,
    handler: Handler,
    context: LineContext,
}

/// Table of every known statement keyword.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    descriptors: HashMap<String, Descriptor>,
}

impl Registry {
    /// An empty registry with no keywords.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the standard statement set.
    pub fn standard() -> ExecResult<Self> {
        let mut registry = Self::new();
        crate::builtin::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Adds a keyword. Fails if it is already registered.
    pub fn register(
        &mut self,
        keyword: &str,
        slots: &[Slot],
        handler: Handler,
        context: LineContext,
    ) -> ExecResult<()> {
        if self.descriptors.contains_key(keyword) {
            return Err(BasicError::DuplicateKeyword(keyword.to_string()));
        }
        let pattern = Pattern::compile(slots)?;
        trace!(keyword, ?slots, ?context, "registered statement");
        self.descriptors.insert(
            keyword.to_string(),
            Descriptor {
                pattern,
                handler,
                context,
            },
        );
        Ok(())
    }

    pub fn resolve(&self, keyword: &str) -> ExecResult<&Descriptor> {
        self.descriptors
            .get(keyword)
            .ok_or_else(|| BasicError::UnknownCommand(keyword.to_string()))
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.descriptors.contains_key(word)
    }

    /// Registered keywords in alphabetical order.
    pub fn keywords(&self) -> Vec<&str> {
        let mut keywords: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        keywords.sort_unstable();
        keywords
    }

    /// Checks the line context, matches `remainder` against the keyword's
    /// pattern and validates every captured slot.
    pub fn parse(
        &self,
        line_number: Option<LineNumber>,
        keyword: &str,
        remainder: &str,
    ) -> ExecResult<Statement> {
        let descriptor = self.resolve(keyword)?;
        if !descriptor.context.allows(line_number) {
            return Err(BasicError::syntax(match descriptor.context {
                LineContext::DirectOnly => format!("{keyword} cannot be used in a program"),
                _ => format!("{keyword} needs a line number"),
            }));
        }

        let args = descriptor
            .pattern
            .captures(remainder)
            .ok_or_else(|| BasicError::syntax(format!("malformed {keyword} statement")))?;

        let is_keyword = |word: &str| self.is_keyword(word);
        for (slot, text) in descriptor.pattern.captured_slots().iter().zip(&args[1..]) {
            slot.validate(text, &is_keyword).map_err(BasicError::Syntax)?;
        }

        debug!(keyword, ?args, "parsed statement");
        Ok(Statement::new(keyword, args, descriptor.handler))
    }

    /// Parses a statement and then either runs it right away (no line number)
    /// or stores it in the program under its line number.
    ///
    /// Returns the flow reported by an immediately executed statement, and
    /// [`Flow::Continue`] for a stored one.
    pub fn evaluate(
        &self,
        line_number: Option<LineNumber>,
        keyword: &str,
        remainder: &str,
        session: &mut Session<'_>,
    ) -> ExecResult<Flow> {
        let statement = self.parse(line_number, keyword, remainder)?;
        match line_number {
            None => statement.execute(session),
            Some(number) => {
                session.program.set_parsed_statement(number, statement);
                Ok(Flow::Continue)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::program::Program;
    use std::io::Cursor;

    fn noop(_: &Statement, _: &mut Session<'_>) -> ExecResult<Flow> {
        Ok(Flow::Continue)
    }

    fn registry() -> Registry {
        Registry::standard().unwrap()
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = Registry::new();
        registry
            .register("NOP", &[], noop, LineContext::Either)
            .unwrap();
        assert!(matches!(
            registry.register("NOP", &[Slot::Rest], noop, LineContext::Either),
            Err(BasicError::DuplicateKeyword(k)) if k == "NOP"
        ));
    }

    #[test]
    fn test_unknown_keyword() {
        assert!(matches!(
            registry().resolve("GOSUB"),
            Err(BasicError::UnknownCommand(k)) if k == "GOSUB"
        ));
    }

    #[test]
    fn test_line_context_is_enforced() {
        let registry = registry();
        assert!(matches!(
            registry.parse(Some(10), "RUN", ""),
            Err(BasicError::Syntax(_))
        ));
        assert!(matches!(
            registry.parse(None, "GOTO", " 10"),
            Err(BasicError::Syntax(_))
        ));
        assert!(registry.parse(None, "PRINT", " 1").is_ok());
        assert!(registry.parse(Some(10), "PRINT", " 1").is_ok());
    }

    #[test]
    fn test_reserved_word_cannot_be_variable() {
        let registry = registry();
        assert!(matches!(
            registry.parse(None, "LET", " LET=5"),
            Err(BasicError::Syntax(_))
        ));
        assert!(matches!(
            registry.parse(Some(10), "INPUT", " PRINT"),
            Err(BasicError::Syntax(_))
        ));
        assert!(registry.parse(None, "LET", " LETTER=5").is_ok());
    }

    #[test]
    fn test_parse_captures_args_in_pattern_order() {
        let statement = registry().parse(Some(40), "IF", " X < 3 THEN 20").unwrap();
        assert_eq!(statement.keyword(), "IF");
        assert_eq!(statement.arg(0), " X < 3 THEN 20");
        assert_eq!(statement.arg(1).trim(), "X");
        assert_eq!(statement.arg(2), "<");
        assert_eq!(statement.arg(3).trim(), "3");
        assert_eq!(statement.arg(4), "20");
    }

    #[test]
    fn test_evaluate_direct_runs_deferred_stores() {
        let registry = registry();
        let mut env = Environment::new();
        let mut program = Program::new();
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let mut session = Session {
            env: &mut env,
            program: &mut program,
            input: &mut input,
            output: &mut output,
        };

        registry
            .evaluate(None, "PRINT", " 2+2", &mut session)
            .unwrap();
        assert!(session.program.is_empty());
        assert_eq!(session.program.first_line(), None);

        registry
            .evaluate(Some(10), "PRINT", " 7", &mut session)
            .unwrap();
        assert!(session.program.contains(10));

        assert_eq!(String::from_utf8(output).unwrap(), "4\n");
    }

    #[test]
    fn test_malformed_statements_are_syntax_errors() {
        let registry = registry();
        for (keyword, text) in [
            ("LET", " X"),
            ("LET", " X 1"),
            ("GOTO", " TEN"),
            ("IF", " X <> 3 THEN 10"),
            ("END", " NOW"),
            ("PRINT", ""),
        ] {
            assert!(
                matches!(registry.parse(Some(10), keyword, text), Err(BasicError::Syntax(_))),
                "{keyword}{text} should be rejected"
            );
        }
    }
}
