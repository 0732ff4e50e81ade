use crate::env::Environment;
use crate::error::ExecResult;
use crate::program::{LineNumber, Program};
use std::fmt;
use std::io::{BufRead, Write};

/// What the executor should do after a statement finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advance to the next stored line.
    Continue,
    /// Continue at the given line instead of advancing.
    Jump(LineNumber),
    /// Stop the run.
    Halt,
}

/// Everything a statement may read or change while it executes.
pub struct Session<'a> {
    pub env: &'a mut Environment,
    pub program: &'a mut Program,
    /// Console input, read by `INPUT`.
    pub input: &'a mut dyn BufRead,
    /// Console output.
    pub output: &'a mut dyn Write,
}

/// Signature of a statement implementation.
pub type Handler = fn(&Statement, &mut Session<'_>) -> ExecResult<Flow>;

/// One validated occurrence of a command.
///
/// Argument 0 is the whole text matched by the statement's pattern, arguments
/// 1.. are the captured slots in pattern order. A statement never changes
/// after parsing and may be executed any number of times.
#[derive(Clone)]
pub struct Statement {
    keyword: String,
    args: Vec<String>,
    handler: Handler,
}

impl Statement {
    pub(crate) fn new(keyword: impl Into<String>, args: Vec<String>, handler: Handler) -> Self {
        Self {
            keyword: keyword.into(),
            args,
            handler,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Captured text of slot `index`, or an empty string when absent.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map_or("", String::as_str)
    }

    /// Runs the statement's handler.
    pub fn execute(&self, session: &mut Session<'_>) -> ExecResult<Flow> {
        (self.handler)(self, session)
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("keyword", &self.keyword)
            .field("args", &self.args)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn jump_to_forty(_: &Statement, _: &mut Session<'_>) -> ExecResult<Flow> {
        Ok(Flow::Jump(40))
    }

    fn store_arg(statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        session.env.set(statement.arg(1), 1);
        Ok(Flow::Continue)
    }

    #[test]
    fn test_execute_invokes_handler_each_time() {
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

        let statement = Statement::new("GOTO", vec!["40".into(), "40".into()], jump_to_forty);
        assert_eq!(statement.execute(&mut session).unwrap(), Flow::Jump(40));
        assert_eq!(statement.execute(&mut session).unwrap(), Flow::Jump(40));

        let statement = Statement::new("SET", vec!["A".into(), "A".into()], store_arg);
        assert_eq!(statement.execute(&mut session).unwrap(), Flow::Continue);
        assert_eq!(env.get("A").unwrap(), 1);
    }

    #[test]
    fn test_missing_argument_reads_as_empty() {
        let statement = Statement::new("END", vec![String::new()], jump_to_forty);
        assert_eq!(statement.keyword(), "END");
        assert_eq!(statement.args().len(), 1);
        assert_eq!(statement.arg(3), "");
    }
}
