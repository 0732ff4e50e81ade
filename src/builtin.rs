use crate::env::Value;
use crate::error::{BasicError, ExecResult};
use crate::grammar::Slot;
use crate::parser::evaluate;
use crate::program::LineNumber;
use crate::registry::{LineContext, Registry};
use crate::statement::{Flow, Session, Statement};
use std::io::ErrorKind;
use tracing::debug;

/// Statements known to the interpreter at compile time.
///
/// Each implementor declares its keyword, argument shape and where it may be
/// entered; [`register`] turns that declaration into a registry entry.
pub(crate) trait BuiltinStatement {
    /// Canonical keyword, e.g. "PRINT".
    const KEYWORD: &'static str;
    const CONTEXT: LineContext;

    fn slots() -> &'static [Slot];

    /// Executes one occurrence of the statement.
    fn execute(statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow>;
}

fn register<T: BuiltinStatement>(registry: &mut Registry) -> ExecResult<()> {
    registry.register(T::KEYWORD, T::slots(), T::execute, T::CONTEXT)
}

/// Adds every standard statement to `registry`.
pub(crate) fn register_all(registry: &mut Registry) -> ExecResult<()> {
    register::<Rem>(registry)?;
    register::<Let>(registry)?;
    register::<Print>(registry)?;
    register::<Input>(registry)?;
    register::<End>(registry)?;
    register::<Goto>(registry)?;
    register::<If>(registry)?;
    register::<Run>(registry)?;
    register::<List>(registry)?;
    register::<Clear>(registry)?;
    register::<Quit>(registry)?;
    register::<Help>(registry)?;
    Ok(())
}

fn line_target(text: &str) -> ExecResult<LineNumber> {
    text.parse()
        .map_err(|_| BasicError::syntax(format!("bad line number {text}")))
}

/// Comment; does nothing when run.
pub struct Rem;

impl BuiltinStatement for Rem {
    const KEYWORD: &'static str = "REM";
    const CONTEXT: LineContext = LineContext::ProgramOnly;

    fn slots() -> &'static [Slot] {
        &[Slot::Rest]
    }

    fn execute(_statement: &Statement, _session: &mut Session<'_>) -> ExecResult<Flow> {
        Ok(Flow::Continue)
    }
}

/// `LET var = expr`
pub struct Let;

impl BuiltinStatement for Let {
    const KEYWORD: &'static str = "LET";
    const CONTEXT: LineContext = LineContext::Either;

    fn slots() -> &'static [Slot] {
        &[Slot::VariableName, Slot::Literal("="), Slot::Expression]
    }

    fn execute(statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        let value = evaluate(statement.arg(2), session.env)?;
        session.env.set(statement.arg(1), value);
        Ok(Flow::Continue)
    }
}

/// `PRINT expr`, one value per line.
pub struct Print;

impl BuiltinStatement for Print {
    const KEYWORD: &'static str = "PRINT";
    const CONTEXT: LineContext = LineContext::Either;

    fn slots() -> &'static [Slot] {
        &[Slot::Expression]
    }

    fn execute(statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        let value = evaluate(statement.arg(1), session.env)?;
        writeln!(session.output, "{value}")?;
        Ok(Flow::Continue)
    }
}

/// `INPUT var`
///
/// Prompts with ` ? ` and keeps asking until the reply is an optionally
/// signed decimal integer.
pub struct Input;

impl Input {
    fn parse_reply(reply: &str) -> Option<Value> {
        let reply = reply.trim();
        let digits = reply.strip_prefix(['+', '-']).unwrap_or(reply);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        reply.parse().ok()
    }
}

impl BuiltinStatement for Input {
    const KEYWORD: &'static str = "INPUT";
    const CONTEXT: LineContext = LineContext::ProgramOnly;

    fn slots() -> &'static [Slot] {
        &[Slot::VariableName]
    }

    fn execute(statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        loop {
            writeln!(session.output, " ? ")?;
            session.output.flush()?;

            let mut reply = String::new();
            if session.input.read_line(&mut reply)? == 0 {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "input closed while waiting for a number",
                )
                .into());
            }

            match Self::parse_reply(&reply) {
                Some(value) => {
                    session.env.set(statement.arg(1), value);
                    return Ok(Flow::Continue);
                }
                None => {
                    debug!(reply = reply.trim_end(), "rejected INPUT reply");
                    writeln!(session.output, "INVALID NUMBER")?;
                }
            }
        }
    }
}

/// Stops the running program.
pub struct End;

impl BuiltinStatement for End {
    const KEYWORD: &'static str = "END";
    const CONTEXT: LineContext = LineContext::ProgramOnly;

    fn slots() -> &'static [Slot] {
        &[]
    }

    fn execute(_statement: &Statement, _session: &mut Session<'_>) -> ExecResult<Flow> {
        Ok(Flow::Halt)
    }
}

/// `GOTO line`
pub struct Goto;

impl BuiltinStatement for Goto {
    const KEYWORD: &'static str = "GOTO";
    const CONTEXT: LineContext = LineContext::ProgramOnly;

    fn slots() -> &'static [Slot] {
        &[Slot::IntegerLiteral]
    }

    fn execute(statement: &Statement, _session: &mut Session<'_>) -> ExecResult<Flow> {
        Ok(Flow::Jump(line_target(statement.arg(1))?))
    }
}

/// `IF expr cmp expr THEN line`, where cmp is one of `<`, `=`, `>`.
pub struct If;

impl BuiltinStatement for If {
    const KEYWORD: &'static str = "IF";
    const CONTEXT: LineContext = LineContext::ProgramOnly;

    fn slots() -> &'static [Slot] {
        &[
            Slot::Expression,
            Slot::Comparator,
            Slot::Expression,
            Slot::Literal("THEN"),
            Slot::IntegerLiteral,
        ]
    }

    fn execute(statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        let lhs = evaluate(statement.arg(1), session.env)?;
        let rhs = evaluate(statement.arg(3), session.env)?;
        let holds = match statement.arg(2) {
            "<" => lhs < rhs,
            "=" => lhs == rhs,
            ">" => lhs > rhs,
            other => return Err(BasicError::syntax(format!("unknown comparator {other}"))),
        };
        if holds {
            Ok(Flow::Jump(line_target(statement.arg(4))?))
        } else {
            Ok(Flow::Continue)
        }
    }
}

/// Runs the stored program from its first line.
pub struct Run;

impl BuiltinStatement for Run {
    const KEYWORD: &'static str = "RUN";
    const CONTEXT: LineContext = LineContext::DirectOnly;

    fn slots() -> &'static [Slot] {
        &[]
    }

    fn execute(_statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        crate::executor::run(session)?;
        Ok(Flow::Continue)
    }
}

/// Prints every stored line as it was typed.
pub struct List;

impl BuiltinStatement for List {
    const KEYWORD: &'static str = "LIST";
    const CONTEXT: LineContext = LineContext::DirectOnly;

    fn slots() -> &'static [Slot] {
        &[]
    }

    fn execute(_statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        for (_, text) in session.program.lines() {
            writeln!(session.output, "{text}")?;
        }
        Ok(Flow::Continue)
    }
}

/// Forgets the program and every variable.
pub struct Clear;

impl BuiltinStatement for Clear {
    const KEYWORD: &'static str = "CLEAR";
    const CONTEXT: LineContext = LineContext::DirectOnly;

    fn slots() -> &'static [Slot] {
        &[]
    }

    fn execute(_statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        session.program.clear();
        session.env.clear();
        Ok(Flow::Continue)
    }
}

/// Ends the session.
pub struct Quit;

impl BuiltinStatement for Quit {
    const KEYWORD: &'static str = "QUIT";
    const CONTEXT: LineContext = LineContext::DirectOnly;

    fn slots() -> &'static [Slot] {
        &[]
    }

    fn execute(_statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        session.env.should_exit = true;
        Ok(Flow::Halt)
    }
}

const HELP_TEXT: &str = "\
Enter a line number followed by a statement to store it in the program,
or a command without a line number to run it immediately.
A line number on its own deletes that line.

Statements:
  REM comment                   comment, ignored when run
  LET var = expr                assign a variable
  PRINT expr                    print the value of an expression
  INPUT var                     read an integer into a variable
  GOTO line                     continue at the given line
  IF expr op expr THEN line     jump when the comparison (<, =, >) holds
  END                           stop the program

Commands:
  RUN      run the stored program
  LIST     show the stored program
  CLEAR    delete the program and all variables
  HELP     show this message
  QUIT     leave the interpreter";

/// Prints a short usage summary.
pub struct Help;

impl BuiltinStatement for Help {
    const KEYWORD: &'static str = "HELP";
    const CONTEXT: LineContext = LineContext::DirectOnly;

    fn slots() -> &'static [Slot] {
        &[]
    }

    fn execute(_statement: &Statement, session: &mut Session<'_>) -> ExecResult<Flow> {
        writeln!(session.output, "{HELP_TEXT}")?;
        Ok(Flow::Continue)
    }
}
