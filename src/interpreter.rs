use crate::env::Environment;
use crate::error::{BasicError, ExecResult};
use crate::program::{LineNumber, Program};
use crate::registry::Registry;
use crate::statement::Session;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

/// A raw input line split into its three parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    /// Leading line number, present for program lines.
    pub line_number: Option<LineNumber>,
    /// Run of uppercase letters following the line number.
    pub keyword: Option<&'a str>,
    /// Everything after the keyword, untouched.
    pub remainder: &'a str,
}

/// Splits `line` into optional line number, optional keyword and remainder.
///
/// Whitespace between the line number and the keyword is skipped; the
/// remainder keeps its leading whitespace.
pub fn classify(line: &str) -> ExecResult<ClassifiedLine<'_>> {
    let line = line.trim_start();
    let digits_end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    let (digits, rest) = line.split_at(digits_end);

    let line_number = if digits.is_empty() {
        None
    } else {
        let number = digits
            .parse::<LineNumber>()
            .map_err(|_| BasicError::syntax(format!("line number {digits} is out of range")))?;
        Some(number)
    };

    let rest = rest.trim_start();
    let keyword_end = rest
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(rest.len());
    let (keyword, remainder) = rest.split_at(keyword_end);

    Ok(ClassifiedLine {
        line_number,
        keyword: (!keyword.is_empty()).then_some(keyword),
        remainder,
    })
}

/// Settings of the interactive loop.
#[derive(Debug, Clone, Default)]
pub struct ReplConfig {
    /// Text shown before each input line.
    pub prompt: String,
    /// File to load line-editing history from and save it to.
    pub history: Option<PathBuf>,
}

/// A BASIC session: the statement table, the stored program and the variables.
///
/// Example
/// ```
/// use minibasic::Interpreter;
/// let mut basic = Interpreter::with_standard_statements().unwrap();
/// let mut input = std::io::Cursor::new(Vec::new());
/// let mut output = Vec::new();
/// basic.process_line("PRINT 2+2", &mut input, &mut output).unwrap();
/// assert_eq!(output, b"4\n");
/// ```
pub struct Interpreter {
    registry: Registry,
    program: Program,
    env: Environment,
}

impl Interpreter {
    /// Create an interpreter with a custom statement table.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            program: Program::new(),
            env: Environment::new(),
        }
    }

    /// Create an interpreter that knows the standard statements.
    pub fn with_standard_statements() -> ExecResult<Self> {
        Ok(Self::new(Registry::standard()?))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Whether `QUIT` was executed.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Handles one input line.
    ///
    /// Numbered lines are parsed and stored (a bare number deletes the line);
    /// other lines run immediately. A line that fails to parse leaves the
    /// program unchanged.
    pub fn process_line(
        &mut self,
        line: &str,
        input: &mut dyn BufRead,
        output: &mut dyn Write,
    ) -> ExecResult<()> {
        let classified = classify(line)?;
        let Some(keyword) = classified.keyword else {
            return match classified.line_number {
                Some(number) if classified.remainder.trim().is_empty() => {
                    debug!(line = number, "removing line");
                    self.program.remove_line(number);
                    Ok(())
                }
                None if classified.remainder.trim().is_empty() => Ok(()),
                _ => Err(BasicError::syntax("missing keyword")),
            };
        };

        let mut session = Session {
            env: &mut self.env,
            program: &mut self.program,
            input,
            output,
        };
        self.registry.evaluate(
            classified.line_number,
            keyword,
            classified.remainder,
            &mut session,
        )?;

        if let Some(number) = classified.line_number {
            self.program.add_source_line(number, line);
        }
        Ok(())
    }

    /// Like [`Interpreter::process_line`], but recoverable errors are printed
    /// to `output` instead of being returned.
    pub fn handle_line(
        &mut self,
        line: &str,
        input: &mut dyn BufRead,
        output: &mut dyn Write,
    ) -> ExecResult<()> {
        match self.process_line(line, input, output) {
            Err(err) if err.is_recoverable() => {
                debug!(line, ?err, "command failed");
                writeln!(output, "{err}")?;
                Ok(())
            }
            result => result,
        }
    }

    /// Reads lines from `input` until it is exhausted or `QUIT` runs.
    ///
    /// `INPUT` statements read from the same stream.
    pub fn run_script(&mut self, input: &mut dyn BufRead, output: &mut dyn Write) -> ExecResult<()> {
        let mut line = String::new();
        while !self.should_exit() {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let text = line.trim_end_matches(['\n', '\r']);
            self.handle_line(text, input, output)?;
            output.flush()?;
        }
        Ok(())
    }

    /// Interactive loop with line editing and history.
    pub fn repl(&mut self, config: &ReplConfig) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        if let Some(path) = &config.history {
            if let Err(err) = rl.load_history(path) {
                debug!(path = %path.display(), %err, "no history loaded");
            }
        }

        while !self.should_exit() {
            match rl.readline(&config.prompt) {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    let mut input = std::io::stdin().lock();
                    let mut output = std::io::stdout();
                    self.handle_line(&line, &mut input, &mut output)?;
                    output.flush()?;
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(path) = &config.history {
            if let Err(err) = rl.save_history(path) {
                warn!(path = %path.display(), %err, "failed to save history");
            }
        }
        Ok(())
    }
}
