use crate::error::{BasicError, ExecResult};
use crate::program::{LineNumber, Program};
use crate::statement::{Flow, Session};
use tracing::{debug, trace};

/// Position of the executor within the stored program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not running.
    Idle,
    /// About to execute this line.
    Running(LineNumber),
}

impl RunState {
    /// The state a fresh run starts in.
    pub fn start(program: &Program) -> Self {
        program.first_line().map_or(RunState::Idle, RunState::Running)
    }

    /// Where to go after the line at `current` reported `flow`.
    ///
    /// Jumps must land on a stored line. Advancing requires `current` to still
    /// be stored, since its successor is looked up from it.
    pub fn next(program: &Program, current: LineNumber, flow: Flow) -> ExecResult<Self> {
        match flow {
            Flow::Halt => Ok(RunState::Idle),
            Flow::Jump(target) if program.contains(target) => Ok(RunState::Running(target)),
            Flow::Jump(target) => Err(BasicError::LineReference(target)),
            Flow::Continue => Ok(program
                .line_after(current)?
                .map_or(RunState::Idle, RunState::Running)),
        }
    }
}

/// Runs `session.program` from its smallest line until it halts or runs off
/// the end.
///
/// Any error aborts the run. Calling `run` again, even from inside a running
/// program, starts over from the top.
pub fn run(session: &mut Session<'_>) -> ExecResult<()> {
    let mut state = RunState::start(session.program);
    debug!(?state, lines = session.program.len(), "run started");

    while let RunState::Running(line) = state {
        let statement = session
            .program
            .parsed_statement(line)
            .ok_or(BasicError::LineReference(line))?;
        trace!(line, keyword = statement.keyword(), "executing");

        let flow = statement.execute(session).inspect_err(|err| {
            debug!(line, %err, "run aborted");
        })?;
        if let Flow::Jump(target) = flow {
            debug!(from = line, to = target, "jump");
        }
        state = RunState::next(session.program, line, flow).inspect_err(|err| {
            debug!(line, %err, "run aborted");
        })?;
    }
    debug!("run finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::registry::Registry;
    use std::io::Cursor;

    fn load(registry: &Registry, lines: &[&str]) -> Program {
        let mut program = Program::new();
        for line in lines {
            let (number, rest) = line.split_once(' ').unwrap();
            let number: LineNumber = number.parse().unwrap();
            let (keyword, remainder) = rest.split_at(rest.find(' ').unwrap_or(rest.len()));
            let statement = registry.parse(Some(number), keyword, remainder).unwrap();
            program.add_source_line(number, *line);
            program.set_parsed_statement(number, statement);
        }
        program
    }

    fn run_program(program: &mut Program, env: &mut Environment) -> (ExecResult<()>, String) {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let result = run(&mut Session {
            env,
            program,
            input: &mut input,
            output: &mut output,
        });
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_straight_line_program() {
        let registry = Registry::standard().unwrap();
        let mut program = load(&registry, &["10 LET X=1", "20 PRINT X", "30 END"]);
        let mut env = Environment::new();

        let (result, out) = run_program(&mut program, &mut env);
        assert!(result.is_ok());
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_conditional_loop() {
        let registry = Registry::standard().unwrap();
        let mut program = load(
            &registry,
            &[
                "10 LET X=0",
                "20 LET X=X+1",
                "30 PRINT X",
                "40 IF X<3 THEN 20",
                "50 END",
            ],
        );
        let mut env = Environment::new();

        let (result, out) = run_program(&mut program, &mut env);
        assert!(result.is_ok());
        assert_eq!(out, "1\n2\n3\n");
    }

    #[test]
    fn test_end_stops_before_later_lines() {
        let registry = Registry::standard().unwrap();
        let mut program = load(&registry, &["10 PRINT 1", "20 END", "30 PRINT 2"]);
        let (result, out) = run_program(&mut program, &mut Environment::new());
        assert!(result.is_ok());
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_goto_skips_lines() {
        let registry = Registry::standard().unwrap();
        let mut program = load(&registry, &["10 GOTO 30", "20 PRINT 1", "30 PRINT 2"]);
        let (result, out) = run_program(&mut program, &mut Environment::new());
        assert!(result.is_ok());
        assert_eq!(out, "2\n");
    }

    #[test]
    fn test_jump_to_missing_line_aborts() {
        let registry = Registry::standard().unwrap();
        let mut program = load(&registry, &["10 PRINT 1", "20 GOTO 999", "30 PRINT 2"]);
        let (result, out) = run_program(&mut program, &mut Environment::new());
        assert!(matches!(result, Err(BasicError::LineReference(999))));
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_empty_program_is_idle_immediately() {
        let mut program = Program::new();
        assert_eq!(RunState::start(&program), RunState::Idle);
        let (result, out) = run_program(&mut program, &mut Environment::new());
        assert!(result.is_ok());
        assert!(out.is_empty());
    }

    #[test]
    fn test_evaluation_error_aborts_run() {
        let registry = Registry::standard().unwrap();
        let mut program = load(&registry, &["10 PRINT 1", "20 PRINT Y", "30 PRINT 3"]);
        let (result, out) = run_program(&mut program, &mut Environment::new());
        assert!(matches!(result, Err(BasicError::UndefinedVariable(_))));
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_transitions() {
        let registry = Registry::standard().unwrap();
        let program = load(&registry, &["10 REM a", "20 REM b"]);

        assert_eq!(RunState::start(&program), RunState::Running(10));
        assert_eq!(
            RunState::next(&program, 10, Flow::Continue).unwrap(),
            RunState::Running(20)
        );
        assert_eq!(
            RunState::next(&program, 20, Flow::Continue).unwrap(),
            RunState::Idle
        );
        assert_eq!(
            RunState::next(&program, 20, Flow::Jump(10)).unwrap(),
            RunState::Running(10)
        );
        assert_eq!(
            RunState::next(&program, 10, Flow::Halt).unwrap(),
            RunState::Idle
        );
        assert!(matches!(
            RunState::next(&program, 15, Flow::Continue),
            Err(BasicError::LineReference(15))
        ));
    }

    #[test]
    fn test_rerun_starts_from_the_top() {
        let registry = Registry::standard().unwrap();
        let mut program = load(&registry, &["10 PRINT 5", "20 END"]);
        let mut env = Environment::new();
        let (_, first) = run_program(&mut program, &mut env);
        let (_, second) = run_program(&mut program, &mut env);
        assert_eq!(first, "5\n");
        assert_eq!(second, first);
    }
}
