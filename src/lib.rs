//! A small line-numbered BASIC interpreter.
//!
//! Input lines are either numbered program lines, which are parsed and stored,
//! or unnumbered commands, which run immediately. Every statement keyword is
//! declared in a [`Registry`] as a sequence of typed grammar slots plus a
//! handler; matching a line against those slots yields a [`Statement`] that can
//! be executed any number of times. `RUN` walks the stored [`Program`] through
//! [`RunState`] transitions, following the jumps and halts statements report.
//!
//! The main entry point is [`Interpreter`], which owns the statement table,
//! the program and the variables of one session.

mod builtin;
pub mod env;
pub mod error;
pub mod executor;
pub mod grammar;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod registry;
pub mod statement;

pub use error::{BasicError, ExecResult};
pub use executor::RunState;
pub use interpreter::{ClassifiedLine, Interpreter, ReplConfig, classify};
pub use program::{LineNumber, Program};
pub use registry::{LineContext, Registry};
pub use statement::{Flow, Session, Statement};
