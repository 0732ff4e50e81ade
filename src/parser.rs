use crate::env::{Environment, Value};
use crate::error::{BasicError, ExecResult};
use crate::lexer::{self, Token};

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// AST node of an integer expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// An integer literal.
    Constant(Value),
    /// A reference to a variable, resolved against the [`Environment`] at evaluation time.
    Variable(String),
    /// Unary minus.
    Negate(Box<Expr>),
    /// A **binary operation**; both operands are evaluated left to right.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Computes the value of the expression.
    ///
    /// Fails on undefined variables, division by zero and overflow of [`Value`].
    pub fn eval(&self, env: &Environment) -> ExecResult<Value> {
        match self {
            Expr::Constant(value) => Ok(*value),
            Expr::Variable(name) => env.get(name),
            Expr::Negate(inner) => inner.eval(env)?.checked_neg().ok_or(BasicError::Overflow),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.eval(env)?;
                let rhs = rhs.eval(env)?;
                let result = match op {
                    BinaryOp::Add => lhs.checked_add(rhs),
                    BinaryOp::Sub => lhs.checked_sub(rhs),
                    BinaryOp::Mul => lhs.checked_mul(rhs),
                    BinaryOp::Div => {
                        if rhs == 0 {
                            return Err(BasicError::DivisionByZero);
                        }
                        lhs.checked_div(rhs)
                    }
                };
                result.ok_or(BasicError::Overflow)
            }
        }
    }
}

/// Deepest expression tree the parser builds.
///
/// Parsing, evaluation and dropping all recurse once per level of the tree.
pub const MAX_DEPTH: usize = 256;

/// Errors that can occur while building the expression tree.
#[derive(Debug, PartialEq, Eq)]
pub enum ParsingError {
    /// Encountered a token that was not expected at the current position.
    UnexpectedToken(Token),
    /// Reached the end of the token stream prematurely.
    UnexpectedEnd,
    /// Parentheses, signs or operator chains nest deeper than [`MAX_DEPTH`].
    TooDeep,
}

impl From<ParsingError> for BasicError {
    fn from(err: ParsingError) -> Self {
        match err {
            ParsingError::UnexpectedToken(token) => {
                BasicError::ExpressionSyntax(format!("unexpected token {token:?}"))
            }
            ParsingError::UnexpectedEnd => {
                BasicError::ExpressionSyntax("unexpected end of expression".to_string())
            }
            ParsingError::TooDeep => BasicError::ExpressionSyntax(format!(
                "expression nests deeper than {MAX_DEPTH} levels"
            )),
        }
    }
}

/// A subtree together with its height.
type Parsed = (Expr, usize);

struct ExprBuilder {
    tokens: Vec<Token>,
    pos: usize,
    /// Open parentheses and signs on the current parse path.
    nesting: usize,
}

impl ExprBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        ExprBuilder {
            tokens,
            pos: 0,
            nesting: 0,
        }
    }

    fn build_ast(mut self) -> Result<Expr, ParsingError> {
        let (ast, _) = self.parse_sum()?;

        // Ensure we consumed all tokens
        if let Some(token) = self.consume() {
            return Err(ParsingError::UnexpectedToken(token));
        }

        Ok(ast)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParsingError> {
        match self.consume() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(ParsingError::UnexpectedToken(token)),
            None => Err(ParsingError::UnexpectedEnd),
        }
    }

    fn enter(&mut self) -> Result<(), ParsingError> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(ParsingError::TooDeep);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    fn binary(
        op: BinaryOp,
        (lhs, lhs_height): Parsed,
        (rhs, rhs_height): Parsed,
    ) -> Result<Parsed, ParsingError> {
        let height = lhs_height.max(rhs_height) + 1;
        if height > MAX_DEPTH {
            return Err(ParsingError::TooDeep);
        }
        let node = Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
        Ok((node, height))
    }

    /// Parse a sum: product (('+' | '-') product)*
    fn parse_sum(&mut self) -> Result<Parsed, ParsingError> {
        let mut lhs = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.consume();
            let rhs = self.parse_product()?;
            lhs = Self::binary(op, lhs, rhs)?;
        }
    }

    /// Parse a product: unary (('*' | '/') unary)*
    fn parse_product(&mut self) -> Result<Parsed, ParsingError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.consume();
            let rhs = self.parse_unary()?;
            lhs = Self::binary(op, lhs, rhs)?;
        }
    }

    /// Parse a unary: ('-' | '+') unary | primary
    fn parse_unary(&mut self) -> Result<Parsed, ParsingError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                self.enter()?;
                let (inner, height) = self.parse_unary()?;
                self.leave();
                Ok((Expr::Negate(Box::new(inner)), height + 1))
            }
            Some(Token::Plus) => {
                self.consume();
                self.enter()?;
                let inner = self.parse_unary()?;
                self.leave();
                Ok(inner)
            }
            _ => self.parse_primary(),
        }
    }

    /// Parse a primary: number | name | '(' sum ')'
    fn parse_primary(&mut self) -> Result<Parsed, ParsingError> {
        match self.consume() {
            Some(Token::Number(value)) => Ok((Expr::Constant(value), 1)),
            Some(Token::Name(name)) => Ok((Expr::Variable(name), 1)),
            Some(Token::LeftParen) => {
                self.enter()?;
                let inner = self.parse_sum()?;
                self.expect(Token::RightParen)?;
                self.leave();
                Ok(inner)
            }
            Some(token) => Err(ParsingError::UnexpectedToken(token)),
            None => Err(ParsingError::UnexpectedEnd),
        }
    }
}

/// Parses expression text into an [`Expr`] tree.
pub fn parse_expression(text: &str) -> ExecResult<Expr> {
    let tokens = lexer::split_into_tokens(text)?;
    Ok(ExprBuilder::from(tokens).build_ast()?)
}

/// Evaluates expression text against the environment.
///
/// This is the single entry point statements use for arithmetic.
pub fn evaluate(text: &str, env: &Environment) -> ExecResult<Value> {
    parse_expression(text)?.eval(env)
}
