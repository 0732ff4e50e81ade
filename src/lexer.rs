//! Lexical analysis (tokenization) of integer expressions.

use crate::env::Value;
use crate::error::BasicError;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An unsigned integer literal.
    Number(Value),
    /// A variable name: a letter followed by letters or digits.
    Name(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
}

/// Errors that can occur during the lexical analysis process.
#[derive(Debug, PartialEq, Eq)]
pub enum LexingError {
    /// A character that cannot start or continue any token.
    UnexpectedChar(char),
    /// A literal that does not fit into [`Value`].
    NumberTooLarge(String),
}

impl From<LexingError> for BasicError {
    fn from(err: LexingError) -> Self {
        match err {
            LexingError::UnexpectedChar(c) => {
                BasicError::ExpressionSyntax(format!("unexpected character {c:?}"))
            }
            LexingError::NumberTooLarge(digits) => {
                BasicError::ExpressionSyntax(format!("number {digits} is too large"))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingNumber,
    ReadingName,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
}

impl LexingFSM {
    fn new(text: &str) -> Self {
        LexingFSM {
            input: text.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    /// Runs the machine over the whole input.
    ///
    /// Numbers and names are accumulated in `buffer`; any other character either
    /// is whitespace, a single-character operator, or an error.
    fn make_tokens(&mut self) -> Result<Vec<Token>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out)?,
                LexingState::ReadingNumber => self.handle_number(ch, &mut out)?,
                LexingState::ReadingName => self.handle_name(ch, &mut out)?,
            }
        }

        self.finalize_buffer(&mut out)?;
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        match ch {
            c if c.is_whitespace() => {}
            c if c.is_ascii_digit() => {
                self.buffer.push(c);
                self.state = LexingState::ReadingNumber;
            }
            c if c.is_ascii_alphabetic() => {
                self.buffer.push(c);
                self.state = LexingState::ReadingName;
            }
            c => out.push(Self::symbol(c)?),
        }
        Ok(())
    }

    fn handle_number(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        match ch {
            c if c.is_ascii_digit() => self.buffer.push(c),
            // `2X` is not a product in this dialect
            c if c.is_ascii_alphabetic() => return Err(LexingError::UnexpectedChar(c)),
            c => {
                self.finalize_buffer(out)?;
                self.handle_start(c, out)?;
            }
        }
        Ok(())
    }

    fn handle_name(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        match ch {
            c if c.is_ascii_alphanumeric() => self.buffer.push(c),
            c => {
                self.finalize_buffer(out)?;
                self.handle_start(c, out)?;
            }
        }
        Ok(())
    }

    fn symbol(ch: char) -> Result<Token, LexingError> {
        Ok(match ch {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            c => return Err(LexingError::UnexpectedChar(c)),
        })
    }

    /// Turns the pending buffer into a token and returns to `Start`.
    fn finalize_buffer(&mut self, out: &mut Vec<Token>) -> Result<(), LexingError> {
        let text = std::mem::take(&mut self.buffer);
        match self.state {
            LexingState::ReadingNumber => {
                let value = text
                    .parse::<Value>()
                    .map_err(|_| LexingError::NumberTooLarge(text.clone()))?;
                out.push(Token::Number(value));
            }
            LexingState::ReadingName => out.push(Token::Name(text)),
            LexingState::Start => {}
        }
        self.state = LexingState::Start;
        Ok(())
    }
}

/// The main entry point function to perform lexical analysis of an expression.
///
/// Returns the tokens in source order, or a `LexingError` on the first
/// character that does not belong to the expression language.
pub fn split_into_tokens(text: &str) -> Result<Vec<Token>, LexingError> {
    let mut lexer = LexingFSM::new(text);
    lexer.make_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Token {
        Token::Name(s.to_string())
    }

    #[test]
    fn test_tokens_without_spaces() {
        let tokens = split_into_tokens("X1+20*(Y-3)/B").unwrap();
        assert_eq!(
            tokens,
            vec![
                name("X1"),
                Token::Plus,
                Token::Number(20),
                Token::Star,
                Token::LeftParen,
                name("Y"),
                Token::Minus,
                Token::Number(3),
                Token::RightParen,
                Token::Slash,
                name("B"),
            ]
        );
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        assert_eq!(
            split_into_tokens("  A  +\t7 ").unwrap(),
            split_into_tokens("A+7").unwrap()
        );
        assert!(split_into_tokens("   ").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_unknown_characters() {
        assert_eq!(
            split_into_tokens("A % 2"),
            Err(LexingError::UnexpectedChar('%'))
        );
        assert_eq!(split_into_tokens("2X"), Err(LexingError::UnexpectedChar('X')));
    }

    #[test]
    fn test_number_overflow_is_reported() {
        let err = split_into_tokens("99999999999999999999").unwrap_err();
        assert!(matches!(err, LexingError::NumberTooLarge(_)));
    }
}
