use std::iter::Peekable;
use std::str::Chars;

use crate::error::ParseError;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Word(String),
    Pipe,
    Redirect(RedirectOp, String),
    Background,
    EOF,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum RedirectOp {
    Input,  // <
    Output, // >
    Append, // >>
}

pub fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t'
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        if self.peek_char().is_none() {
            return Ok(Token::EOF);
        }
        let raw = self.read_word()?;
        classify(raw)
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !is_separator(c) {
                break;
            }
            self.read_char();
        }
    }

    // Quotes only keep separators inside one token; they stay in the raw text.
    fn read_word(&mut self) -> Result<String, ParseError> {
        let mut word = String::new();
        let mut quote: Option<char> = None;

        while let Some(c) = self.peek_char() {
            match quote {
                None if is_separator(c) => break,
                None if c == '"' || c == '\'' => quote = Some(c),
                Some(q) if c == q => quote = None,
                _ => {}
            }
            word.push(c);
            self.read_char();
        }

        if quote.is_some() {
            return Err(ParseError::UnmatchedQuote(word));
        }
        Ok(word)
    }
}

fn classify(raw: String) -> Result<Token, ParseError> {
    let (op, target) = if raw == "|" {
        return Ok(Token::Pipe);
    } else if raw == "&" {
        return Ok(Token::Background);
    } else if let Some(rest) = raw.strip_prefix(">>") {
        (RedirectOp::Append, rest)
    } else if let Some(rest) = raw.strip_prefix('>') {
        (RedirectOp::Output, rest)
    } else if let Some(rest) = raw.strip_prefix('<') {
        (RedirectOp::Input, rest)
    } else {
        return Ok(Token::Word(unquote(&raw).to_string()));
    };

    if target.is_empty() {
        return Err(ParseError::MissingRedirectTarget(raw));
    }
    Ok(Token::Redirect(op, unquote(target).to_string()))
}

/// Strips one matching pair of wrapping quotes, if the token is longer than
/// the pair itself.
pub fn unquote(token: &str) -> &str {
    let bytes = token.as_bytes();
    let len = bytes.len();
    if len > 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[len - 1] == bytes[0] {
        &token[1..len - 1]
    } else {
        token
    }
}
