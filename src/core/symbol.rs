//! Symbol Lists
//!
//! Parser for the bracketed-list syntax game states are written in:
//!
//! ```text
//! ( ( cell 1 1 b ) ( cell 1 2 x ) ( control oplayer ) )
//! ```
//!
//! Tokens are separated by whitespace and parentheses. A state is a single
//! parenthesised list whose top-level elements are facts; comparing two
//! states as [`symbol_set`]s ignores the order the facts were written in.

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Deepest list nesting [`parse_symbol`] accepts.
pub const MAX_SYMBOL_DEPTH: usize = 256;

/// A parsed symbol: an atom or a list of symbols.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Symbol {
    /// A bare token.
    Atom(String),
    /// A parenthesised list.
    List(Vec<Symbol>),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Atom(atom) => write!(f, "{}", atom),
            Symbol::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Symbol parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// Input contained no tokens.
    #[error("empty symbol text")]
    Empty,
    /// A `)` appeared with no matching `(`.
    #[error("unmatched ')' at token {0}")]
    UnexpectedClose(usize),
    /// Input ended inside an open list.
    #[error("unterminated list: {0} unclosed '('")]
    Unterminated(usize),
    /// Tokens followed the first complete symbol.
    #[error("trailing tokens after symbol at token {0}")]
    TrailingTokens(usize),
    /// A list was required but an atom was found.
    #[error("expected a list, found atom '{0}'")]
    NotAList(String),
    /// Lists nested deeper than [`MAX_SYMBOL_DEPTH`].
    #[error("lists nested too deeply at token {0}")]
    TooDeep(usize),
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Atom(&'a str),
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token::Atom(&text[s..i]));
            }
            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token::Atom(&text[s..]));
    }

    tokens
}

/// Parse text into exactly one symbol.
pub fn parse_symbol(text: &str) -> Result<Symbol, SymbolError> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Err(SymbolError::Empty);
    }

    // Stack of partially built lists.
    let mut stack: Vec<Vec<Symbol>> = Vec::new();
    let mut complete: Option<Symbol> = None;

    for (i, token) in tokens.iter().enumerate() {
        if complete.is_some() {
            return Err(SymbolError::TrailingTokens(i));
        }
        let finished = match token {
            Token::Open => {
                if stack.len() >= MAX_SYMBOL_DEPTH {
                    return Err(SymbolError::TooDeep(i));
                }
                stack.push(Vec::new());
                None
            }
            Token::Close => {
                let items = stack.pop().ok_or(SymbolError::UnexpectedClose(i))?;
                Some(Symbol::List(items))
            }
            Token::Atom(atom) => Some(Symbol::Atom((*atom).to_string())),
        };

        if let Some(symbol) = finished {
            match stack.last_mut() {
                Some(parent) => parent.push(symbol),
                None => complete = Some(symbol),
            }
        }
    }

    match complete {
        Some(symbol) => Ok(symbol),
        None => Err(SymbolError::Unterminated(stack.len())),
    }
}

/// Parse a state and return the set of its top-level elements in
/// canonical rendering.
pub fn symbol_set(text: &str) -> Result<BTreeSet<String>, SymbolError> {
    match parse_symbol(text)? {
        Symbol::List(items) => Ok(items.iter().map(|item| item.to_string()).collect()),
        Symbol::Atom(atom) => Err(SymbolError::NotAList(atom)),
    }
}

// =============================================================================
// TESTS
// =============================================================================
