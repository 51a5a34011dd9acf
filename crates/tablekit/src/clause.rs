//! Dynamic, parameterized WHERE clause builder.
//!
//! A [`WhereClause`] is an ordered list of [`Token`]s. Rendering joins them
//! left-to-right, inserting single spaces only where the neighbouring tokens
//! ask for them, and collects the bound values of parameterized tokens in the
//! same order as their `?` placeholders.
//!
//! # Example
//!
//! ```
//! use tablekit::WhereClause;
//!
//! let mut wc = WhereClause::new();
//! wc.add("(")
//!     .add_value("status = ?", "active".to_string())
//!     .add("or")
//!     .add_value("score > ?", 10i32)
//!     .add(")")
//!     .add("and")
//!     .add_unpadded_value("kind IN (?", 1i32)
//!     .add_unpadded_value(",?", 2i32)
//!     .add(")");
//!
//! assert_eq!(
//!     wc.text(),
//!     " WHERE (status = ? OR score > ?) AND kind IN (?,?)"
//! );
//! assert_eq!(wc.question_mark_values().len(), 4);
//! ```

use crate::value::{SqlValue, Value};
use std::fmt;

/// One element of a [`WhereClause`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    And,
    Or,
    OpenParen,
    CloseParen,
    /// Literal SQL text, never carrying a value.
    Literal { text: String, pad: bool },
    /// SQL text containing exactly one `?` bound to `value`.
    Param { text: String, value: Value, pad: bool },
}

impl Token {
    pub fn literal(text: impl Into<String>) -> Self {
        Token::Literal {
            text: text.into(),
            pad: true,
        }
    }

    pub fn param(text: impl Into<String>, value: impl SqlValue) -> Self {
        Token::Param {
            text: text.into(),
            value: value.into_value(),
            pad: true,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Token::And => "AND",
            Token::Or => "OR",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::Literal { text, .. } | Token::Param { text, .. } => text,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Token::Param { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Whether this token asks for whitespace around itself.
    pub fn wants_padding(&self) -> bool {
        match self {
            Token::And | Token::Or | Token::CloseParen => true,
            Token::OpenParen => false,
            Token::Literal { pad, .. } | Token::Param { pad, .. } => *pad,
        }
    }

    /// Whether a space goes between `previous` and this token.
    fn pads_after(&self, previous: &Token) -> bool {
        match self {
            Token::CloseParen => false,
            Token::OpenParen => *previous != Token::OpenParen,
            _ => {
                *previous != Token::OpenParen
                    && (self.wants_padding() || previous.wants_padding())
            }
        }
    }

    /// Interpret `text` as a connector or paren, else as a literal with `pad`.
    fn from_text(text: &str, pad: bool) -> Self {
        if text.eq_ignore_ascii_case("AND") {
            Token::And
        } else if text.eq_ignore_ascii_case("OR") {
            Token::Or
        } else if text == "(" {
            Token::OpenParen
        } else if text == ")" {
            Token::CloseParen
        } else {
            Token::Literal {
                text: text.to_string(),
                pad,
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Param { text, value, .. } => write!(f, "{text}{{?:{value}}}"),
            other => f.write_str(other.text()),
        }
    }
}

/// Ordered, parameter-safe WHERE clause.
///
/// Not meant to be shared between concurrent callers; build one per call site
/// (or use [`WhereClause::EMPTY`] when there is no filter).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    tokens: Vec<Token>,
}

impl WhereClause {
    /// A clause with no tokens; renders to `""`.
    pub const EMPTY: &'static WhereClause = &WhereClause { tokens: Vec::new() };

    pub fn new() -> Self {
        Self::default()
    }

    /// Substitute [`WhereClause::EMPTY`] for an absent clause.
    pub fn de_null(clause: Option<&WhereClause>) -> &WhereClause {
        clause.unwrap_or(Self::EMPTY)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Append a token; `None` is ignored.
    pub fn add_token(&mut self, token: impl Into<Option<Token>>) -> &mut Self {
        if let Some(token) = token.into() {
            self.tokens.push(token);
        }
        self
    }

    /// Append padded text.
    ///
    /// `"and"`/`"or"` (any case) become [`Token::And`]/[`Token::Or`], and
    /// `"("`/`")"` become the paren tokens.
    pub fn add(&mut self, text: &str) -> &mut Self {
        self.add_token(Token::from_text(text, true))
    }

    /// Like [`WhereClause::add`], but literal text gets no leading pad of its own.
    pub fn add_unpadded(&mut self, text: &str) -> &mut Self {
        self.add_token(Token::from_text(text, false))
    }

    /// Append padded text containing one `?` bound to `value`.
    pub fn add_value(&mut self, text: impl Into<String>, value: impl SqlValue) -> &mut Self {
        self.add_token(Token::param(text, value))
    }

    /// Append unpadded text containing one `?` bound to `value`.
    ///
    /// Used for comma-joined lists such as `IN (?` `,?` `,?`.
    pub fn add_unpadded_value(
        &mut self,
        text: impl Into<String>,
        value: impl SqlValue,
    ) -> &mut Self {
        self.add_token(Token::Param {
            text: text.into(),
            value: value.into_value(),
            pad: false,
        })
    }

    /// Bound values in placeholder order.
    pub fn question_mark_values(&self) -> Vec<Value> {
        self.tokens
            .iter()
            .filter_map(|t| t.value().cloned())
            .collect()
    }

    /// Render as `" WHERE ..."`, or `""` when no tokens were added.
    pub fn text(&self) -> String {
        if self.tokens.is_empty() {
            return String::new();
        }
        let mut sql = String::from(" WHERE ");
        let mut previous: Option<&Token> = None;
        for token in &self.tokens {
            if previous.is_some_and(|prev| token.pads_after(prev)) {
                sql.push(' ');
            }
            sql.push_str(token.text());
            previous = Some(token);
        }
        sql
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WhereClause[")?;
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{token}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests;
