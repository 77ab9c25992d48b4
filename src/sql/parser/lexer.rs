//! SQL Lexer - Tokenizes query text into a stream of tokens

use std::{fmt::Display, iter::Peekable, str::Chars};

use crate::error::{Error, Result};

/// Represents a single lexical token in the query text
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Reserved keyword
    Keyword(Keyword),
    /// Identifier such as table name, alias or column name (lowercased)
    Ident(String),
    /// String literal, case preserved
    String(String),
    /// Numeric literal (integer or floating-point)
    Number(String),
    OpenParen,
    CloseParen,
    Comma,
    Semicolon,
    Asterisk,
    Period,
    Minus,
    // Comparison operators
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(keyword) => f.write_str(keyword.to_str()),
            Token::Ident(ident) => f.write_str(ident),
            Token::String(v) => write!(f, "'{}'", v),
            Token::Number(n) => f.write_str(n),
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
            Token::Semicolon => f.write_str(";"),
            Token::Asterisk => f.write_str("*"),
            Token::Period => f.write_str("."),
            Token::Minus => f.write_str("-"),
            Token::Equal => f.write_str("="),
            Token::NotEqual => f.write_str("!="),
            Token::GreaterThan => f.write_str(">"),
            Token::GreaterThanOrEqual => f.write_str(">="),
            Token::LessThan => f.write_str("<"),
            Token::LessThanOrEqual => f.write_str("<="),
        }
    }
}

/// Reserved keywords
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Keyword {
    Select,
    From,
    As,
    Where,
    And,
    Or,
    Not,
    In,
    Like,
    Null,
    // Joins
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Outer,
    Join,
    On,
    // Trailing clauses
    Group,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    // Mutating and DDL keywords, recognized only to be refused
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Truncate,
}

impl Keyword {
    /// Attempts to parse a string as a keyword (case-insensitive)
    pub fn from_str(ident: &str) -> Option<Keyword> {
        Some(match ident.to_uppercase().as_ref() {
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "AS" => Keyword::As,
            "WHERE" => Keyword::Where,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "IN" => Keyword::In,
            "LIKE" => Keyword::Like,
            "NULL" => Keyword::Null,
            "INNER" => Keyword::Inner,
            "LEFT" => Keyword::Left,
            "RIGHT" => Keyword::Right,
            "FULL" => Keyword::Full,
            "CROSS" => Keyword::Cross,
            "OUTER" => Keyword::Outer,
            "JOIN" => Keyword::Join,
            "ON" => Keyword::On,
            "GROUP" => Keyword::Group,
            "ORDER" => Keyword::Order,
            "BY" => Keyword::By,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            "LIMIT" => Keyword::Limit,
            "INSERT" => Keyword::Insert,
            "UPDATE" => Keyword::Update,
            "DELETE" => Keyword::Delete,
            "CREATE" => Keyword::Create,
            "DROP" => Keyword::Drop,
            "ALTER" => Keyword::Alter,
            "TRUNCATE" => Keyword::Truncate,
            _ => return None,
        })
    }

    /// Returns the uppercase string representation of the keyword
    pub fn to_str(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::As => "AS",
            Keyword::Where => "WHERE",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::In => "IN",
            Keyword::Like => "LIKE",
            Keyword::Null => "NULL",
            Keyword::Inner => "INNER",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::Full => "FULL",
            Keyword::Cross => "CROSS",
            Keyword::Outer => "OUTER",
            Keyword::Join => "JOIN",
            Keyword::On => "ON",
            Keyword::Group => "GROUP",
            Keyword::Order => "ORDER",
            Keyword::By => "BY",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Limit => "LIMIT",
            Keyword::Insert => "INSERT",
            Keyword::Update => "UPDATE",
            Keyword::Delete => "DELETE",
            Keyword::Create => "CREATE",
            Keyword::Drop => "DROP",
            Keyword::Alter => "ALTER",
            Keyword::Truncate => "TRUNCATE",
        }
    }

    /// Keywords that start a statement which would modify data or schema
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Keyword::Insert
                | Keyword::Update
                | Keyword::Delete
                | Keyword::Create
                | Keyword::Drop
                | Keyword::Alter
                | Keyword::Truncate
        )
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// SQL lexical analyzer (lexer/tokenizer).
///
/// Tokens are produced lazily, so a caller can inspect the first keyword
/// without scanning the rest of the input.
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.scan() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => self.iter.peek().map(|c| {
                Err(Error::UnsupportedSyntax(format!(
                    "unexpected character {}",
                    c
                )))
            }),
            Err(err) => Some(Err(err)),
        }
    }
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given query text
    pub fn new(sql_text: &'a str) -> Self {
        Self {
            iter: sql_text.chars().peekable(),
        }
    }

    /// Consumes the next character if it satisfies the predicate
    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        self.iter.peek().filter(|&c| predicate(*c))?;
        self.iter.next()
    }

    /// Consumes consecutive characters while they satisfy the predicate
    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<String> {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c);
        }
        Some(value).filter(|v| !v.is_empty())
    }

    /// Removes whitespace and `--` line comments from the input stream
    fn erase_whitespace(&mut self) {
        loop {
            self.next_while(|c| c.is_whitespace());
            let mut ahead = self.iter.clone();
            if ahead.next() == Some('-') && ahead.next() == Some('-') {
                self.next_while(|c| c != '\n');
            } else {
                break;
            }
        }
    }

    /// Scans and returns the next token
    fn scan(&mut self) -> Result<Option<Token>> {
        self.erase_whitespace();
        match self.iter.peek() {
            Some('\'') => self.scan_string(),
            Some(c) if c.is_ascii_digit() => Ok(self.scan_number()),
            Some(c) if c.is_alphabetic() || *c == '_' => Ok(self.scan_ident()),
            Some(_) => Ok(self.scan_symbol()),
            None => Ok(None),
        }
    }

    /// Scans a string literal (enclosed in single quotes, `''` escapes a quote)
    fn scan_string(&mut self) -> Result<Option<Token>> {
        self.iter.next();
        let mut val = String::new();

        loop {
            match self.iter.next() {
                Some('\'') if self.next_if(|c| c == '\'').is_some() => val.push('\''),
                Some('\'') => break,
                Some(c) => val.push(c),
                None => {
                    return Err(Error::UnsupportedSyntax(
                        "unterminated string literal".into(),
                    ))
                }
            }
        }
        Ok(Some(Token::String(val)))
    }

    /// Scans a numeric literal (integer or floating-point)
    fn scan_number(&mut self) -> Option<Token> {
        let mut val = self.next_while(|c| c.is_ascii_digit())?;
        if let Some(sep) = self.next_if(|c| c == '.') {
            val.push(sep);
            while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
                val.push(c);
            }
        }
        Some(Token::Number(val))
    }

    /// Scans an identifier or keyword
    fn scan_ident(&mut self) -> Option<Token> {
        let mut val = self.next_if(|c| c.is_alphabetic() || c == '_')?.to_string();
        while let Some(c) = self.next_if(|c| c.is_alphanumeric() || c == '_') {
            val.push(c);
        }
        // Returns Keyword if matched, otherwise returns as a regular Ident
        Some(Keyword::from_str(&val).map_or(Token::Ident(val.to_lowercase()), Token::Keyword))
    }

    /// Scans an operator or punctuation token
    fn scan_symbol(&mut self) -> Option<Token> {
        let token = match self.iter.peek()? {
            '*' => Token::Asterisk,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '.' => Token::Period,
            '-' => Token::Minus,
            '=' => Token::Equal,
            '>' => {
                self.iter.next();
                return Some(match self.next_if(|c| c == '=') {
                    Some(_) => Token::GreaterThanOrEqual,
                    None => Token::GreaterThan,
                });
            }
            '<' => {
                self.iter.next();
                return Some(match self.next_if(|c| c == '=' || c == '>') {
                    Some('=') => Token::LessThanOrEqual,
                    Some(_) => Token::NotEqual,
                    None => Token::LessThan,
                });
            }
            '!' => {
                let mut ahead = self.iter.clone();
                ahead.next();
                if ahead.next() != Some('=') {
                    return None;
                }
                self.iter.next();
                self.iter.next();
                return Some(Token::NotEqual);
            }
            _ => return None,
        };
        self.iter.next();
        Some(token)
    }
}
