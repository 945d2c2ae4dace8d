//! Tokenization of committed command lines.
//!
//! The dispatcher splits a line into whitespace-separated words with the
//! following quoting convention:
//!
//! - single quotes preserve everything between them literally;
//! - double quotes preserve everything except `\"` and `\\`, which escape
//!   a quote and a backslash;
//! - a backslash outside quotes escapes the next character.
//!
//! The convention round-trips: [`quote`] turns any string into a single
//! token that [`split_words`] reads back unchanged.

use thiserror::Error;

/// Errors that can occur during tokenization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    /// A closing quote (single or double) was not found.
    #[error("unterminated quote")]
    UnterminatedQuote,
    /// The line ends with a bare backslash.
    #[error("dangling escape at end of line")]
    DanglingEscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Start,
    Word,
    SingleQuote,
    DoubleQuote,
}

struct Splitter {
    input: Vec<char>,
    pos: usize,
    state: LexState,
    buffer: String,
    // Set while a word is open, so that `''` yields an empty word instead of
    // nothing at all.
    in_word: bool,
    words: Vec<String>,
}

impl Splitter {
    fn new(line: &str) -> Self {
        Splitter {
            input: line.chars().collect(),
            pos: 0,
            state: LexState::Start,
            buffer: String::new(),
            in_word: false,
            words: Vec::new(),
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn finish_word(&mut self) {
        if self.in_word {
            self.words.push(std::mem::take(&mut self.buffer));
            self.in_word = false;
        }
    }

    fn run(mut self) -> Result<Vec<String>, LexError> {
        while let Some(ch) = self.read_char() {
            match self.state {
                LexState::Start | LexState::Word => match ch {
                    c if c.is_whitespace() => {
                        self.finish_word();
                        self.state = LexState::Start;
                    }
                    '\'' => {
                        self.in_word = true;
                        self.state = LexState::SingleQuote;
                    }
                    '"' => {
                        self.in_word = true;
                        self.state = LexState::DoubleQuote;
                    }
                    '\\' => {
                        let escaped = self.read_char().ok_or(LexError::DanglingEscape)?;
                        self.buffer.push(escaped);
                        self.in_word = true;
                        self.state = LexState::Word;
                    }
                    c => {
                        self.buffer.push(c);
                        self.in_word = true;
                        self.state = LexState::Word;
                    }
                },
                LexState::SingleQuote => match ch {
                    '\'' => self.state = LexState::Word,
                    c => self.buffer.push(c),
                },
                LexState::DoubleQuote => match ch {
                    '"' => self.state = LexState::Word,
                    '\\' if matches!(self.peek_char(), Some('"') | Some('\\')) => {
                        let escaped = self.read_char().ok_or(LexError::DanglingEscape)?;
                        self.buffer.push(escaped);
                    }
                    c => self.buffer.push(c),
                },
            }
        }

        match self.state {
            LexState::SingleQuote | LexState::DoubleQuote => {
                return Err(LexError::UnterminatedQuote);
            }
            _ => {}
        }

        self.finish_word();
        Ok(self.words)
    }
}

/// Split a command line into words.
///
/// # Returns
/// The words in order, quoting resolved, or a [`LexError`] if a quote or
/// escape is left open at the end of the line.
pub fn split_words(line: &str) -> Result<Vec<String>, LexError> {
    Splitter::new(line).run()
}

/// Quote a string so that [`split_words`] reads it back as one word.
///
/// Plain words are returned as-is; anything containing whitespace, quotes,
/// or backslashes is wrapped in double quotes with `"` and `\` escaped.
pub fn quote(word: &str) -> String {
    if word.is_empty() {
        return "''".to_string();
    }
    let needs_quoting = word
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\\'));
    if !needs_quoting {
        return word.to_string();
    }
    let mut out = String::with_capacity(word.len() + 2);
    out.push('"');
    for c in word.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
