//! Parsing of terms, rule lines, and rule files.
//!
//! Terms are s-expressions: atoms separated by whitespace, lists delimited
//! by parentheses. Rule management uses two line forms recognized by their
//! first character before any term parsing happens:
//!
//! - `<label.name> PATTERN REPLACEMENT` adds a rule;
//! - `>label.name<` removes every rule with that identifier.
//!
//! Rule files are sequences of add lines, with `#` comments and blank lines
//! skipped.

use crate::error::EvalError;
use crate::rules::{Rule, RuleSet};
use crate::term::Term;
use regex::Regex;
use std::sync::LazyLock;

static ADD_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([^.><\s]+)\.([^><\s]+)>\s*(.+)$").expect("valid rule-header pattern")
});

static REMOVE_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^>([^.><\s]+)\.([^><\s]+)<\s*$").expect("valid rule-removal pattern")
});

struct TermParser {
    input: Vec<char>,
    pos: usize,
}

impl TermParser {
    fn new(input: &str) -> Self {
        TermParser {
            input: input.trim().chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Term, EvalError> {
        let term = self.parse_term()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(EvalError::Parse(format!(
                "trailing input at position {}",
                self.pos
            )));
        }
        Ok(term)
    }

    fn parse_term(&mut self) -> Result<Term, EvalError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(EvalError::Parse("unexpected end of input".to_string())),
            Some('(') => self.parse_list(),
            Some(')') => Err(EvalError::Parse(format!(
                "unexpected ')' at position {}",
                self.pos
            ))),
            Some(_) => self.parse_atom(),
        }
    }

    fn parse_list(&mut self) -> Result<Term, EvalError> {
        self.expect('(')?;
        let mut elements = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(')') => break,
                Some(_) => elements.push(self.parse_term()?),
                None => return Err(EvalError::Parse("unclosed '('".to_string())),
            }
        }
        self.expect(')')?;
        Ok(Term::List(elements))
    }

    fn parse_atom(&mut self) -> Result<Term, EvalError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '(' || c == ')' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(EvalError::Parse(format!(
                "expected atom at position {}",
                start
            )));
        }
        Ok(Term::Atom(self.input[start..self.pos].iter().collect()))
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), EvalError> {
        if self.peek() != Some(expected) {
            return Err(EvalError::Parse(format!(
                "expected '{}' at position {}",
                expected, self.pos
            )));
        }
        self.pos += 1;
        Ok(())
    }
}

/// Parse a single term from its textual form.
pub fn parse_term(input: &str) -> Result<Term, EvalError> {
    TermParser::new(input).parse()
}

/// A parsed rule-management line.
#[derive(Debug, PartialEq)]
pub enum RuleLine {
    Add(Rule),
    Remove { label: String, name: String },
}

/// Whether a committed line uses the rule-management syntax.
///
/// Checked before term parsing, as `<` and `>` never start a term here.
pub fn is_rule_line(input: &str) -> bool {
    let input = input.trim_start();
    input.starts_with('<') || input.starts_with('>')
}

/// Parse a rule-management line into its add or remove form.
pub fn parse_rule_line(input: &str) -> Result<RuleLine, EvalError> {
    let input = input.trim();

    if let Some(captures) = ADD_RULE.captures(input) {
        let label = captures[1].to_string();
        let name = captures[2].to_string();
        let (pattern_text, replacement_text) = split_pattern_and_replacement(&captures[3])?;
        let pattern = parse_term(pattern_text)?;
        let replacement = parse_term(replacement_text)?;
        return Ok(RuleLine::Add(Rule::new(label, name, pattern, replacement)));
    }

    if let Some(captures) = REMOVE_RULE.captures(input) {
        return Ok(RuleLine::Remove {
            label: captures[1].to_string(),
            name: captures[2].to_string(),
        });
    }

    Err(EvalError::Parse(
        "invalid rule syntax; use <label.name> PATTERN REPLACEMENT to add \
         or >label.name< to remove"
            .to_string(),
    ))
}

/// Split the text after a rule header into pattern and replacement.
///
/// A pattern starting with `(` extends to its matching close paren;
/// otherwise it is a single atom ending at the first space.
fn split_pattern_and_replacement(rest: &str) -> Result<(&str, &str), EvalError> {
    let rest = rest.trim();

    if rest.starts_with('(') {
        let mut depth = 0usize;
        for (i, c) in rest.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| EvalError::Parse("unbalanced parentheses".to_string()))?;
                    if depth == 0 {
                        let pattern = &rest[..i + 1];
                        let replacement = rest[i + 1..].trim();
                        if replacement.is_empty() {
                            return Err(EvalError::Parse("missing replacement".to_string()));
                        }
                        return Ok((pattern, replacement));
                    }
                }
                _ => {}
            }
        }
        Err(EvalError::Parse(
            "unbalanced parentheses in pattern".to_string(),
        ))
    } else {
        match rest.split_once(' ') {
            Some((pattern, replacement)) if !replacement.trim().is_empty() => {
                Ok((pattern, replacement.trim()))
            }
            _ => Err(EvalError::Parse("missing replacement".to_string())),
        }
    }
}

/// Load a rule file into a fresh [`RuleSet`].
///
/// Fails with the offending line number on the first malformed rule.
pub fn load_rules(source: &str) -> Result<RuleSet, EvalError> {
    let mut set = RuleSet::new();
    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_rule_line(line) {
            Ok(RuleLine::Add(rule)) => set.add(rule),
            Ok(RuleLine::Remove { .. }) => {
                return Err(EvalError::Parse(format!(
                    "line {}: removal syntax is not allowed in a rule file",
                    index + 1
                )));
            }
            Err(EvalError::Parse(msg)) => {
                return Err(EvalError::Parse(format!("line {}: {}", index + 1, msg)));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(set)
}
