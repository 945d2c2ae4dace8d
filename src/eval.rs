//! The rewriting evaluator.
//!
//! Evaluation of a term proceeds in three stages, mirroring the engine this
//! shell grew out of: built-in special operators first, then rewrite rules
//! visible through the active namespace's parent chain (nearest namespace
//! first, base cases before recursive rules), then recursive evaluation of
//! subterms. Results are memoized per evaluation; an active-evaluation set
//! stops self-referential terms; a step limit turns non-terminating rule
//! sets into an error instead of a hang.

use crate::error::EvalError;
use crate::namespace::NamespaceRegistry;
use crate::parser::{self, RuleLine};
use crate::rules::{self, RuleSet};
use crate::term::Term;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Upper bound on evaluation steps for a single committed line.
const MAX_STEPS: usize = 10_000;

/// How chatty the evaluator is about its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Results only.
    #[default]
    Quiet,
    /// Report each applied rule.
    Trace,
    /// Also report parse and evaluation milestones.
    Debug,
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verbosity::Quiet => write!(f, "quiet"),
            Verbosity::Trace => write!(f, "trace"),
            Verbosity::Debug => write!(f, "debug"),
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiet" => Ok(Verbosity::Quiet),
            "trace" => Ok(Verbosity::Trace),
            "debug" => Ok(Verbosity::Debug),
            other => Err(format!(
                "invalid verbosity: {} (valid: quiet, trace, debug)",
                other
            )),
        }
    }
}

/// Session-level evaluator settings.
#[derive(Debug, Default)]
pub struct EvalSettings {
    pub verbosity: Verbosity,
}

fn is_special_operator(op: &str) -> bool {
    matches!(
        op,
        ":" | "if" | "+" | "-" | "*" | "/" | "%" | ">" | "<" | ">=" | "<=" | "=" | "!="
    )
}

/// One evaluation pass over the rules visible from a namespace.
///
/// Owns a snapshot of the visible rule sets, so the registry is free again
/// once the evaluator is built.
pub struct Evaluator {
    tiers: Vec<RuleSet>,
    verbosity: Verbosity,
    trace: Vec<String>,
    memo: HashMap<Term, Term>,
    active: HashSet<Term>,
    steps: usize,
}

impl Evaluator {
    /// Snapshot the rule sets visible from `from`, nearest first.
    pub fn for_namespace(registry: &NamespaceRegistry, from: &str, verbosity: Verbosity) -> Self {
        let tiers = registry
            .chain_of(from)
            .iter()
            .filter_map(|name| registry.lookup(name))
            .map(|space| space.rules.clone())
            .collect();
        Evaluator {
            tiers,
            verbosity,
            trace: Vec::new(),
            memo: HashMap::new(),
            active: HashSet::new(),
            steps: 0,
        }
    }

    /// Lines reported along the way (applied rules, debug milestones).
    pub fn take_trace(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace)
    }

    /// Evaluate a term to its normal form.
    pub fn evaluate(&mut self, term: &Term) -> Result<Term, EvalError> {
        self.memo.clear();
        self.active.clear();
        self.steps = 0;
        let result = self.evaluate_recursive(term)?;
        // Normalize a top-level cons chain back to a proper list.
        if let Term::Cons(..) = result {
            if let Some(elements) = result.cons_to_list() {
                return Ok(Term::List(elements));
            }
        }
        Ok(result)
    }

    fn evaluate_recursive(&mut self, term: &Term) -> Result<Term, EvalError> {
        self.steps += 1;
        if self.steps > MAX_STEPS {
            return Err(EvalError::StepLimit);
        }
        if let Some(cached) = self.memo.get(term) {
            return Ok(cached.clone());
        }
        if self.active.contains(term) {
            return Ok(term.clone());
        }
        self.active.insert(term.clone());
        let result = self.evaluate_core(term);
        self.active.remove(term);
        let result = result?;
        if result != *term {
            self.memo.insert(term.clone(), result.clone());
        }
        Ok(result)
    }

    fn evaluate_core(&mut self, term: &Term) -> Result<Term, EvalError> {
        let Term::List(elements) = term else {
            return Ok(term.clone());
        };
        if elements.is_empty() {
            return Ok(term.clone());
        }

        let Some(head) = term.head_symbol().map(str::to_string) else {
            return self.evaluate_subterms(term);
        };

        if is_special_operator(&head) {
            return self.evaluate_special(term, &head);
        }

        if let Some(rewritten) = self.try_rewrite(term) {
            return self.evaluate_recursive(&rewritten);
        }

        self.evaluate_subterms(term)
    }

    /// Try the visible rules, nearest namespace first, base cases first
    /// within each namespace. The first matching rule wins.
    fn try_rewrite(&mut self, term: &Term) -> Option<Term> {
        let head = term.head_symbol()?;
        for tier_index in 0..self.tiers.len() {
            let candidates: Vec<_> = self.tiers[tier_index]
                .for_head(head)
                .into_iter()
                .cloned()
                .collect();
            for rule in candidates {
                if let Some(bindings) = rules::match_term(&rule.pattern, term) {
                    let result = rules::substitute(&rule.replacement, &bindings);
                    if self.verbosity != Verbosity::Quiet {
                        self.trace
                            .push(format!("rule {}: {} -> {}", rule.id(), term, result));
                    }
                    return Some(result);
                }
            }
        }
        None
    }

    fn evaluate_subterms(&mut self, term: &Term) -> Result<Term, EvalError> {
        let Term::List(elements) = term else {
            return Ok(term.clone());
        };
        let mut evaluated = Vec::with_capacity(elements.len());
        let mut changed = false;
        for element in elements {
            let result = self.evaluate_recursive(element)?;
            if result != *element {
                changed = true;
            }
            evaluated.push(result);
        }
        if changed {
            Ok(Term::List(evaluated))
        } else {
            Ok(term.clone())
        }
    }

    fn evaluate_special(&mut self, term: &Term, head: &str) -> Result<Term, EvalError> {
        let Term::List(elements) = term else {
            unreachable!("special forms are lists");
        };
        match head {
            ":" => {
                if elements.len() != 4 {
                    return Err(EvalError::Malformed(
                        "arithmetic requires (: op arg1 arg2)".to_string(),
                    ));
                }
                let Term::Atom(op) = &elements[1] else {
                    return Err(EvalError::Malformed("operator must be an atom".to_string()));
                };
                let op = op.clone();
                let lhs = self.evaluate_recursive(&elements[2])?;
                let rhs = self.evaluate_recursive(&elements[3])?;
                binary_op(&op, &lhs, &rhs)
            }
            "if" => {
                if elements.len() != 4 {
                    return Err(EvalError::Malformed(
                        "if requires (if condition then else)".to_string(),
                    ));
                }
                let condition = self.evaluate_recursive(&elements[1])?;
                match condition.as_bool() {
                    // Lazy: only the taken branch is evaluated.
                    Some(true) => self.evaluate_recursive(&elements[2]),
                    Some(false) => self.evaluate_recursive(&elements[3]),
                    None => Err(EvalError::Malformed(format!(
                        "if condition must be boolean, got: {}",
                        condition
                    ))),
                }
            }
            _ => {
                if elements.len() != 3 {
                    return Err(EvalError::Malformed(format!(
                        "binary operator {} requires 2 arguments",
                        head
                    )));
                }
                let lhs = self.evaluate_recursive(&elements[1])?;
                let rhs = self.evaluate_recursive(&elements[2])?;
                binary_op(head, &lhs, &rhs)
            }
        }
    }
}

fn binary_op(op: &str, lhs: &Term, rhs: &Term) -> Result<Term, EvalError> {
    let (Term::Atom(_), Term::Atom(_)) = (lhs, rhs) else {
        return Err(EvalError::Malformed(format!(
            "operator arguments must be atoms: {}, {}",
            lhs, rhs
        )));
    };

    match op {
        "=" | "==" => return Ok(Term::bool_atom(lhs == rhs)),
        "!=" => return Ok(Term::bool_atom(lhs != rhs)),
        _ => {}
    }

    let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
        return Err(EvalError::Malformed(format!(
            "arithmetic arguments must be numbers: {}, {}",
            lhs, rhs
        )));
    };

    let result = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        "%" => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a % b
        }
        ">" => return Ok(Term::bool_atom(a > b)),
        "<" => return Ok(Term::bool_atom(a < b)),
        ">=" => return Ok(Term::bool_atom(a >= b)),
        "<=" => return Ok(Term::bool_atom(a <= b)),
        other => {
            return Err(EvalError::Malformed(format!("unknown operator: {}", other)));
        }
    };
    Ok(Term::number(result))
}

/// Execute one committed line from the text-entry mode.
///
/// Rule-management lines mutate the active namespace's rule set; everything
/// else parses as a term and is evaluated against the rules visible from
/// the active namespace. The returned string is ready to render (trace
/// lines first, then the result).
pub fn run_line(
    line: &str,
    registry: &mut NamespaceRegistry,
    active: &str,
    settings: &EvalSettings,
) -> Result<String, EvalError> {
    if parser::is_rule_line(line) {
        return apply_rule_line(line, registry, active);
    }

    let term = parser::parse_term(line)?;
    let mut out = Vec::new();
    if settings.verbosity == Verbosity::Debug {
        out.push(format!("parsed: {}", term));
    }
    let mut evaluator = Evaluator::for_namespace(registry, active, settings.verbosity);
    let result = evaluator.evaluate(&term)?;
    out.extend(evaluator.take_trace());
    out.push(result.to_string());
    Ok(out.join("\n"))
}

fn apply_rule_line(
    line: &str,
    registry: &mut NamespaceRegistry,
    active: &str,
) -> Result<String, EvalError> {
    let parsed = parser::parse_rule_line(line)?;
    let Some(space) = registry.lookup_mut(active) else {
        return Err(EvalError::Malformed(format!(
            "active namespace not found: {}",
            active
        )));
    };
    match parsed {
        RuleLine::Add(rule) => {
            let id = rule.id();
            space.rules.add(rule);
            debug!("added rule {} to namespace {}", id, active);
            Ok(format!("added rule {}", id))
        }
        RuleLine::Remove { label, name } => {
            let removed = space.rules.remove(&label, &name);
            if removed == 0 {
                Ok(format!("no rule {}.{} in namespace {}", label, name, active))
            } else {
                Ok(format!(
                    "removed {} rule{} for {}.{}",
                    removed,
                    if removed == 1 { "" } else { "s" },
                    label,
                    name
                ))
            }
        }
    }
}
