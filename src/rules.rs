//! Rewrite rules, pattern matching, and substitution.

use crate::term::Term;
use std::collections::HashMap;
use std::fmt;

/// A single rewrite rule.
///
/// The identifier is dotted, `label.name`; the label groups related rules
/// for listing and removal (`math.fact-base`, `list.length-empty`). A rule
/// fires when its pattern matches a term, producing the replacement with
/// the pattern variables substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub label: String,
    pub name: String,
    pub pattern: Term,
    pub replacement: Term,
}

impl Rule {
    pub fn new(
        label: impl Into<String>,
        name: impl Into<String>,
        pattern: Term,
        replacement: Term,
    ) -> Self {
        Rule {
            label: label.into(),
            name: name.into(),
            pattern,
            replacement,
        }
    }

    /// The dotted identifier, e.g. `math.fact-base`.
    pub fn id(&self) -> String {
        format!("{}.{}", self.label, self.name)
    }

    /// The head symbol of the pattern, used to index the rule.
    pub fn head_symbol(&self) -> Option<&str> {
        self.pattern.head_symbol()
    }

    /// Base-case rules are tried before recursive ones.
    ///
    /// Heuristics carried over from the original engine: the identifier
    /// mentions a base case, the pattern contains a numeric literal or the
    /// empty list, or the replacement no longer mentions the head symbol.
    pub fn is_base_case(&self) -> bool {
        let id = self.id();
        if id.contains("base") || id.contains("empty") || id.contains("zero") {
            return true;
        }
        let pattern_text = self.pattern.to_string();
        let has_numeric_literal = pattern_text
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .any(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()));
        if pattern_text.contains("()") || has_numeric_literal {
            return true;
        }
        if let Some(head) = self.head_symbol() {
            return !self.replacement.to_string().contains(head);
        }
        false
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {} {}", self.id(), self.pattern, self.replacement)
    }
}

/// An ordered collection of rules owned by one namespace.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet { rules: Vec::new() }
    }

    pub fn add(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Remove every rule with the given dotted identifier.
    ///
    /// # Returns
    /// How many rules were removed; zero is not an error.
    pub fn remove(&mut self, label: &str, name: &str) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| !(r.label == label && r.name == name));
        before - self.rules.len()
    }

    /// Rules whose pattern head matches `symbol`, base cases first.
    ///
    /// Insertion order is preserved within each group, so earlier rules
    /// still win ties.
    pub fn for_head(&self, symbol: &str) -> Vec<&Rule> {
        let mut matching: Vec<&Rule> = Vec::new();
        for rule in &self.rules {
            if rule.head_symbol() == Some(symbol) && rule.is_base_case() {
                matching.push(rule);
            }
        }
        for rule in &self.rules {
            if rule.head_symbol() == Some(symbol) && !rule.is_base_case() {
                matching.push(rule);
            }
        }
        matching
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Variable bindings accumulated during a match.
pub type Bindings = HashMap<String, Term>;

/// Match a pattern against a term.
///
/// Variables bind consistently: a variable seen twice must match equal
/// terms. The 3-element list form `(?h . ?t)` is a cons pattern splitting a
/// non-empty list into head and tail; cons chains and proper lists
/// interconvert as needed during matching.
pub fn match_term(pattern: &Term, term: &Term) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    if match_internal(pattern, term, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

fn match_internal(pattern: &Term, term: &Term, bindings: &mut Bindings) -> bool {
    if pattern.is_variable() {
        let Term::Atom(var) = pattern else {
            unreachable!("variables are atoms");
        };
        if let Some(bound) = bindings.get(var) {
            return bound == term;
        }
        bindings.insert(var.clone(), term.clone());
        return true;
    }

    match (pattern, term) {
        (Term::Atom(a), Term::Atom(b)) => a == b,
        (Term::List(_), Term::List(_)) => match_list(pattern, term, bindings),
        (Term::Cons(p_car, p_cdr), Term::Cons(t_car, t_cdr)) => {
            match_internal(p_car, t_car, bindings) && match_internal(p_cdr, t_cdr, bindings)
        }
        (Term::List(_), Term::Cons(..)) => match term.cons_to_list() {
            Some(elements) => match_list(pattern, &Term::List(elements), bindings),
            None => false,
        },
        (Term::Cons(..), Term::List(elements)) => {
            if elements.is_empty() {
                return false;
            }
            match_internal(pattern, &list_to_cons(elements), bindings)
        }
        _ => false,
    }
}

fn match_list(pattern: &Term, term: &Term, bindings: &mut Bindings) -> bool {
    let (Term::List(pattern_elements), Term::List(term_elements)) = (pattern, term) else {
        return false;
    };

    // Cons pattern in list form: (?head . ?tail) splits a non-empty list.
    if pattern_elements.len() == 3 {
        if let Term::Atom(dot) = &pattern_elements[1] {
            if dot == "." {
                if term_elements.is_empty() {
                    return false;
                }
                if !match_internal(&pattern_elements[0], &term_elements[0], bindings) {
                    return false;
                }
                let tail = Term::List(term_elements[1..].to_vec());
                return match_internal(&pattern_elements[2], &tail, bindings);
            }
        }
    }

    if pattern_elements.len() != term_elements.len() {
        return false;
    }
    pattern_elements
        .iter()
        .zip(term_elements)
        .all(|(p, t)| match_internal(p, t, bindings))
}

fn list_to_cons(elements: &[Term]) -> Term {
    let mut result = Term::nil();
    for element in elements.iter().rev() {
        result = Term::cons(element.clone(), result);
    }
    result
}

/// Replace variables in a template with their bindings.
///
/// Cons chains produced by the substitution are normalized back to proper
/// lists where possible.
pub fn substitute(template: &Term, bindings: &Bindings) -> Term {
    match template {
        Term::Atom(v) if template.is_variable() => bindings
            .get(v)
            .cloned()
            .unwrap_or_else(|| template.clone()),
        Term::Atom(_) => template.clone(),
        Term::List(elements) => {
            Term::List(elements.iter().map(|e| substitute(e, bindings)).collect())
        }
        Term::Cons(car, cdr) => {
            let result = Term::cons(substitute(car, bindings), substitute(cdr, bindings));
            match result.cons_to_list() {
                Some(elements) => Term::List(elements),
                None => result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_term;

    fn t(input: &str) -> Term {
        parse_term(input).unwrap()
    }

    #[test]
    fn test_atom_match() {
        assert!(match_term(&t("a"), &t("a")).is_some());
        assert!(match_term(&t("a"), &t("b")).is_none());
    }

    #[test]
    fn test_variable_binds() {
        let bindings = match_term(&t("(?x)"), &t("(42)")).unwrap();
        assert_eq!(bindings["?x"], t("42"));
    }

    #[test]
    fn test_variable_binds_consistently() {
        assert!(match_term(&t("(+ ?x ?x)"), &t("(+ 3 3)")).is_some());
        assert!(match_term(&t("(+ ?x ?x)"), &t("(+ 3 4)")).is_none());
    }

    #[test]
    fn test_list_match_requires_same_length() {
        assert!(match_term(&t("(f ?x)"), &t("(f 1 2)")).is_none());
        assert!(match_term(&t("(f ?x ?y)"), &t("(f 1 2)")).is_some());
    }

    #[test]
    fn test_cons_pattern_splits_head_and_tail() {
        let bindings = match_term(&t("(?h . ?t)"), &t("(a b c)")).unwrap();
        assert_eq!(bindings["?h"], t("a"));
        assert_eq!(bindings["?t"], t("(b c)"));

        // Single element: tail is the empty list.
        let bindings = match_term(&t("(?h . ?t)"), &t("(a)")).unwrap();
        assert_eq!(bindings["?t"], t("()"));

        // Empty list never matches a cons pattern.
        assert!(match_term(&t("(?h . ?t)"), &t("()")).is_none());
    }

    #[test]
    fn test_substitute() {
        let bindings = match_term(&t("(double ?x)"), &t("(double 5)")).unwrap();
        let result = substitute(&t("(* ?x 2)"), &bindings);
        assert_eq!(result, t("(* 5 2)"));
    }

    #[test]
    fn test_substitute_keeps_unbound_variables() {
        let result = substitute(&t("(f ?y)"), &Bindings::new());
        assert_eq!(result, t("(f ?y)"));
    }

    #[test]
    fn test_base_case_detection() {
        let base = Rule::new("math", "fact-base", t("(fact 0)"), t("1"));
        assert!(base.is_base_case());
        let recursive = Rule::new(
            "math",
            "fact-rec",
            t("(fact ?n)"),
            t("(* ?n (fact (- ?n 1)))"),
        );
        assert!(!recursive.is_base_case());
        let empty = Rule::new("list", "length-a", t("(length ())"), t("0"));
        assert!(empty.is_base_case());
    }

    #[test]
    fn test_for_head_orders_base_cases_first() {
        let mut set = RuleSet::new();
        set.add(Rule::new(
            "math",
            "fact-rec",
            t("(fact ?n)"),
            t("(* ?n (fact (- ?n 1)))"),
        ));
        set.add(Rule::new("math", "fact-base", t("(fact 0)"), t("1")));
        let ordered = set.for_head("fact");
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].name, "fact-base");
        assert_eq!(ordered[1].name, "fact-rec");
        assert!(set.for_head("fib").is_empty());
    }

    #[test]
    fn test_remove_by_id() {
        let mut set = RuleSet::new();
        set.add(Rule::new("math", "double", t("(double ?x)"), t("(* ?x 2)")));
        set.add(Rule::new("math", "double", t("(double 0)"), t("0")));
        set.add(Rule::new("math", "triple", t("(triple ?x)"), t("(* ?x 3)")));
        assert_eq!(set.remove("math", "double"), 2);
        assert_eq!(set.remove("math", "double"), 0);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::new("math", "double", t("(double ?x)"), t("(* ?x 2)"));
        assert_eq!(rule.to_string(), "<math.double> (double ?x) (* ?x 2)");
    }
}
