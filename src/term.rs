//! S-expression terms for the rewriting engine.

use std::fmt;

/// A term: an atom, a proper list, or a cons pair.
///
/// Atoms carry their source text; numbers and booleans are atoms that parse
/// as such. Variables are atoms starting with `?`. Cons pairs can represent
/// both proper lists and improper tails; a cons chain that ends in the empty
/// list displays as a proper list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Atom(String),
    List(Vec<Term>),
    Cons(Box<Term>, Box<Term>),
}

impl Term {
    pub fn atom(value: impl Into<String>) -> Term {
        Term::Atom(value.into())
    }

    pub fn list(elements: Vec<Term>) -> Term {
        Term::List(elements)
    }

    pub fn cons(car: Term, cdr: Term) -> Term {
        Term::Cons(Box::new(car), Box::new(cdr))
    }

    /// The empty list.
    pub fn nil() -> Term {
        Term::List(Vec::new())
    }

    /// An atom holding a number, printed as an integer when integral.
    pub fn number(value: f64) -> Term {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Term::Atom(format!("{}", value as i64))
        } else {
            Term::Atom(format!("{}", value))
        }
    }

    pub fn bool_atom(value: bool) -> Term {
        Term::Atom(value.to_string())
    }

    /// Atoms starting with `?` are pattern variables.
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Atom(v) if v.starts_with('?'))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Term::Atom(v) => v.parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Term::Atom(v) if v == "true" => Some(true),
            Term::Atom(v) if v == "false" => Some(false),
            _ => None,
        }
    }

    /// The head atom of a non-empty list, used to index rules.
    pub fn head_symbol(&self) -> Option<&str> {
        match self {
            Term::List(elements) => match elements.first() {
                Some(Term::Atom(v)) => Some(v),
                _ => None,
            },
            _ => None,
        }
    }

    /// Convert a cons chain to a proper list if it ends in the empty list.
    pub fn cons_to_list(&self) -> Option<Vec<Term>> {
        let mut elements = Vec::new();
        let mut current = self;
        while let Term::Cons(car, cdr) = current {
            elements.push((**car).clone());
            current = cdr;
        }
        match current {
            Term::List(rest) if rest.is_empty() => Some(elements),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(v) => write!(f, "{}", v),
            Term::List(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, ")")
            }
            Term::Cons(car, cdr) => {
                if let Some(elements) = self.cons_to_list() {
                    write!(f, "{}", Term::List(elements))
                } else {
                    write!(f, "({} . {})", car, cdr)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_predicates() {
        assert!(Term::atom("?x").is_variable());
        assert!(!Term::atom("x").is_variable());
        assert_eq!(Term::atom("42").as_number(), Some(42.0));
        assert_eq!(Term::atom("2.5").as_number(), Some(2.5));
        assert_eq!(Term::atom("abc").as_number(), None);
        assert_eq!(Term::atom("true").as_bool(), Some(true));
        assert_eq!(Term::atom("maybe").as_bool(), None);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(Term::number(7.0).to_string(), "7");
        assert_eq!(Term::number(-3.0).to_string(), "-3");
        assert_eq!(Term::number(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_list_display() {
        let term = Term::list(vec![
            Term::atom("+"),
            Term::atom("1"),
            Term::list(vec![Term::atom("*"), Term::atom("2"), Term::atom("3")]),
        ]);
        assert_eq!(term.to_string(), "(+ 1 (* 2 3))");
        assert_eq!(Term::nil().to_string(), "()");
    }

    #[test]
    fn test_cons_display() {
        // Proper chain displays as a list.
        let proper = Term::cons(Term::atom("a"), Term::cons(Term::atom("b"), Term::nil()));
        assert_eq!(proper.to_string(), "(a b)");
        // Improper chain displays dotted.
        let improper = Term::cons(Term::atom("a"), Term::atom("b"));
        assert_eq!(improper.to_string(), "(a . b)");
    }

    #[test]
    fn test_cons_to_list() {
        let chain = Term::cons(Term::atom("a"), Term::cons(Term::atom("b"), Term::nil()));
        assert_eq!(
            chain.cons_to_list(),
            Some(vec![Term::atom("a"), Term::atom("b")])
        );
        assert_eq!(Term::cons(Term::atom("a"), Term::atom("b")).cons_to_list(), None);
    }

    #[test]
    fn test_head_symbol() {
        let term = Term::list(vec![Term::atom("fact"), Term::atom("3")]);
        assert_eq!(term.head_symbol(), Some("fact"));
        assert_eq!(Term::nil().head_symbol(), None);
        assert_eq!(Term::atom("x").head_symbol(), None);
    }
}
