use crate::data::{ExprValue, Tuple};

/// Bindings an expression is evaluated against: the current tuple, plus an
/// optional enclosing environment consulted for names the tuple lacks.
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    tuple: &'a Tuple,
    outer: Option<&'a Environment<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new(tuple: &'a Tuple) -> Self {
        Self { tuple, outer: None }
    }

    pub fn with_outer(tuple: &'a Tuple, outer: &'a Environment<'a>) -> Self {
        Self {
            tuple,
            outer: Some(outer),
        }
    }

    pub fn tuple(&self) -> &Tuple {
        self.tuple
    }

    /// Resolve a field, MISSING when no environment binds it
    pub fn resolve(&self, name: &str) -> ExprValue {
        match self.tuple.lookup(name) {
            Some(value) => value.clone(),
            None => match self.outer {
                Some(outer) => outer.resolve(name),
                None => ExprValue::Missing,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_outer() {
        let outer_tuple = Tuple::from_pairs([("limit", 10), ("a", 0)]);
        let inner_tuple = Tuple::from_pairs([("a", 1)]);
        let outer = Environment::new(&outer_tuple);
        let env = Environment::with_outer(&inner_tuple, &outer);

        assert_eq!(env.resolve("a"), ExprValue::Integer(1));
        assert_eq!(env.resolve("limit"), ExprValue::Integer(10));
        assert!(env.resolve("nope").is_missing());
    }

    #[test]
    fn test_present_null_is_not_missing() {
        let mut tuple = Tuple::new();
        tuple.insert("a", ExprValue::Null);
        let env = Environment::new(&tuple);
        assert!(env.resolve("a").is_null());
        assert!(env.resolve("b").is_missing());
    }
}
