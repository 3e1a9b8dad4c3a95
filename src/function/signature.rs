use crate::data::ExprType;
use crate::function::FunctionName;
use std::fmt;

/// Function name plus its ordered parameter types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub name: FunctionName,
    pub param_types: Vec<ExprType>,
}

impl FunctionSignature {
    pub fn new(name: FunctionName, param_types: Vec<ExprType>) -> Self {
        Self { name, param_types }
    }

    /// Total widening cost of calling this signature with `arg_types`, or
    /// `None` when the arity differs or some argument cannot widen.
    pub fn match_distance(&self, arg_types: &[ExprType]) -> Option<u32> {
        if self.param_types.len() != arg_types.len() {
            return None;
        }
        arg_types
            .iter()
            .zip(&self.param_types)
            .map(|(arg, param)| arg.widening_distance(*param))
            .sum()
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<_> = self.param_types.iter().map(|ty| ty.name()).collect();
        write!(f, "{}({})", self.name, params.join(","))
    }
}
