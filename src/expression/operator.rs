//! Operator definitions for expressions.
//!
//! Operators are sugar: each one names a function registered in the
//! repository and compiles to an ordinary function call.

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
    Xor,

    // String
    Like,
}

impl BinaryOperator {
    pub const ALL: [BinaryOperator; 15] = [
        BinaryOperator::Add,
        BinaryOperator::Sub,
        BinaryOperator::Mul,
        BinaryOperator::Div,
        BinaryOperator::Mod,
        BinaryOperator::Eq,
        BinaryOperator::Ne,
        BinaryOperator::Lt,
        BinaryOperator::Le,
        BinaryOperator::Gt,
        BinaryOperator::Ge,
        BinaryOperator::And,
        BinaryOperator::Or,
        BinaryOperator::Xor,
        BinaryOperator::Like,
    ];

    /// Name of the function implementing this operator
    pub fn function_name(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
            BinaryOperator::Like => "like",
        }
    }

    /// Find the operator implemented by a two-argument function
    pub fn from_function_name(name: &str) -> Option<Self> {
        BinaryOperator::ALL
            .into_iter()
            .find(|op| op.function_name() == name)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    IsNull,
    IsNotNull,
    Minus,
}

impl UnaryOperator {
    pub const ALL: [UnaryOperator; 4] = [
        UnaryOperator::Not,
        UnaryOperator::IsNull,
        UnaryOperator::IsNotNull,
        UnaryOperator::Minus,
    ];

    /// Name of the function implementing this operator
    pub fn function_name(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::IsNull => "is null",
            UnaryOperator::IsNotNull => "is not null",
            UnaryOperator::Minus => "-",
        }
    }

    /// Find the operator implemented by a one-argument function
    pub fn from_function_name(name: &str) -> Option<Self> {
        UnaryOperator::ALL
            .into_iter()
            .find(|op| op.function_name() == name)
    }

    /// Postfix operators render after their operand
    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOperator::IsNull | UnaryOperator::IsNotNull)
    }
}
