use crate::value::Value;

/// Comparison operators usable in WHERE clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    GtEq,
    /// `<=`
    LtEq,
    /// `CONTAINS` - true when the field holds an array containing the
    /// value; always false on non-array fields.
    Contains,
    /// `NOT_CONTAINS` - the negation; always true on non-array fields.
    NotContains,
}

/// Right-hand side of a comparison. Variables are resolved against the
/// global variable store at evaluation time, never at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareValue {
    Literal(Value),
    Variable(String),
}

/// A WHERE condition tree. Strict binary/unary tree: no node is shared
/// between branches.
///
/// # Examples
/// ```text
/// WHERE (result = "pass" & yards > 10)
/// WHERE (!(status = "void") | amount >= 100)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Compare {
        field: String,
        op: CompareOp,
        value: CompareValue,
    },
}
