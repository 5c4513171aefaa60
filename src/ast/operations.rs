use crate::ast::Condition;

/// The field list of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// `SELECT *` - keep records whole
    All,
    /// `SELECT price` - project one field to a list of scalars
    Single(String),
    /// `SELECT [price, qty]` - project to per-record maps
    Multiple(Vec<String>),
}

/// A SELECT operation: resolves source rows from the current binding,
/// filters them through the WHERE condition, and projects the requested
/// fields. Every SELECT replaces the working set.
#[derive(Debug, Clone)]
pub struct Select {
    pub fields: FieldSpec,
    pub condition: Option<Condition>,
    /// `SELECT EACH field` flattens one level when the field holds an
    /// array per record, producing one output element per array entry.
    pub each: bool,
}

impl Select {
    /// The implicit `SELECT *` used as the PERCENT_OF denominator when the
    /// source omits a second SELECT.
    pub fn all() -> Self {
        Select {
            fields: FieldSpec::All,
            condition: None,
            each: false,
        }
    }
}

/// One operation in a query block pipeline.
///
/// Aggregates without a payload (SUM, AVERAGE, ...) reduce whatever the
/// prior SELECT left in the working set. COUNT and PERCENT_OF carry their
/// own SELECTs and run them against copies of the working context, so they
/// never disturb the caller's working set.
#[derive(Debug, Clone)]
pub enum Operation {
    Select(Select),
    Count(Select),
    Sum,
    Average,
    Median,
    Min,
    Max,
    Variance,
    StandardDeviation,
    Range,
    Unique,
    MostFrequent,
    LeastFrequent,
    PercentOf {
        numerator: Select,
        denominator: Select,
    },
    /// `DIVIDE $a $b` - operands must be variables written by a prior
    /// assignment; literals are not accepted.
    Divide {
        dividend: String,
        divisor: String,
    },
    Multiply {
        factor1: String,
        factor2: String,
    },
    Subtract {
        minuend: String,
        subtrahend: String,
    },
    /// `$name <operation>` - runs the wrapped operation, stores its result
    /// in the global variable store, and yields it like any operation.
    Assign {
        variable: String,
        operation: Box<Operation>,
    },
}

impl Operation {
    /// Keyword the operation was written with, used in error messages.
    pub fn keyword(&self) -> &'static str {
        match self {
            Operation::Select(_) => "SELECT",
            Operation::Count(_) => "COUNT",
            Operation::Sum => "SUM",
            Operation::Average => "AVERAGE",
            Operation::Median => "MEDIAN",
            Operation::Min => "MIN",
            Operation::Max => "MAX",
            Operation::Variance => "VARIANCE",
            Operation::StandardDeviation => "STANDARD_DEVIATION",
            Operation::Range => "RANGE",
            Operation::Unique => "UNIQUE",
            Operation::MostFrequent => "MOST_FREQUENT",
            Operation::LeastFrequent => "LEAST_FREQUENT",
            Operation::PercentOf { .. } => "PERCENT_OF",
            Operation::Divide { .. } => "DIVIDE",
            Operation::Multiply { .. } => "MULTIPLY",
            Operation::Subtract { .. } => "SUBTRACT",
            Operation::Assign { operation, .. } => operation.keyword(),
        }
    }
}
