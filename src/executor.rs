use std::collections::HashMap;

use crate::{
    ast::{FieldSpec, Operation, Program, QueryBlock, Select},
    conditions::eval_condition,
    ops,
    output::to_json,
    resolver::{self, Leaf},
    value::Value,
};

/// Errors that can occur while executing a program. Fatal to the whole
/// execution: the caller gets either a complete result map or one of these,
/// never a partial map.
///
/// Missing data paths are not errors; they degrade to empty working sets
/// and zero/null aggregates in the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// A variable was read before any assignment wrote it.
    UnresolvedVariable(String),

    /// An aggregate ran over multi-field projection maps, so there is no
    /// single field to reduce.
    AmbiguousAggregate {
        operator: &'static str,
        fields: usize,
    },
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::UnresolvedVariable(name) => {
                write!(f, "Variable {} was read before it was assigned", name)
            }
            EvalError::AmbiguousAggregate { operator, fields } => {
                write!(
                    f,
                    "{} over records with {} fields is ambiguous; SELECT a single field first",
                    operator, fields
                )
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Tree-walking executor.
///
/// Runs every query block against every leaf of the context tree. The
/// working set is private to one block on one leaf and reset by every
/// SELECT; the variable store is one flat namespace shared across all
/// blocks and all leaves for the lifetime of one execution.
#[derive(Default)]
pub struct Executor {
    variables: HashMap<String, Value>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute all query blocks and produce the name-to-result map.
    ///
    /// Blocks run in program order, leaves in axis order inside each
    /// block. When query names collide, the later block's result
    /// overwrites the earlier one.
    pub fn execute(
        &mut self,
        program: &Program,
        data: &Value,
    ) -> Result<HashMap<String, Value>, EvalError> {
        let tree = resolver::resolve(&program.uses, data);

        let mut results = HashMap::new();
        for block in &program.queries {
            let mut leaf_values = Vec::with_capacity(tree.leaves.len());
            for leaf in &tree.leaves {
                leaf_values.push(self.run_block(block, leaf)?);
            }
            results.insert(block.name.clone(), tree.assemble(leaf_values));
        }
        Ok(results)
    }

    /// Run one block against one leaf: operations in source order, working
    /// set threaded through, the last operation's value as the result.
    fn run_block(&mut self, block: &QueryBlock, leaf: &Leaf) -> Result<Value, EvalError> {
        let mut working: Vec<Value> = Vec::new();
        let mut last = Value::Null;
        for operation in &block.operations {
            last = self.run_operation(operation, leaf, &mut working)?;
        }
        Ok(last)
    }

    fn run_operation(
        &mut self,
        operation: &Operation,
        leaf: &Leaf,
        working: &mut Vec<Value>,
    ) -> Result<Value, EvalError> {
        match operation {
            Operation::Select(select) => {
                *working = self.run_select(select, leaf)?;
                Ok(Value::Array(working.clone()))
            }
            // COUNT's SELECT runs in isolation; the caller's working set
            // is never replaced by it.
            Operation::Count(select) => {
                let rows = self.run_select(select, leaf)?;
                Ok(Value::Integer(rows.len() as i64))
            }
            Operation::PercentOf {
                numerator,
                denominator,
            } => {
                let numerator = self.run_select(numerator, leaf)?;
                let denominator = self.run_select(denominator, leaf)?;
                Ok(ops::percent_of(numerator.len(), denominator.len()))
            }
            Operation::Sum
            | Operation::Average
            | Operation::Median
            | Operation::Min
            | Operation::Max
            | Operation::Variance
            | Operation::StandardDeviation
            | Operation::Range
            | Operation::Unique
            | Operation::MostFrequent
            | Operation::LeastFrequent => {
                let values = ops::scalar_values(working, operation.keyword())?;
                Ok(match operation {
                    Operation::Sum => ops::sum(&values),
                    Operation::Average => ops::average(&values),
                    Operation::Median => ops::median(&values),
                    Operation::Min => ops::min(&values),
                    Operation::Max => ops::max(&values),
                    Operation::Variance => ops::variance(&values),
                    Operation::StandardDeviation => ops::standard_deviation(&values),
                    Operation::Range => ops::range(&values),
                    Operation::Unique => ops::unique(&values),
                    Operation::MostFrequent => ops::most_frequent(&values),
                    Operation::LeastFrequent => ops::least_frequent(&values),
                    _ => unreachable!("outer match restricts to plain aggregates"),
                })
            }
            Operation::Divide { dividend, divisor } => {
                let a = self.variable(dividend)?;
                let b = self.variable(divisor)?;
                Ok(ops::divide(&a, &b))
            }
            Operation::Multiply { factor1, factor2 } => {
                let a = self.variable(factor1)?;
                let b = self.variable(factor2)?;
                Ok(ops::multiply(&a, &b))
            }
            Operation::Subtract {
                minuend,
                subtrahend,
            } => {
                let a = self.variable(minuend)?;
                let b = self.variable(subtrahend)?;
                Ok(ops::subtract(&a, &b))
            }
            Operation::Assign {
                variable,
                operation,
            } => {
                let result = self.run_operation(operation, leaf, working)?;
                self.variables.insert(variable.clone(), result.clone());
                Ok(result)
            }
        }
    }

    /// Read a variable from the global store. Reading one that was never
    /// assigned is fatal.
    fn variable(&self, name: &str) -> Result<Value, EvalError> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnresolvedVariable(name.to_string()))
    }

    /// Resolve source rows from the leaf's binding, filter them through the
    /// WHERE condition, and project the requested fields.
    fn run_select(&self, select: &Select, leaf: &Leaf) -> Result<Vec<Value>, EvalError> {
        let source = leaf.binding.resolve(&select.fields);

        let mut filtered: Vec<&Value> = Vec::new();
        for row in source {
            let keep = match &select.condition {
                Some(condition) => eval_condition(condition, row, &self.variables)?,
                None => true,
            };
            if keep {
                filtered.push(row);
            }
        }

        Ok(project(&filtered, select))
    }
}

/// Apply a SELECT's field projection to the filtered rows.
///
/// `*` keeps records whole; a single field yields a flat list of values
/// (non-scalars serialized to their JSON string, or flattened one level
/// under EACH when the field holds an array); multiple fields yield
/// per-record maps with `Null` for absent fields.
fn project(rows: &[&Value], select: &Select) -> Vec<Value> {
    match &select.fields {
        FieldSpec::All => rows.iter().map(|row| (*row).clone()).collect(),
        FieldSpec::Single(field) => {
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let value = row.field(field);
                match value {
                    Value::Array(items) if select.each => out.extend(items),
                    value if value.is_scalar() => out.push(value),
                    value => out.push(Value::String(to_json(&value))),
                }
            }
            out
        }
        FieldSpec::Multiple(fields) => rows
            .iter()
            .map(|row| {
                let projected = fields
                    .iter()
                    .map(|field| (field.clone(), row.field(field)))
                    .collect();
                Value::Object(projected)
            })
            .collect(),
    }
}
