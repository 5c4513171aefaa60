//! WHERE condition evaluation against a single record.

use std::collections::HashMap;

use crate::{
    ast::{CompareOp, CompareValue, Condition},
    executor::EvalError,
    value::{Value, values_equal},
};

/// Evaluate a condition tree against one record. Variable references on the
/// right-hand side resolve against the global variable store; reading one
/// that was never assigned is fatal.
///
/// Conditions degrade rather than abort on shape mismatches: ordering
/// comparisons over non-numeric operands are false, CONTAINS on a
/// non-array field is false, NOT_CONTAINS on a non-array field is true.
pub fn eval_condition(
    condition: &Condition,
    record: &Value,
    variables: &HashMap<String, Value>,
) -> Result<bool, EvalError> {
    match condition {
        Condition::And(left, right) => {
            Ok(eval_condition(left, record, variables)?
                && eval_condition(right, record, variables)?)
        }
        Condition::Or(left, right) => {
            Ok(eval_condition(left, record, variables)?
                || eval_condition(right, record, variables)?)
        }
        Condition::Not(inner) => Ok(!eval_condition(inner, record, variables)?),
        Condition::Compare { field, op, value } => {
            let actual = record.field(field);
            let expected = match value {
                CompareValue::Literal(v) => v.clone(),
                CompareValue::Variable(name) => variables
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UnresolvedVariable(name.clone()))?,
            };
            Ok(compare(&actual, *op, &expected))
        }
    }
}

fn compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(actual, expected),
        CompareOp::NotEq => !values_equal(actual, expected),
        CompareOp::Gt => ordering(actual, expected).is_some_and(|(a, b)| a > b),
        CompareOp::Lt => ordering(actual, expected).is_some_and(|(a, b)| a < b),
        CompareOp::GtEq => ordering(actual, expected).is_some_and(|(a, b)| a >= b),
        CompareOp::LtEq => ordering(actual, expected).is_some_and(|(a, b)| a <= b),
        CompareOp::Contains => match actual {
            Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
            _ => false,
        },
        CompareOp::NotContains => match actual {
            Value::Array(items) => !items.iter().any(|item| values_equal(item, expected)),
            _ => true,
        },
    }
}

fn ordering(a: &Value, b: &Value) -> Option<(f64, f64)> {
    Some((a.as_float()?, b.as_float()?))
}
