//! The operator library: pure functions behind the aggregate and scalar
//! arithmetic operations.
//!
//! Aggregates reduce the working set the prior SELECT produced. Elements
//! are either scalars or single-field projection maps; a multi-field
//! projection makes the aggregate ambiguous and is reported as an error
//! instead of silently picking a field. Non-numeric values coerce to 0 in
//! the numeric aggregates, so none of them ever produce NaN.

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    executor::EvalError,
    value::{Value, number_value, values_equal},
};

/// Pull the scalar out of each working-set element. A projection map with
/// exactly one field contributes its sole value; more than one field is an
/// ambiguous aggregate.
pub fn scalar_values(working: &[Value], operator: &'static str) -> Result<Vec<Value>, EvalError> {
    working
        .iter()
        .map(|element| match element {
            Value::Object(map) if map.len() == 1 => {
                Ok(map.values().next().cloned().unwrap_or(Value::Null))
            }
            Value::Object(map) => Err(EvalError::AmbiguousAggregate {
                operator,
                fields: map.len(),
            }),
            other => Ok(other.clone()),
        })
        .collect()
}

fn numbers(values: &[Value]) -> Vec<f64> {
    values.iter().map(Value::coerce_float).collect()
}

/// Sum of the values; 0 over an empty set.
pub fn sum(values: &[Value]) -> Value {
    number_value(numbers(values).iter().sum())
}

/// Arithmetic mean; 0 over an empty set.
pub fn average(values: &[Value]) -> Value {
    let numbers = numbers(values);
    if numbers.is_empty() {
        return Value::Integer(0);
    }
    number_value(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

/// Median; the mean of the two middle values for an even count, 0 over an
/// empty set.
pub fn median(values: &[Value]) -> Value {
    let mut numbers = numbers(values);
    if numbers.is_empty() {
        return Value::Integer(0);
    }
    numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = numbers.len() / 2;
    if numbers.len() % 2 == 1 {
        number_value(numbers[mid])
    } else {
        number_value((numbers[mid - 1] + numbers[mid]) / 2.0)
    }
}

/// Smallest value; 0 over an empty set.
pub fn min(values: &[Value]) -> Value {
    match numbers(values).into_iter().reduce(f64::min) {
        Some(n) => number_value(n),
        None => Value::Integer(0),
    }
}

/// Largest value; 0 over an empty set.
pub fn max(values: &[Value]) -> Value {
    match numbers(values).into_iter().reduce(f64::max) {
        Some(n) => number_value(n),
        None => Value::Integer(0),
    }
}

/// Sample variance (n-1 divisor); 0 with fewer than two values.
pub fn variance(values: &[Value]) -> Value {
    number_value(variance_f64(values))
}

/// Square root of the sample variance.
pub fn standard_deviation(values: &[Value]) -> Value {
    number_value(variance_f64(values).sqrt())
}

fn variance_f64(values: &[Value]) -> f64 {
    let numbers = numbers(values);
    if numbers.len() < 2 {
        return 0.0;
    }
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
    let squared: f64 = numbers.iter().map(|n| (n - mean) * (n - mean)).sum();
    squared / (numbers.len() - 1) as f64
}

/// Max minus min; 0 over an empty set.
pub fn range(values: &[Value]) -> Value {
    let numbers = numbers(values);
    match (
        numbers.iter().copied().reduce(f64::min),
        numbers.iter().copied().reduce(f64::max),
    ) {
        (Some(lo), Some(hi)) => number_value(hi - lo),
        _ => Value::Integer(0),
    }
}

/// Distinct values in first-seen order. Nulls are kept.
pub fn unique(values: &[Value]) -> Value {
    let mut seen: Vec<Value> = Vec::new();
    for value in values {
        if !seen.iter().any(|v| values_equal(v, value)) {
            seen.push(value.clone());
        }
    }
    Value::Array(seen)
}

/// The value with the highest occurrence count, first-seen order breaking
/// ties. Nulls are excluded from the count entirely; Null when the set is
/// empty after exclusion.
pub fn most_frequent(values: &[Value]) -> Value {
    pick_by_frequency(values, |best, candidate| candidate > best)
}

/// The value with the lowest occurrence count, first-seen order breaking
/// ties.
pub fn least_frequent(values: &[Value]) -> Value {
    pick_by_frequency(values, |best, candidate| candidate < best)
}

fn pick_by_frequency(values: &[Value], better: impl Fn(usize, usize) -> bool) -> Value {
    let mut counts: Vec<(Value, usize)> = Vec::new();
    for value in values {
        if *value == Value::Null {
            continue;
        }
        match counts.iter_mut().find(|(v, _)| values_equal(v, value)) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.clone(), 1)),
        }
    }

    let mut result: Option<(Value, usize)> = None;
    for (value, count) in counts {
        match &result {
            Some((_, best)) if !better(*best, count) => {}
            _ => result = Some((value, count)),
        }
    }
    result.map(|(value, _)| value).unwrap_or(Value::Null)
}

/// `DIVIDE $a $b`. Division by zero saturates to 0 instead of raising.
pub fn divide(dividend: &Value, divisor: &Value) -> Value {
    if divisor.coerce_float() == 0.0 {
        return Value::Integer(0);
    }
    match (dividend, divisor) {
        (Value::Integer(a), Value::Integer(b)) => {
            match (a.checked_div(*b), a.checked_rem(*b)) {
                (Some(quotient), Some(0)) => Value::Integer(quotient),
                _ => Value::Float(*a as f64 / *b as f64),
            }
        }
        (a, b) => {
            let (a, b) = (a.coerce_float(), b.coerce_float());
            decimal_binop(a, b, |x, y| x / y, a / b)
        }
    }
}

/// `MULTIPLY $a $b`.
pub fn multiply(factor1: &Value, factor2: &Value) -> Value {
    match (factor1, factor2) {
        // Overflowing products fall through to decimal arithmetic.
        (Value::Integer(a), Value::Integer(b)) => match a.checked_mul(*b) {
            Some(product) => Value::Integer(product),
            None => {
                let (a, b) = (*a as f64, *b as f64);
                decimal_binop(a, b, |x, y| x * y, a * b)
            }
        },
        (a, b) => {
            let (a, b) = (a.coerce_float(), b.coerce_float());
            decimal_binop(a, b, |x, y| x * y, a * b)
        }
    }
}

/// `SUBTRACT $a $b`.
pub fn subtract(minuend: &Value, subtrahend: &Value) -> Value {
    match (minuend, subtrahend) {
        (Value::Integer(a), Value::Integer(b)) => match a.checked_sub(*b) {
            Some(difference) => Value::Integer(difference),
            None => {
                let (a, b) = (*a as f64, *b as f64);
                decimal_binop(a, b, |x, y| x - y, a - b)
            }
        },
        (a, b) => {
            let (a, b) = (a.coerce_float(), b.coerce_float());
            decimal_binop(a, b, |x, y| x - y, a - b)
        }
    }
}

/// Decimal arithmetic keeps results exact, so 2.5 * 4 comes back as the
/// integer 10 rather than a float with drift.
fn decimal_binop(a: f64, b: f64, op: impl Fn(Decimal, Decimal) -> Decimal, fallback: f64) -> Value {
    if let (Some(ad), Some(bd)) = (Decimal::from_f64(a), Decimal::from_f64(b)) {
        let rd = op(ad, bd);
        if rd.is_integer()
            && let Some(r) = rd.to_i64()
        {
            return Value::Integer(r);
        } else if let Some(r) = rd.to_f64() {
            return Value::Float(r);
        }
    }
    Value::Float(fallback)
}

/// `100 * |numerator| / |denominator|`, 0 when the denominator is empty.
pub fn percent_of(numerator: usize, denominator: usize) -> Value {
    if denominator == 0 {
        return Value::Integer(0);
    }
    let scaled = 100 * numerator;
    if scaled % denominator == 0 {
        Value::Integer((scaled / denominator) as i64)
    } else {
        Value::Float(scaled as f64 / denominator as f64)
    }
}
