//! Resolution of USE path templates against the data tree.
//!
//! A USE path may carry bracketed alternatives at a segment position; each
//! such position is an *axis* and the engine evaluates every query once per
//! combination of axis choices. Resolution produces a [`ContextTree`]: the
//! ordered axis list plus one [`Leaf`] per combination, each leaf holding
//! the [`Binding`] (field name to record rows) reached by substituting its
//! choices into every template.
//!
//! Missing data is never an error here: a template whose concrete path does
//! not exist in the tree simply contributes nothing to that leaf, so
//! queries over sparse datasets degrade to empty working sets.

use std::collections::HashMap;

use crate::{
    ast::{FieldSpec, UsePath},
    value::Value,
};

/// A path segment position with more than one alternative. Two templates
/// sharing a position with an identical alternative set collapse onto one
/// axis, so `y.[w1,w2].a` and `y.[w1,w2].b` branch together instead of
/// producing a four-way cross product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    pub position: usize,
    pub alternatives: Vec<String>,
}

/// One template's contribution to a leaf: the rows it exposes under a
/// binding name.
#[derive(Debug, Clone)]
pub struct BindingEntry {
    pub name: String,
    pub rows: Vec<Value>,
    /// Index of the USE declaration this entry came from; used for the
    /// earliest-declaration priority rule when a SELECT could be served by
    /// several entries.
    pub use_index: usize,
}

/// The field-name to record-rows associations resolved for one leaf.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    pub entries: Vec<BindingEntry>,
}

impl Binding {
    /// Insert a contribution. A later USE declaration exposing a name an
    /// earlier one already claimed overwrites it in place.
    fn insert(&mut self, name: String, rows: Vec<Value>, use_index: usize) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.rows = rows;
            entry.use_index = use_index;
        } else {
            self.entries.push(BindingEntry {
                name,
                rows,
                use_index,
            });
        }
    }

    /// Pick the source rows for a SELECT. An exact binding-name match wins;
    /// otherwise the entry from the earliest USE declaration whose records
    /// expose a requested field; for `*`, the earliest entry outright.
    pub fn resolve(&self, fields: &FieldSpec) -> &[Value] {
        let requested: Vec<&str> = match fields {
            FieldSpec::All => {
                return self
                    .earliest()
                    .map(|entry| entry.rows.as_slice())
                    .unwrap_or(&[]);
            }
            FieldSpec::Single(name) => vec![name.as_str()],
            FieldSpec::Multiple(names) => names.iter().map(String::as_str).collect(),
        };

        if let Some(entry) = self
            .ordered()
            .into_iter()
            .find(|entry| requested.contains(&entry.name.as_str()))
        {
            return &entry.rows;
        }

        self.ordered()
            .into_iter()
            .find(|entry| {
                entry.rows.iter().any(|row| match row {
                    Value::Object(map) => requested.iter().any(|f| map.contains_key(*f)),
                    _ => false,
                })
            })
            .map(|entry| entry.rows.as_slice())
            .unwrap_or(&[])
    }

    fn earliest(&self) -> Option<&BindingEntry> {
        self.ordered().into_iter().next()
    }

    fn ordered(&self) -> Vec<&BindingEntry> {
        let mut entries: Vec<&BindingEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.use_index);
        entries
    }
}

/// One concrete combination of axis choices with its resolved binding.
#[derive(Debug, Clone)]
pub struct Leaf {
    /// Chosen alternative per axis, in axis order. Empty when the program
    /// has no axes.
    pub choices: Vec<String>,
    pub binding: Binding,
}

/// The fully resolved shape of the data under all USE templates.
#[derive(Debug, Clone)]
pub struct ContextTree {
    pub axes: Vec<Axis>,
    pub leaves: Vec<Leaf>,
}

impl ContextTree {
    /// Fold per-leaf result values back into the shape the caller sees:
    /// the bare value when there are no axes, otherwise one level of map
    /// per axis keyed by the chosen alternative, first axis outermost.
    pub fn assemble(&self, leaf_values: Vec<Value>) -> Value {
        if self.axes.is_empty() {
            return leaf_values.into_iter().next().unwrap_or(Value::Null);
        }

        let mut root: HashMap<String, Value> = HashMap::new();
        for (leaf, value) in self.leaves.iter().zip(leaf_values) {
            insert_at(&mut root, &leaf.choices, value);
        }
        Value::Object(root)
    }
}

fn insert_at(map: &mut HashMap<String, Value>, choices: &[String], value: Value) {
    match choices {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [first, rest @ ..] => {
            let child = map
                .entry(first.clone())
                .or_insert_with(|| Value::Object(HashMap::new()));
            if let Value::Object(inner) = child {
                insert_at(inner, rest, value);
            }
        }
    }
}

/// Build the context tree for a program's USE declarations against the
/// root data tree.
pub fn resolve(uses: &[UsePath], data: &Value) -> ContextTree {
    let axes = collect_axes(uses);
    let combinations = cartesian(&axes);

    let leaves = combinations
        .into_iter()
        .map(|choices| {
            let mut binding = Binding::default();
            for (use_index, path) in uses.iter().enumerate() {
                let Some(target) = walk_template(path, &axes, &choices, data) else {
                    continue;
                };
                let rows = rows_from(target, path.fields.as_deref());
                for name in binding_names(path, &axes, &choices) {
                    binding.insert(name, rows.clone(), use_index);
                }
            }
            Leaf { choices, binding }
        })
        .collect();

    ContextTree { axes, leaves }
}

/// The names a template's binding is keyed by on one leaf: the field-set
/// fields when present, otherwise the final segment name. A final segment
/// that is itself an axis keys by the leaf's chosen alternative, so
/// `USE [east,west]` binds as `east` on one leaf and `west` on the other.
fn binding_names(path: &UsePath, axes: &[Axis], choices: &[String]) -> Vec<String> {
    if let Some(fields) = &path.fields {
        return fields.clone();
    }

    let position = path.segments.len().wrapping_sub(1);
    let Some(segment) = path.segments.last() else {
        return Vec::new();
    };

    if segment.is_axis()
        && let Some(axis_index) = axes
            .iter()
            .position(|axis| axis.position == position && axis.alternatives == segment.alternatives)
        && let Some(choice) = choices.get(axis_index)
    {
        return vec![choice.clone()];
    }

    vec![segment.alternatives[0].clone()]
}

/// Scan every template left to right and collect its axes in order of
/// first appearance, collapsing identical (position, alternatives) pairs.
fn collect_axes(uses: &[UsePath]) -> Vec<Axis> {
    let mut axes: Vec<Axis> = Vec::new();
    for path in uses {
        for (position, segment) in path.segments.iter().enumerate() {
            if !segment.is_axis() {
                continue;
            }
            let axis = Axis {
                position,
                alternatives: segment.alternatives.clone(),
            };
            if !axes.contains(&axis) {
                axes.push(axis);
            }
        }
    }
    axes
}

/// Enumerate every combination of axis alternatives, first axis varying
/// slowest. No axes yields the single empty combination.
fn cartesian(axes: &[Axis]) -> Vec<Vec<String>> {
    let mut combinations: Vec<Vec<String>> = vec![Vec::new()];
    for axis in axes {
        let mut next = Vec::with_capacity(combinations.len() * axis.alternatives.len());
        for combination in &combinations {
            for alternative in &axis.alternatives {
                let mut extended = combination.clone();
                extended.push(alternative.clone());
                next.push(extended);
            }
        }
        combinations = next;
    }
    combinations
}

/// Substitute a leaf's axis choices into a template and walk the data tree
/// along the concrete path. `None` when any segment is absent.
fn walk_template<'a>(
    path: &UsePath,
    axes: &[Axis],
    choices: &[String],
    data: &'a Value,
) -> Option<&'a Value> {
    let mut current = data;
    for (position, segment) in path.segments.iter().enumerate() {
        let name = if segment.is_axis() {
            let axis_index = axes.iter().position(|axis| {
                axis.position == position && axis.alternatives == segment.alternatives
            })?;
            choices.get(axis_index)?.as_str()
        } else {
            segment.alternatives[0].as_str()
        };

        match current {
            Value::Object(map) => current = map.get(name)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Shape the walked-to location into binding rows, applying the template's
/// field projection when one was given.
fn rows_from(target: &Value, fields: Option<&[String]>) -> Vec<Value> {
    let project = |record: &Value| match (record, fields) {
        (Value::Object(map), Some(fields)) => {
            let projected = fields
                .iter()
                .map(|f| (f.clone(), map.get(f).cloned().unwrap_or(Value::Null)))
                .collect();
            Value::Object(projected)
        }
        _ => record.clone(),
    };

    match target {
        Value::Array(records) => records.iter().map(project).collect(),
        other => vec![project(other)],
    }
}
