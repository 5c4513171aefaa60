use crate::ast::Operation;

/// Program root: every USE declaration and every query block, in source
/// order. USE declarations are program-wide; a query always sees the union
/// of all of them.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub uses: Vec<UsePath>,
    pub queries: Vec<QueryBlock>,
}

/// One segment of a USE path: a single name, or a bracketed set of
/// alternative names.
///
/// # Examples
/// ```text
/// y2024           -> Segment { alternatives: ["y2024"] }
/// [week1,week2]   -> Segment { alternatives: ["week1", "week2"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub alternatives: Vec<String>,
}

impl Segment {
    pub fn single(name: impl Into<String>) -> Self {
        Segment {
            alternatives: vec![name.into()],
        }
    }

    /// A segment with more than one alternative branches the context tree.
    pub fn is_axis(&self) -> bool {
        self.alternatives.len() > 1
    }
}

/// A USE path template.
///
/// Segments address into the data tree; a bracketed list in the final
/// position is not a segment but a field set restricting which fields of
/// the target records are pulled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsePath {
    pub segments: Vec<Segment>,
    pub fields: Option<Vec<String>>,
}

impl UsePath {
    /// The dotted path text as written in the source, alternatives rendered
    /// verbatim. Used by hosts to pre-fetch or validate required data.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = self
            .segments
            .iter()
            .map(|seg| {
                if seg.alternatives.len() == 1 {
                    seg.alternatives[0].clone()
                } else {
                    format!("[{}]", seg.alternatives.join(","))
                }
            })
            .collect();
        if let Some(fields) = &self.fields {
            parts.push(format!("[{}]", fields.join(",")));
        }
        parts.join(".")
    }
}

/// A named query block: an ordered operation pipeline terminated by RETURN.
///
/// Name uniqueness is not enforced; when names collide the later block's
/// result overwrites the earlier one in the final result map.
#[derive(Debug, Clone)]
pub struct QueryBlock {
    pub name: String,
    pub operations: Vec<Operation>,
}
