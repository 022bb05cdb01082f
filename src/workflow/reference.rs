//! Reference expressions in step inputs.
//!
//! A step input string may embed `{{ path }}` expressions, where `path` is a
//! dot-separated list of non-empty segments:
//!
//! - `{{search.leads}}` reads the `leads` field of step `search`'s result
//! - `{{search.output.leads}}` is the same; `output` segments are skipped
//! - `{{config.scoring.weights}}` reads a static settings namespace
//! - `{{search.leads.0.email}}` indexes into arrays with numeric segments
//!
//! # Example
//!
//! ```
//! use pipewright::workflow::{parse_template, Reference, ReferenceRoot, Segment};
//!
//! let segments = parse_template("Hello {{ search.leads.0.name }}!");
//! assert_eq!(segments[1], Segment::Reference("search.leads.0.name".to_string()));
//!
//! let reference = Reference::parse("search.output.leads").unwrap();
//! assert_eq!(reference.root, ReferenceRoot::Step("search".to_string()));
//! assert_eq!(reference.path(), vec!["leads"]);
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

/// Reserved root segment for static settings.
pub const CONFIG_ROOT: &str = "config";

/// Path segment that is skipped wherever it appears.
pub const TRANSPARENT_SEGMENT: &str = "output";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A piece of a template string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Reference expression between the delimiters, trimmed
    Reference(String),
}

/// What a reference is rooted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceRoot {
    /// `config.<namespace>...`
    Config,
    /// `<step_id>...`
    Step(String),
}

/// A parsed reference expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub root: ReferenceRoot,
    /// Segments after the root, as written.
    pub segments: Vec<String>,
}

/// Malformed reference expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("reference expression is empty")]
    Empty,

    #[error("reference '{expression}' has an empty path segment")]
    EmptySegment { expression: String },

    #[error("config reference '{expression}' must name a namespace")]
    MissingNamespace { expression: String },
}

impl Reference {
    /// Parse the text between the delimiters.
    pub fn parse(expression: &str) -> Result<Self, ReferenceError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(ReferenceError::Empty);
        }

        let parts: Vec<&str> = expression.split('.').map(str::trim).collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ReferenceError::EmptySegment {
                expression: expression.to_string(),
            });
        }

        let root = if parts[0] == CONFIG_ROOT {
            if parts.len() < 2 {
                return Err(ReferenceError::MissingNamespace {
                    expression: expression.to_string(),
                });
            }
            ReferenceRoot::Config
        } else {
            ReferenceRoot::Step(parts[0].to_string())
        };

        Ok(Self {
            root,
            segments: parts[1..].iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Step id this reference depends on, if any.
    pub fn step_id(&self) -> Option<&str> {
        match &self.root {
            ReferenceRoot::Step(id) => Some(id),
            ReferenceRoot::Config => None,
        }
    }

    /// Navigation path with `output` segments removed.
    pub fn path(&self) -> Vec<&str> {
        self.segments
            .iter()
            .map(String::as_str)
            .filter(|segment| *segment != TRANSPARENT_SEGMENT)
            .collect()
    }
}

/// Split a string into literal text and reference expressions.
///
/// An opening `{{` without a matching `}}` is kept as literal text.
pub fn parse_template(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };

        literal.push_str(&rest[..start]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Reference(after_open[..end].trim().to_string()));
        rest = &after_open[end + CLOSE.len()..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

/// Whether a string contains at least one reference expression.
pub fn has_reference(input: &str) -> bool {
    parse_template(input)
        .iter()
        .any(|segment| matches!(segment, Segment::Reference(_)))
}

/// Visit every string the resolver would rewrite in an input mapping.
///
/// Mapping values are visited recursively; lists are entered only through
/// their mapping elements. Strings directly inside lists, numbers and
/// booleans pass through untouched and are not visited.
pub fn visit_strings<'a>(inputs: &'a Map<String, Value>, visit: &mut impl FnMut(&'a str)) {
    for value in inputs.values() {
        match value {
            Value::String(text) => visit(text),
            Value::Object(map) => visit_strings(map, visit),
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(map) = item {
                        visit_strings(map, visit);
                    }
                }
            }
            _ => {}
        }
    }
}

/// All reference expressions in an input mapping, in traversal order.
pub fn references_in(inputs: &Map<String, Value>) -> Vec<String> {
    let mut expressions = Vec::new();
    visit_strings(inputs, &mut |text| {
        for segment in parse_template(text) {
            if let Segment::Reference(expression) = segment {
                expressions.push(expression);
            }
        }
    });
    expressions
}

/// Ids of the steps an input mapping depends on, deduplicated, in first-seen order.
///
/// Malformed expressions are skipped here; the validator reports them.
pub fn step_dependencies(inputs: &Map<String, Value>) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for expression in references_in(inputs) {
        if let Ok(reference) = Reference::parse(&expression) {
            if let Some(id) = reference.step_id() {
                if !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
        }
    }
    ids
}
