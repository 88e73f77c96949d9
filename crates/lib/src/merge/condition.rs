//! Conditions on a value tree, used by conditional defaults and by `which`.
//!
//! Conditions have a compact textual form:
//!
//! | Text       | Meaning                                  |
//! |------------|------------------------------------------|
//! | `/p`       | a value is stored at `/p`                |
//! | `!/p`      | nothing is stored at `/p`                |
//! | `/p=`      | `/p` is absent or empty                  |
//! | `/p!=`     | `/p` is populated                        |
//! | `/p=v`     | `/p` equals `v`                          |
//! | `/p!=v`    | `/p` does not equal `v`                  |
//! | `/p<v` ... | ordered comparison (`<`, `<=`, `>`, `>=`) |
//! | `/p~v`     | the list at `/p` contains `v`            |
//!
//! Literals are integers, `true`/`false`, `null`, or otherwise text.
//!
//! ```
//! # use ensemble::merge::{Condition, Predicate};
//! # use ensemble::value::Scalar;
//! let condition: Condition = "/port>=1024".parse().unwrap();
//! assert_eq!(condition.predicate(), &Predicate::Ge(Scalar::Int(1024)));
//! assert_eq!(condition.to_string(), "/port>=1024");
//! ```

use std::{cmp::Ordering, fmt, str::FromStr};

use tracing::trace;

use super::DefaultError;
use crate::{
    address::{self, Address, AddressError},
    path::Path,
    schema::Schema,
    value::{Scalar, Value},
};

/// A test applied to whatever is stored at one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Something (possibly empty) is stored
    Exists,
    /// Nothing is stored
    NotExists,
    /// Absent or empty
    Empty,
    /// Populated
    NotEmpty,
    Eq(Value),
    /// Not equal; an absent value is never equal
    Ne(Value),
    Lt(Scalar),
    Le(Scalar),
    Gt(Scalar),
    Ge(Scalar),
    /// The list stored here has an item equal to the scalar
    Contains(Scalar),
}

impl Predicate {
    /// Evaluates the predicate against the value found at the path, if any.
    pub fn test(&self, found: Option<&Value>) -> bool {
        match self {
            Predicate::Exists => found.is_some(),
            Predicate::NotExists => found.is_none(),
            Predicate::Empty => found.is_none_or(Value::is_empty),
            Predicate::NotEmpty => found.is_some_and(Value::is_populated),
            Predicate::Eq(expected) => found == Some(expected),
            Predicate::Ne(expected) => found != Some(expected),
            Predicate::Lt(bound) => compare(found, bound, Ordering::is_lt),
            Predicate::Le(bound) => compare(found, bound, Ordering::is_le),
            Predicate::Gt(bound) => compare(found, bound, Ordering::is_gt),
            Predicate::Ge(bound) => compare(found, bound, Ordering::is_ge),
            Predicate::Contains(item) => found
                .and_then(Value::as_list)
                .is_some_and(|items| items.iter().any(|v| v.as_scalar() == Some(item))),
        }
    }
}

fn compare(found: Option<&Value>, bound: &Scalar, accept: fn(Ordering) -> bool) -> bool {
    found
        .and_then(Value::as_scalar)
        .and_then(|scalar| scalar.partial_cmp(bound))
        .is_some_and(accept)
}

/// A path paired with a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    path: Path,
    predicate: Predicate,
}

impl Condition {
    pub fn new(path: impl Into<Path>, predicate: Predicate) -> Self {
        Self {
            path: path.into(),
            predicate,
        }
    }

    /// Shorthand for an equality condition.
    pub fn eq(path: impl Into<Path>, value: impl Into<Value>) -> Self {
        Self::new(path, Predicate::Eq(value.into()))
    }

    /// Shorthand for an existence condition.
    pub fn exists(path: impl Into<Path>) -> Self {
        Self::new(path, Predicate::Exists)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Resolves the path against `schema` so the condition can be evaluated
    /// repeatedly.
    pub fn compile(&self, schema: &Schema) -> Result<CompiledCondition, AddressError> {
        Ok(CompiledCondition {
            address: schema.address(&self.path)?,
            predicate: self.predicate.clone(),
        })
    }
}

/// A condition whose path has been validated against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCondition {
    address: Address,
    predicate: Predicate,
}

impl CompiledCondition {
    /// Evaluates the condition against a tree.
    ///
    /// A tree that disagrees with the schema along the path does not match.
    pub fn matches(&self, tree: Option<&Value>) -> bool {
        match address::resolve(tree, &self.address) {
            Ok(resolved) => self.predicate.test(resolved.value()),
            Err(err) => {
                trace!(path = %self.address, error = %err, "Condition path did not resolve");
                false
            }
        }
    }
}

/// Parses a condition literal.
fn parse_literal(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::from(n);
    }
    match text {
        "true" => Value::from(true),
        "false" => Value::from(false),
        "null" => Value::null(),
        _ => Value::from(text),
    }
}

fn parse_scalar(condition: &str, text: &str) -> Result<Scalar, DefaultError> {
    match parse_literal(text) {
        Value::Scalar(scalar) if !scalar.is_empty() => Ok(scalar),
        _ => Err(DefaultError::InvalidCondition {
            condition: condition.to_string(),
            reason: "expected a non-empty literal".to_string(),
        }),
    }
}

impl FromStr for Condition {
    type Err = DefaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: &str| DefaultError::InvalidCondition {
            condition: s.to_string(),
            reason: reason.to_string(),
        };

        if let Some(rest) = s.strip_prefix('!') {
            if rest.contains(['=', '<', '>', '~', '!']) {
                return Err(invalid("'!' prefix takes a bare path"));
            }
            return Ok(Condition::new(rest, Predicate::NotExists));
        }

        let Some(split) = s.find(['=', '!', '<', '>', '~']) else {
            return Ok(Condition::exists(s));
        };
        let (path, rest) = s.split_at(split);
        if path.is_empty() {
            return Err(invalid("missing path"));
        }

        let (op, literal) = ["!=", "<=", ">=", "=", "<", ">", "~"]
            .iter()
            .find_map(|op| rest.strip_prefix(op).map(|literal| (*op, literal)))
            .ok_or_else(|| invalid("unknown operator"))?;

        let predicate = match (op, literal.is_empty()) {
            ("=", true) => Predicate::Empty,
            ("!=", true) => Predicate::NotEmpty,
            ("=", false) => Predicate::Eq(parse_literal(literal)),
            ("!=", false) => Predicate::Ne(parse_literal(literal)),
            ("<", _) => Predicate::Lt(parse_scalar(s, literal)?),
            ("<=", _) => Predicate::Le(parse_scalar(s, literal)?),
            (">", _) => Predicate::Gt(parse_scalar(s, literal)?),
            (">=", _) => Predicate::Ge(parse_scalar(s, literal)?),
            _ => Predicate::Contains(parse_scalar(s, literal)?),
        };
        Ok(Condition::new(path, predicate))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        match &self.predicate {
            Predicate::Exists => write!(f, "{path}"),
            Predicate::NotExists => write!(f, "!{path}"),
            Predicate::Empty => write!(f, "{path}="),
            Predicate::NotEmpty => write!(f, "{path}!="),
            Predicate::Eq(v) => write!(f, "{path}={}", Literal(v)),
            Predicate::Ne(v) => write!(f, "{path}!={}", Literal(v)),
            Predicate::Lt(s) => write!(f, "{path}<{s}"),
            Predicate::Le(s) => write!(f, "{path}<={s}"),
            Predicate::Gt(s) => write!(f, "{path}>{s}"),
            Predicate::Ge(s) => write!(f, "{path}>={s}"),
            Predicate::Contains(s) => write!(f, "{path}~{s}"),
        }
    }
}

/// Renders scalars bare and containers as JSON.
struct Literal<'a>(&'a Value);

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Scalar(s) => write!(f, "{s}"),
            other => write!(f, "{other}"),
        }
    }
}
