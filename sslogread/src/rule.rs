//! The `Rule` filter type and its argument-predicate grammar. `Rule` itself
//! is plain data (serde round-trippable, like any other config struct); the
//! wildcard compilation and per-record evaluation live in [`crate::query`].

use crate::error::{MalformedPredicateSnafu, ReadError};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use sslog_format::{Arg, Level};

/// One AND-group of filter criteria. A query is an ordered list of `Rule`s,
/// OR-combined: a record passes the query iff it passes at least one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub level_min: Level,
    pub level_max: Level,
    pub buffer_size_min: usize,
    pub buffer_size_max: usize,
    /// Positive wildcard pattern against the category name. Empty = no constraint.
    pub category: String,
    /// Negative wildcard pattern against the category name.
    pub no_category: String,
    pub thread: String,
    pub no_thread: String,
    /// Matched against the format-string template, not the substituted result.
    pub format: String,
    pub no_format: String,
    /// `"name op value"` or bare `"name"` tokens, all of which must pass.
    pub arguments: Vec<String>,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            level_min: Level::Trace,
            level_max: Level::Critical,
            buffer_size_min: 0,
            buffer_size_max: 65_535,
            category: String::new(),
            no_category: String::new(),
            thread: String::new(),
            no_thread: String::new(),
            format: String::new(),
            no_format: String::new(),
            arguments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A parsed `name op value` (or bare `name`) argument predicate.
#[derive(Debug, Clone)]
pub struct ArgPredicate {
    pub name: String,
    /// `None` means "present" — the bare-`name` form.
    pub op: Option<PredicateOp>,
    pub raw_value: String,
}

impl ArgPredicate {
    pub fn parse(token: &str) -> Result<Self, ReadError> {
        let trimmed = token.trim();
        ensure!(
            !trimmed.is_empty(),
            MalformedPredicateSnafu { token: token.to_string() }
        );
        let Some((op_pos, op_len, op)) = find_operator(trimmed) else {
            return Ok(Self {
                name: trimmed.to_string(),
                op: None,
                raw_value: String::new(),
            });
        };
        let name = trimmed[..op_pos].trim();
        let value = trimmed[op_pos + op_len..].trim();
        ensure!(
            !name.is_empty() && !value.is_empty(),
            MalformedPredicateSnafu { token: token.to_string() }
        );
        Ok(Self {
            name: name.to_string(),
            op: Some(op),
            raw_value: value.to_string(),
        })
    }

    /// Evaluates this predicate against the first argument whose interned
    /// name matches `self.name`. `resolve_string` turns a `StringIdx`
    /// argument into its text for string-valued comparisons.
    pub fn eval(
        &self,
        args: &[Arg],
        arg_specs: &[(String, String)],
        resolve_string: impl Fn(u32) -> Option<String>,
    ) -> bool {
        let Some(idx) = arg_specs.iter().position(|(name, _)| name == &self.name) else {
            return false;
        };
        let Some(arg) = args.get(idx) else {
            return false;
        };
        match self.op {
            None => true,
            Some(op) => match arg {
                Arg::StringIdx(id) => {
                    // Exact match only, no wildcards: only equality is
                    // well-defined for a string-typed argument.
                    op == PredicateOp::Eq
                        && resolve_string(*id).as_deref() == Some(self.raw_value.as_str())
                }
                numeric => eval_numeric(op, numeric, &self.raw_value),
            },
        }
    }
}

fn find_operator(s: &str) -> Option<(usize, usize, PredicateOp)> {
    let bytes = s.as_bytes();
    for i in 0..bytes.len() {
        match (bytes[i], bytes.get(i + 1)) {
            (b'=', Some(b'=')) => return Some((i, 2, PredicateOp::Eq)),
            (b'<', Some(b'=')) => return Some((i, 2, PredicateOp::Le)),
            (b'>', Some(b'=')) => return Some((i, 2, PredicateOp::Ge)),
            (b'=', _) => return Some((i, 1, PredicateOp::Eq)),
            (b'<', _) => return Some((i, 1, PredicateOp::Lt)),
            (b'>', _) => return Some((i, 1, PredicateOp::Gt)),
            _ => {}
        }
    }
    None
}

fn eval_numeric(op: PredicateOp, arg: &Arg, raw_value: &str) -> bool {
    match *arg {
        Arg::Float(v) => match raw_value.parse::<f32>() {
            Ok(parsed) => apply_float_op(op, v as f64, parsed as f64, v.to_bits() as u64 == parsed.to_bits() as u64),
            Err(_) => false,
        },
        Arg::Double(v) => match raw_value.parse::<f64>() {
            Ok(parsed) => apply_float_op(op, v, parsed, v.to_bits() == parsed.to_bits()),
            Err(_) => false,
        },
        Arg::S32(v) => eval_signed(op, v as i64, raw_value),
        Arg::S64(v) => eval_signed(op, v, raw_value),
        Arg::U32(v) => eval_unsigned(op, v as u64, raw_value),
        Arg::U64(v) => eval_unsigned(op, v, raw_value),
        Arg::StringIdx(_) => false,
    }
}

fn apply_float_op(op: PredicateOp, v: f64, parsed: f64, bit_eq: bool) -> bool {
    match op {
        PredicateOp::Eq => bit_eq,
        PredicateOp::Lt => v < parsed,
        PredicateOp::Le => v <= parsed,
        PredicateOp::Gt => v > parsed,
        PredicateOp::Ge => v >= parsed,
    }
}

fn eval_signed(op: PredicateOp, v: i64, raw_value: &str) -> bool {
    let Ok(parsed) = raw_value.parse::<i64>() else {
        return false;
    };
    match op {
        PredicateOp::Eq => v == parsed,
        PredicateOp::Lt => v < parsed,
        PredicateOp::Le => v <= parsed,
        PredicateOp::Gt => v > parsed,
        PredicateOp::Ge => v >= parsed,
    }
}

fn eval_unsigned(op: PredicateOp, v: u64, raw_value: &str) -> bool {
    let Ok(parsed) = raw_value.parse::<u64>() else {
        return false;
    };
    match op {
        PredicateOp::Eq => v == parsed,
        PredicateOp::Lt => v < parsed,
        PredicateOp::Le => v <= parsed,
        PredicateOp::Gt => v > parsed,
        PredicateOp::Ge => v >= parsed,
    }
}
