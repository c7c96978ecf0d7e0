//! Compiles a query (an ordered list of [`Rule`]s) into something cheap to
//! evaluate per record.
//!
//! Criteria within one rule are checked cheapest-first — level range, then
//! buffer size, then patterns, then argument predicates — so a record that
//! fails an early, branch-free check never reaches the string lookups or
//! predicate evaluation. Positive/negative name patterns are wrapped in
//! [`CachedPattern`], which remembers the match result per interned-string
//! id for the life of the query: a wildcard pattern is re-run once per
//! distinct id, not once per record.

use crate::rule::{ArgPredicate, Rule};
use crate::wildcard::Pattern;
use crate::ReadError;
use parking_lot::Mutex;
use sslog_format::{Level, LogRecord};
use std::collections::HashMap;

struct CachedPattern {
    pattern: Pattern,
    cache: Mutex<HashMap<u32, bool>>,
}

impl CachedPattern {
    fn new(raw: &str) -> Self {
        Self {
            pattern: Pattern::compile(raw),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    fn matches_id(&self, id: u32, resolve: &impl Fn(u32) -> Option<Vec<u8>>) -> bool {
        if let Some(&cached) = self.cache.lock().get(&id) {
            return cached;
        }
        let bytes = resolve(id).unwrap_or_default();
        let result = self.pattern.matches(&bytes);
        self.cache.lock().insert(id, result);
        result
    }
}

pub(crate) struct CompiledRule {
    level_min: Level,
    level_max: Level,
    buffer_size_min: usize,
    buffer_size_max: usize,
    category: CachedPattern,
    no_category: CachedPattern,
    thread: CachedPattern,
    no_thread: CachedPattern,
    format: CachedPattern,
    no_format: CachedPattern,
    arguments: Vec<ArgPredicate>,
}

impl CompiledRule {
    pub(crate) fn compile(rule: &Rule) -> Result<Self, ReadError> {
        let arguments = rule
            .arguments
            .iter()
            .map(|token| ArgPredicate::parse(token))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            level_min: rule.level_min,
            level_max: rule.level_max,
            buffer_size_min: rule.buffer_size_min,
            buffer_size_max: rule.buffer_size_max,
            category: CachedPattern::new(&rule.category),
            no_category: CachedPattern::new(&rule.no_category),
            thread: CachedPattern::new(&rule.thread),
            no_thread: CachedPattern::new(&rule.no_thread),
            format: CachedPattern::new(&rule.format),
            no_format: CachedPattern::new(&rule.no_format),
            arguments,
        })
    }

    /// `resolve` looks up an interned string's raw bytes by id; `arg_specs`
    /// is the `(name, unit)` list for the record's format string, used to
    /// locate named arguments for `self.arguments`.
    fn matches(
        &self,
        record: &LogRecord,
        arg_specs: &[(String, String)],
        resolve: &impl Fn(u32) -> Option<Vec<u8>>,
    ) -> bool {
        if record.level < self.level_min || record.level > self.level_max {
            return false;
        }
        let buf_len = record.buffer.len();
        if buf_len < self.buffer_size_min || buf_len > self.buffer_size_max {
            return false;
        }

        if !self.category.is_empty() && !self.category.matches_id(record.category_idx, resolve) {
            return false;
        }
        if !self.no_category.is_empty() && self.no_category.matches_id(record.category_idx, resolve) {
            return false;
        }
        if !self.thread.is_empty() && !self.thread.matches_id(record.thread_idx, resolve) {
            return false;
        }
        if !self.no_thread.is_empty() && self.no_thread.matches_id(record.thread_idx, resolve) {
            return false;
        }
        if !self.format.is_empty() && !self.format.matches_id(record.format_idx, resolve) {
            return false;
        }
        if !self.no_format.is_empty() && self.no_format.matches_id(record.format_idx, resolve) {
            return false;
        }

        if self.arguments.is_empty() {
            return true;
        }
        let resolve_string = |id: u32| resolve(id).map(|b| String::from_utf8_lossy(&b).into_owned());
        self.arguments
            .iter()
            .all(|predicate| predicate.eval(&record.args, arg_specs, &resolve_string))
    }
}

/// A compiled query: an OR of [`CompiledRule`]s. An empty `rules` slice
/// compiles to a single implicit empty rule, so `query(rules=[])` and
/// `query(rules=[Rule::default()])` are equivalent.
pub(crate) struct CompiledQuery {
    rules: Vec<CompiledRule>,
}

impl CompiledQuery {
    pub(crate) fn compile(rules: &[Rule]) -> Result<Self, ReadError> {
        let rules = if rules.is_empty() {
            vec![CompiledRule::compile(&Rule::default())?]
        } else {
            rules
                .iter()
                .map(CompiledRule::compile)
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(Self { rules })
    }

    /// Returns the index of the first rule `record` passes, or `None` if it
    /// passes none of them.
    pub(crate) fn first_matching_rule(
        &self,
        record: &LogRecord,
        arg_specs: &[(String, String)],
        resolve: &impl Fn(u32) -> Option<Vec<u8>>,
    ) -> Option<usize> {
        self.rules
            .iter()
            .position(|rule| rule.matches(record, arg_specs, resolve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sslog_format::Arg;

    fn record(level: Level, category_idx: u32, format_idx: u32, args: Vec<Arg>) -> LogRecord {
        LogRecord {
            timestamp_utc_ns: 0,
            level,
            thread_idx: 0,
            category_idx,
            format_idx,
            args,
            buffer: Vec::new(),
        }
    }

    fn strings() -> Vec<(u32, &'static str)> {
        vec![(1, "ui"), (2, "net"), (3, "voltage=%3.1f_V intensity=%dmA")]
    }

    fn resolve(id: u32) -> Option<Vec<u8>> {
        strings()
            .into_iter()
            .find(|(i, _)| *i == id)
            .map(|(_, s)| s.as_bytes().to_vec())
    }

    #[test]
    fn empty_rule_matches_everything() {
        let q = CompiledQuery::compile(&[]).unwrap();
        let rec = record(Level::Trace, 1, 3, vec![]);
        assert_eq!(q.first_matching_rule(&rec, &[], &resolve), Some(0));
    }

    #[test]
    fn level_and_category_or_combine() {
        let rules = vec![
            Rule {
                level_min: Level::Warn,
                ..Rule::default()
            },
            Rule {
                category: "ui".to_string(),
                ..Rule::default()
            },
        ];
        let q = CompiledQuery::compile(&rules).unwrap();

        let warn_other_cat = record(Level::Warn, 2, 3, vec![]);
        assert_eq!(q.first_matching_rule(&warn_other_cat, &[], &resolve), Some(0));

        let info_ui = record(Level::Info, 1, 3, vec![]);
        assert_eq!(q.first_matching_rule(&info_ui, &[], &resolve), Some(1));

        let info_net = record(Level::Info, 2, 3, vec![]);
        assert_eq!(q.first_matching_rule(&info_net, &[], &resolve), None);
    }

    #[test]
    fn wildcard_format_and_argument_predicate() {
        let rules = vec![Rule {
            format: "voltage=*".to_string(),
            arguments: vec!["intensity>=500".to_string()],
            ..Rule::default()
        }];
        let q = CompiledQuery::compile(&rules).unwrap();
        let specs = vec![("voltage".to_string(), "V".to_string()), ("intensity".to_string(), "mA".to_string())];

        let high = record(Level::Info, 1, 3, vec![Arg::Double(3.1), Arg::S32(700)]);
        assert_eq!(q.first_matching_rule(&high, &specs, &resolve), Some(0));

        let low = record(Level::Info, 1, 3, vec![Arg::Double(3.1), Arg::S32(10)]);
        assert_eq!(q.first_matching_rule(&low, &specs, &resolve), None);
    }
}
