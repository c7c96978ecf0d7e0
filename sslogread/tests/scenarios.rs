//! A true cross-crate check: a real `sslog::Collector` writes a session
//! directory, and `LogSession` reads it back and filters it.

use sslog::{ArgInput, Collector, Level};
use sslogread::{LogSession, Rule};

fn write_sample_session(dir: &std::path::Path) {
    let c = Collector::new();
    c.set_storage_path(dir);
    c.set_storage_level(Level::Trace);
    c.start().unwrap();

    c.log(Level::Trace, "a", "hello", &[], None);
    c.log(Level::Warn, "a", "warning! code=%d", &[ArgInput::from(1)], None);
    c.log(Level::Info, "b", "voltage=%3.1f_V intensity=%dmA", &[ArgInput::from(3.5f32), ArgInput::from(700i32)], None);
    c.log(Level::Info, "b", "voltage=%3.1f_V intensity=%dmA", &[ArgInput::from(3.5f32), ArgInput::from(100i32)], None);
    c.log(Level::Critical, "c", "meltdown", &[], None);

    c.stop();
}

/// OR of two rules: every record matching level>=warn OR category "a" is
/// yielded exactly once.
#[test]
fn scenario_d_or_of_two_rules_yields_each_record_once() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_session(dir.path());
    let session = LogSession::init(dir.path()).unwrap();

    let rules = vec![
        Rule {
            level_min: Level::Warn,
            ..Rule::default()
        },
        Rule {
            category: "a".to_string(),
            ..Rule::default()
        },
    ];

    let mut matched = Vec::new();
    session
        .query(&rules, |rule_idx, rec| {
            matched.push((rule_idx, rec.clone()));
            true
        })
        .unwrap();

    // "hello" (trace, category a) matches only rule 1; "warning!" (warn,
    // category a) matches both but is yielded once, attributed to the first
    // matching rule (index 0); "meltdown" (critical) matches rule 0.
    assert_eq!(matched.len(), 3);
    let levels: Vec<_> = matched.iter().map(|(_, r)| r.level).collect();
    assert!(levels.contains(&Level::Trace));
    assert!(levels.contains(&Level::Warn));
    assert!(levels.contains(&Level::Critical));
}

/// A wildcard format pattern combined with an argument predicate:
/// `format: "voltage=*"` AND `arguments: ["intensity>=500"]`.
#[test]
fn scenario_e_wildcard_format_and_argument_predicate() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_session(dir.path());
    let session = LogSession::init(dir.path()).unwrap();

    let rules = vec![Rule {
        format: "voltage=*".to_string(),
        arguments: vec!["intensity>=500".to_string()],
        ..Rule::default()
    }];

    let mut matched = Vec::new();
    session
        .query(&rules, |_, rec| {
            matched.push(rec.clone());
            true
        })
        .unwrap();

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].args[1], sslog_format::Arg::S32(700));
}

/// A full producer-to-reader round trip: everything the collector wrote is
/// visible, in order, with the right session-level metadata.
#[test]
fn end_to_end_round_trip_preserves_everything() {
    let dir = tempfile::tempdir().unwrap();
    write_sample_session(dir.path());
    let session = LogSession::init(dir.path()).unwrap();

    assert_eq!(session.get_log_qty(), 5);
    assert_eq!(session.get_arg_qty(), 1 + 2 + 2);
    assert!(session.get_arg_name_strings().contains(&"intensity".to_string()));
    assert!(session.get_arg_unit_strings().contains(&"mA".to_string()));

    let mut timestamps = Vec::new();
    session
        .query(&[], |_, rec| {
            timestamps.push(rec.timestamp_utc_ns);
            true
        })
        .unwrap();
    let mut sorted = timestamps.clone();
    sorted.sort_unstable();
    assert_eq!(timestamps, sorted, "records must be yielded in on-disk (emission) order");
}
