//! Console formatter mini-language.
//!
//! A pattern is a sequence of literal bytes and `%`-directives; it is parsed
//! once (at `set_console_formatter` time) into a small token list so that
//! formatting a record is just a walk over that list, not a re-parse of the
//! pattern on every log call.

use crate::error::{InvalidFormatterDirectiveSnafu, SslogError};
use chrono::{DateTime, Datelike, Timelike, Utc};
use snafu::ensure;
use sslog_format::Level;

#[derive(Debug, Clone)]
enum Token {
    Literal(String),
    Directive(char),
}

#[derive(Debug, Clone)]
pub struct ConsoleFormatter {
    tokens: Vec<Token>,
}

/// Everything the formatter needs to know about one record in order to
/// expand a pattern against it.
pub struct FormatContext<'a> {
    pub timestamp_utc_ns: u64,
    pub level: Level,
    pub thread: &'a str,
    pub category: &'a str,
    pub message: &'a str,
    pub buffer: &'a [u8],
    /// UTC time the session started, for `%I`/`%J`/`%K` ("since record start").
    pub session_origin_utc_ns: i64,
    pub with_color: bool,
}

const KNOWN_DIRECTIVES: &str = "tvcLlaAbByYmdpzHhMSefgEFGIJKQq";

impl ConsoleFormatter {
    pub fn compile(pattern: &str) -> Result<Self, SslogError> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let Some(&directive) = chars.peek() else {
                literal.push('%');
                break;
            };
            if directive == '%' {
                literal.push('%');
                chars.next();
                continue;
            }
            ensure!(
                KNOWN_DIRECTIVES.contains(directive),
                InvalidFormatterDirectiveSnafu { directive }
            );
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Directive(directive));
            chars.next();
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }
        Ok(Self { tokens })
    }

    pub fn format(&self, ctx: &FormatContext<'_>) -> String {
        let mut out = String::new();
        let dt = nanos_to_datetime(ctx.timestamp_utc_ns as i64);
        for token in &self.tokens {
            match token {
                Token::Literal(s) => out.push_str(s),
                Token::Directive(d) => render_directive(*d, ctx, dt, &mut out),
            }
        }
        out
    }
}

fn nanos_to_datetime(utc_ns: i64) -> DateTime<Utc> {
    let secs = utc_ns.div_euclid(1_000_000_000);
    let nanos = utc_ns.rem_euclid(1_000_000_000) as u32;
    DateTime::from_timestamp(secs, nanos).unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
}

fn level_color_code(level: Level) -> &'static str {
    match level {
        Level::Trace => "\x1b[90m",
        Level::Debug => "\x1b[36m",
        Level::Info => "\x1b[32m",
        Level::Warn => "\x1b[33m",
        Level::Error => "\x1b[31m",
        Level::Critical => "\x1b[1;31m",
        Level::Off => "\x1b[0m",
    }
}

#[allow(clippy::too_many_lines)]
fn render_directive(d: char, ctx: &FormatContext<'_>, dt: DateTime<Utc>, out: &mut String) {
    use std::fmt::Write;
    let reset = if ctx.with_color { "\x1b[0m" } else { "" };
    let color = if ctx.with_color {
        level_color_code(ctx.level)
    } else {
        ""
    };
    match d {
        't' => out.push_str(ctx.thread),
        'v' => out.push_str(ctx.message),
        'c' => out.push_str(ctx.category),
        'L' => {
            out.push_str(color);
            out.push_str(ctx.level.long_name());
            out.push_str(reset);
        }
        'l' => {
            out.push_str(color);
            out.push_str(ctx.level.short_name());
            out.push_str(reset);
        }
        'a' => out.push_str(&dt.format("%a").to_string()),
        'A' => out.push_str(&dt.format("%A").to_string()),
        'b' => out.push_str(&dt.format("%b").to_string()),
        'B' => out.push_str(&dt.format("%B").to_string()),
        'y' => {
            let _ = write!(out, "{:02}", dt.year() % 100);
        }
        'Y' => {
            let _ = write!(out, "{:04}", dt.year());
        }
        'm' => {
            let _ = write!(out, "{:02}", dt.month());
        }
        'd' => {
            let _ = write!(out, "{:02}", dt.day());
        }
        'p' => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
        'z' => out.push_str("+00:00"),
        'H' => {
            let _ = write!(out, "{:02}", dt.hour());
        }
        'h' => {
            let h12 = match dt.hour12().1 {
                0 => 12,
                other => other,
            };
            let _ = write!(out, "{h12:02}");
        }
        'M' => {
            let _ = write!(out, "{:02}", dt.minute());
        }
        'S' => {
            let _ = write!(out, "{:02}", dt.second());
        }
        'e' => {
            let _ = write!(out, "{:03}", dt.timestamp_subsec_millis());
        }
        'f' => {
            let _ = write!(out, "{:06}", dt.timestamp_subsec_micros());
        }
        'g' => {
            let _ = write!(out, "{:09}", dt.timestamp_subsec_nanos());
        }
        'E' => {
            let _ = write!(out, "{}", ctx.timestamp_utc_ns / 1_000_000);
        }
        'F' => {
            let _ = write!(out, "{}", ctx.timestamp_utc_ns / 1_000);
        }
        'G' => {
            let _ = write!(out, "{}", ctx.timestamp_utc_ns);
        }
        'I' | 'J' | 'K' => {
            let delta_ns = ctx.timestamp_utc_ns as i128 - ctx.session_origin_utc_ns as i128;
            let value = match d {
                'I' => delta_ns / 1_000_000,
                'J' => delta_ns / 1_000,
                _ => delta_ns,
            };
            let _ = write!(out, "{value}");
        }
        'Q' => {
            if !ctx.buffer.is_empty() {
                out.push('\n');
                out.push_str(&hex_dump(ctx.buffer));
            }
        }
        'q' => {
            if !ctx.buffer.is_empty() {
                let _ = write!(out, " (+ buffer of size {})", ctx.buffer.len());
            }
        }
        _ => unreachable!("unknown directives are rejected at compile time"),
    }
}

/// 32 bytes per line, two groups of 16, uppercase hex, with a leading
/// `offset   ` column.
pub fn hex_dump(buffer: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    for (line_idx, chunk) in buffer.chunks(32).enumerate() {
        let offset = line_idx * 32;
        let _ = write!(out, "{offset:08X}   ");
        for (group_idx, group) in chunk.chunks(16).enumerate() {
            if group_idx > 0 {
                out.push(' ');
            }
            for b in group {
                let _ = write!(out, "{b:02X} ");
            }
        }
        if line_idx + 1 < buffer.chunks(32).count() {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(message: &str, buffer: &[u8]) -> FormatContext<'_> {
        FormatContext {
            timestamp_utc_ns: 1_700_000_000_123_456_789,
            level: Level::Info,
            thread: "main",
            category: "ui",
            message,
            buffer,
            session_origin_utc_ns: 1_700_000_000_000_000_000,
            with_color: false,
        }
    }

    #[test]
    fn default_pattern_compiles_and_renders() {
        let f = ConsoleFormatter::compile(crate::config::DEFAULT_FORMATTER).unwrap();
        let c = ctx("ready", &[]);
        let rendered = f.format(&c);
        assert!(rendered.contains("[info]"));
        assert!(rendered.contains("[ui]"));
        assert!(rendered.contains("thread main"));
        assert!(rendered.contains("ready"));
    }

    #[test]
    fn unknown_directive_is_rejected() {
        assert!(ConsoleFormatter::compile("%Z").is_err());
    }

    #[test]
    fn percent_percent_is_literal() {
        let f = ConsoleFormatter::compile("100%% done").unwrap();
        assert_eq!(f.format(&ctx("", &[])), "100% done");
    }

    #[test]
    fn q_directive_only_appends_when_buffer_present() {
        let f = ConsoleFormatter::compile("%v%q").unwrap();
        assert_eq!(f.format(&ctx("msg", &[])), "msg");
        assert_eq!(f.format(&ctx("msg", &[1, 2])), "msg (+ buffer of size 2)");
    }

    #[test]
    fn hex_dump_layout() {
        let buf: Vec<u8> = (0..32u8).collect();
        let dump = hex_dump(&buf);
        let mut lines = dump.lines();
        let line = lines.next().unwrap();
        assert!(line.starts_with("00000000   "));
        assert!(line.contains("0F"));
        assert!(line.contains("1F"));
        assert!(lines.next().is_none());
    }
}
