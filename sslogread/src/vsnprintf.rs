//! `vsnprintf_log`: printf-style substitution, reimplemented rather than
//! delegated to a host `printf`, that also reports the byte span of every
//! substituted value within the rendered string, which is how a UI later
//! colors argument values.
//!
//! This is the authoritative offline renderer used by the reader and its
//! CLI/UI consumers; it intentionally duplicates the spirit of
//! `sslog::render` (the producer's best-effort console renderer) rather
//! than sharing code with it, because the two have different contracts:
//! this one must track exact byte offsets, the producer's does not.

use sslog_format::{specifiers::parse_specifiers, Arg};

/// Renders `format` with `args` substituted in, resolving `StringIdx`
/// arguments through `resolve_string`. Returns the rendered text and, for
/// every specifier in order, the `(start, end)` byte span of its
/// substituted value within that text.
pub fn vsnprintf_log(
    format: &str,
    args: &[Arg],
    resolve_string: impl Fn(u32) -> Option<String>,
) -> (String, Vec<(usize, usize)>) {
    let specs = parse_specifiers(format);
    let mut out = String::with_capacity(format.len() + args.len() * 8);
    let mut positions = Vec::with_capacity(specs.len());
    let mut cursor = 0usize;
    let mut arg_iter = args.iter();

    for spec in &specs {
        out.push_str(&format[cursor..spec.start]);
        cursor = spec.end;
        let body = &format[spec.start + 1..spec.end - 1];
        let value_start = out.len();
        match arg_iter.next() {
            Some(arg) => render_one(arg, spec.conversion, body, &resolve_string, &mut out),
            None => out.push_str("<missing arg>"),
        }
        positions.push((value_start, out.len()));
    }
    out.push_str(&format[cursor..]);
    (out, positions)
}

fn render_one(
    arg: &Arg,
    conversion: char,
    body: &str,
    resolve_string: &impl Fn(u32) -> Option<String>,
    out: &mut String,
) {
    use std::fmt::Write;
    let (width, precision) = parse_width_precision(body);
    match (conversion, arg) {
        ('s', Arg::StringIdx(id)) => {
            let text = resolve_string(*id).unwrap_or_default();
            pad(out, &text, width);
        }
        ('d' | 'i', _) => {
            let _ = write!(out, "{:>width$}", as_i64(arg), width = width.unwrap_or(0));
        }
        ('u', _) => {
            let _ = write!(out, "{:>width$}", as_u64(arg), width = width.unwrap_or(0));
        }
        ('x', _) => {
            let _ = write!(out, "{:width$x}", as_u64(arg), width = width.unwrap_or(0));
        }
        ('X', _) => {
            let _ = write!(out, "{:width$X}", as_u64(arg), width = width.unwrap_or(0));
        }
        ('o', _) => {
            let _ = write!(out, "{:width$o}", as_u64(arg), width = width.unwrap_or(0));
        }
        ('c', _) => {
            out.push(char::from_u32(as_u64(arg) as u32).unwrap_or('?'));
        }
        ('f' | 'F', _) => {
            let prec = precision.unwrap_or(6);
            let _ = write!(out, "{:width$.prec$}", as_f64(arg), width = width.unwrap_or(0));
        }
        ('e' | 'E', _) => {
            let prec = precision.unwrap_or(6);
            let _ = write!(out, "{:.prec$e}", as_f64(arg));
        }
        ('g' | 'G', _) => {
            let _ = write!(out, "{}", as_f64(arg));
        }
        _ => {
            let _ = write!(out, "{arg:?}");
        }
    }
}

fn pad(out: &mut String, text: &str, width: Option<usize>) {
    match width {
        Some(w) if text.len() < w => {
            out.push_str(&" ".repeat(w - text.len()));
            out.push_str(text);
        }
        _ => out.push_str(text),
    }
}

fn as_i64(arg: &Arg) -> i64 {
    match *arg {
        Arg::S32(v) => v as i64,
        Arg::U32(v) => v as i64,
        Arg::S64(v) => v,
        Arg::U64(v) => v as i64,
        Arg::Float(v) => v as i64,
        Arg::Double(v) => v as i64,
        Arg::StringIdx(v) => v as i64,
    }
}

fn as_u64(arg: &Arg) -> u64 {
    match *arg {
        Arg::S32(v) => v as u64,
        Arg::U32(v) => v as u64,
        Arg::S64(v) => v as u64,
        Arg::U64(v) => v,
        Arg::Float(v) => v as u64,
        Arg::Double(v) => v as u64,
        Arg::StringIdx(v) => v as u64,
    }
}

fn as_f64(arg: &Arg) -> f64 {
    match *arg {
        Arg::S32(v) => v as f64,
        Arg::U32(v) => v as f64,
        Arg::S64(v) => v as f64,
        Arg::U64(v) => v as f64,
        Arg::Float(v) => v as f64,
        Arg::Double(v) => v,
        Arg::StringIdx(v) => v as f64,
    }
}

fn parse_width_precision(body: &str) -> (Option<usize>, Option<usize>) {
    let body = body.trim_start_matches(['-', '+', '0', ' ', '#']);
    match body.split_once('.') {
        Some((w, p)) => (w.parse().ok(), p.parse().ok()),
        None => (body.parse().ok(), None),
    }
}
