//! Renders a decoded record's `format` + `args` into the text that actually
//! gets echoed to the console (the `%v` directive).
//!
//! This is a convenience renderer for the live console sink, not the
//! authoritative offline substitution engine — that one lives in
//! `sslogread` (`vsnprintf_log`) and is the one that must track exact byte
//! offsets for `sslogread`'s value predicates. Here we only need readable
//! text, so flags/width/precision are honored on a best-effort basis rather
//! than bit-for-bit libc compatibility.

use sslog_format::{specifiers::parse_specifiers, Arg, IndexedString};

pub fn render_message(format: &str, args: &[Arg], strings: &[IndexedString]) -> String {
    let specs = parse_specifiers(format);
    let mut out = String::with_capacity(format.len() + args.len() * 8);
    let mut cursor = 0usize;
    let mut arg_iter = args.iter();

    for spec in &specs {
        out.push_str(&format[cursor..spec.start]);
        cursor = spec.end;
        let body = &format[spec.start + 1..spec.end - 1]; // flags/width/precision, sans '%' and conv char
        match arg_iter.next() {
            Some(arg) => render_one(arg, spec.conversion, body, strings, &mut out),
            None => out.push_str("<missing arg>"),
        }
    }
    out.push_str(&format[cursor..]);
    out
}

fn render_one(arg: &Arg, conversion: char, body: &str, strings: &[IndexedString], out: &mut String) {
    use std::fmt::Write;
    let (width, precision) = parse_width_precision(body);
    match (conversion, arg) {
        ('s', Arg::StringIdx(id)) => {
            let text = strings
                .get(*id as usize)
                .map(|s| s.as_str_lossy().into_owned())
                .unwrap_or_default();
            pad(out, &text, width);
        }
        ('d' | 'i', _) => {
            let v = as_i64(arg);
            let _ = write!(out, "{v:>width$}", width = width.unwrap_or(0));
        }
        ('u', _) => {
            let v = as_u64(arg);
            let _ = write!(out, "{v:>width$}", width = width.unwrap_or(0));
        }
        ('x', _) => {
            let v = as_u64(arg);
            let _ = write!(out, "{v:width$x}", width = width.unwrap_or(0));
        }
        ('X', _) => {
            let v = as_u64(arg);
            let _ = write!(out, "{v:width$X}", width = width.unwrap_or(0));
        }
        ('o', _) => {
            let v = as_u64(arg);
            let _ = write!(out, "{v:width$o}", width = width.unwrap_or(0));
        }
        ('c', _) => {
            let v = as_u64(arg);
            out.push(char::from_u32(v as u32).unwrap_or('?'));
        }
        ('f' | 'F', _) => {
            let v = as_f64(arg);
            let prec = precision.unwrap_or(6);
            let _ = write!(out, "{v:width$.prec$}", width = width.unwrap_or(0));
        }
        ('e' | 'E', _) => {
            let v = as_f64(arg);
            let prec = precision.unwrap_or(6);
            let _ = write!(out, "{v:.prec$e}");
        }
        ('g' | 'G', _) => {
            let v = as_f64(arg);
            let _ = write!(out, "{v}");
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

/// Parses the `[flags][width][.precision]` segment between `%` and the
/// conversion character. Flags are accepted but not reflected in alignment.
fn parse_width_precision(body: &str) -> (Option<usize>, Option<usize>) {
    let body = body.trim_start_matches(['-', '+', '0', ' ', '#']);
    match body.split_once('.') {
        Some((w, p)) => (w.parse().ok(), p.parse().ok()),
        None => (body.parse().ok(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sslog_format::StringRole;

    #[test]
    fn renders_plain_numeric_args() {
        let rendered = render_message("count=%d ratio=%3.1f", &[Arg::S32(7), Arg::Double(0.5)], &[]);
        assert_eq!(rendered, "count=7 ratio=0.5");
    }

    #[test]
    fn resolves_string_args_by_id() {
        let strings = vec![
            IndexedString::new(b"".to_vec(), StringRole::empty()),
            IndexedString::new(b"boot".to_vec(), StringRole::ARG_VALUE),
        ];
        let rendered = render_message("phase=%s", &[Arg::StringIdx(1)], &strings);
        assert_eq!(rendered, "phase=boot");
    }

    #[test]
    fn missing_arg_does_not_panic() {
        let rendered = render_message("count=%d", &[], &[]);
        assert_eq!(rendered, "count=<missing arg>");
    }
}
