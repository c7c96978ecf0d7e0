//! printf-style `%` specifier scanning, shared by the producer (which only
//! needs the specifier *count*, to check `args.len()` parity) and the reader
//! (which needs full spans, for substitution and for `name=value_unit` hint
//! parsing).
//!
//! `%%` is a literal escaped percent and never counts as a specifier.

/// One `%...conv` specifier found in a format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    /// Byte offset of the `%` that starts this specifier.
    pub start: usize,
    /// Byte offset one past the conversion character.
    pub end: usize,
    /// The conversion character itself (`d`, `f`, `s`, ...).
    pub conversion: char,
}

/// Scans `fmt` for specifiers in order, skipping `%%` escapes.
pub fn parse_specifiers(fmt: &str) -> Vec<Specifier> {
    let bytes = fmt.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        // `%%` is a literal percent, consume both and move on.
        if bytes.get(i + 1) == Some(&b'%') {
            i += 2;
            continue;
        }
        let start = i;
        let mut j = i + 1;
        // flags, width, precision: anything that isn't a conversion letter.
        while j < bytes.len() && !bytes[j].is_ascii_alphabetic() {
            j += 1;
        }
        if j >= bytes.len() {
            // Dangling `%` at end of string with no conversion char; stop scanning.
            break;
        }
        let conversion = bytes[j] as char;
        out.push(Specifier {
            start,
            end: j + 1,
            conversion,
        });
        i = j + 1;
    }
    out
}

/// Number of real (non-`%%`) specifiers in `fmt`.
pub fn count_specifiers(fmt: &str) -> usize {
    parse_specifiers(fmt).len()
}

/// Parses the `name=value_unit` hints embedded ahead of and after each
/// specifier, e.g. `"voltage=%3.1f_V intensity=%dmA"` yields
/// `[("voltage", "V"), ("intensity", "mA")]`.
///
/// A specifier with no recognizable `name=` prefix contributes an entry with
/// an empty name; a specifier with no trailing unit text contributes an
/// empty unit. Both are legal: not every argument is a physical quantity.
pub fn parse_arg_names_and_units(fmt: &str) -> Vec<(String, String)> {
    let bytes = fmt.as_bytes();
    let specs = parse_specifiers(fmt);
    specs
        .iter()
        .map(|spec| {
            let name = extract_name(bytes, spec.start);
            let unit = extract_unit(bytes, spec.end);
            (name, unit)
        })
        .collect()
}

fn extract_name(bytes: &[u8], spec_start: usize) -> String {
    if spec_start == 0 || bytes[spec_start - 1] != b'=' {
        return String::new();
    }
    let mut start = spec_start - 1; // points at '='
    let name_end = start;
    while start > 0 {
        let c = bytes[start - 1];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'/' || c == b'-' {
            start -= 1;
        } else {
            break;
        }
    }
    if start == name_end {
        return String::new();
    }
    String::from_utf8_lossy(&bytes[start..name_end]).into_owned()
}

fn extract_unit(bytes: &[u8], spec_end: usize) -> String {
    let mut j = spec_end;
    // A single separating underscore directly after the specifier is dropped:
    // "%3.1f_V" yields unit "V", not "_V".
    if bytes.get(j) == Some(&b'_') {
        j += 1;
    }
    let start = j;
    while j < bytes.len() {
        let c = bytes[j];
        if c.is_ascii_whitespace() || c == b'%' {
            break;
        }
        j += 1;
    }
    String::from_utf8_lossy(&bytes[start..j]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_unit_hints_are_extracted() {
        let fmt = "voltage=%3.1f_V intensity=%dmA";
        assert_eq!(count_specifiers(fmt), 2);
        let names_units = parse_arg_names_and_units(fmt);
        assert_eq!(
            names_units,
            vec![
                ("voltage".to_string(), "V".to_string()),
                ("intensity".to_string(), "mA".to_string()),
            ]
        );
    }

    #[test]
    fn double_percent_is_not_a_specifier() {
        assert_eq!(count_specifiers("100%% done"), 0);
        assert_eq!(count_specifiers("%d%% of %d"), 2);
    }

    #[test]
    fn no_hints_yields_empty_name_and_unit() {
        let fmt = "plain %d and %s";
        assert_eq!(
            parse_arg_names_and_units(fmt),
            vec![(String::new(), String::new()), (String::new(), String::new())]
        );
    }

    #[test]
    fn simple_message_has_no_specifiers() {
        assert_eq!(count_specifiers("ready"), 0);
    }
}
