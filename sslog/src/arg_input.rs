//! The call-site argument type: a polymorphic argument list maps to a
//! tagged variant.
//!
//! `ArgInput` is the stateless half of argument encoding: it carries the
//! call-site value without touching the string table. `Collector::log`
//! resolves any `Str` variant to a `StringIdx` by interning it, since that
//! step needs access to the shared [`crate::intern::StringTable`].
//!
//! A plain `int`-typed value widens to `S32`/`U32` by default.

use sslog_format::Arg;

#[derive(Debug, Clone, Copy)]
pub enum ArgInput<'a> {
    S32(i32),
    U32(u32),
    S64(i64),
    U64(u64),
    Float(f32),
    Double(f64),
    Str(&'a str),
}

macro_rules! impl_from_int {
    ($ty:ty, $variant:ident, $widen:ty) => {
        impl From<$ty> for ArgInput<'_> {
            fn from(v: $ty) -> Self {
                ArgInput::$variant(v as $widen)
            }
        }
    };
}

impl_from_int!(i8, S32, i32);
impl_from_int!(i16, S32, i32);
impl_from_int!(i32, S32, i32);
impl_from_int!(i64, S64, i64);
impl_from_int!(isize, S64, i64);
impl_from_int!(u8, U32, u32);
impl_from_int!(u16, U32, u32);
impl_from_int!(u32, U32, u32);
impl_from_int!(u64, U64, u64);
impl_from_int!(usize, U64, u64);

impl From<f32> for ArgInput<'_> {
    fn from(v: f32) -> Self {
        ArgInput::Float(v)
    }
}

impl From<f64> for ArgInput<'_> {
    fn from(v: f64) -> Self {
        ArgInput::Double(v)
    }
}

impl<'a> From<&'a str> for ArgInput<'a> {
    fn from(v: &'a str) -> Self {
        ArgInput::Str(v)
    }
}

impl<'a> From<&'a String> for ArgInput<'a> {
    fn from(v: &'a String) -> Self {
        ArgInput::Str(v.as_str())
    }
}

impl ArgInput<'_> {
    /// `true` for every variant that does not require string interning.
    pub fn is_plain_numeric(&self) -> bool {
        !matches!(self, ArgInput::Str(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgInput::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a non-string argument directly; panics on `Str` (callers
    /// must resolve string args to an id first via interning).
    pub fn to_plain_arg(&self) -> Arg {
        match *self {
            ArgInput::S32(v) => Arg::S32(v),
            ArgInput::U32(v) => Arg::U32(v),
            ArgInput::S64(v) => Arg::S64(v),
            ArgInput::U64(v) => Arg::U64(v),
            ArgInput::Float(v) => Arg::Float(v),
            ArgInput::Double(v) => Arg::Double(v),
            ArgInput::Str(_) => unreachable!("string args must be interned before encoding"),
        }
    }
}
