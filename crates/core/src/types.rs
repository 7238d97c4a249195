//! Runtime type tags and the value inspection boundary.
//!
//! Rust callers mostly hold statically typed arguments, but the engine also
//! has to accept genuinely dynamic input such as deserialized JSON. The
//! [`Inspect`] trait is the single classification point: it names a value's
//! [`TypeTag`] and exposes the text and numeric views the rule predicates read.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Type tags
// ---------------------------------------------------------------------------

/// The runtime category of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Null,
    /// An absent value (a missing argument or `None`).
    Undefined,
    Boolean,
    Number,
    String,
    Array,
    Object,
    Function,
    /// Anything the other tags do not describe.
    Other,
}

impl TypeTag {
    pub const ALL: [TypeTag; 9] = [
        TypeTag::Null,
        TypeTag::Undefined,
        TypeTag::Boolean,
        TypeTag::Number,
        TypeTag::String,
        TypeTag::Array,
        TypeTag::Object,
        TypeTag::Function,
        TypeTag::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Undefined => "undefined",
            TypeTag::Boolean => "boolean",
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Function => "function",
            TypeTag::Other => "other",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a [`TypeTag`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown type tag: {0}")]
pub struct UnknownTypeTag(pub String);

impl FromStr for TypeTag {
    type Err = UnknownTypeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == lower)
            .ok_or_else(|| UnknownTypeTag(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Expected type sets
// ---------------------------------------------------------------------------

/// The ordered set of type tags a parameter may have.
///
/// A single tag is normalized to a one-element list. In JSON either
/// `"string"` or `["string", "number"]` is accepted; `[]` is rejected. An
/// empty set built in code rejects every value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OneOrMany")]
pub struct ExpectedTypes(Vec<TypeTag>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(TypeTag),
    Many(Vec<TypeTag>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Expected types must name at least one type")]
pub struct EmptyExpectedTypes;

impl TryFrom<OneOrMany> for ExpectedTypes {
    type Error = EmptyExpectedTypes;

    fn try_from(value: OneOrMany) -> Result<Self, Self::Error> {
        match value {
            OneOrMany::One(tag) => Ok(tag.into()),
            OneOrMany::Many(tags) if tags.is_empty() => Err(EmptyExpectedTypes),
            OneOrMany::Many(tags) => Ok(tags.into()),
        }
    }
}

impl ExpectedTypes {
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn as_slice(&self) -> &[TypeTag] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<TypeTag> for ExpectedTypes {
    fn from(tag: TypeTag) -> Self {
        Self(vec![tag])
    }
}

impl From<Vec<TypeTag>> for ExpectedTypes {
    fn from(tags: Vec<TypeTag>) -> Self {
        let mut unique = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        Self(unique)
    }
}

impl From<&[TypeTag]> for ExpectedTypes {
    fn from(tags: &[TypeTag]) -> Self {
        tags.to_vec().into()
    }
}

impl<const N: usize> From<[TypeTag; N]> for ExpectedTypes {
    fn from(tags: [TypeTag; N]) -> Self {
        tags.to_vec().into()
    }
}

/// Joined with `|`, as in `string|number`.
impl fmt::Display for ExpectedTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(tag.as_str())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// A value the validation engine can classify and coerce.
///
/// The coercions follow dynamic-language conventions so that rules behave
/// the same on deserialized data as on native values: the number `5` reads
/// as the text `"5"`, the text `" 12 "` reads as the number `12`.
pub trait Inspect {
    /// The runtime category of the value.
    fn type_tag(&self) -> TypeTag;

    /// Text form read by pattern and list rules, also used in diagnostics.
    fn to_text(&self) -> Cow<'_, str>;

    /// Numeric form read by comparison rules. `NaN` when not numeric.
    fn to_number(&self) -> f64;
}

/// Classify any inspectable value.
pub fn type_of<V: Inspect + ?Sized>(value: &V) -> TypeTag {
    value.type_tag()
}

/// Format a float the way a dynamic runtime prints numbers.
pub(crate) fn number_text(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// Parse text as a number. Blank text is zero, anything unparseable is `NaN`.
pub(crate) fn text_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |v| v as f64);
        }
    }
    // Rust accepts `inf` and `nan` spellings that are not numbers here.
    if t.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Comma-join elements, with null and undefined elements left blank.
fn join_text<'a, V, I>(items: I) -> String
where
    V: Inspect + 'a,
    I: IntoIterator<Item = &'a V>,
{
    items
        .into_iter()
        .map(|item| match item.type_tag() {
            TypeTag::Null | TypeTag::Undefined => Cow::Borrowed(""),
            _ => item.to_text(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

const OBJECT_TEXT: &str = "[object Object]";

impl Inspect for Value {
    fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Object(_) => TypeTag::Object,
        }
    }

    fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed("null"),
            Value::Bool(b) => b.to_text(),
            Value::Number(n) if n.is_f64() => Cow::Owned(number_text(n.as_f64().unwrap_or(f64::NAN))),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::String(s) => Cow::Borrowed(s),
            Value::Array(items) => Cow::Owned(join_text(items)),
            Value::Object(_) => Cow::Borrowed(OBJECT_TEXT),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => b.to_number(),
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => text_to_number(s),
            Value::Array(items) => text_to_number(&join_text(items)),
            Value::Object(_) => f64::NAN,
        }
    }
}

impl Inspect for str {
    fn type_tag(&self) -> TypeTag {
        TypeTag::String
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }

    fn to_number(&self) -> f64 {
        text_to_number(self)
    }
}

impl Inspect for String {
    fn type_tag(&self) -> TypeTag {
        TypeTag::String
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }

    fn to_number(&self) -> f64 {
        text_to_number(self)
    }
}

impl Inspect for bool {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Boolean
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(if *self { "true" } else { "false" })
    }

    fn to_number(&self) -> f64 {
        if *self {
            1.0
        } else {
            0.0
        }
    }
}

macro_rules! inspect_integer {
    ($($ty:ty),*) => {$(
        impl Inspect for $ty {
            fn type_tag(&self) -> TypeTag {
                TypeTag::Number
            }

            fn to_text(&self) -> Cow<'_, str> {
                Cow::Owned(self.to_string())
            }

            fn to_number(&self) -> f64 {
                *self as f64
            }
        }
    )*};
}

macro_rules! inspect_float {
    ($($ty:ty),*) => {$(
        impl Inspect for $ty {
            fn type_tag(&self) -> TypeTag {
                TypeTag::Number
            }

            fn to_text(&self) -> Cow<'_, str> {
                Cow::Owned(number_text(*self as f64))
            }

            fn to_number(&self) -> f64 {
                *self as f64
            }
        }
    )*};
}

inspect_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
inspect_float!(f32, f64);

impl<T: Inspect> Inspect for Option<T> {
    fn type_tag(&self) -> TypeTag {
        self.as_ref().map_or(TypeTag::Undefined, Inspect::type_tag)
    }

    fn to_text(&self) -> Cow<'_, str> {
        match self {
            Some(value) => value.to_text(),
            None => Cow::Borrowed("undefined"),
        }
    }

    fn to_number(&self) -> f64 {
        self.as_ref().map_or(f64::NAN, Inspect::to_number)
    }
}

impl<T: Inspect> Inspect for [T] {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Array
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Owned(join_text(self))
    }

    fn to_number(&self) -> f64 {
        text_to_number(&join_text(self))
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Array
    }

    fn to_text(&self) -> Cow<'_, str> {
        self.as_slice().to_text()
    }

    fn to_number(&self) -> f64 {
        self.as_slice().to_number()
    }
}

impl<V, S> Inspect for HashMap<String, V, S> {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Object
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(OBJECT_TEXT)
    }

    fn to_number(&self) -> f64 {
        f64::NAN
    }
}

impl<V> Inspect for BTreeMap<String, V> {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Object
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(OBJECT_TEXT)
    }

    fn to_number(&self) -> f64 {
        f64::NAN
    }
}

impl Inspect for serde_json::Map<String, Value> {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Object
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(OBJECT_TEXT)
    }

    fn to_number(&self) -> f64 {
        f64::NAN
    }
}

/// Wraps any callable so it classifies as a function.
///
/// Plain `fn` pointers of up to three arguments are inspectable directly;
/// closures and higher-ranked pointers such as `fn(&str) -> bool` need the
/// wrapper.
#[derive(Debug, Clone, Copy)]
pub struct Callable<F>(pub F);

const FUNCTION_TEXT: &str = "[function]";

impl<F> Inspect for Callable<F> {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Function
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(FUNCTION_TEXT)
    }

    fn to_number(&self) -> f64 {
        f64::NAN
    }
}

macro_rules! inspect_fn_pointer {
    ($(($($arg:ident),*)),*) => {$(
        impl<R, $($arg),*> Inspect for fn($($arg),*) -> R {
            fn type_tag(&self) -> TypeTag {
                TypeTag::Function
            }

            fn to_text(&self) -> Cow<'_, str> {
                Cow::Borrowed(FUNCTION_TEXT)
            }

            fn to_number(&self) -> f64 {
                f64::NAN
            }
        }
    )*};
}

inspect_fn_pointer!((), (A), (A, B), (A, B, C));

/// The unit value fits none of the named categories.
impl Inspect for () {
    fn type_tag(&self) -> TypeTag {
        TypeTag::Other
    }

    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed("()")
    }

    fn to_number(&self) -> f64 {
        f64::NAN
    }
}

impl<T: Inspect + ?Sized> Inspect for &T {
    fn type_tag(&self) -> TypeTag {
        (**self).type_tag()
    }

    fn to_text(&self) -> Cow<'_, str> {
        (**self).to_text()
    }

    fn to_number(&self) -> f64 {
        (**self).to_number()
    }
}
