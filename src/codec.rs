//! Field codecs: typed value <-> text, with a fallback fixed at construction.
//!
//! Every codec starts as a no-default codec (absence decodes to `None`) and
//! becomes an explicit-default codec through [`Codec::with_default`]. Empty
//! text and missing text are indistinguishable and both route to the
//! fallback.

use std::fmt::Debug;

use crate::types::{FieldValue, Value, ValueKind};

/// Delimiter used by [`string_array`] unless overridden.
pub const DEFAULT_DELIMITER: &str = "*___delimiter___*";

/// Separator used by [`number_array`].
pub const NUMBER_SEPARATOR: char = ',';

/// Text representation of one value type.
pub trait DataType: Debug + Send + Sync + 'static {
    /// Rust type produced by this codec.
    type Value: FieldValue + Debug + Send + Sync + 'static;

    /// Renders a concrete value as text.
    fn serialize(&self, value: &Self::Value) -> String;

    /// Parses present, non-empty text. Never fails.
    fn parse(&self, raw: &str) -> Self::Value;
}

/// What a codec yields for missing or empty text.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback<T> {
    /// Absence decodes to this value.
    Default(T),
    /// Absence decodes to `None`.
    Absent,
}

impl<T: Clone> Fallback<T> {
    /// Resolves the fallback to the decoded field value.
    pub fn resolve(&self) -> Option<T> {
        match self {
            Fallback::Default(value) => Some(value.clone()),
            Fallback::Absent => None,
        }
    }
}

/// A [`DataType`] bound to its absence policy.
#[derive(Debug, Clone)]
pub struct Codec<D: DataType> {
    data_type: D,
    fallback: Fallback<D::Value>,
}

impl<D: DataType> Codec<D> {
    /// Builds a no-default codec.
    pub fn new(data_type: D) -> Self {
        Self {
            data_type,
            fallback: Fallback::Absent,
        }
    }

    /// Makes absence decode to `value`.
    pub fn with_default(mut self, value: impl Into<D::Value>) -> Self {
        self.fallback = Fallback::Default(value.into());
        self
    }

    /// Returns the underlying data type.
    pub fn data_type(&self) -> &D {
        &self.data_type
    }

    /// Returns the configured fallback.
    pub fn fallback(&self) -> &Fallback<D::Value> {
        &self.fallback
    }

    /// Renders a concrete value as text.
    pub fn serialize(&self, value: &D::Value) -> String {
        self.data_type.serialize(value)
    }

    /// Decodes text, routing `None` and `""` to the fallback.
    pub fn deserialize(&self, raw: Option<&str>) -> Option<D::Value> {
        match raw {
            Some(raw) if !raw.is_empty() => Some(self.data_type.parse(raw)),
            _ => self.fallback.resolve(),
        }
    }
}

/// Identity text codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringType;

impl DataType for StringType {
    type Value = String;

    fn serialize(&self, value: &String) -> String {
        value.clone()
    }

    fn parse(&self, raw: &str) -> String {
        raw.to_string()
    }
}

/// Decimal number codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberType;

impl DataType for NumberType {
    type Value = f64;

    fn serialize(&self, value: &f64) -> String {
        format_number(*value)
    }

    fn parse(&self, raw: &str) -> f64 {
        parse_number(raw)
    }
}

/// `"true"`/`"false"` codec. Any other present text decodes to `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanType;

impl DataType for BooleanType {
    type Value = bool;

    fn serialize(&self, value: &bool) -> String {
        value.to_string()
    }

    fn parse(&self, raw: &str) -> bool {
        raw == "true"
    }
}

/// Delimiter-joined string list codec.
#[derive(Debug, Clone)]
pub struct StringArrayType {
    delimiter: String,
}

impl StringArrayType {
    /// Returns the delimiter used on the wire.
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }
}

impl Default for StringArrayType {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl DataType for StringArrayType {
    type Value = Vec<String>;

    fn serialize(&self, value: &Vec<String>) -> String {
        value.join(&self.delimiter)
    }

    fn parse(&self, raw: &str) -> Vec<String> {
        raw.split(self.delimiter.as_str()).map(str::to_string).collect()
    }
}

/// Comma-joined number list codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberArrayType;

impl DataType for NumberArrayType {
    type Value = Vec<f64>;

    fn serialize(&self, value: &Vec<f64>) -> String {
        value
            .iter()
            .map(|v| format_number(*v))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn parse(&self, raw: &str) -> Vec<f64> {
        raw.split(NUMBER_SEPARATOR).map(parse_number).collect()
    }
}

impl Codec<StringArrayType> {
    /// Replaces the wire delimiter. Readers must use the same one.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.data_type.delimiter = delimiter.into();
        self
    }
}

/// No-default string codec.
pub fn string() -> Codec<StringType> {
    Codec::new(StringType)
}

/// No-default number codec.
pub fn number() -> Codec<NumberType> {
    Codec::new(NumberType)
}

/// No-default boolean codec.
pub fn boolean() -> Codec<BooleanType> {
    Codec::new(BooleanType)
}

/// No-default string list codec using [`DEFAULT_DELIMITER`].
pub fn string_array() -> Codec<StringArrayType> {
    Codec::new(StringArrayType::default())
}

/// No-default number list codec.
pub fn number_array() -> Codec<NumberArrayType> {
    Codec::new(NumberArrayType)
}

/// Type-erased codec stored in a [`crate::schema::Schema`].
pub trait FieldCodec: Debug + Send + Sync {
    /// Kind of value this codec accepts and produces.
    fn kind(&self) -> ValueKind;

    /// True when absence decodes to a concrete value.
    fn has_default(&self) -> bool;

    /// Serializes `value`, or `None` when its kind does not match.
    fn encode(&self, value: &Value) -> Option<String>;

    /// Decodes raw store text into a field value.
    fn decode(&self, raw: Option<&str>) -> Option<Value>;
}

impl<D: DataType> FieldCodec for Codec<D> {
    fn kind(&self) -> ValueKind {
        <D::Value as FieldValue>::KIND
    }

    fn has_default(&self) -> bool {
        matches!(self.fallback, Fallback::Default(_))
    }

    fn encode(&self, value: &Value) -> Option<String> {
        let typed = <D::Value as FieldValue>::from_value(value)?;
        Some(self.serialize(&typed))
    }

    fn decode(&self, raw: Option<&str>) -> Option<Value> {
        self.deserialize(raw).map(FieldValue::into_value)
    }
}

fn format_number(value: f64) -> String {
    if value.is_infinite() {
        if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else {
        value.to_string()
    }
}

/// Lenient decimal parse: leading whitespace is skipped and the longest
/// numeric prefix wins. Text without one yields `NaN`.
fn parse_number(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
