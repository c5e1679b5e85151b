//! Typed attribute values.
//!
//! Every node attribute has a [`DataType`] fixed by its node type's schema.
//! Values are checked against that type before they are stored, so a stored
//! value is always valid for its slot: numbers are finite, integers fit
//! their width and enumeration names belong to their enumeration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::document::NodeId;
use crate::error::ValidationError;

/// Storage width of an integer attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
}

impl IntWidth {
    /// Inclusive value range.
    pub fn range(self) -> (i64, i64) {
        match self {
            Self::I8 => (i8::MIN as i64, i8::MAX as i64),
            Self::U8 => (0, u8::MAX as i64),
            Self::I16 => (i16::MIN as i64, i16::MAX as i64),
            Self::U16 => (0, u16::MAX as i64),
            Self::I32 => (i32::MIN as i64, i32::MAX as i64),
            Self::U32 => (0, u32::MAX as i64),
        }
    }
}

/// A named set of symbolic values.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumType {
    name: String,
    values: Vec<String>,
    default: usize,
}

impl EnumType {
    /// Creates an enumeration whose default is its first value.
    pub fn new(name: impl Into<String>, values: &[&str]) -> Arc<Self> {
        Self::with_default(name, values, 0)
    }

    /// Creates an enumeration with an explicit default index.
    ///
    /// An out-of-range index falls back to the first value.
    pub fn with_default(name: impl Into<String>, values: &[&str], default: usize) -> Arc<Self> {
        let default = if default < values.len() { default } else { 0 };
        Arc::new(Self {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
            default,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn default_value(&self) -> &str {
        self.values.get(self.default).map_or("", String::as_str)
    }
}

/// Kind of an attribute slot.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Boolean,
    Integer(IntWidth),
    Float,
    /// Radians.
    Angle,
    String,
    Color,
    Enum(Arc<EnumType>),
    /// Weak reference to another node of the same document.
    Node,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer(_) => "integer",
            Self::Float => "float",
            Self::Angle => "angle",
            Self::String => "string",
            Self::Color => "color",
            Self::Enum(_) => "enum",
            Self::Node => "node",
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Integer(_) => Value::Int(0),
            Self::Float | Self::Angle => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::Color => Value::Color(Color::default()),
            Self::Enum(e) => Value::Enum(e.default_value().to_string()),
            Self::Node => Value::Node(None),
        }
    }

    /// Per-kind equality used to detect no-op edits.
    ///
    /// Colors compare structurally, node references by id, enumerations by
    /// name and everything else by exact value.
    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits() || x == y,
            _ => a == b,
        }
    }

    /// Checks that `value` is acceptable for this type.
    ///
    /// Node references are only checked for their variant here; whether the
    /// target exists is up to the document.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        match (self, value) {
            (Self::Boolean, Value::Bool(_))
            | (Self::String, Value::String(_))
            | (Self::Color, Value::Color(_))
            | (Self::Node, Value::Node(_)) => Ok(()),
            (Self::Integer(width), Value::Int(v)) => {
                let (min, max) = width.range();
                if (min..=max).contains(v) {
                    Ok(())
                } else {
                    Err(ValidationError::OutOfRange { value: *v, min, max })
                }
            }
            (Self::Float | Self::Angle, Value::Float(v)) => {
                if v.is_finite() {
                    Ok(())
                } else {
                    Err(ValidationError::NotFinite)
                }
            }
            (Self::Enum(e), Value::Enum(name)) => {
                if e.contains(name) {
                    Ok(())
                } else {
                    Err(ValidationError::UnknownEnumValue {
                        enum_name: e.name().to_string(),
                        value: name.clone(),
                    })
                }
            }
            _ => Err(ValidationError::TypeMismatch {
                expected: self.name(),
                found: value.kind(),
            }),
        }
    }

    /// Parses text typed into an edit control.
    ///
    /// Angles are read in degrees with an optional trailing `°`. Node
    /// references cannot be entered as text.
    pub fn parse(&self, text: &str) -> Result<Value, ValidationError> {
        let parse_error = || ValidationError::Parse {
            text: text.to_string(),
            expected: self.name(),
        };
        let trimmed = text.trim();

        let value = match self {
            Self::Boolean => match trimmed {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(parse_error()),
            },
            Self::Integer(_) => {
                let v = match trimmed.parse::<i64>() {
                    Ok(v) => v,
                    Err(_) => {
                        let f = trimmed.parse::<f64>().map_err(|_| parse_error())?;
                        if !f.is_finite() {
                            return Err(ValidationError::NotFinite);
                        }
                        f.trunc() as i64
                    }
                };
                Value::Int(v)
            }
            Self::Float => Value::Float(trimmed.parse::<f32>().map_err(|_| parse_error())?),
            Self::Angle => {
                let degrees = trimmed
                    .strip_suffix('°')
                    .unwrap_or(trimmed)
                    .trim_end()
                    .parse::<f32>()
                    .map_err(|_| parse_error())?;
                Value::Float(degrees.to_radians())
            }
            Self::String => Value::String(text.to_string()),
            Self::Color => Value::Color(text.parse().map_err(|_| parse_error())?),
            Self::Enum(_) => Value::Enum(trimmed.to_string()),
            Self::Node => return Err(parse_error()),
        };

        self.check(&value)?;
        Ok(value)
    }
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    /// Floats and angles.
    Float(f32),
    String(String),
    Color(Color),
    Enum(String),
    Node(Option<NodeId>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Color(_) => "color",
            Self::Enum(_) => "enum",
            Self::Node(_) => "node",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// String or enumeration name.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// The referenced node, if this is a non-null reference.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(n) => *n,
            _ => None,
        }
    }

    /// Text shown in an edit control. `data_type` selects the angle format.
    pub fn to_display_string(&self, data_type: &DataType) -> String {
        match (data_type, self) {
            (DataType::Angle, Value::Float(v)) => format!("{}°", v.to_degrees()),
            (_, Value::Node(None)) => String::new(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) | Self::Enum(s) => f.write_str(s),
            Self::Color(c) => write!(f, "{c}"),
            Self::Node(Some(id)) => write!(f, "{id}"),
            Self::Node(None) => f.write_str("null"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

impl From<Option<NodeId>> for Value {
    fn from(v: Option<NodeId>) -> Self {
        Self::Node(v)
    }
}

impl From<NodeId> for Value {
    fn from(v: NodeId) -> Self {
        Self::Node(Some(v))
    }
}

// ===== Color =====

/// RGBA8 color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }
}

/// Formats as `#rrggbb`, with a `.aa` suffix when not opaque.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, ".{:02x}", self.a)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color \"{0}\"")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    /// Accepts `#rgb`, `#rrggbb`, `#rrggbb.aa` (the `#` is optional),
    /// `rgb(r, g, b)` and `rgba(r, g, b, alpha)` with alpha in `0..=1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s.trim()).ok_or_else(|| ParseColorError(s.to_string()))
    }
}

fn parse_color(s: &str) -> Option<Color> {
    let lower = s.to_ascii_lowercase();
    if let Some(args) = function_args(&lower, "rgba") {
        let [r, g, b, a] = args.as_slice() else {
            return None;
        };
        let alpha = parse_alpha(a)?;
        return Some(Color::rgba(channel(r)?, channel(g)?, channel(b)?, alpha));
    }
    if let Some(args) = function_args(&lower, "rgb") {
        let [r, g, b] = args.as_slice() else {
            return None;
        };
        return Some(Color::rgb(channel(r)?, channel(g)?, channel(b)?));
    }

    let hex = lower.strip_prefix('#').unwrap_or(&lower);
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 if hex.bytes().all(|c| c.is_ascii_hexdigit()) => {
            let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 0x11);
            Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
        }
        6 if hex.bytes().all(|c| c.is_ascii_hexdigit()) => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        9 if hex.as_bytes()[6] == b'.' => {
            let mut digits = hex[..6].bytes().chain(hex[7..].bytes());
            if !digits.all(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(7)?))
        }
        _ => None,
    }
}

/// Splits `name(a, b, ...)` into trimmed arguments.
fn function_args<'a>(s: &'a str, name: &str) -> Option<Vec<&'a str>> {
    let rest = s.strip_prefix(name)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split(',').map(str::trim).collect())
}

/// Decimal channel, saturating at 255.
fn channel(s: &str) -> Option<u8> {
    if s.is_empty() || !s.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let v = s.parse::<u64>().unwrap_or(u64::MAX);
    Some(v.min(255) as u8)
}

fn parse_alpha(s: &str) -> Option<u8> {
    if s.is_empty() || !s.bytes().all(|c| c.is_ascii_digit() || c == b'.') {
        return None;
    }
    let v = s.parse::<f32>().ok()?;
    Some((v * 255.0).round().min(255.0) as u8)
}
