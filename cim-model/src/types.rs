//! CIM type tags and values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::class::CimClass;
use crate::instance::CimInstance;
use crate::path::CimInstanceName;

/// CIM data type of a property, parameter, qualifier or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CimType {
    Boolean,
    String,
    Char16,
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Uint32,
    Sint32,
    Uint64,
    Sint64,
    Real32,
    Real64,
    Datetime,
    Reference,
}

impl CimType {
    /// Type name as written in MOF and CIM-XML.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Char16 => "char16",
            Self::Uint8 => "uint8",
            Self::Sint8 => "sint8",
            Self::Uint16 => "uint16",
            Self::Sint16 => "sint16",
            Self::Uint32 => "uint32",
            Self::Sint32 => "sint32",
            Self::Uint64 => "uint64",
            Self::Sint64 => "sint64",
            Self::Real32 => "real32",
            Self::Real64 => "real64",
            Self::Datetime => "datetime",
            Self::Reference => "reference",
        }
    }

    /// Parse a type name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        let ty = match name.to_lowercase().as_str() {
            "boolean" => Self::Boolean,
            "string" => Self::String,
            "char16" => Self::Char16,
            "uint8" => Self::Uint8,
            "sint8" => Self::Sint8,
            "uint16" => Self::Uint16,
            "sint16" => Self::Sint16,
            "uint32" => Self::Uint32,
            "sint32" => Self::Sint32,
            "uint64" => Self::Uint64,
            "sint64" => Self::Sint64,
            "real32" => Self::Real32,
            "real64" => Self::Real64,
            "datetime" => Self::Datetime,
            "reference" => Self::Reference,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Uint8
                | Self::Sint8
                | Self::Uint16
                | Self::Sint16
                | Self::Uint32
                | Self::Sint32
                | Self::Uint64
                | Self::Sint64
        )
    }
}

impl fmt::Display for CimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embedded-object attribute of a string-typed property or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddedObject {
    /// Value may be an embedded class or instance
    Object,
    /// Value must be an embedded instance
    Instance,
}

impl EmbeddedObject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Instance => "instance",
        }
    }
}

/// CIM datetime in its 25-character string form.
///
/// Timestamps look like `yyyymmddhhmmss.mmmmmmsutc`, intervals like
/// `ddddddddhhmmss.mmmmmm:000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CimDateTime(String);

impl CimDateTime {
    /// Accept a CIM datetime string after a shape check.
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let bytes = value.as_bytes();
        if bytes.len() != 25 || bytes[14] != b'.' {
            return None;
        }
        if !matches!(bytes[21], b'+' | b'-' | b':') {
            return None;
        }
        Some(Self(value))
    }

    /// Timestamp from a UTC point in time.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(format!("{}+000", dt.format("%Y%m%d%H%M%S%.6f")))
    }

    /// Interval of the given length.
    pub fn interval(days: u32, hours: u8, minutes: u8, seconds: u8, micros: u32) -> Self {
        Self(format!(
            "{days:08}{hours:02}{minutes:02}{seconds:02}.{micros:06}:000"
        ))
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn is_interval(&self) -> bool {
        self.0.as_bytes().get(21) == Some(&b':')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CimDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed CIM value.
///
/// Embedded classes and instances are carried as `Class` / `Instance`;
/// their CIM type is `string`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CimValue {
    Boolean(bool),
    String(String),
    Char16(char),
    Uint8(u8),
    Sint8(i8),
    Uint16(u16),
    Sint16(i16),
    Uint32(u32),
    Sint32(i32),
    Uint64(u64),
    Sint64(i64),
    Real32(f32),
    Real64(f64),
    Datetime(CimDateTime),
    Reference(CimInstanceName),
    Instance(Box<CimInstance>),
    Class(Box<CimClass>),
    Array(Vec<CimValue>),
}

impl CimValue {
    /// CIM type of the value. Arrays report their element type; an empty
    /// array has no inferable type.
    pub fn cim_type(&self) -> Option<CimType> {
        let ty = match self {
            Self::Boolean(_) => CimType::Boolean,
            Self::String(_) | Self::Instance(_) | Self::Class(_) => CimType::String,
            Self::Char16(_) => CimType::Char16,
            Self::Uint8(_) => CimType::Uint8,
            Self::Sint8(_) => CimType::Sint8,
            Self::Uint16(_) => CimType::Uint16,
            Self::Sint16(_) => CimType::Sint16,
            Self::Uint32(_) => CimType::Uint32,
            Self::Sint32(_) => CimType::Sint32,
            Self::Uint64(_) => CimType::Uint64,
            Self::Sint64(_) => CimType::Sint64,
            Self::Real32(_) => CimType::Real32,
            Self::Real64(_) => CimType::Real64,
            Self::Datetime(_) => CimType::Datetime,
            Self::Reference(_) => CimType::Reference,
            Self::Array(items) => return items.first().and_then(CimValue::cim_type),
        };
        Some(ty)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Embedded-object attribute implied by the value.
    pub fn embedded_object(&self) -> Option<EmbeddedObject> {
        match self {
            Self::Instance(_) => Some(EmbeddedObject::Instance),
            Self::Class(_) => Some(EmbeddedObject::Object),
            Self::Array(items) => items.first().and_then(CimValue::embedded_object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&CimInstanceName> {
        match self {
            Self::Reference(path) => Some(path),
            _ => None,
        }
    }

    /// Integer value widened to i128, for any integer type.
    pub fn as_integer(&self) -> Option<i128> {
        let v = match self {
            Self::Uint8(v) => i128::from(*v),
            Self::Sint8(v) => i128::from(*v),
            Self::Uint16(v) => i128::from(*v),
            Self::Sint16(v) => i128::from(*v),
            Self::Uint32(v) => i128::from(*v),
            Self::Sint32(v) => i128::from(*v),
            Self::Uint64(v) => i128::from(*v),
            Self::Sint64(v) => i128::from(*v),
            _ => return None,
        };
        Some(v)
    }

    /// Type-tagged string used to compare key values. Integers of
    /// different widths with the same numeric value compare equal.
    pub fn canonical_key(&self) -> String {
        match self {
            Self::Uint8(_)
            | Self::Sint8(_)
            | Self::Uint16(_)
            | Self::Sint16(_)
            | Self::Uint32(_)
            | Self::Sint32(_)
            | Self::Uint64(_)
            | Self::Sint64(_) => format!("i:{}", self.as_integer().unwrap_or_default()),
            Self::Boolean(b) => format!("b:{b}"),
            Self::String(s) => format!("s:{s}"),
            Self::Char16(c) => format!("c:{c}"),
            Self::Real32(v) => format!("r:{}", f64::from(*v)),
            Self::Real64(v) => format!("r:{v}"),
            Self::Datetime(dt) => format!("d:{dt}"),
            Self::Reference(path) => format!("ref:{}", path.canonical_key()),
            Self::Instance(inst) => format!("inst:{}", inst.classname.to_lowercase()),
            Self::Class(class) => format!("class:{}", class.classname.to_lowercase()),
            Self::Array(items) => {
                let parts: Vec<String> = items.iter().map(CimValue::canonical_key).collect();
                format!("[{}]", parts.join(","))
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

/// WBEM URI key-binding representation.
impl fmt::Display for CimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::String(s) => write_quoted(f, s),
            Self::Char16(c) => write_quoted(f, &c.to_string()),
            Self::Uint8(v) => write!(f, "{v}"),
            Self::Sint8(v) => write!(f, "{v}"),
            Self::Uint16(v) => write!(f, "{v}"),
            Self::Sint16(v) => write!(f, "{v}"),
            Self::Uint32(v) => write!(f, "{v}"),
            Self::Sint32(v) => write!(f, "{v}"),
            Self::Uint64(v) => write!(f, "{v}"),
            Self::Sint64(v) => write!(f, "{v}"),
            Self::Real32(v) => write!(f, "{v}"),
            Self::Real64(v) => write!(f, "{v}"),
            Self::Datetime(dt) => write_quoted(f, dt.as_str()),
            Self::Reference(path) => write_quoted(f, &path.to_string()),
            Self::Instance(inst) => write!(f, "<instance of {}>", inst.classname),
            Self::Class(class) => write!(f, "<class {}>", class.classname),
            Self::Array(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for CimValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Boolean,
    String => String,
    char => Char16,
    u8 => Uint8,
    i8 => Sint8,
    u16 => Uint16,
    i16 => Sint16,
    u32 => Uint32,
    i32 => Sint32,
    u64 => Uint64,
    i64 => Sint64,
    f32 => Real32,
    f64 => Real64,
    CimDateTime => Datetime,
    CimInstanceName => Reference,
}

impl From<&str> for CimValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<CimInstance> for CimValue {
    fn from(v: CimInstance) -> Self {
        Self::Instance(Box::new(v))
    }
}

impl From<CimClass> for CimValue {
    fn from(v: CimClass) -> Self {
        Self::Class(Box::new(v))
    }
}

impl<T: Into<CimValue>> From<Vec<T>> for CimValue {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}
