//! Type catalog — canonical ledger value types.
//!
//! Parses and renders the value-type text that appears in program source:
//! scalar keywords, sized integers, arrays, and cross-program custom types.
//! Visibility qualifiers are parsed and rendered by call sites; a
//! `ValueType` never stores one.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Widths accepted for sized integers.
const INTEGER_WIDTHS: [u16; 5] = [8, 16, 32, 64, 128];

static CUSTOM_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([A-Za-z_][A-Za-z0-9_]*)\.aleo/)?([A-Za-z_][A-Za-z0-9_]*)$")
        .expect("custom type pattern")
});

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^aleo1[02-9ac-hj-np-z]{58}$").expect("address pattern"));

/// A canonical ledger value type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Address,
    Boolean,
    Field,
    Group,
    Scalar,
    Integer { width: u16, signed: bool },
    Array { element: Box<ValueType>, length: u32 },
    /// A struct or record reference, possibly from another program.
    Custom {
        name: String,
        from_program: Option<String>,
    },
}

impl ValueType {
    /// True for any sized integer type.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer { .. })
    }

    /// A locally defined struct or record type.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom {
            name: name.into(),
            from_program: None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Boolean => write!(f, "boolean"),
            Self::Field => write!(f, "field"),
            Self::Group => write!(f, "group"),
            Self::Scalar => write!(f, "scalar"),
            Self::Integer { width, signed } => {
                write!(f, "{}{}", if *signed { "i" } else { "u" }, width)
            }
            Self::Array { element, length } => write!(f, "[{}; {}]", element, length),
            Self::Custom { name, from_program } => match from_program {
                Some(program) => write!(f, "{}.aleo/{}", program, name),
                None => write!(f, "{}", name),
            },
        }
    }
}

/// Parse value-type text. `declaration` names the enclosing declaration for
/// error reporting.
pub fn parse_type(text: &str, declaration: &str) -> Result<ValueType> {
    let text = text.trim();
    let fail = || Error::InvalidType {
        text: text.to_string(),
        declaration: declaration.to_string(),
    };

    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        // `[Element; N]` with N a positive integer.
        let (element_text, length_text) = inner.rsplit_once(';').ok_or_else(fail)?;
        let length: u32 = length_text.trim().parse().map_err(|_| fail())?;
        if length == 0 {
            return Err(fail());
        }
        let element = parse_type(element_text, declaration)?;
        return Ok(ValueType::Array {
            element: Box::new(element),
            length,
        });
    }

    match text {
        "address" => return Ok(ValueType::Address),
        "boolean" => return Ok(ValueType::Boolean),
        "field" => return Ok(ValueType::Field),
        "group" => return Ok(ValueType::Group),
        "scalar" => return Ok(ValueType::Scalar),
        _ => {}
    }

    if let Some(rest) = text.strip_prefix('u').or_else(|| text.strip_prefix('i')) {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            let width: u16 = rest.parse().map_err(|_| fail())?;
            if !INTEGER_WIDTHS.contains(&width) {
                return Err(fail());
            }
            return Ok(ValueType::Integer {
                width,
                signed: text.starts_with('i'),
            });
        }
    }

    let captures = CUSTOM_TYPE_RE.captures(text).ok_or_else(fail)?;
    Ok(ValueType::Custom {
        name: captures[2].to_string(),
        from_program: captures.get(1).map(|m| m.as_str().to_string()),
    })
}

/// Per-field disclosure qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Public,
    Record,
    Future,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Public => write!(f, "public"),
            Self::Record => write!(f, "record"),
            Self::Future => write!(f, "future"),
        }
    }
}

impl FromStr for Visibility {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            "record" => Ok(Self::Record),
            "future" => Ok(Self::Future),
            _ => Err(()),
        }
    }
}

/// Split an optional trailing visibility qualifier off type text.
/// `u64.private` → `("u64", Some(Private))`; `address` → `("address", None)`.
pub fn split_visibility(text: &str) -> (&str, Option<Visibility>) {
    if let Some((head, tail)) = text.rsplit_once('.') {
        if let Ok(visibility) = tail.parse::<Visibility>() {
            return (head, Some(visibility));
        }
    }
    (text, None)
}

/// Check the ledger's account-address shape.
pub fn is_valid_address(text: &str) -> bool {
    ADDRESS_RE.is_match(text)
}

/// An owning account address, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    pub fn parse(text: &str) -> Result<Self> {
        if is_valid_address(text) {
            Ok(Self(text.to_string()))
        } else {
            Err(Error::InvalidAddress(text.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
