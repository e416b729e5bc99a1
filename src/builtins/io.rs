//! The `scanf` family and its format strings.

use std::fmt;

use crate::machine_model::{CType, FloatKind, IntegerKind};

use super::CodeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputSource {
    Stdin,
    Stream,
    String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScanfFunction {
    pub source: InputSource,
    /// Position of the format string among the arguments.
    pub format_index: usize,
    /// The conversion targets come as one `va_list` argument.
    pub va_list: bool,
}

const fn scanf(source: InputSource, va_list: bool) -> ScanfFunction {
    ScanfFunction {
        source,
        format_index: match source {
            InputSource::Stdin => 0,
            InputSource::Stream | InputSource::String => 1,
        },
        va_list,
    }
}

const SCANF: &[(&str, ScanfFunction)] = &[
    ("scanf", scanf(InputSource::Stdin, false)),
    ("fscanf", scanf(InputSource::Stream, false)),
    ("sscanf", scanf(InputSource::String, false)),
    ("vscanf", scanf(InputSource::Stdin, true)),
    ("vfscanf", scanf(InputSource::Stream, true)),
    ("vsscanf", scanf(InputSource::String, true)),
];

pub fn classify_scanf_function(name: &str) -> Option<ScanfFunction> {
    let name = name.strip_prefix("__isoc99_").unwrap_or(name);
    super::lookup(name, SCANF)
}

pub fn is_scanf_function(name: &str) -> bool {
    classify_scanf_function(name).is_some()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LengthModifier {
    None,
    Hh,
    H,
    L,
    Ll,
    J,
    Z,
    T,
    LongDouble,
}

impl LengthModifier {
    fn as_str(self) -> &'static str {
        match self {
            LengthModifier::None => "",
            LengthModifier::Hh => "hh",
            LengthModifier::H => "h",
            LengthModifier::L => "l",
            LengthModifier::Ll => "ll",
            LengthModifier::J => "j",
            LengthModifier::Z => "z",
            LengthModifier::T => "t",
            LengthModifier::LongDouble => "L",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    SignedInteger,
    UnsignedInteger,
    Floating,
    Characters,
    String,
}

/// One `%` directive of a format string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScanfConversion {
    /// `%*d`: read but not stored, consumes no argument.
    pub suppressed: bool,
    pub width: Option<usize>,
    pub length: LengthModifier,
    pub specifier: char,
    pub kind: ConversionKind,
}

impl fmt::Display for ScanfConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%")?;
        if self.suppressed {
            write!(f, "*")?;
        }
        if let Some(width) = self.width {
            write!(f, "{width}")?;
        }
        write!(f, "{}{}", self.length.as_str(), self.specifier)
    }
}

impl ScanfConversion {
    /// The pointee type of the argument this conversion stores through, or
    /// `None` if it stores nothing.
    pub fn target_type(&self) -> Option<CType> {
        if self.suppressed {
            return None;
        }
        let integer = |length: LengthModifier| match length {
            LengthModifier::Hh => IntegerKind::Char,
            LengthModifier::H => IntegerKind::Short,
            LengthModifier::L => IntegerKind::Long,
            LengthModifier::Ll => IntegerKind::LongLong,
            _ => IntegerKind::Int,
        };
        Some(match self.kind {
            ConversionKind::SignedInteger => CType::signed(integer(self.length)),
            ConversionKind::UnsignedInteger => CType::unsigned(integer(self.length)),
            ConversionKind::Floating => CType::Float(match self.length {
                LengthModifier::L => FloatKind::Double,
                LengthModifier::LongDouble => FloatKind::LongDouble,
                _ => FloatKind::Float,
            }),
            ConversionKind::Characters | ConversionKind::String => CType::Char,
        })
    }
}

fn parse_length(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> LengthModifier {
    let mut next_if = |c: char| chars.next_if_eq(&c).is_some();
    if next_if('h') {
        if next_if('h') {
            LengthModifier::Hh
        } else {
            LengthModifier::H
        }
    } else if next_if('l') {
        if next_if('l') {
            LengthModifier::Ll
        } else {
            LengthModifier::L
        }
    } else if next_if('j') {
        LengthModifier::J
    } else if next_if('z') {
        LengthModifier::Z
    } else if next_if('t') {
        LengthModifier::T
    } else if next_if('L') {
        LengthModifier::LongDouble
    } else {
        LengthModifier::None
    }
}

fn conversion(
    suppressed: bool,
    width: Option<usize>,
    length: LengthModifier,
    specifier: char,
) -> Result<ScanfConversion, CodeError> {
    let directive = |length: LengthModifier| format!("%{}{specifier}", length.as_str());

    let kind = match specifier {
        'd' | 'i' => ConversionKind::SignedInteger,
        'o' | 'u' | 'x' | 'X' => ConversionKind::UnsignedInteger,
        'a' | 'e' | 'f' | 'g' | 'A' | 'E' | 'F' | 'G' => ConversionKind::Floating,
        'c' => ConversionKind::Characters,
        's' => ConversionKind::String,
        '[' | 'p' | 'n' => return Err(CodeError::Unsupported(format!("conversion %{specifier}"))),
        _ => return Err(CodeError::Unrecognized(format!("conversion %{specifier}"))),
    };

    match (kind, length) {
        (_, LengthModifier::None) => {}
        (
            ConversionKind::SignedInteger | ConversionKind::UnsignedInteger,
            LengthModifier::Hh | LengthModifier::H | LengthModifier::L | LengthModifier::Ll,
        ) => {}
        (
            ConversionKind::SignedInteger | ConversionKind::UnsignedInteger,
            LengthModifier::J | LengthModifier::Z | LengthModifier::T | LengthModifier::LongDouble,
        ) => return Err(CodeError::Unsupported(directive(length))),
        (ConversionKind::Floating, LengthModifier::L | LengthModifier::LongDouble) => {}
        (ConversionKind::Characters | ConversionKind::String, LengthModifier::L) => {
            return Err(CodeError::Unsupported(format!("wide conversion {}", directive(length))))
        }
        _ => return Err(CodeError::Unrecognized(directive(length))),
    }

    Ok(ScanfConversion {
        suppressed,
        width,
        length,
        specifier,
        kind,
    })
}

/// Parses the conversions of a `scanf` format string. Literal text and `%%`
/// produce no conversion.
pub fn parse_scanf_format(format: &str) -> Result<Vec<ScanfConversion>, CodeError> {
    let mut conversions = Vec::new();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        if chars.next_if_eq(&'%').is_some() {
            continue;
        }

        let suppressed = chars.next_if_eq(&'*').is_some();

        let mut digits = String::new();
        while let Some(d) = chars.next_if(char::is_ascii_digit) {
            digits.push(d);
        }
        let width = match digits.parse::<usize>() {
            Ok(0) => {
                return Err(CodeError::Unrecognized(format!(
                    "zero field width in {format:?}"
                )))
            }
            Ok(w) => Some(w),
            Err(_) if digits.is_empty() => None,
            Err(_) => {
                return Err(CodeError::Unsupported(format!(
                    "field width {digits} in {format:?}"
                )))
            }
        };

        let length = parse_length(&mut chars);
        let Some(specifier) = chars.next() else {
            return Err(CodeError::Unrecognized(format!(
                "incomplete conversion at the end of {format:?}"
            )));
        };
        conversions.push(conversion(suppressed, width, length, specifier)?);
    }

    Ok(conversions)
}

/// Checks that an argument of type `ty` may receive `conversion`.
pub fn check_scanf_argument(conversion: &ScanfConversion, ty: &CType) -> Result<(), CodeError> {
    let Some(expected) = conversion.target_type() else {
        return Ok(());
    };
    let matches = match ty {
        CType::Pointer(target) if expected == CType::Char => target.is_character(),
        CType::Pointer(target) => **target == expected,
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(CodeError::Unrecognized(format!(
            "argument of type {ty} for {conversion}, expected {}",
            expected.pointer_to()
        )))
    }
}
