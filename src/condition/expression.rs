use crate::decoder::EquipmentField;
use crate::error::ConditionParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

const QUOTED: &str = r#"(?:'([^']*)'|"([^"]*)")"#;

static FIELD_EQUALS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^equipment\.([A-Za-z]+)\s*===?\s*{}$", QUOTED)).unwrap()
});
static FIELD_INCLUDES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^equipment\.([A-Za-z]+)\.includes\(\s*{}\s*\)$", QUOTED)).unwrap()
});
static VALUE_STARTS_WITH: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^value\.startsWith\(\s*{}\s*\)$", QUOTED)).unwrap());
static VALUE_INCLUDES: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^value\.includes\(\s*{}\s*\)$", QUOTED)).unwrap());
static VALUE_COMPARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^value\s*(>=|<=|===|==|>|<)\s*(-?\d+(?:\.\d+)?)$").unwrap()
});

/// A numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    GreaterThan,
    GreaterThanOrEqual,
    SmallerThan,
    SmallerThanOrEqual,
    Equal,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanOrEqual => ">=",
            Comparison::SmallerThan => "<",
            Comparison::SmallerThanOrEqual => "<=",
            Comparison::Equal => "==",
        }
    }

    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            Comparison::GreaterThan => left > right,
            Comparison::GreaterThanOrEqual => left >= right,
            Comparison::SmallerThan => left < right,
            Comparison::SmallerThanOrEqual => left <= right,
            Comparison::Equal => left == right,
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Comparison::GreaterThan),
            ">=" => Some(Comparison::GreaterThanOrEqual),
            "<" => Some(Comparison::SmallerThan),
            "<=" => Some(Comparison::SmallerThanOrEqual),
            "==" | "===" => Some(Comparison::Equal),
            _ => None,
        }
    }
}

/// A routing condition. This is the complete grammar: every supported shape is
/// one variant, and there is no generic expression form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// `equipment.<field> == '<literal>'`
    FieldEquals { field: EquipmentField, literal: String },
    /// `equipment.<field>.includes('<literal>')`
    FieldContains { field: EquipmentField, literal: String },
    /// `value.startsWith('<literal>')`
    ValueStartsWith(String),
    /// `value.includes('<literal>')`
    ValueContains(String),
    /// `value <op> <number>`
    ValueCompare { op: Comparison, operand: f64 },
}

impl Condition {
    /// Parses a condition string. Anything outside the fixed shapes is an error.
    pub fn parse(source: &str) -> Result<Self, ConditionParseError> {
        let source = source.trim();

        if let Some(caps) = FIELD_EQUALS.captures(source) {
            return Ok(Condition::FieldEquals {
                field: parse_field(&caps[1])?,
                literal: quoted(&caps),
            });
        }
        if let Some(caps) = FIELD_INCLUDES.captures(source) {
            return Ok(Condition::FieldContains {
                field: parse_field(&caps[1])?,
                literal: quoted(&caps),
            });
        }
        if let Some(caps) = VALUE_STARTS_WITH.captures(source) {
            return Ok(Condition::ValueStartsWith(quoted_from(&caps, 1)));
        }
        if let Some(caps) = VALUE_INCLUDES.captures(source) {
            return Ok(Condition::ValueContains(quoted_from(&caps, 1)));
        }
        if let Some(caps) = VALUE_COMPARE.captures(source) {
            let op = Comparison::from_symbol(&caps[1])
                .ok_or_else(|| ConditionParseError(format!("unknown operator '{}'", &caps[1])))?;
            let operand = caps[2]
                .parse::<f64>()
                .map_err(|e| ConditionParseError(format!("invalid number '{}': {}", &caps[2], e)))?;
            return Ok(Condition::ValueCompare { op, operand });
        }

        Err(ConditionParseError(
            "expected one of: equipment.<field> == '<text>', equipment.<field>.includes('<text>'), \
             value.startsWith('<text>'), value.includes('<text>'), value <op> <number>"
                .to_string(),
        ))
    }
}

fn parse_field(name: &str) -> Result<EquipmentField, ConditionParseError> {
    EquipmentField::from_name(name)
        .ok_or_else(|| ConditionParseError(format!("unknown equipment field '{}'", name)))
}

/// Field conditions capture the field name first, so the literal starts at group 2.
fn quoted(caps: &regex::Captures<'_>) -> String {
    quoted_from(caps, 2)
}

fn quoted_from(caps: &regex::Captures<'_>, first_group: usize) -> String {
    caps.get(first_group)
        .or_else(|| caps.get(first_group + 1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn quote(literal: &str) -> String {
    if literal.contains('\'') {
        format!("\"{}\"", literal)
    } else {
        format!("'{}'", literal)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::FieldEquals { field, literal } => {
                write!(f, "equipment.{} == {}", field, quote(literal))
            }
            Condition::FieldContains { field, literal } => {
                write!(f, "equipment.{}.includes({})", field, quote(literal))
            }
            Condition::ValueStartsWith(literal) => write!(f, "value.startsWith({})", quote(literal)),
            Condition::ValueContains(literal) => write!(f, "value.includes({})", quote(literal)),
            Condition::ValueCompare { op, operand } => {
                write!(f, "value {} {}", op.symbol(), format_number(*operand))
            }
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// An ordered routing rule: when `condition` holds, go to `goto`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub condition: Condition,
    pub goto: String,
}
