use super::expression::{Condition, Rule, format_number};
use crate::decoder::EquipmentInfo;

/// The data a condition is evaluated against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionContext<'a> {
    /// Merged equipment facts from decoder nodes, if any were decoded.
    pub equipment: Option<&'a EquipmentInfo>,
    /// The raw value most recently entered by the technician.
    pub value: Option<&'a str>,
}

impl<'a> ConditionContext<'a> {
    pub fn new(equipment: Option<&'a EquipmentInfo>, value: Option<&'a str>) -> Self {
        Self { equipment, value }
    }
}

/// How a routing target was chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteSource {
    /// The rule at `index` matched; `reason` explains the comparison.
    Rule { index: usize, reason: String },
    /// No rule matched and the node's default target was used.
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route<'r> {
    pub target: &'r str,
    pub source: RouteSource,
}

impl Condition {
    /// Evaluates the condition. Total: missing data or unparsable numbers make it `false`.
    pub fn evaluate(&self, ctx: &ConditionContext<'_>) -> bool {
        match self {
            Condition::FieldEquals { field, literal } => ctx
                .equipment
                .and_then(|e| e.field(*field))
                .is_some_and(|actual| actual == *literal),
            Condition::FieldContains { field, literal } => ctx
                .equipment
                .and_then(|e| e.field(*field))
                .is_some_and(|actual| actual.contains(literal.as_str())),
            Condition::ValueStartsWith(prefix) => {
                ctx.value.is_some_and(|v| v.starts_with(prefix.as_str()))
            }
            Condition::ValueContains(needle) => {
                ctx.value.is_some_and(|v| v.contains(needle.as_str()))
            }
            Condition::ValueCompare { op, operand } => {
                parse_number(ctx.value).is_some_and(|v| op.apply(v, *operand))
            }
        }
    }

    /// Formats the condition with the values it was evaluated against.
    pub fn explain(&self, ctx: &ConditionContext<'_>) -> String {
        match self {
            Condition::FieldEquals { field, .. } | Condition::FieldContains { field, .. } => {
                let actual = ctx.equipment.and_then(|e| e.field(*field));
                format!(
                    "$equipment.{} (was {}) {}",
                    field,
                    actual.as_deref().unwrap_or("absent"),
                    self.operator_tail()
                )
            }
            _ => format!(
                "$value (was {}) {}",
                ctx.value.unwrap_or("absent"),
                self.operator_tail()
            ),
        }
    }

    fn operator_tail(&self) -> String {
        match self {
            Condition::FieldEquals { literal, .. } => format!("== '{}'", literal),
            Condition::FieldContains { literal, .. } | Condition::ValueContains(literal) => {
                format!("includes '{}'", literal)
            }
            Condition::ValueStartsWith(literal) => format!("startsWith '{}'", literal),
            Condition::ValueCompare { op, operand } => {
                format!("{} {}", op.symbol(), format_number(*operand))
            }
        }
    }
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Tests `rules` in order and returns the first match, else `default`, else `None`.
pub fn route<'r>(
    rules: &'r [Rule],
    default: Option<&'r str>,
    ctx: &ConditionContext<'_>,
) -> Option<Route<'r>> {
    rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.condition.evaluate(ctx))
        .map(|(index, rule)| Route {
            target: rule.goto.as_str(),
            source: RouteSource::Rule {
                index,
                reason: rule.condition.explain(ctx),
            },
        })
        .or_else(|| {
            default.map(|target| Route {
                target,
                source: RouteSource::Default,
            })
        })
}
