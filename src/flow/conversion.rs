use super::definition::{Choice, DecodeTarget, FlowDefinition, Node, NodeKind};
use super::raw::{RawDecodeTarget, RawFlow, RawNode};
use crate::condition::{Condition, Rule};
use crate::error::FlowLoadError;
use ahash::AHashMap;

/// A trait for authored flow formats that can be converted into a validated `FlowDefinition`.
///
/// `RawFlow` (the JSON document format) implements it. Other formats can plug
/// in by implementing it for their own structs.
pub trait IntoFlow {
    /// Consumes the object and converts it into a validated flow.
    fn into_flow(self) -> Result<FlowDefinition, FlowLoadError>;
}

impl IntoFlow for RawFlow {
    fn into_flow(self) -> Result<FlowDefinition, FlowLoadError> {
        let flow_id = self.id;
        let mut nodes = AHashMap::with_capacity(self.nodes.len());

        for (key, raw_node) in self.nodes {
            let node = convert_node(&flow_id, &key, raw_node)?;
            nodes.insert(key, node);
        }

        let flow = FlowDefinition {
            id: flow_id,
            brand: self.brand,
            equipment_type: self.equipment_type,
            model: self.model,
            title: self.title,
            start: self.start,
            nodes,
        };
        flow.validate()?;
        Ok(flow)
    }
}

impl FlowDefinition {
    /// Parses and validates a flow from its JSON document.
    pub fn from_json(json: &str) -> Result<Self, FlowLoadError> {
        let raw: RawFlow =
            serde_json::from_str(json).map_err(|e| FlowLoadError::JsonParseError(e.to_string()))?;
        raw.into_flow()
    }
}

fn convert_node(flow_id: &str, key: &str, raw: RawNode) -> Result<Node, FlowLoadError> {
    if let Some(declared) = raw.id.as_deref().filter(|id| !id.is_empty()) {
        if declared != key {
            return Err(FlowLoadError::NodeIdMismatch {
                flow_id: flow_id.to_string(),
                key: key.to_string(),
                declared: declared.to_string(),
            });
        }
    }

    let logic = raw
        .logic
        .unwrap_or_default()
        .into_iter()
        .map(|rule| {
            let condition =
                Condition::parse(&rule.condition).map_err(|e| FlowLoadError::InvalidCondition {
                    flow_id: flow_id.to_string(),
                    node_id: key.to_string(),
                    condition: rule.condition.clone(),
                    message: e.to_string(),
                })?;
            Ok(Rule {
                condition,
                goto: rule.goto,
            })
        })
        .collect::<Result<Vec<_>, FlowLoadError>>()?;

    let input = raw.input.as_deref().unwrap_or("info").trim().to_ascii_lowercase();
    let kind = match input.as_str() {
        "number" => NodeKind::Number {
            unit: raw.unit,
            range: raw.range.map(|[min, max]| (min, max)),
            pass: target(raw.pass),
            fail: target(raw.fail),
        },
        "yesno" => NodeKind::YesNo {
            pass: target(raw.pass),
            fail: target(raw.fail),
        },
        "choice" => NodeKind::Choice {
            choices: raw
                .choices
                .unwrap_or_default()
                .into_iter()
                .map(|(label, goto)| Choice {
                    label,
                    target: target(Some(goto)),
                })
                .collect(),
        },
        "text" => NodeKind::Text {
            decode: raw.decode.map(|d| match d {
                RawDecodeTarget::Model => DecodeTarget::Model,
                RawDecodeTarget::Serial => DecodeTarget::Serial,
            }),
        },
        "info" => NodeKind::Info {
            terminal: raw.terminal,
            success: raw.success,
            pass: target(raw.pass),
        },
        other => {
            return Err(FlowLoadError::UnknownInputKind {
                flow_id: flow_id.to_string(),
                node_id: key.to_string(),
                kind: other.to_string(),
            });
        }
    };

    let media = match raw.media {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => Some(value.to_string()),
    };

    Ok(Node {
        id: key.to_string(),
        text: raw.text,
        media,
        logic,
        default: target(raw.default),
        kind,
    })
}

/// Empty targets are treated as absent.
fn target(value: Option<String>) -> Option<String> {
    value.filter(|t| !t.trim().is_empty())
}
