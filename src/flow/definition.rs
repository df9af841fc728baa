use crate::condition::Rule;
use crate::decoder::normalize_key;
use crate::error::FlowLoadError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Keys the final record writes next to the answers, so no node may use them as an id.
pub const RESERVED_NODE_IDS: [&str; 3] = ["equipment", "result", "outcome"];

/// The canonical, validated definition of one diagnostic flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub id: String,
    pub brand: String,
    pub equipment_type: String,
    pub model: String,
    pub title: String,
    pub start: String,
    pub nodes: AHashMap<String, Node>,
}

/// A single question or information step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub text: String,
    /// Opaque media references, kept as compact JSON text.
    pub media: Option<String>,
    pub logic: Vec<Rule>,
    pub default: Option<String>,
    pub kind: NodeKind,
}

/// Which identifier a text node collects for the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeTarget {
    Model,
    Serial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Number {
        unit: Option<String>,
        /// Inclusive bounds. `None` accepts every number.
        range: Option<(f64, f64)>,
        pass: Option<String>,
        fail: Option<String>,
    },
    YesNo {
        pass: Option<String>,
        fail: Option<String>,
    },
    Choice {
        choices: Vec<Choice>,
    },
    Text {
        decode: Option<DecodeTarget>,
    },
    Info {
        terminal: bool,
        success: bool,
        pass: Option<String>,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Number { .. } => "number",
            NodeKind::YesNo { .. } => "yesno",
            NodeKind::Choice { .. } => "choice",
            NodeKind::Text { .. } => "text",
            NodeKind::Info { .. } => "info",
        }
    }
}

impl Node {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Info { terminal: true, .. })
    }

    /// Non-terminal info nodes with logic are routed without asking the user.
    pub fn is_auto_routed(&self) -> bool {
        matches!(self.kind, NodeKind::Info { terminal: false, .. }) && !self.logic.is_empty()
    }

    pub fn media(&self) -> Option<serde_json::Value> {
        self.media
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// Every outgoing reference of this node, with the field it comes from.
    pub fn targets(&self) -> Vec<(String, &str)> {
        let mut targets: Vec<(String, &str)> = Vec::new();
        for (index, rule) in self.logic.iter().enumerate() {
            targets.push((format!("logic[{}].goto", index), rule.goto.as_str()));
        }
        if let Some(default) = &self.default {
            targets.push(("default".to_string(), default.as_str()));
        }
        match &self.kind {
            NodeKind::Number { pass, fail, .. } | NodeKind::YesNo { pass, fail } => {
                if let Some(pass) = pass {
                    targets.push(("pass".to_string(), pass.as_str()));
                }
                if let Some(fail) = fail {
                    targets.push(("fail".to_string(), fail.as_str()));
                }
            }
            NodeKind::Choice { choices } => {
                for choice in choices {
                    if let Some(target) = &choice.target {
                        targets.push((format!("choices[{}]", choice.label), target.as_str()));
                    }
                }
            }
            NodeKind::Info { pass: Some(pass), .. } => {
                targets.push(("pass".to_string(), pass.as_str()))
            }
            NodeKind::Info { pass: None, .. } | NodeKind::Text { .. } => {}
        }
        targets
    }
}

impl FlowDefinition {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// The normalized lookup key for this flow.
    pub fn key(&self) -> String {
        flow_key(&self.brand, &self.equipment_type, &self.model)
    }

    /// Checks that the start node and every transition target exist.
    pub fn validate(&self) -> Result<(), FlowLoadError> {
        if self.nodes.is_empty() {
            return Err(FlowLoadError::EmptyFlow {
                flow_id: self.id.clone(),
            });
        }
        if !self.contains(&self.start) {
            return Err(FlowLoadError::MissingStart {
                flow_id: self.id.clone(),
                start: self.start.clone(),
            });
        }

        let mut ids: Vec<&String> = self.nodes.keys().collect();
        ids.sort();
        for id in ids {
            let node = &self.nodes[id];
            if RESERVED_NODE_IDS.contains(&id.as_str()) {
                return Err(FlowLoadError::ReservedNodeId {
                    flow_id: self.id.clone(),
                    node_id: id.clone(),
                });
            }
            for (field, target) in node.targets() {
                if !self.contains(target) {
                    return Err(FlowLoadError::DanglingReference {
                        flow_id: self.id.clone(),
                        source_node_id: node.id.clone(),
                        field,
                        missing_node_id: target.to_string(),
                    });
                }
            }
            if let NodeKind::Number {
                range: Some((min, max)),
                ..
            } = node.kind
            {
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(FlowLoadError::InvalidRange {
                        flow_id: self.id.clone(),
                        node_id: node.id.clone(),
                        message: format!("[{}, {}] is not an ordered pair of finite numbers", min, max),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builds the lookup key from brand, equipment type and model.
pub fn flow_key(brand: &str, equipment_type: &str, model: &str) -> String {
    format!(
        "{}|{}|{}",
        normalize_key(brand),
        normalize_key(equipment_type),
        normalize_key(model)
    )
}
