use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A flow document exactly as it is authored on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFlow {
    pub id: String,
    pub brand: String,
    #[serde(alias = "equipment_type")]
    pub equipment_type: String,
    pub model: String,
    #[serde(default)]
    pub title: String,
    pub start: String,
    pub nodes: BTreeMap<String, RawNode>,
}

/// A node as authored. Every kind-specific field is optional here; the
/// conversion step picks the ones relevant to `input` and ignores the rest.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    /// `number`, `yesno`, `choice`, `text` or `info`. Absent means `info`.
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub media: Option<serde_json::Value>,
    #[serde(default)]
    pub logic: Option<Vec<RawRule>>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub range: Option<[f64; 2]>,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default)]
    pub fail: Option<String>,
    /// Label to target, in authored order.
    #[serde(default)]
    pub choices: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub decode: Option<RawDecodeTarget>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRule {
    #[serde(rename = "if")]
    pub condition: String,
    pub goto: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RawDecodeTarget {
    Model,
    Serial,
}

/// The explicit list of flow files to load, relative to the manifest itself.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FlowManifest {
    pub flows: Vec<String>,
}
