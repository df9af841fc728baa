use super::answers::{Answer, Answers};
use super::storage::{HistoryEntry, NullStore, SessionSnapshot, SessionStore};
use crate::condition::{ConditionContext, RouteSource, format_number, route};
use crate::config::SessionConfig;
use crate::decoder::{DecoderRegistry, EquipmentInfo, ModelInfo, SerialInfo};
use crate::error::{FlowLoadError, ResponseError};
use crate::flow::{DecodeTarget, FlowDefinition, Node, NodeKind};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A caller's input for the current node.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Continue past an info node.
    Acknowledge,
}

impl From<&str> for Response {
    fn from(value: &str) -> Self {
        Response::Text(value.to_string())
    }
}

impl From<String> for Response {
    fn from(value: String) -> Self {
        Response::Text(value)
    }
}

impl From<f64> for Response {
    fn from(value: f64) -> Self {
        Response::Number(value)
    }
}

impl From<i32> for Response {
    fn from(value: i32) -> Self {
        Response::Number(f64::from(value))
    }
}

impl From<bool> for Response {
    fn from(value: bool) -> Self {
        Response::Bool(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Success,
    Failure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("Success"),
            Outcome::Failure => f.write_str("Failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Active { node_id: String },
    Terminal { node_id: String, outcome: Outcome },
}

/// The record handed to a report generator once a terminal node is reached.
///
/// Serializes as the answers object with `result` and `outcome` (and the
/// decoded `equipment`, when any) alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalRecord {
    #[serde(flatten)]
    pub answers: Answers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<EquipmentInfo>,
    pub result: String,
    pub outcome: Outcome,
    #[serde(skip)]
    pub success: bool,
}

/// What a successful `respond` did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The session moved to a new, non-terminal node.
    Advanced { node_id: String },
    /// The session reached a terminal node.
    Finished(FinalRecord),
}

/// The validated meaning of a response for one node.
struct Accepted {
    answer: Answer,
    /// The response as text. Logic rules see it unless the node is an info step.
    raw: String,
    /// The target the node kind itself selects, before `default`.
    kind_target: Option<String>,
}

pub struct SessionBuilder {
    flow: Arc<FlowDefinition>,
    decoders: Option<Arc<DecoderRegistry>>,
    store: Option<Arc<dyn SessionStore>>,
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new(flow: Arc<FlowDefinition>) -> Self {
        Self {
            flow,
            decoders: None,
            store: None,
            config: SessionConfig::default(),
        }
    }

    pub fn with_decoders(mut self, decoders: Arc<DecoderRegistry>) -> Self {
        self.decoders = Some(decoders);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts a fresh session at the flow's start node.
    pub fn build(self) -> Result<Session, FlowLoadError> {
        let mut session = self.into_session()?;
        session.auto_route();
        session.persist();
        Ok(session)
    }

    /// Restores the persisted session if it belongs to this flow, otherwise starts fresh.
    pub fn resume(self) -> Result<Session, FlowLoadError> {
        let mut session = self.into_session()?;

        let snapshot = match session.store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Could not load persisted session: {}", e);
                None
            }
        };

        match snapshot {
            Some(snapshot) if session.accepts(&snapshot) => {
                log::info!(
                    "Resumed session for flow '{}' at node '{}'",
                    session.flow.id,
                    snapshot.current_node_id
                );
                session.restore(snapshot);
            }
            Some(_) => {
                log::warn!(
                    "Discarding persisted session that does not match flow '{}'",
                    session.flow.id
                );
                session.auto_route();
                session.persist();
            }
            None => {
                session.auto_route();
                session.persist();
            }
        }
        Ok(session)
    }

    fn into_session(self) -> Result<Session, FlowLoadError> {
        if !self.flow.contains(&self.flow.start) {
            return Err(FlowLoadError::MissingStart {
                flow_id: self.flow.id.clone(),
                start: self.flow.start.clone(),
            });
        }
        Ok(Session {
            current: self.flow.start.clone(),
            flow: self.flow,
            decoders: self
                .decoders
                .unwrap_or_else(|| Arc::new(DecoderRegistry::default())),
            store: self.store.unwrap_or_else(|| Arc::new(NullStore)),
            config: self.config,
            answers: Answers::new(),
            history: Vec::new(),
            model_info: None,
            serial_info: None,
            equipment: None,
            draft: None,
            last_value: None,
        })
    }
}

/// One diagnostic run through a flow.
///
/// Every operation runs to completion synchronously. A failed operation
/// leaves the session exactly as it was.
pub struct Session {
    flow: Arc<FlowDefinition>,
    decoders: Arc<DecoderRegistry>,
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    current: String,
    answers: Answers,
    history: Vec<HistoryEntry>,
    model_info: Option<ModelInfo>,
    serial_info: Option<SerialInfo>,
    equipment: Option<EquipmentInfo>,
    draft: Option<String>,
    /// The raw value of the most recent answered question, the `value` logic rules see.
    last_value: Option<String>,
}

impl Session {
    pub fn builder(flow: Arc<FlowDefinition>) -> SessionBuilder {
        SessionBuilder::new(flow)
    }

    pub fn flow(&self) -> &FlowDefinition {
        &self.flow
    }

    pub fn current_node_id(&self) -> &str {
        &self.current
    }

    pub fn current_node(&self) -> &Node {
        // `current` only ever holds ids that were checked against the flow.
        &self.flow.nodes[&self.current]
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn equipment(&self) -> Option<&EquipmentInfo> {
        self.equipment.as_ref()
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// Records the value currently typed into the input widget.
    pub fn set_draft(&mut self, draft: Option<String>) {
        self.draft = draft;
        self.persist();
    }

    pub fn state(&self) -> SessionState {
        match self.outcome() {
            Some(outcome) => SessionState::Terminal {
                node_id: self.current.clone(),
                outcome,
            },
            None => SessionState::Active {
                node_id: self.current.clone(),
            },
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_node().is_terminal()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.current_node().kind {
            NodeKind::Info {
                terminal: true,
                success,
                ..
            } => Some(if success {
                Outcome::Success
            } else {
                Outcome::Failure
            }),
            _ => None,
        }
    }

    /// The answer record for the report generator, once the session is finished.
    pub fn final_record(&self) -> Option<FinalRecord> {
        let outcome = self.outcome()?;
        Some(FinalRecord {
            answers: self.answers.clone(),
            equipment: self.equipment.clone(),
            result: self.current_node().text.clone(),
            outcome,
            success: outcome == Outcome::Success,
        })
    }

    /// Answers the current node and moves to the next one.
    pub fn respond(&mut self, response: impl Into<Response>) -> Result<Step, ResponseError> {
        let response = response.into();
        let flow = Arc::clone(&self.flow);
        let node = flow
            .node(&self.current)
            .ok_or_else(|| ResponseError::MalformedFlow {
                flow_id: flow.id.clone(),
                node_id: self.current.clone(),
                target: self.current.clone(),
            })?;

        if node.is_terminal() {
            return Err(ResponseError::SessionFinished {
                node_id: node.id.clone(),
            });
        }

        let accepted = accept(node, &response)?;

        let (model_info, serial_info) = match node.kind {
            NodeKind::Text {
                decode: Some(target),
            } => self.decode(target, &accepted.raw),
            _ => (self.model_info.clone(), self.serial_info.clone()),
        };
        let equipment = if model_info.is_some() || serial_info.is_some() {
            Some(EquipmentInfo::merge(
                &flow.brand,
                model_info.as_ref(),
                serial_info.as_ref(),
            ))
        } else {
            None
        };

        // Acknowledging an info step is not an input, so its rules see the last real one.
        let value = match node.kind {
            NodeKind::Info { .. } => self.last_value.clone(),
            _ => Some(accepted.raw),
        };
        let ctx = ConditionContext::new(equipment.as_ref(), value.as_deref());
        let target = match route(&node.logic, None, &ctx) {
            Some(found) => {
                if let RouteSource::Rule { index, reason } = &found.source {
                    log::debug!("Node '{}' rule #{} matched: {}", node.id, index, reason);
                }
                Some(found.target.to_string())
            }
            None => accepted.kind_target.or_else(|| node.default.clone()),
        }
        .ok_or_else(|| ResponseError::Unrouted {
            node_id: node.id.clone(),
        })?;

        if !flow.contains(&target) {
            log::error!(
                "Flow '{}': node '{}' routes to missing node '{}'; staying put",
                flow.id,
                node.id,
                target
            );
            return Err(ResponseError::MalformedFlow {
                flow_id: flow.id.clone(),
                node_id: node.id.clone(),
                target,
            });
        }

        self.answers.record(&node.id, accepted.answer);
        self.history.push(HistoryEntry {
            node_id: node.id.clone(),
            draft: self.draft.take(),
            value: self.last_value.take(),
        });
        self.last_value = value;
        self.model_info = model_info;
        self.serial_info = serial_info;
        self.equipment = equipment;
        log::debug!("Node '{}' -> '{}'", node.id, target);
        self.current = target;

        self.auto_route();
        self.persist();

        Ok(match self.final_record() {
            Some(record) => {
                log::info!(
                    "Flow '{}' finished at '{}' with outcome {}",
                    flow.id,
                    self.current,
                    record.outcome
                );
                Step::Finished(record)
            }
            None => Step::Advanced {
                node_id: self.current.clone(),
            },
        })
    }

    /// Steps back to the previously answered node. Returns `false` when there is no history.
    pub fn go_back(&mut self) -> bool {
        let Some(entry) = self.history.pop() else {
            return false;
        };
        log::debug!("Back from '{}' to '{}'", self.current, entry.node_id);
        self.current = entry.node_id;
        self.draft = entry.draft;
        self.last_value = entry.value;
        self.persist();
        true
    }

    /// Clears all progress and returns to the start node.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.history.clear();
        self.model_info = None;
        self.serial_info = None;
        self.equipment = None;
        self.draft = None;
        self.last_value = None;
        self.current = self.flow.start.clone();
        self.auto_route();
        if let Err(e) = self.store.clear() {
            log::warn!("Could not clear persisted session: {}", e);
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            flow_id: Some(self.flow.id.clone()),
            current_node_id: self.current.clone(),
            history: self.history.clone(),
            answers: self.answers.clone(),
            model_info: self.model_info.clone(),
            serial_info: self.serial_info.clone(),
            draft: self.draft.clone(),
            last_value: self.last_value.clone(),
        }
    }

    fn decode(&self, target: DecodeTarget, raw: &str) -> (Option<ModelInfo>, Option<SerialInfo>) {
        let Some(decoder) = self
            .decoders
            .lookup(&self.flow.brand, &self.flow.equipment_type)
        else {
            log::warn!(
                "No decoder registered for '{}' / '{}'",
                self.flow.brand,
                self.flow.equipment_type
            );
            return (self.model_info.clone(), self.serial_info.clone());
        };

        match target {
            DecodeTarget::Model => {
                let info = decoder.decode_model(raw);
                if !info.valid {
                    log::info!("Model '{}' not recognized by the {} decoder", raw, decoder.family());
                }
                (Some(info), self.serial_info.clone())
            }
            DecodeTarget::Serial => {
                let info = decoder.decode_serial(raw);
                if !info.valid {
                    log::info!("Serial '{}' not recognized by the {} decoder", raw, decoder.family());
                }
                (self.model_info.clone(), Some(info))
            }
        }
    }

    /// Follows logic-bearing info nodes until a node needs the user.
    fn auto_route(&mut self) {
        let flow = Arc::clone(&self.flow);
        let value = self.last_value.clone();
        for _ in 0..self.config.max_auto_route_hops {
            let Some(node) = flow.node(&self.current) else {
                return;
            };
            if !node.is_auto_routed() {
                return;
            }
            let ctx = ConditionContext::new(self.equipment.as_ref(), value.as_deref());
            let Some(found) = route(&node.logic, node.default.as_deref(), &ctx) else {
                return;
            };
            if !flow.contains(found.target) {
                log::error!(
                    "Flow '{}': node '{}' auto-routes to missing node '{}'; staying put",
                    flow.id,
                    node.id,
                    found.target
                );
                return;
            }
            match &found.source {
                RouteSource::Rule { index, reason } => log::debug!(
                    "Auto-routed '{}' -> '{}' by rule #{}: {}",
                    node.id,
                    found.target,
                    index,
                    reason
                ),
                RouteSource::Default => {
                    log::debug!("Auto-routed '{}' -> '{}' by default", node.id, found.target)
                }
            }
            self.current = found.target.to_string();
        }

        if self.current_node().is_auto_routed() {
            log::warn!(
                "Flow '{}': auto-routing stopped at '{}' after {} hops",
                flow.id,
                self.current,
                self.config.max_auto_route_hops
            );
        }
    }

    fn persist(&self) {
        // A finished session has been handed off; nothing is left to resume.
        let result = if self.is_finished() {
            self.store.clear()
        } else {
            self.store.save(&self.snapshot())
        };
        if let Err(e) = result {
            log::warn!("Could not persist session: {}", e);
        }
    }

    fn accepts(&self, snapshot: &SessionSnapshot) -> bool {
        snapshot
            .flow_id
            .as_deref()
            .is_none_or(|id| id == self.flow.id)
            && self.flow.contains(&snapshot.current_node_id)
            && snapshot
                .history
                .iter()
                .all(|entry| self.flow.contains(&entry.node_id))
    }

    fn restore(&mut self, snapshot: SessionSnapshot) {
        self.current = snapshot.current_node_id;
        self.history = snapshot.history;
        self.answers = snapshot.answers;
        self.model_info = snapshot.model_info;
        self.serial_info = snapshot.serial_info;
        self.draft = snapshot.draft;
        self.last_value = snapshot.last_value;
        self.equipment = if self.model_info.is_some() || self.serial_info.is_some() {
            Some(EquipmentInfo::merge(
                &self.flow.brand,
                self.model_info.as_ref(),
                self.serial_info.as_ref(),
            ))
        } else {
            None
        };
    }
}

/// Validates `response` for the node's input kind.
fn accept(node: &Node, response: &Response) -> Result<Accepted, ResponseError> {
    let invalid = |message: String| ResponseError::InvalidInput {
        node_id: node.id.clone(),
        message,
    };

    match &node.kind {
        NodeKind::Number {
            range, pass, fail, ..
        } => {
            let value = match response {
                Response::Number(n) => Some(*n),
                Response::Text(text) => text.trim().parse::<f64>().ok(),
                Response::Bool(_) | Response::Acknowledge => None,
            }
            .filter(|n| n.is_finite())
            .ok_or_else(|| invalid("expected a number".to_string()))?;

            let in_range = range.is_none_or(|(min, max)| min <= value && value <= max);
            Ok(Accepted {
                answer: Answer::Number(value),
                raw: format_number(value),
                kind_target: if in_range { pass.clone() } else { fail.clone() },
            })
        }
        NodeKind::YesNo { pass, fail } => {
            let yes = match response {
                Response::Bool(b) => Some(*b),
                Response::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                    "yes" | "y" | "true" => Some(true),
                    "no" | "n" | "false" => Some(false),
                    _ => None,
                },
                Response::Number(_) | Response::Acknowledge => None,
            }
            .ok_or_else(|| invalid("expected yes or no".to_string()))?;

            let label = if yes { "Yes" } else { "No" };
            Ok(Accepted {
                answer: Answer::Text(label.to_string()),
                raw: label.to_string(),
                kind_target: if yes { pass.clone() } else { fail.clone() },
            })
        }
        NodeKind::Choice { choices } => {
            let Response::Text(text) = response else {
                return Err(invalid("expected one of the listed choices".to_string()));
            };
            let wanted = text.trim();
            let choice = choices
                .iter()
                .find(|c| c.label == wanted)
                .or_else(|| choices.iter().find(|c| c.label.eq_ignore_ascii_case(wanted)))
                .ok_or_else(|| invalid(format!("'{}' is not one of the listed choices", wanted)))?;

            Ok(Accepted {
                answer: Answer::Text(choice.label.clone()),
                raw: choice.label.clone(),
                kind_target: choice.target.clone(),
            })
        }
        NodeKind::Text { decode } => {
            let text = match response {
                Response::Text(text) => text.trim().to_string(),
                Response::Number(n) => format_number(*n),
                Response::Bool(_) | Response::Acknowledge => String::new(),
            };
            if text.is_empty() {
                return Err(invalid("a value is required".to_string()));
            }
            let text = if decode.is_some() {
                text.to_uppercase()
            } else {
                text
            };
            Ok(Accepted {
                answer: Answer::Text(text.clone()),
                raw: text,
                kind_target: None,
            })
        }
        NodeKind::Info { pass, .. } => {
            let text = match response {
                Response::Text(text) if !text.trim().is_empty() => text.trim().to_string(),
                Response::Number(n) => format_number(*n),
                Response::Bool(b) => b.to_string(),
                _ => "Continue".to_string(),
            };
            Ok(Accepted {
                answer: Answer::Text(text.clone()),
                raw: text,
                kind_target: pass.clone(),
            })
        }
    }
}
