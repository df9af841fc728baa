use thiserror::Error;

/// Errors that can occur while loading, validating or bundling flow definitions.
#[derive(Error, Debug)]
pub enum FlowLoadError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse flow JSON: {0}")]
    JsonParseError(String),

    #[error("Flow '{flow_id}' has no nodes")]
    EmptyFlow { flow_id: String },

    #[error("Node '{node_id}' in flow '{flow_id}' has an unknown input kind: '{kind}'")]
    UnknownInputKind {
        flow_id: String,
        node_id: String,
        kind: String,
    },

    #[error("Node keyed '{key}' in flow '{flow_id}' declares a different id '{declared}'")]
    NodeIdMismatch {
        flow_id: String,
        key: String,
        declared: String,
    },

    #[error(
        "Node '{missing_node_id}' not found in flow '{flow_id}', which is required by '{field}' of node '{source_node_id}'"
    )]
    DanglingReference {
        flow_id: String,
        source_node_id: String,
        field: String,
        missing_node_id: String,
    },

    #[error("Start node '{start}' not found in flow '{flow_id}'")]
    MissingStart { flow_id: String, start: String },

    #[error("Node '{node_id}' in flow '{flow_id}' has an unsupported condition '{condition}': {message}")]
    InvalidCondition {
        flow_id: String,
        node_id: String,
        condition: String,
        message: String,
    },

    #[error("Node id '{node_id}' in flow '{flow_id}' is reserved for the final record")]
    ReservedNodeId { flow_id: String, node_id: String },

    #[error("Node '{node_id}' in flow '{flow_id}' has an invalid range: {message}")]
    InvalidRange {
        flow_id: String,
        node_id: String,
        message: String,
    },

    #[error("A flow is already registered for '{key}' (existing '{existing}', new '{duplicate}')")]
    DuplicateFlow {
        key: String,
        existing: String,
        duplicate: String,
    },

    #[error("Flow bundle error: {0}")]
    Bundle(String),
}

/// Why a condition string was rejected by the routing grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ConditionParseError(pub String);

/// Errors returned by `Session::respond`. None of them change the session state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResponseError {
    #[error("Invalid value for node '{node_id}': {message}")]
    InvalidInput { node_id: String, message: String },

    #[error("Node '{node_id}' has no route for the given response")]
    Unrouted { node_id: String },

    #[error("Node '{node_id}' points to '{target}', which does not exist in flow '{flow_id}'")]
    MalformedFlow {
        flow_id: String,
        node_id: String,
        target: String,
    },

    #[error("The session already finished on node '{node_id}'")]
    SessionFinished { node_id: String },
}

/// Errors produced by a `SessionStore` backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session snapshot could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session storage is unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while loading the engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
