use super::definition::{FlowDefinition, flow_key};
use super::raw::FlowManifest;
use crate::error::FlowLoadError;
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const BUNDLE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct FlowBundle {
    version: u32,
    flows: Vec<FlowDefinition>,
}

/// An immutable set of validated flows, indexed by normalized
/// `(brand, equipment type, model)`.
#[derive(Debug, Clone, Default)]
pub struct FlowStore {
    flows: AHashMap<String, Arc<FlowDefinition>>,
}

/// Collects flows before building a `FlowStore`.
#[derive(Debug, Default)]
pub struct FlowStoreBuilder {
    flows: Vec<FlowDefinition>,
}

impl FlowStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an already-converted flow. It is validated again on `build`.
    pub fn register(mut self, flow: FlowDefinition) -> Self {
        self.flows.push(flow);
        self
    }

    /// Parses a JSON flow document and adds it.
    pub fn register_json(self, json: &str) -> Result<Self, FlowLoadError> {
        let flow = FlowDefinition::from_json(json)?;
        Ok(self.register(flow))
    }

    pub fn build(self) -> Result<FlowStore, FlowLoadError> {
        let mut flows: AHashMap<String, Arc<FlowDefinition>> = AHashMap::new();
        for flow in self.flows {
            flow.validate()?;
            let key = flow.key();
            if let Some(existing) = flows.get(&key) {
                return Err(FlowLoadError::DuplicateFlow {
                    key,
                    existing: existing.id.clone(),
                    duplicate: flow.id,
                });
            }
            log::debug!("Registered flow '{}' under '{}'", flow.id, key);
            flows.insert(key, Arc::new(flow));
        }
        Ok(FlowStore { flows })
    }
}

impl FlowStore {
    pub fn builder() -> FlowStoreBuilder {
        FlowStoreBuilder::new()
    }

    /// Loads every flow listed in a JSON manifest. Paths are relative to the manifest.
    pub fn from_manifest(path: impl AsRef<Path>) -> Result<Self, FlowLoadError> {
        let path = path.as_ref();
        let manifest_json = read_file(path)?;
        let manifest: FlowManifest = serde_json::from_str(&manifest_json)
            .map_err(|e| FlowLoadError::JsonParseError(format!("{}: {}", path.display(), e)))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut builder = FlowStore::builder();
        for entry in &manifest.flows {
            let flow_path = base.join(entry);
            let json = read_file(&flow_path)?;
            let flow = FlowDefinition::from_json(&json).map_err(|e| match e {
                FlowLoadError::JsonParseError(message) => {
                    FlowLoadError::JsonParseError(format!("{}: {}", flow_path.display(), message))
                }
                other => other,
            })?;
            builder = builder.register(flow);
        }

        let store = builder.build()?;
        log::info!(
            "Loaded {} flows from manifest '{}'",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Looks a flow up by its normalized key. `None` means no flow exists yet.
    pub fn find_flow(
        &self,
        brand: &str,
        equipment_type: &str,
        model: &str,
    ) -> Option<Arc<FlowDefinition>> {
        self.flows
            .get(&flow_key(brand, equipment_type, model))
            .cloned()
    }

    /// All flows, ordered by id.
    pub fn flows(&self) -> Vec<Arc<FlowDefinition>> {
        let mut flows: Vec<_> = self.flows.values().cloned().collect();
        flows.sort_by(|a, b| a.id.cmp(&b.id));
        flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Encodes the validated flows into a compact binary bundle.
    pub fn to_bundle_bytes(&self) -> Result<Vec<u8>, FlowLoadError> {
        let bundle = FlowBundle {
            version: BUNDLE_VERSION,
            flows: self.flows().iter().map(|f| f.as_ref().clone()).collect(),
        };
        encode_to_vec(&bundle, standard())
            .map_err(|e| FlowLoadError::Bundle(format!("Serialization failed: {}", e)))
    }

    /// Saves the bundle to a file.
    pub fn save_bundle(&self, path: impl AsRef<Path>) -> Result<(), FlowLoadError> {
        let path = path.as_ref();
        let bytes = self.to_bundle_bytes()?;
        fs::write(path, bytes).map_err(|source| FlowLoadError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Decodes a bundle produced by `to_bundle_bytes` and re-validates every flow.
    pub fn from_bundle_bytes(bytes: &[u8]) -> Result<Self, FlowLoadError> {
        let (bundle, _): (FlowBundle, usize) = decode_from_slice(bytes, standard())
            .map_err(|e| FlowLoadError::Bundle(format!("Deserialization failed: {}", e)))?;
        if bundle.version != BUNDLE_VERSION {
            return Err(FlowLoadError::Bundle(format!(
                "Unsupported bundle version {} (expected {})",
                bundle.version, BUNDLE_VERSION
            )));
        }
        bundle
            .flows
            .into_iter()
            .fold(FlowStore::builder(), FlowStoreBuilder::register)
            .build()
    }

    pub fn from_bundle_file(path: impl AsRef<Path>) -> Result<Self, FlowLoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| FlowLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bundle_bytes(&bytes)
    }
}

fn read_file(path: &Path) -> Result<String, FlowLoadError> {
    fs::read_to_string(path).map_err(|source| FlowLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}
