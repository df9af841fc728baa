//! Decoding of brand-specific model and serial identifiers.
//!
//! Decoders are total: malformed input yields a result with `valid: false`,
//! never an error.

use ahash::AHashMap;

mod heater;
pub mod info;

pub use heater::HeaterDecoder;
pub use info::*;

/// Defines the contract for decoding the identifiers of one equipment family.
pub trait EquipmentDecoder: Send + Sync {
    /// The family name, e.g. `"heater"`.
    fn family(&self) -> &str;
    fn decode_model(&self, model: &str) -> ModelInfo;
    fn decode_serial(&self, serial: &str) -> SerialInfo;
}

/// Decoders keyed by equipment type, with optional brand-specific overrides.
pub struct DecoderRegistry {
    decoders: AHashMap<String, Box<dyn EquipmentDecoder>>,
}

impl DecoderRegistry {
    /// A registry without any decoders.
    pub fn empty() -> Self {
        Self {
            decoders: AHashMap::new(),
        }
    }

    /// Registers `decoder` for every brand of `equipment_type`.
    pub fn with_decoder(mut self, equipment_type: &str, decoder: Box<dyn EquipmentDecoder>) -> Self {
        self.decoders.insert(normalize_key(equipment_type), decoder);
        self
    }

    /// Registers `decoder` for one brand only. Takes precedence over type-wide decoders.
    pub fn with_brand_decoder(
        mut self,
        brand: &str,
        equipment_type: &str,
        decoder: Box<dyn EquipmentDecoder>,
    ) -> Self {
        let key = format!("{}/{}", normalize_key(brand), normalize_key(equipment_type));
        self.decoders.insert(key, decoder);
        self
    }

    pub fn lookup(&self, brand: &str, equipment_type: &str) -> Option<&dyn EquipmentDecoder> {
        let equipment_key = normalize_key(equipment_type);
        let brand_key = format!("{}/{}", normalize_key(brand), equipment_key);
        self.decoders
            .get(&brand_key)
            .or_else(|| self.decoders.get(&equipment_key))
            .map(|decoder| decoder.as_ref())
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::empty().with_decoder("heater", Box::new(HeaterDecoder))
    }
}

/// Lower-cases and strips whitespace, the same normalization used for flow keys.
pub(crate) fn normalize_key(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
