use serde::{Deserialize, Serialize};
use std::fmt;

/// Fuel the burner is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GasType {
    Natural,
    Propane,
}

impl GasType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GasType::Natural => "Natural",
            GasType::Propane => "Propane",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ignition {
    Electronic,
    Millivolt,
}

impl Ignition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ignition::Electronic => "Electronic",
            Ignition::Millivolt => "Millivolt",
        }
    }
}

/// Heat exchanger tube material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchanger {
    Copper,
    #[serde(rename = "Cupro-Nickel")]
    CuproNickel,
}

impl Exchanger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchanger::Copper => "Copper",
            Exchanger::CuproNickel => "Cupro-Nickel",
        }
    }
}

/// Structured facts decoded from a model number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub btu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignition: Option<Ignition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_type: Option<GasType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchanger: Option<Exchanger>,
    #[serde(default)]
    pub versa_flo: bool,
    #[serde(default)]
    pub asme: bool,
}

impl ModelInfo {
    pub fn invalid() -> Self {
        Self::default()
    }
}

/// Which fixed serial layout a serial number matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SerialFormat {
    /// Short code with an embedded year and month.
    Legacy,
    /// Long code with an embedded plant, ISO week and year.
    Current,
}

/// Structured facts decoded from a serial number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialInfo {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SerialFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}

impl SerialInfo {
    pub fn invalid() -> Self {
        Self::default()
    }

    /// `YYYY-MM` for legacy serials, `YYYY-Www` for current ones.
    pub fn manufacture_date(&self) -> Option<String> {
        match (self.year, self.month, self.week) {
            (Some(year), Some(month), _) => Some(format!("{:04}-{:02}", year, month)),
            (Some(year), None, Some(week)) => Some(format!("{:04}-W{:02}", year, week)),
            _ => None,
        }
    }
}

/// Fields of the merged equipment record that routing conditions may inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentField {
    Brand,
    Model,
    Series,
    Revision,
    ManufactureDate,
    GasType,
    Btu,
    Exchanger,
    Ignition,
    VersaFlo,
    Asme,
}

impl EquipmentField {
    pub const ALL: [EquipmentField; 11] = [
        EquipmentField::Brand,
        EquipmentField::Model,
        EquipmentField::Series,
        EquipmentField::Revision,
        EquipmentField::ManufactureDate,
        EquipmentField::GasType,
        EquipmentField::Btu,
        EquipmentField::Exchanger,
        EquipmentField::Ignition,
        EquipmentField::VersaFlo,
        EquipmentField::Asme,
    ];

    /// The name used in flow conditions, e.g. `equipment.gasType`.
    pub fn name(&self) -> &'static str {
        match self {
            EquipmentField::Brand => "brand",
            EquipmentField::Model => "model",
            EquipmentField::Series => "series",
            EquipmentField::Revision => "revision",
            EquipmentField::ManufactureDate => "manufactureDate",
            EquipmentField::GasType => "gasType",
            EquipmentField::Btu => "btu",
            EquipmentField::Exchanger => "exchanger",
            EquipmentField::Ignition => "ignition",
            EquipmentField::VersaFlo => "versaFlo",
            EquipmentField::Asme => "asme",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for EquipmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The unified equipment record built from the flow's brand and decoded identifiers.
///
/// Field ownership is strict: model-sourced fields only ever come from a
/// [`ModelInfo`], serial-sourced fields only from a [`SerialInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentInfo {
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacture_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_type: Option<GasType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub btu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchanger: Option<Exchanger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignition: Option<Ignition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versa_flo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asme: Option<bool>,
}

impl EquipmentInfo {
    /// Merges the valid parts of the decoded identifiers into one record.
    pub fn merge(brand: &str, model: Option<&ModelInfo>, serial: Option<&SerialInfo>) -> Self {
        let mut info = EquipmentInfo {
            brand: brand.to_string(),
            ..Default::default()
        };

        if let Some(model) = model.filter(|m| m.valid) {
            info.model = model.model.clone();
            info.series = model.series.clone();
            info.btu = model.btu;
            info.gas_type = model.gas_type;
            info.ignition = model.ignition;
            info.exchanger = model.exchanger;
            info.versa_flo = Some(model.versa_flo);
            info.asme = Some(model.asme);
        }

        if let Some(serial) = serial.filter(|s| s.valid) {
            info.revision = serial.revision.clone();
            info.manufacture_date = serial.manufacture_date();
        }

        info
    }

    /// Renders a field the way conditions compare it. `None` means the field is absent.
    pub fn field(&self, field: EquipmentField) -> Option<String> {
        match field {
            EquipmentField::Brand => Some(self.brand.clone()).filter(|b| !b.is_empty()),
            EquipmentField::Model => self.model.clone(),
            EquipmentField::Series => self.series.clone(),
            EquipmentField::Revision => self.revision.clone(),
            EquipmentField::ManufactureDate => self.manufacture_date.clone(),
            EquipmentField::GasType => self.gas_type.map(|g| g.as_str().to_string()),
            EquipmentField::Btu => self.btu.map(|b| b.to_string()),
            EquipmentField::Exchanger => self.exchanger.map(|e| e.as_str().to_string()),
            EquipmentField::Ignition => self.ignition.map(|i| i.as_str().to_string()),
            EquipmentField::VersaFlo => self.versa_flo.map(|v| v.to_string()),
            EquipmentField::Asme => self.asme.map(|v| v.to_string()),
        }
    }
}
