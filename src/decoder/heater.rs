use super::EquipmentDecoder;
use super::info::{Exchanger, GasType, Ignition, ModelInfo, SerialFormat, SerialInfo};
use once_cell::sync::Lazy;
use regex::Regex;

static MODEL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^P-?R").unwrap());
static MODEL_BTU: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{3})").unwrap());
static MODEL_SERIES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3}([A-Z])").unwrap());
static MODEL_IGNITION_GAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3}[A-Z]?-?([EM])([NP])(?:-|$)").unwrap());

static SERIAL_LEGACY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})(\d{2})([A-Z])(\d{4})$").unwrap());
static SERIAL_CURRENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2})(\d{2})(\d{2})([A-Z])(\d{6})$").unwrap());

/// Decoder for the gas pool heater family.
///
/// Model numbers look like `P-R406A-EN-C-VF-50`: a `P-R` prefix, a three digit
/// BTU rating in thousands, a series letter, an ignition/gas segment and
/// optional flags (`C` cupro-nickel exchanger, `VF` VersaFlo valve, `50`/`ASME`
/// certified exchanger).
///
/// Serial numbers come in two layouts: legacy `YYMM` + revision + 4 digits,
/// and current plant code + ISO `WWYY` + revision + 6 digits.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaterDecoder;

impl EquipmentDecoder for HeaterDecoder {
    fn family(&self) -> &str {
        "heater"
    }

    fn decode_model(&self, model: &str) -> ModelInfo {
        let normalized = normalize(model);
        let Some(prefix) = MODEL_PREFIX.find(&normalized) else {
            return ModelInfo::invalid();
        };
        let rest = &normalized[prefix.end()..];

        let mut info = ModelInfo {
            valid: true,
            model: Some(normalized.clone()),
            exchanger: Some(Exchanger::Copper),
            ..Default::default()
        };

        if let Some(caps) = MODEL_BTU.captures(rest) {
            info.btu = caps[1].parse::<u32>().ok().map(|thousands| thousands * 1000);
        }
        if let Some(caps) = MODEL_SERIES.captures(rest) {
            info.series = Some(caps[1].to_string());
        }
        if let Some(caps) = MODEL_IGNITION_GAS.captures(rest) {
            info.ignition = match &caps[1] {
                "E" => Some(Ignition::Electronic),
                "M" => Some(Ignition::Millivolt),
                _ => None,
            };
            info.gas_type = match &caps[2] {
                "N" => Some(GasType::Natural),
                "P" => Some(GasType::Propane),
                _ => None,
            };
        }

        // The first segment is the rating block, the rest are flags.
        for flag in rest.split('-').skip(1) {
            match flag.trim_start_matches('#') {
                "C" => info.exchanger = Some(Exchanger::CuproNickel),
                "VF" => info.versa_flo = true,
                "50" | "ASME" => info.asme = true,
                _ => {}
            }
        }

        info
    }

    fn decode_serial(&self, serial: &str) -> SerialInfo {
        let normalized: String = normalize(serial).chars().filter(|c| *c != '-').collect();

        if let Some(caps) = SERIAL_LEGACY.captures(&normalized) {
            let year = caps[1].parse::<u16>().ok();
            let month = caps[2].parse::<u8>().ok().filter(|m| (1..=12).contains(m));
            if let (Some(year), Some(month)) = (year, month) {
                return SerialInfo {
                    valid: true,
                    serial: Some(normalized.clone()),
                    format: Some(SerialFormat::Legacy),
                    plant: None,
                    year: Some(2000 + year),
                    month: Some(month),
                    week: None,
                    revision: Some(caps[3].to_string()),
                    sequence: Some(caps[4].to_string()),
                };
            }
        }

        if let Some(caps) = SERIAL_CURRENT.captures(&normalized) {
            let week = caps[2].parse::<u8>().ok().filter(|w| (1..=53).contains(w));
            let year = caps[3].parse::<u16>().ok();
            if let (Some(week), Some(year)) = (week, year) {
                return SerialInfo {
                    valid: true,
                    serial: Some(normalized.clone()),
                    format: Some(SerialFormat::Current),
                    plant: Some(caps[1].to_string()),
                    year: Some(2000 + year),
                    month: None,
                    week: Some(week),
                    revision: Some(caps[4].to_string()),
                    sequence: Some(caps[5].to_string()),
                };
            }
        }

        SerialInfo::invalid()
    }
}

/// Upper-cases and strips all whitespace.
fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_model_number() {
        let info = HeaterDecoder.decode_model("p-r406a-en-c-vf-50");
        assert!(info.valid);
        assert_eq!(info.model.as_deref(), Some("P-R406A-EN-C-VF-50"));
        assert_eq!(info.btu, Some(406_000));
        assert_eq!(info.series.as_deref(), Some("A"));
        assert_eq!(info.ignition, Some(Ignition::Electronic));
        assert_eq!(info.gas_type, Some(GasType::Natural));
        assert_eq!(info.exchanger, Some(Exchanger::CuproNickel));
        assert!(info.versa_flo);
        assert!(info.asme);
    }

    #[test]
    fn decodes_unhyphenated_model_number() {
        let info = HeaterDecoder.decode_model("PR266AMP");
        assert!(info.valid);
        assert_eq!(info.btu, Some(266_000));
        assert_eq!(info.ignition, Some(Ignition::Millivolt));
        assert_eq!(info.gas_type, Some(GasType::Propane));
        assert_eq!(info.exchanger, Some(Exchanger::Copper));
        assert!(!info.versa_flo);
    }

    #[test]
    fn valid_prefix_with_missing_parts_is_still_valid() {
        let info = HeaterDecoder.decode_model("P-R");
        assert!(info.valid);
        assert_eq!(info.btu, None);
        assert_eq!(info.gas_type, None);
    }

    #[test]
    fn wrong_prefix_is_invalid() {
        assert!(!HeaterDecoder.decode_model("X-R406A-EN").valid);
        assert!(!HeaterDecoder.decode_model("").valid);
        assert!(!HeaterDecoder.decode_model("406A").valid);
    }

    #[test]
    fn decodes_legacy_serial() {
        let info = HeaterDecoder.decode_serial(" 0907g1234 ");
        assert!(info.valid);
        assert_eq!(info.format, Some(SerialFormat::Legacy));
        assert_eq!(info.year, Some(2009));
        assert_eq!(info.month, Some(7));
        assert_eq!(info.revision.as_deref(), Some("G"));
        assert_eq!(info.manufacture_date().as_deref(), Some("2009-07"));
    }

    #[test]
    fn decodes_current_serial() {
        let info = HeaterDecoder.decode_serial("KY1521H000123");
        assert!(info.valid);
        assert_eq!(info.format, Some(SerialFormat::Current));
        assert_eq!(info.plant.as_deref(), Some("KY"));
        assert_eq!(info.week, Some(15));
        assert_eq!(info.year, Some(2021));
        assert_eq!(info.revision.as_deref(), Some("H"));
        assert_eq!(info.manufacture_date().as_deref(), Some("2021-W15"));
    }

    #[test]
    fn rejects_out_of_range_serial_dates() {
        assert!(!HeaterDecoder.decode_serial("0913G1234").valid);
        assert!(!HeaterDecoder.decode_serial("KY5421H000123").valid);
        assert!(!HeaterDecoder.decode_serial("not a serial").valid);
    }

    #[test]
    fn decoded_identifiers_decode_again_identically() {
        for raw in ["p-r406a-en-c-vf-50", "PR266AMP", "P-R", "p r 400 a - e n - #asme"] {
            let info = HeaterDecoder.decode_model(raw);
            assert!(info.valid, "'{}' should decode", raw);
            let again = HeaterDecoder.decode_model(info.model.as_deref().unwrap());
            assert_eq!(again, info, "'{}' changed on a second pass", raw);
        }

        for raw in [" 0907g1234 ", "ky-1521-h-000123"] {
            let info = HeaterDecoder.decode_serial(raw);
            assert!(info.valid, "'{}' should decode", raw);
            let again = HeaterDecoder.decode_serial(info.serial.as_deref().unwrap());
            assert_eq!(again, info, "'{}' changed on a second pass", raw);
        }
    }
}
