//! Unit tests for small public pieces: error messages, answers and decoders.
use diagflow::decoder::{EquipmentField, EquipmentInfo, ModelInfo, SerialInfo};
use diagflow::prelude::*;

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_load_error_messages_name_the_offender() {
        let err = FlowLoadError::DanglingReference {
            flow_id: "heater-no-power".to_string(),
            source_node_id: "s4".to_string(),
            field: "fail".to_string(),
            missing_node_id: "s99".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Node 's99' not found in flow 'heater-no-power', which is required by 'fail' of node 's4'"
        );

        let err = FlowLoadError::MissingStart {
            flow_id: "f".to_string(),
            start: "s0".to_string(),
        };
        assert_eq!(err.to_string(), "Start node 's0' not found in flow 'f'");
    }

    #[test]
    fn test_condition_parse_error_is_a_std_error() {
        let err = Condition::parse("equipment.colour == 'red'").unwrap_err();
        assert_eq!(err, ConditionParseError("unknown equipment field 'colour'".to_string()));

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert_eq!(boxed.to_string(), "unknown equipment field 'colour'");
    }

    #[test]
    fn test_response_error_messages() {
        let err = ResponseError::MalformedFlow {
            flow_id: "f".to_string(),
            node_id: "s4".to_string(),
            target: "ghost".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Node 's4' points to 'ghost', which does not exist in flow 'f'"
        );
    }
}

#[cfg(test)]
mod answer_tests {
    use super::*;

    #[test]
    fn test_answer_text_rendering() {
        assert_eq!(Answer::Number(118.0).as_text(), "118");
        assert_eq!(Answer::Number(0.25).to_string(), "0.25");
        assert_eq!(Answer::Text("Yes".to_string()).as_text(), "Yes");
    }

    #[test]
    fn test_answers_round_trip_through_json() {
        let mut answers = Answers::new();
        answers.record("s1", Answer::Number(118.0));
        answers.record("s2", Answer::Text("Yes".to_string()));

        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, r#"{"s1":118.0,"s2":"Yes"}"#);
        let back: Answers = serde_json::from_str(&json).unwrap();
        assert_eq!(back, answers);
    }
}

#[cfg(test)]
mod equipment_tests {
    use super::*;

    #[test]
    fn test_merge_only_uses_valid_sources() {
        let model = HeaterDecoder.decode_model("P-R406A-EN-C");
        let serial = SerialInfo::invalid();
        let info = EquipmentInfo::merge("Acme", Some(&model), Some(&serial));

        assert_eq!(info.field(EquipmentField::Brand).as_deref(), Some("Acme"));
        assert_eq!(info.field(EquipmentField::Btu).as_deref(), Some("406000"));
        assert_eq!(info.field(EquipmentField::GasType).as_deref(), Some("Natural"));
        assert_eq!(info.field(EquipmentField::Exchanger).as_deref(), Some("Cupro-Nickel"));
        assert_eq!(info.field(EquipmentField::VersaFlo).as_deref(), Some("false"));
        assert_eq!(info.field(EquipmentField::Revision), None);

        let info = EquipmentInfo::merge("Acme", Some(&ModelInfo::invalid()), None);
        assert_eq!(info.field(EquipmentField::Model), None);
        assert_eq!(info.field(EquipmentField::Asme), None);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = DecoderRegistry::default();
        let decoder = registry.lookup("Acme", " Heater ").unwrap();
        assert_eq!(decoder.family(), "heater");
        assert!(registry.lookup("Acme", "Pump").is_none());
    }
}
