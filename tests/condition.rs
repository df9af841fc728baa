//! Condition grammar and evaluation tests.
use diagflow::condition::{Comparison, Route, RouteSource, Rule, route};
use diagflow::decoder::{EquipmentField, EquipmentInfo, GasType};
use diagflow::prelude::*;

fn rev_g_equipment() -> EquipmentInfo {
    EquipmentInfo {
        brand: "Acme".to_string(),
        model: Some("P-R406A-EN-C".to_string()),
        revision: Some("G".to_string()),
        gas_type: Some(GasType::Natural),
        ..Default::default()
    }
}

fn rule(condition: &str, goto: &str) -> Rule {
    Rule {
        condition: Condition::parse(condition).unwrap(),
        goto: goto.to_string(),
    }
}

#[cfg(test)]
mod grammar_tests {
    use super::*;

    #[test]
    fn test_parses_every_supported_shape() {
        assert_eq!(
            Condition::parse("equipment.revision == 'G'").unwrap(),
            Condition::FieldEquals {
                field: EquipmentField::Revision,
                literal: "G".to_string()
            }
        );
        assert_eq!(
            Condition::parse(r#"equipment.model.includes("406")"#).unwrap(),
            Condition::FieldContains {
                field: EquipmentField::Model,
                literal: "406".to_string()
            }
        );
        assert_eq!(
            Condition::parse("value.startsWith('IO')").unwrap(),
            Condition::ValueStartsWith("IO".to_string())
        );
        assert_eq!(
            Condition::parse("value.includes('HLS')").unwrap(),
            Condition::ValueContains("HLS".to_string())
        );
        assert_eq!(
            Condition::parse("value >= 110").unwrap(),
            Condition::ValueCompare {
                op: Comparison::GreaterThanOrEqual,
                operand: 110.0
            }
        );
        assert_eq!(
            Condition::parse("value<-2.5").unwrap(),
            Condition::ValueCompare {
                op: Comparison::SmallerThan,
                operand: -2.5
            }
        );
    }

    #[test]
    fn test_strict_equality_is_accepted() {
        assert_eq!(
            Condition::parse("equipment.gasType === 'Natural'").unwrap(),
            Condition::FieldEquals {
                field: EquipmentField::GasType,
                literal: "Natural".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_anything_outside_the_grammar() {
        for source in [
            "",
            "true",
            "value > 1 && value < 5",
            "equipment.revision != 'G'",
            "equipment.colour == 'red'",
            "value.endsWith('x')",
            "value > 'abc'",
            "process.exit()",
            "equipment.revision == G",
        ] {
            assert!(Condition::parse(source).is_err(), "accepted '{}'", source);
        }
    }

    #[test]
    fn test_display_is_canonical_and_reparses() {
        for source in [
            "equipment.revision == 'G'",
            "equipment.model.includes('406')",
            "value.startsWith('IO')",
            "value.includes(\"it's\")",
            "value > 12.5",
        ] {
            let condition = Condition::parse(source).unwrap();
            assert_eq!(condition.to_string(), source);
            assert_eq!(Condition::parse(&condition.to_string()).unwrap(), condition);
        }
    }
}

#[cfg(test)]
mod evaluation_tests {
    use super::*;

    #[test]
    fn test_equipment_field_conditions() {
        let equipment = rev_g_equipment();
        let ctx = ConditionContext::new(Some(&equipment), None);

        assert!(Condition::parse("equipment.revision == 'G'").unwrap().evaluate(&ctx));
        assert!(!Condition::parse("equipment.revision == 'H'").unwrap().evaluate(&ctx));
        assert!(Condition::parse("equipment.model.includes('406')").unwrap().evaluate(&ctx));
        assert!(Condition::parse("equipment.gasType == 'Natural'").unwrap().evaluate(&ctx));
        assert!(Condition::parse("equipment.brand == 'Acme'").unwrap().evaluate(&ctx));
    }

    #[test]
    fn test_absent_data_never_matches() {
        let equipment = rev_g_equipment();
        let without_equipment = ConditionContext::new(None, Some("G"));
        let without_field = ConditionContext::new(Some(&equipment), None);

        assert!(!Condition::parse("equipment.revision == 'G'").unwrap().evaluate(&without_equipment));
        assert!(!Condition::parse("equipment.series == ''").unwrap().evaluate(&without_field));
        assert!(!Condition::parse("value.startsWith('')").unwrap().evaluate(&without_field));
        assert!(!Condition::parse("value > 0").unwrap().evaluate(&without_field));
    }

    #[test]
    fn test_value_conditions() {
        let ctx = ConditionContext::new(None, Some("IO-HLS"));
        assert!(Condition::parse("value.startsWith('IO')").unwrap().evaluate(&ctx));
        assert!(!Condition::parse("value.startsWith('io')").unwrap().evaluate(&ctx));
        assert!(Condition::parse("value.includes('HLS')").unwrap().evaluate(&ctx));
    }

    #[test]
    fn test_numeric_comparisons() {
        let ctx = ConditionContext::new(None, Some(" 118 "));
        assert!(Condition::parse("value >= 110").unwrap().evaluate(&ctx));
        assert!(Condition::parse("value <= 118").unwrap().evaluate(&ctx));
        assert!(Condition::parse("value == 118").unwrap().evaluate(&ctx));
        assert!(Condition::parse("value > 117.9").unwrap().evaluate(&ctx));
        assert!(!Condition::parse("value < 118").unwrap().evaluate(&ctx));

        let not_a_number = ConditionContext::new(None, Some("abc"));
        assert!(!Condition::parse("value < 1000").unwrap().evaluate(&not_a_number));
        assert!(!Condition::parse("value >= 0").unwrap().evaluate(&not_a_number));
    }

    #[test]
    fn test_explain_shows_the_inspected_value() {
        let equipment = rev_g_equipment();
        let ctx = ConditionContext::new(Some(&equipment), Some("118"));

        assert_eq!(
            Condition::parse("value >= 110").unwrap().explain(&ctx),
            "$value (was 118) >= 110"
        );
        assert_eq!(
            Condition::parse("equipment.revision == 'G'").unwrap().explain(&ctx),
            "$equipment.revision (was G) == 'G'"
        );
    }
}

#[cfg(test)]
mod routing_tests {
    use super::*;

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            rule("value > 100", "high"),
            rule("value > 50", "medium"),
            rule("value >= 0", "low"),
        ];
        let ctx = ConditionContext::new(None, Some("120"));

        let found = route(&rules, Some("fallback"), &ctx).unwrap();
        assert_eq!(found.target, "high");
        assert!(matches!(found.source, RouteSource::Rule { index: 0, .. }));

        let ctx = ConditionContext::new(None, Some("75"));
        assert_eq!(route(&rules, None, &ctx).unwrap().target, "medium");
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let rules = vec![rule("value.startsWith('E')", "error")];
        let ctx = ConditionContext::new(None, Some("OK"));

        assert_eq!(
            route(&rules, Some("fallback"), &ctx),
            Some(Route {
                target: "fallback",
                source: RouteSource::Default
            })
        );
        assert_eq!(route(&rules, None, &ctx), None);
        assert_eq!(route(&[], None, &ctx), None);
    }
}
