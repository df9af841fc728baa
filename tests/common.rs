//! Common test fixtures: flow documents and session helpers.
use diagflow::prelude::*;

/// Supply voltage check.
///
/// `s1` (number, 110-126 VAC) -> `s2` (choice) -> `s4` (yes/no) -> terminal.
/// Out of range goes to `fix_power`.
#[allow(dead_code)]
pub const POWER_FLOW_JSON: &str = r#"{
    "id": "heater-no-power",
    "brand": "Acme",
    "equipmentType": "Heater",
    "model": "Digital",
    "title": "Heater has no power",
    "start": "s1",
    "nodes": {
        "s1": {
            "text": "Measure the supply voltage at the terminal block",
            "input": "number",
            "unit": "VAC",
            "range": [110, 126],
            "pass": "s2",
            "fail": "fix_power"
        },
        "s2": {
            "text": "Is the display lit?",
            "input": "choice",
            "choices": { "Yes": "s4", "No": "repair" }
        },
        "s4": {
            "text": "Does the heater fire when calling for heat?",
            "input": "yesno",
            "pass": "done",
            "fail": "repair"
        },
        "fix_power": {
            "text": "Restore the supply before continuing",
            "input": "info",
            "terminal": true,
            "success": false
        },
        "repair": {
            "text": "Replace the control board",
            "input": "info",
            "terminal": true
        },
        "done": {
            "text": "Heater operates normally",
            "input": "info",
            "terminal": true,
            "success": true,
            "media": { "image": "done.png" }
        }
    }
}"#;

/// Serial decode followed by an auto-routed revision split.
#[allow(dead_code)]
pub const REVISION_FLOW_JSON: &str = r#"{
    "id": "heater-ignition",
    "brand": "Acme",
    "equipmentType": "Heater",
    "model": "Millivolt",
    "title": "Heater will not ignite",
    "start": "serial",
    "nodes": {
        "serial": {
            "text": "Enter the serial number from the rating plate",
            "input": "text",
            "decode": "serial",
            "default": "revision_check"
        },
        "revision_check": {
            "text": "Checking board revision",
            "logic": [
                { "if": "equipment.revision == 'G'", "goto": "rev_g" },
                { "if": "equipment.revision == 'H'", "goto": "rev_h" }
            ],
            "default": "unknown_rev"
        },
        "rev_g": {
            "text": "Rev G board: check the pressure switch",
            "input": "yesno",
            "pass": "ok",
            "fail": "replace_switch"
        },
        "rev_h": {
            "text": "Rev H board: check the flame sensor",
            "input": "yesno",
            "pass": "ok",
            "fail": "replace_sensor"
        },
        "unknown_rev": { "text": "Serial not recognized, call support", "input": "info", "terminal": true },
        "replace_switch": { "text": "Replace the pressure switch", "input": "info", "terminal": true },
        "replace_sensor": { "text": "Replace the flame sensor", "input": "info", "terminal": true },
        "ok": { "text": "Heater ignites", "input": "info", "terminal": true, "success": true }
    }
}"#;

/// Free-text value rules, and an auto-routed start node.
#[allow(dead_code)]
pub const CODE_FLOW_JSON: &str = r#"{
    "id": "heater-codes",
    "brand": "Acme",
    "equipmentType": "Heater",
    "model": "Error Codes",
    "start": "intro",
    "nodes": {
        "intro": {
            "text": "Routing",
            "input": "info",
            "logic": [ { "if": "value.startsWith('x')", "goto": "unused" } ],
            "default": "code"
        },
        "code": {
            "text": "Which code is on the display?",
            "input": "text",
            "logic": [
                { "if": "value.startsWith('IO')", "goto": "io_fault" },
                { "if": "value.includes('HLS')", "goto": "high_limit" }
            ],
            "default": "other"
        },
        "io_fault": { "text": "Check the ignition module", "input": "info", "pass": "finish" },
        "high_limit": { "text": "Check the high limit switch", "input": "info", "terminal": true },
        "other": { "text": "Consult the manual", "input": "info", "terminal": true },
        "unused": { "text": "Never reached", "input": "info", "terminal": true },
        "finish": { "text": "Done", "input": "info", "terminal": true, "success": true }
    }
}"#;

#[allow(dead_code)]
pub fn flow(json: &str) -> Arc<FlowDefinition> {
    Arc::new(FlowDefinition::from_json(json).expect("fixture flow should load"))
}

#[allow(dead_code)]
pub fn session(json: &str) -> Session {
    Session::builder(flow(json))
        .build()
        .expect("fixture session should start")
}

/// Replaces one node's raw JSON object inside a fixture document.
#[allow(dead_code)]
pub fn with_node(json: &str, node_id: &str, node_json: &str) -> String {
    let mut doc: serde_json::Value = serde_json::from_str(json).expect("fixture is valid JSON");
    doc["nodes"][node_id] = serde_json::from_str(node_json).expect("node is valid JSON");
    doc.to_string()
}
