//! Flatten and export tests.

mod common;

use common::Fixture;
use serde_json::{json, Map, Value};
use slicer_presets::flatten::{refresh_name, DEFAULT_EXPORT_VERSION, IDENTITY_KEYS};
use slicer_presets::{
    export_batch, flatten, flatten_batch, BatchSummary, ConfigLocation, ConfigType, DirectorySink,
    ExportSink, FlattenedPreset, PresetError,
};
use std::path::PathBuf;

fn without_identity_keys(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| !IDENTITY_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn filament_chain(fx: &Fixture) {
    fx.vendor(
        ConfigLocation::System,
        "OrcaFilamentLibrary",
        &[(
            ConfigType::Filament,
            json!({
                "name": "Generic PLA @base",
                "filament_type": ["PLA"],
                "nozzle_temperature": ["210"],
                "compatible_printers": ["Bambu Lab X1 Carbon 0.4 nozzle"],
                "version": "2.0.0.10"
            }),
        )],
    );
    fx.user_preset(
        ConfigType::Filament,
        "mine",
        json!({
            "name": "My PLA",
            "inherits": "Generic PLA @base",
            "nozzle_temperature": ["215"],
            "version": ""
        }),
    );
}

// =============================================================================
// Single preset
// =============================================================================

#[test]
fn test_flatten_root_only_keeps_properties() {
    let fx = Fixture::new();
    let record = json!({
        "name": "Lone Process",
        "layer_height": "0.28",
        "wall_loops": "2",
        "vendor_extra": {"x": 1},
        "version": "1.9.0.0"
    });
    fx.user_preset(ConfigType::Process, "lone", record.clone());

    let flat = flatten(&fx.resolver, &fx.user(ConfigType::Process, "Lone Process")).unwrap();
    assert_eq!(
        without_identity_keys(&flat.properties),
        without_identity_keys(record.as_object().unwrap())
    );
    assert_eq!(flat.properties["version"], json!("1.9.0.0"));
}

#[test]
fn test_flatten_chain_is_self_contained() {
    let fx = Fixture::new();
    filament_chain(&fx);

    let flat = flatten(&fx.resolver, &fx.user(ConfigType::Filament, "My PLA")).unwrap();
    let props = &flat.properties;

    assert!(!props.contains_key("inherits"));
    assert_eq!(props["filament_type"], json!(["PLA"]));
    assert_eq!(props["nozzle_temperature"], json!(["215"]));
    assert_eq!(props["compatible_printers"], json!([]));
    assert_eq!(props["from"], json!("User"));
    // empty leaf version is overridden rather than inherited
    assert_eq!(props["version"], json!(DEFAULT_EXPORT_VERSION));

    let name = flat.name().to_string();
    assert!(name.starts_with("My PLA_"));
    assert_eq!(props["filament_settings_id"], json!([name.clone()]));
    assert_eq!(
        flat.suggested_file_name,
        format!("Filament presets_{}.zip", name)
    );
}

#[test]
fn test_flatten_process_sets_print_settings_id() {
    let fx = Fixture::new();
    fx.user_preset(ConfigType::Process, "p", json!({"name": "Fast", "layer_height": "0.3"}));

    let flat = flatten(&fx.resolver, &fx.user(ConfigType::Process, "Fast")).unwrap();
    assert_eq!(flat.properties["print_settings_id"], json!([flat.name()]));
    assert!(!flat.properties.contains_key("filament_settings_id"));
    assert_eq!(flat.properties["compatible_printers"], json!([]));
}

#[test]
fn test_flatten_printer_clears_compatible_printers() {
    let fx = Fixture::new();
    fx.vendor(
        ConfigLocation::System,
        "Voron",
        &[(
            ConfigType::Printer,
            json!({
                "name": "Voron 2.4 350",
                "printer_model": "Voron 2.4",
                "printer_variant": "0.4",
                "compatible_printers": ["Voron 2.4 300"]
            }),
        )],
    );
    fx.user_preset(
        ConfigType::Printer,
        "mine",
        json!({"name": "My Voron", "inherits": "Voron 2.4 350", "nozzle_diameter": ["0.6"]}),
    );

    let flat = flatten(&fx.resolver, &fx.user(ConfigType::Printer, "My Voron")).unwrap();
    let props = &flat.properties;

    assert!(!props.contains_key("inherits"));
    assert_eq!(props["compatible_printers"], json!([]));
    assert_eq!(props["printer_model"], json!("Voron 2.4"));
    assert_eq!(props["nozzle_diameter"], json!(["0.6"]));
    assert!(!props.contains_key("filament_settings_id"));
    assert!(!props.contains_key("print_settings_id"));
    assert!(flat.suggested_file_name.starts_with("Printer presets_My Voron_"));
}

#[test]
fn test_flatten_twice_keeps_one_uuid_suffix() {
    let once = refresh_name("My PLA");
    let twice = refresh_name(&once);
    assert_ne!(once, twice);
    assert_eq!(twice.matches('_').count(), 1);
    assert!(twice.starts_with("My PLA_"));
}

// =============================================================================
// Batches
// =============================================================================

#[test]
fn test_flatten_batch_reports_each_item() {
    let fx = Fixture::new();
    filament_chain(&fx);
    fx.user_preset(
        ConfigType::Filament,
        "orphan",
        json!({"name": "Orphan PLA", "inherits": "Nowhere PLA"}),
    );

    let ids = vec![
        fx.user(ConfigType::Filament, "My PLA"),
        fx.user(ConfigType::Filament, "Orphan PLA"),
    ];
    let items = flatten_batch(&fx.resolver, &ids);
    assert_eq!(
        BatchSummary::of(&items),
        BatchSummary {
            total: 2,
            succeeded: 1,
            failed: 1
        }
    );
    assert_eq!(items[1].outcome.as_ref().unwrap_err().code(), "MISSING_PARENT");
}

#[test]
fn test_directory_sink_writes_flattened_records() {
    let fx = Fixture::new();
    filament_chain(&fx);
    let out = fx.dir.path().join("export");

    let ids = vec![fx.user(ConfigType::Filament, "My PLA")];
    let mut sink = DirectorySink::new(fx.store.clone(), &out);
    let items = export_batch(&fx.resolver, &ids, &mut sink);

    let path = items[0].outcome.as_ref().unwrap();
    assert!(path.starts_with(&out));
    let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(written["from"], json!("User"));
    assert!(written.get("inherits").is_none());
}

struct FailingSink {
    seen: Vec<String>,
}

impl ExportSink for FailingSink {
    fn export(&mut self, preset: &FlattenedPreset) -> Result<PathBuf, PresetError> {
        self.seen.push(preset.name().to_string());
        Err(PresetError::Write {
            path: PathBuf::from("/archive"),
            message: "archive full".to_string(),
        })
    }
}

#[test]
fn test_sink_failure_is_per_item() {
    let fx = Fixture::new();
    fx.user_preset(ConfigType::Process, "a", json!({"name": "A"}));
    fx.user_preset(ConfigType::Process, "b", json!({"name": "B"}));

    let ids = vec![
        fx.user(ConfigType::Process, "A"),
        fx.user(ConfigType::Process, "B"),
    ];
    let mut sink = FailingSink { seen: Vec::new() };
    let items = export_batch(&fx.resolver, &ids, &mut sink);

    assert_eq!(sink.seen.len(), 2);
    assert!(items.iter().all(|i| i.outcome.as_ref().unwrap_err().code() == "WRITE"));
}
