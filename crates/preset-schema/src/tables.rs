//! Built-in property tables, one per preset type.

use once_cell::sync::Lazy;
use serde_json::json;

use crate::entry::{ReferenceCategory, SchemaEntry, Severity, ValidationRule};
use crate::kind::ValueKind;
use crate::{ConfigType, Schema};

static VENDOR: Lazy<Schema> = Lazy::new(|| Schema::new(ConfigType::Vendor, vendor_entries()));
static PRINTER_MODEL: Lazy<Schema> =
    Lazy::new(|| Schema::new(ConfigType::PrinterModel, printer_model_entries()));
static PRINTER: Lazy<Schema> = Lazy::new(|| Schema::new(ConfigType::Printer, printer_entries()));
static FILAMENT: Lazy<Schema> = Lazy::new(|| Schema::new(ConfigType::Filament, filament_entries()));
static PROCESS: Lazy<Schema> = Lazy::new(|| Schema::new(ConfigType::Process, process_entries()));

/// The property table for a preset type.
pub fn schema_for(config_type: ConfigType) -> &'static Schema {
    match config_type {
        ConfigType::Vendor => &*VENDOR,
        ConfigType::PrinterModel => &*PRINTER_MODEL,
        ConfigType::Printer => &*PRINTER,
        ConfigType::Filament => &*FILAMENT,
        ConfigType::Process => &*PROCESS,
    }
}

fn rule(pattern: &str, message: &'static str) -> ValidationRule {
    ValidationRule::new(pattern, message, Severity::Error).expect("built-in schema pattern must compile")
}

fn name_entry() -> SchemaEntry {
    SchemaEntry::scalar("name", ValueKind::String)
        .required(true, true)
        .validated(rule(
            r"^[^<>\[\]:\\/|?*]+$",
            "Name cannot contain these characters <>[]/:|?*",
        ))
}

fn version_entry(in_installed: bool, in_user: bool) -> SchemaEntry {
    SchemaEntry::scalar("version", ValueKind::String)
        .required(in_installed, in_user)
        .validated(rule(
            r"^(?:[^.]*\.){1,3}[^.]*$",
            "Version does not meet the required pattern: A.B.C.D",
        ))
}

/// Entries shared by printer, filament and process presets.
fn inheritable_entries(own_type: ReferenceCategory) -> Vec<SchemaEntry> {
    vec![
        name_entry(),
        version_entry(false, false),
        SchemaEntry::scalar("type", ValueKind::String),
        SchemaEntry::scalar("inherits", ValueKind::String).references(own_type),
        SchemaEntry::scalar("from", ValueKind::Enum).choices(&["system", "User"]),
        SchemaEntry::scalar("instantiation", ValueKind::Bool).default_value(json!("true")),
        SchemaEntry::scalar("setting_id", ValueKind::String).required(true, false),
    ]
}

fn vendor_entries() -> Vec<SchemaEntry> {
    vec![
        name_entry(),
        version_entry(true, true),
        SchemaEntry::scalar("description", ValueKind::String),
        SchemaEntry::scalar("force_update", ValueKind::Bool).default_value(json!(true)),
        SchemaEntry::vector("machine_model_list", ValueKind::NameAndSubpath)
            .references(ReferenceCategory::PrinterModel),
        SchemaEntry::vector("machine_list", ValueKind::NameAndSubpath)
            .references(ReferenceCategory::Printer),
        SchemaEntry::vector("filament_list", ValueKind::NameAndSubpath)
            .references(ReferenceCategory::Filament),
        SchemaEntry::vector("process_list", ValueKind::NameAndSubpath)
            .references(ReferenceCategory::Process),
    ]
}

fn printer_model_entries() -> Vec<SchemaEntry> {
    vec![
        name_entry(),
        version_entry(false, true),
        SchemaEntry::scalar("type", ValueKind::String).required(true, true),
        SchemaEntry::scalar("url", ValueKind::String),
        SchemaEntry::scalar("model_id", ValueKind::String),
        SchemaEntry::vector("nozzle_diameter", ValueKind::Float)
            .delimited(";")
            .required(true, true),
        SchemaEntry::scalar("family", ValueKind::String),
        SchemaEntry::scalar("machine_tech", ValueKind::Enum)
            .choices(&["FFF"])
            .default_value(json!("FFF")),
        SchemaEntry::scalar("bed_model", ValueKind::String).references(ReferenceCategory::StlFile),
        SchemaEntry::scalar("bed_texture", ValueKind::String).references(ReferenceCategory::SvgFile),
        SchemaEntry::scalar("hotend_model", ValueKind::String)
            .references(ReferenceCategory::StlFile),
        SchemaEntry::vector("default_materials", ValueKind::String)
            .delimited(";")
            .references(ReferenceCategory::Filament),
    ]
}

fn printer_entries() -> Vec<SchemaEntry> {
    let mut entries = inheritable_entries(ReferenceCategory::Printer);
    entries.extend([
        SchemaEntry::scalar("printer_model", ValueKind::String)
            .required(true, true)
            .references(ReferenceCategory::PrinterModel),
        SchemaEntry::scalar("printer_variant", ValueKind::String).required(true, true),
        SchemaEntry::vector("printer_settings_id", ValueKind::String),
        SchemaEntry::scalar("printer_technology", ValueKind::Enum)
            .choices(&["FFF", "SLA"])
            .default_value(json!("FFF")),
        SchemaEntry::scalar("gcode_flavor", ValueKind::Enum).choices(&[
            "marlin",
            "marlin2",
            "klipper",
            "reprapfirmware",
            "smoothie",
        ]),
        SchemaEntry::vector("nozzle_diameter", ValueKind::Float),
        SchemaEntry::vector("printable_area", ValueKind::Point),
        SchemaEntry::scalar("printable_height", ValueKind::Float),
        SchemaEntry::vector("extruder_offset", ValueKind::Point),
        SchemaEntry::vector("max_layer_height", ValueKind::Float),
        SchemaEntry::vector("min_layer_height", ValueKind::Float),
        SchemaEntry::vector("retraction_length", ValueKind::Float),
        SchemaEntry::vector("retraction_speed", ValueKind::Float),
        SchemaEntry::vector("z_hop", ValueKind::Float),
        SchemaEntry::scalar("use_relative_e_distances", ValueKind::Bool),
        SchemaEntry::scalar("default_print_profile", ValueKind::String)
            .references(ReferenceCategory::Process),
        SchemaEntry::vector("default_filament_profile", ValueKind::String)
            .references(ReferenceCategory::Filament),
        SchemaEntry::scalar("machine_start_gcode", ValueKind::String),
        SchemaEntry::scalar("machine_end_gcode", ValueKind::String),
        SchemaEntry::vector("thumbnails", ValueKind::Point),
    ]);
    entries
}

fn filament_entries() -> Vec<SchemaEntry> {
    let mut entries = inheritable_entries(ReferenceCategory::Filament);
    entries.extend([
        SchemaEntry::scalar("filament_id", ValueKind::String).required(true, false),
        SchemaEntry::vector("filament_settings_id", ValueKind::String),
        SchemaEntry::vector("filament_type", ValueKind::Enum).choices(&[
            "PLA", "PETG", "ABS", "ASA", "TPU", "PA", "PC", "PVA", "HIPS",
        ]),
        SchemaEntry::vector("filament_vendor", ValueKind::String),
        SchemaEntry::vector("filament_diameter", ValueKind::Float),
        SchemaEntry::vector("filament_density", ValueKind::Float),
        SchemaEntry::vector("filament_cost", ValueKind::Float),
        SchemaEntry::vector("filament_flow_ratio", ValueKind::Float),
        SchemaEntry::vector("filament_max_volumetric_speed", ValueKind::Float),
        SchemaEntry::vector("filament_retraction_length", ValueKind::Float),
        SchemaEntry::vector("nozzle_temperature", ValueKind::Int),
        SchemaEntry::vector("nozzle_temperature_initial_layer", ValueKind::Int),
        SchemaEntry::vector("hot_plate_temp", ValueKind::Int),
        SchemaEntry::vector("cool_plate_temp", ValueKind::Int),
        SchemaEntry::vector("fan_max_speed", ValueKind::Int),
        SchemaEntry::vector("fan_min_speed", ValueKind::Int),
        SchemaEntry::vector("compatible_printers", ValueKind::String)
            .references(ReferenceCategory::Printer),
        SchemaEntry::scalar("compatible_printers_condition", ValueKind::String),
    ]);
    entries
}

fn process_entries() -> Vec<SchemaEntry> {
    let mut entries = inheritable_entries(ReferenceCategory::Process);
    entries.extend([
        SchemaEntry::vector("print_settings_id", ValueKind::String),
        SchemaEntry::scalar("layer_height", ValueKind::Float),
        SchemaEntry::scalar("initial_layer_print_height", ValueKind::Float),
        SchemaEntry::scalar("line_width", ValueKind::FloatOrPercent),
        SchemaEntry::scalar("wall_loops", ValueKind::Int),
        SchemaEntry::scalar("top_shell_layers", ValueKind::Int),
        SchemaEntry::scalar("bottom_shell_layers", ValueKind::Int),
        SchemaEntry::scalar("sparse_infill_density", ValueKind::Percent),
        SchemaEntry::scalar("sparse_infill_pattern", ValueKind::Enum).choices(&[
            "grid",
            "gyroid",
            "honeycomb",
            "line",
            "cubic",
            "zig-zag",
        ]),
        SchemaEntry::scalar("wall_generator", ValueKind::Enum).choices(&["classic", "arachne"]),
        SchemaEntry::scalar("outer_wall_speed", ValueKind::Float),
        SchemaEntry::scalar("inner_wall_speed", ValueKind::Float),
        SchemaEntry::scalar("travel_speed", ValueKind::Float),
        SchemaEntry::scalar("enable_support", ValueKind::Bool),
        SchemaEntry::scalar("support_type", ValueKind::Enum).choices(&[
            "normal(auto)",
            "tree(auto)",
            "normal(manual)",
            "tree(manual)",
        ]),
        SchemaEntry::scalar("brim_type", ValueKind::Enum).choices(&[
            "auto_brim",
            "outer_only",
            "inner_only",
            "outer_and_inner",
            "no_brim",
        ]),
        SchemaEntry::scalar("brim_width", ValueKind::Float),
        SchemaEntry::vector("compatible_printers", ValueKind::String)
            .references(ReferenceCategory::Printer),
        SchemaEntry::scalar("compatible_printers_condition", ValueKind::String),
    ]);
    entries
}
