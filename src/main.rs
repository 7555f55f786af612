//! Slicer presets CLI
//!
//! Entry point for the `slicer-presets` command-line tool.
//!
//! Exit codes: 0 success, 1 error, 2 some items of a batch failed.

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use slicer_presets::config::default_settings_path;
use slicer_presets::{
    analyse_vendor, export_batch, logging, BatchItem, BatchSummary, ConfigLocation, ConfigStore,
    ConfigType, DeleteOutcome, DirectorySink, EditSession, FsStore, Locator, PresetIdentity,
    Resolver, Settings,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "slicer-presets")]
#[command(about = "Resolve, flatten and edit slicer presets", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Slicer installation directory (holds the installed vendor profiles)
    #[arg(long, global = true)]
    installation_dir: Option<PathBuf>,

    /// Slicer data directory (holds the system snapshot and user presets)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file (default: ~/.config/slicer-presets/config.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every preset of a type in one tier
    List {
        config_type: ConfigType,
        location: ConfigLocation,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved properties of one preset
    Resolve {
        config_type: ConfigType,
        location: ConfigLocation,
        name: String,

        /// Vendor family
        #[arg(long, short = 'f')]
        family: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Flatten presets and write them as standalone JSON files
    Flatten {
        config_type: ConfigType,
        location: ConfigLocation,
        #[arg(required = true)]
        names: Vec<String>,

        /// Vendor family
        #[arg(long, short = 'f')]
        family: Option<String>,

        /// Output directory
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// Edit a preset and write the result back
    Edit {
        config_type: ConfigType,
        location: ConfigLocation,
        name: String,

        /// Vendor family
        #[arg(long, short = 'f')]
        family: Option<String>,

        /// Set a property (KEY=VALUE; JSON arrays and objects are parsed)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Delete a property the preset defines itself
        #[arg(long = "unset", value_name = "KEY")]
        unset: Vec<String>,

        /// Print what would be written without writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Check a vendor manifest for missing files and keys
    AnalyseVendor {
        location: ConfigLocation,
        family: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

struct Context {
    store: Arc<dyn ConfigStore>,
    resolver: Resolver,
}

fn main() {
    let cli = Cli::parse();

    let settings = match load_settings(&cli.global) {
        Ok(s) => s,
        Err(e) => {
            logging::init("info");
            eprintln!("Error loading settings: {}", e);
            process::exit(1);
        }
    };
    logging::init(&settings.log_filter);

    let store: Arc<dyn ConfigStore> = Arc::new(FsStore::new());
    let locator = Locator::new(store.clone(), settings.storage_roots());
    let ctx = Context {
        store,
        resolver: Resolver::new(locator, settings.chain_options()),
    };

    let code = match cli.command {
        Commands::List {
            config_type,
            location,
            json,
        } => run_list(&ctx, config_type, location, json),
        Commands::Resolve {
            config_type,
            location,
            name,
            family,
            json,
        } => run_resolve(&ctx, config_type, location, &name, family.as_deref(), json),
        Commands::Flatten {
            config_type,
            location,
            names,
            family,
            out,
        } => run_flatten(&ctx, config_type, location, &names, family.as_deref(), out),
        Commands::Edit {
            config_type,
            location,
            name,
            family,
            set,
            unset,
            dry_run,
        } => run_edit(
            &ctx,
            config_type,
            location,
            &name,
            family.as_deref(),
            &set,
            &unset,
            dry_run,
        ),
        Commands::AnalyseVendor {
            location,
            family,
            json,
        } => run_analyse_vendor(&ctx, location, &family, json),
    };
    process::exit(code);
}

fn load_settings(global: &GlobalArgs) -> Result<Settings, String> {
    let mut overrides = serde_json::Map::new();
    if let Some(dir) = &global.installation_dir {
        overrides.insert(
            "installation_dir".to_string(),
            Value::String(dir.to_string_lossy().to_string()),
        );
    }
    if let Some(dir) = &global.data_dir {
        overrides.insert(
            "data_dir".to_string(),
            Value::String(dir.to_string_lossy().to_string()),
        );
    }
    let overrides = (!overrides.is_empty()).then_some(Value::Object(overrides));

    let path = global.settings.clone().or_else(default_settings_path);
    Settings::build(path.as_deref(), overrides).map_err(|e| e.to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            1
        }
    }
}

fn batch_exit_code<T>(items: &[BatchItem<T>]) -> i32 {
    if BatchSummary::of(items).all_succeeded() {
        0
    } else {
        2
    }
}

fn run_list(ctx: &Context, config_type: ConfigType, location: ConfigLocation, json: bool) -> i32 {
    let items = ctx.resolver.list(config_type, location);

    if json {
        let output: Vec<Value> = items
            .iter()
            .map(|item| match &item.outcome {
                Ok(resolved) => serde_json::json!({
                    "identity": item.identity,
                    "ok": true,
                    "properties": resolved.properties().len(),
                    "missing_required": resolved.missing_required(),
                    "warnings": resolved.warnings(),
                }),
                Err(e) => serde_json::json!({
                    "identity": item.identity,
                    "ok": false,
                    "code": e.code(),
                    "error": e.to_string(),
                }),
            })
            .collect();
        let code = print_json(&output);
        return if code != 0 { code } else { batch_exit_code(&items) };
    }

    if items.is_empty() {
        println!("No {} presets found in the {} tier.", config_type, location);
        return 0;
    }

    for item in &items {
        match &item.outcome {
            Ok(resolved) if resolved.missing_required().is_empty() => {
                println!("ok   {}", item.identity)
            }
            Ok(resolved) => println!(
                "ok   {} (missing: {})",
                item.identity,
                join(resolved.missing_required())
            ),
            Err(e) => println!("err  {}: {}", item.identity, e),
        }
    }

    let summary = BatchSummary::of(&items);
    println!();
    println!(
        "{} presets, {} resolved, {} failed",
        summary.total, summary.succeeded, summary.failed
    );
    batch_exit_code(&items)
}

fn run_resolve(
    ctx: &Context,
    config_type: ConfigType,
    location: ConfigLocation,
    name: &str,
    family: Option<&str>,
    json: bool,
) -> i32 {
    let resolved = match ctx
        .resolver
        .locate(config_type, location, family, name)
        .and_then(|id| ctx.resolver.resolve(&id))
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if json {
        return print_json(&resolved);
    }

    println!("{}", resolved.leaf());
    if let Some(parent) = resolved.leaf_inherits() {
        println!("  inherits: {}", parent);
    }
    println!();
    for (key, property) in resolved.properties() {
        let marker = if resolved.unknown().contains(key) { "?" } else { " " };
        println!(
            "{} {} = {}  [level {}, {}]",
            marker,
            key,
            property.value,
            property.origin_level,
            property.source.name()
        );
    }

    if !resolved.missing_required().is_empty() {
        println!();
        println!("Missing required: {}", join(resolved.missing_required()));
    }
    if !resolved.warnings().is_empty() {
        println!();
        println!("Warnings:");
        for warning in resolved.warnings() {
            println!("  {}", warning);
        }
    }
    0
}

fn run_flatten(
    ctx: &Context,
    config_type: ConfigType,
    location: ConfigLocation,
    names: &[String],
    family: Option<&str>,
    out: PathBuf,
) -> i32 {
    let mut identities: Vec<PresetIdentity> = Vec::new();
    let mut failed = 0;
    for name in names {
        match ctx.resolver.locate(config_type, location, family, name) {
            Ok(id) => identities.push(id),
            Err(e) => {
                println!("err  {}: {}", name, e);
                failed += 1;
            }
        }
    }

    let mut sink = DirectorySink::new(ctx.store.clone(), out);
    let items = export_batch(&ctx.resolver, &identities, &mut sink);
    for item in &items {
        match &item.outcome {
            Ok(path) => println!("ok   {} -> {}", item.identity, path.display()),
            Err(e) => println!("err  {}: {}", item.identity, e),
        }
    }

    let summary = BatchSummary::of(&items);
    let failed = failed + summary.failed;
    if failed == 0 {
        0
    } else if failed == names.len() {
        1
    } else {
        2
    }
}

/// `KEY=VALUE`; JSON arrays and objects are parsed, anything else stays a string.
fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    let value = match serde_json::from_str::<Value>(value) {
        Ok(v @ (Value::Array(_) | Value::Object(_))) => v,
        _ => Value::String(value.to_string()),
    };
    Ok((key.to_string(), value))
}

#[allow(clippy::too_many_arguments)]
fn run_edit(
    ctx: &Context,
    config_type: ConfigType,
    location: ConfigLocation,
    name: &str,
    family: Option<&str>,
    set: &[String],
    unset: &[String],
    dry_run: bool,
) -> i32 {
    let assignments = match set.iter().map(|s| parse_assignment(s)).collect::<Result<Vec<_>, _>>() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let identity = match ctx.resolver.locate(config_type, location, family, name) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut session = match EditSession::open(&ctx.resolver, identity) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    for key in unset {
        match session.delete_property(key) {
            Ok(DeleteOutcome::Inherited) => {
                eprintln!("Warning: '{}' is inherited; override it instead of deleting", key)
            }
            Ok(DeleteOutcome::Absent) => eprintln!("Warning: '{}' is not set", key),
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }
    for (key, value) in assignments {
        if let Err(e) = session.set_property(&key, value) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    if dry_run {
        return match session.writable_set() {
            Ok(payload) => print_json(&payload),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }

    match session.commit(&ctx.resolver) {
        Ok(()) => {
            println!("Saved {}", session.identity().path().display());
            if let Some(resolved) = session.resolved() {
                if !resolved.missing_required().is_empty() {
                    println!("Missing required: {}", join(resolved.missing_required()));
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn run_analyse_vendor(ctx: &Context, location: ConfigLocation, family: &str, json: bool) -> i32 {
    let analysis = match analyse_vendor(ctx.resolver.locator(), location, family) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if json {
        let code = print_json(&analysis);
        return if code != 0 || analysis.errors.is_empty() { code } else { 1 };
    }

    println!("{}", analysis.vendor);
    if analysis.is_clean() {
        println!("  no problems found");
        return 0;
    }
    for (key, messages) in &analysis.errors {
        for message in messages {
            println!("  error   {}: {}", key, message);
        }
    }
    for (key, messages) in &analysis.warnings {
        for message in messages {
            println!("  warning {}: {}", key, message);
        }
    }
    if analysis.errors.is_empty() {
        0
    } else {
        1
    }
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("layer_height=0.2").unwrap(),
            ("layer_height".to_string(), Value::String("0.2".to_string()))
        );
        assert_eq!(
            parse_assignment("nozzle_temperature=[\"220\"]").unwrap().1,
            serde_json::json!(["220"])
        );
        assert_eq!(
            parse_assignment("note=a=b").unwrap().1,
            Value::String("a=b".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
