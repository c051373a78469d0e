//! Build script for plantwatch-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates plant.toml and turns it into compile-time constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    let config = validate_config();
    generate_constants(&config);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate plant.toml at compile time
fn validate_config() -> toml::Value {
    println!("cargo:rerun-if-changed=plant.toml");

    let config_path = Path::new("plant.toml");
    if !config_path.exists() {
        fail(
            "plant.toml not found",
            &[
                "The plant settings live in plantwatch-firmware/plant.toml".to_string(),
                "Sections: [link] [timing] [limits] [simulation]".to_string(),
            ],
        );
    }

    let config_content = fs::read_to_string(config_path)
        .unwrap_or_else(|e| fail("cannot read plant.toml", &[e.to_string()]));

    let config: toml::Value = toml::from_str(&config_content).unwrap_or_else(|e| {
        let lines: Vec<String> = e.to_string().lines().map(str::to_string).collect();
        fail("plant.toml is not valid TOML", &lines)
    });

    let mut errors = Vec::new();
    for (section, key, min, max) in FIELDS {
        match lookup(&config, section, key) {
            Some(toml::Value::Integer(v)) if (*min..=*max).contains(v) => {}
            Some(toml::Value::Integer(_)) => {
                errors.push(format!("[{}] {} must be {}-{}", section, key, min, max))
            }
            Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
            None => errors.push(format!("[{}] missing '{}'", section, key)),
        }
    }

    if let (Some(toml::Value::Integer(lo)), Some(toml::Value::Integer(hi))) = (
        lookup(&config, "limits", "voltage_min_mv"),
        lookup(&config, "limits", "voltage_max_mv"),
    ) {
        if lo > hi {
            errors.push("[limits] voltage_min_mv must not exceed voltage_max_mv".to_string());
        }
    }

    if !errors.is_empty() {
        fail("plant.toml settings out of range", &errors);
    }

    println!("cargo:warning=plant.toml validated successfully");
    config
}

/// Every required key: (section, key, min, max)
const FIELDS: &[(&str, &str, i64, i64)] = &[
    ("link", "baud", 9_600, 921_600),
    ("timing", "status_interval_ms", 100, 600_000),
    ("timing", "sweep_interval_ms", 100, 60_000),
    ("limits", "voltage_min_mv", 0, 100_000),
    ("limits", "voltage_max_mv", 0, 100_000),
    ("limits", "current_max_ma", 0, 1_000_000),
    ("limits", "temperature_max_c", 0, 150),
    ("limits", "power_max_mw", 0, 10_000_000),
    ("simulation", "seed", 1, u32::MAX as i64),
];

fn lookup<'a>(config: &'a toml::Value, section: &str, key: &str) -> Option<&'a toml::Value> {
    config.get(section)?.get(key)
}

/// Write the validated values as Rust constants into OUT_DIR
fn generate_constants(config: &toml::Value) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("plant_config.rs")).unwrap();

    writeln!(f, "// Generated from plant.toml by build.rs").unwrap();
    for (section, key, _, _) in FIELDS {
        let value = lookup(config, section, key)
            .and_then(toml::Value::as_integer)
            .unwrap();
        let name = format!("{}_{}", section, key).to_uppercase();
        let ty = if key.ends_with("_ms") { "u64" } else if key.ends_with("_c") { "u8" } else { "u32" };
        writeln!(f, "pub const {}: {} = {};", name, ty, value).unwrap();
    }
}

/// Abort the build with one line per problem
fn fail(title: &str, lines: &[String]) -> ! {
    let rule = "-".repeat(68);
    let body = lines
        .iter()
        .map(|line| {
            let line = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.clone()
            };
            format!("  plant.toml | {}", line)
        })
        .collect::<Vec<_>>()
        .join("\n");
    panic!("\n{rule}\n  plantwatch: {title}\n{rule}\n{body}\n{rule}\n");
}
