use std::path::Path;
use std::{env, fs};

use const_gen::*;
use rmk_debounce_config::{DebounceAlgorithm, DebounceConfig, KeyboardTomlConfig};

fn main() {
    // Ensure build.rs is re-run when files change
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=KEYBOARD_TOML_PATH");

    // Read keyboard.toml if it's present
    let user_config_str = if let Ok(toml_path) = std::env::var("KEYBOARD_TOML_PATH") {
        println!("cargo:rerun-if-changed={toml_path}");
        fs::read_to_string(&toml_path).expect("Failed to read user config file")
    } else {
        "".to_string()
    };

    // Parse user configuration
    let user_toml = KeyboardTomlConfig::from_toml_str(&user_config_str)
        .unwrap_or_else(|e| panic!("❌ Parse `keyboard.toml` error: {e}"));
    let debounce = user_toml.debounce;

    emit_cfgs(&debounce);

    // Write to constants.rs file
    let constants = get_constants_str(&debounce);
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("constants.rs");
    fs::write(&dest_path, constants).expect("Failed to write constants.rs file");
}

fn emit_cfgs(debounce: &DebounceConfig) {
    let values = DebounceAlgorithm::NAMES
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ");
    println!("cargo::rustc-check-cfg=cfg(debounce_algorithm, values({values}))");
    println!("cargo::rustc-check-cfg=cfg(debounce_use_frames)");

    println!(
        "cargo::rustc-cfg=debounce_algorithm=\"{}\"",
        debounce.algorithm.cfg_value()
    );
    if debounce.use_frames {
        println!("cargo::rustc-cfg=debounce_use_frames");
    }
}

fn get_constants_str(debounce: &DebounceConfig) -> String {
    let constant_strs = vec![
        const_declaration!(pub DEBOUNCE = debounce.debounce_time),
        const_declaration!(pub DEBOUNCE_DOWN = debounce.down()),
        const_declaration!(pub DEBOUNCE_UP = debounce.up()),
        const_declaration!(pub DEBOUNCE_QUIESCE = debounce.quiesce_time),
    ];

    constant_strs
        .into_iter()
        .map(|s| "#[allow(clippy::redundant_static_lifetimes)]\n".to_owned() + s.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
