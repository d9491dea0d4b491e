//! Debounce configuration parsed from `keyboard.toml`.
//!
//! Only the `[debounce]` section is read, every other section of the file is
//! left to the tools that own it. The parsed values are turned into Rust
//! constants by `rmk-debounce`'s build script.

use serde_derive::Deserialize;
use serde_inline_default::serde_inline_default;

pub mod defaults;
mod error;

pub use error::{ConfigError, ConfigResult};

/// Debounce algorithm compiled into the firmware
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebounceAlgorithm {
    /// Per-key deferred debouncer with separate press/release thresholds
    #[default]
    AsymDefer,
    /// Per-key debouncer tracking in-flight keys in a linked list
    EagerList,
    /// Per-key state machine with a post-commit quiescence window
    Quiesce,
}

impl DebounceAlgorithm {
    /// All algorithm names, as written in `keyboard.toml`
    pub const NAMES: [&'static str; 3] = ["asym_defer", "eager_list", "quiesce"];

    /// Value of the `debounce_algorithm` cfg emitted for this algorithm
    pub fn cfg_value(&self) -> &'static str {
        match self {
            DebounceAlgorithm::AsymDefer => Self::NAMES[0],
            DebounceAlgorithm::EagerList => Self::NAMES[1],
            DebounceAlgorithm::Quiesce => Self::NAMES[2],
        }
    }
}

/// The `[debounce]` section
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebounceConfig {
    /// Algorithm used by the `Debouncer` alias
    #[serde(default)]
    pub algorithm: DebounceAlgorithm,
    /// Symmetric debounce threshold in ms (or scan passes when `use_frames` is set)
    #[serde_inline_default(defaults::DEBOUNCE_TIME)]
    pub debounce_time: u8,
    /// Press threshold, defaults to `debounce_time`
    pub debounce_down: Option<u8>,
    /// Release threshold, defaults to `debounce_time`
    pub debounce_up: Option<u8>,
    /// Settle window of the quiesce algorithm
    #[serde_inline_default(defaults::QUIESCE_TIME)]
    pub quiesce_time: u8,
    /// Count scan passes instead of milliseconds
    #[serde(default)]
    pub use_frames: bool,
}

/// This separate Default impl is needed when `[debounce]` section is not set in keyboard.toml
impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            algorithm: DebounceAlgorithm::default(),
            debounce_time: defaults::DEBOUNCE_TIME,
            debounce_down: None,
            debounce_up: None,
            quiesce_time: defaults::QUIESCE_TIME,
            use_frames: false,
        }
    }
}

impl DebounceConfig {
    /// Threshold applied when a key goes down
    pub fn down(&self) -> u8 {
        self.debounce_down.unwrap_or(self.debounce_time)
    }

    /// Threshold applied when a key goes up
    pub fn up(&self) -> u8 {
        self.debounce_up.unwrap_or(self.debounce_time)
    }

    /// Check that every threshold can arm a counter.
    ///
    /// A zero threshold would put a key into the active set with an already
    /// expired counter, so all three must be at least 1.
    pub fn validate(&self) -> ConfigResult<()> {
        let thresholds = [
            ("debounce.debounce_time", self.debounce_time),
            ("debounce.debounce_down", self.down()),
            ("debounce.debounce_up", self.up()),
        ];
        for (field, value) in thresholds {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    expected: "a value between 1 and 255".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Subset of `keyboard.toml` relevant to debouncing
#[derive(Clone, Debug, Default, Deserialize)]
pub struct KeyboardTomlConfig {
    #[serde(default)]
    pub debounce: DebounceConfig,
}

impl KeyboardTomlConfig {
    /// Parse and validate a `keyboard.toml` document.
    ///
    /// An empty document yields the default configuration.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: KeyboardTomlConfig = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
            message: e.to_string(),
        })?;
        config.debounce.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = KeyboardTomlConfig::from_toml_str("").unwrap();
        let debounce = config.debounce;
        assert_eq!(debounce.algorithm, DebounceAlgorithm::AsymDefer);
        assert_eq!(debounce.debounce_time, 5);
        assert_eq!(debounce.down(), 5);
        assert_eq!(debounce.up(), 5);
        assert_eq!(debounce.quiesce_time, 30);
        assert!(!debounce.use_frames);
    }

    #[test]
    fn test_other_sections_are_ignored() {
        let content = r#"
            [keyboard]
            name = "RMK Keyboard"
            vendor_id = 0x4c4b

            [matrix]
            rows = 5
            cols = 14

            [debounce]
            algorithm = "quiesce"
            quiesce_time = 40
        "#;
        let debounce = KeyboardTomlConfig::from_toml_str(content).unwrap().debounce;
        assert_eq!(debounce.algorithm, DebounceAlgorithm::Quiesce);
        assert_eq!(debounce.algorithm.cfg_value(), "quiesce");
        assert_eq!(debounce.quiesce_time, 40);
        assert_eq!(debounce.debounce_time, 5);
    }

    #[test]
    fn test_asymmetric_thresholds_fall_back_to_debounce_time() {
        let content = r#"
            [debounce]
            algorithm = "eager_list"
            debounce_time = 8
            debounce_up = 12
            use_frames = true
        "#;
        let debounce = KeyboardTomlConfig::from_toml_str(content).unwrap().debounce;
        assert_eq!(debounce.algorithm.cfg_value(), "eager_list");
        assert_eq!(debounce.down(), 8);
        assert_eq!(debounce.up(), 12);
        assert!(debounce.use_frames);
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let content = r#"
            [debounce]
            debounce_down = 0
        "#;
        let err = KeyboardTomlConfig::from_toml_str(content).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                field: "debounce.debounce_down".to_string(),
                value: "0".to_string(),
                expected: "a value between 1 and 255".to_string(),
            }
        );
    }

    #[test]
    fn test_out_of_range_and_unknown_keys_are_parse_errors() {
        let too_large = "[debounce]\ndebounce_time = 300\n";
        assert!(matches!(
            KeyboardTomlConfig::from_toml_str(too_large),
            Err(ConfigError::TomlParse { .. })
        ));

        let unknown = "[debounce]\ndebounce_ms = 5\n";
        assert!(matches!(
            KeyboardTomlConfig::from_toml_str(unknown),
            Err(ConfigError::TomlParse { .. })
        ));

        let bad_algorithm = "[debounce]\nalgorithm = \"sym_defer\"\n";
        assert!(matches!(
            KeyboardTomlConfig::from_toml_str(bad_algorithm),
            Err(ConfigError::TomlParse { .. })
        ));
    }
}
