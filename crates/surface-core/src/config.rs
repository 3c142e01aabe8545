//! Controller profile schema and loader
//!
//! Profiles are stored as YAML in the user config folder.
//! Default location: ~/.config/surface-core/surfaces.yaml
//!
//! A missing or unreadable file is not an error: the built-in Launchkey Mini
//! MK3 profile is used instead.

use crate::modes::ModeId;
use crate::surface::{ButtonId, PadGrid};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Root surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Controller profiles (matched by port name)
    pub devices: Vec<DeviceProfile>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            devices: vec![DeviceProfile::launchkey_mini_mk3()],
        }
    }
}

impl SurfaceConfig {
    /// Profile for a MIDI port
    ///
    /// When several profiles match, the one with the longest `port_match`
    /// wins, so "launchkey mini mk3 daw" beats "launchkey".
    pub fn find_profile(&self, port_name: &str) -> Option<&DeviceProfile> {
        let port = port_key(port_name);
        self.devices
            .iter()
            .filter(|profile| profile.matches_port_key(&port))
            .max_by_key(|profile| port_key(&profile.port_match).len())
    }
}

/// Hardware family, which decides how LED blinking is encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerFamily {
    /// Novation Launchkey: flash on channel + 1, pulse on channel + 2
    #[default]
    Launchkey,
    /// Novation Launchpad: same LED channels as the Launchkey
    Launchpad,
    /// Plain note LEDs without blinking
    Generic,
}

impl ControllerFamily {
    /// Channel offsets for (flash, pulse) LED messages, if the family blinks
    pub fn blink_channels(self) -> Option<(u8, u8)> {
        match self {
            Self::Launchkey | Self::Launchpad => Some((1, 2)),
            Self::Generic => None,
        }
    }
}

/// Pad matrix: channel plus note layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// MIDI channel of the pads (0-15)
    #[serde(default)]
    pub channel: u8,
    #[serde(flatten)]
    pub layout: PadGrid,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            layout: PadGrid::default(),
        }
    }
}

/// MIDI control identifier (Note or CC)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type")]
pub enum MidiControlConfig {
    /// Note On/Off message
    Note {
        /// MIDI channel (0-15)
        channel: u8,
        /// Note number (0-127)
        note: u8,
    },
    /// Control Change message
    ControlChange {
        /// MIDI channel (0-15)
        channel: u8,
        /// CC number (0-127)
        cc: u8,
    },
}

impl MidiControlConfig {
    /// Create a Note control
    pub fn note(channel: u8, note: u8) -> Self {
        Self::Note { channel, note }
    }

    /// Create a CC control
    pub fn cc(channel: u8, cc: u8) -> Self {
        Self::ControlChange { channel, cc }
    }

    /// Get the MIDI channel
    pub fn channel(&self) -> u8 {
        match self {
            Self::Note { channel, .. } => *channel,
            Self::ControlChange { channel, .. } => *channel,
        }
    }

    /// Note or CC number
    pub fn number(&self) -> u8 {
        match self {
            Self::Note { note, .. } => *note,
            Self::ControlChange { cc, .. } => *cc,
        }
    }
}

/// Encoder interpretation mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EncoderMode {
    /// Absolute value (0-127)
    #[default]
    Absolute,
    /// Relative: 1-63 = clockwise, 65-127 = counter-clockwise
    Relative,
    /// Relative with 64 as center: <64 = CCW, >64 = CW
    RelativeSigned,
}

/// A physical button and the message it sends (and receives for its LED)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMapping {
    pub button: ButtonId,
    pub control: MidiControlConfig,
}

/// A control that switches the knob mode
///
/// With `value` set only that CC value selects the mode (pot-mode selectors
/// send one CC with a value per position); otherwise any press does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSelectMapping {
    pub control: MidiControlConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u8>,
    pub mode: ModeId,
}

fn default_long_press_ms() -> u64 {
    400
}

fn default_modes() -> Vec<ModeId> {
    ModeId::ALL.to_vec()
}

/// Configuration for one controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Human-readable device name
    pub name: String,

    /// Words the MIDI port name must contain, case-insensitive
    pub port_match: String,

    #[serde(default)]
    pub family: ControllerFamily,

    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub buttons: Vec<ButtonMapping>,

    /// Knob controls, in knob order
    #[serde(default)]
    pub knobs: Vec<MidiControlConfig>,

    #[serde(default)]
    pub encoder_mode: EncoderMode,

    /// Hold time before pads and buttons report a long press
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,

    /// Knob modes offered by this controller, first one active at start
    #[serde(default = "default_modes")]
    pub modes: Vec<ModeId>,

    #[serde(default)]
    pub mode_select: Vec<ModeSelectMapping>,

    /// Setting overrides by key (e.g. `footswitch_2: "Looper Custom"`)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub settings: HashMap<String, serde_yaml::Value>,
}

/// Profile validation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Profile '{0}' has an empty pad grid")]
    EmptyGrid(String),
    #[error("Profile '{profile}': MIDI channel {channel} out of range")]
    InvalidChannel { profile: String, channel: u8 },
    #[error("Profile '{profile}': MIDI value {value} out of range")]
    InvalidValue { profile: String, value: u8 },
    #[error("Profile '{profile}': control {control:?} is mapped twice")]
    DuplicateControl {
        profile: String,
        control: MidiControlConfig,
    },
    #[error("Profile '{profile}': mode {mode:?} is selectable but not enabled")]
    ModeNotEnabled { profile: String, mode: ModeId },
}

impl DeviceProfile {
    /// Built-in profile for the Launchkey Mini MK3 in DAW mode
    pub fn launchkey_mini_mk3() -> Self {
        const KNOB_CHANNEL: u8 = 15;
        let button = |button, cc| ButtonMapping {
            button,
            control: MidiControlConfig::cc(0, cc),
        };
        let pot_mode = |value, mode| ModeSelectMapping {
            control: MidiControlConfig::cc(KNOB_CHANNEL, 0x09),
            value: Some(value),
            mode,
        };

        Self {
            name: "Launchkey Mini MK3".to_string(),
            port_match: "launchkey mini mk3 daw".to_string(),
            family: ControllerFamily::Launchkey,
            grid: GridConfig::default(),
            buttons: vec![
                button(ButtonId::Scene1, 0x68),
                button(ButtonId::Scene2, 0x69),
                button(ButtonId::Shift, 0x6C),
                button(ButtonId::Play, 0x73),
                button(ButtonId::Record, 0x75),
                button(ButtonId::ArrowRight, 0x66),
                button(ButtonId::ArrowLeft, 0x67),
                button(ButtonId::Footswitch, 0x40),
            ],
            knobs: (0x15..=0x1C).map(|cc| MidiControlConfig::cc(KNOB_CHANNEL, cc)).collect(),
            encoder_mode: EncoderMode::Absolute,
            long_press_ms: default_long_press_ms(),
            modes: vec![ModeId::Volume, ModeId::Device, ModeId::Pan, ModeId::User],
            mode_select: vec![
                pot_mode(1, ModeId::Volume),
                pot_mode(2, ModeId::Device),
                pot_mode(3, ModeId::Pan),
                pot_mode(6, ModeId::User),
            ],
            settings: HashMap::new(),
        }
    }

    /// Whether this profile drives the MIDI port `port_name`
    pub fn matches_port(&self, port_name: &str) -> bool {
        self.matches_port_key(&port_key(port_name))
    }

    fn matches_port_key(&self, port: &str) -> bool {
        let pattern = port_key(&self.port_match);
        !pattern.is_empty() && port.contains(&pattern)
    }

    pub fn long_press(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.long_press_ms)
    }

    /// MIDI control mapped to a button
    pub fn button_control(&self, button: ButtonId) -> Option<&MidiControlConfig> {
        self.buttons.iter().find(|m| m.button == button).map(|m| &m.control)
    }

    /// Check ranges and that no control is claimed twice
    pub fn validate(&self) -> Result<(), ConfigError> {
        let profile = || self.name.clone();
        let layout = &self.grid.layout;

        if layout.columns == 0 || layout.rows() == 0 {
            return Err(ConfigError::EmptyGrid(profile()));
        }
        if self.grid.channel > 15 {
            return Err(ConfigError::InvalidChannel {
                profile: profile(),
                channel: self.grid.channel,
            });
        }
        if let Some(note) = layout.notes().find(|note| *note > 127) {
            return Err(ConfigError::InvalidValue { profile: profile(), value: note });
        }

        let grid_notes: HashSet<u8> = layout.notes().collect();
        let controls = self
            .buttons
            .iter()
            .map(|m| &m.control)
            .chain(self.knobs.iter())
            .chain(self.mode_select.iter().map(|m| &m.control));
        let mut seen = HashSet::new();
        for control in controls {
            if control.channel() > 15 {
                return Err(ConfigError::InvalidChannel {
                    profile: profile(),
                    channel: control.channel(),
                });
            }
            if control.number() > 127 {
                return Err(ConfigError::InvalidValue {
                    profile: profile(),
                    value: control.number(),
                });
            }
            let on_grid = matches!(control, MidiControlConfig::Note { channel, note }
                if *channel == self.grid.channel && grid_notes.contains(note));
            // Pot-mode selectors share one CC across positions
            let shared_selector = self.mode_select.iter().filter(|m| &m.control == control).count() > 1;
            if on_grid || (!seen.insert(control) && !shared_selector) {
                return Err(ConfigError::DuplicateControl {
                    profile: profile(),
                    control: control.clone(),
                });
            }
        }

        if let Some(m) = self.mode_select.iter().find(|m| !self.modes.contains(&m.mode)) {
            return Err(ConfigError::ModeNotEnabled {
                profile: profile(),
                mode: m.mode,
            });
        }
        Ok(())
    }
}

/// Get the default surface config file path
///
/// Returns: <config dir>/surface-core/surfaces.yaml
pub fn default_surface_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("surface-core")
        .join("surfaces.yaml")
}

fn read_surface_config(path: &Path) -> anyhow::Result<SurfaceConfig> {
    use anyhow::Context;

    let contents = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let mut config: SurfaceConfig =
        serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))?;
    config.devices.retain(|device| match device.validate() {
        Ok(()) => true,
        Err(e) => {
            log::warn!("load_surface_config: Skipping profile: {}", e);
            false
        }
    });
    Ok(config)
}

/// Load controller profiles from a YAML file
///
/// A missing or broken file yields the built-in profile. Profiles that fail
/// validation are dropped with a warning; if none survive, the built-in
/// profile is used too.
pub fn load_surface_config(path: &Path) -> SurfaceConfig {
    if !path.exists() {
        log::info!("load_surface_config: {:?} not found, using built-in profile", path);
        return SurfaceConfig::default();
    }
    match read_surface_config(path) {
        Ok(config) if config.devices.is_empty() => {
            log::warn!("load_surface_config: No usable profile in {:?}, using built-in profile", path);
            SurfaceConfig::default()
        }
        Ok(config) => {
            for device in &config.devices {
                log::info!(
                    "load_surface_config: {} ({:?}, port '{}')",
                    device.name,
                    device.family,
                    device.port_match
                );
            }
            config
        }
        Err(e) => {
            log::warn!("load_surface_config: {:#}, using built-in profile", e);
            SurfaceConfig::default()
        }
    }
}

/// Write controller profiles as YAML, creating parent folders
pub fn save_surface_config(config: &SurfaceConfig, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_yaml::to_writer(std::io::BufWriter::new(file), config).context("Failed to write surface config")?;
    log::info!("save_surface_config: Saved {} profile(s) to {:?}", config.devices.len(), path);
    Ok(())
}

/// Comparable form of a port name
///
/// Lowercased words, without the ALSA decorations that change between
/// reconnections: bracketed hardware ids (`[hw:2,0,1]`) and sequencer
/// `client:port` numbers (`24:1`).
fn port_key(name: &str) -> String {
    let is_id = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let undecorated = match name.find('[') {
        Some(bracket) => &name[..bracket],
        None => name,
    };
    undecorated
        .split_whitespace()
        .filter(|word| !matches!(word.split_once(':'), Some((client, port)) if is_id(client) && is_id(port)))
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SurfaceConfig::default();
        assert_eq!(config.devices.len(), 1);
        let profile = &config.devices[0];
        assert_eq!(profile.validate(), Ok(()));
        assert_eq!(profile.knobs.len(), 8);
        assert_eq!(profile.long_press().as_millis(), 400);
        assert_eq!(
            profile.button_control(ButtonId::Scene2),
            Some(&MidiControlConfig::cc(0, 0x69))
        );
        assert_eq!(profile.button_control(ButtonId::Undo), None);
    }

    #[test]
    fn test_midi_control_config() {
        let note = MidiControlConfig::note(2, 0x60);
        assert_eq!(note.channel(), 2);
        assert_eq!(note.number(), 0x60);
        let cc = MidiControlConfig::cc(15, 0x15);
        assert_eq!(cc.channel(), 15);
        assert_eq!(cc.number(), 0x15);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
devices:
  - name: "Launchpad Mini MK3"
    port_match: "launchpad mini"
    family: launchpad
    grid:
      channel: 0
      columns: 8
      row_notes: [0x51, 0x47, 0x3D]
    buttons:
      - button: scene1
        control:
          type: "ControlChange"
          channel: 0
          cc: 0x59
      - button: footswitch
        control:
          type: "Note"
          channel: 0
          note: 0x13
    knobs:
      - type: "ControlChange"
        channel: 0
        cc: 0x15
    encoder_mode: relative
    modes: [volume, pan]
    settings:
      footswitch_2: "Looper Custom"
      quantize_amount: 50
"#;

        let config: SurfaceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.devices.len(), 1);
        let profile = &config.devices[0];
        assert_eq!(profile.family, ControllerFamily::Launchpad);
        assert_eq!(profile.grid.layout.rows(), 3);
        assert_eq!(profile.grid.layout.note_at(0, 2), Some(0x3D));
        assert_eq!(profile.encoder_mode, EncoderMode::Relative);
        assert_eq!(profile.long_press_ms, 400);
        assert_eq!(profile.modes, vec![ModeId::Volume, ModeId::Pan]);
        assert_eq!(
            profile.button_control(ButtonId::Footswitch),
            Some(&MidiControlConfig::note(0, 0x13))
        );
        assert_eq!(
            profile.settings.get("footswitch_2"),
            Some(&serde_yaml::Value::String("Looper Custom".to_string()))
        );
        assert_eq!(profile.validate(), Ok(()));
    }

    #[test]
    fn test_minimal_profile_defaults() {
        let yaml = r#"
devices:
  - name: "Bare"
    port_match: "bare"
"#;
        let config: SurfaceConfig = serde_yaml::from_str(yaml).unwrap();
        let profile = &config.devices[0];
        assert_eq!(profile.family, ControllerFamily::Launchkey);
        assert_eq!(profile.grid, GridConfig::default());
        assert_eq!(profile.modes, ModeId::ALL.to_vec());
        assert!(profile.settings.is_empty());
    }

    #[test]
    fn test_validate_rejects_conflicts() {
        let mut profile = DeviceProfile::launchkey_mini_mk3();
        profile.buttons.push(ButtonMapping {
            button: ButtonId::Undo,
            control: MidiControlConfig::cc(0, 0x73),
        });
        assert!(matches!(profile.validate(), Err(ConfigError::DuplicateControl { .. })));

        let mut profile = DeviceProfile::launchkey_mini_mk3();
        profile.buttons.push(ButtonMapping {
            button: ButtonId::Undo,
            control: MidiControlConfig::note(0, 0x61),
        });
        assert!(matches!(profile.validate(), Err(ConfigError::DuplicateControl { .. })));

        let mut profile = DeviceProfile::launchkey_mini_mk3();
        profile.modes = vec![ModeId::Volume];
        assert!(matches!(profile.validate(), Err(ConfigError::ModeNotEnabled { .. })));

        let mut profile = DeviceProfile::launchkey_mini_mk3();
        profile.knobs.push(MidiControlConfig::cc(16, 1));
        assert!(matches!(profile.validate(), Err(ConfigError::InvalidChannel { channel: 16, .. })));

        let mut profile = DeviceProfile::launchkey_mini_mk3();
        profile.grid.layout.row_notes.clear();
        assert!(matches!(profile.validate(), Err(ConfigError::EmptyGrid(_))));
    }

    #[test]
    fn test_load_missing_and_invalid_fall_back() {
        let dir = std::env::temp_dir().join(format!("surface-core-config-{}", std::process::id()));
        let missing = dir.join("missing.yaml");
        assert_eq!(load_surface_config(&missing).devices[0].name, "Launchkey Mini MK3");

        std::fs::create_dir_all(&dir).unwrap();
        let broken = dir.join("broken.yaml");
        std::fs::write(&broken, "devices: [ {name: ").unwrap();
        assert_eq!(load_surface_config(&broken).devices[0].name, "Launchkey Mini MK3");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("surface-core-save-{}", std::process::id()));
        let path = dir.join("nested").join("surfaces.yaml");

        let mut config = SurfaceConfig::default();
        config.devices[0]
            .settings
            .insert("quantize_amount".to_string(), serde_yaml::Value::from(25));
        save_surface_config(&config, &path).unwrap();

        let loaded = load_surface_config(&path);
        assert_eq!(loaded.devices, config.devices);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_port_key() {
        assert_eq!(port_key("Launchkey Mini MK3 DAW Port [hw:2,0,1]"), "launchkey mini mk3 daw port");
        assert_eq!(
            port_key("Launchkey Mini MK3:Launchkey Mini MK3 LKMK3 DAW In 24:1"),
            "launchkey mini mk3:launchkey mini mk3 lkmk3 daw in"
        );
        assert_eq!(port_key("  Launchkey   Mini\tMK3 "), "launchkey mini mk3");
        // Not a sequencer id
        assert_eq!(port_key("Pads a:b"), "pads a:b");
        assert_eq!(port_key("[hw:1,0,0]"), "");
    }

    #[test]
    fn test_find_profile_prefers_most_specific() {
        let mut config = SurfaceConfig::default();
        let mut generic = DeviceProfile::launchkey_mini_mk3();
        generic.name = "Any Launchkey".to_string();
        generic.port_match = "Launchkey".to_string();
        generic.family = ControllerFamily::Generic;
        config.devices.insert(0, generic);

        let daw_port = "Launchkey Mini MK3 DAW Port [hw:2,0,1]";
        assert_eq!(config.find_profile(daw_port).map(|p| p.name.as_str()), Some("Launchkey Mini MK3"));
        assert_eq!(
            config.find_profile("Launchkey Mini MK3 MIDI Port").map(|p| p.name.as_str()),
            Some("Any Launchkey")
        );
        assert!(config.find_profile("Launchpad X").is_none());

        assert!(config.devices[1].matches_port("launchkey  mini mk3 daw in 24:1"));
        // An empty pattern never matches
        config.devices[0].port_match = "[hw:0,0]".to_string();
        assert!(!config.devices[0].matches_port("Launchkey"));
    }

    #[test]
    fn test_load_without_valid_profiles_falls_back() {
        let dir = std::env::temp_dir().join(format!("surface-core-invalid-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("surfaces.yaml");
        std::fs::write(
            &path,
            "devices:\n  - name: \"Empty\"\n    port_match: \"empty\"\n    grid:\n      channel: 0\n      columns: 0\n      row_notes: []\n",
        )
        .unwrap();
        assert_eq!(load_surface_config(&path).devices[0].name, "Launchkey Mini MK3");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
