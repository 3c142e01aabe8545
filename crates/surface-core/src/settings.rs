//! Observable controller settings
//!
//! Every setting has a stable [`SettingId`], a typed domain (enum options,
//! integer range or short text) and a default. Values change only through the
//! setters of [`Settings`], which store the value and then synchronously call
//! every observer registered for that id, and only for that id.
//!
//! Observers receive the current values and a mutable context (the DAW model
//! in a running controller), so a handler can push a setting into other parts
//! of the document; see [`register_deactivated_items_handler`].

use crate::daw::{BankKind, DawModel, StopBehaviour};
use std::collections::HashMap;

/// Number of user parameter pages that can be named
pub const USER_PAGE_COUNT: usize = 8;

pub const ON_OFF_OPTIONS: &[&str] = &["Off", "On"];

pub const BEHAVIOUR_ON_STOP_VALUES: &[&str] = &["Move play cursor", "Return to Zero", "Pause"];

pub const ACTIONS_REC_ARMED_PADS: &[&str] = &["Start recording", "Create new clip", "Do nothing"];

pub const NEW_CLIP_LENGTH_VALUES: &[&str] = &[
    "1 Beat", "2 Beat", "1 Bar", "2 Bars", "4 Bars", "8 Bars", "16 Bars", "32 Bars",
];

pub const FOOTSWITCH_VALUES: &[&str] = &[
    "Toggle Play",
    "Toggle Record",
    "Stop All Clips",
    "Toggle Clip Overdub",
    "Undo",
    "Tap Tempo",
    "New Button",
    "Clip Based Looper",
    "Panel layout arrange",
    "Panel layout mix",
    "Panel layout edit",
    "Add instrument track",
    "Add audio track",
    "Add effect track",
    "Quantize",
    "Looper Custom",
];

pub const ARPEGGIATOR_MODES: &[&str] = &[
    "All",
    "Up",
    "Up/Down",
    "Up then Down",
    "Down",
    "Down/Up",
    "Down then Up",
    "Flow",
    "Random",
    "Converge Up",
    "Converge Down",
    "Diverge Up",
    "Diverge Down",
    "Thumb Up",
    "Thumb Down",
    "Pinky Up",
    "Pinky Down",
];

pub const NOTE_REPEAT_OCTAVES: &[&str] = &["0", "1", "2", "3", "4", "5", "6", "7", "8"];

/// Note-repeat period/length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Whole,
    Half,
    Quarter,
    QuarterTriplet,
    Eighth,
    EighthTriplet,
    Sixteenth,
    SixteenthTriplet,
    ThirtySecond,
    ThirtySecondTriplet,
}

impl Resolution {
    pub const ALL: [Resolution; 10] = [
        Self::Whole,
        Self::Half,
        Self::Quarter,
        Self::QuarterTriplet,
        Self::Eighth,
        Self::EighthTriplet,
        Self::Sixteenth,
        Self::SixteenthTriplet,
        Self::ThirtySecond,
        Self::ThirtySecondTriplet,
    ];

    pub const NAMES: &'static [&'static str] = &[
        "1/1", "1/2", "1/4", "1/4t", "1/8", "1/8t", "1/16", "1/16t", "1/32", "1/32t",
    ];

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Length in quarter notes
    pub fn beats(self) -> f64 {
        match self {
            Self::Whole => 4.0,
            Self::Half => 2.0,
            Self::Quarter => 1.0,
            Self::QuarterTriplet => 2.0 / 3.0,
            Self::Eighth => 0.5,
            Self::EighthTriplet => 1.0 / 3.0,
            Self::Sixteenth => 0.25,
            Self::SixteenthTriplet => 1.0 / 6.0,
            Self::ThirtySecond => 0.125,
            Self::ThirtySecondTriplet => 1.0 / 12.0,
        }
    }
}

/// What pressing an empty pad of a rec-armed track does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecArmedPadAction {
    StartRecording,
    CreateClip,
    Nothing,
}

/// Identity of a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingId {
    BehaviourOnStop,
    SelectClipOnLaunch,
    DrawRecordStripe,
    ActionForRecArmedPad,
    QuantizeAmount,
    NewClipLength,
    Footswitch2,
    KnobSensitivityDefault,
    KnobSensitivitySlow,
    NoteRepeatActive,
    NoteRepeatPeriod,
    NoteRepeatLength,
    NoteRepeatMode,
    NoteRepeatOctave,
    ExcludeDeactivatedItems,
    /// Name of user parameter page N (0-based)
    UserPageName(usize),
}

/// Domain and default of a setting
#[derive(Debug, Clone, PartialEq)]
pub enum SettingKind {
    Enum {
        options: &'static [&'static str],
        default: usize,
    },
    Integer {
        min: i32,
        max: i32,
        default: i32,
    },
    Text {
        max_len: usize,
        default: String,
    },
}

impl SettingId {
    /// Every setting, user pages included
    pub fn all() -> Vec<SettingId> {
        let mut ids = vec![
            Self::BehaviourOnStop,
            Self::SelectClipOnLaunch,
            Self::DrawRecordStripe,
            Self::ActionForRecArmedPad,
            Self::QuantizeAmount,
            Self::NewClipLength,
            Self::Footswitch2,
            Self::KnobSensitivityDefault,
            Self::KnobSensitivitySlow,
            Self::NoteRepeatActive,
            Self::NoteRepeatPeriod,
            Self::NoteRepeatLength,
            Self::NoteRepeatMode,
            Self::NoteRepeatOctave,
            Self::ExcludeDeactivatedItems,
        ];
        ids.extend((0..USER_PAGE_COUNT).map(Self::UserPageName));
        ids
    }

    /// Key used in controller profiles (snake_case)
    pub fn key(self) -> String {
        let key = match self {
            Self::BehaviourOnStop => "behaviour_on_stop",
            Self::SelectClipOnLaunch => "select_clip_on_launch",
            Self::DrawRecordStripe => "draw_record_stripe",
            Self::ActionForRecArmedPad => "action_for_rec_armed_pad",
            Self::QuantizeAmount => "quantize_amount",
            Self::NewClipLength => "new_clip_length",
            Self::Footswitch2 => "footswitch_2",
            Self::KnobSensitivityDefault => "knob_sensitivity_default",
            Self::KnobSensitivitySlow => "knob_sensitivity_slow",
            Self::NoteRepeatActive => "note_repeat_active",
            Self::NoteRepeatPeriod => "note_repeat_period",
            Self::NoteRepeatLength => "note_repeat_length",
            Self::NoteRepeatMode => "note_repeat_mode",
            Self::NoteRepeatOctave => "note_repeat_octave",
            Self::ExcludeDeactivatedItems => "exclude_deactivated_items",
            Self::UserPageName(page) => return format!("user_page_{}", page + 1),
        };
        key.to_string()
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().into_iter().find(|id| id.key() == key)
    }

    pub fn kind(self) -> SettingKind {
        use SettingKind::*;
        match self {
            Self::BehaviourOnStop => Enum { options: BEHAVIOUR_ON_STOP_VALUES, default: 0 },
            Self::SelectClipOnLaunch => Enum { options: ON_OFF_OPTIONS, default: 0 },
            Self::DrawRecordStripe => Enum { options: ON_OFF_OPTIONS, default: 1 },
            Self::ActionForRecArmedPad => Enum { options: ACTIONS_REC_ARMED_PADS, default: 0 },
            Self::QuantizeAmount => Integer { min: 1, max: 100, default: 100 },
            Self::NewClipLength => Enum { options: NEW_CLIP_LENGTH_VALUES, default: 2 },
            Self::Footswitch2 => Enum { options: FOOTSWITCH_VALUES, default: 6 },
            Self::KnobSensitivityDefault => Integer { min: -100, max: 100, default: 0 },
            Self::KnobSensitivitySlow => Integer { min: -100, max: 100, default: -40 },
            Self::NoteRepeatActive => Enum { options: ON_OFF_OPTIONS, default: 0 },
            Self::NoteRepeatPeriod | Self::NoteRepeatLength => Enum {
                options: Resolution::NAMES,
                default: 4,
            },
            Self::NoteRepeatMode => Enum { options: ARPEGGIATOR_MODES, default: 1 },
            Self::NoteRepeatOctave => Enum { options: NOTE_REPEAT_OCTAVES, default: 0 },
            Self::ExcludeDeactivatedItems => Enum { options: ON_OFF_OPTIONS, default: 0 },
            Self::UserPageName(page) => Text {
                max_len: 10,
                default: format!("Page {}", page + 1),
            },
        }
    }
}

/// Stored value of a setting
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// Index into the option list
    Enum(usize),
    Integer(i32),
    Text(String),
}

impl SettingKind {
    fn default_value(&self) -> SettingValue {
        match self {
            Self::Enum { default, .. } => SettingValue::Enum(*default),
            Self::Integer { default, .. } => SettingValue::Integer(*default),
            Self::Text { default, .. } => SettingValue::Text(default.clone()),
        }
    }
}

/// Setting errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("'{value}' is not an option of {setting:?}")]
    UnknownOption { setting: SettingId, value: String },

    #[error("Option index {index} out of range for {setting:?}")]
    IndexOutOfRange { setting: SettingId, index: usize },

    #[error("{setting:?} does not take a {expected} value")]
    WrongKind {
        setting: SettingId,
        expected: &'static str,
    },
}

/// Current value of every setting
#[derive(Debug, Clone, PartialEq)]
pub struct SettingValues {
    values: HashMap<SettingId, SettingValue>,
}

impl Default for SettingValues {
    fn default() -> Self {
        let values = SettingId::all()
            .into_iter()
            .map(|id| (id, id.kind().default_value()))
            .collect();
        Self { values }
    }
}

impl SettingValues {
    pub fn get(&self, id: SettingId) -> Option<&SettingValue> {
        self.values.get(&id)
    }

    fn enum_index(&self, id: SettingId) -> usize {
        match self.values.get(&id) {
            Some(SettingValue::Enum(index)) => *index,
            _ => 0,
        }
    }

    fn integer(&self, id: SettingId) -> i32 {
        match self.values.get(&id) {
            Some(SettingValue::Integer(value)) => *value,
            _ => 0,
        }
    }

    fn is_on(&self, id: SettingId) -> bool {
        self.enum_index(id) == 1
    }

    /// Selected option name of an enum setting
    pub fn option_name(&self, id: SettingId) -> Option<&'static str> {
        match id.kind() {
            SettingKind::Enum { options, .. } => options.get(self.enum_index(id)).copied(),
            _ => None,
        }
    }

    pub fn behaviour_on_stop(&self) -> StopBehaviour {
        match self.enum_index(SettingId::BehaviourOnStop) {
            1 => StopBehaviour::ReturnToZero,
            2 => StopBehaviour::Pause,
            _ => StopBehaviour::MovePlayCursor,
        }
    }

    pub fn select_clip_on_launch(&self) -> bool {
        self.is_on(SettingId::SelectClipOnLaunch)
    }

    pub fn draw_record_stripe(&self) -> bool {
        self.is_on(SettingId::DrawRecordStripe)
    }

    pub fn action_for_rec_armed_pad(&self) -> RecArmedPadAction {
        match self.enum_index(SettingId::ActionForRecArmedPad) {
            1 => RecArmedPadAction::CreateClip,
            2 => RecArmedPadAction::Nothing,
            _ => RecArmedPadAction::StartRecording,
        }
    }

    /// Quantize amount in percent (1-100)
    pub fn quantize_amount(&self) -> i32 {
        self.integer(SettingId::QuantizeAmount)
    }

    /// Index into [`NEW_CLIP_LENGTH_VALUES`]
    pub fn new_clip_length(&self) -> usize {
        self.enum_index(SettingId::NewClipLength)
    }

    /// New clip length in beats: 1 and 2 beats, then bars of
    /// `quarters_per_measure` beats doubling up to 32 bars
    pub fn new_clip_length_beats(&self, quarters_per_measure: u32) -> u32 {
        let index = self.new_clip_length() as u32;
        if index < 2 {
            1 << index
        } else {
            (1 << (index - 2)) * quarters_per_measure
        }
    }

    /// Raw footswitch function index into [`FOOTSWITCH_VALUES`]
    pub fn footswitch(&self) -> usize {
        self.enum_index(SettingId::Footswitch2)
    }

    pub fn knob_sensitivity_default(&self) -> i32 {
        self.integer(SettingId::KnobSensitivityDefault)
    }

    pub fn knob_sensitivity_slow(&self) -> i32 {
        self.integer(SettingId::KnobSensitivitySlow)
    }

    pub fn note_repeat_active(&self) -> bool {
        self.is_on(SettingId::NoteRepeatActive)
    }

    pub fn note_repeat_period(&self) -> Resolution {
        Resolution::ALL[self.enum_index(SettingId::NoteRepeatPeriod).min(Resolution::ALL.len() - 1)]
    }

    pub fn note_repeat_length(&self) -> Resolution {
        Resolution::ALL[self.enum_index(SettingId::NoteRepeatLength).min(Resolution::ALL.len() - 1)]
    }

    pub fn note_repeat_mode(&self) -> &'static str {
        ARPEGGIATOR_MODES[self.enum_index(SettingId::NoteRepeatMode).min(ARPEGGIATOR_MODES.len() - 1)]
    }

    pub fn note_repeat_octave(&self) -> u32 {
        self.enum_index(SettingId::NoteRepeatOctave) as u32
    }

    pub fn deactivated_items_excluded(&self) -> bool {
        self.is_on(SettingId::ExcludeDeactivatedItems)
    }

    pub fn user_page_name(&self, page: usize) -> String {
        match self.values.get(&SettingId::UserPageName(page)) {
            Some(SettingValue::Text(name)) => name.clone(),
            _ => format!("Page {}", page + 1),
        }
    }
}

/// Callback invoked after a setting changed
pub type SettingObserver<C> = Box<dyn FnMut(&SettingValues, &mut C)>;

/// Setting values plus observers keyed by setting id
///
/// `C` is the context handed to observers; a running controller uses the DAW
/// model.
pub struct Settings<C: ?Sized = dyn DawModel> {
    values: SettingValues,
    observers: HashMap<SettingId, Vec<SettingObserver<C>>>,
}

impl<C: ?Sized> Default for Settings<C> {
    fn default() -> Self {
        Self {
            values: SettingValues::default(),
            observers: HashMap::new(),
        }
    }
}

impl<C: ?Sized> std::fmt::Debug for Settings<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("values", &self.values)
            .field("observed", &self.observers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<C: ?Sized> Settings<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &SettingValues {
        &self.values
    }

    /// Register an observer for one setting
    pub fn add_observer(&mut self, id: SettingId, observer: SettingObserver<C>) {
        self.observers.entry(id).or_default().push(observer);
    }

    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    /// Call every observer of `id` in registration order
    pub fn notify_observers(&mut self, id: SettingId, cx: &mut C) {
        if let Some(observers) = self.observers.get_mut(&id) {
            for observer in observers.iter_mut() {
                observer(&self.values, cx);
            }
        }
    }

    fn store(&mut self, id: SettingId, value: SettingValue, cx: &mut C) {
        log::debug!("settings: {} = {:?}", id.key(), value);
        self.values.values.insert(id, value);
        self.notify_observers(id, cx);
    }

    /// Set an enum setting by option name
    pub fn set_option(&mut self, id: SettingId, option: &str, cx: &mut C) -> Result<(), SettingsError> {
        let SettingKind::Enum { options, .. } = id.kind() else {
            return Err(SettingsError::WrongKind { setting: id, expected: "option" });
        };
        let index = options
            .iter()
            .position(|o| o.eq_ignore_ascii_case(option))
            .ok_or_else(|| SettingsError::UnknownOption {
                setting: id,
                value: option.to_string(),
            })?;
        self.store(id, SettingValue::Enum(index), cx);
        Ok(())
    }

    /// Set an enum setting by option index
    pub fn set_option_index(&mut self, id: SettingId, index: usize, cx: &mut C) -> Result<(), SettingsError> {
        let SettingKind::Enum { options, .. } = id.kind() else {
            return Err(SettingsError::WrongKind { setting: id, expected: "option" });
        };
        if index >= options.len() {
            return Err(SettingsError::IndexOutOfRange { setting: id, index });
        }
        self.store(id, SettingValue::Enum(index), cx);
        Ok(())
    }

    /// Set an on/off setting
    pub fn set_on_off(&mut self, id: SettingId, on: bool, cx: &mut C) -> Result<(), SettingsError> {
        self.set_option(id, ON_OFF_OPTIONS[on as usize], cx)
    }

    /// Set an integer setting, clamped to its range
    pub fn set_integer(&mut self, id: SettingId, value: i32, cx: &mut C) -> Result<(), SettingsError> {
        let SettingKind::Integer { min, max, .. } = id.kind() else {
            return Err(SettingsError::WrongKind { setting: id, expected: "integer" });
        };
        self.store(id, SettingValue::Integer(value.clamp(min, max)), cx);
        Ok(())
    }

    /// Set a text setting, truncated to its maximum length
    pub fn set_text(&mut self, id: SettingId, text: &str, cx: &mut C) -> Result<(), SettingsError> {
        let SettingKind::Text { max_len, .. } = id.kind() else {
            return Err(SettingsError::WrongKind { setting: id, expected: "text" });
        };
        let text: String = text.chars().take(max_len).collect();
        self.store(id, SettingValue::Text(text), cx);
        Ok(())
    }

    /// Apply a value from a controller profile
    ///
    /// Enum settings accept an option name or index, integer settings a
    /// number, text settings a string.
    pub fn apply_yaml(&mut self, key: &str, value: &serde_yaml::Value, cx: &mut C) -> Result<(), SettingsError> {
        let id = SettingId::from_key(key).ok_or_else(|| SettingsError::UnknownSetting(key.to_string()))?;
        match (id.kind(), value) {
            (SettingKind::Enum { .. }, serde_yaml::Value::String(option)) => self.set_option(id, option, cx),
            (SettingKind::Enum { .. }, serde_yaml::Value::Bool(on)) => self.set_on_off(id, *on, cx),
            (SettingKind::Enum { .. }, serde_yaml::Value::Number(n)) => {
                let index = n.as_u64().unwrap_or(u64::MAX) as usize;
                self.set_option_index(id, index, cx)
            }
            (SettingKind::Integer { .. }, serde_yaml::Value::Number(n)) => {
                let value = n.as_i64().unwrap_or(0).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
                self.set_integer(id, value, cx)
            }
            (SettingKind::Text { .. }, serde_yaml::Value::String(text)) => self.set_text(id, text, cx),
            (SettingKind::Enum { .. }, _) => Err(SettingsError::WrongKind { setting: id, expected: "option" }),
            (SettingKind::Integer { .. }, _) => Err(SettingsError::WrongKind { setting: id, expected: "integer" }),
            (SettingKind::Text { .. }, _) => Err(SettingsError::WrongKind { setting: id, expected: "text" }),
        }
    }

    pub fn toggle_note_repeat_active(&mut self, cx: &mut C) {
        let active = self.values.note_repeat_active();
        if let Err(e) = self.set_on_off(SettingId::NoteRepeatActive, !active, cx) {
            log::warn!("settings: Failed to toggle note repeat: {}", e);
        }
    }

    /// Change the quantize amount by a relative knob delta
    pub fn change_quantize_amount(&mut self, delta: i32, cx: &mut C) {
        let value = self.values.quantize_amount() + delta;
        if let Err(e) = self.set_integer(SettingId::QuantizeAmount, value, cx) {
            log::warn!("settings: Failed to change quantize amount: {}", e);
        }
    }

    pub fn reset_quantize_amount(&mut self, cx: &mut C) {
        if let Err(e) = self.set_integer(SettingId::QuantizeAmount, 100, cx) {
            log::warn!("settings: Failed to reset quantize amount: {}", e);
        }
    }

    /// Arpeggiator mode after the current one, wrapping around
    pub fn next_arpeggiator_mode(&self) -> &'static str {
        let index = self.values.enum_index(SettingId::NoteRepeatMode) + 1;
        ARPEGGIATOR_MODES[index % ARPEGGIATOR_MODES.len()]
    }

    /// Arpeggiator mode before the current one, wrapping around
    pub fn previous_arpeggiator_mode(&self) -> &'static str {
        let index = self.values.enum_index(SettingId::NoteRepeatMode);
        ARPEGGIATOR_MODES[(index + ARPEGGIATOR_MODES.len() - 1) % ARPEGGIATOR_MODES.len()]
    }
}

/// Banks that hide deactivated items when the setting is on
const DEACTIVATABLE_BANKS: [BankKind; 6] = [
    BankKind::Tracks,
    BankKind::Sends,
    BankKind::EffectTracks,
    BankKind::Devices,
    BankKind::Layers,
    BankKind::DrumPads,
];

/// Push "exclude deactivated items" into every bank that supports it
pub fn register_deactivated_items_handler(settings: &mut Settings) {
    settings.add_observer(
        SettingId::ExcludeDeactivatedItems,
        Box::new(|values: &SettingValues, daw: &mut (dyn DawModel + 'static)| {
            let exclude = values.deactivated_items_excluded();
            for kind in DEACTIVATABLE_BANKS {
                if let Some(bank) = daw.bank_mut(kind) {
                    bank.set_skip_disabled(exclude);
                }
            }
        }),
    );
}
