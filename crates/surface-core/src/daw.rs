//! Boundary to the host DAW object model
//!
//! The DAW document (tracks, clip slots, scenes, parameters, transport) is
//! owned by the host. The surface only reads snapshots and issues commands.
//! All content queries take **absolute** indices; page-relative lookups go
//! through the [`BankWindow`] of the matching [`BankKind`].
//!
//! Snapshots default to "does not exist", which is what every lookup outside
//! the live document resolves to.

use crate::bank::BankWindow;
use serde::{Deserialize, Serialize};

/// Which paged collection of the document a window looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankKind {
    /// Current track bank (audio, instrument and group tracks)
    Tracks,
    /// Scene bank; also the vertical window of every track's slot bank
    Scenes,
    /// Host-wide user-mappable parameters
    UserParameters,
    /// Parameters of the cursor device
    DeviceParameters,
    /// Sends of the tracks in the current page
    Sends,
    /// Effect (return) tracks
    EffectTracks,
    /// Devices of the cursor track
    Devices,
    /// Layers of the cursor device
    Layers,
    /// Drum pads of the cursor device
    DrumPads,
}

/// Snapshot of a track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackInfo {
    pub exists: bool,
    /// Absolute position in the track bank
    pub index: usize,
    pub name: String,
    pub rec_arm: bool,
    pub mute: bool,
    pub solo: bool,
    pub selected: bool,
    /// Instrument/hybrid tracks accept notes
    pub can_hold_notes: bool,
    /// Audio/hybrid tracks accept audio
    pub can_hold_audio: bool,
    /// Volume (0-127)
    pub volume: u8,
    /// Panorama (0-127, 64 = centre)
    pub pan: u8,
}

/// Snapshot of a clip slot at (track, scene)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotInfo {
    pub exists: bool,
    pub has_content: bool,
    pub is_recording: bool,
    pub is_recording_queued: bool,
    pub is_playing: bool,
    pub is_playing_queued: bool,
    pub is_selected: bool,
}

/// Snapshot of a scene
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneInfo {
    pub exists: bool,
    pub selected: bool,
    pub name: String,
}

/// Snapshot of a mappable parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterInfo {
    pub exists: bool,
    pub name: String,
    /// Value (0-127)
    pub value: u8,
}

/// Transport state relevant to the surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportInfo {
    pub playing: bool,
    pub recording: bool,
    pub launcher_overdub: bool,
}

/// Commands on a single track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackCommand {
    ToggleRecArm,
    SetRecArm(bool),
    ToggleMute,
    ToggleSolo,
    /// Stop whatever plays on the track
    Stop,
    /// Make the track the cursor track
    Select,
    /// Insert a copy directly after the track
    Duplicate,
    SetVolume(u8),
    SetPan(u8),
}

/// Commands on a clip slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotCommand {
    Record,
    Launch,
    /// Delete the clip held by the slot
    Remove,
    Select,
    /// Create an empty clip of the given length
    CreateClip { length_beats: u32 },
}

/// Commands on a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    Select,
    Launch,
}

/// What the transport does when playback is stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopBehaviour {
    /// Keep the play cursor where playback stopped
    #[default]
    MovePlayCursor,
    /// Move the play cursor back to the start
    ReturnToZero,
    /// Only pause
    Pause,
}

/// Transport commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCommand {
    Play,
    Stop(StopBehaviour),
    ToggleRecord,
    SetLauncherOverdub(bool),
    ToggleLauncherOverdub,
    TapTempo,
    /// Stop every clip of the current track bank
    StopAllClips,
}

/// Panel layouts the host window can switch to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelLayout {
    Arrange,
    Mix,
    Edit,
}

/// Application-level commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplicationCommand {
    Undo,
    SetPanelLayout(PanelLayout),
    AddInstrumentTrack,
    AddAudioTrack,
    AddEffectTrack,
    /// Quantize the cursor clip by the given amount (0.0-1.0)
    QuantizeCursorClip(f64),
}

/// Read/command interface of the host document
///
/// Implemented by the host adapter. The surface never caches anything it
/// reads through this trait; every redraw queries it again.
pub trait DawModel {
    /// Window over a paged collection, `None` if the host lacks it
    fn bank(&self, kind: BankKind) -> Option<&BankWindow>;
    fn bank_mut(&mut self, kind: BankKind) -> Option<&mut BankWindow>;

    fn track(&self, index: usize) -> TrackInfo;
    /// Absolute index of the cursor (selected) track
    fn cursor_track(&self) -> Option<usize>;
    fn slot(&self, track: usize, scene: usize) -> SlotInfo;
    /// Number of slots the track holds over its full range
    fn slot_count(&self, track: usize) -> usize;
    /// Absolute scene index of the selected slot of a track
    fn selected_slot(&self, track: usize) -> Option<usize>;
    fn scene(&self, index: usize) -> SceneInfo;
    fn parameter(&self, bank: BankKind, index: usize) -> ParameterInfo;
    fn transport(&self) -> TransportInfo;
    fn cursor_clip_exists(&self) -> bool;
    /// Beats per bar of the current time signature
    fn quarters_per_measure(&self) -> u32 {
        4
    }

    fn track_command(&mut self, index: usize, command: TrackCommand);
    fn slot_command(&mut self, track: usize, scene: usize, command: SlotCommand);
    fn scene_command(&mut self, index: usize, command: SceneCommand);
    fn set_parameter(&mut self, bank: BankKind, index: usize, value: u8);
    fn transport_command(&mut self, command: TransportCommand);
    fn application_command(&mut self, command: ApplicationCommand);
}

/// Item type that can be looked up through a bank window
pub trait BankItem: Default {
    fn fetch(daw: &dyn DawModel, kind: BankKind, index: usize) -> Self;
}

impl BankItem for TrackInfo {
    fn fetch(daw: &dyn DawModel, _kind: BankKind, index: usize) -> Self {
        daw.track(index)
    }
}

impl BankItem for SceneInfo {
    fn fetch(daw: &dyn DawModel, _kind: BankKind, index: usize) -> Self {
        daw.scene(index)
    }
}

impl BankItem for ParameterInfo {
    fn fetch(daw: &dyn DawModel, kind: BankKind, index: usize) -> Self {
        daw.parameter(kind, index)
    }
}

/// Absolute index behind a page-relative one
pub fn absolute_index(daw: &dyn DawModel, kind: BankKind, page_index: usize) -> Option<usize> {
    daw.bank(kind).and_then(|bank| bank.absolute_index(page_index))
}

/// Page-relative lookup; anything outside the live document is the default
/// (non-existent) snapshot
pub fn page_item<T: BankItem>(daw: &dyn DawModel, kind: BankKind, page_index: usize) -> T {
    absolute_index(daw, kind, page_index)
        .map(|index| T::fetch(daw, kind, index))
        .unwrap_or_default()
}

/// Scroll position of a bank, 0 when the host has none
pub fn scroll_position(daw: &dyn DawModel, kind: BankKind) -> usize {
    daw.bank(kind).map(BankWindow::scroll_position).unwrap_or(0)
}
