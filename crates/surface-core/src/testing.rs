//! In-memory host document and surface used by the unit tests

use crate::bank::BankWindow;
use crate::colors::PadLight;
use crate::daw::{
    ApplicationCommand, BankKind, DawModel, ParameterInfo, SceneCommand, SceneInfo, SlotCommand, SlotInfo,
    TrackCommand, TrackInfo, TransportCommand, TransportInfo,
};
use crate::scheduler::Scheduler;
use crate::settings::{register_deactivated_items_handler, Settings};
use crate::surface::{ButtonId, Surface};
use crate::Context;
use std::collections::HashMap;
use std::time::Instant;

pub const TRACK_PAGE: usize = 8;
pub const SCENE_PAGE: usize = 2;

/// Every command the fake received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Track(usize, TrackCommand),
    Slot(usize, usize, SlotCommand),
    Scene(usize, SceneCommand),
    Parameter(BankKind, usize, u8),
    Transport(TransportCommand),
    Application(ApplicationCommand),
}

#[derive(Debug, Clone)]
pub struct FakeDaw {
    pub tracks: Vec<TrackInfo>,
    /// Slots per track, indexed by absolute scene
    pub slots: Vec<Vec<SlotInfo>>,
    pub scenes: Vec<SceneInfo>,
    pub parameters: HashMap<BankKind, Vec<ParameterInfo>>,
    pub banks: HashMap<BankKind, BankWindow>,
    pub cursor: Option<usize>,
    pub transport: TransportInfo,
    pub cursor_clip: bool,
    pub commands: Vec<Command>,
}

impl FakeDaw {
    /// `tracks` instrument tracks with `scenes` empty slots each; no drum pad bank
    pub fn new(tracks: usize, scenes: usize) -> Self {
        let mut banks = HashMap::new();
        banks.insert(BankKind::Tracks, BankWindow::with_items(TRACK_PAGE, tracks));
        banks.insert(BankKind::Scenes, BankWindow::with_items(SCENE_PAGE, scenes));
        for kind in [
            BankKind::UserParameters,
            BankKind::DeviceParameters,
            BankKind::Sends,
            BankKind::EffectTracks,
            BankKind::Devices,
            BankKind::Layers,
        ] {
            banks.insert(kind, BankWindow::new(8));
        }

        let mut daw = Self {
            tracks: Vec::new(),
            slots: Vec::new(),
            scenes: (0..scenes)
                .map(|i| SceneInfo {
                    exists: true,
                    selected: false,
                    name: format!("Scene {}", i + 1),
                })
                .collect(),
            parameters: HashMap::new(),
            banks,
            cursor: None,
            transport: TransportInfo::default(),
            cursor_clip: false,
            commands: Vec::new(),
        };
        for _ in 0..tracks {
            daw.push_track(true, false);
        }
        daw
    }

    pub fn push_track(&mut self, can_hold_notes: bool, can_hold_audio: bool) -> usize {
        let index = self.tracks.len();
        self.tracks.push(TrackInfo {
            exists: true,
            index,
            name: format!("Track {}", index + 1),
            can_hold_notes,
            can_hold_audio,
            pan: 64,
            ..Default::default()
        });
        self.slots.push(vec![Self::empty_slot(); self.scenes.len()]);
        self.sync_track_count();
        index
    }

    fn empty_slot() -> SlotInfo {
        SlotInfo {
            exists: true,
            ..Default::default()
        }
    }

    fn sync_track_count(&mut self) {
        let count = self.tracks.len();
        if let Some(bank) = self.banks.get_mut(&BankKind::Tracks) {
            bank.set_item_count(count);
        }
    }

    pub fn add_parameters(&mut self, kind: BankKind, names: &[&str]) {
        let list = self.parameters.entry(kind).or_default();
        list.extend(names.iter().map(|name| ParameterInfo {
            exists: true,
            name: name.to_string(),
            value: 0,
        }));
        let count = list.len();
        self.banks.entry(kind).or_insert_with(|| BankWindow::new(8)).set_item_count(count);
    }

    pub fn slot_mut(&mut self, track: usize, scene: usize) -> &mut SlotInfo {
        &mut self.slots[track][scene]
    }

    pub fn select_track(&mut self, index: usize) {
        self.track_command(index, TrackCommand::Select);
        self.commands.clear();
    }

    pub fn count(&self, wanted: &Command) -> usize {
        self.commands.iter().filter(|c| *c == wanted).count()
    }

    pub fn received(&self, wanted: &Command) -> bool {
        self.count(wanted) > 0
    }

    pub fn undo_count(&self) -> usize {
        self.count(&Command::Application(ApplicationCommand::Undo))
    }
}

impl DawModel for FakeDaw {
    fn bank(&self, kind: BankKind) -> Option<&BankWindow> {
        self.banks.get(&kind)
    }

    fn bank_mut(&mut self, kind: BankKind) -> Option<&mut BankWindow> {
        self.banks.get_mut(&kind)
    }

    fn track(&self, index: usize) -> TrackInfo {
        self.tracks.get(index).cloned().unwrap_or_default()
    }

    fn cursor_track(&self) -> Option<usize> {
        self.cursor
    }

    fn slot(&self, track: usize, scene: usize) -> SlotInfo {
        self.slots
            .get(track)
            .and_then(|slots| slots.get(scene))
            .cloned()
            .unwrap_or_default()
    }

    fn slot_count(&self, track: usize) -> usize {
        self.slots.get(track).map(Vec::len).unwrap_or(0)
    }

    fn selected_slot(&self, track: usize) -> Option<usize> {
        self.slots.get(track)?.iter().position(|s| s.is_selected)
    }

    fn scene(&self, index: usize) -> SceneInfo {
        self.scenes.get(index).cloned().unwrap_or_default()
    }

    fn parameter(&self, bank: BankKind, index: usize) -> ParameterInfo {
        self.parameters
            .get(&bank)
            .and_then(|list| list.get(index))
            .cloned()
            .unwrap_or_default()
    }

    fn transport(&self) -> TransportInfo {
        self.transport
    }

    fn cursor_clip_exists(&self) -> bool {
        self.cursor_clip
    }

    fn track_command(&mut self, index: usize, command: TrackCommand) {
        self.commands.push(Command::Track(index, command));
        if index >= self.tracks.len() {
            return;
        }
        match command {
            TrackCommand::ToggleRecArm => self.tracks[index].rec_arm = !self.tracks[index].rec_arm,
            TrackCommand::SetRecArm(on) => self.tracks[index].rec_arm = on,
            TrackCommand::ToggleMute => self.tracks[index].mute = !self.tracks[index].mute,
            TrackCommand::ToggleSolo => self.tracks[index].solo = !self.tracks[index].solo,
            TrackCommand::Stop => {
                for slot in &mut self.slots[index] {
                    slot.is_playing = false;
                    slot.is_playing_queued = false;
                    slot.is_recording = false;
                    slot.is_recording_queued = false;
                }
            }
            TrackCommand::Select => {
                for (i, track) in self.tracks.iter_mut().enumerate() {
                    track.selected = i == index;
                }
                self.cursor = Some(index);
            }
            TrackCommand::Duplicate => {
                let mut copy = self.tracks[index].clone();
                copy.selected = false;
                copy.name = format!("{} 2", copy.name);
                self.tracks.insert(index + 1, copy);
                let slots = self.slots[index].clone();
                self.slots.insert(index + 1, slots);
                for (i, track) in self.tracks.iter_mut().enumerate() {
                    track.index = i;
                }
                self.sync_track_count();
            }
            TrackCommand::SetVolume(value) => self.tracks[index].volume = value,
            TrackCommand::SetPan(value) => self.tracks[index].pan = value,
        }
    }

    fn slot_command(&mut self, track: usize, scene: usize, command: SlotCommand) {
        self.commands.push(Command::Slot(track, scene, command));
        let Some(slots) = self.slots.get_mut(track) else {
            return;
        };
        if scene >= slots.len() {
            return;
        }
        match command {
            SlotCommand::Record => {
                slots[scene].is_recording = true;
                slots[scene].has_content = true;
            }
            SlotCommand::Launch => {
                let slot = &mut slots[scene];
                if slot.is_recording {
                    slot.is_recording = false;
                }
                slot.is_playing = slot.has_content;
            }
            SlotCommand::Remove => {
                slots[scene] = SlotInfo {
                    exists: true,
                    is_selected: slots[scene].is_selected,
                    ..Default::default()
                };
            }
            SlotCommand::Select => {
                for (i, slot) in slots.iter_mut().enumerate() {
                    slot.is_selected = i == scene;
                }
            }
            SlotCommand::CreateClip { .. } => slots[scene].has_content = true,
        }
    }

    fn scene_command(&mut self, index: usize, command: SceneCommand) {
        self.commands.push(Command::Scene(index, command));
        if command == SceneCommand::Select {
            for (i, scene) in self.scenes.iter_mut().enumerate() {
                scene.selected = i == index;
            }
        }
    }

    fn set_parameter(&mut self, bank: BankKind, index: usize, value: u8) {
        self.commands.push(Command::Parameter(bank, index, value));
        if let Some(parameter) = self.parameters.get_mut(&bank).and_then(|list| list.get_mut(index)) {
            parameter.value = value;
        }
    }

    fn transport_command(&mut self, command: TransportCommand) {
        self.commands.push(Command::Transport(command));
        match command {
            TransportCommand::Play => self.transport.playing = true,
            TransportCommand::Stop(_) => self.transport.playing = false,
            TransportCommand::ToggleRecord => self.transport.recording = !self.transport.recording,
            TransportCommand::SetLauncherOverdub(on) => self.transport.launcher_overdub = on,
            TransportCommand::ToggleLauncherOverdub => {
                self.transport.launcher_overdub = !self.transport.launcher_overdub
            }
            TransportCommand::TapTempo => {}
            TransportCommand::StopAllClips => {
                for slot in self.slots.iter_mut().flatten() {
                    slot.is_playing = false;
                }
            }
        }
    }

    fn application_command(&mut self, command: ApplicationCommand) {
        self.commands.push(Command::Application(command));
    }
}

/// Surface that records every write
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub pads: Vec<(usize, usize, PadLight)>,
    pub buttons: Vec<(ButtonId, u8)>,
    pub notifications: Vec<String>,
}

impl RecordingSurface {
    /// Last light written to a pad
    pub fn pad(&self, column: usize, row: usize) -> Option<PadLight> {
        self.pads
            .iter()
            .rev()
            .find(|(c, r, _)| *c == column && *r == row)
            .map(|(_, _, light)| *light)
    }

    pub fn clear(&mut self) {
        self.pads.clear();
        self.buttons.clear();
        self.notifications.clear();
    }
}

impl Surface for RecordingSurface {
    fn light_pad(&mut self, column: usize, row: usize, light: PadLight) {
        self.pads.push((column, row, light));
    }

    fn set_button_light(&mut self, button: ButtonId, color: u8) {
        self.buttons.push((button, color));
    }

    fn notify(&mut self, text: &str) {
        self.notifications.push(text.to_string());
    }
}

/// Everything a handler needs, owned in one place
pub struct Harness {
    pub daw: FakeDaw,
    pub surface: RecordingSurface,
    pub settings: Settings,
    pub scheduler: Scheduler,
    pub shift: bool,
}

impl Harness {
    pub fn new(tracks: usize, scenes: usize) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut settings = Settings::new();
        register_deactivated_items_handler(&mut settings);
        Self {
            daw: FakeDaw::new(tracks, scenes),
            surface: RecordingSurface::default(),
            settings,
            scheduler: Scheduler::new(),
            shift: false,
        }
    }

    pub fn cx(&mut self, now: Instant) -> Context<'_> {
        Context {
            daw: &mut self.daw,
            surface: &mut self.surface,
            settings: &mut self.settings,
            scheduler: &mut self.scheduler,
            shift: self.shift,
            now,
        }
    }
}
