//! Session grid view
//!
//! The pad matrix is a window of tracks (columns) × scenes (rows) over the
//! clip launcher. With a pad mode set, the top row is taken over by per-track
//! toggles (arm, select, mute, solo, stop) and the rows below shift up.
//!
//! ```text
//!            pad mode off            pad mode on
//! row 0   slot row 0             control row (toggles)
//! row 1   slot row 1             slot row 0
//! ```

use crate::colors::{
    PadColor, PadLight, SessionColors, COLOR_SCENE, COLOR_SCENE_OFF, COLOR_SELECTED_SCENE,
};
use crate::daw::{absolute_index, page_item, BankKind, DawModel, SceneCommand, SceneInfo, SlotCommand, SlotInfo, TrackCommand, TrackInfo};
use crate::settings::{RecArmedPadAction, SettingValues};
use crate::surface::{ButtonEvent, ButtonId, GridPosition, GridRow, PadGrid, Surface};
use crate::views::ViewId;
use crate::Context;
use serde::{Deserialize, Serialize};

/// Overlay a pad row can be handed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadMode {
    RecArm,
    TrackSelect,
    Mute,
    Solo,
    StopClip,
}

/// Pad modes in control-row order
pub const PAD_MODES: [PadMode; 5] = [
    PadMode::RecArm,
    PadMode::TrackSelect,
    PadMode::Mute,
    PadMode::Solo,
    PadMode::StopClip,
];

impl PadMode {
    /// Colour of the scene button standing for this mode
    pub fn button_color(self) -> PadColor {
        match self {
            Self::RecArm => PadColor::RedHi,
            Self::TrackSelect => PadColor::White,
            Self::Mute => PadColor::AmberHi,
            Self::Solo => PadColor::YellowHi,
            Self::StopClip => PadColor::Rose,
        }
    }

    /// Control-row colour of a track that exists
    pub fn track_color(self, track: &TrackInfo) -> PadColor {
        let (on, off, active) = match self {
            Self::RecArm => (PadColor::RedHi, PadColor::RedLo, track.rec_arm),
            Self::TrackSelect => (PadColor::White, PadColor::GreyLo, track.selected),
            Self::Mute => (PadColor::AmberHi, PadColor::AmberLo, track.mute),
            Self::Solo => (PadColor::YellowHi, PadColor::YellowLo, track.solo),
            Self::StopClip => (PadColor::Rose, PadColor::Rose, true),
        };
        if active {
            on
        } else {
            off
        }
    }

    /// Colour the mode shows when it is not selected
    pub fn dim_color(self) -> PadColor {
        match self {
            Self::RecArm => PadColor::RedLo,
            Self::TrackSelect => PadColor::GreyLo,
            Self::Mute => PadColor::AmberLo,
            Self::Solo => PadColor::YellowLo,
            Self::StopClip => PadColor::Rose,
        }
    }
}

/// Clip launcher grid
#[derive(Debug, Clone)]
pub struct SessionView {
    grid: PadGrid,
    colors: SessionColors,
    pad_mode: Option<PadMode>,
}

impl SessionView {
    pub fn new(grid: PadGrid) -> Self {
        Self {
            grid,
            colors: SessionColors::default(),
            pad_mode: None,
        }
    }

    pub fn grid(&self) -> &PadGrid {
        &self.grid
    }

    pub fn pad_mode(&self) -> Option<PadMode> {
        self.pad_mode
    }

    pub fn set_pad_mode(&mut self, pad_mode: Option<PadMode>) {
        if self.pad_mode != pad_mode {
            log::debug!("session: Pad mode {:?} -> {:?}", self.pad_mode, pad_mode);
        }
        self.pad_mode = pad_mode;
    }

    /// Logical position of a pad note under the current pad mode
    pub fn pad(&self, note: u8) -> Option<GridPosition> {
        self.grid.position(note, self.pad_mode.is_some())
    }

    /// Pad note of a logical position under the current pad mode
    pub fn note_for(&self, position: GridPosition) -> Option<u8> {
        self.grid.note_for(position, self.pad_mode.is_some())
    }

    /// Number of rows showing clip slots
    pub fn slot_rows(&self) -> usize {
        let taken = usize::from(self.pad_mode.is_some());
        self.grid.rows().saturating_sub(taken)
    }

    /// Light of one slot pad
    pub fn slot_light(&self, track: &TrackInfo, slot: &SlotInfo, draw_record_stripe: bool) -> PadLight {
        if !track.exists || !slot.exists {
            return PadLight::off();
        }
        let rule = if slot.is_recording_queued {
            self.colors.is_recording_queued
        } else if slot.is_recording {
            self.colors.is_recording
        } else if slot.is_playing_queued {
            self.colors.is_playing_queued
        } else if slot.is_playing {
            self.colors.is_playing
        } else if slot.has_content {
            self.colors.has_content
        } else if track.rec_arm && draw_record_stripe {
            self.colors.rec_armed
        } else {
            self.colors.no_content
        };
        rule.light()
    }

    /// Redraw every pad from the document
    ///
    /// Depends only on the document and the pad mode, so two calls without a
    /// change in between write the same lights.
    pub fn draw_grid(&self, daw: &dyn DawModel, settings: &SettingValues, surface: &mut dyn Surface) {
        let control_row = self.pad_mode.is_some();
        let stripe = settings.draw_record_stripe();

        for column in 0..self.grid.columns {
            let track: TrackInfo = page_item(daw, BankKind::Tracks, column);
            for row in 0..self.slot_rows() {
                let slot = match absolute_index(daw, BankKind::Scenes, row) {
                    Some(scene) if track.exists => daw.slot(track.index, scene),
                    _ => SlotInfo::default(),
                };
                if let Some(physical) = self.grid.physical_row(GridRow::Slot(row), control_row) {
                    surface.light_pad(column, physical, self.slot_light(&track, &slot, stripe));
                }
            }

            if let (Some(pad_mode), Some(physical)) = (self.pad_mode, self.grid.physical_row(GridRow::Control, control_row)) {
                let color = if track.exists {
                    pad_mode.track_color(&track)
                } else {
                    PadColor::Black
                };
                surface.light_pad(column, physical, color.into());
            }
        }
    }

    /// Pad message; only the release edge (velocity 0) acts
    pub fn on_grid_note(&self, note: u8, velocity: u8, cx: &mut Context) {
        if velocity != 0 {
            return;
        }
        let Some(position) = self.pad(note) else {
            return;
        };
        match (position.row, self.pad_mode) {
            (GridRow::Slot(row), _) => self.launch_slot(position.column, row, cx),
            (GridRow::Control, Some(pad_mode)) => Self::handle_first_row_modes(pad_mode, position.column, cx),
            (GridRow::Control, None) => {}
        }
    }

    /// Default slot behaviour: record into empty slots of armed tracks,
    /// otherwise (select and) launch
    fn launch_slot(&self, column: usize, row: usize, cx: &mut Context) {
        let track: TrackInfo = page_item(cx.daw, BankKind::Tracks, column);
        if !track.exists {
            return;
        }
        let Some(scene) = absolute_index(cx.daw, BankKind::Scenes, row) else {
            return;
        };
        let slot = cx.daw.slot(track.index, scene);
        if !slot.exists {
            return;
        }

        let values = cx.settings.values();
        if !slot.has_content && track.rec_arm {
            match values.action_for_rec_armed_pad() {
                RecArmedPadAction::StartRecording => cx.daw.slot_command(track.index, scene, SlotCommand::Record),
                RecArmedPadAction::CreateClip => {
                    let length_beats = values.new_clip_length_beats(cx.daw.quarters_per_measure());
                    cx.daw.slot_command(track.index, scene, SlotCommand::CreateClip { length_beats });
                    cx.daw.slot_command(track.index, scene, SlotCommand::Launch);
                }
                RecArmedPadAction::Nothing => {}
            }
            return;
        }

        if values.select_clip_on_launch() {
            cx.daw.slot_command(track.index, scene, SlotCommand::Select);
        }
        cx.daw.slot_command(track.index, scene, SlotCommand::Launch);
    }

    /// Control-row pad released in `column`
    pub fn handle_first_row_modes(pad_mode: PadMode, column: usize, cx: &mut Context) {
        let track: TrackInfo = page_item(cx.daw, BankKind::Tracks, column);
        if !track.exists {
            return;
        }
        let command = match pad_mode {
            PadMode::RecArm => TrackCommand::ToggleRecArm,
            PadMode::TrackSelect => {
                if let Some(bank) = cx.daw.bank_mut(BankKind::Tracks) {
                    bank.select(track.index);
                }
                TrackCommand::Select
            }
            PadMode::Mute => TrackCommand::ToggleMute,
            PadMode::Solo => TrackCommand::ToggleSolo,
            PadMode::StopClip => TrackCommand::Stop,
        };
        cx.daw.track_command(track.index, command);
    }

    /// Pad held past the long-press threshold
    ///
    /// A slot with content stops its track. An empty slot that is not already
    /// recording makes its track the only armed one of the track bank and
    /// starts recording into the slot. Control-row pads do nothing.
    pub fn on_grid_note_long_press(&self, note: u8, cx: &mut Context) -> bool {
        let Some(position) = self.pad(note) else {
            return false;
        };
        let GridRow::Slot(row) = position.row else {
            return false;
        };
        let track: TrackInfo = page_item(cx.daw, BankKind::Tracks, position.column);
        if !track.exists {
            return false;
        }
        let Some(scene) = absolute_index(cx.daw, BankKind::Scenes, row) else {
            return false;
        };
        let slot = cx.daw.slot(track.index, scene);

        if slot.has_content {
            cx.daw.track_command(track.index, TrackCommand::Stop);
            return true;
        }
        if slot.is_recording {
            return false;
        }

        let track_count = cx.daw.bank(BankKind::Tracks).map(|b| b.item_count()).unwrap_or(0);
        for index in (0..track_count).filter(|i| *i != track.index) {
            if cx.daw.track(index).rec_arm {
                cx.daw.track_command(index, TrackCommand::SetRecArm(false));
            }
        }
        cx.daw.track_command(track.index, TrackCommand::SetRecArm(true));
        cx.daw.slot_command(track.index, scene, SlotCommand::Record);
        true
    }

    /// Scene-column button
    ///
    /// Returns the view to switch to, if any. Scene 2 opens the control view
    /// on press; scenes launch on release.
    pub fn on_button(&self, button: ButtonId, event: ButtonEvent, cx: &mut Context) -> Option<ViewId> {
        let index = button.scene_index()?;

        if cx.shift {
            if event != ButtonEvent::Up {
                return None;
            }
            if let Some(scenes) = cx.daw.bank_mut(BankKind::Scenes) {
                if index == 0 {
                    scenes.select_previous_page();
                } else {
                    scenes.select_next_page();
                }
            }
            return None;
        }

        match event {
            ButtonEvent::Down if index == 1 => Some(ViewId::Control),
            ButtonEvent::Up => {
                let scene = absolute_index(cx.daw, BankKind::Scenes, index)?;
                cx.daw.scene_command(scene, SceneCommand::Select);
                cx.daw.scene_command(scene, SceneCommand::Launch);
                None
            }
            _ => None,
        }
    }

    /// Colour of a scene button
    ///
    /// Scene 1 always shows the first scene of the page. Scene 2 shows the
    /// second scene only without a pad mode, the pad mode's colour otherwise.
    pub fn button_color(&self, button: ButtonId, daw: &dyn DawModel) -> PadColor {
        match (button, self.pad_mode) {
            (ButtonId::Scene1, _) => Self::scene_color(&page_item(daw, BankKind::Scenes, 0)),
            (ButtonId::Scene2, None) => Self::scene_color(&page_item(daw, BankKind::Scenes, 1)),
            (ButtonId::Scene2, Some(pad_mode)) => pad_mode.button_color(),
            _ => PadColor::Black,
        }
    }

    fn scene_color(scene: &SceneInfo) -> PadColor {
        match (scene.exists, scene.selected) {
            (false, _) => COLOR_SCENE_OFF,
            (true, true) => COLOR_SELECTED_SCENE,
            (true, false) => COLOR_SCENE,
        }
    }
}
