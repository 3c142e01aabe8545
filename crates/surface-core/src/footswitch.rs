//! Footswitch functions and the pedal looper
//!
//! The "Footswitch 2" setting picks what the pedal does. Most options forward
//! to a button command or fire a single action on press. "Looper Custom" is a
//! state machine driven by how long the pedal was held:
//!
//! ```text
//!           press               release after Δ
//! Idle ──────────────> Held ─────────────────────> Idle
//!                               Δ < 800 ms            record / loop / overdub
//!                               800 ms ≤ Δ ≤ 2400 ms  delete bad take or undo
//!                               Δ > 2400 ms           empty armed clone of the track
//! ```

use crate::commands;
use crate::daw::{ApplicationCommand, BankKind, PanelLayout, SlotCommand, TrackCommand, TrackInfo, TransportCommand};
use crate::surface::{ButtonEvent, ButtonId};
use crate::Context;
use std::time::{Duration, Instant};

/// Shortest hold that counts as a long press
pub const LONG_PRESS: Duration = Duration::from_millis(800);
/// Longest hold that still counts as a long press
pub const VERY_LONG_PRESS: Duration = Duration::from_millis(2400);

const SELECT_TRACK_FIRST: &str = "Please select an Instrument track first.";

/// Behaviours selectable by the footswitch setting, in option order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FootswitchFunction {
    TogglePlay,
    ToggleRecord,
    StopAllClips,
    ToggleClipOverdub,
    Undo,
    TapTempo,
    NewButton,
    ClipBasedLooper,
    PanelLayoutArrange,
    PanelLayoutMix,
    PanelLayoutEdit,
    AddInstrumentTrack,
    AddAudioTrack,
    AddEffectTrack,
    Quantize,
    LooperCustom,
}

impl FootswitchFunction {
    const ALL: [FootswitchFunction; 16] = [
        Self::TogglePlay,
        Self::ToggleRecord,
        Self::StopAllClips,
        Self::ToggleClipOverdub,
        Self::Undo,
        Self::TapTempo,
        Self::NewButton,
        Self::ClipBasedLooper,
        Self::PanelLayoutArrange,
        Self::PanelLayoutMix,
        Self::PanelLayoutEdit,
        Self::AddInstrumentTrack,
        Self::AddAudioTrack,
        Self::AddEffectTrack,
        Self::Quantize,
        Self::LooperCustom,
    ];

    /// Function at a setting option index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Button a forwarding function stands in for
    fn forwarded_button(self) -> Option<ButtonId> {
        match self {
            Self::TogglePlay => Some(ButtonId::Play),
            Self::ToggleRecord => Some(ButtonId::Record),
            Self::Undo => Some(ButtonId::Undo),
            Self::TapTempo => Some(ButtonId::TapTempo),
            Self::NewButton => Some(ButtonId::New),
            _ => None,
        }
    }
}

/// Duration band of a looper press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressBand {
    Short,
    Long,
    VeryLong,
}

/// Classify a hold time: `< 800 ms` short, `800..=2400 ms` long, longer is
/// very long
pub fn press_band(held: Duration) -> PressBand {
    if held < LONG_PRESS {
        PressBand::Short
    } else if held <= VERY_LONG_PRESS {
        PressBand::Long
    } else {
        PressBand::VeryLong
    }
}

/// Pedal state between press and release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LooperState {
    #[default]
    Idle,
    Held {
        since: Instant,
    },
}

/// One physical footswitch
#[derive(Debug, Clone, Default)]
pub struct Footswitch {
    state: LooperState,
}

impl Footswitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LooperState {
        self.state
    }

    /// Pedal event, dispatched on the current footswitch setting
    pub fn handle(&mut self, event: ButtonEvent, cx: &mut Context) {
        let index = cx.settings.values().footswitch();
        self.handle_index(index, event, cx);
    }

    /// Pedal event for an explicit setting option index
    pub fn handle_index(&mut self, index: usize, event: ButtonEvent, cx: &mut Context) {
        match FootswitchFunction::from_index(index) {
            Some(function) => self.handle_function(function, event, cx),
            None => log::error!("Unknown footswitch command called: {}", index),
        }
    }

    pub fn handle_function(&mut self, function: FootswitchFunction, event: ButtonEvent, cx: &mut Context) {
        if let Some(button) = function.forwarded_button() {
            commands::execute(button, event, cx);
            return;
        }
        match function {
            FootswitchFunction::ClipBasedLooper => return Self::clip_looper(event, cx),
            FootswitchFunction::LooperCustom => return self.looper_custom(event, cx),
            _ => {}
        }
        if event != ButtonEvent::Down {
            return;
        }

        match function {
            FootswitchFunction::StopAllClips => cx.daw.transport_command(TransportCommand::StopAllClips),
            FootswitchFunction::ToggleClipOverdub => cx.daw.transport_command(TransportCommand::ToggleLauncherOverdub),
            FootswitchFunction::PanelLayoutArrange => {
                cx.daw.application_command(ApplicationCommand::SetPanelLayout(PanelLayout::Arrange))
            }
            FootswitchFunction::PanelLayoutMix => {
                cx.daw.application_command(ApplicationCommand::SetPanelLayout(PanelLayout::Mix))
            }
            FootswitchFunction::PanelLayoutEdit => {
                cx.daw.application_command(ApplicationCommand::SetPanelLayout(PanelLayout::Edit))
            }
            FootswitchFunction::AddInstrumentTrack => cx.daw.application_command(ApplicationCommand::AddInstrumentTrack),
            FootswitchFunction::AddAudioTrack => cx.daw.application_command(ApplicationCommand::AddAudioTrack),
            FootswitchFunction::AddEffectTrack => cx.daw.application_command(ApplicationCommand::AddEffectTrack),
            FootswitchFunction::Quantize => {
                if cx.daw.cursor_clip_exists() {
                    let amount = cx.settings.values().quantize_amount() as f64 / 100.0;
                    cx.daw.application_command(ApplicationCommand::QuantizeCursorClip(amount));
                }
            }
            _ => {}
        }
    }

    /// Cursor track, or a notification asking for one
    fn cursor_track(cx: &mut Context) -> Option<TrackInfo> {
        let track = cx.daw.cursor_track().map(|index| cx.daw.track(index));
        match track {
            Some(track) if track.exists => Some(track),
            _ => {
                cx.surface.notify(SELECT_TRACK_FIRST);
                None
            }
        }
    }

    /// Selected slot of the track, else the first slot of the scene page
    fn target_scene(track: &TrackInfo, cx: &Context) -> usize {
        cx.daw
            .selected_slot(track.index)
            .unwrap_or_else(|| crate::daw::scroll_position(&*cx.daw, BankKind::Scenes))
    }

    /// Clip based looper: overdub while the pedal is down
    fn clip_looper(event: ButtonEvent, cx: &mut Context) {
        if event == ButtonEvent::Long {
            return;
        }
        let Some(track) = Self::cursor_track(cx) else {
            return;
        };
        let scene = Self::target_scene(&track, cx);

        if event == ButtonEvent::Down {
            if !cx.daw.slot(track.index, scene).has_content {
                commands::execute(ButtonId::New, ButtonEvent::Down, cx);
                cx.daw.slot_command(track.index, scene, SlotCommand::Select);
            }
            cx.daw.transport_command(TransportCommand::SetLauncherOverdub(true));
        } else {
            cx.daw.transport_command(TransportCommand::SetLauncherOverdub(false));
        }
        // Starts the transport if it is not running yet
        cx.daw.slot_command(track.index, scene, SlotCommand::Launch);
    }

    fn looper_custom(&mut self, event: ButtonEvent, cx: &mut Context) {
        if event == ButtonEvent::Long {
            return;
        }
        let Some(track) = Self::cursor_track(cx) else {
            return;
        };
        if !track.rec_arm {
            cx.surface.notify(&format!("Rec Arm {} !", track.index));
        }

        if event == ButtonEvent::Down {
            self.state = LooperState::Held { since: cx.now };
            return;
        }

        let LooperState::Held { since } = std::mem::take(&mut self.state) else {
            log::debug!("footswitch: Release without press ignored");
            return;
        };
        let held = cx.now.saturating_duration_since(since);
        log::debug!("footswitch: Held for {:?}", held);

        match press_band(held) {
            PressBand::Short => Self::short_press(&track, cx),
            PressBand::Long => Self::long_press(&track, cx),
            PressBand::VeryLong => Self::very_long_press(&track, cx),
        }
    }

    /// Record into the target slot, or close/overdub the loop it holds
    fn short_press(track: &TrackInfo, cx: &mut Context) {
        let selected = cx.daw.selected_slot(track.index);
        let mut scene = Self::target_scene(track, cx);

        if track.can_hold_notes && selected.is_none() {
            let Some(empty) = Self::first_empty_slot_in_page(track, cx) else {
                cx.surface.notify("No more empty slot in the bank");
                return;
            };
            cx.daw.slot_command(track.index, empty, SlotCommand::Select);
            scene = empty;
        }

        if cx.daw.slot(track.index, scene).has_content {
            if track.can_hold_audio {
                commands::execute(ButtonId::New, ButtonEvent::Down, cx);
            } else {
                cx.daw.transport_command(TransportCommand::ToggleLauncherOverdub);
            }
            // Launching a recording slot closes the loop
            if cx.daw.slot(track.index, scene).is_recording {
                cx.daw.slot_command(track.index, scene, SlotCommand::Launch);
            }
        } else {
            cx.daw.slot_command(track.index, scene, SlotCommand::Record);
            cx.daw.slot_command(track.index, scene, SlotCommand::Launch);
            cx.daw.transport_command(TransportCommand::SetLauncherOverdub(false));
        }
    }

    /// Drop the take being recorded, otherwise undo
    fn long_press(track: &TrackInfo, cx: &mut Context) {
        let scene = Self::target_scene(track, cx);
        if cx.daw.slot(track.index, scene).is_recording {
            cx.daw.slot_command(track.index, scene, SlotCommand::Remove);
            cx.surface.notify("Stop this slot and Delete");
        } else {
            commands::undo(cx);
            cx.surface.notify("Undo");
        }
    }

    /// Disarm the track and continue on an empty, armed copy of it
    fn very_long_press(track: &TrackInfo, cx: &mut Context) {
        cx.surface.notify("Duplicate with no clip");
        cx.daw.track_command(track.index, TrackCommand::SetRecArm(false));
        cx.daw.track_command(track.index, TrackCommand::Duplicate);

        let clone = cx.daw.track(track.index + 1);
        if !clone.exists {
            log::warn!("footswitch: No track after {} to continue on", track.index);
            return;
        }
        cx.daw.track_command(clone.index, TrackCommand::Select);
        for scene in 0..cx.daw.slot_count(clone.index) {
            cx.daw.slot_command(clone.index, scene, SlotCommand::Remove);
        }
        if cx.daw.slot_count(clone.index) > 0 {
            cx.daw.slot_command(clone.index, 0, SlotCommand::Select);
        }
        cx.daw.track_command(clone.index, TrackCommand::SetRecArm(true));
    }

    fn first_empty_slot_in_page(track: &TrackInfo, cx: &Context) -> Option<usize> {
        let scenes = cx.daw.bank(BankKind::Scenes)?;
        (0..scenes.page_size())
            .filter_map(|page_index| scenes.absolute_index(page_index))
            .find(|scene| {
                let slot = cx.daw.slot(track.index, *scene);
                slot.exists && !slot.has_content
            })
    }
}
