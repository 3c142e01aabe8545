//! Transport and utility buttons
//!
//! Each button acts on its press edge. The footswitch forwards to these so a
//! pedal can stand in for any of them.

use crate::daw::{ApplicationCommand, BankKind, SlotCommand, TrackCommand, TransportCommand};
use crate::surface::{ButtonEvent, ButtonId};
use crate::Context;

/// Run the command bound to `button`
///
/// Returns false for buttons that are not plain commands (scene buttons,
/// shift, footswitch).
pub fn execute(button: ButtonId, event: ButtonEvent, cx: &mut Context) -> bool {
    let handled = matches!(
        button,
        ButtonId::Play
            | ButtonId::Record
            | ButtonId::Undo
            | ButtonId::NudgeMinus
            | ButtonId::NudgePlus
            | ButtonId::TapTempo
            | ButtonId::New
            | ButtonId::Repeat
            | ButtonId::ArrowLeft
            | ButtonId::ArrowRight
            | ButtonId::ArrowUp
            | ButtonId::ArrowDown
    );
    if !handled || event != ButtonEvent::Down {
        return handled;
    }

    match button {
        ButtonId::Play => toggle_play(cx),
        ButtonId::Record => cx.daw.transport_command(TransportCommand::ToggleRecord),
        ButtonId::Undo | ButtonId::NudgeMinus => undo(cx),
        ButtonId::TapTempo => cx.daw.transport_command(TransportCommand::TapTempo),
        ButtonId::New => {
            new_clip(cx);
        }
        ButtonId::Repeat => cx.settings.toggle_note_repeat_active(cx.daw),
        ButtonId::ArrowLeft => page(cx, BankKind::Tracks, false),
        ButtonId::ArrowRight => page(cx, BankKind::Tracks, true),
        ButtonId::ArrowUp => page(cx, BankKind::Scenes, false),
        ButtonId::ArrowDown => page(cx, BankKind::Scenes, true),
        // Nudge plus has no function on these controllers
        _ => {}
    }
    true
}

/// Start playback, or stop it the way "behaviour on stop" says
pub fn toggle_play(cx: &mut Context) {
    let command = if cx.daw.transport().playing {
        TransportCommand::Stop(cx.settings.values().behaviour_on_stop())
    } else {
        TransportCommand::Play
    };
    cx.daw.transport_command(command);
}

pub fn undo(cx: &mut Context) {
    cx.daw.application_command(ApplicationCommand::Undo);
}

/// Create a clip in the first empty slot of the cursor track
///
/// The search starts at the selected slot (or the first one). The new clip
/// gets the "new clip length", is selected and launched, and launcher
/// overdub is switched on. Returns the scene index of the new clip.
pub fn new_clip(cx: &mut Context) -> Option<usize> {
    let Some(track) = cx.daw.cursor_track().filter(|t| cx.daw.track(*t).exists) else {
        cx.surface.notify("Please select a track first.");
        return None;
    };
    let start = cx.daw.selected_slot(track).unwrap_or(0);
    let Some(scene) = (start..cx.daw.slot_count(track)).find(|s| {
        let slot = cx.daw.slot(track, *s);
        slot.exists && !slot.has_content
    }) else {
        cx.surface.notify("No empty slot");
        return None;
    };

    let length_beats = cx
        .settings
        .values()
        .new_clip_length_beats(cx.daw.quarters_per_measure());
    log::debug!("commands: New clip of {} beats at track {} scene {}", length_beats, track, scene);
    cx.daw.slot_command(track, scene, SlotCommand::CreateClip { length_beats });
    cx.daw.slot_command(track, scene, SlotCommand::Select);
    cx.daw.slot_command(track, scene, SlotCommand::Launch);
    cx.daw.transport_command(TransportCommand::SetLauncherOverdub(true));
    Some(scene)
}

fn page(cx: &mut Context, kind: BankKind, forwards: bool) {
    let Some(bank) = cx.daw.bank_mut(kind) else {
        return;
    };
    let selected = if forwards {
        bank.select_next_page()
    } else {
        bank.select_previous_page()
    };
    if let (BankKind::Tracks, Some(track)) = (kind, selected) {
        cx.daw.track_command(track, TrackCommand::Select);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daw::{DawModel, StopBehaviour};
    use crate::settings::SettingId;
    use crate::testing::{Command, Harness};
    use std::time::Instant;

    fn press(harness: &mut Harness, button: ButtonId) -> bool {
        execute(button, ButtonEvent::Down, &mut harness.cx(Instant::now()))
    }

    #[test]
    fn test_play_toggles_with_stop_behaviour() {
        let mut harness = Harness::new(2, 2);
        press(&mut harness, ButtonId::Play);
        assert!(harness.daw.transport().playing);

        harness
            .settings
            .set_option(SettingId::BehaviourOnStop, "Return to Zero", &mut harness.daw)
            .unwrap();
        press(&mut harness, ButtonId::Play);
        assert!(!harness.daw.transport().playing);
        assert!(harness
            .daw
            .received(&Command::Transport(TransportCommand::Stop(StopBehaviour::ReturnToZero))));
    }

    #[test]
    fn test_release_and_non_commands() {
        let mut harness = Harness::new(2, 2);
        assert!(execute(ButtonId::Play, ButtonEvent::Up, &mut harness.cx(Instant::now())));
        assert!(harness.daw.commands.is_empty());
        assert!(!press(&mut harness, ButtonId::Scene1));
        assert!(!press(&mut harness, ButtonId::Footswitch));
    }

    #[test]
    fn test_undo_and_nudge_minus() {
        let mut harness = Harness::new(2, 2);
        press(&mut harness, ButtonId::Undo);
        press(&mut harness, ButtonId::NudgeMinus);
        assert_eq!(harness.daw.undo_count(), 2);
    }

    #[test]
    fn test_new_clip_from_selected_slot() {
        let mut harness = Harness::new(2, 4);
        harness.daw.select_track(1);
        harness.daw.slot_mut(1, 1).is_selected = true;
        harness.daw.slot_mut(1, 1).has_content = true;

        assert!(press(&mut harness, ButtonId::New));
        assert_eq!(
            harness.daw.commands,
            vec![
                Command::Slot(1, 2, SlotCommand::CreateClip { length_beats: 4 }),
                Command::Slot(1, 2, SlotCommand::Select),
                Command::Slot(1, 2, SlotCommand::Launch),
                Command::Transport(TransportCommand::SetLauncherOverdub(true)),
            ]
        );
    }

    #[test]
    fn test_new_clip_without_room() {
        let mut harness = Harness::new(2, 1);
        harness.daw.select_track(0);
        harness.daw.slot_mut(0, 0).has_content = true;

        press(&mut harness, ButtonId::New);
        assert!(harness.daw.commands.is_empty());
        assert_eq!(harness.surface.notifications, vec!["No empty slot".to_string()]);
    }

    #[test]
    fn test_repeat_toggles_note_repeat() {
        let mut harness = Harness::new(2, 2);
        press(&mut harness, ButtonId::Repeat);
        assert!(harness.settings.values().note_repeat_active());
        press(&mut harness, ButtonId::Repeat);
        assert!(!harness.settings.values().note_repeat_active());
    }

    #[test]
    fn test_arrows_page_banks() {
        let mut harness = Harness::new(20, 6);
        press(&mut harness, ButtonId::ArrowRight);
        assert_eq!(harness.daw.bank(BankKind::Tracks).unwrap().scroll_position(), 8);
        assert_eq!(harness.daw.cursor_track(), Some(8));

        press(&mut harness, ButtonId::ArrowDown);
        assert_eq!(harness.daw.bank(BankKind::Scenes).unwrap().scroll_position(), 2);
        press(&mut harness, ButtonId::ArrowUp);
        press(&mut harness, ButtonId::ArrowUp);
        assert_eq!(harness.daw.bank(BankKind::Scenes).unwrap().scroll_position(), 0);
    }
}
