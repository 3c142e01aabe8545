//! Control-surface support for clip-launching DAWs
//!
//! This crate provides:
//! - Knob modes (volume, pan, rec arm, user and device parameters) with
//!   delayed page-name notifications
//! - A session grid view with switchable first-row pad modes
//! - A footswitch with a duration-based looper
//! - A typed settings registry with change observers
//! - YAML controller profiles, MIDI input routing via midly and LED output
//!
//! # Architecture
//!
//! ```text
//! MIDI Device → driver callback → flume channel → SurfaceController::pump()
//!     → active view / mode / footswitch → DawModel commands
//!     → refresh() → Surface LED writes → flume channel → MIDI out
//! ```
//!
//! Every controller owns its state in a [`SurfaceController`]; handlers get
//! the pieces they need through a short-lived [`Context`].

mod bank;
mod colors;
mod commands;
mod config;
mod daw;
mod footswitch;
mod input;
mod modes;
mod normalize;
mod output;
mod parameters;
mod scheduler;
mod session;
mod settings;
mod surface;
mod views;

#[cfg(test)]
mod testing;

pub use bank::BankWindow;
pub use colors::{PadColor, PadLight, SessionColor, SessionColors};
pub use config::{
    default_surface_config_path, load_surface_config, save_surface_config, ButtonMapping, ConfigError,
    ControllerFamily, DeviceProfile, EncoderMode, GridConfig, MidiControlConfig, ModeSelectMapping, SurfaceConfig,
};
pub use daw::{
    ApplicationCommand, BankItem, BankKind, DawModel, PanelLayout, ParameterInfo, SceneCommand, SceneInfo,
    SlotCommand, SlotInfo, StopBehaviour, TrackCommand, TrackInfo, TransportCommand, TransportInfo,
};
pub use footswitch::{press_band, Footswitch, FootswitchFunction, LooperState, PressBand};
pub use input::{forward_raw, input_channel, InputRouter, RawInput, SurfaceEvent, TimedInput};
pub use modes::{Mode, ModeId, ModeManager, Navigation};
pub use output::{output_channel, MidiLedSurface, OutputMessage};
pub use parameters::{BankParameterProvider, ParameterProvider, TrackAttribute, TrackParameterProvider};
pub use scheduler::{ScheduledTask, Scheduler, TaskHandle, PAGE_NAME_DELAY};
pub use session::{PadMode, SessionView, PAD_MODES};
pub use settings::{
    RecArmedPadAction, Resolution, SettingId, SettingKind, SettingValue, SettingValues, Settings, SettingsError,
};
pub use surface::{ButtonEvent, ButtonId, GridPosition, GridRow, PadGrid, PressTracker, Surface};
pub use views::{ControlView, ViewId, ViewManager};

use flume::Receiver;
use std::time::Instant;

/// Borrowed view of one controller's state, handed to event handlers
pub struct Context<'a> {
    pub daw: &'a mut (dyn DawModel + 'static),
    pub surface: &'a mut dyn Surface,
    pub settings: &'a mut Settings,
    pub scheduler: &'a mut Scheduler,
    /// Shift button held
    pub shift: bool,
    /// Time of the event being handled
    pub now: Instant,
}

/// Error type for controller setup and configuration
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Invalid controller profile: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid setting: {0}")]
    Settings(#[from] SettingsError),

    #[error("No controller profile matches port '{0}'")]
    NoProfile(String),
}

/// One connected controller
///
/// Owns the host model, the LED surface and all controller state. Feed it
/// input with [`SurfaceController::pump`] or [`SurfaceController::handle_event`]
/// and call [`SurfaceController::tick`] regularly for long presses and
/// delayed notifications.
pub struct SurfaceController<D: DawModel + 'static, S: Surface> {
    name: String,
    daw: D,
    surface: S,
    settings: Settings,
    scheduler: Scheduler,
    router: InputRouter,
    modes: ModeManager,
    views: ViewManager,
    footswitch: Footswitch,
    pads: PressTracker<u8>,
    buttons: PressTracker<ButtonId>,
    shift: bool,
}

impl<D: DawModel + 'static, S: Surface> SurfaceController<D, S> {
    /// Set up a controller from its profile
    ///
    /// Setting overrides in the profile that don't apply are logged and
    /// skipped.
    pub fn new(profile: &DeviceProfile, mut daw: D, surface: S) -> Result<Self, SurfaceError> {
        profile.validate()?;

        let mut settings = Settings::new();
        settings::register_deactivated_items_handler(&mut settings);
        for (key, value) in &profile.settings {
            if let Err(e) = settings.apply_yaml(key, value, &mut daw) {
                log::warn!("SurfaceController: Ignoring setting '{}' of {}: {}", key, profile.name, e);
            }
        }

        let long_press = profile.long_press();
        log::info!(
            "SurfaceController: {} ready ({} knobs, modes {:?})",
            profile.name,
            profile.knobs.len(),
            profile.modes
        );

        let mut controller = Self {
            name: profile.name.clone(),
            daw,
            surface,
            settings,
            scheduler: Scheduler::new(),
            router: InputRouter::new(profile),
            modes: ModeManager::with_modes(&profile.modes, profile.knobs.len(), profile.encoder_mode),
            views: ViewManager::new(profile.grid.layout.clone()),
            footswitch: Footswitch::new(),
            pads: PressTracker::new(long_press),
            buttons: PressTracker::new(long_press),
            shift: false,
        };
        controller.refresh();
        Ok(controller)
    }

    /// Set up a controller for the profile that best matches `port_name`
    pub fn from_config(config: &SurfaceConfig, port_name: &str, daw: D, surface: S) -> Result<Self, SurfaceError> {
        let profile = config
            .find_profile(port_name)
            .ok_or_else(|| SurfaceError::NoProfile(port_name.to_string()))?;
        Self::new(profile, daw, surface)
    }

    fn split(&mut self, now: Instant) -> (Context<'_>, &mut ViewManager, &mut ModeManager, &mut Footswitch) {
        let Self {
            daw,
            surface,
            settings,
            scheduler,
            views,
            modes,
            footswitch,
            shift,
            ..
        } = self;
        let cx = Context {
            daw,
            surface,
            settings,
            scheduler,
            shift: *shift,
            now,
        };
        (cx, views, modes, footswitch)
    }

    /// Drain every pending raw input and dispatch it
    ///
    /// Returns the number of messages that mapped to a surface event.
    pub fn pump(&mut self, rx: &Receiver<TimedInput>) -> usize {
        let mut handled = 0;
        while let Ok(input) = rx.try_recv() {
            if self.handle_raw(&input.bytes, input.at) {
                handled += 1;
            }
        }
        handled
    }

    /// Parse, route and dispatch one raw MIDI message
    pub fn handle_raw(&mut self, data: &[u8], now: Instant) -> bool {
        match self.router.route_bytes(data) {
            Some(event) => {
                self.handle_event(event, now);
                true
            }
            None => false,
        }
    }

    /// Dispatch one surface event, then redraw
    pub fn handle_event(&mut self, event: SurfaceEvent, now: Instant) {
        log::trace!("SurfaceController: {:?}", event);
        match event {
            SurfaceEvent::Pad { note, velocity } => self.on_pad(note, velocity, now),
            SurfaceEvent::Button { button, pressed, .. } => self.on_button(button, pressed, now),
            SurfaceEvent::Knob { index, value } => {
                let (mut cx, _, modes, _) = self.split(now);
                modes.on_knob(index, value, &mut cx);
            }
            SurfaceEvent::ModeSelect(id) => {
                if !self.modes.is_active(id) && self.modes.select_mode(id) {
                    self.surface.notify(id.name());
                }
            }
        }
        self.refresh();
    }

    fn on_pad(&mut self, note: u8, velocity: u8, now: Instant) {
        if velocity > 0 {
            self.pads.press(note, now);
        } else {
            let swallow = self.pads.long_handled(note);
            self.pads.release(note, now);
            if swallow {
                log::debug!("SurfaceController: Release of long-pressed pad {:#04x} swallowed", note);
                return;
            }
        }
        let (mut cx, views, _, _) = self.split(now);
        views.on_grid_note(note, velocity, &mut cx);
    }

    fn on_button(&mut self, button: ButtonId, pressed: bool, now: Instant) {
        if button == ButtonId::Shift {
            self.shift = pressed;
            return;
        }
        let event = if pressed {
            self.buttons.press(button, now);
            ButtonEvent::Down
        } else {
            self.buttons.release(button, now);
            ButtonEvent::Up
        };
        self.dispatch_button(button, event, now);
    }

    fn dispatch_button(&mut self, button: ButtonId, event: ButtonEvent, now: Instant) {
        let (mut cx, views, _, footswitch) = self.split(now);
        if button.is_scene_button() {
            views.on_button(button, event, &mut cx);
        } else if button == ButtonId::Footswitch {
            footswitch.handle(event, &mut cx);
        } else if !commands::execute(button, event, &mut cx) {
            log::trace!("SurfaceController: No command for {:?}", button);
        }
    }

    /// Fire long presses and due delayed tasks
    pub fn tick(&mut self, now: Instant) {
        let mut changed = false;

        for note in self.pads.poll_long(now) {
            let (mut cx, views, _, _) = self.split(now);
            if views.on_grid_note_long_press(note, &mut cx) {
                self.pads.mark_long_handled(note);
                changed = true;
            }
        }
        for button in self.buttons.poll_long(now) {
            self.dispatch_button(button, ButtonEvent::Long, now);
            changed = true;
        }
        for task in self.scheduler.take_due(now) {
            match task {
                ScheduledTask::ShowPageName(id) => {
                    if let Some(name) = self.modes.page_name_due(id, &self.daw, self.settings.values()) {
                        self.surface.notify(&name);
                    }
                }
            }
        }

        if changed {
            self.refresh();
        }
    }

    /// Redraw the grid and button LEDs from the host model
    ///
    /// Call after the host reports a change; unchanged LEDs are not resent
    /// by [`MidiLedSurface`].
    pub fn refresh(&mut self) {
        self.views.draw_grid(&self.daw, self.settings.values(), &mut self.surface);
        for button in ButtonId::SCENES {
            let color = self.views.button_color(button, &self.daw).velocity();
            self.surface.set_button_light(button, color);
        }
        let transport = self.daw.transport();
        self.surface
            .set_button_light(ButtonId::Play, normalize::from_bool(transport.playing));
        self.surface
            .set_button_light(ButtonId::Record, normalize::from_bool(transport.recording));
        self.surface.set_button_light(
            ButtonId::Repeat,
            normalize::from_bool(self.settings.values().note_repeat_active()),
        );
    }

    pub fn select_mode(&mut self, id: ModeId) -> bool {
        self.modes.select_mode(id)
    }

    pub fn active_mode(&self) -> Option<ModeId> {
        self.modes.active_mode_id()
    }

    /// Scroll the active mode's bank to `page`; its name is notified later
    pub fn select_item_page(&mut self, page: usize, now: Instant) {
        let (mut cx, _, modes, _) = self.split(now);
        modes.select_item_page(page, &mut cx);
        self.refresh();
    }

    pub fn select_next_item(&mut self) {
        self.modes.select_next_item(&mut self.daw);
    }

    pub fn select_previous_item(&mut self) {
        self.modes.select_previous_item(&mut self.daw);
    }

    pub fn select_next_item_page(&mut self) {
        self.modes.select_next_item_page(&mut self.daw);
    }

    pub fn select_previous_item_page(&mut self) {
        self.modes.select_previous_item_page(&mut self.daw);
    }

    /// Knob value of the active mode; -1 if nothing is bound
    pub fn knob_value(&self, index: usize) -> i32 {
        self.modes.knob_value(&self.daw, index)
    }

    pub fn knob_name(&self, index: usize) -> String {
        self.modes.knob_name(&self.daw, index)
    }

    pub fn settings(&self) -> &SettingValues {
        self.settings.values()
    }

    pub fn set_option(&mut self, id: SettingId, option: &str) -> Result<(), SettingsError> {
        self.settings.set_option(id, option, &mut self.daw)?;
        self.refresh();
        Ok(())
    }

    pub fn set_integer(&mut self, id: SettingId, value: i32) -> Result<(), SettingsError> {
        self.settings.set_integer(id, value, &mut self.daw)?;
        self.refresh();
        Ok(())
    }

    pub fn set_text(&mut self, id: SettingId, text: &str) -> Result<(), SettingsError> {
        self.settings.set_text(id, text, &mut self.daw)?;
        self.refresh();
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn daw(&self) -> &D {
        &self.daw
    }

    pub fn daw_mut(&mut self) -> &mut D {
        &mut self.daw
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn active_view(&self) -> ViewId {
        self.views.active()
    }

    pub fn pad_mode(&self) -> Option<PadMode> {
        self.views.pad_mode()
    }

    pub fn footswitch_state(&self) -> LooperState {
        self.footswitch.state()
    }

    pub fn is_shift_held(&self) -> bool {
        self.shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Command, FakeDaw, RecordingSurface};
    use std::time::Duration;

    type Controller = SurfaceController<FakeDaw, RecordingSurface>;

    fn controller(tracks: usize, scenes: usize) -> Controller {
        let _ = env_logger::builder().is_test(true).try_init();
        SurfaceController::new(
            &DeviceProfile::launchkey_mini_mk3(),
            FakeDaw::new(tracks, scenes),
            RecordingSurface::default(),
        )
        .unwrap()
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_pad_tap_launches_slot() {
        let mut c = controller(4, 4);
        let t0 = Instant::now();
        c.daw_mut().slot_mut(1, 1).has_content = true;

        assert!(c.handle_raw(&[0x90, 0x71, 100], t0));
        assert!(c.daw().commands.is_empty());
        assert!(c.handle_raw(&[0x80, 0x71, 0], t0 + ms(100)));
        assert_eq!(c.daw().commands, vec![Command::Slot(1, 1, SlotCommand::Launch)]);
        assert!(c.daw().slot(1, 1).is_playing);
        assert_eq!(c.surface().pad(1, 1), Some(c.views.session().slot_light(
            &c.daw().track(1),
            &c.daw().slot(1, 1),
            true
        )));
    }

    #[test]
    fn test_pad_long_press_records_and_swallows_release() {
        let mut c = controller(4, 4);
        c.daw_mut().tracks[2].rec_arm = true;
        let t0 = Instant::now();

        c.handle_raw(&[0x90, 0x60, 100], t0);
        c.tick(t0 + ms(399));
        assert!(c.daw().commands.is_empty());
        c.tick(t0 + ms(400));
        assert!(c.daw().received(&Command::Slot(0, 0, SlotCommand::Record)));
        assert!(c.daw().track(0).rec_arm);
        assert!(!c.daw().track(2).rec_arm);

        c.daw_mut().commands.clear();
        c.handle_raw(&[0x90, 0x60, 0], t0 + ms(900));
        assert!(c.daw().commands.is_empty());
    }

    #[test]
    fn test_scene_two_hold_picks_pad_mode() {
        let mut c = controller(4, 4);
        let t0 = Instant::now();

        c.handle_raw(&[0xB0, 0x69, 127], t0);
        assert_eq!(c.active_view(), ViewId::Control);
        c.handle_raw(&[0x90, 0x63, 100], t0);
        c.handle_raw(&[0x90, 0x63, 0], t0);
        c.handle_raw(&[0xB0, 0x69, 0], t0 + ms(100));
        assert_eq!(c.active_view(), ViewId::Session);
        assert_eq!(c.pad_mode(), Some(PAD_MODES[3]));

        // Top row now toggles the pad mode for the column's track
        c.handle_raw(&[0x90, 0x61, 100], t0 + ms(200));
        c.handle_raw(&[0x90, 0x61, 0], t0 + ms(250));
        assert_eq!(c.daw().commands.len(), 1);
        assert!(matches!(c.daw().commands[0], Command::Track(1, _)));
    }

    #[test]
    fn test_held_pad_in_control_view_still_picks_pad_mode() {
        let mut c = controller(4, 4);
        let t0 = Instant::now();

        c.handle_raw(&[0xB0, 0x69, 127], t0);
        c.handle_raw(&[0x90, 0x63, 100], t0);
        c.tick(t0 + ms(500));
        c.handle_raw(&[0x90, 0x63, 0], t0 + ms(600));
        assert_eq!(c.pad_mode(), Some(PAD_MODES[3]));
        assert!(c.daw().commands.is_empty());
    }

    #[test]
    fn test_held_control_row_pad_still_toggles() {
        let mut c = controller(4, 4);
        let t0 = Instant::now();

        c.handle_raw(&[0xB0, 0x69, 127], t0);
        c.handle_raw(&[0x90, 0x63, 100], t0);
        c.handle_raw(&[0x90, 0x63, 0], t0);
        c.handle_raw(&[0xB0, 0x69, 0], t0 + ms(100));
        assert_eq!(c.pad_mode(), Some(PadMode::Solo));

        // Long press on the control row does nothing, the release still acts
        c.handle_raw(&[0x90, 0x61, 100], t0 + ms(200));
        c.tick(t0 + ms(700));
        assert!(c.daw().commands.is_empty());
        c.handle_raw(&[0x90, 0x61, 0], t0 + ms(800));
        assert_eq!(c.daw().commands.len(), 1);
        assert!(matches!(c.daw().commands[0], Command::Track(1, _)));
    }

    #[test]
    fn test_knobs_and_mode_select() {
        let mut c = controller(4, 2);
        let t0 = Instant::now();
        assert_eq!(c.active_mode(), Some(ModeId::Volume));

        c.handle_raw(&[0xBF, 0x16, 90], t0);
        assert_eq!(c.daw().track(1).volume, 90);
        assert_eq!(c.knob_value(1), 90);

        c.handle_raw(&[0xBF, 0x09, 3], t0);
        assert_eq!(c.active_mode(), Some(ModeId::Pan));
        assert_eq!(c.surface().notifications, vec!["Pan".to_string()]);
        c.handle_raw(&[0xBF, 0x15, 10], t0);
        assert_eq!(c.daw().track(0).pan, 10);
        assert_eq!(c.knob_name(0), "Track 1");
        // Knob without a track
        assert_eq!(c.knob_value(5), -1);
    }

    #[test]
    fn test_page_name_after_delay_latest_wins() {
        let mut c = controller(20, 2);
        let t0 = Instant::now();

        c.select_item_page(1, t0);
        c.select_item_page(2, t0 + ms(100));
        c.tick(t0 + ms(250));
        assert!(c.surface().notifications.is_empty());
        c.tick(t0 + ms(300));
        assert_eq!(c.surface().notifications, vec!["Volume: Page 3".to_string()]);
        assert_eq!(c.daw().bank(BankKind::Tracks).unwrap().scroll_position(), 16);
    }

    #[test]
    fn test_profile_settings_drive_footswitch() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut profile = DeviceProfile::launchkey_mini_mk3();
        profile
            .settings
            .insert("footswitch_2".to_string(), serde_yaml::Value::from("Looper Custom"));
        profile
            .settings
            .insert("no_such_setting".to_string(), serde_yaml::Value::from(1));
        let mut daw = FakeDaw::new(2, 2);
        daw.tracks[0].rec_arm = true;
        daw.select_track(0);
        let mut c = SurfaceController::new(&profile, daw, RecordingSurface::default()).unwrap();
        assert_eq!(c.settings().footswitch(), 15);

        let t0 = Instant::now();
        c.handle_raw(&[0xB0, 0x40, 127], t0);
        assert!(matches!(c.footswitch_state(), LooperState::Held { .. }));
        // Long events from the button tracker are ignored by the looper
        c.tick(t0 + ms(500));
        c.handle_raw(&[0xB0, 0x40, 0], t0 + ms(1000));
        assert_eq!(c.daw().undo_count(), 1);
        assert_eq!(c.surface().notifications, vec!["Undo".to_string()]);
    }

    #[test]
    fn test_shift_scene_pages_scenes() {
        let mut c = controller(2, 6);
        let t0 = Instant::now();
        c.handle_raw(&[0xB0, 0x6C, 127], t0);
        assert!(c.is_shift_held());
        c.handle_raw(&[0xB0, 0x69, 127], t0);
        c.handle_raw(&[0xB0, 0x69, 0], t0);
        assert_eq!(c.daw().bank(BankKind::Scenes).unwrap().scroll_position(), 2);
        assert_eq!(c.active_view(), ViewId::Session);
        c.handle_raw(&[0xB0, 0x6C, 0], t0);
        assert!(!c.is_shift_held());
    }

    #[test]
    fn test_pump_drains_channel() {
        let mut c = controller(2, 2);
        let (tx, rx) = input_channel();
        forward_raw(&tx, &[0xB0, 0x73, 127]);
        forward_raw(&tx, &[0xB0, 0x73, 0]);
        forward_raw(&tx, &[0xE0, 0x00, 0x40]);
        assert_eq!(c.pump(&rx), 2);
        assert!(c.daw().transport().playing);
        assert!(c.surface().buttons.contains(&(ButtonId::Play, 127)));
    }

    #[test]
    fn test_settings_setters() {
        let mut c = controller(2, 2);
        c.set_integer(SettingId::QuantizeAmount, 500).unwrap();
        assert_eq!(c.settings().quantize_amount(), 100);
        c.set_text(SettingId::UserPageName(0), "Drums").unwrap();
        assert_eq!(c.settings().user_page_name(0), "Drums");
        assert!(matches!(
            c.set_option(SettingId::Footswitch2, "Juggle"),
            Err(SettingsError::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_setup_errors() {
        let config = SurfaceConfig::default();
        let result = Controller::from_config(&config, "Launchpad X", FakeDaw::new(1, 1), RecordingSurface::default());
        assert!(matches!(result, Err(SurfaceError::NoProfile(_))));

        let mut profile = DeviceProfile::launchkey_mini_mk3();
        profile.grid.layout.columns = 0;
        let result = Controller::new(&profile, FakeDaw::new(1, 1), RecordingSurface::default());
        assert!(matches!(result, Err(SurfaceError::Config(ConfigError::EmptyGrid(_)))));

        let c = Controller::from_config(
            &config,
            "Launchkey Mini MK3 DAW Port",
            FakeDaw::new(1, 1),
            RecordingSurface::default(),
        )
        .unwrap();
        assert_eq!(c.name(), "Launchkey Mini MK3");
    }
}
