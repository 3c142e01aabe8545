//! Knob modes
//!
//! A mode reinterprets the knob row: Volume, Pan and Rec Arm bind each knob
//! to a track of the current track page, User and Device bind them to a
//! parameter bank. Exactly one mode is active per controller.
//!
//! Navigation (next/previous item or page) goes to the mode's own bank,
//! except for modes that delegate it to the track bank (User).

use crate::bank::BankWindow;
use crate::config::EncoderMode;
use crate::daw::{BankKind, DawModel, TrackCommand};
use crate::normalize;
use crate::parameters::{BankParameterProvider, ParameterProvider, TrackAttribute, TrackParameterProvider};
use crate::scheduler::{ScheduledTask, TaskHandle, PAGE_NAME_DELAY};
use crate::settings::SettingValues;
use crate::Context;
use serde::{Deserialize, Serialize};

/// Identity of a knob mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeId {
    Volume,
    Pan,
    RecArm,
    User,
    Device,
}

impl ModeId {
    pub const ALL: [ModeId; 5] = [Self::Volume, Self::Pan, Self::RecArm, Self::User, Self::Device];

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Volume => "Volume",
            Self::Pan => "Pan",
            Self::RecArm => "Rec Arm",
            Self::User => "User",
            Self::Device => "Device",
        }
    }
}

/// Where item/page navigation of a mode goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The mode's own bank
    OwnBank,
    /// The current track bank
    TrackBank,
}

/// A knob mode
pub struct Mode {
    id: ModeId,
    bank: BankKind,
    navigation: Navigation,
    provider: Box<dyn ParameterProvider>,
}

impl std::fmt::Debug for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mode")
            .field("id", &self.id)
            .field("bank", &self.bank)
            .field("navigation", &self.navigation)
            .finish()
    }
}

impl Mode {
    pub fn new(id: ModeId, bank: BankKind, navigation: Navigation, provider: Box<dyn ParameterProvider>) -> Self {
        Self {
            id,
            bank,
            navigation,
            provider,
        }
    }

    /// Standard binding of a mode to a knob row of `knobs` knobs
    pub fn standard(id: ModeId, knobs: usize) -> Self {
        let track = |attribute| Box::new(TrackParameterProvider::new(attribute, knobs)) as Box<dyn ParameterProvider>;
        match id {
            ModeId::Volume => Self::new(id, BankKind::Tracks, Navigation::OwnBank, track(TrackAttribute::Volume)),
            ModeId::Pan => Self::new(id, BankKind::Tracks, Navigation::OwnBank, track(TrackAttribute::Pan)),
            ModeId::RecArm => Self::new(id, BankKind::Tracks, Navigation::OwnBank, track(TrackAttribute::RecArm)),
            ModeId::User => Self::new(
                id,
                BankKind::UserParameters,
                Navigation::TrackBank,
                Box::new(BankParameterProvider::new(BankKind::UserParameters, knobs)),
            ),
            ModeId::Device => Self::new(
                id,
                BankKind::DeviceParameters,
                Navigation::OwnBank,
                Box::new(BankParameterProvider::new(BankKind::DeviceParameters, knobs)),
            ),
        }
    }

    pub fn id(&self) -> ModeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    /// Bank the knobs read from
    pub fn bank(&self) -> BankKind {
        self.bank
    }

    /// Bank item/page navigation goes to
    pub fn navigation_bank(&self) -> BankKind {
        match self.navigation {
            Navigation::OwnBank => self.bank,
            Navigation::TrackBank => BankKind::Tracks,
        }
    }

    /// Knob value in 0-127, or -1 when nothing is bound to the knob
    pub fn knob_value(&self, daw: &dyn DawModel, index: usize) -> i32 {
        self.provider.value(daw, index).map(i32::from).unwrap_or(-1)
    }

    /// Name of the parameter behind a knob, empty when absent
    pub fn knob_name(&self, daw: &dyn DawModel, index: usize) -> String {
        self.provider.name(daw, index).unwrap_or_default()
    }

    /// Notification text for the current page of the mode's bank
    pub fn page_name(&self, daw: &dyn DawModel, settings: &SettingValues) -> String {
        let page = daw.bank(self.bank).map(BankWindow::current_page).unwrap_or(0);
        match self.id {
            ModeId::User => format!("User: {}", settings.user_page_name(page)),
            _ => format!("{}: Page {}", self.name(), page + 1),
        }
    }
}

/// Registry of the modes of one controller and the active one
#[derive(Debug)]
pub struct ModeManager {
    modes: Vec<Mode>,
    active: Option<ModeId>,
    previous: Option<ModeId>,
    encoder_mode: EncoderMode,
    pending_page_name: Option<TaskHandle>,
}

impl ModeManager {
    pub fn new(encoder_mode: EncoderMode) -> Self {
        Self {
            modes: Vec::new(),
            active: None,
            previous: None,
            encoder_mode,
            pending_page_name: None,
        }
    }

    /// Register the standard modes in `ids` order and activate the first
    pub fn with_modes(ids: &[ModeId], knobs: usize, encoder_mode: EncoderMode) -> Self {
        let mut manager = Self::new(encoder_mode);
        for id in ids {
            manager.register(Mode::standard(*id, knobs));
        }
        if let Some(first) = ids.first() {
            manager.select_mode(*first);
        }
        manager
    }

    /// Add a mode; a mode with the same id is replaced
    pub fn register(&mut self, mode: Mode) {
        if let Some(existing) = self.modes.iter_mut().find(|m| m.id == mode.id) {
            log::warn!("modes: Replacing already registered mode {:?}", mode.id);
            *existing = mode;
        } else {
            log::debug!("modes: Registered {:?}", mode.id);
            self.modes.push(mode);
        }
    }

    pub fn get(&self, id: ModeId) -> Option<&Mode> {
        self.modes.iter().find(|m| m.id == id)
    }

    pub fn registered(&self) -> impl Iterator<Item = ModeId> + '_ {
        self.modes.iter().map(|m| m.id)
    }

    /// Make `id` the active mode
    ///
    /// Returns false (and changes nothing) when the mode is not registered.
    pub fn select_mode(&mut self, id: ModeId) -> bool {
        if self.get(id).is_none() {
            log::warn!("modes: Mode {:?} is not registered", id);
            return false;
        }
        if self.active == Some(id) {
            return true;
        }
        log::debug!("modes: {:?} -> {:?}", self.active, id);
        self.previous = self.active;
        self.active = Some(id);
        true
    }

    pub fn active_mode_id(&self) -> Option<ModeId> {
        self.active
    }

    pub fn active_mode(&self) -> Option<&Mode> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn is_active(&self, id: ModeId) -> bool {
        self.active == Some(id)
    }

    /// Mode that was active before the last switch
    pub fn previous_mode(&self) -> Option<ModeId> {
        self.previous
    }

    /// Switch back to the previous mode, if there is one
    pub fn restore_previous_mode(&mut self) -> bool {
        match self.previous {
            Some(previous) => self.select_mode(previous),
            None => false,
        }
    }

    /// Knob value of the active mode; -1 without an active mode or parameter
    pub fn knob_value(&self, daw: &dyn DawModel, index: usize) -> i32 {
        self.active_mode().map(|m| m.knob_value(daw, index)).unwrap_or(-1)
    }

    pub fn knob_name(&self, daw: &dyn DawModel, index: usize) -> String {
        self.active_mode().map(|m| m.knob_name(daw, index)).unwrap_or_default()
    }

    /// Knob turned: write through the active mode's provider
    ///
    /// Relative encoders are scaled by the knob sensitivity, the slow one
    /// while shift is held.
    pub fn on_knob(&self, index: usize, midi_value: u8, cx: &mut Context) {
        let Some(mode) = self.active_mode() else {
            return;
        };
        let Some(current) = mode.provider.value(cx.daw, index) else {
            log::trace!("modes: Knob {} of {:?} is not bound", index, mode.id);
            return;
        };
        let values = cx.settings.values();
        let sensitivity = if cx.shift {
            values.knob_sensitivity_slow()
        } else {
            values.knob_sensitivity_default()
        };
        let value = normalize::knob_target(current, midi_value, self.encoder_mode, sensitivity);
        if value != current {
            mode.provider.set_value(cx.daw, index, value);
        }
    }

    /// Scroll the active mode's bank to `page` and announce it
    ///
    /// The page name is shown after [`PAGE_NAME_DELAY`]; a newer page change
    /// cancels a name that is still pending.
    pub fn select_item_page(&mut self, page: usize, cx: &mut Context) {
        let Some(mode) = self.active_mode() else {
            return;
        };
        let (id, kind) = (mode.id, mode.bank);
        match cx.daw.bank_mut(kind) {
            Some(bank) => bank.scroll_to_page(page),
            None => {
                log::debug!("modes: No {:?} bank to page", kind);
                return;
            }
        }
        if let Some(pending) = self.pending_page_name.take() {
            cx.scheduler.cancel(pending);
        }
        let handle = cx
            .scheduler
            .schedule(cx.now, PAGE_NAME_DELAY, ScheduledTask::ShowPageName(id));
        self.pending_page_name = Some(handle);
    }

    /// Page-name notification for a due [`ScheduledTask::ShowPageName`]
    pub fn page_name_due(&mut self, id: ModeId, daw: &dyn DawModel, settings: &SettingValues) -> Option<String> {
        self.pending_page_name = None;
        self.get(id).map(|mode| mode.page_name(daw, settings))
    }

    pub fn select_next_item(&self, daw: &mut dyn DawModel) {
        self.navigate(daw, BankWindow::select_next_item);
    }

    pub fn select_previous_item(&self, daw: &mut dyn DawModel) {
        self.navigate(daw, BankWindow::select_previous_item);
    }

    pub fn select_next_item_page(&self, daw: &mut dyn DawModel) {
        self.navigate(daw, BankWindow::select_next_page);
    }

    pub fn select_previous_item_page(&self, daw: &mut dyn DawModel) {
        self.navigate(daw, BankWindow::select_previous_page);
    }

    fn navigate(&self, daw: &mut dyn DawModel, step: fn(&mut BankWindow) -> Option<usize>) {
        let Some(mode) = self.active_mode() else {
            return;
        };
        let kind = mode.navigation_bank();
        let Some(selected) = daw.bank_mut(kind).and_then(step) else {
            return;
        };
        // Track selection is document state, not only window state
        if kind == BankKind::Tracks {
            daw.track_command(selected, TrackCommand::Select);
        }
    }
}
