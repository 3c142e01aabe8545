//! Pad-grid views and the switch between them
//!
//! The session view is the default. Holding Scene 2 shows the control view,
//! where the top pad row picks the session pad mode; releasing Scene 2 goes
//! back to the session.

use crate::colors::{PadColor, PadLight};
use crate::daw::DawModel;
use crate::session::{PadMode, SessionView, PAD_MODES};
use crate::settings::SettingValues;
use crate::surface::{ButtonEvent, ButtonId, PadGrid, Surface};
use crate::Context;

/// Identity of a grid view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Session,
    Control,
}

/// Pad-mode chooser
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlView;

impl ControlView {
    /// Release on the top row picks `PAD_MODES[column]`; picking the active
    /// mode or a column past the list clears it
    pub fn on_grid_note(&self, session: &mut SessionView, note: u8, velocity: u8) {
        if velocity != 0 {
            return;
        }
        let Some((column, 0)) = session.grid().physical(note) else {
            return;
        };
        let picked = PAD_MODES.get(column).copied();
        let pad_mode = if picked == session.pad_mode() { None } else { picked };
        session.set_pad_mode(pad_mode);
    }

    pub fn draw_grid(&self, session: &SessionView, surface: &mut dyn Surface) {
        let grid: &PadGrid = session.grid();
        for row in 0..grid.rows() {
            for column in 0..grid.columns {
                let light = match (row, PAD_MODES.get(column)) {
                    (0, Some(mode)) if session.pad_mode() == Some(*mode) => PadLight::solid(mode.button_color()),
                    (0, Some(mode)) => PadLight::solid(mode.dim_color()),
                    _ => PadLight::off(),
                };
                surface.light_pad(column, row, light);
            }
        }
    }

    /// Scene 2 release returns to the session view
    pub fn on_button(&self, button: ButtonId, event: ButtonEvent) -> Option<ViewId> {
        (button == ButtonId::Scene2 && event == ButtonEvent::Up).then_some(ViewId::Session)
    }

    pub fn button_color(&self, button: ButtonId, session: &SessionView) -> PadColor {
        match (button, session.pad_mode()) {
            (ButtonId::Scene2, Some(mode)) => mode.button_color(),
            (ButtonId::Scene2, None) => PadColor::White,
            _ => PadColor::Black,
        }
    }
}

/// Owner of the grid views and the active one
#[derive(Debug, Clone)]
pub struct ViewManager {
    active: ViewId,
    session: SessionView,
    control: ControlView,
}

impl ViewManager {
    pub fn new(grid: PadGrid) -> Self {
        Self {
            active: ViewId::Session,
            session: SessionView::new(grid),
            control: ControlView,
        }
    }

    pub fn active(&self) -> ViewId {
        self.active
    }

    pub fn set_active(&mut self, view: ViewId) {
        if self.active != view {
            log::debug!("views: {:?} -> {:?}", self.active, view);
            self.active = view;
        }
    }

    pub fn session(&self) -> &SessionView {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionView {
        &mut self.session
    }

    pub fn pad_mode(&self) -> Option<PadMode> {
        self.session.pad_mode()
    }

    pub fn draw_grid(&self, daw: &dyn DawModel, settings: &SettingValues, surface: &mut dyn Surface) {
        match self.active {
            ViewId::Session => self.session.draw_grid(daw, settings, surface),
            ViewId::Control => self.control.draw_grid(&self.session, surface),
        }
    }

    pub fn on_grid_note(&mut self, note: u8, velocity: u8, cx: &mut Context) {
        match self.active {
            ViewId::Session => self.session.on_grid_note(note, velocity, cx),
            ViewId::Control => self.control.on_grid_note(&mut self.session, note, velocity),
        }
    }

    /// Long press on a grid pad; true if the active view acted on it
    pub fn on_grid_note_long_press(&mut self, note: u8, cx: &mut Context) -> bool {
        match self.active {
            ViewId::Session => self.session.on_grid_note_long_press(note, cx),
            ViewId::Control => false,
        }
    }

    /// Scene-column button of the active view
    pub fn on_button(&mut self, button: ButtonId, event: ButtonEvent, cx: &mut Context) {
        let next = match self.active {
            ViewId::Session => self.session.on_button(button, event, cx),
            ViewId::Control => self.control.on_button(button, event),
        };
        if let Some(view) = next {
            self.set_active(view);
        }
    }

    pub fn button_color(&self, button: ButtonId, daw: &dyn DawModel) -> PadColor {
        match self.active {
            ViewId::Session => self.session.button_color(button, daw),
            ViewId::Control => self.control.button_color(button, &self.session),
        }
    }
}
