use std::sync::Arc;

use ratatui::layout::{Position, Rect};
use tracing::{info, warn};

use crate::map::{Basemap, HitFeature, Lod, MapSurface, ViewState};
use crate::overlay::{ContactDialog, Dialer, LoadingGate};
use crate::risk::density::{CELL_PX_H, CELL_PX_W};
use crate::ui;

/// Application state
pub struct App {
    pub surface: MapSurface,
    pub basemap: Basemap,
    pub contacts: ContactDialog,
    dialer: Box<dyn Dialer>,
    pub gate: Arc<LoadingGate>,
    /// View restored by the reset control
    home: ViewState,
    /// Inner map area in terminal cells
    pub map_area: Rect,
    /// Header button that opens the contact dialog
    pub contacts_button: Rect,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Set once the current press has moved; a press that never moves is a click
    dragged: bool,
    /// One-line feedback shown in the status bar
    pub status: Option<String>,
}

impl App {
    pub fn new(
        surface: MapSurface,
        basemap: Basemap,
        dialer: Box<dyn Dialer>,
        gate: Arc<LoadingGate>,
        width: u16,
        height: u16,
    ) -> Self {
        let home = surface.view();
        Self {
            surface,
            basemap,
            contacts: ContactDialog::new(),
            dialer,
            gate,
            home,
            map_area: ui::map_inner(Rect::new(0, 0, width, height)),
            contacts_button: ui::contacts_button(Rect::new(0, 0, width, height)),
            should_quit: false,
            last_mouse: None,
            dragged: false,
            status: None,
        }
    }

    /// Update map area when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        let area = Rect::new(0, 0, width, height);
        self.map_area = ui::map_inner(area);
        self.contacts_button = ui::contacts_button(area);
    }

    /// Terminal cell to canvas pixel (cell center), `None` outside the map
    pub fn canvas_px(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        let a = self.map_area;
        if col < a.x || row < a.y || col >= a.x + a.width || row >= a.y + a.height {
            return None;
        }
        Some((
            (col - a.x) as f64 * CELL_PX_W + CELL_PX_W / 2.0,
            (row - a.y) as f64 * CELL_PX_H + CELL_PX_H / 2.0,
        ))
    }

    /// Pan the map by canvas pixels
    pub fn pan(&mut self, dx: i32, dy: i32) {
        if self.contacts.is_open() {
            return;
        }
        let next = self.surface.view().panned(dx as f64, dy as f64);
        self.surface.on_gesture(next);
    }

    pub fn zoom_in(&mut self) {
        let view = self.surface.view();
        self.surface.on_gesture(view.with_zoom(view.zoom + 1.0));
    }

    pub fn zoom_out(&mut self) {
        let view = self.surface.view();
        self.surface.on_gesture(view.with_zoom(view.zoom - 1.0));
    }

    /// Zoom by `delta` levels around a terminal position
    pub fn zoom_at(&mut self, col: u16, row: u16, delta: f64) {
        if self.contacts.is_open() {
            return;
        }
        let Some((px, py)) = self.canvas_px(col, row) else {
            return;
        };
        let viewport = self
            .surface
            .viewport(self.map_area.width as usize, self.map_area.height as usize);
        self.surface.on_gesture(viewport.zoomed_at(px, py, delta));
    }

    pub fn reset_view(&mut self) {
        self.surface.on_gesture(self.home);
    }

    /// Left button down: the header button opens contacts, anything else starts a press.
    /// The open contact dialog swallows mouse input meant for the map.
    pub fn mouse_down(&mut self, col: u16, row: u16) {
        if self.contacts.is_open() {
            return;
        }
        if self.contacts_button.contains(Position::new(col, row)) {
            self.open_contacts();
        } else {
            self.press(col, row);
        }
    }

    pub fn press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if self.contacts.is_open() {
            self.last_mouse = None;
            return;
        }
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (last_x as i32 - col as i32) * CELL_PX_W as i32;
            let dy = (last_y as i32 - row as i32) * CELL_PX_H as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx, dy);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Mouse released: a press that never dragged is a click
    pub fn release(&mut self, col: u16, row: u16) {
        let clicked = self.last_mouse.is_some() && !self.dragged && !self.contacts.is_open();
        self.last_mouse = None;
        self.dragged = false;
        if clicked {
            self.click_at(col, row);
        }
    }

    /// A marker on top is a marker click; anything else goes through generic hit-testing.
    pub fn click_at(&mut self, col: u16, row: u16) {
        let Some((px, py)) = self.canvas_px(col, row) else {
            return;
        };
        let hits = self.surface.hit_test(
            self.map_area.width as usize,
            self.map_area.height as usize,
            px,
            py,
        );
        match hits.last() {
            Some(HitFeature::Marker(id)) => self.surface.on_marker_click(*id),
            _ => self.surface.on_map_click(&hits),
        }
    }

    pub fn dismiss(&mut self) {
        self.surface.on_dismiss();
    }

    pub fn open_contacts(&mut self) {
        self.contacts.open();
    }

    pub fn close_contacts(&mut self) {
        self.contacts.close();
    }

    /// Dial the contact at `index`; the result lands in the status bar
    pub fn dial(&mut self, index: usize) {
        match self.contacts.dial(index, self.dialer.as_mut()) {
            Ok(contact) => {
                info!(label = contact.label, number = contact.number, "contact dialed");
                self.status = Some(format!("Calling {} ({})", contact.label, contact.number));
            }
            Err(e) => {
                warn!(error = %e, "dial failed");
                self.status = Some(format!("Dial failed: {e}"));
            }
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("z{:.1}", self.surface.view().zoom)
    }

    pub fn center_coords(&self) -> String {
        self.surface.view().center.to_string()
    }

    pub fn lod_level(&self) -> &'static str {
        Lod::from_zoom(self.surface.view().zoom).label()
    }
}
