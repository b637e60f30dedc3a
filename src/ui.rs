use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::{Basemap, Popup, Scene};
use crate::overlay::{ContactDialog, RiskTier, LEGEND_TITLE, RISK_TIERS};
use crate::risk::SelectionState;

/// Dark basemap background
const MAP_BG: (u8, u8, u8) = (18, 20, 28);

const TITLE: &str = " Emergency Response Map ";
const CONTACTS_BUTTON: &str = " [e] Emergency Contacts ";

/// Header, map, status bar
fn split(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

/// Inner map area for a terminal of the given size
pub fn map_inner(area: Rect) -> Rect {
    map_block().inner(split(area)[1])
}

/// Header button that opens the contact dialog, for a terminal of the given size
pub fn contacts_button(area: Rect) -> Rect {
    button_rect(split(area)[0])
}

fn button_rect(header: Rect) -> Rect {
    let width = (CONTACTS_BUTTON.chars().count() as u16).min(header.width);
    Rect::new(header.x + header.width - width, header.y, width, 1)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if !app.gate.is_ready() {
        render_loading(frame, area);
        return;
    }

    let [header, map, status] = split(area);
    render_header(frame, header);
    let inner = map_block().inner(map);
    frame.render_widget(map_block(), map);

    let scene = app
        .surface
        .compose(inner.width as usize, inner.height as usize);
    frame.render_widget(
        MapWidget {
            scene: &scene,
            basemap: &app.basemap,
        },
        inner,
    );
    render_legend(frame, inner);
    if let Some(popup) = &scene.popup {
        render_popup(frame, popup, inner);
    }
    if app.contacts.is_open() {
        render_contacts(frame, &app.contacts, area);
    }
    render_status_bar(frame, app, status);
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let y = area.y + area.height / 2;
    let line = Line::from(Span::styled("⠋ Loading map…", Style::default().fg(Color::Cyan)))
        .centered();
    frame.render_widget(Paragraph::new(line), Rect::new(area.x, y, area.width, 1));
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(Span::styled(
        TITLE,
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(title, area);

    let button = button_rect(area);
    frame.render_widget(
        Paragraph::new(Span::styled(
            CONTACTS_BUTTON,
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        button,
    );
}

/// Composited map: background, density field, basemap lines, markers
struct MapWidget<'a> {
    scene: &'a Scene,
    basemap: &'a Basemap,
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let scene = self.scene;
        let cols = (area.width as usize).min(scene.cols);
        let rows = (area.height as usize).min(scene.rows);

        // 1. Background tinted by the density field
        for row in 0..rows {
            for col in 0..cols {
                let (r, g, b) = scene.density.color_at(col, row).over(MAP_BG);
                buf[(area.x + col as u16, area.y + row as u16)]
                    .set_char(' ')
                    .set_bg(Color::Rgb(r, g, b));
            }
        }

        // 2. Basemap outlines
        let mut lines = BrailleCanvas::new(cols, rows);
        self.basemap.render(&mut lines, &scene.viewport);
        for row in 0..rows {
            for col in 0..cols {
                if let Some(ch) = lines.glyph(col, row) {
                    buf[(area.x + col as u16, area.y + row as u16)]
                        .set_char(ch)
                        .set_fg(Color::Rgb(90, 96, 110));
                }
            }
        }

        // 3. Markers in dataset order so later ones overwrite earlier ones
        let glyph = scene.marker_size.glyph();
        for marker in &scene.markers {
            let tier = RiskTier::for_score(marker.risk_score);
            let (px, py) = (marker.pos.x.floor() as i32, marker.pos.y.floor() as i32);
            if px < 0 || py < 0 {
                continue;
            }
            let (col, row) = ((px / 2) as usize, (py / 4) as usize);
            if col >= cols || row >= rows {
                continue;
            }
            buf[(area.x + col as u16, area.y + row as u16)]
                .set_char(glyph)
                .set_style(Style::default().fg(tier.color).add_modifier(Modifier::BOLD));
        }
    }
}

fn render_legend(frame: &mut Frame, map: Rect) {
    let width = 19u16;
    let height = RISK_TIERS.len() as u16 + 2;
    if map.width < width + 2 || map.height < height + 1 {
        return;
    }
    let card = Rect::new(
        map.x + map.width - width - 1,
        map.y + map.height - height,
        width,
        height,
    );

    let lines: Vec<Line> = RISK_TIERS
        .iter()
        .map(|tier| {
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(tier.color)),
                Span::raw(tier.label),
            ])
        })
        .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" ⓘ {LEGEND_TITLE} "),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(Clear, card);
    frame.render_widget(Paragraph::new(lines).block(block), card);
}

/// Card above the selected point, kept inside the map area
fn popup_rect(popup: &Popup, map: Rect) -> Option<Rect> {
    let (px, py) = popup.anchor?;
    let text_width = popup
        .title
        .chars()
        .count()
        .max(popup.detail.chars().count())
        .max(10) as u16;
    let width = (text_width + 4).min(map.width);
    let height = 5u16.min(map.height);

    let anchor_col = map.x + (px / 2).max(0) as u16;
    let anchor_row = map.y + (py / 4).max(0) as u16;

    let x = anchor_col
        .saturating_sub(width / 2)
        .clamp(map.x, map.x + map.width - width);
    // Above the point if there is room, else below
    let y = if anchor_row >= map.y + height {
        anchor_row - height
    } else {
        (anchor_row + 1).min(map.y + map.height - height)
    };
    Some(Rect::new(x, y, width, height))
}

fn render_popup(frame: &mut Frame, popup: &Popup, map: Rect) {
    let Some(rect) = popup_rect(popup, map) else {
        return;
    };
    let lines = vec![
        Line::from(Span::styled(
            popup.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(popup.detail.clone()),
        Line::from(Span::styled("[x] close", Style::default().fg(Color::DarkGray))),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(block).style(Style::default().bg(Color::Black)),
        rect,
    );
}

fn render_contacts(frame: &mut Frame, dialog: &ContactDialog, area: Rect) {
    let width = 40u16.min(area.width);
    let height = (dialog.contacts().len() as u16 + 4).min(area.height);
    let rect = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    let inner_width = width.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = dialog
        .contacts()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let label = format!(" [{}] {}", i + 1, c.label);
            let pad = inner_width.saturating_sub(label.chars().count() + c.number.len() + 1);
            Line::from(vec![
                Span::raw(label),
                Span::raw(" ".repeat(pad)),
                Span::styled(c.number, Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " 1-3: dial  Esc: close",
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(Span::styled(
            " Emergency Contact Numbers ",
            Style::default().add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let selection = match app.surface.selection() {
        SelectionState::Empty => "none".to_string(),
        SelectionState::Selected(id) => format!("#{}", id.0 + 1),
    };

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | sel: ", Style::default().fg(Color::DarkGray)),
        Span::styled(selection, Style::default().fg(Color::Green)),
    ];
    if let Some(status) = &app.status {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::White)));
    }
    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom r:reset click:inspect x:close e:contacts q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_dataset;
    use crate::map::{MapSurface, ViewState};
    use crate::overlay::{LoadingGate, LoggingDialer};
    use crate::risk::ObservationId;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn app(width: u16, height: u16) -> App {
        let surface = MapSurface::new(Arc::new(sample_dataset().unwrap()), ViewState::new(77.2090, 28.6139, 11.0));
        App::new(
            surface,
            Basemap::new(),
            Box::new(LoggingDialer::default()),
            Arc::new(LoadingGate::new()),
            width,
            height,
        )
    }

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_loading_splash_until_ready() {
        let app = app(80, 24);
        let screen = draw(&app, 80, 24);
        assert!(screen.contains("Loading map"));
        assert!(!screen.contains("Risk Levels"));
    }

    #[test]
    fn test_legend_and_header() {
        let app = app(80, 24);
        app.gate.open();
        let screen = draw(&app, 80, 24);
        assert!(screen.contains("Emergency Response Map"));
        assert!(screen.contains("Emergency Contacts"));
        for tier in RISK_TIERS {
            assert!(screen.contains(tier.label));
        }
    }

    #[test]
    fn test_popup_shows_selected_detail() {
        let mut app = app(80, 24);
        app.gate.open();
        app.surface.on_marker_click(ObservationId(1));
        let screen = draw(&app, 80, 24);
        assert!(screen.contains("Low risk area"));
        assert!(screen.contains("Risk Score: 2"));

        app.dismiss();
        let screen = draw(&app, 80, 24);
        assert!(!screen.contains("Low risk area"));
    }

    #[test]
    fn test_contacts_dialog() {
        let mut app = app(80, 24);
        app.gate.open();
        app.open_contacts();
        let screen = draw(&app, 80, 24);
        assert!(screen.contains("Emergency Contact Numbers"));
        assert!(screen.contains("Ambulance"));
        assert!(screen.contains("112"));
    }

    #[test]
    fn test_popup_rect_stays_inside_map() {
        let map = Rect::new(1, 2, 30, 10);
        let popup = Popup {
            id: ObservationId(0),
            coordinate: crate::risk::Coordinate::new(0.0, 0.0),
            anchor: Some((0, 0)),
            title: "A fairly long description".into(),
            detail: "Risk Score: 5".into(),
        };
        let rect = popup_rect(&popup, map).unwrap();
        assert!(rect.x >= map.x && rect.right() <= map.right());
        assert!(rect.y >= map.y && rect.bottom() <= map.bottom());
    }
}
