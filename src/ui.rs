use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::labels::LabelElement;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Screen regions for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiLayout {
    /// Bordered globe panel
    pub panel: Rect,
    /// Drawable area inside the panel border
    pub globe: Rect,
    pub status: Rect,
}

fn globe_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Globe ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Split the terminal into globe panel and status bar
pub fn layout(area: Rect) -> UiLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Globe
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    UiLayout {
        panel: chunks[0],
        globe: globe_block().inner(chunks[0]),
        status: chunks[1],
    }
}

/// Draw the frame's globe, labels and status bar
pub fn render(frame: &mut Frame, app: &App, layout: &UiLayout) {
    frame.render_widget(globe_block(), layout.panel);
    frame.render_widget(
        GlobeWidget {
            canvas: &app.canvas,
            labels: app.labels.draw_order(),
        },
        layout.globe,
    );
    render_status_bar(frame, app, layout.status);
}

/// Braille globe with text labels overlaid
struct GlobeWidget<'a> {
    canvas: &'a BrailleCanvas,
    /// Back to front
    labels: Vec<&'a LabelElement>,
}

impl Widget for GlobeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (cols, rows) = self.canvas.size();
        for row in 0..rows.min(area.height as usize) {
            for col in 0..cols.min(area.width as usize) {
                let ch = self.canvas.char_at(col, row);
                if ch == crate::braille::BLANK {
                    continue;
                }
                buf[(area.x + col as u16, area.y + row as u16)]
                    .set_char(ch)
                    .set_fg(Color::Cyan);
            }
        }

        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        for label in self.labels {
            let Some(span) = label.cell_span(area) else {
                continue;
            };
            let text = label.name.chars().skip(span.skip).take(span.width as usize);
            for (i, ch) in text.enumerate() {
                buf[(area.x + span.col + i as u16, area.y + span.row)]
                    .set_char(ch)
                    .set_style(label_style);
            }
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);

    let labels = match app.label_status() {
        LabelStatus::Loading => Span::styled("loading labels", Style::default().fg(Color::Yellow)),
        LabelStatus::Unavailable => Span::styled("no labels", Style::default().fg(Color::Red)),
        LabelStatus::Hidden => Span::styled("[L]abels off", dim),
        LabelStatus::Shown { visible, total } => Span::styled(
            format!("[L]abels {visible}/{total}"),
            Style::default().fg(Color::Green),
        ),
    };

    let mut spans = vec![
        Span::styled(" Distance: ", dim),
        Span::styled(format!("{:.2}", app.camera_distance()), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        labels,
    ];
    if let Some(message) = &app.message {
        spans.push(Span::styled(" | ", dim));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Cyan)));
    }
    spans.push(Span::styled(" | drag/arrows:orbit +/-:zoom L:labels r:reset q:quit", dim));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Label state shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStatus {
    Loading,
    Unavailable,
    Hidden,
    Shown { visible: usize, total: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_reserves_status_row() {
        let ui = layout(Rect::new(0, 0, 80, 24));
        assert_eq!(ui.status, Rect::new(0, 23, 80, 1));
        assert_eq!(ui.panel, Rect::new(0, 0, 80, 23));
        assert_eq!(ui.globe, Rect::new(1, 1, 78, 21));
    }

    #[test]
    fn test_globe_widget_draws_labels_over_canvas() {
        let mut canvas = BrailleCanvas::new(10, 2);
        canvas.set_pixel(0, 0);
        let label = LabelElement {
            visible: true,
            x: 10.0,
            y: 4.0,
            z_order: 1,
            ..LabelElement::new("Oslo", "https://example.com")
        };

        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        GlobeWidget { canvas: &canvas, labels: vec![&label] }.render(area, &mut buf);

        assert_eq!(buf[(0, 0)].symbol(), "⠁");
        let row: String = (3..7).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert_eq!(row, "Oslo");
    }

    #[test]
    fn test_label_clipped_on_left_edge() {
        let canvas = BrailleCanvas::new(10, 1);
        let label = LabelElement {
            visible: true,
            x: 0.0,
            y: 0.0,
            z_order: 1,
            ..LabelElement::new("Lima", "https://example.com")
        };

        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        GlobeWidget { canvas: &canvas, labels: vec![&label] }.render(area, &mut buf);

        let row: String = (0..2).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert_eq!(row, "ma");
    }

    #[test]
    fn test_status_bar_names_label_toggle_key() {
        use crate::config::{CameraConfig, LabelSettings};
        use crate::data::LocationRecord;
        use ratatui::backend::TestBackend;
        use ratatui::Terminal;

        let mut app = App::new(LabelSettings::default(), CameraConfig::default());
        app.install_locations(vec![LocationRecord {
            latitude: 0.0,
            longitude: 0.0,
            name: "Origin".to_string(),
            url: "https://example.com/origin".to_string(),
            area: 1000.0,
        }]);
        app.toggle_labels();

        let mut terminal = Terminal::new(TestBackend::new(120, 1)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                render_status_bar(f, &app, area);
            })
            .unwrap();
        let line: String = (0..120)
            .map(|x| terminal.backend().buffer()[(x, 0)].symbol().to_string())
            .collect();

        assert!(line.contains("[L]abels off"), "{line}");
        assert!(line.contains("L:labels"), "{line}");
    }
}
