use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::domain::AppConfig;
use crate::model::{Model, UiData};

pub const CMDLINE_HEIGHT: u16 = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const SELECTION_MARK: &str = "●";

pub struct TableUi {
    max_column_width: usize,
}

impl TableUi {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            max_column_width: cfg.max_column_width,
        }
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let data = model.ui_data();
        let [table_area, status_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(CMDLINE_HEIGHT)])
                .areas(frame.area());

        self.draw_table(&data, frame, table_area);
        self.draw_status_line(&data, frame, status_area);

        if let Some(text) = &data.popup {
            draw_popup(frame, text, 70, 80);
        } else if let Some(text) = &data.confirm {
            draw_popup(frame, text, 50, 20);
        }
    }

    fn draw_table(&self, data: &UiData, frame: &mut Frame, area: Rect) {
        let widths = self.column_widths(data);

        let mut header_cells = vec![Cell::from(" ")];
        header_cells.extend(data.headers.iter().enumerate().map(|(col, h)| {
            let style = if col == data.cursor_col {
                Style::new().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::new().add_modifier(Modifier::BOLD)
            };
            Cell::from(truncated(h, self.max_column_width)).style(style)
        }));
        let header = Row::new(header_cells);

        let rows = data.rows.iter().enumerate().map(|(ridx, cells)| {
            let mark = if data.selected.get(ridx).copied().unwrap_or(false) {
                SELECTION_MARK
            } else {
                " "
            };
            let mut row_cells = vec![Cell::from(mark)];
            row_cells.extend(
                cells
                    .iter()
                    .map(|c| Cell::from(truncated(c, self.max_column_width))),
            );
            let mut row = Row::new(row_cells);
            if ridx == data.cursor_row {
                row = row.style(Style::new().add_modifier(Modifier::REVERSED));
            } else if data.selected.get(ridx).copied().unwrap_or(false) {
                row = row.style(Style::new().fg(Color::Yellow));
            }
            row
        });

        let constraints: Vec<Constraint> = std::iter::once(Constraint::Length(1))
            .chain(widths.into_iter().map(|w| Constraint::Length(w as u16)))
            .collect();

        let table = Table::new(rows, constraints)
            .header(header)
            .column_spacing(1)
            .block(Block::bordered().title(Line::from(data.title.clone()).centered()));

        frame.render_widget(table, area);
    }

    // Width of each data column: longest cell or header, capped.
    fn column_widths(&self, data: &UiData) -> Vec<usize> {
        data.headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let cells = data.rows.iter().filter_map(|r| r.get(col));
                let widest = cells
                    .map(|c| c.chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(header.chars().count());
                (widest + COLUMN_WIDTH_MARGIN).min(self.max_column_width)
            })
            .collect()
    }

    fn draw_status_line(&self, data: &UiData, frame: &mut Frame, area: Rect) {
        let line = match &data.prompt {
            Some(prompt) => Line::from(vec![
                Span::styled("/", Style::new().fg(Color::Cyan)),
                Span::raw(prompt.text.clone()),
                Span::styled("█", Style::new().fg(Color::Cyan)),
            ]),
            None => {
                let mut parts = vec![Span::styled(
                    format!(" Page {}/{}", data.page, data.page_count),
                    Style::new().fg(Color::Cyan),
                )];
                if data.filtered_rows == data.total_rows {
                    parts.push(Span::raw(format!(" · {} rows", data.total_rows)));
                } else {
                    parts.push(Span::raw(format!(
                        " · {}/{} rows for \"{}\"",
                        data.filtered_rows, data.total_rows, data.search
                    )));
                }
                if data.selected_count > 0 {
                    parts.push(Span::styled(
                        format!(" · {} selected", data.selected_count),
                        Style::new().fg(Color::Yellow),
                    ));
                }
                parts.push(Span::raw(format!(" · {}", data.status_message)));
                Line::from(parts)
            }
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn truncated(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn draw_popup(frame: &mut Frame, text: &str, percent_x: u16, percent_y: u16) {
    let area = centered_rect(frame.area(), percent_x, percent_y);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(Block::bordered().title(" hrview ")),
        area,
    );
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
