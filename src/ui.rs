use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

use crate::domain::TSConfig;
use crate::list_view::ListView;
use crate::model::{Model, Modus, Page};
use crate::session::LoginField;
use crate::upload::ACCEPTED_EXTENSIONS;

pub const HEADER_HEIGHT: u16 = 1;
pub const STATUS_HEIGHT: u16 = 1;
pub const SEARCH_HEIGHT: u16 = 1;
pub const STATS_HEIGHT: u16 = 4;
pub const UPLOAD_BOX_HEIGHT: u16 = 4;
pub const CHAT_WIDTH: u16 = 42;
const EDIT_CURSOR: &str = "▏";

pub struct TSUI {
    max_column_width: u16,
}

impl TSUI {
    pub fn new(config: &TSConfig) -> Self {
        Self {
            max_column_width: config.max_column_width.min(u16::MAX as usize) as u16,
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let area = frame.area();
        if model.page() == Page::Login {
            self.draw_login(model, frame, area);
            return;
        }

        let [header, body, search, status] = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Fill(1),
            Constraint::Length(SEARCH_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .areas(area);

        self.draw_header(model, frame, header);

        let body = if model.chat().open {
            let [main, chat] =
                Layout::horizontal([Constraint::Fill(1), Constraint::Length(CHAT_WIDTH)])
                    .areas(body);
            self.draw_chat(model, frame, chat);
            main
        } else {
            body
        };

        let table_area = match model.page() {
            Page::Dashboard => {
                let [stats, table] =
                    Layout::vertical([Constraint::Length(STATS_HEIGHT), Constraint::Fill(1)])
                        .areas(body);
                self.draw_stats(model, frame, stats);
                table
            }
            Page::Upload => {
                let [upload, table] =
                    Layout::vertical([Constraint::Length(UPLOAD_BOX_HEIGHT), Constraint::Fill(1)])
                        .areas(body);
                self.draw_upload_box(model, frame, upload);
                table
            }
            _ => body,
        };
        if let Some(list) = model.active_list() {
            self.draw_table(list, frame, table_area);
            self.draw_search(model, list, frame, search);
        }
        self.draw_status(model, frame, status);

        if model.modus() == Modus::POPUP {
            self.draw_popup(model, frame, area);
        }
    }

    fn draw_login(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let form = model.login_form();
        let area = centered(area, 50, 11);

        let field = |label: &str, value: String, focus: LoginField| {
            let style = if form.focus == focus {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![Span::styled(format!("{label:<10}"), style), Span::raw(value)])
        };
        let role = match form.role {
            Some(role) => format!("< {} >", role.label()),
            None => "< Select a role >".to_string(),
        };

        let mut lines = vec![
            field("Username", form.username.value().to_string(), LoginField::Username),
            field("Password", form.password.masked(), LoginField::Password),
            field("Role", role, LoginField::Role),
            Line::default(),
        ];
        if model.is_logging_in() {
            lines.push(Line::from("Logging in ...".italic()));
        } else if let Some(error) = form.error {
            lines.push(Line::from(error.red()));
        }

        let block = Block::bordered()
            .title(Line::from(" Term Sheet Validation ".bold()).centered())
            .title_bottom(Line::from(" <Tab> next field  <Enter> sign in ").centered())
            .border_set(border::THICK);
        frame.render_widget(Paragraph::new(lines).block(block), area);

        if !form.submitting {
            let inner = area.inner(ratatui::layout::Margin::new(1, 1));
            let cursor = match form.focus {
                LoginField::Username => Some((0, form.username.cursor())),
                LoginField::Password => Some((1, form.password.cursor())),
                LoginField::Role => None,
            };
            if let Some((line, col)) = cursor {
                frame.set_cursor_position(Position::new(
                    inner.x + 10 + col as u16,
                    inner.y + line,
                ));
            }
        }
    }

    fn draw_header(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let pages = [Page::Dashboard, Page::Upload, Page::Validate];
        let selected = pages.iter().position(|p| *p == model.page());
        let titles = pages
            .iter()
            .enumerate()
            .map(|(idx, p)| format!("{} {}", idx + 1, p.title()));
        let tabs = Tabs::new(titles)
            .select(selected)
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

        let user = model
            .current_user()
            .map(|u| format!("{} ({}) ", u.name, u.role))
            .unwrap_or_default();
        let [left, right] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(user.chars().count() as u16)])
                .areas(area);
        frame.render_widget(tabs, left);
        frame.render_widget(Paragraph::new(user).alignment(Alignment::Right), right);
    }

    fn draw_stats(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let stats = model.stats();
        let areas = Layout::horizontal(stats.iter().map(|_| Constraint::Fill(1))).split(area);
        for (stat, area) in stats.iter().zip(areas.iter()) {
            let card = Paragraph::new(Line::from(vec![
                Span::raw(format!("{} ", stat.icon)),
                Span::styled(stat.count.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            ]))
            .block(Block::bordered().title(stat.title));
            frame.render_widget(card, *area);
        }
    }

    fn draw_upload_box(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let uploader = model.uploader();
        let first = if model.modus() == Modus::UPLOADPATH {
            Line::from(vec!["Path: ".bold(), Span::raw(uploader.path_input.value())])
        } else {
            match uploader.selected() {
                Some(file) => Line::from(vec![
                    "Selected: ".bold(),
                    Span::raw(format!("{} ({} bytes)", file.name(), file.file_size)),
                ]),
                None => Line::from("No file selected".dim()),
            }
        };
        let hint = Line::from(format!("Accepted: {ACCEPTED_EXTENSIONS}  [o] choose file  [s] upload"))
            .dim();

        let block = Block::bordered().title(" Upload Term Sheet ");
        let inner = block.inner(area);
        frame.render_widget(Paragraph::new(vec![first, hint]).block(block), area);

        if model.modus() == Modus::UPLOADPATH {
            frame.set_cursor_position(Position::new(
                inner.x + 6 + uploader.path_input.cursor() as u16,
                inner.y,
            ));
        }
    }

    fn draw_table(&self, list: &ListView, frame: &mut Frame, area: Rect) {
        let view = list.render();
        let mut block = Block::bordered().title(format!(
            " {} ({} of {}) ",
            list.title(),
            list.filtered().len(),
            list.rows().len()
        ));
        if view.body.is_empty() {
            block = block.title_bottom(Line::from(" No matching records ".yellow()).centered());
        }

        let header = Row::new(view.headers.iter().enumerate().map(|(idx, h)| {
            let style = if idx == view.selected_column {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            };
            let mark = if view.editable.get(idx).copied().unwrap_or(false) { "*" } else { "" };
            Cell::from(format!("{h}{mark}")).style(style)
        }));

        let rows = view.body.iter().enumerate().map(|(ridx, cells)| {
            Row::new(cells.iter().enumerate().map(|(cidx, text)| {
                match &view.editing {
                    Some((erow, ecol, buffer, cursor)) if *erow == ridx && *ecol == cidx => {
                        Cell::from(with_cursor(buffer, *cursor))
                            .style(Style::default().bg(Color::Blue).fg(Color::White))
                    }
                    _ if view.selected_row == Some(ridx) && cidx == view.selected_column => {
                        Cell::from(self.clip(text))
                            .style(Style::default().bg(Color::Yellow).fg(Color::Black))
                    }
                    _ => Cell::from(self.clip(text)),
                }
            }))
        });

        let widths = view.widths.iter().map(|w| match w {
            Some(percent) => Constraint::Percentage(*percent),
            None => Constraint::Fill(1),
        });

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .row_highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(view.selected_row);
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn clip(&self, text: &str) -> String {
        let max = self.max_column_width as usize;
        if text.chars().count() <= max {
            return text.to_string();
        }
        let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }

    fn draw_search(&self, model: &Model, list: &ListView, frame: &mut Frame, area: Rect) {
        let label = list.filter_mode().map(|m| m.label).unwrap_or("-");
        let line = if model.modus() == Modus::SEARCH {
            let input = model.search_input();
            frame.set_cursor_position(Position::new(
                area.x + (label.chars().count() + 4) as u16 + input.cursor() as u16,
                area.y,
            ));
            Line::from(vec![Span::styled(format!("[{label}] /"), Style::default().fg(Color::Yellow)), Span::raw(input.value())])
        } else if list.filter_state().search_text.is_empty() {
            Line::from(format!("[{label}] / to search, f to change filter").dim())
        } else {
            Line::from(vec![
                Span::styled(format!("[{label}] "), Style::default().fg(Color::Yellow)),
                Span::raw(list.filter_state().search_text.clone()),
                "  (c to clear)".dim(),
            ])
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_status(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let line = match model.status_message() {
            Some(msg) => Line::from(msg.to_string()).bold(),
            None => Line::from(format!("{:?} | ? help | q quit", model.modus())).dim(),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_chat(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let chat = model.chat();
        let [history, input] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).areas(area);

        let mut lines: Vec<Line> = chat
            .messages()
            .iter()
            .map(|m| {
                if m.is_user {
                    Line::from(vec!["You: ".bold(), Span::raw(m.text.as_str())])
                } else {
                    Line::from(vec!["Bot: ".cyan().bold(), Span::raw(m.text.as_str())])
                }
            })
            .collect();
        if chat.is_waiting() {
            lines.push(Line::from("Bot is typing ...".italic().dim()));
        }
        let history_widget = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(Block::bordered().title(" Assistant "));
        frame.render_widget(history_widget, history);

        let input_block = Block::bordered().title(" Message ");
        let inner = input_block.inner(input);
        frame.render_widget(
            Paragraph::new(chat.input().value()).block(input_block),
            input,
        );
        if model.modus() == Modus::CHAT {
            frame.set_cursor_position(Position::new(inner.x + chat.input().cursor() as u16, inner.y));
        }
    }

    fn draw_popup(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let Some(popup) = model.popup() else {
            return;
        };
        let height = popup.body.lines().count() as u16 + 2;
        let area = centered(area, 60, height);
        let block = Block::bordered()
            .title(Line::from(format!(" {} ", popup.title).bold()).centered())
            .title_bottom(Line::from(" <Esc> close ").centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(popup.body.as_str()).block(block), area);
    }
}

/// A rect of at most `width` x `height` in the middle of `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn with_cursor(buffer: &str, cursor: usize) -> String {
    let mut out: String = buffer.chars().take(cursor).collect();
    out.push_str(EDIT_CURSOR);
    out.extend(buffer.chars().skip(cursor));
    out
}
