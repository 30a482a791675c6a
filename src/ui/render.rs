use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::mcp::ServerState;

use super::app::App;
use super::selector::{MenuSection, ProfileSelector};
use super::servers::{auth_action, AuthAction, McpServersPage, ServerCard};
use super::Route;

fn pending_anim(tick: u64) -> &'static str {
    const FRAMES: [&str; 4] = ["·", "●", "⬤", "●"];
    FRAMES[(tick as usize) % FRAMES.len()]
}

fn status_color(state: ServerState) -> Color {
    match state {
        ServerState::Connected => Color::Green,
        ServerState::Connecting | ServerState::Authenticating => Color::Yellow,
        ServerState::Error => Color::Red,
        ServerState::NotConnected => Color::DarkGray,
    }
}

/// Main render function
pub(super) fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.area());

    render_title(f, chunks[0], "MCP Hand");

    match app.route() {
        Route::Home => render_home(f, chunks[1], app),
        Route::McpServers => draw_servers_page(f, chunks[1], app.servers(), app.tick_count()),
    }

    render_status_bar(f, chunks[2], app);

    if let Some(selector) = app.selector() {
        let popup_area = centered_rect(50, 70, f.area());
        draw_profile_selector(f, popup_area, selector);
    }
}

/// Render the selector alone, for the standalone popup.
pub(super) fn draw_popup(f: &mut Frame, selector: &ProfileSelector) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.area());

    render_title(f, chunks[0], "Profile");
    draw_profile_selector(f, centered_rect(70, 90, chunks[1]), selector);
}

fn render_title(f: &mut Frame, area: Rect, text: &str) {
    let title = Paragraph::new(text.to_string())
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(title, area);
}

fn render_home(f: &mut Frame, area: Rect, app: &App) {
    let cards = app.servers().cards();
    let profile = app
        .profile_title()
        .unwrap_or_else(|| "no profile selected".to_string());

    let connected = cards
        .iter()
        .filter(|c| c.server.status == ServerState::Connected)
        .count();
    let failing = cards
        .iter()
        .filter(|c| c.server.status == ServerState::Error)
        .count();

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Profile: ", Style::default().fg(Color::DarkGray)),
            Span::styled(profile, Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("MCP servers: ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{} ", cards.len())),
            Span::styled("●", Style::default().fg(Color::Green)),
            Span::raw(format!("{} ", connected)),
            Span::styled("●", Style::default().fg(Color::Red)),
            Span::raw(format!("{}", failing)),
        ]),
    ];
    if app.servers().is_showing_samples() {
        lines.push(Line::from(Span::styled(
            "(sample list, no servers reported yet)",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "p: profile menu • m: MCP servers • q: quit",
        Style::default().fg(Color::DarkGray),
    )));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Home"));
    f.render_widget(p, area);
}

/// Render the organization / assistant menu into `area`.
pub(super) fn draw_profile_selector(f: &mut Frame, area: Rect, selector: &ProfileSelector) {
    f.render_widget(Clear, area);

    let panel = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray))
        .title("Profile");

    if selector.is_loading() {
        let p = Paragraph::new("Loading profile...")
            .style(Style::default().fg(Color::DarkGray))
            .block(panel);
        f.render_widget(p, area);
        return;
    }

    if !selector.is_authenticated() {
        let p = Paragraph::new(vec![
            Line::from(Span::styled(
                "Not signed in",
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Esc: close",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(panel);
        f.render_widget(p, area);
        return;
    }

    let inner = panel.inner(area);
    f.render_widget(panel, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(inner);

    let width = chunks[0].width as usize;
    let heading = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(
            selector.user_email().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    let mut section = None;
    let mut selected_line = 0;
    for row in selector.rows() {
        if section != Some(row.section) {
            if section.is_some() {
                lines.push(Line::from(""));
            }
            match row.section {
                MenuSection::Organizations => {
                    lines.push(Line::from(Span::styled("Organization", heading)))
                }
                MenuSection::Assistants => {
                    lines.push(Line::from(Span::styled("Assistants", heading)))
                }
                MenuSection::Actions => {}
            }
            section = Some(row.section);
        }

        let pad = width.saturating_sub(row.label.width());
        let text = format!("{}{}", row.label, " ".repeat(pad));
        let style = if row.selected {
            Style::default().fg(Color::Black).bg(Color::White)
        } else if row.section == MenuSection::Actions {
            Style::default().fg(Color::Gray)
        } else {
            Style::default()
        };
        if row.selected {
            selected_line = lines.len();
        }
        lines.push(Line::from(Span::styled(text, style)));
    }

    // Scroll just far enough to keep the selected row on screen.
    let height = chunks[0].height as usize;
    let offset = selected_line.saturating_sub(height.saturating_sub(1));
    f.render_widget(
        Paragraph::new(lines).scroll((offset as u16, 0)),
        chunks[0],
    );

    let footer = Paragraph::new("⌘A to toggle assistant")
        .style(Style::default().fg(Color::DarkGray))
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::Gray)),
        );
    f.render_widget(footer, chunks[1]);
}

fn card_item(card: &ServerCard, in_flight: bool, tick: u64) -> ListItem<'static> {
    let server = &card.server;
    let color = status_color(server.status);

    let dot = if in_flight || server.status.is_in_flight() {
        pending_anim(tick)
    } else {
        "●"
    };

    let mut head = vec![
        Span::styled(format!("{} ", dot), Style::default().fg(color)),
        Span::styled(
            server.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    if server.has_errors() {
        let info = if server.status == ServerState::Error {
            Color::Red
        } else {
            Color::Yellow
        };
        head.push(Span::styled(" ⓘ", Style::default().fg(info)));
    }
    match auth_action(server) {
        Some(AuthAction::Start) => head.push(Span::styled(" ⚠", Style::default().fg(Color::Red))),
        Some(AuthAction::Remove) => {
            head.push(Span::styled(" ✔", Style::default().fg(Color::Green)))
        }
        None => {}
    }
    head.push(Span::styled(" ✎ ⟳", Style::default().fg(Color::DarkGray)));
    if card.sample {
        head.push(Span::styled(" (sample)", Style::default().fg(Color::Yellow)));
    }

    let counts = Line::from(vec![
        Span::raw("    "),
        Span::raw(format!(
            "tools {} · resources {} · templates {}",
            server.tools.len(),
            server.resources.len(),
            server.resource_templates.len()
        )),
        Span::raw("  "),
        Span::styled(server.status.as_str(), Style::default().fg(color)),
    ]);

    let mut lines = vec![Line::from(head), counts];

    let source = server.source_file.clone().unwrap_or_default();
    let launch = card.block.as_ref().map(|b| b.summary()).unwrap_or_default();
    let origin = match (source.is_empty(), launch.is_empty()) {
        (false, false) => format!("{} · {}", source, launch),
        (false, true) => source,
        (true, false) => launch,
        (true, true) => String::new(),
    };
    if !origin.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("    {}", origin),
            Style::default().fg(Color::DarkGray),
        )));
    }

    if let Some(err) = server.errors.last() {
        lines.push(Line::from(Span::styled(
            format!("    {}", err),
            Style::default().fg(Color::Red),
        )));
    }

    ListItem::new(lines)
}

fn draw_servers_page(f: &mut Frame, area: Rect, page: &McpServersPage, tick: u64) {
    let has_banner = page.is_showing_samples() || page.notice().is_some();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if has_banner { 1 } else { 0 }),
            Constraint::Min(0),
        ])
        .split(area);

    if has_banner {
        let text = page
            .notice()
            .map(str::to_string)
            .unwrap_or_else(|| "Showing sample servers: none reported by the host".to_string());
        let banner = Paragraph::new(text).style(Style::default().fg(Color::Yellow));
        f.render_widget(banner, chunks[0]);
    }

    let items: Vec<ListItem> = page
        .cards()
        .iter()
        .map(|card| card_item(card, page.is_in_flight(&card.server.id), tick))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("MCP Servers"))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    if !page.cards().is_empty() {
        state.select(Some(page.selected()));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));

    let mut spans = vec![Span::raw("  ")];
    if app.selector().is_some() {
        spans.extend([
            key("↑↓"),
            Span::raw(":move  "),
            key("Enter"),
            Span::raw(":select  "),
            key("Esc"),
            Span::raw(":close"),
        ]);
    } else {
        match app.route() {
            Route::Home => spans.extend([key("m"), Span::raw(":servers  ")]),
            Route::McpServers => spans.extend([
                key("a"),
                Span::raw(":auth  "),
                key("r"),
                Span::raw(":refresh  "),
                key("e"),
                Span::raw(":edit  "),
                key("Esc"),
                Span::raw(":back  "),
            ]),
        }
        spans.extend([
            key("p"),
            Span::raw(":profile  "),
            Span::styled("q", Style::default().fg(Color::Red)),
            Span::raw(":quit"),
        ]);
    }

    if let Some(msg) = app.status_message() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            msg.to_string(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let status = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    let vertical = popup_layout[1];

    let popup_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical);

    popup_layout[1]
}
