use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::domain::email::Email;
use crate::portal::{Portal, Task, View};
use crate::terminal::state::{AppState, DashboardState, FormFields, FormScreen};

/// One dashboard entry, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailRow {
    pub sender: String,
    pub subject: String,
    pub received: String,
    pub badge: Option<String>,
    pub attachments: Vec<AttachmentLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentLine {
    pub filename: String,
    pub size: String,
}

pub fn dashboard_rows(emails: &[Email]) -> Vec<EmailRow> {
    emails
        .iter()
        .map(|e| EmailRow {
            sender: e.sender.clone(),
            subject: e.display_subject().to_string(),
            received: e.local_time(),
            badge: e.attachment_badge(),
            attachments: e
                .attachments
                .iter()
                .map(|a| AttachmentLine {
                    filename: a.filename.clone(),
                    size: a.size_kb(),
                })
                .collect(),
        })
        .collect()
}

pub fn render(f: &mut Frame, state: &AppState, portal: &Portal) {
    let banner_height = u16::from(portal.error().is_some() || portal.success().is_some());
    let [banner, body, footer] = Layout::vertical([
        Constraint::Length(banner_height),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_banner(f, banner, portal);

    match portal.view() {
        View::Login => render_form(
            f,
            body,
            &state.login,
            FormCopy {
                title: " Welcome Back ",
                subtitle: "Sign in to access your emails",
                button: if portal.task() == Some(Task::Login) {
                    "Signing In..."
                } else {
                    "Sign In"
                },
                note: None,
                switch_hint: "Don't have an account? Ctrl-r to sign up",
            },
        ),
        View::Register => render_form(
            f,
            body,
            &state.register,
            FormCopy {
                title: " Create Account ",
                subtitle: "Register your email account",
                button: if portal.task() == Some(Task::Register) {
                    "Creating Account..."
                } else {
                    "Create Account"
                },
                note: Some("Use Gmail App Password, not your regular password"),
                switch_hint: "Already have an account? Ctrl-r to sign in",
            },
        ),
        View::Dashboard => render_dashboard(
            f,
            body,
            portal.user().map(|u| u.email.as_str()),
            portal.emails(),
            portal.task(),
            &state.dashboard,
        ),
    }

    render_footer(f, footer, portal.view());
}

fn render_banner(f: &mut Frame, area: Rect, portal: &Portal) {
    if area.height == 0 {
        return;
    }
    let (text, color) = match (portal.error(), portal.success()) {
        (Some(err), _) => (err, Color::Red),
        (None, Some(ok)) => (ok, Color::Green),
        (None, None) => return,
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {text} "),
            Style::default().fg(Color::White).bg(color),
        ),
        Span::styled("  Esc to dismiss", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

struct FormCopy {
    title: &'static str,
    subtitle: &'static str,
    button: &'static str,
    note: Option<&'static str>,
    switch_hint: &'static str,
}

fn render_form<F: FormFields>(f: &mut Frame, area: Rect, screen: &FormScreen<F>, copy: FormCopy) {
    let form = &screen.form;
    let labels = form.labels();

    let mut lines = vec![
        Line::styled(copy.subtitle, Style::default().fg(Color::Gray)),
        Line::raw(""),
    ];
    for (idx, label) in labels.iter().enumerate() {
        let focused = idx == screen.field;
        let value = form.value(idx);
        let shown = if form.is_secret(idx) {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        let cursor = if focused { "_" } else { "" };
        let value_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            *label,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::from(vec![
            Span::raw(if focused { "➜ " } else { "  " }),
            Span::styled(format!("{shown}{cursor}"), value_style),
        ]));
        if let Some(note) = copy.note
            && idx == 2
        {
            lines.push(Line::styled(note, Style::default().fg(Color::DarkGray)));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        format!("[ {} ]", copy.button),
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    ));
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        copy.switch_hint,
        Style::default().fg(Color::Gray),
    ));

    let height = lines.len() as u16 + 2;
    let area = centered(area, 60, height);
    let p = Paragraph::new(Text::from(lines))
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .title(copy.title)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

pub fn render_dashboard(
    f: &mut Frame,
    area: Rect,
    user: Option<&str>,
    emails: &[Email],
    task: Option<Task>,
    dash: &DashboardState,
) {
    let [header, content] =
        Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);

    let header_block = Block::default()
        .title(" Email Manager ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let status = match task {
        Some(Task::Refresh) => "   [Refreshing...]  [l Logout]",
        Some(Task::Download) => "   [r Refresh]  [l Logout]  Downloading...",
        Some(Task::Logout) => "   [r Refresh]  [Signing out...]",
        _ => "   [r Refresh]  [l Logout]",
    };
    let header_text = Text::from(vec![
        Line::from(vec![
            Span::raw(format!("Welcome, {}", user.unwrap_or_default())),
            Span::styled(status, Style::default().fg(Color::Gray)),
        ]),
        Line::styled(
            format!("{} emails found", emails.len()),
            Style::default().fg(Color::Gray),
        ),
    ]);
    f.render_widget(Paragraph::new(header_text).block(header_block), header);

    let list_block = Block::default()
        .title(" Inbox ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    if task == Some(Task::Refresh) {
        f.render_widget(Paragraph::new("Loading emails...").block(list_block), content);
        return;
    }
    if emails.is_empty() {
        f.render_widget(Paragraph::new("No emails found").block(list_block), content);
        return;
    }

    let selected = dash.selected();
    let items: Vec<ListItem> = dashboard_rows(emails)
        .into_iter()
        .enumerate()
        .map(|(i, row)| row_item(row, (selected == Some(i)).then_some(dash.attachment)))
        .collect();

    let list = List::new(items)
        .block(list_block)
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Green));

    f.render_stateful_widget(list, content, &mut dash.list_state.clone());
}

fn row_item(row: EmailRow, active_attachment: Option<usize>) -> ListItem<'static> {
    let mut head = vec![Span::styled(
        row.sender,
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(badge) = row.badge {
        head.push(Span::raw("  "));
        head.push(Span::styled(badge, Style::default().fg(Color::Blue)));
    }

    let mut lines = vec![
        Line::from(head),
        Line::raw(row.subject),
        Line::styled(row.received, Style::default().fg(Color::DarkGray)),
    ];
    for (idx, att) in row.attachments.into_iter().enumerate() {
        let style = if active_attachment == Some(idx) {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::styled(format!("  - {}  {}", att.filename, att.size), style));
    }
    lines.push(Line::raw(""));
    ListItem::new(Text::from(lines))
}

fn render_footer(f: &mut Frame, area: Rect, view: View) {
    let keys: &[(&str, &str)] = match view {
        View::Login | View::Register => &[
            ("Tab", " next field  "),
            ("Enter", " submit  "),
            ("Ctrl-r", " switch form  "),
            ("Esc", " dismiss/quit"),
        ],
        View::Dashboard => &[
            ("j/k", " move  "),
            ("[/]", " attachment  "),
            ("d", " download  "),
            ("r", " refresh  "),
            ("l", " logout  "),
            ("q", " quit"),
        ],
    };
    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(k, label)| {
            [
                Span::styled(*k, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(*label),
            ]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::email::Attachment;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    fn email(id: &str, flagged: bool, files: &[&str]) -> Email {
        Email {
            id: id.into(),
            sender: format!("sender{id}@example.com"),
            subject: format!("Subject {id}"),
            timestamp: "2024-02-03T04:05:06".into(),
            has_attachments: flagged,
            attachments: files
                .iter()
                .map(|f| Attachment {
                    filename: f.to_string(),
                    content_type: None,
                    size: 1536,
                })
                .collect(),
        }
    }

    fn buffer_text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn one_row_per_email_with_badges() {
        let emails = vec![
            email("1", false, &[]),
            email("2", true, &["a.pdf"]),
            email("3", true, &["a.pdf", "b.zip"]),
        ];
        let rows = dashboard_rows(&emails);

        assert_eq!(rows.len(), 3);
        let badges: Vec<_> = rows.iter().map(|r| r.badge.as_deref()).collect();
        assert_eq!(badges, vec![None, Some("1 attachment"), Some("2 attachments")]);
        assert_eq!(
            rows[1].attachments,
            vec![AttachmentLine {
                filename: "a.pdf".into(),
                size: "1.5 KB".into(),
            }]
        );
        assert_eq!(rows[0].received, "2024-02-03 04:05");
    }

    #[test]
    fn draws_dashboard() {
        let emails = vec![email("1", false, &[]), email("2", true, &["a.pdf", "b.zip"])];
        let mut dash = DashboardState::default();
        dash.sync(&emails);

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                render_dashboard(f, area, Some("me@example.com"), &emails, None, &dash);
            })
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());

        assert!(text.contains("Welcome, me@example.com"));
        assert!(text.contains("2 emails found"));
        assert!(text.contains("Subject 1"));
        assert!(text.contains("2 attachments"));
        assert!(text.contains("b.zip  1.5 KB"));
        assert!(!text.contains("1 attachment "));
    }

    #[test]
    fn draws_empty_and_loading_states() {
        let dash = DashboardState::default();
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();

        terminal
            .draw(|f| {
                let area = f.area();
                render_dashboard(f, area, Some("me@example.com"), &[], None, &dash);
            })
            .unwrap();
        assert!(buffer_text(terminal.backend().buffer()).contains("No emails found"));

        terminal
            .draw(|f| {
                let area = f.area();
                render_dashboard(
                    f,
                    area,
                    Some("me@example.com"),
                    &[],
                    Some(Task::Refresh),
                    &dash,
                );
            })
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Loading emails..."));
        assert!(text.contains("Refreshing..."));
    }

    #[test]
    fn download_in_progress_keeps_the_list() {
        let emails = vec![email("1", true, &["a.pdf"])];
        let mut dash = DashboardState::default();
        dash.sync(&emails);
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();

        terminal
            .draw(|f| {
                let area = f.area();
                render_dashboard(
                    f,
                    area,
                    Some("me@example.com"),
                    &emails,
                    Some(Task::Download),
                    &dash,
                );
            })
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());

        assert!(text.contains("Downloading..."));
        assert!(text.contains("Subject 1"));
        assert!(!text.contains("Refreshing..."));
        assert!(!text.contains("Loading emails..."));
    }
}
