use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::domain::email::Email;
use crate::portal::forms::RegisterForm;
use crate::portal::{Portal, View};
use crate::terminal::state::{Action, AppState, DashboardState, FormFields, FormScreen};

/// Translate a key press into an action. Typing into forms and moving the
/// selection happen here directly; everything touching the session is returned.
pub fn handle_key(key: KeyEvent, state: &mut AppState, portal: &Portal) -> Option<Action> {
    let view = portal.view();

    // AltGr arrives as Ctrl+Alt on some platforms and types plain characters.
    if key.modifiers.contains(KeyModifiers::CONTROL) && !key.modifiers.contains(KeyModifiers::ALT)
    {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('x') => Some(Action::DismissMessage),
            KeyCode::Char('r') if view == View::Login => Some(Action::ShowRegister),
            KeyCode::Char('r') if view == View::Register => Some(Action::ShowLogin),
            _ => None,
        };
    }

    if key.code == KeyCode::Esc {
        if portal.error().is_some() || portal.success().is_some() {
            return Some(Action::DismissMessage);
        }
        return Some(Action::Quit);
    }

    match view {
        View::Login => handle_form_keys(key, &mut state.login, Action::Login),
        View::Register => handle_form_keys(key, &mut state.register, Action::Register),
        View::Dashboard => handle_dashboard_keys(key, &mut state.dashboard, portal.emails()),
    }
}

fn handle_form_keys<F: FormFields>(
    key: KeyEvent,
    screen: &mut FormScreen<F>,
    submit: Action,
) -> Option<Action> {
    match key.code {
        KeyCode::Enter => return Some(submit),
        KeyCode::Tab | KeyCode::Down => screen.next_field(),
        KeyCode::BackTab | KeyCode::Up => screen.prev_field(),
        KeyCode::Backspace => screen.backspace(),
        KeyCode::Char(c) => screen.type_char(c),
        _ => {}
    }
    None
}

fn handle_dashboard_keys(
    key: KeyEvent,
    dash: &mut DashboardState,
    emails: &[Email],
) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => return Some(Action::Quit),
        KeyCode::Char('r') => return Some(Action::Refresh),
        KeyCode::Char('l') => return Some(Action::Logout),
        KeyCode::Char('d') | KeyCode::Enter => {
            return dash
                .selected_attachment(emails)
                .map(|(email, att)| Action::Download {
                    email_id: email.id.clone(),
                    filename: att.filename.clone(),
                });
        }
        KeyCode::Down | KeyCode::Char('j') => dash.move_selection(1, emails.len()),
        KeyCode::Up | KeyCode::Char('k') => dash.move_selection(-1, emails.len()),
        KeyCode::Home => dash.move_selection(i32::MIN / 2, emails.len()),
        KeyCode::End => dash.move_selection(i32::MAX / 2, emails.len()),
        KeyCode::Char(']') | KeyCode::Right => {
            let count = attachment_count(dash, emails);
            dash.cycle_attachment(1, count);
        }
        KeyCode::Char('[') | KeyCode::Left => {
            let count = attachment_count(dash, emails);
            dash.cycle_attachment(-1, count);
        }
        _ => {}
    }
    None
}

fn attachment_count(dash: &DashboardState, emails: &[Email]) -> usize {
    dash.selected()
        .and_then(|i| emails.get(i))
        .map_or(0, |e| e.attachments.len())
}

/// Run `action` against the portal and keep the screen state in step with it.
pub fn apply(action: Action, state: &mut AppState, portal: &mut Portal) {
    match action {
        Action::Login => {
            portal.login(&state.login.form);
            if portal.view() == View::Dashboard {
                state.login = FormScreen::new(Default::default());
                state.dashboard = DashboardState::default();
            }
        }
        Action::Register => {
            portal.register(&state.register.form);
            if portal.view() == View::Login {
                let email = state.register.form.email.trim().to_string();
                state.register = FormScreen::new(RegisterForm::new(portal.imap_defaults()));
                state.login = FormScreen::new(Default::default());
                state.login.form.email = email;
                state.login.field = 1;
            }
        }
        Action::Refresh => portal.fetch_emails(),
        Action::Download { email_id, filename } => {
            portal.download_attachment(&email_id, &filename)
        }
        Action::Logout => {
            portal.logout();
            state.dashboard = DashboardState::default();
        }
        Action::ShowLogin => portal.show_login(),
        Action::ShowRegister => portal.show_register(),
        Action::DismissMessage => {
            portal.dismiss_error();
            portal.dismiss_success();
        }
        Action::Quit => {}
    }
    state.dashboard.sync(portal.emails());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockBackend, TokenResponse};
    use crate::auth::MemoryTokenStore;
    use crate::domain::email::Attachment;
    use crate::domain::session::UserProfile;
    use crate::portal::forms::ImapDefaults;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn portal(mock: MockBackend, token: Option<&str>) -> (Portal, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::default(),
        };
        let p = Portal::new(
            Box::new(mock),
            Box::new(store),
            dir.path().to_path_buf(),
            ImapDefaults::default(),
        );
        (p, dir)
    }

    fn inbox() -> Vec<Email> {
        vec![
            Email {
                id: "1".into(),
                sender: "a@example.com".into(),
                subject: "no files".into(),
                timestamp: "2024-01-01T00:00:00".into(),
                has_attachments: false,
                attachments: vec![],
            },
            Email {
                id: "2".into(),
                sender: "b@example.com".into(),
                subject: "two files".into(),
                timestamp: "2024-01-02T00:00:00".into(),
                has_attachments: true,
                attachments: ["x.pdf", "y.png"]
                    .iter()
                    .map(|f| Attachment {
                        filename: f.to_string(),
                        content_type: None,
                        size: 1,
                    })
                    .collect(),
            },
        ]
    }

    fn signed_in() -> (Portal, TempDir, AppState) {
        signed_in_with(|_| {})
    }

    fn signed_in_with(extra: impl FnOnce(&mut MockBackend)) -> (Portal, TempDir, AppState) {
        let mut mock = MockBackend::new();
        extra(&mut mock);
        mock.expect_profile().returning(|_| {
            Ok(UserProfile {
                email: "me@example.com".into(),
                created_at: None,
            })
        });
        mock.expect_emails().returning(|_| Ok(inbox()));
        let (mut p, dir) = portal(mock, Some("tok"));
        p.restore();
        let mut state = AppState::new(p.imap_defaults());
        state.dashboard.sync(p.emails());
        (p, dir, state)
    }

    #[test]
    fn typing_fills_focused_field() {
        let (p, _dir) = portal(MockBackend::new(), None);
        let mut state = AppState::new(p.imap_defaults());

        for c in "me@x.io".chars() {
            assert_eq!(handle_key(key(KeyCode::Char(c)), &mut state, &p), None);
        }
        handle_key(key(KeyCode::Tab), &mut state, &p);
        for c in "pw".chars() {
            handle_key(key(KeyCode::Char(c)), &mut state, &p);
        }
        handle_key(key(KeyCode::Backspace), &mut state, &p);

        assert_eq!(state.login.form.email, "me@x.io");
        assert_eq!(state.login.form.password, "p");
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state, &p),
            Some(Action::Login)
        );
    }

    #[test]
    fn altgr_chars_are_typed() {
        let (p, _dir) = portal(MockBackend::new(), None);
        let mut state = AppState::new(p.imap_defaults());
        let altgr = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL | KeyModifiers::ALT);

        for c in "me".chars() {
            handle_key(key(KeyCode::Char(c)), &mut state, &p);
        }
        assert_eq!(handle_key(altgr('@'), &mut state, &p), None);
        assert_eq!(handle_key(altgr('r'), &mut state, &p), None);

        assert_eq!(state.login.form.email, "me@r");
        assert_eq!(p.view(), View::Login);
    }

    #[test]
    fn ctrl_r_toggles_forms() {
        let (mut p, _dir) = portal(MockBackend::new(), None);
        let mut state = AppState::new(p.imap_defaults());

        let a = handle_key(ctrl('r'), &mut state, &p).unwrap();
        assert_eq!(a, Action::ShowRegister);
        apply(a, &mut state, &mut p);
        assert_eq!(p.view(), View::Register);

        let a = handle_key(ctrl('r'), &mut state, &p).unwrap();
        assert_eq!(a, Action::ShowLogin);
        apply(a, &mut state, &mut p);
        assert_eq!(p.view(), View::Login);
    }

    #[test]
    fn q_is_text_on_forms_but_quits_dashboard() {
        let (p, _dir) = portal(MockBackend::new(), None);
        let mut state = AppState::new(p.imap_defaults());
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state, &p), None);
        assert_eq!(state.login.form.email, "q");

        let (p, _dir, mut state) = signed_in();
        assert_eq!(
            handle_key(key(KeyCode::Char('q')), &mut state, &p),
            Some(Action::Quit)
        );
    }

    #[test]
    fn download_targets_selected_attachment() {
        let (p, _dir, mut state) = signed_in();

        // first email has nothing to download
        assert_eq!(handle_key(key(KeyCode::Char('d')), &mut state, &p), None);

        handle_key(key(KeyCode::Char('j')), &mut state, &p);
        handle_key(key(KeyCode::Char(']')), &mut state, &p);
        assert_eq!(
            handle_key(key(KeyCode::Char('d')), &mut state, &p),
            Some(Action::Download {
                email_id: "2".into(),
                filename: "y.png".into(),
            })
        );
    }

    #[test]
    fn esc_dismisses_before_quitting() {
        let mut mock = MockBackend::new();
        mock.expect_login()
            .returning(|_| Err(crate::api::ApiError::Unauthorized("nope".into())));
        let (mut p, _dir) = portal(mock, None);
        let mut state = AppState::new(p.imap_defaults());
        state.login.form.email = "me@example.com".into();
        state.login.form.password = "bad".into();

        apply(Action::Login, &mut state, &mut p);
        assert_eq!(p.error(), Some("nope"));

        let a = handle_key(key(KeyCode::Esc), &mut state, &p).unwrap();
        assert_eq!(a, Action::DismissMessage);
        apply(a, &mut state, &mut p);
        assert_eq!(p.error(), None);
        assert_eq!(handle_key(key(KeyCode::Esc), &mut state, &p), Some(Action::Quit));
    }

    #[test]
    fn successful_login_resets_form() {
        let mut mock = MockBackend::new();
        mock.expect_login().returning(|_| {
            Ok(TokenResponse {
                access_token: "tok".into(),
                token_type: None,
            })
        });
        mock.expect_profile().returning(|_| {
            Ok(UserProfile {
                email: "me@example.com".into(),
                created_at: None,
            })
        });
        mock.expect_emails().returning(|_| Ok(inbox()));
        let (mut p, _dir) = portal(mock, None);
        let mut state = AppState::new(p.imap_defaults());
        state.login.form.email = "me@example.com".into();
        state.login.form.password = "pw".into();

        apply(Action::Login, &mut state, &mut p);

        assert_eq!(p.view(), View::Dashboard);
        assert!(state.login.form.password.is_empty());
        assert_eq!(state.dashboard.selected(), Some(0));
    }

    #[test]
    fn logout_resets_selection() {
        let (mut p, _dir, mut state) = signed_in_with(|mock| {
            mock.expect_logout().times(1).returning(|_| Ok(()));
        });
        handle_key(key(KeyCode::Char('j')), &mut state, &p);
        assert_eq!(state.dashboard.selected(), Some(1));

        let a = handle_key(key(KeyCode::Char('l')), &mut state, &p).unwrap();
        apply(a, &mut state, &mut p);

        assert_eq!(p.view(), View::Login);
        assert!(p.emails().is_empty());
        assert_eq!(state.dashboard.selected(), None);
    }
}
