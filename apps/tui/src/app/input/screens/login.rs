use crate::app::state::{App, LoginField};
use crossterm::event::KeyCode;

pub fn handle_login_input(app: &mut App, key: KeyCode) {
    if app.login.submitting {
        return;
    }

    match key {
        KeyCode::Esc => {
            app.running = false;
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
            app.login.field = match app.login.field {
                LoginField::Email => LoginField::Password,
                LoginField::Password => LoginField::Email,
            };
        }
        KeyCode::Enter => match app.login.field {
            LoginField::Email => app.login.field = LoginField::Password,
            LoginField::Password => app.submit_login(),
        },
        KeyCode::Backspace => {
            match app.login.field {
                LoginField::Email => app.login.email.pop(),
                LoginField::Password => app.login.password.pop(),
            };
        }
        KeyCode::Char(c) => {
            app.login.error = None;
            match app.login.field {
                LoginField::Email => app.login.email.push(c),
                LoginField::Password => app.login.password.push(c),
            }
        }
        _ => {}
    }
}
