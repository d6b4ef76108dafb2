//! Terminal renditions of the console's navigation, confirmation and notice
//! seams, plus plain-text tables.

use std::io::{self, BufRead, Write};

use client_core::{ClientEvent, Confirmer, ListState, Navigator, NoticeLevel, Route};
use shared::{
    domain::TopWindow,
    protocol::{Shortcut, User},
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

/// A terminal has no views to switch between; leaving the console means
/// pointing the operator at a browser.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        debug!(path = route.path(), "view changed");
    }

    fn redirect_external(&self, url: &str) {
        eprintln!("Open {url} in a browser to continue.");
    }
}

pub struct StdinConfirmer {
    assume_yes: bool,
}

impl StdinConfirmer {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prints notices emitted on the context's event channel.
pub struct NoticePrinter {
    rx: broadcast::Receiver<ClientEvent>,
}

impl NoticePrinter {
    pub fn new(rx: broadcast::Receiver<ClientEvent>) -> Self {
        Self { rx }
    }

    pub fn flush(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(ClientEvent::Notice { level, message }) => match level {
                    NoticeLevel::Error => eprintln!("error: {message}"),
                    NoticeLevel::Success | NoticeLevel::Info => println!("{message}"),
                },
                Ok(ClientEvent::CurrentUserChanged(_)) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "notice printer lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

fn date_of(raw: &str, parsed: Option<chrono::DateTime<chrono::Utc>>) -> String {
    match parsed {
        Some(at) => at.format("%Y-%m-%d").to_string(),
        None if raw.is_empty() => "-".to_string(),
        None => raw.to_string(),
    }
}

fn footer<R>(state: &ListState<R>, noun: &str) -> String {
    format!(
        "Page {} of {} ({} {noun}{})",
        state.page,
        state.page_count().max(1),
        state.total_count,
        if state.total_count == 1 { "" } else { "s" }
    )
}

pub fn render_shortcuts(state: &ListState<Shortcut>, share_link: impl Fn(&str) -> String) -> String {
    if state.shows_empty_state() {
        return "No shortcuts found.\n".to_string();
    }
    let mut out = format!("{:>6}  {:<24}  {:<10}  {}\n", "ID", "LINK", "UPDATED", "TARGET");
    for shortcut in &state.records {
        out.push_str(&format!(
            "{:>6}  {:<24}  {:<10}  {}\n",
            shortcut.id,
            share_link(&shortcut.code),
            date_of(&shortcut.updated_at, shortcut.updated()),
            shortcut.url
        ));
    }
    out.push_str(&footer(state, "shortcut"));
    out.push('\n');
    out
}

pub fn render_users(state: &ListState<User>) -> String {
    if state.shows_empty_state() {
        return "No users found.\n".to_string();
    }
    let mut out = format!(
        "{:>6}  {:<20}  {:<28}  {:<6}  {:<5}  {}\n",
        "ID", "NAME", "EMAIL", "ACTIVE", "ADMIN", "LAST LOGIN"
    );
    for user in &state.records {
        let last_login = if user.has_logged_in() {
            date_of(&user.last_logged_in, user.last_login())
        } else {
            "never".to_string()
        };
        out.push_str(&format!(
            "{:>6}  {:<20}  {:<28}  {:<6}  {:<5}  {}\n",
            user.id,
            user.name,
            user.email,
            if user.active { "yes" } else { "no" },
            if user.admin { "yes" } else { "no" },
            last_login
        ));
    }
    out.push_str(&footer(state, "user"));
    out.push('\n');
    out
}

pub fn render_top_window(window: TopWindow, shortcuts: &[Shortcut]) -> String {
    let mut out = format!("{}\n", window.label());
    if shortcuts.is_empty() {
        out.push_str("  (no visits)\n");
        return out;
    }
    for (rank, shortcut) in shortcuts.iter().enumerate() {
        out.push_str(&format!(
            "  {:>2}. {:<24} {:>8}\n",
            rank + 1,
            shortcut.code,
            shortcut.total_visits.unwrap_or_default()
        ));
    }
    out
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
