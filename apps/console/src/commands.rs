use std::{process::ExitCode, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use client_core::{
    AppContext, ClientError, Confirmer, EditTarget, HttpAdminClient, ListController, Record,
    RecordEditor, Route, TopShortcutsBoard,
};
use shared::{
    domain::TopWindow,
    protocol::{normalize_code, Shortcut, User},
};
use tracing::{debug, info};

use crate::terminal::{self, NoticePrinter};

/// Page size used when a command has to find one record by its code or email.
const LOOKUP_LIMIT: u32 = 500;

/// How a command ended, once everything worth saying has been printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The failure was already shown as an error notice.
    Reported,
    /// The API wants a session; the login URL was already shown.
    SignInRequired,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::Reported => ExitCode::FAILURE,
            Outcome::SignInRequired => ExitCode::from(2),
        }
    }
}

/// Client errors raised by the console core have already reached the
/// operator, as a notice or as the login redirect. Only the rest is left
/// for `main` to print.
pub(crate) fn settle(result: Result<()>) -> Result<Outcome> {
    let err = match result {
        Ok(()) => return Ok(Outcome::Done),
        Err(err) => err,
    };
    match err.downcast_ref::<ClientError>() {
        Some(ClientError::Unauthorized) => Ok(Outcome::SignInRequired),
        Some(ClientError::SaveInProgress) | None => Err(err),
        Some(client_err) => {
            debug!(error = %client_err, "command failed after notice");
            Ok(Outcome::Reported)
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage short links.
    Shortcuts {
        #[command(subcommand)]
        action: ShortcutAction,
    },
    /// Manage console users (admins only).
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Most visited shortcuts today, this week and this month.
    Top,
    /// Show the signed-in account.
    Whoami,
    /// End the session at the auth gateway.
    Logout,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Only show records starting with this text.
    #[arg(long, default_value = "")]
    pub search: String,
}

#[derive(Subcommand, Debug)]
pub enum ShortcutAction {
    List(ListArgs),
    Create {
        code: String,
        url: String,
    },
    Edit {
        code: String,
        #[arg(long)]
        new_code: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    Delete {
        code: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    List(ListArgs),
    Create {
        name: String,
        email: String,
        #[arg(long)]
        admin: bool,
        #[arg(long)]
        inactive: bool,
    },
    /// `who` is the user's name or email.
    Edit {
        who: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        admin: Option<bool>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete {
        who: String,
    },
}

pub struct Console {
    api: Arc<HttpAdminClient>,
    ctx: AppContext,
    confirmer: Arc<dyn Confirmer>,
    page_size: u32,
    notices: NoticePrinter,
}

impl Console {
    pub fn new(
        api: Arc<HttpAdminClient>,
        ctx: AppContext,
        confirmer: Arc<dyn Confirmer>,
        page_size: u32,
    ) -> Self {
        let notices = NoticePrinter::new(ctx.subscribe_events());
        Self {
            api,
            ctx,
            confirmer,
            page_size,
            notices,
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<Outcome> {
        let outcome = match command {
            Command::Shortcuts { action } => self.shortcuts(action).await,
            Command::Users { action } => self.users(action).await,
            Command::Top => self.top().await,
            Command::Whoami => self.whoami().await,
            Command::Logout => {
                self.ctx.logout();
                Ok(())
            }
        };
        self.notices.flush();
        settle(outcome)
    }

    /// Switches to `route`, checking the signed-in account first when the
    /// view is reserved for admins.
    async fn enter(&self, route: Route) -> Result<()> {
        if route.requires_admin() {
            self.require_admin().await?;
        }
        self.ctx.navigate(route);
        Ok(())
    }

    fn shortcut_list(&self, limit: u32) -> ListController<Shortcut> {
        ListController::new(
            self.api.clone(),
            self.ctx.clone(),
            self.confirmer.clone(),
            limit,
        )
    }

    fn user_list(&self, limit: u32) -> ListController<User> {
        ListController::new(
            self.api.clone(),
            self.ctx.clone(),
            self.confirmer.clone(),
            limit,
        )
    }

    async fn shortcuts(&self, action: ShortcutAction) -> Result<()> {
        match action {
            ShortcutAction::List(args) => {
                self.enter(Shortcut::list_route()).await?;
                let list = self.shortcut_list(self.page_size);
                list.load(args.page, &args.search).await?;
                let state = list.snapshot().await;
                print!(
                    "{}",
                    terminal::render_shortcuts(&state, |code| self.ctx.share_link(code))
                );
            }
            ShortcutAction::Create { code, url } => {
                self.enter(Shortcut::new_route()).await?;
                let editor = RecordEditor::<Shortcut>::open(
                    self.api.clone(),
                    self.ctx.clone(),
                    EditTarget::New,
                );
                editor.set_code(&code).await;
                editor.set_url(&url).await;
                let saved = editor.save().await?;
                let code = editor.draft().await.code;
                info!(id = saved.id, %code, "shortcut created");
                println!("{}", self.ctx.share_link(&code));
            }
            ShortcutAction::Edit {
                code,
                new_code,
                url,
            } => {
                let record = self.find_shortcut(&code).await?;
                self.enter(record.clone().edit_route()).await?;
                let editor = RecordEditor::<Shortcut>::open(
                    self.api.clone(),
                    self.ctx.clone(),
                    EditTarget::for_record(Some(record)),
                );
                if let Some(line) = editor.last_updated_line().await {
                    println!("{line}");
                }
                if let Some(new_code) = new_code {
                    editor.set_code(&new_code).await;
                }
                if let Some(url) = url {
                    editor.set_url(&url).await;
                }
                editor.save().await?;
            }
            ShortcutAction::Delete { code } => {
                let record = self.find_shortcut(&code).await?;
                if !self.shortcut_list(self.page_size).delete(&record).await? {
                    println!("Cancelled.");
                }
            }
        }
        Ok(())
    }

    async fn find_shortcut(&self, code: &str) -> Result<Shortcut> {
        let code = normalize_code(code.trim());
        let list = self.shortcut_list(LOOKUP_LIMIT);
        list.search(&code).await?;
        list.records()
            .await
            .into_iter()
            .find(|shortcut| shortcut.code == code)
            .with_context(|| format!("no shortcut with code '{code}'"))
    }

    async fn require_admin(&self) -> Result<()> {
        if self.ctx.current_user().await.is_none() {
            self.ctx.refresh_current_user(self.api.as_ref()).await?;
        }
        if !self.ctx.can_manage_users().await {
            bail!("managing users requires an admin account");
        }
        Ok(())
    }

    async fn users(&self, action: UserAction) -> Result<()> {
        self.enter(User::list_route()).await?;
        match action {
            UserAction::List(args) => {
                let list = self.user_list(self.page_size);
                list.load(args.page, &args.search).await?;
                print!("{}", terminal::render_users(&list.snapshot().await));
            }
            UserAction::Create {
                name,
                email,
                admin,
                inactive,
            } => {
                self.enter(User::new_route()).await?;
                let editor =
                    RecordEditor::<User>::open(self.api.clone(), self.ctx.clone(), EditTarget::New);
                editor.set_name(&name).await;
                editor.set_email(&email).await;
                editor.set_admin(admin).await;
                editor.set_active(!inactive).await;
                let saved = editor.save().await?;
                info!(id = saved.id, "user created");
            }
            UserAction::Edit {
                who,
                name,
                email,
                admin,
                active,
            } => {
                let record = self.find_user(&who).await?;
                self.enter(record.clone().edit_route()).await?;
                let editor = RecordEditor::<User>::open(
                    self.api.clone(),
                    self.ctx.clone(),
                    EditTarget::for_record(Some(record)),
                );
                if let Some(line) = editor.last_login_line().await {
                    println!("{line}");
                }
                editor
                    .edit(|user| {
                        if let Some(name) = name {
                            user.name = name;
                        }
                        if let Some(email) = email {
                            user.email = email;
                        }
                        if let Some(admin) = admin {
                            user.admin = admin;
                        }
                        if let Some(active) = active {
                            user.active = active;
                        }
                    })
                    .await;
                editor.save().await?;
            }
            UserAction::Delete { who } => {
                let record = self.find_user(&who).await?;
                if !self.user_list(self.page_size).delete(&record).await? {
                    println!("Cancelled.");
                }
            }
        }
        Ok(())
    }

    async fn find_user(&self, who: &str) -> Result<User> {
        let who = who.trim();
        let list = self.user_list(LOOKUP_LIMIT);
        list.load(1, "").await?;
        list.records()
            .await
            .into_iter()
            .find(|user| user.name == who || user.email.eq_ignore_ascii_case(who))
            .with_context(|| format!("no user named '{who}'"))
    }

    async fn top(&self) -> Result<()> {
        self.enter(Route::Visits).await?;
        let board = TopShortcutsBoard::new(self.api.clone(), self.ctx.clone());
        board.load().await?;
        for window in TopWindow::ALL {
            print!(
                "{}",
                terminal::render_top_window(window, &board.window(window).await)
            );
        }
        Ok(())
    }

    async fn whoami(&self) -> Result<()> {
        let me = self.ctx.refresh_current_user(self.api.as_ref()).await?;
        println!("{} <{}>", me.name, me.email);
        if me.admin {
            println!("admin");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
