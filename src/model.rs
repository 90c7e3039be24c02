use std::time::Instant;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, error, info, trace};

use crate::chat::ChatWindow;
use crate::deferred::{Deferred, Poll};
use crate::domain::{HELP_TEXT, Message, TSConfig, TSError};
use crate::inputter::{InputEvent, Inputter};
use crate::list_view::ListView;
use crate::report::export_report;
use crate::session::{Credentials, LoginError, LoginForm, Session, User};
use crate::upload::{FileUploader, PathInput};
use crate::views::{
    DashboardStat, SheetStatus, TermSheet, dashboard_stats, next_id, previous_uploads,
    upload_history, validation_report,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Dashboard,
    Upload,
    Validate,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Login => "Login",
            Page::Dashboard => "Dashboard",
            Page::Upload => "Upload",
            Page::Validate => "Validate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modus {
    LOGIN,
    TABLE,
    SEARCH,
    EDIT,
    CHAT,
    UPLOADPATH,
    POPUP,
}

pub struct Popup {
    pub title: String,
    pub body: String,
}

pub struct Model {
    config: TSConfig,
    pub status: Status,
    page: Page,
    modus: Modus,
    previous_modus: Modus,
    session: Box<dyn Session>,
    login_form: LoginForm,
    login_op: Option<Deferred<Credentials>>,
    upload_history: ListView,
    previous_uploads: ListView,
    validation_report: ListView,
    stats: Vec<DashboardStat>,
    uploader: FileUploader,
    chat: ChatWindow,
    search_input: Inputter,
    search_backup: String,
    popup: Option<Popup>,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &TSConfig, session: Box<dyn Session>) -> Self {
        let (page, modus) = if session.is_authenticated() {
            (Page::Dashboard, Modus::TABLE)
        } else {
            (Page::Login, Modus::LOGIN)
        };
        Self {
            config: config.clone(),
            status: Status::READY,
            page,
            modus,
            previous_modus: modus,
            session,
            login_form: LoginForm::default(),
            login_op: None,
            upload_history: upload_history(),
            previous_uploads: previous_uploads(),
            validation_report: validation_report(),
            stats: dashboard_stats(),
            uploader: FileUploader::default(),
            chat: ChatWindow::new(config.mock_latency, config.operation_timeout),
            search_input: Inputter::default(),
            search_backup: String::new(),
            popup: None,
            clipboard: None,
            status_message: "Started tsdesk!".to_string(),
            last_status_message_update: Instant::now(),
        }
    }

    // -------------------- Accessors for the ui ---------------------------- //

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user()
    }

    pub fn login_form(&self) -> &LoginForm {
        &self.login_form
    }

    pub fn is_logging_in(&self) -> bool {
        self.login_op.is_some()
    }

    pub fn stats(&self) -> &[DashboardStat] {
        &self.stats
    }

    pub fn uploader(&self) -> &FileUploader {
        &self.uploader
    }

    pub fn chat(&self) -> &ChatWindow {
        &self.chat
    }

    pub fn search_input(&self) -> &Inputter {
        &self.search_input
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// The status message, while it is still fresh.
    pub fn status_message(&self) -> Option<&str> {
        (self.last_status_message_update.elapsed() < self.config.status_message_ttl)
            .then_some(self.status_message.as_str())
    }

    pub fn active_list(&self) -> Option<&ListView> {
        match self.page {
            Page::Login => None,
            Page::Dashboard => Some(&self.upload_history),
            Page::Upload => Some(&self.previous_uploads),
            Page::Validate => Some(&self.validation_report),
        }
    }

    fn active_list_mut(&mut self) -> Option<&mut ListView> {
        match self.page {
            Page::Login => None,
            Page::Dashboard => Some(&mut self.upload_history),
            Page::Upload => Some(&mut self.previous_uploads),
            Page::Validate => Some(&mut self.validation_report),
        }
    }

    /// While true, the controller forwards keys untranslated.
    pub fn raw_keyevents(&self) -> bool {
        matches!(
            self.modus,
            Modus::LOGIN | Modus::SEARCH | Modus::EDIT | Modus::CHAT | Modus::UPLOADPATH
        )
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    fn set_modus(&mut self, modus: Modus) {
        trace!("Modus {:?} -> {:?}", self.modus, modus);
        self.previous_modus = self.modus;
        self.modus = modus;
    }

    // -------------------- Message handling -------------------------------- //

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TSError> {
        let Some(msg) = message else {
            return Ok(());
        };
        match msg {
            Message::Quit => self.quit(),
            Message::Tick => self.tick(),
            Message::Resize(width, height) => {
                trace!("UI was resized to {}x{}", width, height);
            }
            Message::RawKey(key) => self.raw_input(key),
            msg => match self.modus {
                Modus::TABLE => self.table_message(msg),
                Modus::POPUP => {
                    if matches!(msg, Message::Exit | Message::Enter | Message::Help) {
                        self.close_popup();
                    }
                }
                _ => (),
            },
        }
        Ok(())
    }

    fn table_message(&mut self, msg: Message) {
        match msg {
            Message::MoveUp => self.with_list(|l| l.move_selection(-1, 0)),
            Message::MoveDown => self.with_list(|l| l.move_selection(1, 0)),
            Message::MoveLeft => self.with_list(|l| l.move_selection(0, -1)),
            Message::MoveRight => self.with_list(|l| l.move_selection(0, 1)),
            Message::MoveBeginning => self.with_list(|l| l.select_first()),
            Message::MoveEnd => self.with_list(|l| l.select_last()),
            Message::Enter | Message::EditCell => self.begin_edit(),
            Message::Search => self.enter_search(),
            Message::CycleFilter => self.with_list(|l| l.cycle_filter_mode()),
            Message::ClearSearch => self.with_list(|l| l.clear_search()),
            Message::ViewRow => self.view_row(),
            Message::DeleteRow => self.delete_row(),
            Message::ShowDashboard => self.show_page(Page::Dashboard),
            Message::ShowUpload => self.show_page(Page::Upload),
            Message::ShowValidate => self.show_page(Page::Validate),
            Message::SelectFile if self.page == Page::Upload => {
                self.set_modus(Modus::UPLOADPATH)
            }
            Message::SubmitUpload if self.page == Page::Upload => self.submit_upload(),
            Message::ExportReport if self.page == Page::Validate => self.export(),
            Message::ToggleChat => {
                self.chat.toggle();
                if self.chat.open {
                    self.set_modus(Modus::CHAT);
                }
            }
            Message::Logout => self.logout(),
            Message::Help => self.show_popup("Help", HELP_TEXT.to_string()),
            _ => (),
        }
    }

    fn with_list(&mut self, f: impl FnOnce(&mut ListView)) {
        if let Some(list) = self.active_list_mut() {
            f(list);
        }
    }

    fn raw_input(&mut self, key: KeyEvent) {
        match self.modus {
            Modus::LOGIN => {
                if let Some(credentials) = self.login_form.read(key) {
                    self.start_login(credentials);
                }
            }
            Modus::SEARCH => self.search_input_key(key),
            Modus::EDIT => {
                self.with_list(|l| l.edit_key(key));
                if !self.active_list().is_some_and(|l| l.is_editing()) {
                    self.set_modus(Modus::TABLE);
                }
            }
            Modus::CHAT => {
                if !self.chat.read(key) {
                    self.chat.close();
                    self.set_modus(Modus::TABLE);
                }
            }
            Modus::UPLOADPATH => match self.uploader.read(key) {
                (PathInput::Selected, _) => {
                    let name = self.uploader.selected().map(|f| f.name()).unwrap_or_default();
                    self.set_status_message(format!("File selected: {name}"));
                    self.set_modus(Modus::TABLE);
                }
                (PathInput::Rejected, Some(e)) => self.set_status_message(e.to_string()),
                (PathInput::Canceled, _) => self.set_modus(Modus::TABLE),
                _ => (),
            },
            Modus::TABLE | Modus::POPUP => (),
        }
    }

    fn tick(&mut self) {
        self.chat.tick();

        let Some(op) = self.login_op.as_mut() else {
            return;
        };
        let result = match op.poll() {
            Poll::Pending => return,
            Poll::Ready(credentials) => self
                .session
                .login(&credentials)
                .map(|user| user.name.clone()),
            Poll::TimedOut => {
                error!("Login timed out");
                Err(LoginError::InvalidCredentials)
            }
            Poll::Cancelled | Poll::Failed => {
                error!("Login was aborted");
                Err(LoginError::InvalidCredentials)
            }
        };
        self.login_op = None;

        match result {
            Ok(name) => {
                self.login_form.reset();
                self.page = Page::Dashboard;
                self.set_modus(Modus::TABLE);
                self.set_status_message(format!("Welcome, {name}"));
            }
            Err(e) => self.login_form.fail(&e),
        }
    }

    // -------------------- Control handling functions ---------------------- //

    fn start_login(&mut self, credentials: Credentials) {
        debug!("Submitting login for {}", credentials.username);
        self.login_op = Some(Deferred::after(
            self.config.mock_latency,
            self.config.operation_timeout,
            credentials,
        ));
        self.set_status_message("Logging in ...");
    }

    fn logout(&mut self) {
        self.commit_active_edit();
        self.chat.close();
        self.session.logout();
        self.login_form.reset();
        self.page = Page::Login;
        self.set_modus(Modus::LOGIN);
    }

    fn show_page(&mut self, page: Page) {
        if self.page == page {
            return;
        }
        self.commit_active_edit();
        trace!("Page {:?} -> {:?}", self.page, page);
        self.page = page;
    }

    fn commit_active_edit(&mut self) {
        self.with_list(|l| l.commit_edit());
    }

    fn begin_edit(&mut self) {
        self.with_list(|l| l.begin_edit());
        if self.active_list().is_some_and(|l| l.is_editing()) {
            self.set_modus(Modus::EDIT);
        }
    }

    fn enter_search(&mut self) {
        let Some(list) = self.active_list() else {
            return;
        };
        let current = list.filter_state().search_text.clone();
        self.search_input.set(&current);
        self.search_backup = current;
        self.set_modus(Modus::SEARCH);
    }

    fn search_input_key(&mut self, key: KeyEvent) {
        match self.search_input.read(key) {
            InputEvent::Changed => {
                let text = self.search_input.value().to_string();
                self.with_list(|l| l.set_search_text(&text));
            }
            InputEvent::Submitted => {
                if let Some(list) = self.active_list() {
                    let n = list.filtered().len();
                    self.set_status_message(format!("{n} matching rows"));
                }
                self.set_modus(Modus::TABLE);
            }
            InputEvent::Canceled => {
                let backup = std::mem::take(&mut self.search_backup);
                self.with_list(|l| l.set_search_text(&backup));
                self.set_modus(Modus::TABLE);
            }
            InputEvent::Moved | InputEvent::Ignored => (),
        }
    }

    fn view_row(&mut self) {
        if !matches!(self.page, Page::Dashboard | Page::Upload) {
            return;
        }
        let Some(list) = self.active_list() else {
            return;
        };
        let Some(row) = list.selected() else {
            return;
        };
        let title = row.text("fileName");
        let body = list
            .columns()
            .iter()
            .map(|c| format!("{:<12} {}", c.header, row.text(&c.key)))
            .collect::<Vec<String>>()
            .join("\n");
        self.show_popup(&title, body);
    }

    fn delete_row(&mut self) {
        let removed = self.active_list_mut().and_then(|l| l.delete_selected());
        if let Some(row) = removed {
            info!("Deleted {} ({})", row.text("fileName"), row.id());
            self.set_status_message(format!("Deleted {}", row.text("fileName")));
        }
    }

    fn submit_upload(&mut self) {
        let Some(file) = self.uploader.submit() else {
            self.set_status_message("Select a file first");
            return;
        };
        let sheet = TermSheet::new(
            &next_id(self.previous_uploads.rows()),
            &file.stem(),
            &chrono::Local::now().format("%Y-%m-%d").to_string(),
            SheetStatus::Pending,
        );
        self.previous_uploads.push_row(sheet.into());
        self.set_status_message(format!("Uploaded {}", file.name()));
    }

    fn export(&mut self) {
        self.commit_active_edit();
        let report = match export_report(&self.validation_report, &self.config.export_dir) {
            Ok(report) => report,
            Err(e) => {
                error!("Export failed: {e}");
                self.set_status_message(format!("Export failed: {e}"));
                return;
            }
        };
        let copied = match self.copy_to_clipboard(report.csv) {
            Ok(()) => " and copied to clipboard",
            Err(e) => {
                debug!("{e}");
                ""
            }
        };
        self.set_status_message(format!("Report written to {}{copied}", report.path.display()));
    }

    fn copy_to_clipboard(&mut self, text: String) -> Result<(), TSError> {
        if self.clipboard.is_none() {
            self.clipboard =
                Some(Clipboard::new().map_err(|e| TSError::Clipboard(e.to_string()))?);
        }
        match self.clipboard.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text)
                .map_err(|e| TSError::Clipboard(e.to_string())),
            None => Err(TSError::Clipboard("not initialised".into())),
        }
    }

    fn show_popup(&mut self, title: &str, body: String) {
        self.popup = Some(Popup {
            title: title.to_string(),
            body,
        });
        self.set_modus(Modus::POPUP);
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.popup = None;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockSession, Role};
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use std::thread;
    use std::time::Duration;

    fn config() -> TSConfig {
        TSConfig::default()
            .with_mock_latency(Duration::from_millis(10))
            .with_operation_timeout(Duration::from_secs(5))
            .with_export_dir(std::env::temp_dir().join(format!("tsdesk-model-{}", std::process::id())))
    }

    fn logged_in() -> Model {
        let mut session = MockSession::default();
        session
            .login(&Credentials {
                username: "ana".into(),
                password: "pw".into(),
                role: Role::Validator,
            })
            .unwrap();
        Model::init(&config(), Box::new(session))
    }

    fn raw(model: &mut Model, code: KeyCode) {
        model
            .update(Some(Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE))))
            .unwrap();
    }

    fn type_str(model: &mut Model, s: &str) {
        for c in s.chars() {
            raw(model, KeyCode::Char(c));
        }
    }

    fn send(model: &mut Model, msg: Message) {
        model.update(Some(msg)).unwrap();
    }

    fn tick_until(model: &mut Model, done: impl Fn(&Model) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(model) && Instant::now() < deadline {
            send(model, Message::Tick);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn starts_on_login_without_user() {
        let model = Model::init(&config(), Box::new(MockSession::default()));
        assert_eq!(model.page(), Page::Login);
        assert!(model.raw_keyevents());
        assert!(model.active_list().is_none());
    }

    #[test]
    fn login_with_missing_fields_stays_on_login() {
        let mut model = Model::init(&config(), Box::new(MockSession::default()));
        type_str(&mut model, "ana");
        raw(&mut model, KeyCode::Enter);
        assert_eq!(model.login_form().error, Some(crate::session::MSG_FIELDS_REQUIRED));
        assert!(!model.is_logging_in());
        assert!(model.current_user().is_none());
    }

    #[test]
    fn login_resolves_after_latency() {
        let mut model = Model::init(&config(), Box::new(MockSession::default()));
        type_str(&mut model, "ana");
        raw(&mut model, KeyCode::Tab);
        type_str(&mut model, "secret");
        raw(&mut model, KeyCode::Tab);
        raw(&mut model, KeyCode::Right);
        raw(&mut model, KeyCode::Enter);
        assert!(model.is_logging_in());

        tick_until(&mut model, |m| !m.is_logging_in());
        assert_eq!(model.page(), Page::Dashboard);
        assert_eq!(model.modus(), Modus::TABLE);
        assert_eq!(model.current_user().map(|u| u.role), Some(Role::Admin));
    }

    #[test]
    fn logout_returns_to_login() {
        let mut model = logged_in();
        send(&mut model, Message::Logout);
        assert_eq!(model.page(), Page::Login);
        assert_eq!(model.modus(), Modus::LOGIN);
        assert!(model.current_user().is_none());
    }

    #[test]
    fn pages_switch_active_list() {
        let mut model = logged_in();
        assert_eq!(model.active_list().map(|l| l.title()), Some("Upload History"));
        send(&mut model, Message::ShowValidate);
        assert_eq!(model.active_list().map(|l| l.title()), Some("VALIDATION REPORT"));
        send(&mut model, Message::ShowUpload);
        assert_eq!(model.active_list().map(|l| l.title()), Some("View Previous Uploads"));
    }

    #[test]
    fn live_search_and_cancel_restores_previous_text() {
        let mut model = logged_in();
        send(&mut model, Message::Search);
        assert_eq!(model.modus(), Modus::SEARCH);
        type_str(&mut model, "term");
        assert_eq!(model.active_list().unwrap().filtered().len(), 3);
        raw(&mut model, KeyCode::Esc);
        assert_eq!(model.modus(), Modus::TABLE);
        assert_eq!(model.active_list().unwrap().filtered().len(), 4);
    }

    #[test]
    fn edit_cell_through_messages() {
        let mut model = logged_in();
        send(&mut model, Message::MoveDown);
        send(&mut model, Message::EditCell);
        assert_eq!(model.modus(), Modus::EDIT);
        type_str(&mut model, " (rev)");
        raw(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::TABLE);
        let list = model.active_list().unwrap();
        assert_eq!(list.rows()[1].text("fileName"), "Financial Terms Q1 (rev)");
    }

    #[test]
    fn edit_on_read_only_column_does_not_enter_edit_mode() {
        let mut model = logged_in();
        send(&mut model, Message::MoveRight);
        send(&mut model, Message::EditCell);
        assert_eq!(model.modus(), Modus::TABLE);
    }

    #[test]
    fn switching_page_commits_open_edit() {
        let mut model = logged_in();
        send(&mut model, Message::EditCell);
        type_str(&mut model, "!");
        // page keys are not read while editing, so force a focus change
        model.set_modus(Modus::TABLE);
        send(&mut model, Message::ShowValidate);
        send(&mut model, Message::ShowDashboard);
        let list = model.active_list().unwrap();
        assert!(!list.is_editing());
        assert_eq!(list.rows()[0].text("fileName"), "Term Sheet 2025-A!");
    }

    #[test]
    fn delete_row_under_filter() {
        let mut model = logged_in();
        send(&mut model, Message::CycleFilter);
        send(&mut model, Message::CycleFilter);
        send(&mut model, Message::Search);
        type_str(&mut model, "pend");
        raw(&mut model, KeyCode::Enter);
        send(&mut model, Message::DeleteRow);
        let list = model.active_list().unwrap();
        assert!(list.filtered().is_empty());
        let ids: Vec<&str> = list.rows().iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
    }

    #[test]
    fn validation_rows_cannot_be_deleted() {
        let mut model = logged_in();
        send(&mut model, Message::ShowValidate);
        send(&mut model, Message::DeleteRow);
        assert_eq!(model.active_list().unwrap().rows().len(), 4);
    }

    #[test]
    fn view_row_and_close_popup() {
        let mut model = logged_in();
        send(&mut model, Message::ViewRow);
        assert_eq!(model.modus(), Modus::POPUP);
        assert_eq!(model.popup().map(|p| p.title.as_str()), Some("Term Sheet 2025-A"));
        send(&mut model, Message::Exit);
        assert!(model.popup().is_none());
        assert_eq!(model.modus(), Modus::TABLE);
    }

    #[test]
    fn upload_adds_pending_record() {
        let dir = std::env::temp_dir().join(format!("tsdesk-model-upload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("Bridge Loan.docx");
        std::fs::write(&path, b"doc").unwrap();

        let mut model = logged_in();
        send(&mut model, Message::ShowUpload);
        send(&mut model, Message::SubmitUpload);
        assert_eq!(model.active_list().unwrap().rows().len(), 3);

        send(&mut model, Message::SelectFile);
        assert_eq!(model.modus(), Modus::UPLOADPATH);
        type_str(&mut model, path.to_str().unwrap());
        raw(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::TABLE);
        assert!(model.uploader().selected().is_some());

        send(&mut model, Message::SubmitUpload);
        let rows = model.active_list().unwrap().rows();
        assert_eq!(rows.len(), 4);
        let added = rows.last().unwrap();
        assert_eq!(added.id().as_str(), "4");
        assert_eq!(added.text("fileName"), "Bridge Loan");
        assert_eq!(added.text("status"), "Pending");
    }

    #[test]
    fn rejected_path_keeps_prompt_open() {
        let mut model = logged_in();
        send(&mut model, Message::ShowUpload);
        send(&mut model, Message::SelectFile);
        type_str(&mut model, "/no/such/file.pdf");
        raw(&mut model, KeyCode::Enter);
        assert_eq!(model.modus(), Modus::UPLOADPATH);
        assert_eq!(model.status_message(), Some("file not found"));
        raw(&mut model, KeyCode::Esc);
        assert_eq!(model.modus(), Modus::TABLE);
    }

    #[test]
    fn export_is_only_available_on_validate_page() {
        let mut model = logged_in();
        send(&mut model, Message::ExportReport);
        assert_ne!(
            model.status_message().map(|m| m.starts_with("Report written")),
            Some(true)
        );
        send(&mut model, Message::ShowValidate);
        send(&mut model, Message::ExportReport);
        assert!(model.status_message().unwrap().starts_with("Report written to"));
    }

    #[test]
    fn chat_round_trip() {
        let mut model = logged_in();
        send(&mut model, Message::ToggleChat);
        assert_eq!(model.modus(), Modus::CHAT);
        type_str(&mut model, "help");
        raw(&mut model, KeyCode::Enter);
        tick_until(&mut model, |m| !m.chat().is_waiting());
        assert_eq!(model.chat().messages().len(), 3);
        raw(&mut model, KeyCode::Esc);
        assert!(!model.chat().open);
        assert_eq!(model.modus(), Modus::TABLE);
    }

    #[test]
    fn quit_sets_status() {
        let mut model = logged_in();
        send(&mut model, Message::Quit);
        assert_eq!(model.status, Status::QUITTING);
    }
}
