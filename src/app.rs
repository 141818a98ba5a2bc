use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::bridge::{Registration, WebViewLifecycleBridge};
use crate::error::PanelError;
use crate::host::{
    DisposalScope, ExtensionManager, HostServices, Surface, SurfaceId, SurfaceRef, UiDispatcher,
};
use crate::model::config::{AppConfig, expand_tilde};
use crate::model::lifecycle::LifecycleState;
use crate::model::mode::Mode;
use crate::model::panel::{Body, PanelContent};
use crate::model::theme::{ColorCategory, Theme};
use crate::msg::Msg;
use crate::presenter::{StatusInputs, StatusView, present};
use crate::sysinfo::{CopyTarget, KNOWN_ISSUES_DOC, SystemClipboard, SystemInfo};
use crate::theme_observer::ThemeObserver;
use crate::watcher::{ConfigWatcher, StartGuard};

const MAX_NOTIFICATIONS: usize = 8;
const MAX_TRANSITIONS: usize = 16;

/// The part of [`AppConfig`] the controller cares about.
#[derive(Debug, Clone)]
pub struct PanelSettings {
    pub default_extension_id: String,
    pub poll_interval: Duration,
    /// Where system information is written when the clipboard is off or unavailable.
    pub data_dir: PathBuf,
    pub clipboard: bool,
}

impl PanelSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            default_extension_id: config.general.extension_id.clone(),
            poll_interval: config.poll_interval(),
            data_dir: config.data_dir(),
            clipboard: config.general.clipboard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalMessage {
    pub kind: ModalKind,
    pub title: String,
    pub body: String,
    /// `r` retries the start sequence from this modal.
    pub offers_retry: bool,
}

/// Owns the lifecycle state and the panel content. Everything runs on the UI
/// thread; other threads talk to it through [`Msg`].
pub struct PanelController {
    pub mode: Mode,
    pub should_quit: bool,
    state: LifecycleState,
    content: PanelContent,
    theme: Theme,
    status: StatusView,
    guard: StartGuard,
    host: HostServices,
    dispatcher: UiDispatcher,
    scope: DisposalScope,
    settings: PanelSettings,
    system_info: SystemInfo,
    clipboard: Option<SystemClipboard>,
    notifications: VecDeque<String>,
    transitions: VecDeque<&'static str>,
    modal: Option<ModalMessage>,
    command_input: String,
    watcher: Option<JoinHandle<()>>,
    initialized: bool,
    disposed: bool,
    runtime_disposer_registered: bool,
    starts_launched: usize,
}

impl PanelController {
    pub fn new(host: HostServices, settings: PanelSettings, dispatcher: UiDispatcher) -> Self {
        let theme = Theme::default();
        let clipboard = settings.clipboard.then(SystemClipboard::default);
        Self {
            mode: Mode::Normal,
            should_quit: false,
            state: LifecycleState::default(),
            content: PanelContent::new(),
            theme,
            status: present(&StatusInputs::default(), theme),
            guard: StartGuard::new(),
            host,
            dispatcher,
            scope: DisposalScope::new(),
            settings,
            system_info: SystemInfo::detect(),
            clipboard,
            notifications: VecDeque::new(),
            transitions: VecDeque::new(),
            modal: None,
            command_input: String::new(),
            watcher: None,
            initialized: false,
            disposed: false,
            runtime_disposer_registered: false,
            starts_launched: 0,
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn content(&self) -> &PanelContent {
        &self.content
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn status(&self) -> &StatusView {
        &self.status
    }

    pub fn modal(&self) -> Option<&ModalMessage> {
        self.modal.as_ref()
    }

    pub fn notifications(&self) -> impl Iterator<Item = &str> {
        self.notifications.iter().map(String::as_str)
    }

    /// Labels of the states entered so far, oldest first (bounded).
    pub fn transitions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.transitions.iter().copied()
    }

    /// Number of start sequences handed to a worker thread.
    pub fn starts_launched(&self) -> usize {
        self.starts_launched
    }

    pub fn start_in_flight(&self) -> bool {
        self.guard.is_held()
    }

    pub fn scope(&self) -> &DisposalScope {
        &self.scope
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Sets the initial state and wires every event source. A second call is
    /// ignored.
    pub fn initialize(&mut self) {
        if self.initialized {
            tracing::warn!("panel controller initialized twice, ignoring");
            return;
        }
        self.initialized = true;
        tracing::info!("initializing panel controller");

        let initial = if !self.query_installed() {
            LifecycleState::ExtensionAbsent
        } else if self.host.extensions.is_properly_initialized() {
            tracing::info!("extension runtime already initialized");
            LifecycleState::Running {
                surface_attached: false,
            }
        } else {
            LifecycleState::ConfigLoading
        };
        self.transition(initial);

        // An existing surface is handled before the first render so a loaded one
        // never shows the placeholder.
        match WebViewLifecycleBridge::register(&self.host.views, &self.dispatcher, &self.scope) {
            Registration::Existing { surface, loaded } => {
                self.attach(&surface);
                if loaded {
                    self.on_surface_loaded(surface.id());
                }
            }
            Registration::Pending => tracing::debug!("waiting for surface creation"),
            Registration::Unavailable => {
                self.push_notification("Surface events unavailable".to_string());
            }
        }

        self.render_content();

        let watcher = ConfigWatcher::new(
            self.host.config.clone(),
            self.dispatcher.clone(),
            self.guard.clone(),
            self.settings.poll_interval,
        );
        match watcher.spawn(self.scope.clone()) {
            Ok(handle) => self.watcher = Some(handle),
            Err(err) => tracing::error!("failed to spawn configuration watcher: {err}"),
        }

        self.theme = ThemeObserver::subscribe(&self.host.theme, &self.dispatcher, &self.scope);

        if matches!(self.state, LifecycleState::ConfigLoading) {
            self.evaluate_configuration();
        }
        self.render_content();
    }

    /// Stops the watcher and releases every registration. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        tracing::info!("disposing panel controller");

        self.scope.dispose();
        if let Some(handle) = self.watcher.take()
            && handle.join().is_err()
        {
            tracing::warn!("configuration watcher panicked");
        }
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key)?,
            Msg::Resize(_, _) => {}
            Msg::ConfigChanged(installed) => self.on_config_changed(installed),
            Msg::SurfaceCreated(surface) => self.on_surface_created(surface),
            Msg::SurfaceLoaded(id) => self.on_surface_loaded(id),
            Msg::ThemeChanged(theme) => self.on_theme_changed(theme),
            Msg::StartupFinished {
                extension_id,
                result,
            } => self.on_startup_finished(extension_id, result),
            Msg::RequestStart(extension_id) => self.retry(extension_id),
            Msg::SelectExtension(id) => self.select_extension(&id),
            Msg::InstallBundle(path) => self.install_bundle(&path),
            Msg::CopySystemInfo => self.copy_system_info(),
            Msg::ShowDebugInfo => self.show_debug_info(),
            Msg::ShowConfigHelp => self.show_config_help(),
            Msg::ToggleTheme => {
                if let Err(err) = self.host.theme.request_toggle() {
                    self.push_notification(format!("Theme toggle failed: {err}"));
                }
            }
            Msg::DismissModal => {
                self.modal = None;
                self.mode = Mode::Normal;
            }
            Msg::Tick => {
                if matches!(self.state, LifecycleState::ConfigLoading) {
                    self.evaluate_configuration();
                    self.render_content();
                }
            }
            Msg::Quit => self.should_quit = true,
        }
        Ok(())
    }

    /// Edge from the watcher. Ignored while a start is in flight.
    pub fn on_config_changed(&mut self, installed: bool) {
        if self.state.is_starting() {
            tracing::info!("configuration changed during startup, ignoring");
            return;
        }

        if !installed {
            self.push_notification("Extension removed".to_string());
            self.transition(LifecycleState::ExtensionAbsent);
        } else if self.state.is_running() && self.host.extensions.is_properly_initialized() {
            tracing::debug!("extension reinstalled while running");
        } else {
            self.push_notification("Extension installed".to_string());
            self.transition(LifecycleState::ConfigLoading);
            self.evaluate_configuration();
        }
        self.render_content();
    }

    pub fn on_surface_created(&mut self, surface: SurfaceRef) {
        match surface.upgrade() {
            Some(surface) => self.attach(&surface),
            None => tracing::warn!(
                "{}",
                PanelError::Attach {
                    surface: surface.id(),
                    reason: "surface released before it could be attached".to_string(),
                }
            ),
        }
        self.render_content();
    }

    /// Retires the placeholder for good.
    pub fn on_surface_loaded(&mut self, id: SurfaceId) {
        if self.content.attached_surface() != Some(id) {
            tracing::warn!("ignoring load of unattached {id}");
            return;
        }

        tracing::info!("{id} loaded, removing placeholder");
        self.content.retire_placeholder();
        if self.state.is_running() {
            self.transition(LifecycleState::Running {
                surface_attached: true,
            });
        } else {
            tracing::debug!("surface loaded while {}", self.state.label());
        }
        self.render_content();
    }

    /// Re-render only; lifecycle state is left alone.
    pub fn on_theme_changed(&mut self, theme: Theme) {
        self.theme = theme;
        self.render_content();
    }

    /// Starts `extension_id` (or the configured one) unless a start is already in
    /// flight. Returns whether a new start sequence was launched.
    pub fn request_start(&mut self, extension_id: Option<String>) -> bool {
        if !self.guard.try_acquire() {
            tracing::info!("start already in progress, ignoring request");
            return false;
        }

        let extension_id = extension_id
            .or_else(|| self.host.config.current_extension_id())
            .unwrap_or_else(|| self.settings.default_extension_id.clone());
        self.set_state(LifecycleState::Starting);
        self.starts_launched += 1;
        tracing::info!("starting extension {extension_id}");

        let extensions = self.host.extensions.clone();
        let dispatcher = self.dispatcher.clone();
        let worker_id = extension_id.clone();
        let spawned = thread::Builder::new()
            .name("agentpanel-startup".to_string())
            .spawn(move || {
                let result = run_startup(extensions.as_ref(), &worker_id);
                dispatcher.dispatch(Msg::StartupFinished {
                    extension_id: worker_id,
                    result,
                });
            });

        if let Err(err) = spawned {
            self.on_startup_finished(extension_id, Err(format!("could not spawn startup: {err}")));
        }
        self.render_content();
        true
    }

    fn on_startup_finished(&mut self, extension_id: String, result: Result<(), String>) {
        if !self.state.is_starting() {
            tracing::warn!("stray startup result for {extension_id}");
            return;
        }

        match result {
            Ok(()) => {
                if !self.runtime_disposer_registered {
                    self.runtime_disposer_registered = true;
                    let extensions: Arc<dyn ExtensionManager> = self.host.extensions.clone();
                    self.scope.register(move || extensions.dispose());
                }
                tracing::info!("extension {extension_id} running");
                self.push_notification(format!("Started {extension_id}"));
                self.transition(LifecycleState::Running {
                    surface_attached: self.content.placeholder_retired(),
                });
            }
            Err(reason) => {
                let err = PanelError::Startup {
                    extension_id,
                    reason,
                };
                tracing::error!("{err}");
                self.open_modal(ModalMessage {
                    kind: ModalKind::Error,
                    title: "Startup failed".to_string(),
                    body: format!("{err}\n\nPress r to retry, Esc to close."),
                    offers_retry: true,
                });
                self.transition(LifecycleState::Error(err.to_string()));
            }
        }
        self.render_content();
    }

    /// Re-queries the configuration manager and moves on from the current
    /// state. Auto-starts when the configuration is valid.
    fn evaluate_configuration(&mut self) {
        if self.state.is_starting() {
            return;
        }

        if !self.query_installed() {
            self.transition(LifecycleState::ExtensionAbsent);
            return;
        }

        if self.host.extensions.is_properly_initialized() {
            if !self.state.is_running() {
                self.transition(LifecycleState::Running {
                    surface_attached: self.content.placeholder_retired(),
                });
            }
            return;
        }

        let config = &self.host.config;
        if !config.is_configuration_loaded() {
            self.transition(LifecycleState::ConfigLoading);
        } else if !config.is_configuration_valid() {
            let reason = config
                .configuration_error()
                .unwrap_or_else(|| "unknown error".to_string());
            self.transition(LifecycleState::ConfigInvalid(reason));
        } else {
            self.request_start(None);
        }
    }

    fn query_installed(&self) -> bool {
        self.host.config.is_extension_installed().unwrap_or_else(|err| {
            tracing::warn!("{}", PanelError::ConfigQuery(err));
            false
        })
    }

    fn attach(&mut self, surface: &Arc<dyn Surface>) {
        let id = surface.id();
        if self
            .content
            .attach_surface(id, surface.component(), surface.view_type())
        {
            tracing::info!("attached {id} ({})", surface.view_type());
        } else {
            tracing::debug!("{id} already attached");
        }
    }

    /// Every state change goes through here or [`Self::set_state`]; leaving
    /// `Starting` clears the guard.
    fn transition(&mut self, next: LifecycleState) {
        if next.is_starting() {
            tracing::error!("Starting can only be entered through request_start");
            return;
        }
        self.set_state(next);
    }

    fn set_state(&mut self, next: LifecycleState) {
        if self.state == next {
            return;
        }
        if self.state.is_starting() && !next.is_starting() {
            self.guard.release();
        }

        tracing::info!("lifecycle {} -> {}", self.state.label(), next.label());
        self.transitions.push_back(next.label());
        while self.transitions.len() > MAX_TRANSITIONS {
            self.transitions.pop_front();
        }
        self.state = next;
    }

    fn render_content(&mut self) {
        match self.state {
            LifecycleState::ExtensionAbsent => self.content.show_install_prompt(),
            _ => self.content.show_status(),
        }
        self.status = present(&self.sample_status(), self.theme);
    }

    fn sample_status(&self) -> StatusInputs {
        let config = &self.host.config;
        let config_loaded = config.is_configuration_loaded();
        StatusInputs {
            config_loaded,
            config_valid: config_loaded && config.is_configuration_valid(),
            plugin_running: self.state.is_running(),
            extension_id: config.current_extension_id(),
            config_error: config.configuration_error(),
        }
    }

    // ── User actions ─────────────────────────────────────────────

    fn retry(&mut self, extension_id: Option<String>) {
        if self.state.is_running() && self.host.extensions.is_properly_initialized() {
            self.push_notification("Extension already running".to_string());
            return;
        }
        if !self.request_start(extension_id) {
            self.push_notification("Start already in progress".to_string());
        }
    }

    fn select_extension(&mut self, id: &str) {
        if let Err(err) = self.host.config.set_current_extension_id(id) {
            self.open_error("Could not select extension", err.to_string());
            return;
        }

        if !self.host.config.is_configuration_valid() {
            let reason = self
                .host
                .config
                .configuration_error()
                .unwrap_or_else(|| "unknown error".to_string());
            self.open_error(
                "Invalid configuration",
                format!("{reason}\n\n:help config shows how to fix the selection file."),
            );
            if !self.state.is_starting() {
                self.transition(LifecycleState::ConfigInvalid(reason));
            }
            self.render_content();
            return;
        }

        self.push_notification(format!("Selected {id}"));
        if !self.request_start(Some(id.to_string())) {
            self.push_notification("Start already in progress".to_string());
        }
    }

    fn install_bundle(&mut self, source: &Path) {
        match self.host.installer.install(source) {
            Ok(id) => {
                self.open_modal(ModalMessage {
                    kind: ModalKind::Info,
                    title: "Extension installed".to_string(),
                    body: format!("{id} installed from {}", source.display()),
                    offers_retry: false,
                });
                self.evaluate_configuration();
                self.render_content();
            }
            Err(err) => self.open_error("Installation failed", err.to_string()),
        }
    }

    fn copy_system_info(&mut self) {
        let copied = self
            .system_info
            .copy(self.clipboard.as_mut(), &self.settings.data_dir);
        match copied {
            Ok(CopyTarget::Clipboard) => {
                self.push_notification("System information copied to clipboard".to_string());
            }
            Ok(CopyTarget::File {
                path,
                clipboard_error: None,
            }) => {
                self.push_notification(format!("System information written to {}", path.display()));
            }
            Ok(CopyTarget::File {
                path,
                clipboard_error: Some(_),
            }) => self.push_notification(format!(
                "Clipboard unavailable, system information written to {}",
                path.display()
            )),
            Err(err) => self.open_error("Could not copy system information", format!("{err:#}")),
        }
    }

    fn show_debug_info(&mut self) {
        let config = &self.host.config;
        let transitions: Vec<&str> = self.transitions().collect();
        let body = [
            format!("State: {}", self.state.label()),
            format!(
                "Configuration: loaded {}, valid {}",
                config.is_configuration_loaded(),
                config.is_configuration_valid()
            ),
            format!(
                "Current extension: {}",
                config.current_extension_id().as_deref().unwrap_or("none")
            ),
            format!("Selection file: {}", config.describe_location()),
            format!(
                "Runtime initialized: {}",
                self.host.extensions.is_properly_initialized()
            ),
            format!(
                "Surface: {}",
                self.content
                    .attached_surface()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "none".to_string())
            ),
            format!("Theme: {}", self.theme.label()),
            format!("Transitions: {}", transitions.join(" -> ")),
        ]
        .join("\n");

        self.open_modal(ModalMessage {
            kind: ModalKind::Info,
            title: "Debug info".to_string(),
            body,
            offers_retry: false,
        });
    }

    /// How to pick the extension by hand, for when the selection file is broken.
    fn show_config_help(&mut self) {
        let id = self
            .host
            .config
            .current_extension_id()
            .unwrap_or_else(|| self.settings.default_extension_id.clone());
        let body = [
            format!("Selection file: {}", self.host.config.describe_location()),
            String::new(),
            "It holds a single key naming the extension to start:".to_string(),
            format!("  extension_id = \"{id}\""),
            String::new(),
            "Remove the file to fall back to the default extension.".to_string(),
            "Changes are picked up on the next check; `:retry` starts right away.".to_string(),
        ]
        .join("\n");

        self.open_modal(ModalMessage {
            kind: ModalKind::Info,
            title: "Configuring the extension".to_string(),
            body,
            offers_retry: false,
        });
    }

    fn open_error(&mut self, title: &str, body: String) {
        tracing::warn!("{title}: {body}");
        self.open_modal(ModalMessage {
            kind: ModalKind::Error,
            title: title.to_string(),
            body,
            offers_retry: false,
        });
    }

    fn open_modal(&mut self, modal: ModalMessage) {
        self.modal = Some(modal);
        self.mode = Mode::Modal;
        self.command_input.clear();
    }

    fn push_notification(&mut self, message: String) {
        self.notifications.push_back(message);
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    // ── Input ────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        match self.mode {
            Mode::Normal => self.handle_key_normal(key),
            Mode::Command => self.handle_key_command(key),
            Mode::Modal => self.handle_key_modal(key),
        }
    }

    fn handle_key_normal(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(':') => {
                self.mode = Mode::Command;
                self.command_input.clear();
            }
            KeyCode::Char('i') => {
                self.mode = Mode::Command;
                self.command_input = "install ".to_string();
            }
            KeyCode::Char('r') => self.update(Msg::RequestStart(None))?,
            KeyCode::Char('t') => self.update(Msg::ToggleTheme)?,
            KeyCode::Char('y') => self.update(Msg::CopySystemInfo)?,
            KeyCode::Char('d') => self.update(Msg::ShowDebugInfo)?,
            _ => {}
        }
        Ok(())
    }

    fn handle_key_command(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.command_input.clear();
            }
            KeyCode::Enter => {
                let command = self.command_input.trim().to_string();
                self.mode = Mode::Normal;
                self.command_input.clear();

                if command.is_empty() {
                    return Ok(());
                }
                match parse_command(&command) {
                    Some(msg) => {
                        self.dispatcher.dispatch(msg);
                    }
                    None => self.push_notification(format!("Unknown command: {command}")),
                }
            }
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.command_input.push(ch);
            }
            _ => {}
        }

        Ok(())
    }

    fn handle_key_modal(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.update(Msg::DismissModal)?,
            KeyCode::Char('r') if self.modal.as_ref().is_some_and(|m| m.offers_retry) => {
                self.update(Msg::DismissModal)?;
                self.update(Msg::RequestStart(None))?;
            }
            _ => {}
        }
        Ok(())
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&self, frame: &mut Frame) {
        let palette = self.theme.palette();
        frame.render_widget(
            Block::default().style(Style::default().bg(palette.background.to_color())),
            frame.area(),
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Min(1),    // body
                Constraint::Length(1), // status line
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        match self.content.body() {
            Body::InstallPrompt => self.render_install_prompt(frame, chunks[1]),
            Body::Placeholder { loading } => self.render_placeholder(frame, chunks[1], loading),
            Body::Surface { id, view_type } => self.render_surface(frame, chunks[1], id, view_type),
            Body::Empty => {}
        }
        self.render_status_line(frame, chunks[2]);
        self.render_status_bar(frame, chunks[3]);

        if let Some(modal) = self.modal.as_ref() {
            self.render_modal(frame, modal);
        } else if self.mode == Mode::Command {
            self.render_command_overlay(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let palette = self.theme.palette();
        let line = Line::from(vec![
            Span::styled(
                " agentpanel ",
                Style::default()
                    .fg(palette.title.to_color())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("│ {} │ {}", self.state.label(), self.theme.label()),
                Style::default().fg(palette.muted.to_color()),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_install_prompt(&self, frame: &mut Frame, area: Rect) {
        let palette = self.theme.palette();
        let lines = vec![
            Line::from(Span::styled(
                "No extension installed",
                Style::default()
                    .fg(palette.title.to_color())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Install an extension bundle to use this panel.",
                Style::default().fg(palette.text.to_color()),
            )),
            Line::from(Span::styled(
                "Press i (or :install <dir>) to install a bundle directory.",
                Style::default().fg(palette.muted.to_color()),
            )),
        ];

        let prompt = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(self.panel_block(" Install "));
        frame.render_widget(prompt, area);
    }

    fn render_placeholder(&self, frame: &mut Frame, area: Rect, loading: Option<SurfaceId>) {
        let palette = self.theme.palette();
        let text = Style::default().fg(palette.text.to_color());
        let muted = Style::default().fg(palette.muted.to_color());

        let mut lines = vec![
            Line::from(Span::styled(
                "System Information",
                Style::default()
                    .fg(palette.title.to_color())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(self.runtime_line(loading), text)),
            Line::from(""),
        ];

        for (label, value) in self.system_info.rows() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {label}: "), muted),
                Span::styled(value, text),
            ]));
        }

        let warning = Style::default().fg(palette.status(ColorCategory::Warning).to_color());
        for (title, body) in self.system_info.warnings() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(format!("⚠ {title}"), warning)));
            lines.push(Line::from(Span::styled(format!("  {body}"), muted)));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Known issues: {KNOWN_ISSUES_DOC}   [y] Copy system info   [d] Debug info"),
            muted,
        )));

        let card = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(self.panel_block(" agentpanel "));
        frame.render_widget(card, area);
    }

    fn runtime_line(&self, loading: Option<SurfaceId>) -> String {
        match (&self.state, loading) {
            (LifecycleState::Running { .. }, Some(id)) => format!("Loading {id}..."),
            (LifecycleState::Running { .. }, None) => "Runtime running, waiting for its view...".to_string(),
            (LifecycleState::Starting, _) => "Starting extension runtime...".to_string(),
            (LifecycleState::ConfigLoading, _) => "Loading configuration...".to_string(),
            (LifecycleState::ConfigInvalid(reason), _) => format!("Configuration invalid: {reason}"),
            (LifecycleState::Error(message), _) => format!("{message}. Press r to retry."),
            (LifecycleState::ExtensionAbsent, _) => "No extension installed".to_string(),
        }
    }

    fn render_surface(&self, frame: &mut Frame, area: Rect, id: SurfaceId, view_type: &str) {
        let palette = self.theme.palette();
        let body = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("{view_type} is live ({id})"),
                Style::default().fg(palette.text.to_color()),
            )),
        ])
        .block(self.panel_block(&format!(" {view_type} ")));
        frame.render_widget(body, area);
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let line = Paragraph::new(format!(" {}", self.status.text))
            .style(Style::default().fg(self.status.color.to_color()));
        frame.render_widget(line, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let palette = self.theme.palette();
        let mode_style = Style::default()
            .fg(palette.background.to_color())
            .bg(palette.status(ColorCategory::Info).to_color())
            .add_modifier(Modifier::BOLD);
        let mode_span = Span::styled(format!(" {} ", self.mode.label()), mode_style);

        let suffix = match self.mode {
            Mode::Command => format!(" :{}", self.command_input),
            _ => self
                .notifications
                .back()
                .map(|note| format!(" {note}"))
                .unwrap_or_else(|| " q quit  r retry  t theme  : command".to_string()),
        };
        let info = Span::styled(suffix, Style::default().fg(palette.muted.to_color()));

        frame.render_widget(Paragraph::new(Line::from(vec![mode_span, info])), area);
    }

    fn render_modal(&self, frame: &mut Frame, modal: &ModalMessage) {
        let palette = self.theme.palette();
        let area = centered_rect(60, 40, frame.area());
        frame.render_widget(Clear, area);

        let accent = match modal.kind {
            ModalKind::Info => palette.status(ColorCategory::Info),
            ModalKind::Error => palette.status(ColorCategory::Error),
        };
        let body = Paragraph::new(modal.body.clone())
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(palette.text.to_color()))
            .block(
                Block::default()
                    .title(format!(" {} ", modal.title))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(accent.to_color()))
                    .style(Style::default().bg(palette.background.to_color())),
            );
        frame.render_widget(body, area);
    }

    fn render_command_overlay(&self, frame: &mut Frame) {
        let palette = self.theme.palette();
        let area = centered_rect(70, 20, frame.area());
        frame.render_widget(Clear, area);

        let prompt = Paragraph::new(format!(":{}", self.command_input)).block(
            Block::default()
                .title(" Command ")
                .borders(Borders::ALL)
                .style(Style::default().bg(palette.background.to_color())),
        );
        frame.render_widget(prompt, area);

        let cursor_x = area.x + 2 + self.command_input.len() as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn panel_block(&self, title: &str) -> Block<'static> {
        let palette = self.theme.palette();
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border.to_color()))
    }
}

fn run_startup(extensions: &dyn ExtensionManager, extension_id: &str) -> Result<(), String> {
    extensions
        .initialize(extension_id)
        .map_err(|err| err.to_string())?;
    extensions
        .initialize_current_provider()
        .map_err(|err| err.to_string())?;
    if !extensions.is_properly_initialized() {
        return Err("runtime did not report a complete initialization".to_string());
    }
    Ok(())
}

/// `:` commands. `None` for anything unknown.
pub fn parse_command(raw: &str) -> Option<Msg> {
    let raw = raw.trim();
    let (name, arg) = match raw.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|arg| !arg.is_empty())),
        None => (raw, None),
    };

    let msg = match (name, arg) {
        ("debug", None) => Msg::ShowDebugInfo,
        ("help", None | Some("config")) => Msg::ShowConfigHelp,
        ("retry" | "start", id) => Msg::RequestStart(id.map(str::to_string)),
        ("select" | "use", Some(id)) => Msg::SelectExtension(id.to_string()),
        ("install", Some(path)) => Msg::InstallBundle(expand_tilde(Path::new(path))),
        ("theme", None) => Msg::ToggleTheme,
        ("sysinfo" | "copy", None) => Msg::CopySystemInfo,
        ("q" | "quit", None) => Msg::Quit,
        _ => return None,
    };
    Some(msg)
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

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
