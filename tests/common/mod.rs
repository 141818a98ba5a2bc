#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use agentpanel::error::HostError;
use agentpanel::host::{
    BundleInstaller, ComponentHandle, ConfigurationManager, CreationCallback, DisposalScope,
    ExtensionManager, HostServices, PageLoadCallback, Surface, SurfaceId, ThemeListener,
    ThemeSource, UiDispatcher, ViewManager,
};
use agentpanel::model::theme::Rgb;
use agentpanel::{Msg, PanelController, PanelSettings};

#[derive(Default)]
pub struct FakeConfig {
    pub installed: AtomicBool,
    pub loaded: AtomicBool,
    pub valid: AtomicBool,
    pub fail_queries: AtomicBool,
    pub error: Mutex<Option<String>>,
    pub extension_id: Mutex<Option<String>>,
}

impl FakeConfig {
    pub fn ready() -> Arc<Self> {
        let config = Self::default();
        config.installed.store(true, Ordering::SeqCst);
        config.loaded.store(true, Ordering::SeqCst);
        config.valid.store(true, Ordering::SeqCst);
        *config.extension_id.lock().unwrap() = Some("codex".to_string());
        Arc::new(config)
    }

    pub fn absent() -> Arc<Self> {
        let config = Self::ready();
        config.installed.store(false, Ordering::SeqCst);
        config
    }

    pub fn set_installed(&self, installed: bool) {
        self.installed.store(installed, Ordering::SeqCst);
    }
}

impl ConfigurationManager for FakeConfig {
    fn is_extension_installed(&self) -> Result<bool, HostError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("selection store".to_string()));
        }
        Ok(self.installed.load(Ordering::SeqCst))
    }

    fn is_configuration_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn is_configuration_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn configuration_error(&self) -> Option<String> {
        if self.valid.load(Ordering::SeqCst) {
            return None;
        }
        self.error.lock().unwrap().clone()
    }

    fn current_extension_id(&self) -> Option<String> {
        self.extension_id.lock().unwrap().clone()
    }

    fn set_current_extension_id(&self, id: &str) -> Result<(), HostError> {
        *self.extension_id.lock().unwrap() = Some(id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeExtensions {
    pub initialized: AtomicBool,
    pub initialize_calls: AtomicUsize,
    pub disposed: AtomicBool,
    pub fail_next: Mutex<Option<String>>,
    pub last_id: Mutex<Option<String>>,
}

impl FakeExtensions {
    pub fn fail_once(&self, reason: &str) {
        *self.fail_next.lock().unwrap() = Some(reason.to_string());
    }
}

impl ExtensionManager for FakeExtensions {
    fn initialize(&self, extension_id: &str) -> Result<(), HostError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_id.lock().unwrap() = Some(extension_id.to_string());
        if let Some(reason) = self.fail_next.lock().unwrap().take() {
            return Err(HostError::Unavailable(reason));
        }
        Ok(())
    }

    fn initialize_current_provider(&self) -> Result<(), HostError> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_properly_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.initialized.store(false, Ordering::SeqCst);
    }
}

pub struct FakeSurface {
    id: u64,
    loaded: AtomicBool,
    callback: Mutex<Option<PageLoadCallback>>,
}

impl FakeSurface {
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            loaded: AtomicBool::new(false),
            callback: Mutex::new(None),
        })
    }

    pub fn loaded(id: u64) -> Arc<Self> {
        let surface = Self::new(id);
        surface.loaded.store(true, Ordering::SeqCst);
        surface
    }

    pub fn finish_loading(&self) {
        self.loaded.store(true, Ordering::SeqCst);
        if let Some(callback) = self.callback.lock().unwrap().take() {
            callback();
        }
    }
}

impl Surface for FakeSurface {
    fn id(&self) -> SurfaceId {
        SurfaceId(self.id)
    }

    fn view_type(&self) -> &str {
        "codex/sidebar"
    }

    fn component(&self) -> ComponentHandle {
        ComponentHandle(self.id)
    }

    fn is_page_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn set_page_load_callback(&self, callback: PageLoadCallback) {
        *self.callback.lock().unwrap() = Some(callback);
    }
}

#[derive(Default)]
pub struct FakeViews {
    pub latest: Mutex<Option<Arc<dyn Surface>>>,
    callbacks: Arc<Mutex<Vec<(u64, CreationCallback)>>>,
    next: AtomicU64,
}

impl FakeViews {
    pub fn with_surface(surface: Arc<dyn Surface>) -> Arc<Self> {
        let views = Self::default();
        *views.latest.lock().unwrap() = Some(surface);
        Arc::new(views)
    }

    /// Fires every registered creation callback, like a view manager creating a view.
    pub fn create(&self, surface: Arc<dyn Surface>) {
        *self.latest.lock().unwrap() = Some(surface.clone());
        for (_, callback) in self.callbacks.lock().unwrap().iter() {
            callback(surface.clone());
        }
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }
}

impl ViewManager for FakeViews {
    fn latest_surface(&self) -> Option<Arc<dyn Surface>> {
        self.latest.lock().unwrap().clone()
    }

    fn add_creation_callback(
        &self,
        callback: CreationCallback,
        scope: &DisposalScope,
    ) -> Result<(), HostError> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        self.callbacks.lock().unwrap().push((id, callback));
        let table = self.callbacks.clone();
        scope.register(move || table.lock().unwrap().retain(|(cb, _)| *cb != id));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTheme {
    background: Mutex<Option<Rgb>>,
    listeners: Arc<Mutex<Vec<(u64, ThemeListener)>>>,
    next: AtomicU64,
}

impl FakeTheme {
    pub fn emit(&self, background: Option<Rgb>) {
        *self.background.lock().unwrap() = background;
        for (_, listener) in self.listeners.lock().unwrap().iter() {
            listener(background);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl ThemeSource for FakeTheme {
    fn current_background(&self) -> Option<Rgb> {
        *self.background.lock().unwrap()
    }

    fn subscribe(&self, listener: ThemeListener, scope: &DisposalScope) -> Result<(), HostError> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().push((id, listener));
        let table = self.listeners.clone();
        scope.register(move || table.lock().unwrap().retain(|(l, _)| *l != id));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeInstaller {
    pub fail: AtomicBool,
    pub config: Option<Arc<FakeConfig>>,
}

impl BundleInstaller for FakeInstaller {
    fn install(&self, source: &Path) -> Result<String, HostError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostError::Manifest {
                path: source.join("extension.toml"),
                reason: "missing field `id`".to_string(),
            });
        }
        if let Some(config) = self.config.as_ref() {
            config.set_installed(true);
        }
        Ok("codex".to_string())
    }
}

/// A controller wired to fakes, plus the receiving end of its UI queue.
pub struct Harness {
    pub panel: PanelController,
    pub rx: Receiver<Msg>,
    pub config: Arc<FakeConfig>,
    pub extensions: Arc<FakeExtensions>,
    pub views: Arc<FakeViews>,
    pub theme: Arc<FakeTheme>,
    pub data_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(config: Arc<FakeConfig>, views: Arc<FakeViews>, poll_interval: Duration) -> Self {
        Self::with_installer(config, views, poll_interval, Arc::new(FakeInstaller::default()))
    }

    pub fn with_installer(
        config: Arc<FakeConfig>,
        views: Arc<FakeViews>,
        poll_interval: Duration,
        installer: Arc<FakeInstaller>,
    ) -> Self {
        let extensions = Arc::new(FakeExtensions::default());
        let theme = Arc::new(FakeTheme::default());
        let data_dir = tempfile::tempdir().unwrap();
        let (dispatcher, rx) = UiDispatcher::channel();

        let host = HostServices {
            config: config.clone(),
            extensions: extensions.clone(),
            views: views.clone(),
            theme: theme.clone(),
            installer,
        };
        let settings = PanelSettings {
            default_extension_id: "codex".to_string(),
            poll_interval,
            data_dir: data_dir.path().to_path_buf(),
            clipboard: false,
        };

        Self {
            panel: PanelController::new(host, settings, dispatcher),
            rx,
            config,
            extensions,
            views,
            theme,
            data_dir,
        }
    }

    /// Feeds queued messages to the controller until `done` holds. Panics after
    /// five seconds.
    pub fn pump_until(&mut self, done: impl Fn(&PanelController) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(&self.panel) {
            assert!(Instant::now() < deadline, "timed out in {:?}", self.panel.state());
            if let Ok(msg) = self.rx.recv_timeout(Duration::from_millis(10)) {
                self.panel.update(msg).unwrap();
            }
        }
    }

    /// Feeds whatever is queued right now.
    pub fn pump(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.panel.update(msg).unwrap();
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.panel.dispose();
    }
}

pub const SLOW_POLL: Duration = Duration::from_secs(60);
