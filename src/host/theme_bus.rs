use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::HostError;
use crate::host::{DisposalScope, ThemeListener, ThemeSource};
use crate::model::config::AppConfig;
use crate::model::theme::{Rgb, Theme};

type ListenerTable = Mutex<Vec<(u64, ThemeListener)>>;

/// Local theme channel: holds the panel background and notifies subscribers.
pub struct ThemeBus {
    background: Mutex<Option<Rgb>>,
    listeners: Arc<ListenerTable>,
    next_id: AtomicU64,
}

impl ThemeBus {
    pub fn new(background: Option<Rgb>) -> Self {
        Self {
            background: Mutex::new(background),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Stores the background and notifies subscribers if it changed.
    pub fn set_background(&self, background: Option<Rgb>) {
        {
            let mut current = self.background.lock().unwrap_or_else(|p| p.into_inner());
            if *current == background {
                return;
            }
            *current = background;
        }

        let listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
        for (_, listener) in listeners.iter() {
            listener(background);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    /// Re-reads `[theme] background` whenever the file at `path` changes.
    pub fn watch_config_file(self: &Arc<Self>, path: PathBuf, scope: DisposalScope) {
        let bus = Arc::downgrade(self);
        let spawned = thread::Builder::new()
            .name("agentpanel-theme-watch".to_string())
            .spawn(move || {
                let Some(dir) = path.parent().map(Path::to_path_buf) else {
                    return;
                };
                let target = path.clone();
                let mut watcher: RecommendedWatcher = match notify::recommended_watcher(
                    move |res: notify::Result<notify::Event>| match res {
                        Ok(event) => {
                            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                                return;
                            }
                            if !event.paths.iter().any(|p| p.ends_with(target.as_path())) {
                                return;
                            }
                            let Some(bus) = bus.upgrade() else {
                                return;
                            };
                            match read_background(&target) {
                                Ok(background) => bus.set_background(background),
                                Err(err) => tracing::warn!("theme reload failed: {err}"),
                            }
                        }
                        Err(err) => {
                            tracing::warn!("theme watcher error: {err}");
                        }
                    },
                ) {
                    Ok(w) => w,
                    Err(err) => {
                        tracing::warn!("failed to initialize theme watcher: {err}");
                        return;
                    }
                };

                if let Err(err) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                    tracing::warn!("failed to watch config dir {}: {err}", dir.display());
                    return;
                }

                while !scope.is_disposed() {
                    thread::park_timeout(Duration::from_millis(200));
                }
            });

        if let Err(err) = spawned {
            tracing::warn!("failed to spawn theme watcher: {err}");
        }
    }
}

impl ThemeSource for ThemeBus {
    fn current_background(&self) -> Option<Rgb> {
        *self.background.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn subscribe(&self, listener: ThemeListener, scope: &DisposalScope) -> Result<(), HostError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((id, listener));

        let table = Arc::downgrade(&self.listeners);
        scope.register(move || {
            if let Some(table) = table.upgrade() {
                table
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        });
        Ok(())
    }

    fn request_toggle(&self) -> Result<(), HostError> {
        let next = match Theme::from_background(self.current_background()) {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        };
        self.set_background(Some(next.palette().background));
        Ok(())
    }
}

/// `"auto"` (or anything unparsable) means the host cannot tell.
pub fn parse_background(raw: &str) -> Option<Rgb> {
    if raw.trim().eq_ignore_ascii_case("auto") {
        return None;
    }
    Rgb::parse_hex(raw)
}

fn read_background(path: &Path) -> Result<Option<Rgb>, HostError> {
    let raw = std::fs::read_to_string(path).map_err(|err| HostError::io(path, err))?;
    let config = AppConfig::parse(&raw)
        .map_err(|err| HostError::InvalidConfig(format!("{}: {err}", path.display())))?;
    Ok(parse_background(&config.theme.background))
}
