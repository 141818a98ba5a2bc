use std::io;
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use agentpanel::host::theme_bus::{ThemeBus, parse_background};
use agentpanel::host::{DisposalScope, HostServices, UiDispatcher};
use agentpanel::model::config::{AppConfig, user_config_path};
use agentpanel::msg::Msg;
use agentpanel::plugin::{
    DirectoryInstaller, FileConfigurationManager, LocalExtensionManager, SurfaceRegistry,
};
use agentpanel::{PanelController, PanelSettings};

fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // Initialize logging to file (never stdout)
    let log_dir = config.data_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "agentpanel.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .init();

    tracing::info!("agentpanel starting");

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        tracing::error!("agentpanel error: {e:?}");
        eprintln!("agentpanel error: {e:?}");
    }

    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, config: AppConfig) -> Result<()> {
    let (dispatcher, rx) = UiDispatcher::channel();
    let host_scope = DisposalScope::new();
    let plugins_dir = config.plugins_dir();

    let configuration = Arc::new(FileConfigurationManager::new(
        config.selection_file(),
        plugins_dir.clone(),
        config.general.extension_id.clone(),
    ));
    let surfaces = Arc::new(SurfaceRegistry::new());
    let extensions = Arc::new(LocalExtensionManager::new(
        plugins_dir.clone(),
        surfaces.clone(),
        config.surface_load_delay(),
    ));
    let theme = Arc::new(ThemeBus::new(parse_background(&config.theme.background)));
    if let Some(path) = user_config_path() {
        theme.watch_config_file(path, host_scope.clone());
    }

    // Initial selection read — the panel shows "loading" until it lands.
    let loader = configuration.clone();
    thread::Builder::new()
        .name("agentpanel-config-load".to_string())
        .spawn(move || loader.reload())?;

    let host = HostServices {
        config: configuration,
        extensions,
        views: surfaces,
        theme,
        installer: Arc::new(DirectoryInstaller::new(plugins_dir)),
    };
    let mut panel = PanelController::new(host, PanelSettings::from_config(&config), dispatcher.clone());
    panel.initialize();

    // Input thread — reads terminal events and forwards as Msg
    let input = dispatcher.clone();
    thread::spawn(move || {
        loop {
            let Ok(event) = event::read() else {
                continue;
            };
            let msg = match event {
                Event::Key(k) => Msg::Key(k),
                Event::Resize(w, h) => Msg::Resize(w, h),
                _ => continue,
            };
            if !input.dispatch(msg) {
                break;
            }
        }
    });

    // Tick thread — drives ConfigLoading re-evaluation
    let ticker = dispatcher;
    let tick = config.tick_interval();
    thread::spawn(move || {
        loop {
            thread::sleep(tick);
            if !ticker.dispatch(Msg::Tick) {
                break;
            }
        }
    });

    terminal.draw(|f| panel.view(f))?;

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        panel.update(first)?;

        while let Ok(msg) = rx.try_recv() {
            panel.update(msg)?;
        }

        if panel.should_quit {
            break;
        }

        terminal.draw(|f| panel.view(f))?;
    }

    panel.dispose();
    host_scope.dispose();
    tracing::info!("agentpanel stopped");
    Ok(())
}
