use std::sync::Arc;

use crate::error::PanelError;
use crate::host::{DisposalScope, ThemeSource, UiDispatcher};
use crate::model::theme::Theme;
use crate::msg::Msg;

/// Turns host theme notifications into `ThemeChanged` messages.
pub struct ThemeObserver;

impl ThemeObserver {
    /// Returns the theme at subscription time. A failed subscription is logged
    /// and leaves the theme stale for the rest of the session.
    pub fn subscribe(
        source: &Arc<dyn ThemeSource>,
        dispatcher: &UiDispatcher,
        scope: &DisposalScope,
    ) -> Theme {
        let current = Theme::from_background(source.current_background());
        let dispatcher = dispatcher.clone();

        let result = source.subscribe(
            Box::new(move |background| {
                let theme = Theme::from_background(background);
                tracing::info!("theme changed, now {}", theme.label());
                dispatcher.dispatch(Msg::ThemeChanged(theme));
            }),
            scope,
        );

        match result {
            Ok(()) => tracing::info!("theme change listener added"),
            Err(source) => tracing::error!(
                "{}",
                PanelError::Subscription {
                    channel: "theme",
                    source,
                }
            ),
        }

        current
    }
}
