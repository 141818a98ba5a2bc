//! Maps configuration/runtime state to the status line text and color.

use crate::model::theme::{ColorCategory, Rgb, Theme};

/// Inputs sampled from the configuration manager and the lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusInputs {
    pub config_loaded: bool,
    pub config_valid: bool,
    pub plugin_running: bool,
    pub extension_id: Option<String>,
    pub config_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub text: String,
    pub category: ColorCategory,
    pub color: Rgb,
}

pub fn present(inputs: &StatusInputs, theme: Theme) -> StatusView {
    let extension = inputs.extension_id.as_deref().unwrap_or("none");

    let (text, category) = if !inputs.config_loaded {
        ("⏳ Loading configuration...".to_string(), ColorCategory::Info)
    } else if !inputs.config_valid {
        let reason = inputs.config_error.as_deref().unwrap_or("unknown error");
        (
            format!("❌ Configuration invalid - {reason}"),
            ColorCategory::Error,
        )
    } else if !inputs.plugin_running {
        (
            format!("⚠️ Configuration valid but plugin not running - current plugin: {extension}"),
            ColorCategory::Warning,
        )
    } else {
        (
            format!("✅ Plugin running - current plugin: {extension}"),
            ColorCategory::Success,
        )
    };

    StatusView {
        text,
        category,
        color: theme.palette().status(category),
    }
}
