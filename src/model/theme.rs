use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb` or `rrggbb`.
    pub fn parse_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Perceived brightness in `0.0..=1.0`.
    pub fn brightness(self) -> f32 {
        (0.299 * f32::from(self.0) + 0.587 * f32::from(self.1) + 0.114 * f32::from(self.2))
            / 255.0
    }

    pub fn to_color(self) -> Color {
        Color::Rgb(self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Unknown backgrounds count as dark.
    pub fn from_background(background: Option<Rgb>) -> Self {
        match background {
            Some(rgb) if rgb.brightness() >= 0.5 => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            Theme::Dark => &DARK,
            Theme::Light => &LIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorCategory {
    Info,
    Error,
    Warning,
    Success,
    Neutral,
}

/// Theme-dependent colors used by the panel.
#[derive(Debug)]
pub struct Palette {
    pub background: Rgb,
    pub title: Rgb,
    pub text: Rgb,
    pub muted: Rgb,
    pub border: Rgb,
    success: Rgb,
    warning: Rgb,
    error: Rgb,
    info: Rgb,
    neutral: Rgb,
}

impl Palette {
    pub fn status(&self, category: ColorCategory) -> Rgb {
        match category {
            ColorCategory::Success => self.success,
            ColorCategory::Warning => self.warning,
            ColorCategory::Error => self.error,
            ColorCategory::Info => self.info,
            ColorCategory::Neutral => self.neutral,
        }
    }
}

static DARK: Palette = Palette {
    background: Rgb(30, 41, 59),
    title: Rgb(248, 250, 252),
    text: Rgb(203, 213, 225),
    muted: Rgb(148, 163, 184),
    border: Rgb(71, 85, 105),
    success: Rgb(16, 185, 129),
    warning: Rgb(251, 191, 36),
    error: Rgb(239, 68, 68),
    info: Rgb(59, 130, 246),
    neutral: Rgb(148, 163, 184),
};

static LIGHT: Palette = Palette {
    background: Rgb(248, 250, 252),
    title: Rgb(30, 41, 59),
    text: Rgb(71, 86, 105),
    muted: Rgb(100, 116, 139),
    border: Rgb(203, 213, 225),
    success: Rgb(5, 150, 105),
    warning: Rgb(217, 119, 6),
    error: Rgb(220, 38, 38),
    info: Rgb(37, 99, 235),
    neutral: Rgb(100, 116, 139),
};
