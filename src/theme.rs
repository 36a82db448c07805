//! Light/dark theme management.
//!
//! The crate does not render anything. [`ThemeManager`] picks the theme,
//! remembers an explicit choice through a [`ThemeStore`] and hands the
//! theme's style variables to a [`ThemeApplier`] supplied by the UI.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::ClientError;

/// Style variables of a theme as `(name, value)` pairs.
pub type Palette = &'static [(&'static str, &'static str)];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Class name applied to the document body.
    pub fn css_class(self) -> &'static str {
        match self {
            Theme::Light => "light-theme",
            Theme::Dark => "dark-theme",
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Theme matching the system colour-scheme preference.
    pub fn from_system(prefers_dark: bool) -> Theme {
        if prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => LIGHT_PALETTE,
            Theme::Dark => DARK_PALETTE,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ClientError::Config(format!("unknown theme {:?}", other))),
        }
    }
}

pub const LIGHT_PALETTE: Palette = &[
    ("--primary-color", "#0ea5e9"),
    ("--primary-light", "#38bdf8"),
    ("--primary-dark", "#0284c7"),
    ("--secondary-color", "#06b6d4"),
    ("--accent-color", "#f97316"),
    ("--text-primary", "#0f172a"),
    ("--text-secondary", "#475569"),
    ("--text-tertiary", "#94a3b8"),
    ("--text-inverse", "#ffffff"),
    ("--bg-primary", "#ffffff"),
    ("--bg-secondary", "#f8fafc"),
    ("--bg-tertiary", "#f1f5f9"),
    ("--bg-quaternary", "#e2e8f0"),
    ("--bg-gradient", "linear-gradient(135deg, #0ea5e9 0%, #06b6d4 50%, #8b5cf6 100%)"),
    ("--bg-glass", "rgba(255, 255, 255, 0.8)"),
    ("--bg-glass-hover", "rgba(255, 255, 255, 0.9)"),
    ("--border-color", "#e2e8f0"),
    ("--border-light", "#f1f5f9"),
    ("--border-dark", "#cbd5e1"),
    ("--shadow-sm", "0 1px 2px 0 rgba(0, 0, 0, 0.05)"),
    ("--shadow-md", "0 4px 6px -1px rgba(0, 0, 0, 0.1), 0 2px 4px -1px rgba(0, 0, 0, 0.06)"),
    ("--shadow-lg", "0 10px 15px -3px rgba(0, 0, 0, 0.1), 0 4px 6px -2px rgba(0, 0, 0, 0.05)"),
    ("--shadow-xl", "0 20px 25px -5px rgba(0, 0, 0, 0.1), 0 10px 10px -5px rgba(0, 0, 0, 0.04)"),
    ("--message-user-bg", "linear-gradient(135deg, #0ea5e9 0%, #06b6d4 100%)"),
    ("--message-user-card-bg", "rgba(14, 165, 233, 0.1)"),
    ("--message-user-text", "#ffffff"),
    ("--message-user-card-text", "#0ea5e9"),
    ("--message-ai-bg", "#f8fafc"),
    ("--message-ai-text", "#1e293b"),
    ("--message-ai-border", "#e2e8f0"),
    ("--scrollbar-thumb", "rgba(14, 165, 233, 0.2)"),
    ("--scrollbar-thumb-hover", "rgba(14, 165, 233, 0.4)"),
];

pub const DARK_PALETTE: Palette = &[
    ("--primary-color", "#3b82f6"),
    ("--primary-light", "#60a5fa"),
    ("--primary-dark", "#2563eb"),
    ("--secondary-color", "#10b981"),
    ("--accent-color", "#f59e0b"),
    ("--text-primary", "#f8fafc"),
    ("--text-secondary", "#cbd5e1"),
    ("--text-tertiary", "#94a3b8"),
    ("--text-inverse", "#0f172a"),
    ("--bg-primary", "#0f172a"),
    ("--bg-secondary", "#1e293b"),
    ("--bg-tertiary", "#334155"),
    ("--bg-quaternary", "#475569"),
    ("--bg-gradient", "linear-gradient(135deg, #0f172a 0%, #1e293b 50%, #312e81 100%)"),
    ("--bg-glass", "rgba(15, 23, 42, 0.8)"),
    ("--bg-glass-hover", "rgba(15, 23, 42, 0.9)"),
    ("--border-color", "#334155"),
    ("--border-light", "#475569"),
    ("--border-dark", "#1e293b"),
    ("--shadow-sm", "0 1px 2px 0 rgba(0, 0, 0, 0.4)"),
    ("--shadow-md", "0 4px 6px -1px rgba(0, 0, 0, 0.5), 0 2px 4px -1px rgba(0, 0, 0, 0.4)"),
    ("--shadow-lg", "0 10px 15px -3px rgba(0, 0, 0, 0.5), 0 4px 6px -2px rgba(0, 0, 0, 0.4)"),
    ("--shadow-xl", "0 20px 25px -5px rgba(0, 0, 0, 0.6), 0 10px 10px -5px rgba(0, 0, 0, 0.5)"),
    ("--message-user-bg", "linear-gradient(135deg, #3b82f6 0%, #8b5cf6 100%)"),
    ("--message-user-card-bg", "rgba(59, 130, 246, 0.15)"),
    ("--message-user-text", "#ffffff"),
    ("--message-user-card-text", "#60a5fa"),
    ("--message-ai-bg", "#1e293b"),
    ("--message-ai-text", "#e2e8f0"),
    ("--message-ai-border", "#334155"),
    ("--scrollbar-thumb", "rgba(59, 130, 246, 0.3)"),
    ("--scrollbar-thumb-hover", "rgba(59, 130, 246, 0.5)"),
];

/// Receives the style variables of the active theme.
pub trait ThemeApplier {
    fn apply(&mut self, theme: Theme, palette: Palette);
}

/// Persistence for an explicit theme choice.
pub trait ThemeStore {
    /// The saved choice, `None` if the user never picked one.
    fn load(&self) -> Result<Option<Theme>, ClientError>;

    fn save(&self, theme: Theme) -> Result<(), ClientError>;
}

/// Stores the theme name in a small text file.
#[derive(Debug, Clone)]
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `theme` file in the platform config directory.
    pub fn default_location() -> Option<Self> {
        ProjectDirs::from("", "", "chatmem").map(|dirs| Self::new(dirs.config_dir().join("theme")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self) -> Result<Option<Theme>, ClientError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match raw.parse() {
            Ok(theme) => Ok(Some(theme)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring stored theme");
                Ok(None)
            }
        }
    }

    fn save(&self, theme: Theme) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, theme.as_str())?;
        Ok(())
    }
}

/// Tracks the active theme.
///
/// Only explicit choices ([`ThemeManager::set_theme`],
/// [`ThemeManager::toggle`]) are persisted. Without a saved choice the
/// manager follows the system preference.
pub struct ThemeManager<S, A> {
    store: S,
    applier: A,
    current: Theme,
}

impl<S: ThemeStore, A: ThemeApplier> ThemeManager<S, A> {
    pub fn new(store: S, applier: A) -> Self {
        Self {
            store,
            applier,
            current: Theme::default(),
        }
    }

    /// Apply the saved theme, or the system one if nothing was saved.
    pub fn init(&mut self, system_prefers_dark: bool) -> Result<Theme, ClientError> {
        let theme = self
            .store
            .load()?
            .unwrap_or_else(|| Theme::from_system(system_prefers_dark));
        self.apply(theme);
        Ok(theme)
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn is_dark(&self) -> bool {
        self.current.is_dark()
    }

    /// Apply and remember an explicit choice.
    pub fn set_theme(&mut self, theme: Theme) -> Result<(), ClientError> {
        self.apply(theme);
        self.store.save(theme)
    }

    pub fn toggle(&mut self) -> Result<Theme, ClientError> {
        let theme = self.current.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    /// React to a change of the system preference. Returns whether the
    /// active theme followed it.
    pub fn on_system_change(&mut self, prefers_dark: bool) -> Result<bool, ClientError> {
        if self.store.load()?.is_some() {
            return Ok(false);
        }
        self.apply(Theme::from_system(prefers_dark));
        Ok(true)
    }

    fn apply(&mut self, theme: Theme) {
        debug!(%theme, "applying theme");
        self.current = theme;
        self.applier.apply(theme, theme.palette());
    }
}
