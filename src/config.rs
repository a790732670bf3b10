use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossterm::event::KeyModifiers;

/// Platform whose modifier conventions the shortcuts follow.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Platform {
    /// Detect from the build target.
    #[default]
    Auto,
    Mac,
    Other,
}

impl Platform {
    /// Whether Mac modifier conventions apply.
    ///
    /// Evaluated on every call, so a router sees a changed configuration
    /// immediately. A terminal host runs on the machine it was built for,
    /// so `Auto` reads the build target; hosts that know the user's
    /// platform some other way pass `Mac` or `Other` instead.
    pub const fn is_mac(self) -> bool {
        match self {
            Self::Auto => cfg!(target_os = "macos"),
            Self::Mac => true,
            Self::Other => false,
        }
    }

    /// Command on macOS, Control everywhere else.
    pub const fn primary_modifier(self) -> KeyModifiers {
        if self.is_mac() {
            KeyModifiers::SUPER
        } else {
            KeyModifiers::CONTROL
        }
    }

    /// Display name of the primary modifier.
    pub const fn primary_name(self) -> &'static str {
        if self.is_mac() { "Cmd" } else { "Ctrl" }
    }

    /// Display name of the Alt key.
    pub const fn alt_name(self) -> &'static str {
        if self.is_mac() { "Option" } else { "Alt" }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Mac => "mac",
            Self::Other => "other",
        }
    }
}

/// Which host surface the toolbar is embedded in; decides what Escape does
/// when no dialog is open.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolbarVariant {
    /// Standalone editor: Escape leaves the editor.
    #[default]
    Editor,
    /// Editor/preview tabs: Escape switches to the preview tab.
    Tabbed,
}

impl ToolbarVariant {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Tabbed => "tabbed",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub platform: Option<Platform>,
    pub variant: Option<ToolbarVariant>,
    pub docs: bool,
    pub perf: bool,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            platform: other.platform.or(self.platform),
            variant: other.variant.or(self.variant),
            docs: self.docs || other.docs,
            perf: self.perf || other.perf,
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }

    pub fn toolbar_config(&self) -> ToolbarConfig {
        ToolbarConfig {
            platform: self.platform.unwrap_or_default(),
            variant: self.variant.unwrap_or_default(),
            docs_visible: self.docs,
            ..ToolbarConfig::default()
        }
    }
}

/// Runtime toolbar settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarConfig {
    pub platform: Platform,
    pub variant: ToolbarVariant,
    /// Start with the shortcut reference panel shown.
    pub docs_visible: bool,
    /// `target` attribute applied to inserted links.
    pub link_target: Option<String>,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Auto,
            variant: ToolbarVariant::Editor,
            docs_visible: false,
            link_target: Some("_blank".to_string()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("editbar").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("editbar")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("editbar").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("editbar").join("config");
        }
    }

    PathBuf::from(".editbarrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".editbarrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# editbar defaults (saved with --save)".to_string());
    if let Some(platform) = flags.platform {
        lines.push(format!("--platform {}", platform.as_str()));
    }
    if let Some(variant) = flags.variant {
        lines.push(format!("--variant {}", variant.as_str()));
    }
    if flags.docs {
        lines.push("--docs".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.debug_log {
        lines.push(format!("--debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--docs" {
            flags.docs = true;
        } else if token == "--perf" {
            flags.perf = true;
        } else if token == "--platform" {
            if let Some(next) = tokens.get(i + 1) {
                flags.platform = parse_platform(next);
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--platform=") {
            flags.platform = parse_platform(value);
        } else if token == "--variant" {
            if let Some(next) = tokens.get(i + 1) {
                flags.variant = parse_variant(next);
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--variant=") {
            flags.variant = parse_variant(value);
        } else if token == "--debug-log" {
            if let Some(next) = tokens.get(i + 1) {
                flags.debug_log = Some(PathBuf::from(next));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--debug-log=") {
            flags.debug_log = Some(PathBuf::from(value));
        }
        i += 1;
    }
    flags
}

fn parse_platform(s: &str) -> Option<Platform> {
    match s {
        "auto" => Some(Platform::Auto),
        "mac" => Some(Platform::Mac),
        "other" => Some(Platform::Other),
        _ => None,
    }
}

fn parse_variant(s: &str) -> Option<ToolbarVariant> {
    match s {
        "editor" => Some(ToolbarVariant::Editor),
        "tabbed" => Some(ToolbarVariant::Tabbed),
        _ => None,
    }
}
