use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

const SETTINGS_FILE: &str = ".vaultmap.json";

/// Force layout parameters. `charge_strength` is the repulsion magnitude
/// (the UI exposes it as a positive number).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub charge_strength: f32,
    pub link_distance: f32,
    pub center_force: f32,
    pub parent_child_strength: f32,
    pub reference_strength: f32,
    pub collide_strength: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            charge_strength: 200.0,
            link_distance: 60.0,
            center_force: 0.1,
            parent_child_strength: 0.8,
            reference_strength: 0.1,
            collide_strength: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeScaleMode {
    Size,
    Degree,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityOptions {
    pub show_nodes: bool,
    pub show_labels: bool,
    pub show_parent_child_links: bool,
    pub show_reference_links: bool,
    pub show_backlinks: bool,
    pub node_scale_mode: NodeScaleMode,
    pub label_size: f32,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            show_nodes: true,
            show_labels: true,
            show_parent_child_links: true,
            show_reference_links: true,
            show_backlinks: true,
            node_scale_mode: NodeScaleMode::Size,
            label_size: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Self::Dark
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub simulation: SimulationParams,
    pub visibility: VisibilityOptions,
    pub theme: Theme,
}

impl Settings {
    fn path_for(vault_root: &Path) -> PathBuf {
        vault_root.join(SETTINGS_FILE)
    }

    /// Load settings stored next to the vault. Missing or malformed files
    /// fall back to defaults; a malformed file is reported once at warn.
    pub fn load(vault_root: &Path) -> Self {
        let path = Self::path_for(vault_root);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(error) => {
                warn!("ignoring malformed {}: {error}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, vault_root: &Path) -> Result<()> {
        let path = Self::path_for(vault_root);
        let raw = serde_json::to_string_pretty(self).context("failed to encode settings")?;
        fs::write(&path, raw)
            .with_context(|| format!("failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = Settings::default();
        settings.simulation.link_distance = 90.0;
        settings.visibility.show_reference_links = false;
        settings.theme = Theme::Light;

        settings.save(dir.path()).expect("save");
        assert_eq!(Settings::load(dir.path()), settings);
    }

    #[test]
    fn missing_or_malformed_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(Settings::load(dir.path()), Settings::default());

        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").expect("write");
        assert_eq!(Settings::load(dir.path()), Settings::default());
    }
}
