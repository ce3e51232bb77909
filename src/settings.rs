use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::DocumentKind;
use crate::scale::ImageSize;

const SETTINGS_STEM: &str = "lotmap";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub data_root: PathBuf,
    pub sections_file: String,
    pub lot_catalog: String,
    pub package_catalog: String,
    pub public_image: String,
    pub edit_image: String,
    /// Pixel size of the raster the documents were digitized on.
    pub reference_size: ImageSize,
    pub pulse_ms: u64,
    /// Screen pixels.
    pub handle_pick_radius: f32,
    pub hit_tolerance: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            sections_file: "./data/secciones.geojson".to_string(),
            lot_catalog: "./data/lotes.json".to_string(),
            package_catalog: "./data/paquetes.json".to_string(),
            public_image: "./assets/map/base-public.webp".to_string(),
            edit_image: "./assets/map/base.png".to_string(),
            reference_size: ImageSize::new(21600, 14400),
            pulse_ms: 220,
            handle_pick_radius: 8.0,
            hit_tolerance: 3.0,
        }
    }
}

impl AppSettings {
    pub fn pulse(&self) -> Duration {
        Duration::from_millis(self.pulse_ms)
    }

    pub fn base_image(&self, mode: ViewMode) -> &str {
        match mode {
            ViewMode::Public => &self.public_image,
            ViewMode::Edit(_) => &self.edit_image,
        }
    }
}

pub fn load_settings(path: &Path) -> Option<AppSettings> {
    let s = std::fs::read_to_string(path).ok()?;
    if path.extension().is_some_and(|e| e == "toml") {
        toml::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| serde_json::from_str::<AppSettings>(&s).ok())
    } else {
        serde_json::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| toml::from_str::<AppSettings>(&s).ok())
    }
}

/// `~/.config/lotmap.toml`, then `lotmap.toml` and `lotmap.json` in the
/// working directory.
pub fn settings_candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        out.push(
            PathBuf::from(home)
                .join(".config")
                .join(format!("{SETTINGS_STEM}.toml")),
        );
    }
    out.push(PathBuf::from(format!("{SETTINGS_STEM}.toml")));
    out.push(PathBuf::from(format!("{SETTINGS_STEM}.json")));
    out
}

pub fn load_first(candidates: &[PathBuf]) -> AppSettings {
    for path in candidates {
        if let Some(settings) = load_settings(path) {
            log::info!("settings from {}", path.display());
            return settings;
        }
    }
    log::debug!("no settings file found, using defaults");
    AppSettings::default()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Public,
    Edit(DocumentKind),
}

impl ViewMode {
    /// Accepts `--edit sections`, `--edit=lots` and so on. Anything else,
    /// including an unknown edit target, is the public view.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            let value = if let Some(v) = arg.strip_prefix("--edit=") {
                Some(v.to_string())
            } else if arg == "--edit" {
                args.next().map(|v| v.as_ref().to_string())
            } else {
                None
            };
            if let Some(value) = value {
                return match value.trim().to_lowercase().as_str() {
                    "sections" => ViewMode::Edit(DocumentKind::Sections),
                    "lots" => ViewMode::Edit(DocumentKind::Lots),
                    other => {
                        log::warn!("unknown edit target {other:?}, opening public view");
                        ViewMode::Public
                    }
                };
            }
        }
        ViewMode::Public
    }

    pub fn edit_kind(self) -> Option<DocumentKind> {
        match self {
            ViewMode::Public => None,
            ViewMode::Edit(kind) => Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotmap.toml");
        std::fs::write(
            &path,
            "pulse_ms = 400\n[reference_size]\nwidth = 1000\nheight = 500\n",
        )
        .unwrap();
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.pulse(), Duration::from_millis(400));
        assert_eq!(settings.reference_size, ImageSize::new(1000, 500));
        assert_eq!(settings.sections_file, "./data/secciones.geojson");
    }

    #[test]
    fn json_file_and_fallback_order() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let json = dir.path().join("lotmap.json");
        std::fs::write(&json, r#"{"edit_image": "./assets/map/otro.png"}"#).unwrap();
        let settings = load_first(&[missing, json]);
        assert_eq!(settings.edit_image, "./assets/map/otro.png");
        assert_eq!(settings.base_image(ViewMode::Public), "./assets/map/base-public.webp");
        assert_eq!(load_first(&[]), AppSettings::default());
    }

    #[test]
    fn view_mode_from_args() {
        assert_eq!(ViewMode::from_args(["lotmap"]), ViewMode::Public);
        assert_eq!(
            ViewMode::from_args(["lotmap", "--edit", "lots"]),
            ViewMode::Edit(DocumentKind::Lots)
        );
        assert_eq!(
            ViewMode::from_args(["lotmap", "--edit=Sections"]),
            ViewMode::Edit(DocumentKind::Sections)
        );
        assert_eq!(ViewMode::from_args(["lotmap", "--edit=blocks"]), ViewMode::Public);
        assert_eq!(ViewMode::from_args(["lotmap", "--edit"]), ViewMode::Public);
    }
}
