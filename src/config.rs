use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use color_eyre::Result;
use directories::{BaseDirs, ProjectDirs};
use lazy_static::lazy_static;
use serde::Deserialize;
use tracing::warn;

use crate::services::row_engine::DEFAULT_PAGE_SIZE;
use crate::tui::{KeyBinding, KeyBindings, Theme, ThemeName};

const CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub config_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_persist_session")]
    pub persist_session: bool,
    #[serde(default)]
    pub theme: ThemeName,
    /// Overrides applied on top of the default bindings
    #[serde(default)]
    pub keybindings: Vec<KeyBinding>,
    /// Optional JSON file with more overrides
    #[serde(default)]
    pub keybindings_path: Option<PathBuf>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_persist_session() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config: AppConfig {
                data_dir: get_data_dir(),
                config_dir: get_config_dir(),
            },
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            persist_session: default_persist_session(),
            theme: ThemeName::default(),
            keybindings: Vec::new(),
            keybindings_path: None,
        }
    }
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    /// Load settings from `config_path`, or from `~/.picgrid-config.json5`
    /// (written from the embedded defaults on first run)
    pub fn from_path(config_path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let data_dir = get_data_dir();
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?;

        let selected_path = match config_path {
            Some(p) => expand_tilde(p),
            None => {
                let home_cfg = default_home_config_path();
                if !home_cfg.exists() {
                    if let Some(parent) = home_cfg.parent() {
                        let _ = fs::create_dir_all(parent);
                    }
                    if let Err(e) = fs::write(&home_cfg, CONFIG) {
                        warn!("Could not write default config to {}: {e}", home_cfg.display());
                    }
                }
                home_cfg
            }
        };

        builder = builder.add_source(
            config::File::from_str(CONFIG, config::FileFormat::Json5),
        );
        builder = builder.add_source(
            config::File::from(selected_path)
                .format(config::FileFormat::Json5)
                .required(config_path.is_some()),
        );

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        cfg.page_size = cfg.page_size.max(1);
        Ok(cfg)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn theme(&self) -> Theme {
        Theme::from_name(self.theme)
    }

    /// Defaults, then the keybindings file, then inline overrides
    pub fn keybindings(&self) -> Result<KeyBindings> {
        let mut bindings = match &self.keybindings_path {
            Some(path) => KeyBindings::load_from_file(&expand_tilde(path))?,
            None => KeyBindings::default(),
        };
        bindings.apply_overrides(self.keybindings.clone());
        for warning in bindings.validate() {
            warn!("{warning}");
        }
        Ok(bindings)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(s) = path.to_str() {
        if s.starts_with('~') {
            if let Some(base) = BaseDirs::new() {
                return PathBuf::from(s.replacen('~', base.home_dir().to_str().unwrap_or(""), 1));
            }
        }
    }
    path.to_path_buf()
}

fn default_home_config_path() -> PathBuf {
    match BaseDirs::new() {
        Some(base) => base
            .home_dir()
            .join(format!(".{}-config.json5", env!("CARGO_PKG_NAME"))),
        None => PathBuf::from(format!(".{}-config.json5", env!("CARGO_PKG_NAME"))),
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
}

pub fn get_data_dir() -> PathBuf {
    if let Some(s) = DATA_FOLDER.clone() {
        s
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::{Action, Mode};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_defaults_parse() {
        let value: serde_json::Value = json5::from_str(CONFIG).unwrap();
        assert_eq!(value["page_size"].as_f64(), Some(10.0));
        assert_eq!(value["theme"].as_str(), Some("dark"));
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("picgrid.json5");
        fs::write(
            &path,
            r#"{
                page_size: 25,
                theme: "light",
                persist_session: false,
                keybindings: [{ mode: "Table", key: "F2", action: "EditLayout" }],
            }"#,
        )
        .unwrap();

        let cfg = Config::from_path(Some(&path)).unwrap();
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.theme, ThemeName::Light);
        assert!(!cfg.persist_session);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));

        let bindings = cfg.keybindings().unwrap();
        let f2 = KeyEvent::new(KeyCode::F(2), KeyModifiers::NONE);
        assert_eq!(bindings.get_action(Mode::Table, &f2), Some(Action::EditLayout));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::from_path(Some(&dir.path().join("nope.json5"))).is_err());
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("picgrid.json5");
        fs::write(&path, "{ page_size: 0 }").unwrap();

        assert_eq!(Config::from_path(Some(&path)).unwrap().page_size, 1);
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
    }
}
