//! Configuration loading for jjdiff: `config.toml` discovery/parsing,
//! keybindings, and gitignore-like deprioritize globs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

pub mod keys;
pub use keys::Key;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("conflicting keybindings for key {key:?}: both {first} and {second} claim it")]
    ConflictingBinding {
        key: Key,
        first: &'static str,
        second: &'static str,
    },
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct DiffConfig {
    #[serde(default)]
    pub deprioritize: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FormatConfig {
    #[serde(default = "FormatConfig::default_tab_width")]
    pub tab_width: u32,
}

impl FormatConfig {
    fn default_tab_width() -> u32 {
        4
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            tab_width: Self::default_tab_width(),
        }
    }
}

macro_rules! keybindings_config {
    ($($field:ident => [$($key:expr),+ $(,)?]),+ $(,)?) => {
        #[derive(Debug, Deserialize, Clone)]
        pub struct KeybindingsConfig {
            $(
                #[serde(default = stringify!($field))]
                pub $field: Vec<Key>,
            )+
        }

        impl Default for KeybindingsConfig {
            fn default() -> Self {
                Self {
                    $( $field: vec![$($key.parse().expect("builtin key literal")),+], )+
                }
            }
        }

        impl KeybindingsConfig {
            /// `(command name, bound keys)` for every command, in declaration order.
            pub fn commands(&self) -> Vec<(&'static str, &[Key])> {
                vec![$( (stringify!($field), self.$field.as_slice()) ),+]
            }
        }
    };
}

keybindings_config! {
    exit => ["escape", "ctrl+c", "ctrl+d"],
    next_cursor => ["j", "down", "tab"],
    prev_cursor => ["k", "up", "shift+tab"],
    first_cursor => ["g", "home"],
    last_cursor => ["G", "end"],
    shrink_cursor => ["l", "right"],
    grow_cursor => ["h", "left"],
    select_cursor => ["space"],
    select_all => ["a", "ctrl+a"],
    confirm => ["enter"],
    undo => ["u"],
    redo => ["U"],
}

// serde needs a plain function per field for `#[serde(default = "...")]`; the
// macro above generates field names that double as those function names via
// inherent `impl` shims below.
impl KeybindingsConfig {}

fn exit() -> Vec<Key> {
    KeybindingsConfig::default().exit
}
fn next_cursor() -> Vec<Key> {
    KeybindingsConfig::default().next_cursor
}
fn prev_cursor() -> Vec<Key> {
    KeybindingsConfig::default().prev_cursor
}
fn first_cursor() -> Vec<Key> {
    KeybindingsConfig::default().first_cursor
}
fn last_cursor() -> Vec<Key> {
    KeybindingsConfig::default().last_cursor
}
fn shrink_cursor() -> Vec<Key> {
    KeybindingsConfig::default().shrink_cursor
}
fn grow_cursor() -> Vec<Key> {
    KeybindingsConfig::default().grow_cursor
}
fn select_cursor() -> Vec<Key> {
    KeybindingsConfig::default().select_cursor
}
fn select_all() -> Vec<Key> {
    KeybindingsConfig::default().select_all
}
fn confirm() -> Vec<Key> {
    KeybindingsConfig::default().confirm
}
fn undo() -> Vec<Key> {
    KeybindingsConfig::default().undo
}
fn redo() -> Vec<Key> {
    KeybindingsConfig::default().redo
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
}

impl Config {
    /// Build the `Key -> command` map, failing fast on the first key bound
    /// to two different commands (`ConflictingBinding`).
    pub fn keymap(&self) -> Result<HashMap<Key, &'static str>, ConfigError> {
        let mut map: HashMap<Key, &'static str> = HashMap::new();
        for (command, keys) in self.keybindings.commands() {
            for key in keys {
                match map.get(key) {
                    Some(&first) if first != command => {
                        return Err(ConfigError::ConflictingBinding {
                            key: key.clone(),
                            first,
                            second: command,
                        });
                    }
                    _ => {
                        map.insert(key.clone(), command);
                    }
                }
            }
        }
        Ok(map)
    }

    pub fn deprioritize_matcher(&self) -> Deprioritize {
        Deprioritize::new(&self.diff.deprioritize)
    }
}

/// Best-effort config path following the XDG base directory convention.
pub fn discover() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("jjdiff").join("config.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "config_missing_using_defaults");
            return Ok(Config::default());
        }
        Err(source) => return Err(ConfigError::Io { path, source }),
    };

    toml::from_str(&content).map_err(|source| ConfigError::Malformed { path, source })
}

static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

/// Process-wide, read-only config, loaded from disk on first access.
/// A malformed config is surfaced at load time by the CLI entry point; if it
/// slips through (e.g. a library caller that never validated it), this
/// falls back to defaults rather than panicking deep inside the editor.
pub fn global() -> &'static Config {
    GLOBAL_CONFIG.get_or_init(|| match load_from(None) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "config_load_failed_using_defaults");
            Config::default()
        }
    })
}

/// Gitignore-like path matcher built from the `[diff] deprioritize` glob list.
pub struct Deprioritize {
    set: GlobSet,
}

impl Deprioritize {
    pub fn new(globs: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for raw in globs {
            let pattern = gitglob_to_shellglob(raw);
            match Glob::new(&pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => warn!(glob = raw, error = %err, "invalid_deprioritize_glob"),
            }
        }
        let set = builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap());
        Self { set }
    }

    pub fn is_deprioritized(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}

/// A leading `/` anchors to the root; a trailing `/` matches everything
/// inside that directory; otherwise the pattern matches at any depth.
fn gitglob_to_shellglob(glob: &str) -> String {
    let anchored = if let Some(rest) = glob.strip_prefix('/') {
        rest.to_string()
    } else {
        format!("**/{glob}")
    };

    if let Some(dir) = anchored.strip_suffix('/') {
        format!("{dir}/**")
    } else {
        anchored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert!(cfg.diff.deprioritize.is_empty());
        assert_eq!(cfg.format.tab_width, 4);
    }

    #[test]
    fn parses_deprioritize_list() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[diff]\ndeprioritize = [\"*.lock\", \"/vendor/\"]\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.diff.deprioritize, vec!["*.lock", "/vendor/"]);
    }

    #[test]
    fn malformed_config_is_surfaced() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "not valid toml [[[").unwrap();
        let err = load_from(Some(tmp.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn deprioritize_matches_trailing_slash_directory() {
        let matcher = Deprioritize::new(&["/vendor/".to_string()]);
        assert!(matcher.is_deprioritized(Path::new("vendor/pkg/mod.rs")));
        assert!(!matcher.is_deprioritized(Path::new("src/vendor_helper.rs")));
    }

    #[test]
    fn deprioritize_matches_any_depth_without_leading_slash() {
        let matcher = Deprioritize::new(&["*.lock".to_string()]);
        assert!(matcher.is_deprioritized(Path::new("Cargo.lock")));
        assert!(matcher.is_deprioritized(Path::new("nested/dir/yarn.lock")));
        assert!(!matcher.is_deprioritized(Path::new("Cargo.toml")));
    }

    #[test]
    fn keymap_detects_conflicting_binding() {
        let mut cfg = Config::default();
        cfg.keybindings.undo = vec!["space".parse().unwrap()];
        let err = cfg.keymap().unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingBinding { .. }));
    }

    #[test]
    fn keymap_builds_without_conflicts() {
        let cfg = Config::default();
        let map = cfg.keymap().unwrap();
        assert_eq!(map.get(&"space".parse::<Key>().unwrap()), Some(&"select_cursor"));
        assert_eq!(map.get(&"enter".parse::<Key>().unwrap()), Some(&"confirm"));
    }
}
