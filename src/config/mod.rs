use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
}

impl Config {
    pub fn load() -> Self {
        let mut cfg = Self::from_file(&default_config_path());

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                cfg.inner.insert(k, v);
            }
        }

        cfg
    }

    /// Defaults overlaid with the `key=value` lines of `path`, ignoring the environment.
    pub fn from_file(path: &Path) -> Self {
        let mut map = default_map();

        if path.exists() {
            if let Ok(file) = fs::File::open(path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        Self { inner: map }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    #[cfg(test)]
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from)
    }

    pub fn session_path(&self) -> PathBuf {
        self.get_path("SESSION_PATH")
            .unwrap_or_else(|| runtime_dir().join("session"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.get_path("LOG_PATH")
            .unwrap_or_else(|| runtime_dir().join("codepad.log"))
    }

    pub fn download_path(&self) -> PathBuf {
        self.get_path("DOWNLOAD_PATH")
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or CODEPAD_*/RUNTIME_VERSION_* for forward-compat
    const KEYS: &[&str] = &[
        "EXECUTION_API_URL",
        "REQUEST_TIMEOUT",
        "DEFAULT_LANGUAGE",
        "SESSION_PATH",
        "AUTH_SERVER_URL",
        "AUTH_CALLBACK_ADDR",
        "AUTH_TIMEOUT",
        "LOG_PATH",
        "DOWNLOAD_PATH",
    ];

    KEYS.contains(&k) || k.starts_with("CODEPAD_") || k.starts_with("RUNTIME_VERSION_")
}

fn runtime_dir() -> PathBuf {
    env::temp_dir().join("codepad")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("codepad").join(".codepadrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    let tmp = runtime_dir();

    // Paths
    m.insert("SESSION_PATH".into(), tmp.join("session").to_string_lossy().into_owned());
    m.insert("LOG_PATH".into(), tmp.join("codepad.log").to_string_lossy().into_owned());
    m.insert("DOWNLOAD_PATH".into(), ".".into());

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("AUTH_TIMEOUT".into(), "300".into());

    // Endpoints
    m.insert(
        "EXECUTION_API_URL".into(),
        "https://emkc.org/api/v2/piston/execute".into(),
    );
    m.insert("AUTH_SERVER_URL".into(), "http://localhost:3000".into());
    m.insert("AUTH_CALLBACK_ADDR".into(), "127.0.0.1:5173".into());

    // Strings
    m.insert("DEFAULT_LANGUAGE".into(), "javascript".into());

    m
}
