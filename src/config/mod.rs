use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

use crate::runtime::Encoding;

/// Settings from `.execjsrc`, overlaid by the process environment.
#[derive(Debug, Clone, Default)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let config_path = default_config_path();
        let mut map = HashMap::new();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(|l| l.ok()) {
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

        // Environment takes precedence over the rc file
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Build a config from explicit pairs, ignoring the rc file and environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            inner: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            config_path: default_config_path(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        let raw = self.get(key)?;
        match raw.trim().parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                log::warn!("ignoring {key}={raw:?}: not a whole number");
                None
            }
        }
    }

    /// `EXECJS_RUNTIME`, treating an empty value as unset.
    pub fn runtime_name(&self) -> Option<String> {
        self.get("EXECJS_RUNTIME").filter(|v| !v.trim().is_empty())
    }

    /// `EXECJS_TIMEOUT` in seconds; zero disables the limit.
    pub fn timeout(&self) -> Option<Duration> {
        self.get_u64("EXECJS_TIMEOUT")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// `EXECJS_ENCODING` for reading source files, utf-8 when unset.
    pub fn encoding(&self) -> Encoding {
        match self.get("EXECJS_ENCODING") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("ignoring EXECJS_ENCODING: {e}");
                Encoding::Utf8
            }),
            None => Encoding::Utf8,
        }
    }
}

fn is_config_key(k: &str) -> bool {
    k.starts_with("EXECJS_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("execjs").join(".execjsrc")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_runtime_name_is_unset() {
        assert_eq!(Config::from_pairs([("EXECJS_RUNTIME", " ")]).runtime_name(), None);
        assert_eq!(
            Config::from_pairs([("EXECJS_RUNTIME", "Node")]).runtime_name(),
            Some("Node".to_string())
        );
    }

    #[test]
    fn timeout_zero_or_garbage_means_none() {
        assert_eq!(Config::from_pairs([("EXECJS_TIMEOUT", "0")]).timeout(), None);
        assert_eq!(Config::from_pairs([("EXECJS_TIMEOUT", "soon")]).timeout(), None);
        assert_eq!(
            Config::from_pairs([("EXECJS_TIMEOUT", "30")]).timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn encoding_falls_back_to_utf8() {
        assert_eq!(Config::default().encoding(), Encoding::Utf8);
        assert_eq!(Config::from_pairs([("EXECJS_ENCODING", "ascii")]).encoding(), Encoding::Ascii);
        assert_eq!(Config::from_pairs([("EXECJS_ENCODING", "ebcdic")]).encoding(), Encoding::Utf8);
    }
}
