use super::{lock, ChangeCallback, SettingsError, SettingsStore, SubscriptionId, Subscribers};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// JSON-backed settings store, e.g. `{ "target-app-name": "Teams - Chat" }`.
///
/// Only string values are visible. Keys missing from the file resolve to the
/// defaults given at open time. Edits to the file are picked up by a watcher
/// on the parent directory and reported per changed key.
pub struct FileSettings {
    inner: Arc<Inner>,
    _watcher: Option<RecommendedWatcher>,
}

struct Inner {
    path: PathBuf,
    defaults: HashMap<String, String>,
    values: Mutex<HashMap<String, String>>,
    subscribers: Subscribers,
}

impl FileSettings {
    /// Loads the file and starts watching it.
    pub fn open(path: PathBuf, defaults: HashMap<String, String>) -> Result<Self> {
        let mut settings = Self::load(path, defaults)?;
        settings._watcher = Some(settings.start_watcher()?);
        Ok(settings)
    }

    /// Loads the file without watching it.
    pub fn load(path: PathBuf, defaults: HashMap<String, String>) -> Result<Self> {
        let values = read_values(&path)?;
        log::debug!("Loaded {} setting(s) from {:?}", values.len(), path);

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                defaults,
                values: Mutex::new(values),
                subscribers: Subscribers::default(),
            }),
            _watcher: None,
        })
    }

    fn start_watcher(&self) -> Result<RecommendedWatcher> {
        let dir = self
            .inner
            .path
            .parent()
            .context("Settings path has no parent directory")?
            .to_path_buf();
        std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;

        let inner = Arc::clone(&self.inner);
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) if is_relevant_event(&event, &inner.path) => inner.reload(),
                Ok(_) => {}
                Err(e) => log::warn!("Settings watcher error: {}", e),
            },
            notify::Config::default(),
        )
        .context("Failed to create settings watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {:?}", dir))?;
        log::info!("Watching settings: {:?}", self.inner.path);
        Ok(watcher)
    }

    /// Re-reads the file and notifies subscribers of every key whose value changed.
    pub fn reload(&self) {
        self.inner.reload();
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl Inner {
    fn effective(&self, values: &HashMap<String, String>, key: &str) -> Option<String> {
        values.get(key).or_else(|| self.defaults.get(key)).cloned()
    }

    fn reload(&self) {
        let fresh = match read_values(&self.path) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Ignoring unreadable settings file: {:#}", e);
                return;
            }
        };

        let changed: Vec<(String, String)> = {
            let mut values = lock(&self.values);
            let keys: BTreeSet<&String> = values
                .keys()
                .chain(fresh.keys())
                .chain(self.defaults.keys())
                .collect();
            let changed = keys
                .into_iter()
                .filter_map(|key| {
                    let old = self.effective(&values, key);
                    let new = self.effective(&fresh, key);
                    (old != new).then(|| (key.clone(), new.unwrap_or_default()))
                })
                .collect();
            *values = fresh;
            changed
        };

        for (key, value) in changed {
            log::info!("Setting changed: {} = {:?}", key, value);
            self.subscribers.notify(&key, &value);
        }
    }
}

impl SettingsStore for FileSettings {
    fn get_string(&self, key: &str) -> Result<String, SettingsError> {
        let values = lock(&self.inner.values);
        self.inner
            .effective(&values, key)
            .ok_or_else(|| SettingsError::MissingKey(key.to_string()))
    }

    fn on_change(&self, key: &str, callback: ChangeCallback) -> SubscriptionId {
        self.inner.subscribers.add(key, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.remove(id)
    }
}

fn read_values(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let raw: HashMap<String, serde_json::Value> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;

    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(s) => Some((key, s)),
            _ => None,
        })
        .collect())
}

fn is_relevant_event(event: &Event, path: &Path) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    kind_matches && event.paths.iter().any(|p| p.file_name() == path.file_name())
}
