//! Asset loading collaborator
//!
//! Loads complete asynchronously: the loader invokes the callback exactly
//! once, possibly later and possibly on another thread. Callers forward
//! the result into their frame-loop queue instead of touching state from
//! inside the callback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// A decoded model: its path and the animation clips it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAsset {
    pub path: String,
    pub clips: Vec<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("asset not found: {path}")]
    NotFound { path: String },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
}

pub type AssetResult = Result<ModelAsset, AssetError>;

/// Completion callback handed to a loader.
pub type AssetCallback = Box<dyn FnOnce(AssetResult) + Send>;

pub trait AssetLoader {
    fn load(&mut self, path: &str, on_done: AssetCallback);
}

/// Resolves loads synchronously from an in-memory catalogue.
#[derive(Debug, Clone, Default)]
pub struct ImmediateLoader {
    catalog: HashMap<String, Vec<String>>,
}

impl ImmediateLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model and its animation clips.
    pub fn with_model(mut self, path: &str, clips: &[&str]) -> Self {
        self.catalog
            .insert(path.to_string(), clips.iter().map(|c| c.to_string()).collect());
        self
    }
}

fn resolve(catalog: &HashMap<String, Vec<String>>, path: &str) -> AssetResult {
    catalog
        .get(path)
        .map(|clips| ModelAsset {
            path: path.to_string(),
            clips: clips.clone(),
        })
        .ok_or_else(|| AssetError::NotFound {
            path: path.to_string(),
        })
}

impl AssetLoader for ImmediateLoader {
    fn load(&mut self, path: &str, on_done: AssetCallback) {
        on_done(resolve(&self.catalog, path));
    }
}

#[derive(Default)]
struct ManualState {
    catalog: HashMap<String, Vec<String>>,
    pending: Vec<(String, AssetCallback)>,
}

/// Holds every request until the test (or host) decides to complete it.
///
/// Clones share the same queue, so one copy can be handed to a scene while
/// another drives completion.
#[derive(Clone, Default)]
pub struct ManualLoader {
    state: Arc<Mutex<ManualState>>,
}

impl ManualLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_model(self, path: &str, clips: &[&str]) -> Self {
        self.lock()
            .catalog
            .insert(path.to_string(), clips.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Complete every queued request. Returns how many completed.
    pub fn complete_all(&self) -> usize {
        let (catalog, pending) = {
            let mut state = self.lock();
            (state.catalog.clone(), std::mem::take(&mut state.pending))
        };
        let count = pending.len();
        for (path, callback) in pending {
            callback(resolve(&catalog, &path));
        }
        count
    }

    /// Fail every queued request with a decode error.
    pub fn fail_all(&self, reason: &str) -> usize {
        let pending = std::mem::take(&mut self.lock().pending);
        let count = pending.len();
        for (path, callback) in pending {
            callback(Err(AssetError::Decode {
                path,
                reason: reason.to_string(),
            }));
        }
        count
    }
}

impl AssetLoader for ManualLoader {
    fn load(&mut self, path: &str, on_done: AssetCallback) {
        self.lock().pending.push((path.to_string(), on_done));
    }
}
