//! ============================================================================
//! Token Store - Persistence for the OAuth session
//! ============================================================================
//! One JSON document on local disk, fully replaced on every save.
//! Reads never fail: an unreadable or corrupt file is treated as empty.
//! SessionStore adds a write gate so read-modify-write sequences inside one
//! process are serialized.
//! ============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::types::SessionState;

/// Storage interface for the session document
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Load the persisted session, or an empty one if it cannot be read
    async fn load(&self) -> SessionState;

    /// Replace the persisted session entirely (no merge)
    async fn save(&self, session: &SessionState) -> Result<()>;
}

// ============================================================================
// File-backed store
// ============================================================================

/// Session stored as a single JSON file
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Open the store, creating the parent directory and an empty `{}`
    /// document if the file does not exist yet. Runs synchronously so the
    /// file is in place before the server accepts requests.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    anyhow!("Failed to create token directory {}: {}", parent.display(), e)
                })?;
            }
        }

        if !path.exists() {
            info!("Initializing empty token file at {}", path.display());
            let empty = serde_json::to_vec(&SessionState::default())?;
            std::fs::write(&path, empty)
                .map_err(|e| anyhow!("Failed to create token file {}: {}", path.display(), e))?;
        }

        Ok(Self { path })
    }

    /// Point at a token file without touching the disk
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the token file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> SessionState {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Error reading token file {}: {}", self.path.display(), e);
                return SessionState::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(session) => session,
            Err(e) => {
                warn!("Error parsing token file {}: {}", self.path.display(), e);
                SessionState::default()
            }
        }
    }

    async fn save(&self, session: &SessionState) -> Result<()> {
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| anyhow!("Failed to serialize session: {}", e))?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| anyhow!("Failed to write token file {}: {}", self.path.display(), e))?;

        debug!("Saved session to {}", self.path.display());
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory stand-in for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryTokenStore {
    session: std::sync::Mutex<SessionState>,
    saves: AtomicUsize,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: SessionState) -> Self {
        Self {
            session: std::sync::Mutex::new(session),
            saves: AtomicUsize::new(0),
        }
    }

    /// Current contents without going through the async interface
    pub fn snapshot(&self) -> SessionState {
        self.session
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> SessionState {
        self.snapshot()
    }

    async fn save(&self, session: &SessionState) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| anyhow!("Memory token store lock poisoned"))?;
        *guard = session.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Shared handle with a write gate
// ============================================================================

/// Cloneable handle over a token store. Every read-modify-write sequence
/// must hold the guard from `lock()` for its whole duration.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<dyn TokenStore>,
    write_gate: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(store: impl TokenStore) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: store,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Acquire the single-writer gate
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    pub async fn load(&self) -> SessionState {
        self.inner.load().await
    }

    pub async fn save(&self, session: &SessionState) -> Result<()> {
        self.inner.save(session).await
    }
}
