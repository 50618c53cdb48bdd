//! Playback initialization state machine.
//!
//! Resolves an initialization request (one item, or a playlist) against the
//! catalog and publishes the result into [`SessionState::init`]. At most one
//! resolution is in flight: starting a new one cancels the previous task and
//! bumps the generation, and every publish re-checks the generation under
//! the store's lock, so a superseded task can never overwrite a newer result.
//!
//! [`SessionState::init`]: crate::model::SessionState::init

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::catalog::Catalog;
use crate::events::{EventEmitter, SessionEvent};
use crate::model::InitMode;
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::state::SessionStore;
use crate::utils::now_millis;

/// Lifecycle of the current initialization request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InitPhase {
    /// No request made yet (or the last one was cancelled before resolving).
    #[default]
    Idle,
    /// A resolution task is in flight.
    Resolving,
    /// The latest request has published a result.
    Resolved,
}

/// Generation-guarded publisher shared with resolution tasks.
#[derive(Clone)]
struct InitPublisher {
    store: Arc<SessionStore>,
    emitter: Arc<dyn EventEmitter>,
    generation: Arc<AtomicU64>,
    phase: Arc<RwLock<InitPhase>>,
}

impl InitPublisher {
    /// Publishes `init` if `generation` is still the active one.
    fn publish(&self, generation: u64, init: InitMode) -> bool {
        let mode = init.name();
        let item_count = init.item_count();

        let published = self.store.update_if(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *self.phase.write() = InitPhase::Resolved;
            state.init = init;
            true
        });

        if published {
            log::info!(
                "[Init] Published {} with {} item(s) (generation {})",
                mode,
                item_count,
                generation
            );
            self.emitter.emit_session(SessionEvent::InitResolved {
                mode: mode.to_string(),
                item_count,
                timestamp: now_millis(),
            });
        } else {
            log::debug!("[Init] Discarded stale {} result (generation {})", mode, generation);
        }
        published
    }
}

/// Resolves initialization requests with cancel-then-replace semantics.
pub struct PlaybackInitializer {
    catalog: Arc<dyn Catalog>,
    store: Arc<SessionStore>,
    spawner: TokioSpawner,
    /// Parent of every resolution token (the session lifetime).
    session_token: CancellationToken,
    /// Token of the in-flight resolution.
    active: Mutex<Option<CancellationToken>>,
    publisher: InitPublisher,
}

impl PlaybackInitializer {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<SessionStore>,
        emitter: Arc<dyn EventEmitter>,
        spawner: TokioSpawner,
        session_token: CancellationToken,
    ) -> Self {
        let publisher = InitPublisher {
            store: Arc::clone(&store),
            emitter,
            generation: Arc::new(AtomicU64::new(0)),
            phase: Arc::new(RwLock::new(InitPhase::Idle)),
        };
        Self {
            catalog,
            store,
            spawner,
            session_token,
            active: Mutex::new(None),
            publisher,
        }
    }

    /// Current phase of the latest request.
    pub fn phase(&self) -> InitPhase {
        *self.publisher.phase.read()
    }

    /// Generation of the latest request (0 before the first one).
    pub fn generation(&self) -> u64 {
        self.publisher.generation.load(Ordering::SeqCst)
    }

    /// Resolves a single item by id and keeps following it.
    ///
    /// Each emission of the item's observable query re-resolves its container
    /// and republishes `Single`. Emissions where the item is absent change
    /// nothing: absence means "not yet available".
    pub fn init_single(&self, id: &str) {
        let (generation, token) = self.begin();
        let catalog = Arc::clone(&self.catalog);
        let publisher = self.publisher.clone();
        let id = id.to_string();

        log::info!("[Init] Resolving item {} (generation {})", id, generation);

        self.spawner.spawn_cancellable(token, async move {
            let mut updates = catalog.observe_by_id(&id);
            while let Some(update) = updates.next().await {
                let Some(item) = update else {
                    log::debug!("[Init] Item {} not available yet", id);
                    continue;
                };
                let container = match catalog.get_container(&item.container_ref).await {
                    Ok(container) => container,
                    Err(e) => {
                        log::warn!(
                            "[Init] Container {} lookup failed: {}",
                            item.container_ref,
                            e
                        );
                        None
                    }
                };
                publisher.publish(
                    generation,
                    InitMode::Single {
                        item: Some(item),
                        container,
                    },
                );
            }
        });
    }

    /// Resolves a playlist on top of the current init state.
    ///
    /// The base list is the current state flattened (see
    /// [`InitMode::flatten_items`]); each id found in the catalog is appended
    /// in order and ids that are absent are skipped.
    pub fn init_playlist(&self, ids: Vec<String>, start_index: usize) {
        let (generation, token) = self.begin();
        let base = self.store.read(|state| state.init.flatten_items());
        let catalog = Arc::clone(&self.catalog);
        let publisher = self.publisher.clone();

        log::info!(
            "[Init] Resolving playlist of {} base + {} requested item(s) (generation {})",
            base.len(),
            ids.len(),
            generation
        );

        self.spawner.spawn_cancellable(token, async move {
            let mut items = base;
            for id in &ids {
                match catalog.get(id).await {
                    Ok(Some(item)) => items.push(item),
                    Ok(None) => log::debug!("[Init] Skipping absent playlist item {}", id),
                    Err(e) => log::warn!("[Init] Lookup of playlist item {} failed: {}", id, e),
                }
            }
            publisher.publish(generation, InitMode::Playlist { items, start_index });
        });
    }

    /// Cancels the in-flight resolution without starting a new one.
    pub fn cancel(&self) {
        let mut active = self.active.lock();
        if let Some(token) = active.take() {
            token.cancel();
            self.publisher.generation.fetch_add(1, Ordering::SeqCst);
            let mut phase = self.publisher.phase.write();
            if *phase == InitPhase::Resolving {
                *phase = InitPhase::Idle;
            }
        }
    }

    /// Cancels the previous resolution and opens a new generation.
    fn begin(&self) -> (u64, CancellationToken) {
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            previous.cancel();
        }
        let generation = self.publisher.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.session_token.child_token();
        *active = Some(token.clone());
        *self.publisher.phase.write() = InitPhase::Resolving;
        (generation, token)
    }
}
