//! Session coordinator.
//!
//! Owns the published [`SessionState`] and turns one-way [`SessionCommand`]s
//! into collaborator calls. Long-running work (initialization, player
//! telemetry, picker grace timer, control commands) runs on spawned tasks
//! scoped to cancellation tokens derived from the session token:
//!
//! ```text
//! session
//! ├── initialization (replaced on every init request)
//! ├── player telemetry
//! ├── picker (open → close)
//! │   ├── grace timer
//! │   └── registry forwarder
//! └── connection (connect → disconnect)
//!     └── remote commands
//! ```
//!
//! [`SessionState`]: crate::model::SessionState

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::cast::control::{execute, ActiveControl, ControlPointSlot};
use crate::cast::registry::{DeviceSetChange, DeviceSetListener};
use crate::cast::{
    CastError, ConnectionEvent, ControlCommand, DeviceHandle, DeviceRegistry,
    DeviceRegistryClient, DiscoveredDeviceSet,
};
use crate::catalog::Catalog;
use crate::error::ErrorCode;
use crate::events::{DeviceEvent, DiagnosticEvent, EventEmitter, SessionEvent};
use crate::media::MediaEngine;
use crate::model::{InitMode, Item, SessionState};
use crate::protocol_constants::{FULL_VOLUME, MUTED_VOLUME};
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::state::{CoreConfig, SessionStore};
use crate::utils::{is_muted_volume, now_millis};

use super::init_machine::{InitPhase, PlaybackInitializer};
use super::player_state::PlayerStateAggregator;

/// One-way commands accepted by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Resolve and follow a single catalog item.
    InitSingle { id: String },
    /// Resolve a playlist; `start_index` is published as given.
    InitPlaylist { ids: Vec<String>, start_index: usize },
    OpenDevicePicker,
    CloseDevicePicker,
    ConnectDevice(DeviceHandle),
    DisconnectDevice(DeviceHandle),
    ToggleRecording,
    /// Flip the favourite flag of the item stored under `url`.
    ToggleFavourite { url: String },
    /// Hand a stream URI to the media engine.
    InstallMedia { uri: String },
    UninstallMedia,
    ToggleMute,
}

impl SessionCommand {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitSingle { .. } => "initSingle",
            Self::InitPlaylist { .. } => "initPlaylist",
            Self::OpenDevicePicker => "openDevicePicker",
            Self::CloseDevicePicker => "closeDevicePicker",
            Self::ConnectDevice(_) => "connectDevice",
            Self::DisconnectDevice(_) => "disconnectDevice",
            Self::ToggleRecording => "toggleRecording",
            Self::ToggleFavourite { .. } => "toggleFavourite",
            Self::InstallMedia { .. } => "installMedia",
            Self::UninstallMedia => "uninstallMedia",
            Self::ToggleMute => "toggleMute",
        }
    }
}

/// External collaborators a session is built from.
#[derive(Clone)]
pub struct SessionCollaborators {
    pub catalog: Arc<dyn Catalog>,
    pub media: Arc<dyn MediaEngine>,
    pub registry: Arc<dyn DeviceRegistry>,
}

/// What a freshly connected receiver should be pointed at.
enum CastTarget {
    Item(Item),
    MissingItem,
    Playlist,
    Nothing,
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection handling
// ─────────────────────────────────────────────────────────────────────────────

/// State shared with per-connection listener tasks.
#[derive(Clone)]
struct ConnectionContext {
    store: Arc<SessionStore>,
    control: Arc<ControlPointSlot>,
    emitter: Arc<dyn EventEmitter>,
    spawner: TokioSpawner,
}

impl ConnectionContext {
    /// Applies connection callbacks for one connection until it ends.
    async fn watch(
        self,
        active: ActiveControl,
        mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
    ) {
        while let Some(event) = events.recv().await {
            if event.device().id != active.device().id {
                log::debug!(
                    "[Control] Ignoring {:?} on connection to {}",
                    event,
                    active.device()
                );
                continue;
            }
            match event {
                ConnectionEvent::Connected(_) => self.on_connected(&active),
                ConnectionEvent::Disconnected(_) => {
                    self.on_disconnected(&active);
                    return;
                }
            }
        }
    }

    fn on_connected(&self, active: &ActiveControl) {
        if !self.control.is_current(active.id) {
            log::debug!("[Control] Stale connection to {} confirmed", active.device());
            return;
        }

        let device = active.device().clone();
        self.store
            .update(|state| state.connected_device = Some(device.clone()));
        log::info!("[Control] Connected to {}", device);
        self.emitter.emit_device(DeviceEvent::Connected {
            device: device.clone(),
            timestamp: now_millis(),
        });

        let target = self.store.read(|state| match &state.init {
            InitMode::Single { item: Some(item), .. } => CastTarget::Item(item.clone()),
            InitMode::Single { item: None, .. } => CastTarget::MissingItem,
            InitMode::Playlist { .. } => CastTarget::Playlist,
            InitMode::Uninitialized => CastTarget::Nothing,
        });

        match target {
            CastTarget::Item(item) => self.cast_item(active, item),
            CastTarget::MissingItem => {
                log::warn!("[Control] No item to cast to {}", device);
                self.emitter.emit_diagnostic(DiagnosticEvent::TargetUnavailable {
                    reason: format!("session item unavailable; nothing sent to {}", device),
                    timestamp: now_millis(),
                });
            }
            CastTarget::Playlist => {
                log::warn!("[Control] Playlist casting is not supported ({})", device);
                self.emitter.emit_diagnostic(DiagnosticEvent::UnsupportedOperation {
                    operation: "castPlaylist".to_string(),
                    reason: "remote playback of playlists is not supported".to_string(),
                    timestamp: now_millis(),
                });
            }
            CastTarget::Nothing => {
                log::debug!("[Control] Session not initialized; nothing sent to {}", device);
            }
        }
    }

    /// Points the receiver at `item`, then starts playback if that succeeded.
    fn cast_item(&self, active: &ActiveControl, item: Item) {
        let control_point = Arc::clone(&active.control_point);
        let emitter = Arc::clone(&self.emitter);
        self.spawner.spawn_cancellable(active.token.clone(), async move {
            let device = control_point.device().clone();
            let set_target = ControlCommand::SetTarget {
                uri: item.url,
                title: item.title,
            };
            for command in [set_target, ControlCommand::Play] {
                if let Err(e) = execute(control_point.as_ref(), &command).await {
                    report_command_failure(emitter.as_ref(), &device, &command, &e);
                    return;
                }
            }
            log::info!("[Control] Playing on {}", device);
        });
    }

    /// Remote end dropped the connection.
    fn on_disconnected(&self, active: &ActiveControl) {
        if self.control.take_if(active.id).is_some() {
            log::info!("[Control] {} disconnected", active.device());
        }
        self.clear_connected(active.device());
        active.token.cancel();
    }

    /// Clears `connected_device` if it names `device`.
    fn clear_connected(&self, device: &DeviceHandle) -> bool {
        let cleared = self.store.update_if(|state| {
            if state
                .connected_device
                .as_ref()
                .is_some_and(|connected| connected.id == device.id)
            {
                state.connected_device = None;
                return true;
            }
            false
        });
        if cleared {
            self.emitter.emit_device(DeviceEvent::Disconnected {
                device_id: device.id.clone(),
                timestamp: now_millis(),
            });
        }
        cleared
    }
}

fn report_command_failure(
    emitter: &dyn EventEmitter,
    device: &DeviceHandle,
    command: &ControlCommand,
    error: &CastError,
) {
    log::warn!(
        "[Control] {} failed on {}: {} ({})",
        command.name(),
        device,
        error,
        error.code()
    );
    emitter.emit_diagnostic(DiagnosticEvent::CommandFailed {
        device_id: device.id.clone(),
        command: command.name().to_string(),
        message: error.to_string(),
        timestamp: now_millis(),
    });
}

fn report_collaborator_failure(emitter: &dyn EventEmitter, operation: &str, message: String) {
    emitter.emit_diagnostic(DiagnosticEvent::CollaboratorFailed {
        operation: operation.to_string(),
        message,
        timestamp: now_millis(),
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Coordinator
// ─────────────────────────────────────────────────────────────────────────────

/// Coordinates one playback session.
pub struct SessionCoordinator {
    store: Arc<SessionStore>,
    catalog: Arc<dyn Catalog>,
    media: Arc<dyn MediaEngine>,
    initializer: PlaybackInitializer,
    aggregator: PlayerStateAggregator,
    registry: DeviceRegistryClient,
    connections: ConnectionContext,
    next_connection: AtomicU64,
    emitter: Arc<dyn EventEmitter>,
    spawner: TokioSpawner,
    session_token: CancellationToken,
    /// Token of the open picker; `Some` while the picker is open.
    picker: Mutex<Option<CancellationToken>>,
    searching_grace: Duration,
    shut_down: AtomicBool,
}

impl SessionCoordinator {
    pub fn new(
        session_id: impl Into<String>,
        collaborators: SessionCollaborators,
        config: &CoreConfig,
        emitter: Arc<dyn EventEmitter>,
        spawner: TokioSpawner,
        session_token: CancellationToken,
    ) -> Self {
        let SessionCollaborators {
            catalog,
            media,
            registry,
        } = collaborators;
        let store = Arc::new(SessionStore::new(SessionState::new(session_id)));

        let initializer = PlaybackInitializer::new(
            Arc::clone(&catalog),
            Arc::clone(&store),
            Arc::clone(&emitter),
            spawner.clone(),
            session_token.clone(),
        );
        let aggregator =
            PlayerStateAggregator::new(Arc::clone(&media), Arc::clone(&store), spawner.clone());
        let connections = ConnectionContext {
            store: Arc::clone(&store),
            control: Arc::new(ControlPointSlot::new()),
            emitter: Arc::clone(&emitter),
            spawner: spawner.clone(),
        };

        Self {
            registry: DeviceRegistryClient::new(registry, spawner.clone()),
            store,
            catalog,
            media,
            initializer,
            aggregator,
            connections,
            next_connection: AtomicU64::new(0),
            emitter,
            spawner,
            session_token,
            picker: Mutex::new(None),
            searching_grace: Duration::from_millis(config.searching_grace_ms),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Starts player telemetry. Returns `false` if already started.
    pub fn start(&self) -> bool {
        self.aggregator.start(self.session_token.child_token())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of the published state.
    pub fn state(&self) -> SessionState {
        self.store.current()
    }

    /// Receiver that yields every published state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Devices currently discovered (empty while the picker is closed).
    pub fn devices(&self) -> Vec<DeviceHandle> {
        self.registry.devices().snapshot()
    }

    /// Looks up a discovered device by id.
    pub fn device(&self, id: &str) -> Option<DeviceHandle> {
        self.registry.devices().get(id)
    }

    /// Device of the live control point, confirmed or not.
    pub fn active_device(&self) -> Option<DeviceHandle> {
        self.connections.control.device()
    }

    pub fn init_phase(&self) -> InitPhase {
        self.initializer.phase()
    }

    pub fn is_picker_open(&self) -> bool {
        self.picker.lock().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies one command. Failures surface as diagnostics, never as errors.
    pub async fn dispatch(&self, command: SessionCommand) {
        if self.shut_down.load(Ordering::SeqCst) {
            log::warn!("[Session] Ignoring {} after shutdown", command.name());
            return;
        }
        log::debug!("[Session] {}", command.name());

        match command {
            SessionCommand::InitSingle { id } => self.initializer.init_single(&id),
            SessionCommand::InitPlaylist { ids, start_index } => {
                self.initializer.init_playlist(ids, start_index)
            }
            SessionCommand::OpenDevicePicker => self.open_picker().await,
            SessionCommand::CloseDevicePicker => self.close_picker().await,
            SessionCommand::ConnectDevice(device) => self.connect(device).await,
            SessionCommand::DisconnectDevice(device) => self.disconnect(&device).await,
            SessionCommand::ToggleRecording => self.toggle_recording(),
            SessionCommand::ToggleFavourite { url } => self.toggle_favourite(&url).await,
            SessionCommand::InstallMedia { uri } => self.media.install(&uri),
            SessionCommand::UninstallMedia => self.media.uninstall(),
            SessionCommand::ToggleMute => self.toggle_mute(),
        }
    }

    /// Shows the picker and starts device discovery.
    ///
    /// The searching indicator only turns on if the picker is still open
    /// after the grace delay.
    pub async fn open_picker(&self) {
        let token = {
            let mut picker = self.picker.lock();
            if picker.is_some() {
                log::debug!("[Picker] Already open");
                return;
            }
            let token = self.session_token.child_token();
            *picker = Some(token.clone());
            token
        };

        self.store.update(|state| state.devices_visible = true);
        self.emitter.emit_session(SessionEvent::PickerOpened {
            timestamp: now_millis(),
        });

        let store = Arc::clone(&self.store);
        let grace = self.searching_grace;
        let timer_token = token.child_token();
        let guard = timer_token.clone();
        self.spawner.spawn_cancellable(timer_token.clone(), async move {
            tokio::time::sleep(grace).await;
            store.update_if(|state| {
                if guard.is_cancelled() || !state.devices_visible {
                    return false;
                }
                state.searching = true;
                true
            });
        });

        if let Err(e) = self.registry.open(&token, self.device_set_listener()).await {
            log::warn!("[Picker] Device discovery unavailable: {} ({})", e, e.code());
            report_collaborator_failure(self.emitter.as_ref(), "bindRegistry", e.to_string());
            timer_token.cancel();
            return;
        }

        // Closed while binding: the close found nothing to unbind.
        if token.is_cancelled() {
            self.registry.close().await;
        }
    }

    fn device_set_listener(&self) -> DeviceSetListener {
        let store = Arc::clone(&self.store);
        let emitter = Arc::clone(&self.emitter);
        Arc::new(move |change: DeviceSetChange, devices: &DiscoveredDeviceSet| {
            let snapshot = devices.snapshot();
            let applied = store.update_if(|state| {
                if !state.devices_visible {
                    return false;
                }
                state.devices = snapshot;
                true
            });
            if !applied {
                return;
            }
            match change {
                DeviceSetChange::Appeared(device) => {
                    log::info!("[Picker] Found {}", device);
                    emitter.emit_device(DeviceEvent::Appeared {
                        device,
                        timestamp: now_millis(),
                    });
                }
                DeviceSetChange::Removed(device) => {
                    log::info!("[Picker] Lost {}", device);
                    emitter.emit_device(DeviceEvent::Removed {
                        device_id: device.id,
                        timestamp: now_millis(),
                    });
                }
            }
        })
    }

    /// Hides the picker, stops discovery and releases the control point.
    pub async fn close_picker(&self) {
        let token = self.picker.lock().take();
        if let Some(token) = &token {
            token.cancel();
        }

        self.store.update(|state| {
            state.searching = false;
            state.devices_visible = false;
            state.devices.clear();
        });

        if let Some(active) = self.connections.control.take() {
            self.release(active).await;
        }
        self.registry.close().await;

        if token.is_some() {
            self.emitter.emit_session(SessionEvent::PickerClosed {
                timestamp: now_millis(),
            });
        }
    }

    /// Opens a control point for `device`, releasing any previous one first.
    ///
    /// `connected_device` is only set once the receiver confirms.
    pub async fn connect(&self, device: DeviceHandle) {
        if let Some(previous) = self.connections.control.take() {
            log::info!(
                "[Control] Releasing {} before connecting to {}",
                previous.device(),
                device
            );
            self.release(previous).await;
        }

        let id = self.next_connection.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.session_token.child_token();
        let (tx, rx) = mpsc::unbounded_channel();

        let control_point = match self.registry.connect(&device, tx).await {
            Ok(control_point) => control_point,
            Err(e) => {
                token.cancel();
                log::warn!("[Control] {} ({})", e, e.code());
                report_collaborator_failure(self.emitter.as_ref(), "connect", e.to_string());
                return;
            }
        };

        let active = ActiveControl::new(id, control_point, token.clone());
        if let Some(stale) = self.connections.control.replace(active.clone()) {
            self.release(stale).await;
        }
        log::info!("[Control] Control point opened for {} (connection {})", device, id);

        let connections = self.connections.clone();
        self.spawner
            .spawn_cancellable(token, connections.watch(active, rx));
    }

    /// Stops the active control point and disconnects `device`.
    pub async fn disconnect(&self, device: &DeviceHandle) {
        let active = self.connections.control.take();
        let releases_device = active
            .as_ref()
            .is_some_and(|active| active.device().id == device.id);

        if let Some(active) = active {
            if !releases_device {
                log::warn!(
                    "[Control] Disconnect for {} while connected to {}",
                    device,
                    active.device()
                );
            }
            self.release(active).await;
        }
        if !releases_device {
            self.registry.disconnect(device).await;
            self.connections.clear_connected(device);
        }
    }

    /// Tears down a control point taken out of the slot.
    async fn release(&self, active: ActiveControl) {
        active.token.cancel();
        let device = active.device().clone();
        if let Err(e) = execute(active.control_point.as_ref(), &ControlCommand::Stop).await {
            report_command_failure(self.emitter.as_ref(), &device, &ControlCommand::Stop, &e);
        }
        self.registry.disconnect(&device).await;
        self.connections.clear_connected(&device);
        log::info!("[Control] Released {}", device);
    }

    /// Sets the local player volume and the remote mute flag.
    ///
    /// With a player, the published flag follows the player's actual volume.
    pub fn set_mute(&self, mute: bool) {
        let player = self
            .store
            .read(|state| state.player_state.player.clone());
        match &player {
            Some(player) => player.set_volume(if mute { MUTED_VOLUME } else { FULL_VOLUME }),
            None => log::debug!(
                "[Session] No player attached; mute {} applies to the session flag only",
                mute
            ),
        }

        if let Some(active) = self.connections.control.current() {
            let emitter = Arc::clone(&self.emitter);
            self.spawner.spawn_cancellable(active.token.clone(), async move {
                let command = ControlCommand::SetMute(mute);
                if let Err(e) = execute(active.control_point.as_ref(), &command).await {
                    report_command_failure(emitter.as_ref(), active.device(), &command, &e);
                }
            });
        }

        let muted = player
            .as_ref()
            .map_or(mute, |player| is_muted_volume(player.volume()));
        self.store.update(|state| state.muted = muted);
        log::info!("[Session] Muted: {}", muted);
        self.emitter.emit_session(SessionEvent::MuteChanged {
            muted,
            timestamp: now_millis(),
        });
    }

    pub fn toggle_mute(&self) {
        let muted = self.store.read(|state| state.muted);
        self.set_mute(!muted);
    }

    pub fn toggle_recording(&self) {
        self.store.update(|state| state.recording = !state.recording);
    }

    /// Flips the favourite flag of the item stored under `url`.
    pub async fn toggle_favourite(&self, url: &str) {
        let item = match self.catalog.get_by_url(url).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                log::debug!("[Session] No catalog item for {}", url);
                return;
            }
            Err(e) => {
                log::warn!("[Session] Favourite lookup failed: {} ({})", e, e.code());
                report_collaborator_failure(self.emitter.as_ref(), "getByUrl", e.to_string());
                return;
            }
        };

        let favourite = !item.favourite;
        if let Err(e) = self.catalog.set_favourite(&item.id, favourite).await {
            log::warn!("[Session] Favourite update failed: {} ({})", e, e.code());
            report_collaborator_failure(self.emitter.as_ref(), "setFavourite", e.to_string());
            return;
        }
        log::info!("[Session] {} favourite: {}", item.id, favourite);
    }

    /// Releases everything the session holds and cancels its tasks.
    ///
    /// Returns `false` if the session was already shut down.
    pub async fn shutdown(&self) -> bool {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return false;
        }
        log::info!("[Session] Shutting down");

        self.initializer.cancel();
        self.close_picker().await;
        if let Some(active) = self.connections.control.take() {
            self.release(active).await;
        }
        self.session_token.cancel();
        true
    }
}
