//! Shared mocks for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::BoxStream;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::cast::{
    CastError, CastResult, CommandResult, ConnectionEvent, ControlCommand, ControlPoint,
    DeviceHandle, DeviceRegistry, RegistryEvent,
};
use crate::catalog::{Catalog, CatalogError, CatalogResult, InMemoryCatalog};
use crate::events::{BroadcastEvent, DeviceEvent, DiagnosticEvent, EventEmitter, SessionEvent};
use crate::model::{Container, Item};

pub fn item(id: &str, container_ref: &str) -> Item {
    Item {
        id: id.to_string(),
        url: format!("http://streams.local/{id}.m3u8"),
        title: format!("Channel {id}"),
        container_ref: container_ref.to_string(),
        favourite: false,
    }
}

pub fn container(id: &str) -> Container {
    Container {
        id: id.to_string(),
        title: format!("Source {id}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory catalog whose lookups can be held back per id.
pub struct TestCatalog {
    pub inner: InMemoryCatalog,
    gates: DashMap<String, watch::Sender<bool>>,
    favourite_writes: Mutex<Vec<(String, bool)>>,
    fail_lookups: AtomicBool,
}

impl TestCatalog {
    pub fn new() -> Self {
        Self {
            inner: InMemoryCatalog::new(),
            gates: DashMap::new(),
            favourite_writes: Mutex::new(Vec::new()),
            fail_lookups: AtomicBool::new(false),
        }
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        let catalog = Self::new();
        for item in items {
            catalog.inner.insert_item(item);
        }
        catalog
    }

    /// Holds lookups of `id` until [`release`](Self::release) is called.
    pub fn gate(&self, id: &str) {
        self.gates.insert(id.to_string(), watch::channel(false).0);
    }

    pub fn release(&self, id: &str) {
        if let Some(gate) = self.gates.get(id) {
            gate.send_replace(true);
        }
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn favourite_writes(&self) -> Vec<(String, bool)> {
        self.favourite_writes.lock().clone()
    }

    fn gate_for(&self, id: &str) -> Option<watch::Receiver<bool>> {
        self.gates.get(id).map(|gate| gate.subscribe())
    }

    async fn pass_gate(&self, id: &str) {
        if let Some(mut gate) = self.gate_for(id) {
            let _ = gate.wait_for(|open| *open).await;
        }
    }

    fn check_failure(&self) -> CatalogResult<()> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("simulated failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for TestCatalog {
    fn observe_by_id(&self, id: &str) -> BoxStream<'static, Option<Item>> {
        let gate = self.gate_for(id);
        let mut inner = self.inner.observe_by_id(id);
        Box::pin(async_stream::stream! {
            if let Some(mut gate) = gate {
                let _ = gate.wait_for(|open| *open).await;
            }
            while let Some(item) = inner.next().await {
                yield item;
            }
        })
    }

    async fn get(&self, id: &str) -> CatalogResult<Option<Item>> {
        self.pass_gate(id).await;
        self.check_failure()?;
        self.inner.get(id).await
    }

    async fn get_by_url(&self, url: &str) -> CatalogResult<Option<Item>> {
        self.check_failure()?;
        self.inner.get_by_url(url).await
    }

    async fn set_favourite(&self, id: &str, favourite: bool) -> CatalogResult<()> {
        self.favourite_writes
            .lock()
            .push((id.to_string(), favourite));
        self.inner.set_favourite(id, favourite).await
    }

    async fn get_container(&self, container_ref: &str) -> CatalogResult<Option<Container>> {
        self.inner.get_container(container_ref).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Control point / registry
// ─────────────────────────────────────────────────────────────────────────────

/// Control point that records commands and can fail selected ones.
pub struct MockControlPoint {
    device: DeviceHandle,
    commands: Mutex<Vec<ControlCommand>>,
    failing: Mutex<Vec<&'static str>>,
}

impl MockControlPoint {
    pub fn new(device: DeviceHandle) -> Self {
        Self {
            device,
            commands: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    /// Makes every command with this name (`"setTarget"`, `"play"`, ...) fail.
    pub fn fail(&self, command: &'static str) {
        self.failing.lock().push(command);
    }

    pub fn commands(&self) -> Vec<ControlCommand> {
        self.commands.lock().clone()
    }

    fn run(&self, command: ControlCommand) -> CommandResult {
        let name = command.name();
        self.commands.lock().push(command);
        if self.failing.lock().contains(&name) {
            return Err(CastError::Command(format!("{name} rejected by receiver")));
        }
        Ok(())
    }
}

#[async_trait]
impl ControlPoint for MockControlPoint {
    fn device(&self) -> &DeviceHandle {
        &self.device
    }

    async fn play(&self) -> CommandResult {
        self.run(ControlCommand::Play)
    }

    async fn stop(&self) -> CommandResult {
        self.run(ControlCommand::Stop)
    }

    async fn set_mute(&self, mute: bool) -> CommandResult {
        self.run(ControlCommand::SetMute(mute))
    }

    async fn set_target(&self, uri: &str, title: &str) -> CommandResult {
        self.run(ControlCommand::SetTarget {
            uri: uri.to_string(),
            title: title.to_string(),
        })
    }
}

/// Registry that records calls and lets tests drive notifications.
pub struct MockRegistry {
    bind_count: AtomicUsize,
    unbind_count: AtomicUsize,
    fail_bind: AtomicBool,
    bind_delay: Mutex<Option<Duration>>,
    auto_connect: AtomicBool,
    listener: Mutex<Option<mpsc::UnboundedSender<RegistryEvent>>>,
    connection_listeners: Mutex<HashMap<String, mpsc::UnboundedSender<ConnectionEvent>>>,
    control_points: Mutex<Vec<Arc<MockControlPoint>>>,
    disconnects: Mutex<Vec<String>>,
    /// Command names every new control point fails.
    failing: Mutex<Vec<&'static str>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            bind_count: AtomicUsize::new(0),
            unbind_count: AtomicUsize::new(0),
            fail_bind: AtomicBool::new(false),
            bind_delay: Mutex::new(None),
            auto_connect: AtomicBool::new(true),
            listener: Mutex::new(None),
            connection_listeners: Mutex::new(HashMap::new()),
            control_points: Mutex::new(Vec::new()),
            disconnects: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_bind(&self, fail: bool) {
        self.fail_bind.store(fail, Ordering::SeqCst);
    }

    /// Makes `bind` take `delay` before it completes.
    pub fn set_bind_delay(&self, delay: Duration) {
        *self.bind_delay.lock() = Some(delay);
    }

    /// When disabled, `connect` does not report `Connected` by itself.
    pub fn set_auto_connect(&self, auto: bool) {
        self.auto_connect.store(auto, Ordering::SeqCst);
    }

    pub fn fail_command(&self, command: &'static str) {
        self.failing.lock().push(command);
    }

    pub fn announce(&self, device: DeviceHandle) {
        if let Some(listener) = self.listener.lock().as_ref() {
            let _ = listener.send(RegistryEvent::Added(device));
        }
    }

    pub fn withdraw(&self, device: DeviceHandle) {
        if let Some(listener) = self.listener.lock().as_ref() {
            let _ = listener.send(RegistryEvent::Removed(device));
        }
    }

    /// Reports a connection event for `device` through its connection listener.
    pub fn report(&self, event: ConnectionEvent) {
        let listener = self
            .connection_listeners
            .lock()
            .get(&event.device().id)
            .cloned();
        if let Some(listener) = listener {
            let _ = listener.send(event);
        }
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    pub fn bind_count(&self) -> usize {
        self.bind_count.load(Ordering::SeqCst)
    }

    pub fn unbind_count(&self) -> usize {
        self.unbind_count.load(Ordering::SeqCst)
    }

    pub fn control_points(&self) -> Vec<Arc<MockControlPoint>> {
        self.control_points.lock().clone()
    }

    pub fn last_control_point(&self) -> Option<Arc<MockControlPoint>> {
        self.control_points.lock().last().cloned()
    }

    pub fn disconnects(&self) -> Vec<String> {
        self.disconnects.lock().clone()
    }
}

#[async_trait]
impl DeviceRegistry for MockRegistry {
    async fn bind(&self) -> CastResult<()> {
        let delay = *self.bind_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_bind.load(Ordering::SeqCst) {
            return Err(CastError::Bind("service unavailable".to_string()));
        }
        self.bind_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn unbind(&self) {
        self.unbind_count.fetch_add(1, Ordering::SeqCst);
    }

    fn register_listener(&self, listener: mpsc::UnboundedSender<RegistryEvent>) {
        *self.listener.lock() = Some(listener);
    }

    fn unregister_listener(&self) {
        self.listener.lock().take();
    }

    async fn connect(
        &self,
        device: &DeviceHandle,
        listener: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> CastResult<Arc<dyn ControlPoint>> {
        let control_point = Arc::new(MockControlPoint::new(device.clone()));
        for &command in self.failing.lock().iter() {
            control_point.fail(command);
        }
        self.control_points.lock().push(Arc::clone(&control_point));
        if self.auto_connect.load(Ordering::SeqCst) {
            let _ = listener.send(ConnectionEvent::Connected(device.clone()));
        }
        self.connection_listeners
            .lock()
            .insert(device.id.clone(), listener);
        Ok(control_point)
    }

    async fn disconnect(&self, device: &DeviceHandle) {
        self.disconnects.lock().push(device.id.clone());
        let listener = self.connection_listeners.lock().remove(&device.id);
        if let Some(listener) = listener {
            let _ = listener.send(ConnectionEvent::Disconnected(device.clone()));
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Emitter that keeps every event.
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<BroadcastEvent>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BroadcastEvent> {
        self.events.lock().clone()
    }

    pub fn diagnostics(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                BroadcastEvent::Diagnostic(diagnostic) => Some(diagnostic.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit_session(&self, event: SessionEvent) {
        self.events.lock().push(event.into());
    }

    fn emit_device(&self, event: DeviceEvent) {
        self.events.lock().push(event.into());
    }

    fn emit_diagnostic(&self, event: DiagnosticEvent) {
        self.events.lock().push(event.into());
    }
}
