//! Test modules shared by the integration suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use gaterun::Error;
use gaterun::Message;
use gaterun::Module;
use gaterun::ModuleContext;
use gaterun::Result;
use gaterun::channel::ChannelTransport;
use gaterun::channel::Delivery;
use gaterun::wire::WireBus;
use tokio::sync::mpsc;

/// A bus that encodes onto a channel, plus the receiving end.
pub fn wire_bus() -> (Arc<WireBus>, mpsc::UnboundedReceiver<Delivery>) {
    let (transport, rx) = ChannelTransport::new();
    (Arc::new(WireBus::new(Arc::new(transport))), rx)
}

/// Stand-in for a downstream connection. Counts itself while alive.
pub struct Connection {
    open: Arc<AtomicUsize>,
}

impl Connection {
    fn open(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { open: counter.clone() }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Opens one connection per distinct `device` property and answers `reply=yes`
/// messages with a copy of their payload.
pub struct DeviceModule {
    context: ModuleContext,
    pub open: Arc<AtomicUsize>,
    pub connections: HashMap<String, Connection>,
    pub received: Vec<Message>,
    pub destroyed: usize,
    pub publish_failures: usize,
}

#[async_trait::async_trait]
impl Module for DeviceModule {
    fn create(context: ModuleContext) -> Result<Self> {
        Ok(Self {
            context,
            open: Arc::new(AtomicUsize::new(0)),
            connections: HashMap::new(),
            received: Vec::new(),
            destroyed: 0,
            publish_failures: 0,
        })
    }

    fn context(&self) -> &ModuleContext {
        &self.context
    }

    async fn receive(&mut self, message: Message) {
        if let Some(device) = message.property_str("device") {
            if !self.connections.contains_key(device) {
                let connection = Connection::open(&self.open);
                self.connections.insert(device.to_string(), connection);
            }
        }

        if message.property_str("reply") == Some("yes") {
            let reply = Message::new(message.payload().to_vec(), [("source", "device-module")]);
            if let Err(e) = self.publish(reply).await {
                tracing::warn!(error = %e, "reply not published");
                self.publish_failures += 1;
            }
        }

        self.received.push(message);
    }

    async fn destroy(&mut self) {
        self.connections.clear();
        self.destroyed += 1;
    }
}

/// Refuses any configuration that is not a number.
pub struct IntervalModule {
    context: ModuleContext,
    pub interval: u32,
    pub seen: usize,
}

#[async_trait::async_trait]
impl Module for IntervalModule {
    fn create(context: ModuleContext) -> Result<Self> {
        let interval = context
            .configuration()
            .trim()
            .parse::<u32>()
            .map_err(|e| Error::Setup(format!("bad interval {:?}: {}", context.configuration(), e)))?;
        Ok(Self { context, interval, seen: 0 })
    }

    fn context(&self) -> &ModuleContext {
        &self.context
    }

    async fn receive(&mut self, _message: Message) {
        self.seen += 1;
    }

    async fn destroy(&mut self) {}
}

/// Records when each call starts and ends, sleeping inside `receive`.
pub struct SlowModule {
    context: ModuleContext,
    pub events: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait::async_trait]
impl Module for SlowModule {
    fn create(context: ModuleContext) -> Result<Self> {
        Ok(Self { context, events: Arc::new(Mutex::new(Vec::new())) })
    }

    fn context(&self) -> &ModuleContext {
        &self.context
    }

    async fn receive(&mut self, _message: Message) {
        self.events.lock().unwrap().push("receive-start");
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.events.lock().unwrap().push("receive-end");
    }

    async fn destroy(&mut self) {
        self.events.lock().unwrap().push("destroy");
    }
}
