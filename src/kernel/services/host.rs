use std::future::Future;
use std::sync::Arc;

use super::bus::{kernel_bus, KernelBusReceiver, KernelBusSender, KernelMessage};
use super::ports::{
    AsyncExecutor, BoxFuture, DocumentCodec, FileClosedListener, FileSystem, Navigator, Notifier,
    Store,
};
use crate::kernel::pane::PaneServices;
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Every collaborator the kernel talks to, behind its port.
#[derive(Clone)]
pub struct KernelServices {
    pub fs: Arc<dyn FileSystem>,
    pub store: Arc<dyn Store>,
    pub codec: Arc<dyn DocumentCodec>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub closed: Arc<dyn FileClosedListener>,
}

impl KernelServices {
    pub fn pane(&self) -> PaneServices<'_> {
        PaneServices {
            fs: self.fs.as_ref(),
            store: self.store.as_ref(),
            closed: self.closed.as_ref(),
        }
    }
}

pub struct KernelServiceHost {
    services: KernelServices,
    bus: KernelBusSender,
    rx: KernelBusReceiver,
    executor: Arc<dyn AsyncExecutor>,
}

#[derive(Clone)]
pub struct KernelServiceContext {
    bus: KernelBusSender,
    executor: Arc<dyn AsyncExecutor>,
}

impl KernelServiceHost {
    pub fn new(services: KernelServices, executor: Arc<dyn AsyncExecutor>) -> Self {
        let (bus, rx) = kernel_bus();
        Self {
            services,
            bus,
            rx,
            executor,
        }
    }

    pub fn context(&self) -> KernelServiceContext {
        KernelServiceContext {
            bus: self.bus.clone(),
            executor: Arc::clone(&self.executor),
        }
    }

    pub fn services(&self) -> &KernelServices {
        &self.services
    }

    pub fn executor(&self) -> Arc<dyn AsyncExecutor> {
        Arc::clone(&self.executor)
    }

    pub fn bus(&self) -> KernelBusSender {
        self.bus.clone()
    }

    pub fn try_recv(&mut self) -> Result<KernelMessage, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<KernelMessage, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

impl KernelServiceContext {
    pub fn dispatch(&self, action: crate::kernel::Action) {
        self.bus.dispatch(action);
    }

    pub fn spawn(&self, task: BoxFuture) {
        self.executor.spawn(task);
    }

    pub fn spawn_future<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.executor.spawn(Box::pin(task));
    }
}
