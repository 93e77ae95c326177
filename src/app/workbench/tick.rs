use super::Workbench;
use crate::kernel::services::KernelMessage;
use crate::kernel::Action;
use std::sync::mpsc;
use std::time::{Duration, Instant};

const SETTLE_SLICE: Duration = Duration::from_millis(10);

impl Workbench {
    /// One pass of the loop without blocking.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        changed |= self.poll_kernel_bus();
        changed |= self.poll_watcher();
        changed
    }

    pub fn poll_kernel_bus(&mut self) -> bool {
        let mut changed = false;
        let mut drained = 0usize;
        while drained < super::MAX_KERNEL_BUS_DRAIN_PER_TICK {
            match self.host.try_recv() {
                Ok(msg) => {
                    drained += 1;
                    changed |= self.handle_message(msg);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    pub fn poll_watcher(&mut self) -> bool {
        let Some(watcher) = self.watcher.as_mut() else {
            return false;
        };
        let events = watcher.drain_events();
        let mut changed = false;
        for event in events {
            changed |= self.dispatch(Action::Watch(event));
        }
        changed
    }

    /// Pumps until every machine is idle with nothing queued, or `timeout`
    /// passes. Returns whether the kernel settled.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.tick();
            if self.core.is_settled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline || self.shutdown {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "kernel did not settle");
                return false;
            }
            if let Ok(msg) = self.host.recv_timeout(SETTLE_SLICE.min(deadline - now)) {
                self.handle_message(msg);
            }
        }
    }

    /// Blocks on the kernel bus, polling the watcher every `poll_interval`,
    /// until a shutdown message arrives.
    pub fn run(&mut self, poll_interval: Duration) {
        while !self.shutdown {
            match self.host.recv_timeout(poll_interval) {
                Ok(msg) => {
                    self.handle_message(msg);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
            self.poll_watcher();
        }
        tracing::info!("workbench loop stopped");
    }

    fn handle_message(&mut self, msg: KernelMessage) -> bool {
        match msg {
            KernelMessage::Action(action) => self.dispatch(action),
            KernelMessage::Shutdown => {
                self.shutdown = true;
                true
            }
        }
    }
}
