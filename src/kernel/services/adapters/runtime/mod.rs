//! Async runtime adapter: executes effects off the loop thread and sends
//! completions back over the kernel bus.

mod async_runtime;
mod effects;

pub use async_runtime::{AsyncRuntime, TokioExecutor};
pub use effects::EffectRunner;
