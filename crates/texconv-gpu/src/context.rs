//! GPU context: a dedicated thread that owns the device.
//!
//! Driver objects are not shared across threads. Every operation on the
//! device is marshalled onto the context thread, either blocking the caller
//! until it completes ([`GpuContext::invoke`]) or fire and forget
//! ([`GpuContext::submit`], used for releases from `Drop`).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use texconv_core::{DeviceCapabilities, Error, Result};
use tracing::{debug, error};

use crate::device::GpuDevice;

type Job = Box<dyn FnOnce(&mut dyn GpuDevice) + Send + 'static>;

/// Identity of a context, used to reject frames from another device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

struct ContextInner {
    id: ContextId,
    sender: Option<mpsc::Sender<Job>>,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
    capabilities: DeviceCapabilities,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        // closing the channel ends the thread's job loop
        self.sender.take();
        if let Some(handle) = self.thread.take() {
            if thread::current().id() == self.thread_id {
                return;
            }
            if handle.join().is_err() {
                error!(context = self.id.0, "context thread panicked");
            }
        }
    }
}

/// Cloneable handle to a device running on its own thread.
#[derive(Clone)]
pub struct GpuContext {
    inner: Arc<ContextInner>,
}

impl GpuContext {
    /// Starts a context thread and builds the device on it with `factory`.
    pub fn new<F>(factory: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Box<dyn GpuDevice>> + Send + 'static,
    {
        let id = ContextId::next();
        let (sender, receiver) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<DeviceCapabilities>>();

        let handle = thread::Builder::new()
            .name(format!("texconv-gpu-{}", id.0))
            .spawn(move || {
                let mut device = match factory() {
                    Ok(device) => {
                        let _ = ready_tx.send(Ok(device.capabilities().clone()));
                        device
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                for job in receiver {
                    job(device.as_mut());
                }
                debug!(context = id.0, "context thread finished");
            })
            .map_err(|e| Error::device(format!("cannot spawn context thread: {e}")))?;

        let capabilities = ready_rx
            .recv()
            .map_err(|_| Error::device("context thread exited during startup"))??;
        debug!(context = id.0, device = %capabilities.name, "context started");

        Ok(Self {
            inner: Arc::new(ContextInner {
                id,
                thread_id: handle.thread().id(),
                sender: Some(sender),
                thread: Some(handle),
                capabilities,
            }),
        })
    }

    /// Identity of this context.
    #[inline]
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// Capabilities the device reported at startup.
    #[inline]
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.inner.capabilities
    }

    /// Whether the caller runs on the context thread.
    pub fn is_context_thread(&self) -> bool {
        thread::current().id() == self.inner.thread_id
    }

    /// Runs `f` on the context thread and waits for its result.
    ///
    /// Calling this from the context thread would deadlock and fails with
    /// [`Error::Device`] instead.
    pub fn invoke<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GpuDevice) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_context_thread() {
            return Err(Error::device("invoke called from the context thread"));
        }
        let (tx, rx) = mpsc::sync_channel(1);
        self.send(Box::new(move |device| {
            let _ = tx.send(f(device));
        }))?;
        rx.recv().map_err(|_| Error::device("context thread dropped the job"))
    }

    /// Queues `f` on the context thread without waiting.
    pub fn submit<F>(&self, f: F)
    where
        F: FnOnce(&mut dyn GpuDevice) + Send + 'static,
    {
        if self.send(Box::new(f)).is_err() {
            debug!(context = self.inner.id.0, "context gone, job dropped");
        }
    }

    fn send(&self, job: Job) -> Result<()> {
        let sender = self
            .inner
            .sender
            .as_ref()
            .ok_or_else(|| Error::device("context is shutting down"))?;
        sender
            .send(job)
            .map_err(|_| Error::device("context thread is not running"))
    }
}

impl fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuContext")
            .field("id", &self.inner.id.0)
            .field("device", &self.inner.capabilities.name)
            .finish()
    }
}
