//! Pool of output frames.
//!
//! Frames handed out by [`BufferPool::acquire`] return their textures to the
//! pool when the last clone drops. Once the pool itself is gone, returned
//! textures are released instead.

use std::sync::{Arc, Mutex, MutexGuard};

use texconv_core::{Error, Result, TextureTarget, VideoInfo};
use tracing::{debug, trace, warn};

use crate::context::GpuContext;
use crate::device::{TextureDescriptor, TextureId};
use crate::frame::{memory_descriptors, Frame, OwnedTexture};

type TextureSet = Vec<Arc<OwnedTexture>>;

#[derive(Default)]
struct PoolState {
    free: Vec<TextureSet>,
    outstanding: usize,
}

pub(crate) struct PoolShared {
    context: GpuContext,
    info: VideoInfo,
    descs: Vec<TextureDescriptor>,
    min_buffers: usize,
    max_buffers: usize,
    state: Mutex<PoolState>,
}

impl PoolShared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub(crate) fn recycle(&self, textures: TextureSet) {
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        if textures.len() == self.descs.len() {
            state.free.push(textures);
        } else {
            warn!(format = %self.info.format, "incomplete buffer returned, releasing");
        }
        trace!(free = state.free.len(), outstanding = state.outstanding, "buffer returned");
    }

    fn allocate(&self) -> Result<TextureSet> {
        let descs = self.descs.clone();
        let ids = self.context.invoke(move |device| -> Result<Vec<TextureId>> {
            let mut ids = Vec::with_capacity(descs.len());
            for desc in &descs {
                match device.create_texture(desc) {
                    Ok(id) => ids.push(id),
                    Err(e) => {
                        for id in ids {
                            device.delete_texture(id);
                        }
                        return Err(e);
                    }
                }
            }
            Ok(ids)
        })??;
        Ok(ids
            .into_iter()
            .zip(&self.descs)
            .map(|(id, desc)| Arc::new(OwnedTexture::new(self.context.clone(), id, *desc)))
            .collect())
    }
}

/// Output frame pool for one format.
pub struct BufferPool {
    shared: Arc<PoolShared>,
}

impl BufferPool {
    /// Creates a pool of `info` frames and preallocates `min_buffers`.
    ///
    /// `max_buffers` bounds the frames alive at once, 0 for unbounded.
    pub fn new(
        context: &GpuContext,
        info: &VideoInfo,
        target: TextureTarget,
        min_buffers: usize,
        max_buffers: usize,
    ) -> Result<Self> {
        if max_buffers > 0 && min_buffers > max_buffers {
            return Err(Error::resource(format!(
                "pool minimum {min_buffers} exceeds maximum {max_buffers}"
            )));
        }
        let descs = memory_descriptors(context, info, target)?;
        let shared = Arc::new(PoolShared {
            context: context.clone(),
            info: info.clone(),
            descs,
            min_buffers,
            max_buffers,
            state: Mutex::new(PoolState::default()),
        });
        for _ in 0..min_buffers {
            let set = shared.allocate()?;
            shared.lock().free.push(set);
        }
        debug!(
            format = %info.format,
            width = info.width,
            height = info.height,
            min_buffers,
            max_buffers,
            "buffer pool created"
        );
        Ok(Self { shared })
    }

    /// A frame from the pool, allocating when none is free.
    pub fn acquire(&self) -> Result<Frame> {
        let shared = &self.shared;
        let reused = {
            let mut state = shared.lock();
            let free = state.free.pop();
            if free.is_none() && shared.max_buffers > 0 && state.outstanding >= shared.max_buffers {
                return Err(Error::resource(format!(
                    "buffer pool exhausted: {} of {} buffers in use",
                    state.outstanding, shared.max_buffers
                )));
            }
            state.outstanding += 1;
            free
        };
        let textures = match reused {
            Some(set) => set,
            None => match shared.allocate() {
                Ok(set) => {
                    trace!(format = %shared.info.format, "allocated pool buffer");
                    set
                }
                Err(e) => {
                    let mut state = shared.lock();
                    state.outstanding = state.outstanding.saturating_sub(1);
                    return Err(e);
                }
            },
        };
        Ok(Frame::from_textures(
            shared.info.clone(),
            textures,
            shared.context.id(),
            Some(Arc::downgrade(shared)),
        ))
    }

    /// Format of the pooled frames.
    pub fn info(&self) -> &VideoInfo {
        &self.shared.info
    }

    /// Frames currently handed out.
    pub fn outstanding(&self) -> usize {
        self.shared.lock().outstanding
    }

    /// Frames ready for reuse.
    pub fn free(&self) -> usize {
        self.shared.lock().free.len()
    }

    /// Preallocated minimum.
    pub fn min_buffers(&self) -> usize {
        self.shared.min_buffers
    }

    /// Maximum frames alive at once, 0 for unbounded.
    pub fn max_buffers(&self) -> usize {
        self.shared.max_buffers
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("format", &self.shared.info.format)
            .field("min_buffers", &self.shared.min_buffers)
            .field("max_buffers", &self.shared.max_buffers)
            .field("outstanding", &self.outstanding())
            .field("free", &self.free())
            .finish()
    }
}
