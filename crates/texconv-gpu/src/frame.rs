//! Frames and the GPU memory backing them.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use texconv_core::{Error, Result, TexelFormat, TextureTarget, VideoInfo};
use tracing::trace;

use crate::context::{ContextId, GpuContext};
use crate::device::{SyncPoint, TextureDescriptor, TextureId};
use crate::pool::PoolShared;

/// A device texture released on its context when the last owner drops it.
pub struct OwnedTexture {
    id: TextureId,
    desc: TextureDescriptor,
    context: GpuContext,
}

impl OwnedTexture {
    pub(crate) fn new(context: GpuContext, id: TextureId, desc: TextureDescriptor) -> Self {
        Self { id, desc, context }
    }

    /// Device handle.
    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Creation parameters.
    #[inline]
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    /// Context owning the texture.
    #[inline]
    pub fn context(&self) -> &GpuContext {
        &self.context
    }
}

impl Drop for OwnedTexture {
    fn drop(&mut self) {
        let id = self.id;
        trace!(texture = id.0, "releasing texture");
        self.context.submit(move |device| device.delete_texture(id));
    }
}

impl fmt::Debug for OwnedTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedTexture")
            .field("id", &self.id.0)
            .field("desc", &self.desc)
            .field("context", &self.context.id())
            .finish()
    }
}

/// Storage of one plane of one view.
#[derive(Debug, Clone)]
pub enum Memory {
    /// A texture on a GPU context.
    Gpu(Arc<OwnedTexture>),
    /// Plain bytes in system memory.
    System(Vec<u8>),
}

impl Memory {
    /// The texture, for GPU memory.
    pub fn texture(&self) -> Option<&Arc<OwnedTexture>> {
        match self {
            Self::Gpu(t) => Some(t),
            Self::System(_) => None,
        }
    }
}

struct FrameInner {
    info: VideoInfo,
    memories: Vec<Memory>,
    sync: Mutex<Option<SyncPoint>>,
    context: Option<ContextId>,
    recycler: Option<Weak<PoolShared>>,
}

impl Drop for FrameInner {
    fn drop(&mut self) {
        let Some(pool) = self.recycler.take().and_then(|w| w.upgrade()) else {
            return;
        };
        let textures = std::mem::take(&mut self.memories)
            .into_iter()
            .filter_map(|m| match m {
                Memory::Gpu(t) => Some(t),
                Memory::System(_) => None,
            })
            .collect();
        pool.recycle(textures);
    }
}

/// A video frame: format info plus one memory per plane per view.
///
/// Cloning is cheap and shares the memories. GPU frames carry the sync point
/// of the last write, which readers wait on before touching the textures.
#[derive(Clone)]
pub struct Frame {
    inner: Arc<FrameInner>,
}

impl Frame {
    pub(crate) fn from_textures(
        info: VideoInfo,
        textures: Vec<Arc<OwnedTexture>>,
        context: ContextId,
        recycler: Option<Weak<PoolShared>>,
    ) -> Self {
        Self {
            inner: Arc::new(FrameInner {
                info,
                memories: textures.into_iter().map(Memory::Gpu).collect(),
                sync: Mutex::new(None),
                context: Some(context),
                recycler,
            }),
        }
    }

    /// A frame in system memory, one byte buffer per plane per view.
    pub fn from_system(info: VideoInfo, planes: Vec<Vec<u8>>) -> Result<Self> {
        if planes.len() != info.n_memories() {
            return Err(Error::frame(format!(
                "{} expects {} memories, got {}",
                info.format,
                info.n_memories(),
                planes.len()
            )));
        }
        Ok(Self {
            inner: Arc::new(FrameInner {
                info,
                memories: planes.into_iter().map(Memory::System).collect(),
                sync: Mutex::new(None),
                context: None,
                recycler: None,
            }),
        })
    }

    /// Uploads tightly packed plane data into new textures on `context`.
    ///
    /// `planes` holds one buffer per plane per view, views one after the
    /// other. Each buffer is sized for the texel format the device stores
    /// the plane as.
    pub fn upload(
        context: &GpuContext,
        info: &VideoInfo,
        planes: &[&[u8]],
        target: TextureTarget,
    ) -> Result<Self> {
        if planes.len() != info.n_memories() {
            return Err(Error::frame(format!(
                "{} expects {} memories, got {}",
                info.format,
                info.n_memories(),
                planes.len()
            )));
        }
        let descs = memory_descriptors(context, info, target)?;
        for (i, (desc, data)) in descs.iter().zip(planes).enumerate() {
            let expected = desc.width as usize * desc.height as usize * desc.format.bytes_per_texel();
            if data.len() != expected {
                return Err(Error::frame(format!(
                    "plane {i} of {} expects {expected} bytes, got {}",
                    info.format,
                    data.len()
                )));
            }
        }

        let data: Vec<Vec<u8>> = planes.iter().map(|p| p.to_vec()).collect();
        let job_descs = descs.clone();
        let (ids, sync) = context.invoke(move |device| -> Result<(Vec<TextureId>, SyncPoint)> {
            let mut ids = Vec::with_capacity(job_descs.len());
            for (desc, bytes) in job_descs.iter().zip(&data) {
                let created = device
                    .create_texture(desc)
                    .and_then(|id| device.write_texture(id, bytes).map(|_| id));
                match created {
                    Ok(id) => ids.push(id),
                    Err(e) => {
                        for id in ids {
                            device.delete_texture(id);
                        }
                        return Err(e);
                    }
                }
            }
            Ok((ids, device.insert_sync_point()))
        })??;

        let textures = ids
            .into_iter()
            .zip(descs)
            .map(|(id, desc)| Arc::new(OwnedTexture::new(context.clone(), id, desc)))
            .collect();
        let frame = Self::from_textures(info.clone(), textures, context.id(), None);
        frame.set_sync_point(sync);
        trace!(format = %info.format, width = info.width, height = info.height, "uploaded frame");
        Ok(frame)
    }

    /// Reads every GPU memory back, one buffer per plane per view.
    pub fn download(&self) -> Result<Vec<Vec<u8>>> {
        let mut ids = Vec::with_capacity(self.inner.memories.len());
        let mut context = None;
        for memory in &self.inner.memories {
            match memory {
                Memory::Gpu(t) => {
                    ids.push(t.id());
                    context.get_or_insert_with(|| t.context().clone());
                }
                Memory::System(_) => return Err(Error::frame("frame is in system memory")),
            }
        }
        let Some(context) = context else {
            return Ok(Vec::new());
        };
        let sync = self.sync_point();
        context.invoke(move |device| -> Result<Vec<Vec<u8>>> {
            if let Some(sync) = sync {
                device.wait_sync_point(sync)?;
            }
            ids.into_iter().map(|id| device.read_texture(id)).collect()
        })?
    }

    /// Format of the frame.
    #[inline]
    pub fn info(&self) -> &VideoInfo {
        &self.inner.info
    }

    /// Plane memories, views one after the other.
    #[inline]
    pub fn memories(&self) -> &[Memory] {
        &self.inner.memories
    }

    /// Number of memories.
    #[inline]
    pub fn n_memories(&self) -> usize {
        self.inner.memories.len()
    }

    /// Texture of memory `index`, if it is on the GPU.
    pub fn texture(&self, index: usize) -> Option<&Arc<OwnedTexture>> {
        self.inner.memories.get(index).and_then(Memory::texture)
    }

    /// Context the frame's textures belong to.
    #[inline]
    pub fn context_id(&self) -> Option<ContextId> {
        self.inner.context
    }

    /// Sync point of the last write.
    pub fn sync_point(&self) -> Option<SyncPoint> {
        self.inner.sync.lock().map(|s| *s).unwrap_or_else(|p| *p.into_inner())
    }

    /// Records the sync point of a write.
    pub fn set_sync_point(&self, sync: SyncPoint) {
        match self.inner.sync.lock() {
            Ok(mut s) => *s = Some(sync),
            Err(p) => *p.into_inner() = Some(sync),
        }
    }

    /// Whether both handles share the same frame.
    #[inline]
    pub fn ptr_eq(a: &Frame, b: &Frame) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("format", &self.inner.info.format)
            .field("width", &self.inner.info.width)
            .field("height", &self.inner.info.height)
            .field("memories", &self.inner.memories.len())
            .field("context", &self.inner.context)
            .finish()
    }
}

/// Texture descriptors of every memory of a frame of `info` on `context`.
pub(crate) fn memory_descriptors(
    context: &GpuContext,
    info: &VideoInfo,
    target: TextureTarget,
) -> Result<Vec<TextureDescriptor>> {
    let caps = context.capabilities();
    let mut descs = Vec::with_capacity(info.n_memories());
    for _ in 0..info.views {
        for plane in info.planes() {
            let format: TexelFormat = caps.plane_texel_format(plane.texel).ok_or_else(|| {
                Error::capability(
                    info.format,
                    info.format,
                    format!("device cannot store {} planes", plane.texel),
                )
            })?;
            descs.push(TextureDescriptor { width: plane.width, height: plane.height, format, target });
        }
    }
    Ok(descs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ReferenceDevice;
    use texconv_core::{DeviceCapabilities, VideoFormat};

    #[test]
    fn test_upload_download() {
        let (ctx, probe) = ReferenceDevice::spawn(DeviceCapabilities::full()).unwrap();
        let info = VideoInfo::new(VideoFormat::Nv12, 4, 2).unwrap();
        let y: Vec<u8> = (0..8).collect();
        let uv = vec![100, 200, 110, 210];
        let frame = Frame::upload(&ctx, &info, &[&y, &uv], TextureTarget::TwoD).unwrap();
        assert_eq!(frame.n_memories(), 2);
        assert!(frame.sync_point().is_some());
        assert_eq!(frame.context_id(), Some(ctx.id()));
        assert_eq!(frame.download().unwrap(), vec![y, uv]);
        assert_eq!(probe.live_textures(), 2);

        drop(frame);
        // releases are queued behind this call
        ctx.invoke(|_| ()).unwrap();
        assert_eq!(probe.live_textures(), 0);
    }

    #[test]
    fn test_upload_size_checked() {
        let (ctx, _probe) = ReferenceDevice::spawn(DeviceCapabilities::full()).unwrap();
        let info = VideoInfo::new(VideoFormat::Rgba, 2, 2).unwrap();
        let res = Frame::upload(&ctx, &info, &[&[0u8; 15]], TextureTarget::TwoD);
        assert!(matches!(res, Err(Error::FrameValidation { .. })));
        let res = Frame::upload(&ctx, &info, &[], TextureTarget::TwoD);
        assert!(matches!(res, Err(Error::FrameValidation { .. })));
    }

    #[test]
    fn test_system_frame() {
        let info = VideoInfo::new(VideoFormat::Gray8, 2, 2).unwrap();
        let frame = Frame::from_system(info, vec![vec![1, 2, 3, 4]]).unwrap();
        assert!(frame.texture(0).is_none());
        assert!(frame.context_id().is_none());
        assert!(frame.download().is_err());
        let copy = frame.clone();
        assert!(Frame::ptr_eq(&frame, &copy));
    }
}
