use crate::{
    foundation::core::RenderSize,
    foundation::error::{MontageError, MontageResult},
    render::frame::FrameRef,
};

#[derive(Debug, Clone, Copy)]
pub struct PixelBufferPoolOpts {
    /// Maximum number of idle buffers kept for reuse.
    pub max_retained: usize,
}

impl Default for PixelBufferPoolOpts {
    fn default() -> Self {
        Self { max_retained: 4 }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PixelBufferPoolStats {
    pub retained: usize,
    pub allocations: u64,
    pub checkouts: u64,
    pub dropped_on_release: u64,
}

/// Bounded pool of render-sized RGBA8 buffers for the raster path.
///
/// [`checkout`](Self::checkout) borrows the pool mutably, so at most one buffer is in flight and
/// it cannot outlive the frame that uses it.
#[derive(Debug)]
pub struct PixelBufferPool {
    size: RenderSize,
    opts: PixelBufferPoolOpts,
    stats: PixelBufferPoolStats,
    free: Vec<Vec<u8>>,
}

impl PixelBufferPool {
    pub fn new(size: RenderSize, opts: PixelBufferPoolOpts) -> MontageResult<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(MontageError::validation(
                "pixel buffer size must be non-zero",
            ));
        }
        Ok(Self {
            size,
            opts,
            stats: PixelBufferPoolStats::default(),
            free: Vec::new(),
        })
    }

    pub fn size(&self) -> RenderSize {
        self.size
    }

    pub fn stats(&self) -> PixelBufferPoolStats {
        self.stats.clone()
    }

    pub fn checkout(&mut self) -> PixelBuffer<'_> {
        self.stats.checkouts = self.stats.checkouts.saturating_add(1);
        let data = match self.free.pop() {
            Some(buf) => {
                self.stats.retained = self.free.len();
                buf
            }
            None => {
                self.stats.allocations = self.stats.allocations.saturating_add(1);
                vec![0u8; self.size.byte_len_rgba8()]
            }
        };
        PixelBuffer { pool: self, data }
    }

    fn release(&mut self, data: Vec<u8>) {
        if self.free.len() >= self.opts.max_retained || data.len() != self.size.byte_len_rgba8() {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }
        self.free.push(data);
        self.stats.retained = self.free.len();
    }
}

/// One checked-out buffer. Returned to the pool on drop, whatever path the frame took.
pub struct PixelBuffer<'a> {
    pool: &'a mut PixelBufferPool,
    data: Vec<u8>,
}

impl PixelBuffer<'_> {
    pub fn size(&self) -> RenderSize {
        self.pool.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Straight-alpha view for submission to a writer.
    pub fn as_frame(&self) -> FrameRef<'_> {
        FrameRef {
            width: self.pool.size.width,
            height: self.pool.size.height,
            data: &self.data,
            premultiplied: false,
        }
    }
}

impl Drop for PixelBuffer<'_> {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        self.pool.release(data);
    }
}
