use super::transform::OverlayTransform;
use crate::error::{Result, TryOnError};
use crate::frame::{encode_rgba_jpeg, RenderFrame};
use chrono::Local;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Consumer of composited frames (display, preview host, recorder)
pub trait FrameSink: Send + Sync {
    fn present(&self, frame: &RenderFrame, transform: &OverlayTransform) -> Result<()>;

    fn name(&self) -> &str;
}

/// Publishes the most recent composite for an embedding host
pub struct LatestFrameSink {
    sender: watch::Sender<Option<Arc<RgbaImage>>>,
    presented: AtomicU64,
}

impl LatestFrameSink {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender,
            presented: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<RgbaImage>>> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> Option<Arc<RgbaImage>> {
        self.sender.borrow().clone()
    }

    pub fn presented(&self) -> u64 {
        self.presented.load(Ordering::Relaxed)
    }
}

impl Default for LatestFrameSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for LatestFrameSink {
    fn present(&self, frame: &RenderFrame, _transform: &OverlayTransform) -> Result<()> {
        self.sender.send_replace(Some(Arc::new(frame.image().clone())));
        self.presented.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "latest"
    }
}

/// Writes every Nth composite as a JPEG file
pub struct SnapshotSink {
    dir: PathBuf,
    every: u64,
    counter: AtomicU64,
}

impl SnapshotSink {
    pub fn new<P: AsRef<Path>>(dir: P, every: u32) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            every: every.max(1) as u64,
            counter: AtomicU64::new(0),
        })
    }
}

impl FrameSink for SnapshotSink {
    fn present(&self, frame: &RenderFrame, transform: &OverlayTransform) -> Result<()> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        if n % self.every != 0 {
            return Ok(());
        }

        let jpeg = encode_rgba_jpeg(frame.image(), 85).map_err(|e| {
            TryOnError::component("snapshot".to_string(), format!("JPEG encode failed: {}", e))
        })?;

        let name = format!(
            "tryon_{}_{:06}.jpg",
            Local::now().format("%Y%m%d_%H%M%S%.3f"),
            n
        );
        let path = self.dir.join(name);
        std::fs::write(&path, jpeg)?;
        debug!("Snapshot {:?} written to {}", transform.mode, path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "snapshot"
    }
}
