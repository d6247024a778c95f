use super::types::SessionState;
use super::SessionController;
use crate::camera::CameraConstraints;
use crate::error::SessionError;
use crate::product::Product;
use crate::render::{FrameTicker, OverlayCompositor, RenderLoop};
use std::sync::Arc;
use tracing::{info, warn};

impl SessionController {
    /// Bring the session live for `product`.
    ///
    /// Pose loading starts in the background and never holds up the camera.
    /// Camera acquisition and garment loading run concurrently; a failure
    /// of either is fatal and leaves the session in `Failed`. A `close()`
    /// that lands while this is still awaiting wins: whatever was acquired
    /// is released and `Ok(())` is returned with the session `Closed`.
    pub async fn start(&self, product: Product) -> Result<(), SessionError> {
        if !product.has_try_on {
            warn!("Product '{}' has no try-on support", product.id);
            return Err(SessionError::TryOnUnsupported {
                product: product.name.clone(),
            });
        }

        if !self.transition(SessionState::Starting) {
            return Err(SessionError::AlreadyStarted);
        }

        info!("Starting try-on session for '{}' ({})", product.name, product.id);
        self.pose.start();

        let constraints = CameraConstraints::from(&self.config.camera);
        let (primary, fallback) = product.image_sources(&self.config.garment);
        let acquisition = async {
            tokio::join!(
                self.camera.acquire(&constraints),
                self.garments.load(primary, fallback)
            )
        };

        let (stream, asset) = tokio::select! {
            biased;
            _ = self.cancellation_token.cancelled() => {
                info!("Session closed during startup");
                self.camera.release();
                return Ok(());
            }
            results = acquisition => results,
        };

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => return Err(self.fail(e.into())),
        };
        let asset = match asset {
            Ok(asset) => asset,
            Err(e) => return Err(self.fail(e.into())),
        };

        info!(
            "Garment '{}' loaded ({}x{})",
            asset.source(),
            asset.width(),
            asset.height()
        );
        self.assets.replace(Arc::new(asset));
        *self.product.lock() = Some(product);

        let mut render = RenderLoop::new(
            Arc::clone(&stream),
            Arc::clone(&self.assets),
            self.pose.subscribe(),
            OverlayCompositor::new(self.config.pose.confidence_threshold),
        );
        for sink in &self.sinks {
            render.add_sink(Arc::clone(sink));
        }
        *self.render_stats.lock() = Some(render.stats_handle());

        let ticker = FrameTicker::new(
            self.config.render.frame_interval(),
            self.cancellation_token.child_token(),
        );
        *self.render_task.lock() = Some(tokio::spawn(render.run(ticker)));

        if !self.transition(SessionState::Live) {
            // close() ran between acquisition and here
            self.cancellation_token.cancel();
            self.camera.release();
            return Ok(());
        }

        let (width, height) = stream.native_size();
        info!("Session live at {}x{}", width, height);
        Ok(())
    }

    /// Switch the garment of a live session. The current garment keeps
    /// rendering until the new one has loaded.
    pub async fn select_product(&self, product: Product) -> Result<(), SessionError> {
        if !product.has_try_on {
            return Err(SessionError::TryOnUnsupported {
                product: product.name.clone(),
            });
        }
        if *self.state.borrow() != SessionState::Live {
            return Err(SessionError::NotLive);
        }

        let (primary, fallback) = product.image_sources(&self.config.garment);
        let asset = match self.garments.load(primary, fallback).await {
            Ok(asset) => asset,
            Err(e) => return Err(self.fail(e.into())),
        };

        if *self.state.borrow() != SessionState::Live {
            return Err(SessionError::NotLive);
        }

        info!("Switched garment to '{}' ({})", product.name, asset.source());
        self.assets.replace(Arc::new(asset));
        *self.product.lock() = Some(product);
        Ok(())
    }
}
