use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::depth::FrameSource;
use crate::display::OverlaySnapshot;
use crate::speech::SpeechSink;

use super::monitor::detection_loop;

/// Owns the detection loop's lifetime: one cancellation token and one join
/// handle per run. The presentation layer subscribes to the overlay channel
/// before or after `start`; the channel outlives individual runs.
pub struct DetectionController {
    config: PipelineConfig,
    overlay_tx: watch::Sender<OverlaySnapshot>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl DetectionController {
    pub fn new(config: PipelineConfig) -> Self {
        let (overlay_tx, _) = watch::channel(OverlaySnapshot::clear());
        Self {
            config,
            overlay_tx,
            handle: None,
            cancel_token: None,
        }
    }

    /// Receiver for per-cycle overlay snapshots (alert flag, display string,
    /// status-bar visibility).
    pub fn subscribe(&self) -> watch::Receiver<OverlaySnapshot> {
        self.overlay_tx.subscribe()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Swap tunables between runs. Refused while detection is active so a
    /// running loop never sees a half-applied config.
    pub fn set_config(&mut self, config: PipelineConfig) -> Result<()> {
        if self.handle.is_some() {
            bail!("cannot reconfigure while detection is active");
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub async fn start(
        &mut self,
        source: Arc<dyn FrameSource>,
        speech: Arc<dyn SpeechSink>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("detection already active");
        }
        self.config.validate()?;

        let session_id = Uuid::new_v4().to_string();
        info!(
            "starting detection session {session_id} (threshold {} m, tick {} ms)",
            self.config.threshold_m, self.config.tick_interval_ms
        );

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(detection_loop(
            session_id,
            source,
            self.config.clone(),
            speech,
            self.overlay_tx.clone(),
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancel the loop and wait for it to finish. Any in-flight scan result
    /// is discarded by the loop itself; the overlay resets so a dismissed
    /// view cannot keep showing a stale alert.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("detection loop task failed to join")?;
        }

        self.overlay_tx.send_replace(OverlaySnapshot::clear());
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}
