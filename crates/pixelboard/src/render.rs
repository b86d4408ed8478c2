//! Render Loop
//!
//! Drives the scheduler at a fixed frame rate. Each tick lets the display
//! manager rotate slots and render the active plugin, then publishes the
//! finished frame on a watch channel for the web API.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

use display_runtime::{Canvas, DisplayMgr};

/// One rendered frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub active_slot: Option<usize>,
    /// Row-major, `0x00RRGGBB`
    pub pixels: Vec<u32>,
}

impl Frame {
    /// All black frame shown before the first tick
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            active_slot: None,
            pixels: vec![0; (width as usize) * (height as usize)],
        }
    }

    pub fn capture(canvas: &Canvas, active_slot: Option<usize>) -> Self {
        Self {
            width: canvas.width(),
            height: canvas.height(),
            active_slot,
            pixels: canvas.to_rgb_words(),
        }
    }
}

/// Channel carrying the most recent frame
pub fn frame_channel(width: u32, height: u32) -> (watch::Sender<Arc<Frame>>, watch::Receiver<Arc<Frame>>) {
    watch::channel(Arc::new(Frame::blank(width, height)))
}

/// Tick the display until `shutdown` flips or its sender is dropped
pub async fn run_render_loop(
    display: DisplayMgr,
    period: Duration,
    frames: watch::Sender<Arc<Frame>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let settings = display.settings();
    let mut canvas = Canvas::new(settings.width, settings.height);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(period_ms = period.as_millis() as u64, "Render loop started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                display.update(&mut canvas);
                let frame = Frame::capture(&canvas, display.active_slot());
                frames.send_replace(Arc::new(frame));
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Render loop stopped");
}
