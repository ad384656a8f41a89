//! Periodic frame emission
//!
//! This module handles:
//! - Ticking at the session's output rate
//! - Pushing the configured window into the averager
//! - Stamping and writing one averaged frame per tick while Running

use crate::connection::ActiveSession;
use crate::control::StreamControl;
use crate::sampling::{lock_averager, SharedAverager};
use edroid_shared::{Frame, SampleRate};
use std::sync::Arc;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Writes averaged frames to the active session
pub struct FrameEmitter {
    averager: SharedAverager,
    control: Arc<StreamControl>,
    active: ActiveSession,
    /// Number of the last frame that was written successfully
    sequence: u8,
}

impl FrameEmitter {
    pub fn new(averager: SharedAverager, control: Arc<StreamControl>, active: ActiveSession) -> Self {
        Self {
            averager,
            control,
            active,
            sequence: 0,
        }
    }

    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// One emitter tick
    ///
    /// Returns the frame number that was written, or `None` when nothing was
    /// sent (not Running, no session, or the write failed).
    pub async fn emit_once(&mut self) -> Option<u8> {
        if !self.control.run_state().await.is_streaming() {
            return None;
        }
        let session = self.active.read().await.clone()?;

        let window = self.control.config().await.average_samples_amount;
        let mut frame: Frame = {
            let mut averager = lock_averager(&self.averager);
            averager.set_window(window);
            averager.compute_average()
        };

        let number = self.sequence.wrapping_add(1);
        frame.set_frame_number(number);

        match session.write(frame.as_bytes()).await {
            Ok(()) => {
                trace!("[EMIT] Frame {} to {}", number, session.peer());
                self.sequence = number;
                Some(number)
            }
            Err(e) => {
                debug!("[EMIT] Frame {} dropped: {}", number, e);
                None
            }
        }
    }

    /// Emit until cancelled, following rate changes
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut rate = self.control.config().await.samples_per_second;
        let mut ticker = ticker_for(rate);
        info!("[EMIT] Emitting at {}", rate);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let current = self.control.config().await.samples_per_second;
            if current != rate {
                info!("[EMIT] Rate {} -> {}", rate, current);
                rate = current;
                ticker = ticker_for(rate);
                // The fresh interval completes its first tick immediately
                ticker.tick().await;
            }

            self.emit_once().await;
        }

        info!("[EMIT] Emitter stopped after frame {}", self.sequence);
    }
}

fn ticker_for(rate: SampleRate) -> Interval {
    let mut ticker = interval(Duration::from_millis(rate.period_ms()));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
