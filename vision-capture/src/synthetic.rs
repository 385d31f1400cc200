//! Synthetic test-pattern source
//!
//! Produces a moving gradient with optional frame pacing and randomly
//! injected transient failures. Lets the preview run without hardware.

use crate::source::{Capture, CaptureError, CaptureId, FrameSource, ReadOutcome};
use rand::Rng;
use std::thread;
use std::time::Duration;
use vision_frame::Frame;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Devices `0..device_count` can be opened
    pub device_count: u32,
    /// Sleep before each frame; zero disables pacing
    pub frame_interval: Duration,
    /// Probability in `[0, 1]` that a read fails transiently
    pub failure_rate: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            channels: 3,
            device_count: 1,
            frame_interval: Duration::from_millis(33),
            failure_rate: 0.0,
        }
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config }
    }
}

impl FrameSource for SyntheticSource {
    fn open(&mut self, device_index: u32) -> Result<Box<dyn Capture>, CaptureError> {
        if device_index >= self.config.device_count {
            return Err(CaptureError::unavailable(
                device_index,
                format!("only {} synthetic devices", self.config.device_count),
            ));
        }
        Frame::byte_len(self.config.width, self.config.height, self.config.channels)
            .map_err(|e| CaptureError::unavailable(device_index, e))?;

        log::info!(
            "Opened synthetic device {} ({}x{}x{})",
            device_index,
            self.config.width,
            self.config.height,
            self.config.channels
        );

        Ok(Box::new(SyntheticCapture {
            id: CaptureId::next(),
            device_index,
            config: self.config.clone(),
            tick: 0,
        }))
    }

    fn describe(&self) -> String {
        format!(
            "synthetic {}x{}x{}",
            self.config.width, self.config.height, self.config.channels
        )
    }
}

struct SyntheticCapture {
    id: CaptureId,
    device_index: u32,
    config: SyntheticConfig,
    tick: u32,
}

impl SyntheticCapture {
    fn render(&self) -> ReadOutcome {
        let SyntheticConfig {
            width,
            height,
            channels,
            ..
        } = self.config;
        let ch = channels as usize;
        let mut data = Vec::with_capacity(width as usize * height as usize * ch);

        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width).wrapping_add(self.tick) as u8;
                let g = (y * 255 / height).wrapping_add(self.tick) as u8;
                let b = (self.tick.wrapping_mul(3)) as u8;
                let px = [r, g, b, 255];
                match ch {
                    1 => data.push(((r as u16 + g as u16 + b as u16) / 3) as u8),
                    2 => data.extend_from_slice(&[r, g]),
                    _ => data.extend_from_slice(&px[..ch]),
                }
            }
        }

        match Frame::new(width, height, channels, data) {
            Ok(frame) => ReadOutcome::Frame(frame),
            Err(e) => {
                log::error!("Synthetic device {}: {}", self.device_index, e);
                ReadOutcome::Transient
            }
        }
    }
}

impl Capture for SyntheticCapture {
    fn read(&mut self) -> ReadOutcome {
        if !self.config.frame_interval.is_zero() {
            thread::sleep(self.config.frame_interval);
        }

        let rate = self.config.failure_rate.clamp(0.0, 1.0);
        if rate > 0.0 && rand::thread_rng().gen_bool(rate) {
            return ReadOutcome::Transient;
        }

        let outcome = self.render();
        self.tick = self.tick.wrapping_add(1);
        outcome
    }

    fn id(&self) -> CaptureId {
        self.id
    }

    fn device_index(&self) -> u32 {
        self.device_index
    }
}
