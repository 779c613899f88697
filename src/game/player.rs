//! Timed clip playback on top of an audio device

use std::{
    sync::{
        Arc, Mutex,
        mpsc::{self, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use thiserror::Error;

use crate::domain::track::Track;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("track {0} has nothing to play")]
    NothingToPlay(String),

    #[error("audio device unavailable: {0}")]
    Unavailable(String),
}

/// Something that can play a track from its start.
///
/// `play_clip` is fire-and-forget; the `ClipPlayer` calls `stop` once the
/// clip length has elapsed.
pub trait AudioDevice: Send + 'static {
    fn play_clip(&mut self, track: &Track, seconds: u32) -> Result<(), DeviceError>;
    fn stop(&mut self);
}

/// Device that only reports clips, for terminals without an audio backend
#[derive(Debug, Default)]
pub struct LogDevice;

impl AudioDevice for LogDevice {
    fn play_clip(&mut self, track: &Track, seconds: u32) -> Result<(), DeviceError> {
        let url = track
            .preview_url
            .as_deref()
            .ok_or_else(|| DeviceError::NothingToPlay(track.id.clone()))?;
        log::info!("playing {seconds}s of {}", track.uri);
        println!("  >> first {seconds}s of the preview: {url}");
        Ok(())
    }

    fn stop(&mut self) {
        log::debug!("clip stopped");
    }
}

struct ClipTimer {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

/// Plays one clip at a time.
///
/// Starting a clip cancels the timer of the previous one and stops the
/// device before playback starts again, so clips never overlap.
pub struct ClipPlayer<D: AudioDevice> {
    device: Arc<Mutex<D>>,
    timer: Option<ClipTimer>,
    unit: Duration,
}

impl<D: AudioDevice> ClipPlayer<D> {
    pub fn new(device: D) -> Self {
        Self::with_unit(device, Duration::from_secs(1))
    }

    /// `unit` is the wall-clock length of one clip "second"
    pub fn with_unit(device: D, unit: Duration) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
            timer: None,
            unit,
        }
    }

    pub fn play(&mut self, track: &Track, seconds: u32) -> Result<(), DeviceError> {
        self.stop();

        self.with_device(|device| device.play_clip(track, seconds))??;

        let (cancel, cancelled) = mpsc::channel::<()>();
        let device = Arc::clone(&self.device);
        let length = self.unit * seconds;
        let handle = thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(length) {
                if let Ok(mut device) = device.lock() {
                    device.stop();
                }
            }
        });
        self.timer = Some(ClipTimer { cancel, handle });
        Ok(())
    }

    /// cancels the running clip timer, if any, and stops the device
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            // the timer may have fired already, in which case nobody listens
            let _ = timer.cancel.send(());
            if timer.handle.join().is_err() {
                log::warn!("clip timer thread panicked");
            }
        }
        if let Err(e) = self.with_device(|device| device.stop()) {
            log::warn!("could not stop audio device: {e}");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| !timer.handle.is_finished())
    }

    fn with_device<T>(&self, f: impl FnOnce(&mut D) -> T) -> Result<T, DeviceError> {
        let mut device = self
            .device
            .lock()
            .map_err(|e| DeviceError::Unavailable(format!("device lock poisoned: {e}")))?;
        Ok(f(&mut *device))
    }
}

impl<D: AudioDevice> Drop for ClipPlayer<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
