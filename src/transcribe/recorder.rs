//! Microphone recording for voice prompts.
//!
//! [`MicRecorder`] owns a dedicated capture thread: a `cpal` input stream
//! delivers raw interleaved chunks over a channel, and the same thread
//! downmixes to mono, resamples to the Whisper rate and appends to a shared
//! sample buffer — but only while a recording session is active. `begin`
//! and `finish` just flip the gate and drain the buffer, so arming and
//! disarming are cheap and never touch the audio hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::TranscriptionError;

/// Sample rate expected by the speech model, in Hz.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// Sample conversion
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging channels.
pub(crate) fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

/// Linear-interpolation resampler. Sufficient for speech input; a windowed
/// sinc filter would only matter for music-grade material.
pub(crate) fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };
        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// MicRecorder
// ---------------------------------------------------------------------------

/// Gated microphone recorder producing 16 kHz mono `f32` samples.
pub struct MicRecorder {
    buffer: Arc<Mutex<Vec<f32>>>,
    active: Arc<AtomicBool>,
}

impl MicRecorder {
    /// Open the default input device and spawn the capture thread.
    ///
    /// The constructor blocks until the stream is running (or has failed),
    /// so a returned recorder is immediately usable.
    pub fn new() -> Result<Self, TranscriptionError> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let active = Arc::new(AtomicBool::new(false));

        let (init_tx, init_rx) = std::sync::mpsc::channel();
        let buffer_clone = Arc::clone(&buffer);
        let active_clone = Arc::clone(&active);

        std::thread::Builder::new()
            .name("voice-capture".into())
            .spawn(move || capture_worker(init_tx, buffer_clone, active_clone))
            .map_err(|e| TranscriptionError::Unavailable(e.to_string()))?;

        match init_rx.recv() {
            Ok(Ok(())) => Ok(Self { buffer, active }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TranscriptionError::Unavailable(
                "voice-capture thread exited during startup".into(),
            )),
        }
    }

    /// Start a recording session: clear any leftover samples and open the
    /// gate. Calling `begin` while already active restarts the session.
    pub fn begin(&self) {
        self.buffer.lock().unwrap().clear();
        self.active.store(true, Ordering::Relaxed);
    }

    /// Close the gate and drain the accumulated samples.
    pub fn finish(&self) -> Vec<f32> {
        self.active.store(false, Ordering::Relaxed);
        std::mem::take(&mut *self.buffer.lock().unwrap())
    }

    /// Whether a recording session is currently active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Capture thread
// ---------------------------------------------------------------------------

fn capture_worker(
    init_tx: std::sync::mpsc::Sender<Result<(), TranscriptionError>>,
    buffer: Arc<Mutex<Vec<f32>>>,
    active: Arc<AtomicBool>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = init_tx.send(Err(TranscriptionError::Unavailable(
            "no input device found on the default audio host".into(),
        )));
        return;
    };

    let supported = match device.default_input_config() {
        Ok(supported) => supported,
        Err(e) => {
            let _ = init_tx.send(Err(TranscriptionError::Unavailable(e.to_string())));
            return;
        }
    };
    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let stream_config: cpal::StreamConfig = supported.into();

    let (chunk_tx, chunk_rx) = std::sync::mpsc::channel::<Vec<f32>>();

    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Ignore send errors; the receiver may have been dropped.
            let _ = chunk_tx.send(data.to_vec());
        },
        |err: cpal::StreamError| {
            log::error!("transcribe: cpal stream error: {err}");
        },
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = init_tx.send(Err(TranscriptionError::Unavailable(e.to_string())));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = init_tx.send(Err(TranscriptionError::Unavailable(e.to_string())));
        return;
    }

    let _ = init_tx.send(Ok(()));
    log::info!("transcribe: microphone capture running ({sample_rate} Hz, {channels} ch)");

    // The stream stays alive for as long as this loop runs; processing
    // happens here rather than in the realtime callback.
    while let Ok(chunk) = chunk_rx.recv() {
        if !active.load(Ordering::Relaxed) {
            continue;
        }
        let mono = downmix_to_mono(&chunk, channels);
        let converted = resample(&mono, sample_rate, WHISPER_SAMPLE_RATE);
        buffer.lock().unwrap().extend_from_slice(&converted);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- downmix_to_mono -------------------------------------------------

    #[test]
    fn downmix_already_mono_is_identity() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&input, 1), input);
    }

    #[test]
    fn downmix_averages_stereo_frames() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.5];
        let out = downmix_to_mono(&input, 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_zero_channels_is_empty() {
        assert!(downmix_to_mono(&[1.0, 2.0], 0).is_empty());
    }

    // ---- resample --------------------------------------------------------

    #[test]
    fn resample_same_rate_is_identity() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        assert_eq!(resample(&input, 16_000, 16_000), input);
    }

    #[test]
    fn resample_empty_is_empty() {
        assert!(resample(&[], 48_000, 16_000).is_empty());
    }

    #[test]
    fn resample_48k_down_to_16k_length() {
        // 480 samples @ 48 kHz = 10 ms → 160 samples @ 16 kHz
        let out = resample(&vec![0.5_f32; 480], 48_000, 16_000);
        assert_eq!(out.len(), 160);
    }

    #[test]
    fn resample_preserves_dc_amplitude() {
        let out = resample(&vec![0.5_f32; 480], 48_000, 16_000);
        for &s in &out {
            assert!((s - 0.5).abs() < 1e-5, "amplitude drift: {s}");
        }
    }

    #[test]
    fn resample_upsamples_8k_to_16k() {
        let out = resample(&vec![0.0_f32; 80], 8_000, 16_000);
        assert_eq!(out.len(), 160);
    }
}
