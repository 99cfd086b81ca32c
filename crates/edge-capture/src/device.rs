//! `cpal`-backed microphone capture: opens the default input device,
//! resamples its native rate to the pipeline's target rate, downmixes to
//! mono, and pushes raw f32 samples into the ring buffer. The callback
//! itself does only arithmetic and a wait-free push — no locks, no
//! allocation on the steady-state path.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{error, info};

use crate::error::{CaptureError, Result};
use crate::ring::AudioProducer;

struct ResolvedDevice {
    device: cpal::Device,
    stream_config: StreamConfig,
    native_rate: u32,
    channels: u16,
}

fn resolve_device() -> Result<ResolvedDevice> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(CaptureError::NoInputDevice)?;

    let name = device.name().unwrap_or_else(|_| "unknown".to_string());
    let default_config = device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceConfig(e.to_string()))?;

    let native_rate = default_config.sample_rate().0;
    let channels = default_config.channels();
    info!(device = %name, native_rate, channels, "selected input device");

    let stream_config = StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(native_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    Ok(ResolvedDevice { device, stream_config, native_rate, channels })
}

/// Linear interpolation resampler. The pipeline's own `AudioFrame::resample`
/// uses Rubato for higher quality, but that operates on whole owned frames;
/// here we resample per-callback on short buffers where Rubato's FFT setup
/// cost dominates, so plain linear interpolation is the right tool.
pub(crate) fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return input.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).floor() as usize;
    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src_idx = i as f64 * ratio;
        let idx0 = src_idx.floor() as usize;
        let frac = (src_idx - idx0 as f64) as f32;
        let s0 = input.get(idx0).copied().unwrap_or(0.0);
        let s1 = input.get(idx0 + 1).copied().unwrap_or(s0);
        output.push(s0 + frac * (s1 - s0));
    }
    output
}

pub(crate) fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Open the default input device and start streaming into `producer`,
/// resampling to `target_rate` mono on the fly. The returned `Stream` must
/// be kept alive for capture to continue; dropping it stops the device.
pub fn start_capture(producer: AudioProducer, target_rate: u32) -> Result<Stream> {
    let resolved = resolve_device()?;
    let native_rate = resolved.native_rate;
    let channels = resolved.channels;
    let needs_resample = native_rate != target_rate;
    let needs_downmix = channels > 1;
    let mut producer = producer;

    let stream = resolved
        .device
        .build_input_stream(
            &resolved.stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let mono = if needs_downmix { to_mono(data, channels) } else { data.to_vec() };
                let resampled =
                    if needs_resample { resample_linear(&mono, native_rate, target_rate) } else { mono };

                let written = producer.push_slice(&resampled);
                if written < resampled.len() {
                    // Ring buffer full: the consumer isn't keeping up. Drop
                    // the remainder rather than block the audio thread.
                    tracing::warn!(
                        dropped = resampled.len() - written,
                        "capture ring buffer full, dropping samples"
                    );
                }
            },
            move |err| error!(%err, "input stream error"),
            None,
        )
        .map_err(|e| CaptureError::BuildStream(e.to_string()))?;

    stream.play().map_err(|e| CaptureError::StartStream(e.to_string()))?;
    info!("capture stream started");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity_when_rates_match() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&input, 16_000, 16_000), input);
    }

    #[test]
    fn test_resample_downsamples_by_half() {
        let input = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let out = resample_linear(&input, 32_000, 16_000);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_to_mono_averages_stereo_pairs() {
        let stereo = vec![1.0, -1.0, 0.5, 0.5];
        let mono = to_mono(&stereo, 2);
        assert_eq!(mono, vec![0.0, 0.5]);
    }

    #[test]
    fn test_to_mono_noop_for_single_channel() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(to_mono(&samples, 1), samples);
    }
}
