//! CPAL-based sound backend for desktop platforms (Linux, macOS, Windows)
//!
//! Each channel decodes `<assets_dir>/<channel>.wav` once with hound and owns
//! one output stream for the rest of the process. The stream is started when
//! the channel is created and renders silence while the channel is paused;
//! play state, volume and the loop cursor live in atomics the audio callback
//! reads, so engine calls never touch the stream itself.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use ::cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use futures::future;

use super::SoundBackend;
use crate::error::SoundError;
use crate::sound::channel::{ChannelName, ChannelResource, PlaybackFuture};

/// Decoded loop, downmixed to mono.
pub(crate) struct LoopBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// State shared between the engine-facing handle and the audio callback.
struct Playhead {
    playing: AtomicBool,
    volume_bits: AtomicU32,
    /// Fractional source frame, stored as f64 bits
    cursor_bits: AtomicU64,
    /// Set by the stream error callback
    failed: AtomicBool,
}

impl Playhead {
    fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
            cursor_bits: AtomicU64::new(0.0f64.to_bits()),
            failed: AtomicBool::new(false),
        }
    }
}

/// Looping channel rendered through the default output device.
pub struct CpalChannel {
    name: ChannelName,
    head: Arc<Playhead>,
    source_rate: u32,
    // Dropping the sender ends the output thread and closes the stream
    _shutdown: Mutex<mpsc::Sender<()>>,
}

impl ChannelResource for CpalChannel {
    fn start(&self) -> PlaybackFuture {
        if self.head.failed.load(Ordering::SeqCst) {
            self.head.playing.store(false, Ordering::SeqCst);
            return Box::pin(future::ready(Err(SoundError::PlaybackFailed {
                channel: self.name.to_string(),
                reason: "output stream reported an error".to_string(),
            })));
        }

        self.head.playing.store(true, Ordering::SeqCst);
        Box::pin(future::ready(Ok(())))
    }

    fn pause(&self) {
        self.head.playing.store(false, Ordering::SeqCst);
    }

    fn rewind(&self) {
        self.head
            .cursor_bits
            .store(0.0f64.to_bits(), Ordering::SeqCst);
    }

    fn set_volume(&self, volume: f32) {
        self.head
            .volume_bits
            .store(volume.to_bits(), Ordering::SeqCst);
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.head.volume_bits.load(Ordering::SeqCst))
    }

    fn is_playing(&self) -> bool {
        self.head.playing.load(Ordering::SeqCst)
    }

    fn position(&self) -> Duration {
        let frames = f64::from_bits(self.head.cursor_bits.load(Ordering::SeqCst));
        Duration::from_secs_f64(frames / self.source_rate.max(1) as f64)
    }
}

/// Backend loading `<channel>.wav` loops from an assets directory.
pub struct CpalBackend {
    assets_dir: PathBuf,
}

impl CpalBackend {
    pub fn new<P: AsRef<Path>>(assets_dir: P) -> Self {
        Self {
            assets_dir: assets_dir.as_ref().to_path_buf(),
        }
    }

    pub fn asset_path(&self, channel: ChannelName) -> PathBuf {
        self.assets_dir.join(format!("{}.wav", channel))
    }
}

impl SoundBackend for CpalBackend {
    fn create(&self, channel: ChannelName) -> Result<Arc<dyn ChannelResource>, SoundError> {
        let path = self.asset_path(channel);
        let buffer = Arc::new(load_wav(channel, &path)?);
        let source_rate = buffer.sample_rate;
        let head = Arc::new(Playhead::new());
        let shutdown = spawn_output(channel, buffer, Arc::clone(&head))?;

        log::info!("[CpalBackend] Channel '{}' ready from {:?}", channel, path);

        Ok(Arc::new(CpalChannel {
            name: channel,
            head,
            source_rate,
            _shutdown: Mutex::new(shutdown),
        }))
    }
}

/// Decode a WAV file into a mono loop.
pub(crate) fn load_wav(channel: ChannelName, path: &Path) -> Result<LoopBuffer, SoundError> {
    let load_error = |reason: String| SoundError::ResourceLoad {
        channel: channel.to_string(),
        reason,
    };

    let reader = hound::WavReader::open(path)
        .map_err(|e| load_error(format!("{:?}: {}", path, e)))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| load_error(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| load_error(e.to_string()))?
        }
    };

    let samples: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    if samples.is_empty() {
        return Err(load_error(format!("{:?} contains no audio", path)));
    }

    Ok(LoopBuffer {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Open the output stream on a dedicated thread (streams are not `Send` on
/// every platform) and keep it alive until the returned sender is dropped.
fn spawn_output(
    channel: ChannelName,
    buffer: Arc<LoopBuffer>,
    head: Arc<Playhead>,
) -> Result<mpsc::Sender<()>, SoundError> {
    let (ready_tx, ready_rx) = mpsc::channel::<Result<(), SoundError>>();
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    std::thread::Builder::new()
        .name(format!("sound-{}", channel))
        .spawn(move || {
            let stream = match build_output_stream(channel, buffer, head) {
                Ok(stream) => stream,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(SoundError::StreamOpenFailed {
                    reason: format!("Output start failed: {}", e),
                }));
                return;
            }

            let _ = ready_tx.send(Ok(()));
            let _ = shutdown_rx.recv();
            log::debug!("[CpalBackend] Closing output stream for '{}'", channel);
        })
        .map_err(|e| SoundError::StreamOpenFailed {
            reason: format!("Failed to spawn output thread: {}", e),
        })?;

    ready_rx
        .recv()
        .map_err(|_| SoundError::StreamOpenFailed {
            reason: "Output thread exited before reporting".to_string(),
        })??;

    Ok(shutdown_tx)
}

fn build_output_stream(
    channel: ChannelName,
    buffer: Arc<LoopBuffer>,
    head: Arc<Playhead>,
) -> Result<::cpal::Stream, SoundError> {
    let host = ::cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| SoundError::StreamOpenFailed {
            reason: "No default output device found".to_string(),
        })?;

    let config = device
        .default_output_config()
        .map_err(|e| SoundError::StreamOpenFailed {
            reason: format!("Failed to get default output config: {:?}", e),
        })?;

    let stream_config: ::cpal::StreamConfig = config.clone().into();
    let channels_count = stream_config.channels.max(1) as usize;
    let step = buffer.sample_rate as f64 / stream_config.sample_rate.0.max(1) as f64;

    let error_head = Arc::clone(&head);
    let err_fn = move |err: ::cpal::StreamError| {
        log::error!("[CpalBackend] Output stream error on '{}': {}", channel, err);
        error_head.failed.store(true, Ordering::SeqCst);
    };

    let stream = match config.sample_format() {
        ::cpal::SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &::cpal::OutputCallbackInfo| {
                render(data, channels_count, &buffer, &head, step);
            },
            err_fn,
            None,
        ),
        _ => {
            return Err(SoundError::StreamOpenFailed {
                reason: "Only F32 sample format is currently supported for output".to_string(),
            })
        }
    };

    stream.map_err(|e| SoundError::StreamOpenFailed {
        reason: format!("Failed to build output stream: {:?}", e),
    })
}

/// Fill one output buffer from the loop.
fn render(data: &mut [f32], channels: usize, buffer: &LoopBuffer, head: &Playhead, step: f64) {
    if !head.playing.load(Ordering::Relaxed) {
        data.fill(0.0);
        return;
    }

    let volume = f32::from_bits(head.volume_bits.load(Ordering::Relaxed));
    let len = buffer.samples.len();
    let loaded_bits = head.cursor_bits.load(Ordering::Relaxed);
    let mut cursor = f64::from_bits(loaded_bits);

    for frame in data.chunks_mut(channels) {
        let sample = buffer.samples[(cursor as usize) % len] * volume;
        frame.fill(sample);
        cursor += step;
        if cursor >= len as f64 {
            cursor -= len as f64;
        }
    }

    // A rewind that landed mid-buffer wins over this buffer's progress
    let _ = head.cursor_bits.compare_exchange(
        loaded_bits,
        cursor.to_bits(),
        Ordering::Relaxed,
        Ordering::Relaxed,
    );
}
