//! Symphonia-backed stream decoding.
//!
//! One `SymphoniaDecoder` instance backs one pipeline session: `begin`
//! probes the container and configures the sink's output rate, `step`
//! decodes one packet and pushes its frames through the sink.

use std::io::{self, Read, Seek, SeekFrom};

use radio_player::{BufferedSource, DecoderFactory, OutputSink, StreamDecoder};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Gives the buffered network source the shape symphonia expects.
///
/// Live mounts are not seekable; `seek` always fails and the byte length is
/// unknown.
struct SourceAdapter {
    inner: BufferedSource,
}

// Sync is safe because the adapter is used from a single thread: the
// playback task owns the decoder that owns it. Symphonia's `MediaSource`
// bound requires `Sync` regardless.
unsafe impl Sync for SourceAdapter {}

impl Read for SourceAdapter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for SourceAdapter {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "live stream is not seekable",
        ))
    }
}

impl MediaSource for SourceAdapter {
    fn is_seekable(&self) -> bool {
        false
    }

    fn byte_len(&self) -> Option<u64> {
        None
    }
}

struct OpenStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    samples: Option<SampleBuffer<i16>>,
}

pub struct SymphoniaDecoder {
    extension: String,
    stream: Option<OpenStream>,
}

impl SymphoniaDecoder {
    fn new(extension: String) -> Self {
        Self {
            extension,
            stream: None,
        }
    }
}

impl StreamDecoder for SymphoniaDecoder {
    fn begin(&mut self, source: BufferedSource, sink: &mut OutputSink) -> bool {
        let adapter = SourceAdapter { inner: source };
        let mss = MediaSourceStream::new(Box::new(adapter), Default::default());
        let mut hint = Hint::new();
        hint.with_extension(&self.extension);

        let probed = match symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        ) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "container probe failed");
                return false;
            }
        };
        let format = probed.format;

        let Some(track) = format.default_track() else {
            tracing::warn!("no default track in stream");
            return false;
        };
        let track_id = track.id;
        let params = track.codec_params.clone();

        let Some(rate) = params.sample_rate else {
            tracing::warn!("stream did not declare a sample rate");
            return false;
        };
        let decoder = match symphonia::default::get_codecs().make(&params, &DecoderOptions::default())
        {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "codec setup failed");
                return false;
            }
        };

        let channels = params.channels.map(|c| c.count()).unwrap_or(0);
        tracing::info!(rate_hz = rate, channels, "stream decoder ready");
        sink.configure(rate);
        self.stream = Some(OpenStream {
            format,
            decoder,
            track_id,
            samples: None,
        });
        true
    }

    fn step(&mut self, sink: &mut OutputSink) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };

        let packet = match stream.format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                tracing::debug!("stream ended");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "stream read failed");
                return false;
            }
        };
        if packet.track_id() != stream.track_id {
            return true;
        }

        match stream.decoder.decode(&packet) {
            Ok(decoded) => {
                if decoded.frames() == 0 {
                    return true;
                }
                let spec = *decoded.spec();
                let samples = stream.samples.get_or_insert_with(|| {
                    SampleBuffer::<i16>::new(decoded.capacity() as u64, spec)
                });
                samples.copy_interleaved_ref(decoded);

                let channels = spec.channels.count().max(1);
                if channels == 1 {
                    for &s in samples.samples() {
                        sink.push_frame(s, s);
                    }
                } else {
                    for frame in samples.samples().chunks_exact(channels) {
                        sink.push_frame(frame[0], frame[1]);
                    }
                }
                true
            }
            // A corrupt frame is skipped; the stream continues.
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!(error = e, "bad frame skipped");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "decode failed");
                false
            }
        }
    }
}

/// Builds one fresh decoder per session, hinted at the stream format.
pub struct SymphoniaDecoderFactory {
    extension: String,
}

impl SymphoniaDecoderFactory {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
        }
    }
}

impl DecoderFactory for SymphoniaDecoderFactory {
    fn new_decoder(&self) -> Box<dyn StreamDecoder> {
        Box::new(SymphoniaDecoder::new(self.extension.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radio_player::{BlockSink, GainState, PlaybackStatus, VisualizerState};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default, Clone)]
    struct Recorder {
        blocks: Arc<Mutex<Vec<Vec<i16>>>>,
        rates: Arc<Mutex<Vec<u32>>>,
    }

    impl BlockSink for Recorder {
        fn configure(&mut self, rate_hz: u32) {
            self.rates.lock().unwrap().push(rate_hz);
        }

        fn write_block(&mut self, samples: &[i16], _timeout: Duration) -> bool {
            self.blocks.lock().unwrap().push(samples.to_vec());
            true
        }

        fn flush_silence(&mut self) {}
    }

    fn make_sink(recorder: Recorder, block_frames: usize) -> OutputSink {
        OutputSink::new(
            Box::new(recorder),
            Arc::new(PlaybackStatus::new()),
            Arc::new(GainState::new(200)),
            Arc::new(VisualizerState::new()),
            block_frames,
            Duration::from_millis(50),
        )
    }

    fn buffered(bytes: Vec<u8>) -> BufferedSource {
        BufferedSource::new(Box::new(Cursor::new(bytes)), 4096)
    }

    /// Minimal PCM s16le WAV for driving the real probe/decode path.
    fn make_wav(rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut v = Vec::new();
        v.extend_from_slice(b"RIFF");
        v.extend_from_slice(&(36 + data_len).to_le_bytes());
        v.extend_from_slice(b"WAVE");
        v.extend_from_slice(b"fmt ");
        v.extend_from_slice(&16u32.to_le_bytes());
        v.extend_from_slice(&1u16.to_le_bytes());
        v.extend_from_slice(&channels.to_le_bytes());
        v.extend_from_slice(&rate.to_le_bytes());
        v.extend_from_slice(&(rate * u32::from(channels) * 2).to_le_bytes());
        v.extend_from_slice(&(channels * 2).to_le_bytes());
        v.extend_from_slice(&16u16.to_le_bytes());
        v.extend_from_slice(b"data");
        v.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            v.extend_from_slice(&s.to_le_bytes());
        }
        v
    }

    #[test]
    fn begin_configures_sink_with_stream_rate() {
        let recorder = Recorder::default();
        let mut sink = make_sink(recorder.clone(), 4);
        let wav = make_wav(22_050, 2, &[0i16; 512]);
        let mut dec = SymphoniaDecoder::new("wav".to_string());
        assert!(dec.begin(buffered(wav), &mut sink));
        assert_eq!(*recorder.rates.lock().unwrap(), vec![22_050]);
    }

    #[test]
    fn begin_rejects_garbage() {
        let recorder = Recorder::default();
        let mut sink = make_sink(recorder, 4);
        let mut dec = SymphoniaDecoder::new("mp3".to_string());
        assert!(!dec.begin(buffered(vec![0x55u8; 64]), &mut sink));
    }

    #[test]
    fn stereo_stream_decodes_to_the_sink() {
        let recorder = Recorder::default();
        let mut sink = make_sink(recorder.clone(), 4);
        // 256 stereo frames of a constant 1000/1000 signal.
        let samples = vec![1000i16; 512];
        let wav = make_wav(44_100, 2, &samples);
        let mut dec = SymphoniaDecoder::new("wav".to_string());
        assert!(dec.begin(buffered(wav), &mut sink));
        while dec.step(&mut sink) {}
        let blocks = recorder.blocks.lock().unwrap();
        assert!(!blocks.is_empty());
        // Unity gain, equal channels: the mono downmix is the input value.
        for block in blocks.iter() {
            assert!(block.iter().all(|&s| s == 1000));
        }
        let delivered: usize = blocks.iter().map(|b| b.len()).sum();
        assert!(delivered <= 512 && delivered >= 512 - 8);
    }

    #[test]
    fn mono_stream_is_duplicated_to_both_channels() {
        let recorder = Recorder::default();
        let mut sink = make_sink(recorder.clone(), 2);
        let wav = make_wav(44_100, 1, &[700i16; 64]);
        let mut dec = SymphoniaDecoder::new("wav".to_string());
        assert!(dec.begin(buffered(wav), &mut sink));
        while dec.step(&mut sink) {}
        let blocks = recorder.blocks.lock().unwrap();
        assert!(!blocks.is_empty());
        for block in blocks.iter() {
            assert!(block.iter().all(|&s| s == 700));
        }
    }

    #[test]
    fn step_reports_end_after_the_last_packet() {
        let recorder = Recorder::default();
        let mut sink = make_sink(recorder, 4);
        let wav = make_wav(44_100, 2, &[0i16; 64]);
        let mut dec = SymphoniaDecoder::new("wav".to_string());
        assert!(dec.begin(buffered(wav), &mut sink));
        while dec.step(&mut sink) {}
        // Once ended, it stays ended.
        assert!(!dec.step(&mut sink));
    }
}
