//! Sound engine: procedural 8-bit style sound effects via rodio.
//!
//! All sounds are generated as in-memory WAV buffers at init time.
//! Playback is fire-and-forget (non-blocking) via rodio's Sink.
//!
//! Compile with `--no-default-features` or without "sound" feature
//! to disable audio entirely (the stub SoundEngine does nothing).

/// Every effect the game can play.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Coin,
    Swap,
    Bump,
    Reset,
    Clear,
    AllClear,
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use log::warn;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    pub(super) const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        coin: Arc<Vec<u8>>,
        swap: Arc<Vec<u8>>,
        bump: Arc<Vec<u8>>,
        reset: Arc<Vec<u8>>,
        clear: Arc<Vec<u8>>,
        all_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                coin: Arc::new(make_wav(&gen_coin())),
                swap: Arc::new(make_wav(&gen_swap())),
                bump: Arc::new(make_wav(&gen_bump())),
                reset: Arc::new(make_wav(&gen_reset())),
                clear: Arc::new(make_wav(&gen_clear())),
                all_clear: Arc::new(make_wav(&gen_all_clear())),
            })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = match sfx {
                Sfx::Coin => &self.coin,
                Sfx::Swap => &self.swap,
                Sfx::Bump => &self.bump,
                Sfx::Reset => &self.reset,
                Sfx::Clear => &self.clear,
                Sfx::AllClear => &self.all_clear,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn samples(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Play `notes` back to back, each with a decaying envelope.
    /// `harmonic` mixes in the octave for a brighter tone.
    fn arpeggio(notes: &[f32], note_dur: f32, harmonic: f32, volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &freq in notes {
            let n = samples(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * (1.0 - harmonic)
                    + (t * freq * 2.0 * TAU).sin() * harmonic;
                out.push(wave * env * volume);
            }
        }
        out
    }

    /// Frequency sweep from `from` to `to` Hz.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t).powf(0.6) * volume
            })
            .collect()
    }

    /// Coin pickup: quick ascending pair E6→B6
    fn gen_coin() -> Vec<f32> {
        arpeggio(&[1319.0, 1976.0], 0.05, 0.3, 0.25)
    }

    /// Swap: upward whoosh
    pub(super) fn gen_swap() -> Vec<f32> {
        sweep(300.0, 900.0, 0.12, 0.25)
    }

    /// Blocked slide: low thud with a little noise
    fn gen_bump() -> Vec<f32> {
        let n = samples(0.06);
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * 110.0 * TAU).sin();
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.7 + noise * 0.3) * (1.0 - t) * 0.3
            })
            .collect()
    }

    /// Reset: short descending sweep
    fn gen_reset() -> Vec<f32> {
        sweep(700.0, 200.0, 0.15, 0.25)
    }

    /// Level clear: ascending fanfare C5→E5→G5→C6
    fn gen_clear() -> Vec<f32> {
        arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.1, 0.3, 0.3)
    }

    /// All levels: the clear fanfare followed by a held high chord
    fn gen_all_clear() -> Vec<f32> {
        let mut out = gen_clear();
        let n = samples(0.5);
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let chord = (t * 1047.0 * TAU).sin() * 0.5
                + (t * 1319.0 * TAU).sin() * 0.3
                + (t * 1568.0 * TAU).sin() * 0.2;
            out.push(chord * env * 0.3);
        }
        out
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

#[cfg(all(test, feature = "sound"))]
mod tests {
    use super::inner::{gen_swap, make_wav, SAMPLE_RATE};

    #[test]
    fn wav_header_describes_samples() {
        let samples = gen_swap();
        let wav = make_wav(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), SAMPLE_RATE);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size as usize, samples.len() * 2);
    }

    #[test]
    fn samples_stay_in_range() {
        assert!(gen_swap().iter().all(|s| s.abs() <= 1.0));
    }
}
