//! Sound engine: procedural 8-bit style cues via rodio.
//!
//! All sounds are generated as in-memory WAV buffers at init time.
//! Playback is fire-and-forget (non-blocking) via rodio's Sink.
//!
//! Compile with `--no-default-features` to disable audio entirely
//! (the stub SoundEngine does nothing).

use crate::sim::event::RoundEvent;

/// Everything the game can make a noise for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Type,
    Shoot,
    Hit,
    /// Misfire, rejected reset, incomplete initials.
    Miss,
    ResetAward,
    LifeLost,
    GameOver,
}

/// Cue for a round event, if it has one.
pub fn cue_for(event: &RoundEvent) -> Option<Cue> {
    match event {
        RoundEvent::LetterTyped => Some(Cue::Type),
        RoundEvent::Shot { .. } => Some(Cue::Shoot),
        RoundEvent::Misfired | RoundEvent::ResetRejected => Some(Cue::Miss),
        RoundEvent::ResetAwarded { .. } => Some(Cue::ResetAward),
        RoundEvent::LifeLost { remaining } if *remaining > 0 => Some(Cue::LifeLost),
        RoundEvent::RoundOver(_) => Some(Cue::GameOver),
        _ => None,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    /// Pre-generated WAV buffers for each cue.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_type: Arc<Vec<u8>>,
        sfx_shoot: Arc<Vec<u8>>,
        sfx_hit: Arc<Vec<u8>>,
        sfx_miss: Arc<Vec<u8>>,
        sfx_reset: Arc<Vec<u8>>,
        sfx_life: Arc<Vec<u8>>,
        sfx_over: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_type: Arc::new(make_wav(&gen_tone(1400.0, 0.02, 0.12))),
                sfx_shoot: Arc::new(make_wav(&gen_zap())),
                sfx_hit: Arc::new(make_wav(&gen_burst())),
                sfx_miss: Arc::new(make_wav(&gen_buzz())),
                sfx_reset: Arc::new(make_wav(&gen_chime())),
                sfx_life: Arc::new(make_wav(&gen_whistle())),
                sfx_over: Arc::new(make_wav(&gen_game_over())),
            })
        }

        pub fn play(&self, cue: Cue) {
            let buf = match cue {
                Cue::Type => &self.sfx_type,
                Cue::Shoot => &self.sfx_shoot,
                Cue::Hit => &self.sfx_hit,
                Cue::Miss => &self.sfx_miss,
                Cue::ResetAward => &self.sfx_reset,
                Cue::LifeLost => &self.sfx_life,
                Cue::GameOver => &self.sfx_over,
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

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Plain sine with a linear fade
    fn gen_tone(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32);
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Shot: fast downward laser sweep
    fn gen_zap() -> Vec<f32> {
        let n = samples_for(0.1);
        let mut phase = 0.0f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 1800.0 - t * 1400.0;
                phase += freq / SAMPLE_RATE as f32;
                // Square wave for the retro edge
                let wave = if (phase * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                wave * (1.0 - t) * 0.15
            })
            .collect()
    }

    /// Hit: short noise burst with a low thump
    fn gen_burst() -> Vec<f32> {
        let n = samples_for(0.14);
        let mut rng: u32 = 2024;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let thump = (ti * 90.0 * TAU).sin();
                (noise * 0.6 + thump * 0.4) * (1.0 - t).powf(1.5) * 0.35
            })
            .collect()
    }

    /// Miss: flat low buzz
    fn gen_buzz() -> Vec<f32> {
        let n = samples_for(0.16);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let wave = (ti * 110.0 * TAU).sin() * 0.6 + (ti * 117.0 * TAU).sin() * 0.4;
                wave * (1.0 - t * 0.5) * 0.3
            })
            .collect()
    }

    /// Reset awarded: two-note ascending chime G5 → C6
    fn gen_chime() -> Vec<f32> {
        let pairs = [(784.0_f32, 0.08), (1047.0, 0.18)];
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Life lost: descending whistle 600Hz → 200Hz
    fn gen_whistle() -> Vec<f32> {
        let n = samples_for(0.2);
        let mut phase = 0.0f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (600.0 - t * 400.0) / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t).powf(0.6) * 0.25
            })
            .collect()
    }

    /// Game over: sad descending A4 → F#4 → Eb4 → C4
    fn gen_game_over() -> Vec<f32> {
        let notes = [440.0_f32, 370.0, 311.0, 261.0];
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = samples_for(0.15);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                samples.push((t * freq * TAU).sin() * env * 0.3);
            }
        }
        let total = samples.len();
        let fade_len = total / 4;
        for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade_len as f32;
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_sizes_match_payload() {
            let wav = make_wav(&gen_zap());
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(wav.len(), 44 + data_size as usize);
        }

        #[test]
        fn generators_stay_in_range() {
            for s in [gen_burst(), gen_buzz(), gen_chime(), gen_whistle(), gen_game_over()] {
                assert!(!s.is_empty());
                assert!(s.iter().all(|v| v.abs() <= 1.0));
            }
        }
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
    pub fn play(&self, _cue: Cue) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::difficulty::Difficulty;
    use crate::domain::word::WordId;
    use crate::sim::event::RoundSummary;

    #[test]
    fn round_events_map_to_cues() {
        assert_eq!(cue_for(&RoundEvent::LetterTyped), Some(Cue::Type));
        assert_eq!(
            cue_for(&RoundEvent::Shot { id: WordId(1), x: 0.0, y: 0.0, points: 10 }),
            Some(Cue::Shoot)
        );
        assert_eq!(cue_for(&RoundEvent::ResetRejected), Some(Cue::Miss));
        assert_eq!(cue_for(&RoundEvent::WordSpawned { id: WordId(2) }), None);
    }

    #[test]
    fn final_life_plays_game_over_only() {
        assert_eq!(cue_for(&RoundEvent::LifeLost { remaining: 0 }), None);
        let summary = RoundSummary { score: 0, difficulty: Difficulty::Easy, qualifies_for_top_ten: true };
        assert_eq!(cue_for(&RoundEvent::RoundOver(summary)), Some(Cue::GameOver));
    }
}
