use std::f32::consts::TAU;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
/// Linear fade at both ends, keeps rapid retriggers from clicking.
const FADE_SECS: f32 = 0.01;

/// A short sine tone with a fade-in/fade-out envelope.
#[derive(Debug, Clone)]
pub struct Tone {
    sample_rate: u32,
    frequency: f32,
    amplitude: f32,
    total_samples: u64,
    position: u64,
}

impl Tone {
    pub fn new(frequency: f32, duration: Duration) -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            frequency,
            amplitude: 0.4,
            total_samples: duration.as_millis() as u64 * u64::from(SAMPLE_RATE) / 1000,
            position: 0,
        }
    }

    /// The two-note rising chirp that marks the start of work.
    pub fn start_cue() -> [Tone; 2] {
        [
            Tone::new(660.0, Duration::from_millis(180)),
            Tone::new(990.0, Duration::from_millis(320)),
        ]
    }

    /// The short tick used in the final seconds of work.
    pub fn beep_cue() -> Tone {
        Tone::new(880.0, Duration::from_millis(120))
    }

    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.total_samples * 1_000_000_000 / u64::from(self.sample_rate))
    }

    fn envelope(&self) -> f32 {
        let fade = (FADE_SECS * self.sample_rate as f32).max(1.0);
        let from_start = self.position as f32;
        let to_end = (self.total_samples - self.position) as f32;
        (from_start / fade).min(to_end / fade).min(1.0)
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.total_samples {
            return None;
        }

        let t = self.position as f32 / self.sample_rate as f32;
        let sample = (TAU * self.frequency * t).sin() * self.amplitude * self.envelope();
        self.position += 1;
        Some(sample)
    }
}

#[cfg(feature = "audio")]
impl rodio::Source for Tone {
    fn current_frame_len(&self) -> Option<usize> {
        Some((self.total_samples - self.position) as usize)
    }

    fn channels(&self) -> u16 {
        1 // Mono
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.duration())
    }
}
