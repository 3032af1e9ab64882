//! Speech and tone requests for the browser's SpeechSynthesis / WebAudio.
//!
//! `MediaService` is owned by the `EngineContext` and handed to activities
//! explicitly. Browsers refuse to start audio before a user gesture, so the
//! service starts locked: commands queue up until `unlock()` and are released
//! to the host together. `shutdown()` is the teardown half of that lifecycle.

use serde::Serialize;

/// Upper bound on commands held while locked. Oldest tones go first.
const MAX_HELD: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
}

/// One request for the host's media layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaCommand {
    /// Narrate text with speech synthesis.
    Speak { text: String, rate: f32 },
    /// Cancel any narration in progress.
    StopSpeech,
    /// Play an oscillator tone, `delay_ms` after the command is received.
    Tone {
        frequency_hz: f32,
        duration_ms: u32,
        delay_ms: u32,
        waveform: Waveform,
    },
    /// Silence everything (speech and tones).
    StopAll,
}

/// Short feedback sounds used across activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chime {
    /// Level cleared: rising C major arpeggio.
    Success,
    /// Soft single note for a correct step.
    Gentle,
    /// Low blip when walking into a wall.
    Bump,
    /// Falling pair when time runs out.
    Timeout,
}

impl Chime {
    /// (frequency, duration ms, delay ms, waveform) per note.
    fn notes(self) -> &'static [(f32, u32, u32, Waveform)] {
        match self {
            Chime::Success => &[
                (523.25, 150, 0, Waveform::Sine),
                (659.25, 150, 150, Waveform::Sine),
                (783.99, 300, 300, Waveform::Sine),
            ],
            Chime::Gentle => &[(659.25, 120, 0, Waveform::Triangle)],
            Chime::Bump => &[(196.0, 80, 0, Waveform::Square)],
            Chime::Timeout => &[
                (392.0, 200, 0, Waveform::Triangle),
                (261.63, 400, 200, Waveform::Triangle),
            ],
        }
    }
}

#[derive(Debug, Default)]
pub struct MediaService {
    unlocked: bool,
    muted: bool,
    held: Vec<MediaCommand>,
    ready: Vec<MediaCommand>,
}

impl MediaService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Called on the first user gesture. Releases everything held so far.
    pub fn unlock(&mut self) {
        if self.unlocked {
            return;
        }
        self.unlocked = true;
        self.ready.append(&mut self.held);
        log::debug!("media: unlocked, {} commands released", self.ready.len());
    }

    /// Muting silences the host at once and drops requests until unmuted.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.held.clear();
            self.ready.clear();
            self.ready.push(MediaCommand::StopAll);
        }
    }

    fn enqueue(&mut self, cmd: MediaCommand) {
        if self.muted {
            return;
        }
        if self.unlocked {
            self.ready.push(cmd);
            return;
        }
        if self.held.len() >= MAX_HELD {
            if let Some(i) = self.held.iter().position(|c| matches!(c, MediaCommand::Tone { .. })) {
                self.held.remove(i);
            } else {
                self.held.remove(0);
            }
        }
        self.held.push(cmd);
    }

    /// Narrate `text`. A new narration replaces whatever is being spoken.
    pub fn speak(&mut self, text: impl Into<String>) {
        self.enqueue(MediaCommand::StopSpeech);
        self.enqueue(MediaCommand::Speak { text: text.into(), rate: 0.9 });
    }

    pub fn chime(&mut self, chime: Chime) {
        for &(frequency_hz, duration_ms, delay_ms, waveform) in chime.notes() {
            self.enqueue(MediaCommand::Tone { frequency_hz, duration_ms, delay_ms, waveform });
        }
    }

    /// Commands ready for the host, clearing the outbox.
    pub fn drain(&mut self) -> Vec<MediaCommand> {
        std::mem::take(&mut self.ready)
    }

    /// Teardown: forget queued sound, silence the host and relock.
    pub fn shutdown(&mut self) {
        self.held.clear();
        self.ready.clear();
        self.ready.push(MediaCommand::StopAll);
        self.unlocked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_service_holds_commands_until_unlock() {
        let mut media = MediaService::new();
        media.chime(Chime::Gentle);
        assert!(media.drain().is_empty());
        media.unlock();
        let cmds = media.drain();
        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0], MediaCommand::Tone { frequency_hz, .. } if frequency_hz > 600.0));
    }

    #[test]
    fn speak_interrupts_previous_narration() {
        let mut media = MediaService::new();
        media.unlock();
        media.speak("Find the way out");
        let cmds = media.drain();
        assert_eq!(cmds[0], MediaCommand::StopSpeech);
        assert!(matches!(&cmds[1], MediaCommand::Speak { text, .. } if text == "Find the way out"));
    }

    #[test]
    fn success_chime_is_staggered() {
        let mut media = MediaService::new();
        media.unlock();
        media.chime(Chime::Success);
        let delays: Vec<u32> = media
            .drain()
            .into_iter()
            .filter_map(|c| match c {
                MediaCommand::Tone { delay_ms, .. } => Some(delay_ms),
                _ => None,
            })
            .collect();
        assert_eq!(delays, vec![0, 150, 300]);
    }

    #[test]
    fn held_queue_is_bounded() {
        let mut media = MediaService::new();
        for _ in 0..100 {
            media.chime(Chime::Bump);
        }
        media.unlock();
        assert_eq!(media.drain().len(), MAX_HELD);
    }

    #[test]
    fn shutdown_clears_and_relocks() {
        let mut media = MediaService::new();
        media.unlock();
        media.chime(Chime::Success);
        media.shutdown();
        assert_eq!(media.drain(), vec![MediaCommand::StopAll]);
        assert!(!media.is_unlocked());
        media.chime(Chime::Gentle);
        assert!(media.drain().is_empty());
    }

    #[test]
    fn mute_silences_and_drops_until_unmuted() {
        let mut media = MediaService::new();
        media.chime(Chime::Gentle);
        media.set_muted(true);
        media.unlock();
        media.speak("hello");
        assert_eq!(media.drain(), vec![MediaCommand::StopAll]);

        media.set_muted(false);
        media.chime(Chime::Bump);
        assert_eq!(media.drain().len(), 1);
    }

    #[test]
    fn commands_serialize_with_type_tag() {
        let json = serde_json::to_value(MediaCommand::Tone {
            frequency_hz: 440.0,
            duration_ms: 100,
            delay_ms: 0,
            waveform: Waveform::Sine,
        })
        .unwrap();
        assert_eq!(json["type"], "tone");
        assert_eq!(json["waveform"], "sine");
    }
}
