use serde::{Deserialize, Serialize};

/// One diarized speech segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: u32,
    pub text: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub confidence: f64,
}

/// Per-speaker aggregates derived from the utterance list, not returned
/// by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerStats {
    pub speaker: u32,
    pub talk_seconds: f64,
    pub word_count: usize,
    pub avg_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub utterances: Vec<Utterance>,
    /// Sorted by total talk time, descending.
    pub speakers: Vec<SpeakerStats>,
    pub duration_seconds: f64,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Aggregate speaker stats from utterances: total talk seconds, word
    /// count, and mean confidence per speaker, ordered by talk time.
    pub fn derive_speaker_stats(utterances: &[Utterance]) -> Vec<SpeakerStats> {
        struct Acc {
            speaker: u32,
            talk_seconds: f64,
            word_count: usize,
            confidence_sum: f64,
            utterance_count: usize,
        }

        let mut accs: Vec<Acc> = Vec::new();

        for u in utterances {
            let duration = (u.end_sec - u.start_sec).max(0.0);
            let words = u.text.split_whitespace().count();

            match accs.iter_mut().find(|a| a.speaker == u.speaker) {
                Some(a) => {
                    a.talk_seconds += duration;
                    a.word_count += words;
                    a.confidence_sum += u.confidence;
                    a.utterance_count += 1;
                }
                None => accs.push(Acc {
                    speaker: u.speaker,
                    talk_seconds: duration,
                    word_count: words,
                    confidence_sum: u.confidence,
                    utterance_count: 1,
                }),
            }
        }

        let mut stats: Vec<SpeakerStats> = accs
            .into_iter()
            .map(|a| SpeakerStats {
                speaker: a.speaker,
                talk_seconds: a.talk_seconds,
                word_count: a.word_count,
                avg_confidence: a.confidence_sum / a.utterance_count as f64,
            })
            .collect();

        stats.sort_by(|a, b| {
            b.talk_seconds
                .partial_cmp(&a.talk_seconds)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        stats
    }
}
