#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic question selection driven by draw requests from the session.
//!
//! Gate draws are uniform over the bank. Boss and challenge draws are
//! spaced-repetition draws: questions the player has missed carry extra
//! weight, so weak spots resurface when the stakes are highest.

use quiz_defence_core::{
    Command, Event, QuestionBankView, QuestionId, QuestionPurpose, QuestionRequest,
    RNG_STREAM_GATE, RNG_STREAM_REVIEW,
};
use sha2::{Digest, Sha256};

/// Extra weight a missed answer adds to a spaced-repetition draw.
const MISS_WEIGHT: u64 = 4;

/// Miss count beyond which the weight stops growing.
const MISS_WEIGHT_CAP: u32 = 3;

/// Pure system that answers question draw requests deterministically.
#[derive(Debug)]
pub struct QuestionSelection {
    base_seed: u64,
}

impl QuestionSelection {
    /// Creates a new selection system from the session-wide seed.
    #[must_use]
    pub const fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// Resolves every question request in `events` against the bank.
    ///
    /// An empty bank produces no commands; the session treats its gates as
    /// open in that case.
    pub fn handle(&self, events: &[Event], bank: QuestionBankView<'_>, out: &mut Vec<Command>) {
        if bank.is_empty() {
            return;
        }

        for event in events {
            if let Event::QuestionRequested { request } = event {
                let question = self.select(*request, bank);
                out.push(Command::PresentQuestion {
                    request: *request,
                    question,
                });
            }
        }
    }

    fn select(&self, request: QuestionRequest, bank: QuestionBankView<'_>) -> QuestionId {
        let mut rng = SplitMix64::new(derive_draw_seed(self.base_seed, request));
        let index = match request.purpose {
            QuestionPurpose::Gate => (rng.next_u64() % bank.len() as u64) as usize,
            QuestionPurpose::Boss | QuestionPurpose::Challenge { .. } => {
                weighted_index(&mut rng, bank)
            }
        };
        QuestionId::new(index as u32)
    }
}

fn weighted_index(rng: &mut SplitMix64, bank: QuestionBankView<'_>) -> usize {
    let total: u64 = bank.history().iter().map(|entry| miss_weight(entry.missed)).sum();
    debug_assert!(total > 0, "weights are at least one per question");
    let mut roll = rng.next_u64() % total;
    for (index, entry) in bank.history().iter().enumerate() {
        let weight = miss_weight(entry.missed);
        if roll < weight {
            return index;
        }
        roll -= weight;
    }
    bank.len() - 1
}

fn miss_weight(missed: u32) -> u64 {
    1 + MISS_WEIGHT * u64::from(missed.min(MISS_WEIGHT_CAP))
}

fn derive_draw_seed(base: u64, request: QuestionRequest) -> u64 {
    let label = match request.purpose {
        QuestionPurpose::Gate => RNG_STREAM_GATE,
        QuestionPurpose::Boss | QuestionPurpose::Challenge { .. } => RNG_STREAM_REVIEW,
    };
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    hasher.update(request.wave.get().to_le_bytes());
    hasher.update(request.draw.to_le_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

#[derive(Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_defence_core::{QuestionHistory, QuizQuestion, WaveNumber};

    fn bank(count: usize) -> Vec<QuizQuestion> {
        (0..count)
            .map(|index| {
                QuizQuestion::new(
                    format!("question {index}"),
                    vec![
                        "a".to_owned(),
                        "b".to_owned(),
                        "c".to_owned(),
                        "d".to_owned(),
                    ],
                    "a".to_owned(),
                    None,
                )
            })
            .collect()
    }

    fn request(purpose: QuestionPurpose, draw: u64) -> QuestionRequest {
        QuestionRequest {
            purpose,
            wave: WaveNumber::new(3),
            draw,
        }
    }

    fn presented(commands: &[Command]) -> Vec<u32> {
        commands
            .iter()
            .map(|command| match command {
                Command::PresentQuestion { question, .. } => question.get(),
                other => panic!("unexpected command {other:?}"),
            })
            .collect()
    }

    #[test]
    fn identical_requests_resolve_to_the_same_question() {
        let questions = bank(8);
        let history = vec![QuestionHistory::default(); 8];
        let view = QuestionBankView::new(&questions, &history);
        let system = QuestionSelection::new(42);

        let events = vec![Event::QuestionRequested {
            request: request(QuestionPurpose::Gate, 5),
        }];
        let mut first = Vec::new();
        let mut second = Vec::new();
        system.handle(&events, view, &mut first);
        system.handle(&events, view, &mut second);

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn distinct_draw_counters_vary_the_selection() {
        let questions = bank(16);
        let history = vec![QuestionHistory::default(); 16];
        let view = QuestionBankView::new(&questions, &history);
        let system = QuestionSelection::new(42);

        let events: Vec<Event> = (0..32)
            .map(|draw| Event::QuestionRequested {
                request: request(QuestionPurpose::Gate, draw),
            })
            .collect();
        let mut out = Vec::new();
        system.handle(&events, view, &mut out);

        let picks = presented(&out);
        assert_eq!(picks.len(), 32);
        let distinct: std::collections::BTreeSet<u32> = picks.iter().copied().collect();
        assert!(distinct.len() > 1, "uniform draws should spread out");
    }

    #[test]
    fn missed_questions_dominate_review_draws() {
        let questions = bank(4);
        let mut history = vec![QuestionHistory::default(); 4];
        history[2] = QuestionHistory {
            asked: 10,
            missed: 10,
        };
        let view = QuestionBankView::new(&questions, &history);
        let system = QuestionSelection::new(7);

        let events: Vec<Event> = (0..200)
            .map(|draw| Event::QuestionRequested {
                request: request(QuestionPurpose::Boss, draw),
            })
            .collect();
        let mut out = Vec::new();
        system.handle(&events, view, &mut out);

        let picks = presented(&out);
        let missed_share = picks.iter().filter(|&&index| index == 2).count();
        // The missed question carries 13 of 16 weight units.
        assert!(
            missed_share > picks.len() / 2,
            "missed question drew {missed_share} of {}",
            picks.len()
        );
    }

    #[test]
    fn the_miss_weight_saturates() {
        assert_eq!(miss_weight(0), 1);
        assert_eq!(miss_weight(1), 5);
        assert_eq!(miss_weight(3), 13);
        assert_eq!(miss_weight(100), 13);
    }

    #[test]
    fn an_empty_bank_stays_silent() {
        let questions = bank(0);
        let history = Vec::new();
        let view = QuestionBankView::new(&questions, &history);
        let system = QuestionSelection::new(42);

        let events = vec![Event::QuestionRequested {
            request: request(QuestionPurpose::Gate, 0),
        }];
        let mut out = Vec::new();
        system.handle(&events, view, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let questions = bank(2);
        let history = vec![QuestionHistory::default(); 2];
        let view = QuestionBankView::new(&questions, &history);
        let system = QuestionSelection::new(42);

        let events = vec![Event::WaveCompleted {
            wave: WaveNumber::new(1),
        }];
        let mut out = Vec::new();
        system.handle(&events, view, &mut out);

        assert!(out.is_empty());
    }
}
