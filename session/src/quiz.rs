//! Question bank ownership and per-question answer history.

use quiz_defence_core::{
    QuestionBankView, QuestionHistory, QuestionId, QuestionPurpose, QuestionRequest, QuizQuestion,
    WaveNumber,
};

/// Bank of quiz questions with aligned answer history and a draw counter.
#[derive(Debug, Default)]
pub(crate) struct QuizState {
    questions: Vec<QuizQuestion>,
    history: Vec<QuestionHistory>,
    draw_counter: u64,
}

impl QuizState {
    /// Wraps an externally validated question bank.
    pub(crate) fn new(questions: Vec<QuizQuestion>) -> Self {
        let history = vec![QuestionHistory::default(); questions.len()];
        Self {
            questions,
            history,
            draw_counter: 0,
        }
    }

    /// Reports whether the bank has no questions at all.
    pub(crate) fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Read-only view handed to queries and the selection system.
    pub(crate) fn view(&self) -> QuestionBankView<'_> {
        QuestionBankView::new(&self.questions, &self.history)
    }

    /// Mints the next question request with a unique draw number.
    pub(crate) fn next_request(
        &mut self,
        purpose: QuestionPurpose,
        wave: WaveNumber,
    ) -> QuestionRequest {
        let draw = self.draw_counter;
        self.draw_counter = self.draw_counter.wrapping_add(1);
        QuestionRequest {
            purpose,
            wave,
            draw,
        }
    }

    /// Looks up a question by its bank identifier.
    pub(crate) fn question(&self, id: QuestionId) -> Option<&QuizQuestion> {
        self.questions.get(id.get() as usize)
    }

    /// Records that a question from the bank was shown to the player.
    pub(crate) fn record_presented(&mut self, id: QuestionId) {
        if let Some(entry) = self.history.get_mut(id.get() as usize) {
            entry.asked = entry.asked.saturating_add(1);
        }
    }

    /// Records an incorrect answer, feeding the spaced-repetition weighting.
    pub(crate) fn record_missed(&mut self, id: QuestionId) {
        if let Some(entry) = self.history.get_mut(id.get() as usize) {
            entry.missed = entry.missed.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> Vec<QuizQuestion> {
        vec![
            QuizQuestion::new(
                "What is 2 + 2?".to_owned(),
                vec![
                    "3".to_owned(),
                    "4".to_owned(),
                    "5".to_owned(),
                    "6".to_owned(),
                ],
                "4".to_owned(),
                None,
            ),
            QuizQuestion::new(
                "Largest planet?".to_owned(),
                vec![
                    "Mars".to_owned(),
                    "Venus".to_owned(),
                    "Jupiter".to_owned(),
                    "Saturn".to_owned(),
                ],
                "Jupiter".to_owned(),
                Some("Jupiter outweighs the rest combined.".to_owned()),
            ),
        ]
    }

    #[test]
    fn draw_numbers_are_unique_and_monotonic() {
        let mut quiz = QuizState::new(bank());
        let first = quiz.next_request(QuestionPurpose::Gate, WaveNumber::new(1));
        let second = quiz.next_request(QuestionPurpose::Boss, WaveNumber::new(1));
        assert_eq!(first.draw, 0);
        assert_eq!(second.draw, 1);
    }

    #[test]
    fn history_tracks_presentations_and_misses_per_question() {
        let mut quiz = QuizState::new(bank());
        quiz.record_presented(QuestionId::new(1));
        quiz.record_presented(QuestionId::new(1));
        quiz.record_missed(QuestionId::new(1));

        let view = quiz.view();
        assert_eq!(view.history()[0].asked, 0);
        assert_eq!(view.history()[1].asked, 2);
        assert_eq!(view.history()[1].missed, 1);
    }
}
