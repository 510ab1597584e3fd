//! TOML question-bank loading and validation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use quiz_defence_core::QuizQuestion;
use serde::Deserialize;
use thiserror::Error;

/// Number of answer options every question must offer.
const OPTION_COUNT: usize = 4;

/// Errors raised while loading or validating a question bank.
#[derive(Debug, Error)]
pub(crate) enum BankError {
    /// The bank file could not be read from disk.
    #[error("failed to read question bank at {path}")]
    Io {
        /// Path of the bank file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The bank file is not valid TOML for the expected schema.
    #[error("failed to parse question bank at {path}")]
    Parse {
        /// Path of the bank file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// A question has an empty prompt.
    #[error("question {index} has an empty prompt")]
    EmptyPrompt {
        /// Zero-based index of the offending question.
        index: usize,
    },
    /// A question does not offer exactly four options.
    #[error("question {index} must offer exactly {OPTION_COUNT} options, found {found}")]
    WrongOptionCount {
        /// Zero-based index of the offending question.
        index: usize,
        /// Number of options the question actually offers.
        found: usize,
    },
    /// A question's correct answer is not among its options.
    #[error("question {index} lists a correct answer that is not among its options")]
    CorrectNotAnOption {
        /// Zero-based index of the offending question.
        index: usize,
    },
}

#[derive(Debug, Deserialize)]
struct BankFile {
    #[serde(default)]
    questions: Vec<QuestionEntry>,
}

#[derive(Debug, Deserialize)]
struct QuestionEntry {
    prompt: String,
    options: Vec<String>,
    correct: String,
    explanation: Option<String>,
}

/// Loads and validates the question bank at `path`.
///
/// An empty bank is legal; the session then runs with open quiz gates.
pub(crate) fn load(path: &Path) -> Result<Vec<QuizQuestion>, BankError> {
    let contents = fs::read_to_string(path).map_err(|source| BankError::Io {
        path: path.to_owned(),
        source,
    })?;
    let file: BankFile = toml::from_str(&contents).map_err(|source| BankError::Parse {
        path: path.to_owned(),
        source,
    })?;

    let mut questions = Vec::with_capacity(file.questions.len());
    for (index, entry) in file.questions.into_iter().enumerate() {
        if entry.prompt.trim().is_empty() {
            return Err(BankError::EmptyPrompt { index });
        }
        if entry.options.len() != OPTION_COUNT {
            return Err(BankError::WrongOptionCount {
                index,
                found: entry.options.len(),
            });
        }
        if !entry.options.contains(&entry.correct) {
            return Err(BankError::CorrectNotAnOption { index });
        }
        questions.push(QuizQuestion::new(
            entry.prompt,
            entry.options,
            entry.correct,
            entry.explanation,
        ));
    }
    Ok(questions)
}
