//! Daily Burundi quiz.
//!
//! Every calendar date maps to a numeric seed; a small linear-congruential
//! generator drives a Fisher–Yates shuffle of the fixed question bank, and
//! the first [`DAILY_QUESTION_COUNT`] questions are the day's quiz. The same
//! date always yields the same questions.

use serde::{Deserialize, Serialize};
use time::Date;

pub const DAILY_QUESTION_COUNT: usize = 3;

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49_297;
const LCG_MODULUS: u64 = 233_280;

#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub id: u32,
    pub prompt: &'static str,
    pub options: [&'static str; 4],
    pub answer: usize,
}

pub const QUESTION_BANK: &[Question] = &[
    Question {
        id: 1,
        prompt: "What is the capital of Burundi?",
        options: ["Bujumbura", "Gitega", "Ngozi", "Muyinga"],
        answer: 1,
    },
    Question {
        id: 2,
        prompt: "Which lake forms much of Burundi's western border?",
        options: ["Lake Victoria", "Lake Kivu", "Lake Tanganyika", "Lake Malawi"],
        answer: 2,
    },
    Question {
        id: 3,
        prompt: "What is the currency of Burundi?",
        options: ["Rwandan Franc", "Burundian Franc", "Shilling", "Cedi"],
        answer: 1,
    },
    Question {
        id: 4,
        prompt: "Which national park protects a montane rainforest with chimpanzees?",
        options: ["Kibira", "Ruvubu", "Rusizi", "Akagera"],
        answer: 0,
    },
    Question {
        id: 5,
        prompt: "The royal drummers of Burundi perform on drums called what?",
        options: ["Djembe", "Ingoma", "Talking drums", "Bongos"],
        answer: 1,
    },
    Question {
        id: 6,
        prompt: "Which site is often cited as the southernmost source of the Nile?",
        options: ["Karera Falls", "Source du Nil at Rutovu", "Saga Beach", "Gishora"],
        answer: 1,
    },
    Question {
        id: 7,
        prompt: "Besides Kirundi, which language is official in Burundi?",
        options: ["Portuguese", "Arabic", "French", "German"],
        answer: 2,
    },
    Question {
        id: 8,
        prompt: "Which crop is Burundi's main export?",
        options: ["Cocoa", "Coffee", "Cotton", "Rubber"],
        answer: 1,
    },
    Question {
        id: 9,
        prompt: "Rusizi National Park is known for which animals?",
        options: ["Hippos and crocodiles", "Lions", "Gorillas", "Giraffes"],
        answer: 0,
    },
    Question {
        id: 10,
        prompt: "In which year did Burundi gain independence?",
        options: ["1957", "1962", "1975", "1990"],
        answer: 1,
    },
    Question {
        id: 11,
        prompt: "Karera Falls are located near which town?",
        options: ["Rutana", "Cibitoke", "Kayanza", "Makamba"],
        answer: 0,
    },
    Question {
        id: 12,
        prompt: "Which countries border Burundi?",
        options: [
            "Kenya, Uganda, Rwanda",
            "Rwanda, Tanzania, DR Congo",
            "Zambia, Malawi, Tanzania",
            "Uganda, DR Congo, Zambia",
        ],
        answer: 1,
    },
    Question {
        id: 13,
        prompt: "Gishora is famous for its sanctuary of what?",
        options: ["Sacred drums", "Royal cattle", "Tea gardens", "Crocodiles"],
        answer: 0,
    },
    Question {
        id: 14,
        prompt: "What is the national language spoken by nearly all Burundians?",
        options: ["Swahili", "Kirundi", "Lingala", "Luganda"],
        answer: 1,
    },
    Question {
        id: 15,
        prompt: "Which fish is a staple from Lake Tanganyika?",
        options: ["Salmon", "Mukeke", "Cod", "Tilapia zillii"],
        answer: 1,
    },
];

/// A question as served to players, without the answer.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: u32,
    pub prompt: &'static str,
    pub options: [&'static str; 4],
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self { id: q.id, prompt: q.prompt, options: q.options }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub id: u32,
    pub correct: bool,
    pub correct_answer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub date: String,
    pub score: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

#[derive(Debug, Deserialize)]
pub struct QuizAnswers {
    pub date: Option<Date>,
    pub answers: Vec<usize>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("expected {expected} answers, got {got}")]
    WrongAnswerCount { expected: usize, got: usize },
}

/// `year*10000 + month*100 + day`, e.g. 2026-10-19 → 20261019.
#[must_use]
pub fn seed_for(date: Date) -> u64 {
    let year = u64::try_from(date.year()).unwrap_or(0);
    year * 10_000 + u64::from(u8::from(date.month())) * 100 + u64::from(date.day())
}

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = (self.0 * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.0
    }

    /// Uniform-ish index in `0..bound`.
    fn below(&mut self, bound: usize) -> usize {
        let bound = bound as u64;
        usize::try_from(self.next() * bound / LCG_MODULUS).unwrap_or(0)
    }
}

/// Deterministically shuffle `items` with a seeded Fisher–Yates pass.
pub fn seeded_shuffle<T>(items: &mut [T], seed: u64) {
    let mut rng = Lcg(seed % LCG_MODULUS);
    for i in (1..items.len()).rev() {
        let j = rng.below(i + 1);
        items.swap(i, j);
    }
}

/// The day's questions, in quiz order.
#[must_use]
pub fn daily_questions(date: Date) -> Vec<&'static Question> {
    let mut picks: Vec<&'static Question> = QUESTION_BANK.iter().collect();
    seeded_shuffle(&mut picks, seed_for(date));
    picks.truncate(DAILY_QUESTION_COUNT);
    picks
}

/// Score a player's answers against the day's questions.
pub fn score(date: Date, answers: &[usize]) -> Result<QuizScore, QuizError> {
    let questions = daily_questions(date);
    if answers.len() != questions.len() {
        return Err(QuizError::WrongAnswerCount { expected: questions.len(), got: answers.len() });
    }

    let results: Vec<QuestionResult> = questions
        .iter()
        .zip(answers)
        .map(|(q, &given)| QuestionResult { id: q.id, correct: given == q.answer, correct_answer: q.answer })
        .collect();

    Ok(QuizScore {
        date: date.to_string(),
        score: results.iter().filter(|r| r.correct).count(),
        total: results.len(),
        results,
    })
}

#[cfg(test)]
#[path = "quiz_test.rs"]
mod tests;
