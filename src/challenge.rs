//! KeepSafe challenge resolution.
//!
//! After the login POST the portal renders one of the user's pre-registered
//! questions and a row of per-character slots for its answer. A randomized
//! pair of slots is marked required and only those two letters are
//! submitted. Which pair varies per session, so positions are recomputed on
//! every login and never cached; on any ambiguity the resolver fails rather
//! than guessing, since submitting wrong letters is worse than failing fast.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Caller-supplied mapping from question text to registered answer.
///
/// Lookups are exact-string; there is no fuzzy matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeTable(HashMap<String, String>);

impl ChallengeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.0.insert(question.into(), answer.into());
    }

    pub fn answer_for(&self, question: &str) -> Result<&str> {
        self.0
            .get(question)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownChallengeQuestion {
                question: question.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<Q: Into<String>, A: Into<String>> FromIterator<(Q, A)> for ChallengeTable {
    fn from_iter<T: IntoIterator<Item = (Q, A)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(q, a)| (q.into(), a.into()))
                .collect(),
        )
    }
}

/// A solved challenge: the two demanded letters in page order, plus the
/// full required-slot pattern for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeSolution {
    pub question: String,
    /// 0-based character positions of the two required slots, in page order.
    pub positions: (usize, usize),
    /// The letters at those positions. Single characters, held as strings
    /// because they go straight into form values and may be non-ASCII.
    pub letters: (String, String),
    /// Required flag per slot, aligned with answer character positions.
    pub pattern: Vec<bool>,
}

impl ChallengeSolution {
    /// Pattern rendered for logging: `O` for a required slot, `X` for inert.
    pub fn pattern_string(&self) -> String {
        self.pattern
            .iter()
            .map(|&required| if required { 'O' } else { 'X' })
            .collect()
    }
}

/// Resolve the challenge page against the caller's table.
///
/// Pure: no network, no mutation. Fails rather than guesses on an unknown
/// question, a required-slot count other than two, or a slot index past the
/// end of the stored answer.
pub fn resolve(html: &str, table: &ChallengeTable) -> Result<ChallengeSolution> {
    let document = Html::parse_document(html);

    let question = question_text(&document)?;
    let answer = table.answer_for(&question)?;

    let pattern = required_pattern(&document)?;
    let required: Vec<usize> = pattern
        .iter()
        .enumerate()
        .filter(|(_, &is_required)| is_required)
        .map(|(index, _)| index)
        .collect();

    if required.len() != 2 {
        return Err(Error::ChallengeFormat {
            reason: format!(
                "expected exactly 2 required letter slots, found {}",
                required.len()
            ),
        });
    }

    let chars: Vec<char> = answer.chars().collect();
    let first = letter_at(&chars, required[0])?;
    let second = letter_at(&chars, required[1])?;

    Ok(ChallengeSolution {
        question,
        positions: (required[0], required[1]),
        letters: (first, second),
        pattern,
    })
}

/// The question text sits in the second `<div>` under the `question`
/// element; the first is the row label.
fn question_text(document: &Html) -> Result<String> {
    let divs = select_all(document, "#question div");
    let node = divs.get(1).ok_or(Error::MalformedPage { field: "question" })?;
    let text = node.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        return Err(Error::MalformedPage { field: "question" });
    }
    Ok(text)
}

/// Answer slots are the `<div>`s under the `answer` element after the
/// leading label, one per character of the stored answer, in page order. A
/// slot demands its letter iff its class list carries a `required` marker.
fn required_pattern(document: &Html) -> Result<Vec<bool>> {
    let divs = select_all(document, "#answer div");
    if divs.len() < 2 {
        return Err(Error::MalformedPage { field: "answer" });
    }
    Ok(divs[1..]
        .iter()
        .map(|slot| {
            slot.value()
                .classes()
                .any(|class| class.contains("required"))
        })
        .collect())
}

fn letter_at(chars: &[char], index: usize) -> Result<String> {
    chars
        .get(index)
        .map(char::to_string)
        .ok_or_else(|| Error::ChallengeFormat {
            reason: format!(
                "required slot {index} is beyond the {}-character answer",
                chars.len()
            ),
        })
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Render a challenge page: one slot div per entry, `true` marks the
    /// slot required.
    fn challenge_page(question: &str, slots: &[bool]) -> String {
        let slot_divs: String = slots
            .iter()
            .map(|&required| {
                if required {
                    r#"<div class="letter required"><input type="text" maxlength="1" /></div>"#
                } else {
                    r#"<div class="letter"></div>"#
                }
            })
            .collect();

        format!(
            r#"<html><body>
            <div id="question"><div>Security question</div><div>{question}</div></div>
            <div id="answer"><div>Your answer</div>{slot_divs}</div>
            <input type="hidden" id="__VSTATE" name="__VSTATE" value="challenge-vstate" />
            <input type="hidden" id="__EVENTVALIDATION" name="__EVENTVALIDATION" value="challenge-ev" />
            </body></html>"#
        )
    }

    fn table() -> ChallengeTable {
        ChallengeTable::from_iter([
            ("The name of my first pet?", "pinette"),
            ("My mother's maiden name?", "duchesse d'orléans"),
        ])
    }

    #[test]
    fn resolves_two_required_letters_in_page_order() {
        // p-i-n-e-t-t-e with slots 1 and 4 demanded.
        let html = challenge_page(
            "The name of my first pet?",
            &[false, true, false, false, true, false, false],
        );
        let solution = resolve(&html, &table()).unwrap();
        assert_eq!(solution.question, "The name of my first pet?");
        assert_eq!(solution.positions, (1, 4));
        assert_eq!(solution.letters, ("i".to_string(), "t".to_string()));
        assert_eq!(solution.pattern_string(), "XOXXOXX");
    }

    #[test]
    fn indexes_non_ascii_answers_by_code_point() {
        // "duchesse d'orléans": position 14 is 'é'.
        let mut slots = vec![false; 18];
        slots[0] = true;
        slots[14] = true;
        let html = challenge_page("My mother's maiden name?", &slots);
        let solution = resolve(&html, &table()).unwrap();
        assert_eq!(solution.letters, ("d".to_string(), "é".to_string()));
    }

    #[test]
    fn one_required_slot_is_a_format_error() {
        let html = challenge_page(
            "The name of my first pet?",
            &[true, false, false, false, false, false, false],
        );
        let err = resolve(&html, &table()).unwrap_err();
        assert!(matches!(err, Error::ChallengeFormat { .. }));
    }

    #[test]
    fn three_required_slots_are_a_format_error() {
        let html = challenge_page(
            "The name of my first pet?",
            &[true, true, true, false, false, false, false],
        );
        let err = resolve(&html, &table()).unwrap_err();
        assert!(matches!(err, Error::ChallengeFormat { .. }));
    }

    #[test]
    fn unknown_question_fails_before_anything_else() {
        let html = challenge_page("A question never registered?", &[false, true, true]);
        let err = resolve(&html, &table()).unwrap_err();
        match err {
            Error::UnknownChallengeQuestion { question } => {
                assert_eq!(question, "A question never registered?");
            }
            other => panic!("expected UnknownChallengeQuestion, got {other:?}"),
        }
    }

    #[test]
    fn slot_beyond_answer_length_is_a_format_error() {
        // 9 slots against the 7-character "pinette", demanding slot 8.
        let mut slots = vec![false; 9];
        slots[0] = true;
        slots[8] = true;
        let html = challenge_page("The name of my first pet?", &slots);
        let err = resolve(&html, &table()).unwrap_err();
        assert!(matches!(err, Error::ChallengeFormat { .. }));
    }

    #[test]
    fn page_without_question_element_is_malformed() {
        let err = resolve("<html><body><div id=\"answer\"><div>label</div></div></body></html>", &table())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPage { field: "question" }));
    }

    #[test]
    fn page_without_answer_slots_is_malformed() {
        let html = r#"<html><body>
            <div id="question"><div>Security question</div><div>The name of my first pet?</div></div>
            <div id="answer"><div>Your answer</div></div>
        </body></html>"#;
        let err = resolve(html, &table()).unwrap_err();
        assert!(matches!(err, Error::MalformedPage { field: "answer" }));
    }
}
