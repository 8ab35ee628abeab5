use crate::{answer::Selection, catalog::quiz::Question};

/// Judges `selection` against the question's ground truth.
///
/// Choice questions need exactly the set of correct answers, in any order.
/// Ordering questions need every answer, with the one at index `i` ranked `i + 1`.
pub fn evaluate(question: &Question, selection: &Selection) -> bool {
    let chosen = selection.ids();

    if question.is_ordering() {
        return chosen.len() == question.answers().len()
            && chosen.iter().enumerate().all(|(i, id)| {
                question
                    .answer(id)
                    .and_then(|answer| answer.position())
                    .is_some_and(|position| position as usize == i + 1)
            });
    }

    let correct: Vec<_> = question
        .answers()
        .iter()
        .filter(|answer| answer.is_correct())
        .map(|answer| answer.id())
        .collect();

    correct.len() == chosen.len() && correct.iter().all(|id| chosen.contains(*id))
}
