use std::collections::HashSet;
use std::sync::Arc;

use quiz_core::Catalog;
use quiz_core::model::{Difficulty, QuestionId, QuestionRecord, SessionId, SessionStateError, Topic};
use quiz_core::time::fixed_now;
use quiz_services::{
    Clock, NextQuestion, QuestionPrompt, QuizError, QuizService, QuizSettings, ScoreError,
    SessionError, ValidationError,
};
use quiz_storage::Storage;

fn record(id: u64, topic: Topic, difficulty: Difficulty) -> QuestionRecord {
    QuestionRecord::new(
        QuestionId::new(id),
        topic,
        difficulty,
        format!("Question {id}?"),
        [
            format!("A{id}"),
            format!("B{id}"),
            format!("C{id}"),
            format!("D{id}"),
        ],
        format!("C{id}"),
    )
    .unwrap()
}

fn right(prompt: &QuestionPrompt) -> String {
    format!("C{}", prompt.id)
}

fn wrong(prompt: &QuestionPrompt) -> String {
    format!("A{}", prompt.id)
}

fn service() -> QuizService {
    let mut records: Vec<QuestionRecord> = (1..=5)
        .map(|id| record(id, Topic::Physics, Difficulty::Easy))
        .collect();
    records.push(record(100, Topic::Math, Difficulty::Medium));
    records.push(record(101, Topic::Chemistry, Difficulty::Hard));

    let catalog = Catalog::from_records(records).unwrap();
    QuizService::new(
        Arc::new(catalog),
        &Storage::in_memory(),
        QuizSettings::default(),
    )
    .with_clock(Clock::fixed(fixed_now()))
}

fn serve(service: &QuizService, id: SessionId) -> QuestionPrompt {
    service
        .next_question(id)
        .unwrap()
        .into_question()
        .expect("a question should be served")
}

#[test]
fn two_correct_answers_score_full_marks() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();

    let first = serve(&service, id);
    let second = serve(&service, id);
    assert_ne!(first.id, second.id);

    assert!(service.submit_answer(id, first.id, &right(&first)).unwrap().correct);
    assert!(service.submit_answer(id, second.id, &right(&second)).unwrap().correct);

    let score = service.complete_session(id).unwrap();
    assert_eq!(score.correct(), 2);
    assert_eq!(score.incorrect(), 0);
    assert_eq!(score.accuracy_percent(), 100.0);
    assert_eq!(score.streak().best, 2);
}

#[test]
fn one_wrong_answer_halves_accuracy() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();

    let first = serve(&service, id);
    let second = serve(&service, id);
    service.submit_answer(id, first.id, &right(&first)).unwrap();
    let outcome = service.submit_answer(id, second.id, &wrong(&second)).unwrap();
    assert!(!outcome.correct);
    assert_eq!(outcome.correct_answer, right(&second));

    let score = service.complete_session(id).unwrap();
    assert_eq!(score.accuracy_percent(), 50.0);
    let cell = score.cell(Topic::Physics, Difficulty::Easy).unwrap();
    assert_eq!((cell.correct, cell.incorrect, cell.total), (1, 1, 2));
    assert_eq!(score.streak().current, 0);
    assert_eq!(score.streak().best, 1);
}

#[test]
fn answering_an_unserved_question_is_a_session_error() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();
    serve(&service, id);

    let err = service
        .submit_answer(id, QuestionId::new(100), "C100")
        .unwrap_err();

    assert!(matches!(
        err,
        QuizError::Session(SessionError::State {
            session_id,
            source: SessionStateError::NotAsked { .. },
        }) if session_id == id
    ));
    assert_eq!(service.progress(id).unwrap().answered, 0);
}

#[test]
fn oversized_session_is_rejected_with_the_bound() {
    let service = service();
    let err = service
        .create_session(Topic::Physics, Difficulty::Easy, 51)
        .unwrap_err();

    assert!(matches!(
        err,
        QuizError::Validation(ValidationError::TotalQuestionsOutOfRange {
            value: 51,
            min: 1,
            max: 50,
        })
    ));
    assert!(err.to_string().contains("50"));
    assert_eq!(service.session_statistics().unwrap().total, 0);
}

#[test]
fn full_session_reports_complete_without_changes() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();
    serve(&service, id);
    serve(&service, id);

    let before = service.session(id).unwrap();
    assert_eq!(service.next_question(id).unwrap(), NextQuestion::Complete);
    let after = service.session(id).unwrap();

    assert_eq!(before.asked(), after.asked());
    assert_eq!(after.current_index(), 2);
    assert!(after.is_active());
}

#[test]
fn no_answers_score_zero() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 3)
        .unwrap();
    serve(&service, id);

    let live = service.live_score(id).unwrap();
    assert_eq!(live.total_answered(), 0);
    assert_eq!(live.accuracy_percent(), 0.0);

    let score = service.complete_session(id).unwrap();
    assert_eq!(score.total_answered(), 0);
    assert_eq!(score.correct(), 0);
    assert_eq!(score.incorrect(), 0);
    assert_eq!(score.accuracy_percent(), 0.0);
}

#[test]
fn served_questions_never_repeat() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 5)
        .unwrap();

    let mut seen = HashSet::new();
    loop {
        match service.next_question(id).unwrap() {
            NextQuestion::Question(prompt) => assert!(seen.insert(prompt.id)),
            NextQuestion::Complete => break,
            NextQuestion::Exhausted => panic!("catalog holds enough questions"),
        }
    }

    assert_eq!(seen.len(), 5);
    let session = service.session(id).unwrap();
    assert_eq!(session.asked().len(), session.current_index());
}

#[test]
fn completing_twice_returns_identical_scores() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();
    let first = serve(&service, id);
    service.submit_answer(id, first.id, &right(&first)).unwrap();

    let once = service.complete_session(id).unwrap();
    let later = service
        .clone()
        .with_clock(Clock::fixed(fixed_now() + chrono::Duration::minutes(10)))
        .complete_session(id)
        .unwrap();

    assert_eq!(
        serde_json::to_string(&once).unwrap(),
        serde_json::to_string(&later).unwrap()
    );
    assert_eq!(service.cached_scores().unwrap().len(), 1);
}

#[test]
fn session_can_finish_with_its_last_question_unanswered() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();
    let first = serve(&service, id);
    serve(&service, id);
    service.submit_answer(id, first.id, &right(&first)).unwrap();

    let progress = service.progress(id).unwrap();
    assert!(progress.is_complete);
    assert_eq!(progress.answered, 1);
    assert_eq!(progress.remaining, 0);
    assert_eq!(progress.percent, 100.0);

    let score = service.complete_session(id).unwrap();
    assert_eq!(score.total_questions(), 2);
    assert_eq!(score.total_answered(), 1);
    assert_eq!(score.accuracy_percent(), 100.0);
}

#[test]
fn completed_sessions_refuse_answers() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();
    let first = serve(&service, id);
    service.complete_session(id).unwrap();

    let err = service
        .submit_answer(id, first.id, &right(&first))
        .unwrap_err();
    assert!(matches!(
        err,
        QuizError::Session(SessionError::State {
            source: SessionStateError::Inactive,
            ..
        })
    ));
}

#[test]
fn second_answer_to_a_question_is_rejected() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();
    let first = serve(&service, id);
    service.submit_answer(id, first.id, &wrong(&first)).unwrap();

    let err = service
        .submit_answer(id, first.id, &right(&first))
        .unwrap_err();
    assert!(matches!(
        err,
        QuizError::Session(SessionError::State {
            source: SessionStateError::AlreadyAnswered { .. },
            ..
        })
    ));
    assert_eq!(service.live_score(id).unwrap().correct(), 0);
}

#[test]
fn unknown_session_ids_are_reported() {
    let service = service();
    let missing = SessionId::generate();

    assert!(matches!(
        service.next_question(missing),
        Err(QuizError::Session(SessionError::NotFound { session_id })) if session_id == missing
    ));
    assert!(matches!(
        service.complete_session(missing),
        Err(QuizError::Session(SessionError::NotFound { .. }))
    ));
    assert!(matches!(
        service.live_score(missing),
        Err(QuizError::Score(ScoreError::SessionNotFound { .. }))
    ));
    assert!(matches!(
        service.summarize(missing),
        Err(QuizError::Score(ScoreError::SessionNotFound { .. }))
    ));
}

#[test]
fn live_scores_are_never_cached() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();
    let first = serve(&service, id);
    service.submit_answer(id, first.id, &right(&first)).unwrap();

    assert_eq!(service.live_score(id).unwrap().correct(), 1);
    assert!(service.cached_scores().unwrap().is_empty());

    let second = serve(&service, id);
    service.submit_answer(id, second.id, &right(&second)).unwrap();
    assert_eq!(service.live_score(id).unwrap().correct(), 2);
}

#[test]
fn summary_of_a_finished_session() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 2)
        .unwrap();
    let first = serve(&service, id);
    let second = serve(&service, id);
    service.submit_answer(id, first.id, &wrong(&first)).unwrap();
    service.submit_answer(id, second.id, &wrong(&second)).unwrap();
    let score = service.complete_session(id).unwrap();

    let report = service.summarize(id).unwrap();

    assert_eq!(report.score, score);
    assert_eq!(report.performance.band.label(), "needs practice");
    assert_eq!(report.performance.pace, None);
    assert_eq!(report.review.len(), 1);
    assert_eq!(report.review[0].topic, Topic::Physics);
    assert_eq!(report.session.duration, "0s");
    assert_eq!(report.recommendations.len(), 2);
}

#[test]
fn concurrent_requests_never_serve_a_duplicate() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 5)
        .unwrap();

    let shared = &service;
    let served: Vec<QuestionId> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| scope.spawn(move || shared.next_question(id).unwrap().into_question()))
            .collect();
        workers
            .into_iter()
            .filter_map(|worker| worker.join().unwrap())
            .map(|prompt| prompt.id)
            .collect()
    });

    let unique: HashSet<_> = served.iter().copied().collect();
    assert_eq!(served.len(), 5);
    assert_eq!(unique.len(), 5);
    assert_eq!(service.session(id).unwrap().asked().len(), 5);
}

#[test]
fn concurrent_answers_record_exactly_once() {
    let service = service();
    let id = service
        .create_session(Topic::Physics, Difficulty::Easy, 1)
        .unwrap();
    let prompt = serve(&service, id);
    let answer = right(&prompt);
    let (shared, answer, question_id) = (&service, answer.as_str(), prompt.id);

    let accepted = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..6)
            .map(|_| scope.spawn(move || shared.submit_answer(id, question_id, answer).is_ok()))
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().unwrap())
            .filter(|ok| *ok)
            .count()
    });

    assert_eq!(accepted, 1);
    assert_eq!(service.live_score(id).unwrap().total_answered(), 1);
}

#[test]
fn cache_maintenance_tracks_finished_sessions() {
    let service = service();
    let perfect = service
        .create_session(Topic::Physics, Difficulty::Easy, 1)
        .unwrap();
    let prompt = serve(&service, perfect);
    service.submit_answer(perfect, prompt.id, &right(&prompt)).unwrap();
    service.complete_session(perfect).unwrap();

    let missed = service
        .create_session(Topic::Math, Difficulty::Medium, 1)
        .unwrap();
    let prompt = serve(&service, missed);
    service.submit_answer(missed, prompt.id, &wrong(&prompt)).unwrap();
    service.complete_session(missed).unwrap();

    assert_eq!(service.average_accuracy(None).unwrap(), 50.0);
    assert_eq!(service.average_accuracy(Some(Topic::Physics)).unwrap(), 100.0);

    assert!(service.forget_score(missed).unwrap());
    assert_eq!(service.average_accuracy(None).unwrap(), 100.0);

    service.clear_scores().unwrap();
    assert!(service.cached_scores().unwrap().is_empty());
}
