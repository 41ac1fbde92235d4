use murmur::corpus::LexicalSet;
use murmur::error::ErrorKind;
use murmur::generation::engine::{collapse, validate, AttemptOutcome, InvalidReason};
use murmur::generation::{GenerationSettings, Generator, MarkovFactory, ModelConfig, ModelFactory};
use murmur::tokenize::{ScriptTokenizer, Tokenizer};

fn trip_posts() -> Vec<String> {
    [
        "今日は東京で寿司を食べました",
        "今日は大阪で寿司を食べました",
        "今日は京都で寿司を食べました",
        "今日は札幌で寿司を食べました",
        "今日は福岡で寿司を食べました",
        "今日は仙台で寿司を食べました",
        "今日は横浜で寿司を食べました",
        "今日は神戸で寿司を食べました",
        "今日は奈良で寿司を食べました",
        "今日は金沢で寿司を食べました",
        "今日は広島で寿司を食べました",
        "今日は那覇で寿司を食べました",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// --- Validation ---

#[test]
fn collapse_removes_all_whitespace() {
    assert_eq!(collapse("今日 は 東京\tで 。"), "今日は東京で。");
    assert_eq!(collapse("   "), "");
}

#[test]
fn validate_rejects_ascii_tokens() {
    assert_eq!(
        validate("今日 は mp3 を 聴いた 。", 5),
        Err(InvalidReason::AsciiToken("mp3".to_string()))
    );
    // Mixed-script tokens are not ASCII-only
    assert_eq!(validate("今日 は ＭＰ３ を 聴いた 。", 5), Ok(()));
}

#[test]
fn validate_rejects_excluded_script() {
    assert_eq!(
        validate("今日 は 谢谢 と 言った 。", 5),
        Err(InvalidReason::ExcludedScript)
    );
}

#[test]
fn validate_measures_collapsed_length() {
    // Nine characters once spaces are gone
    assert_eq!(
        validate("今日 は 雨 が 降った 。", 10),
        Err(InvalidReason::TooShort { chars: 9 })
    );
    assert_eq!(validate("今日 は 雨 が 降った 。", 9), Ok(()));
}

// --- Markov factory ---

#[test]
fn seeded_factory_is_reproducible() {
    let t = ScriptTokenizer::new();
    let corpus: Vec<String> = trip_posts().iter().map(|p| t.tokenize(p)).collect();
    let corpus = corpus.join("\n");

    let factory = MarkovFactory::new(Some(99));
    let sample = |factory: &MarkovFactory| {
        let mut model = factory.train(&corpus, ModelConfig::default()).unwrap();
        (0..5)
            .map(|_| model.make_sentence(100, 5, 50))
            .collect::<Vec<_>>()
    };
    assert_eq!(sample(&factory), sample(&factory));
}

#[test]
fn trained_model_only_emits_seen_transitions() {
    let t = ScriptTokenizer::new();
    let corpus: Vec<String> = trip_posts().iter().map(|p| t.tokenize(p)).collect();

    let mut model = MarkovFactory::new(Some(5))
        .train(&corpus.join("\n"), ModelConfig::default())
        .unwrap();
    for _ in 0..20 {
        let sentence = model.make_sentence(100, 5, 50).unwrap();
        let words: Vec<&str> = sentence.split(' ').collect();
        assert_eq!(words.len(), 9);
        assert_eq!(&words[..2], &["今日", "は"]);
        assert_eq!(&words[3..], &["で", "寿司", "を", "食", "べました", "。"]);
    }
}

#[test]
fn empty_corpus_samples_nothing() {
    let mut model = MarkovFactory::new(Some(1))
        .train("", ModelConfig::default())
        .unwrap();
    assert_eq!(model.make_sentence(10, 1, 50), None);
}

// --- Engine ---

#[test]
fn generator_accepts_first_clean_candidate() {
    let factory = MarkovFactory::new(Some(21));
    let tokenizer = ScriptTokenizer::new();
    let report = Generator::new(&factory, &tokenizer).run(&trip_posts(), &LexicalSet::default());

    let generated = report.outcome.unwrap();
    assert!(!generated.degraded);
    assert_eq!(report.attempts.len(), 1);
    assert_eq!(report.attempts[0].outcome, AttemptOutcome::Accepted);
    assert_eq!(report.attempts[0].candidate.as_deref(), Some(generated.text.as_str()));
}

#[test]
fn generator_flags_forbidden_fallback() {
    let factory = MarkovFactory::new(Some(21));
    let tokenizer = ScriptTokenizer::new();
    let settings = GenerationSettings {
        attempts: 3,
        ..GenerationSettings::default()
    };
    let forbidden = LexicalSet::from_words(["寿司"]);
    let report = Generator::new(&factory, &tokenizer)
        .with_settings(settings)
        .run(&trip_posts(), &forbidden);

    assert_eq!(report.attempts.len(), 3);
    for attempt in &report.attempts {
        assert_eq!(
            attempt.outcome,
            AttemptOutcome::Forbidden(vec!["寿司".to_string()])
        );
    }
    let generated = report.outcome.unwrap();
    assert!(generated.degraded);
    assert_eq!(
        Some(generated.text.as_str()),
        report.attempts[2].candidate.as_deref()
    );
}

#[test]
fn generator_needs_ten_posts() {
    let factory = MarkovFactory::new(Some(21));
    let tokenizer = ScriptTokenizer::new();
    let posts: Vec<String> = trip_posts().into_iter().take(9).collect();
    let err = Generator::new(&factory, &tokenizer)
        .generate(&posts, &LexicalSet::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
}

#[test]
fn generator_counts_survivors_not_inputs() {
    let factory = MarkovFactory::new(Some(21));
    let tokenizer = ScriptTokenizer::new();
    let mut posts: Vec<String> = trip_posts().into_iter().take(8).collect();
    posts.extend((0..5).map(|_| "短い投稿".to_string()));
    let err = Generator::new(&factory, &tokenizer)
        .generate(&posts, &LexicalSet::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
}
