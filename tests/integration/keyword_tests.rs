use feedbackpro_analytics_lib::error::AppResult;
use feedbackpro_analytics_lib::models::analytics::{AnalyticsOptions, KeywordFrequency};
use feedbackpro_analytics_lib::models::feedback::FeedbackRecord;
use feedbackpro_analytics_lib::models::settings::EngineSettings;
use feedbackpro_analytics_lib::services::analytics_engine::AnalyticsEngine;
use feedbackpro_analytics_lib::services::keyword_extractor::KeywordExtractor;
use feedbackpro_analytics_lib::services::settings_service::SettingsService;

fn comment(id: &str, text: &str) -> FeedbackRecord {
    FeedbackRecord::new(id, "form").with_response("comment", text)
}

fn terms(keywords: &[KeywordFrequency]) -> Vec<(&str, u64)> {
    keywords
        .iter()
        .map(|keyword| (keyword.term.as_str(), keyword.frequency))
        .collect()
}

#[test]
fn punctuation_and_case_are_normalized() {
    let records = vec![comment("1", "Great service, great staff")];
    let keywords = KeywordExtractor::default().extract(&records, 10);
    assert_eq!(
        terms(&keywords),
        vec![("great", 2), ("service", 1), ("staff", 1)]
    );
}

#[test]
fn top_n_truncates_after_ranking() {
    let records = vec![
        comment("1", "refund refund refund"),
        comment("2", "delay delay support"),
        comment("3", "support checkout"),
    ];
    let keywords = KeywordExtractor::default().extract(&records, 2);
    assert_eq!(terms(&keywords), vec![("refund", 3), ("delay", 2)]);

    let keywords = KeywordExtractor::default().extract(&records, 3);
    assert_eq!(keywords[2].term, "support");
    assert!(KeywordExtractor::default().extract(&records, 0).is_empty());
}

#[test]
fn extraction_is_deterministic_across_runs() {
    let records: Vec<FeedbackRecord> = (0..50)
        .map(|i| comment(&i.to_string(), &format!("alpha{} beta{} gamma", i % 4, i % 3)))
        .collect();
    let extractor = KeywordExtractor::default();
    let first = extractor.extract(&records, 20);
    for _ in 0..5 {
        assert_eq!(extractor.extract(&records, 20), first);
    }
    assert_eq!(first[0], KeywordFrequency { term: "gamma".to_string(), frequency: 50 });
}

#[test]
fn unicode_words_survive_tokenization() {
    let records = vec![
        comment("1", "Très rapide! Service très agréable"),
        comment("2", "Über schnell, über freundlich"),
    ];
    let keywords = KeywordExtractor::default().extract(&records, 10);
    let found = terms(&keywords);
    assert!(found.contains(&("très", 2)));
    assert!(found.contains(&("über", 2)));
    assert!(found.contains(&("agréable", 1)));
}

#[test]
fn only_text_answers_are_counted() {
    let record = FeedbackRecord::new("1", "form")
        .with_response("comment", "slow checkout")
        .with_response("rating", 4.0);
    let keywords = KeywordExtractor::default().extract([&record], 10);
    assert_eq!(terms(&keywords), vec![("slow", 1), ("checkout", 1)]);
}

#[test]
fn settings_drive_stop_words_and_length() -> AppResult<()> {
    let settings = SettingsService::from_yaml_str(
        "minKeywordLength: 2\nextraStopWords: [app, Checkout]\n",
    )?;
    let engine = AnalyticsEngine::new(&settings);
    let records = vec![comment("1", "The app checkout is ok ok")];

    let result = engine.compute(&records, &AnalyticsOptions::from_settings(&settings))?;
    assert_eq!(terms(&result.keywords), vec![("ok", 2), ("is", 1)]);

    let replaced = EngineSettings {
        replace_default_stop_words: true,
        extra_stop_words: vec!["ok".to_string()],
        min_keyword_length: 2,
        ..EngineSettings::default()
    };
    let keywords = KeywordExtractor::from_settings(&replaced).extract(&records, 10);
    assert_eq!(
        terms(&keywords),
        vec![("the", 1), ("app", 1), ("checkout", 1), ("is", 1)]
    );
    Ok(())
}

#[test]
fn ties_within_a_record_follow_answer_order() {
    let raw = serde_json::json!({
        "id": "1",
        "formId": "form",
        "responses": {"zcomment": "banana", "acomment": "apple"}
    });
    let record: FeedbackRecord = serde_json::from_value(raw).expect("record");
    assert_eq!(record.corpus(), "banana apple");

    let keywords = KeywordExtractor::default().extract([&record], 10);
    assert_eq!(terms(&keywords), vec![("banana", 1), ("apple", 1)]);
}
