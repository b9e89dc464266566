mod support;

use common::ComplexityConfig;
use orchestrator::{ComplexityAnalyzer, ComplexityMetrics, Recommendation, WarningReason};
use proptest::prelude::*;
use serde_json::{json, Value};
use skill_core::{ErrorKind, ExecutionResult, Invocation, SkillCategory};
use support::{descriptor, params};

fn items(n: usize) -> Value {
    Value::Array((0..n).map(|i| json!({"id": i})).collect())
}

#[test]
fn test_flagged_batch_of_fifty_is_refactored_into_five() {
    let analyzer = ComplexityAnalyzer::default();
    let invocation = Invocation::new(
        "contact_import",
        params(json!({"batch": true, "data": items(50)})),
    );

    let metrics = analyzer.analyze(
        &descriptor("contact_import", SkillCategory::Operations),
        &invocation.params,
    );
    assert_eq!(metrics.recommendation, Recommendation::Refactor);
    assert_eq!(metrics.estimated_execution_time_ms, 100 + 50 * 100);
    assert!(!metrics.suggestions.is_empty());

    let subtasks = analyzer.decompose(&invocation, &metrics);
    assert_eq!(subtasks.len(), 5);
    for (index, subtask) in subtasks.iter().enumerate() {
        assert_eq!(subtask.skill_id, "contact_import");
        assert_eq!(subtask.params["_batchIndex"], json!(index));
        assert_eq!(subtask.params["_totalBatches"], json!(5));
        assert_eq!(subtask.params["data"].as_array().map(Vec::len), Some(10));
        assert_eq!(subtask.params["batch"], json!(true));
    }
    assert_eq!(subtasks[4].params["data"][0]["id"], json!(40));
}

#[test]
fn test_batch_array_is_chunked_in_place() {
    let analyzer = ComplexityAnalyzer::default();
    let invocation = Invocation::new("sms_blast", params(json!({"batch": items(31)})));
    let metrics = analyzer.analyze(
        &descriptor("sms_blast", SkillCategory::Communication),
        &invocation.params,
    );
    assert_eq!(metrics.recommendation, Recommendation::Refactor);

    let subtasks = analyzer.decompose(&invocation, &metrics);
    let sizes: Vec<usize> = subtasks
        .iter()
        .map(|s| s.params["batch"].as_array().map(Vec::len).unwrap_or(0))
        .collect();
    assert_eq!(sizes, vec![10, 10, 10, 1]);
}

#[test]
fn test_recommendation_ladder() {
    let analyzer = ComplexityAnalyzer::default();
    let skill = descriptor("crm_sync", SkillCategory::Operations);

    let simple = analyzer.analyze(&skill, &params(json!({"id": 1})));
    assert_eq!(simple.recommendation, Recommendation::Simple);

    let wide: serde_json::Map<String, Value> =
        (0..16).map(|i| (format!("field_{i}"), json!(i))).collect();
    let moderate = analyzer.analyze(&skill, &wide);
    assert_eq!(moderate.cognitive_complexity, 16);
    assert_eq!(moderate.recommendation, Recommendation::Moderate);
}

#[test]
fn test_thresholds_are_configurable() {
    let analyzer = ComplexityAnalyzer::new(ComplexityConfig {
        cognitive_threshold: 0,
        cyclomatic_threshold: 0,
        ..ComplexityConfig::default()
    });
    let metrics = analyzer.analyze(
        &descriptor("crm_sync", SkillCategory::Operations),
        &params(json!({"id": 1})),
    );
    assert_eq!(metrics.recommendation, Recommendation::Complex);
    assert_eq!(metrics.suggestions.len(), 2);
}

#[test]
fn test_largest_array_is_used_without_batch_flag() {
    let analyzer = ComplexityAnalyzer::new(ComplexityConfig {
        batch_chunk_size: 4,
        ..ComplexityConfig::default()
    });
    let invocation = Invocation::new(
        "report_builder",
        params(json!({"sections": items(3), "rows": items(9)})),
    );
    let metrics = ComplexityMetrics {
        recommendation: Recommendation::Refactor,
        ..Default::default()
    };

    let subtasks = analyzer.decompose(&invocation, &metrics);
    assert_eq!(subtasks.len(), 3);
    assert_eq!(subtasks[0].params["rows"].as_array().map(Vec::len), Some(4));
    assert_eq!(subtasks[0].params["sections"].as_array().map(Vec::len), Some(3));
    assert_eq!(subtasks[2].params["_totalBatches"], json!(3));
}

#[test]
fn test_no_split_axis_returns_original() {
    let analyzer = ComplexityAnalyzer::default();
    let invocation = Invocation::new("crm_sync", params(json!({"action": "export"})));
    let metrics = ComplexityMetrics {
        recommendation: Recommendation::Refactor,
        ..Default::default()
    };

    assert_eq!(analyzer.decompose(&invocation, &metrics), vec![invocation]);
}

#[test]
fn test_monitor_flags_slow_and_rate_limited_runs() {
    let analyzer = ComplexityAnalyzer::default();

    let fine = ExecutionResult::success("crm_sync", json!({})).with_meta("n", 1);
    assert!(analyzer.monitor(&fine).is_none());

    let mut slow = ExecutionResult::success("crm_sync", json!({}));
    slow.execution_time_ms = 6_000;
    let warning = analyzer.monitor(&slow).expect("slow run warns");
    assert_eq!(warning.reasons, vec![WarningReason::SlowExecution]);

    let limited = ExecutionResult::failure(
        "crm_sync",
        ErrorKind::Reported,
        "429 Too Many Requests: rate limit exceeded",
    );
    let warning = analyzer.monitor(&limited).expect("rate limit warns");
    assert_eq!(warning.reasons, vec![WarningReason::RateLimited]);

    let timed_out = ExecutionResult::failure(
        "crm_sync",
        ErrorKind::Timeout,
        "Skill crm_sync timed out after 50ms",
    );
    let warning = analyzer.monitor(&timed_out).expect("timeout warns");
    assert_eq!(warning.reasons, vec![WarningReason::TimedOut]);
}

proptest! {
    #[test]
    fn prop_chunks_preserve_every_item(n in 1usize..200, chunk in 1usize..25) {
        let analyzer = ComplexityAnalyzer::new(ComplexityConfig {
            batch_chunk_size: chunk,
            ..ComplexityConfig::default()
        });
        let invocation = Invocation::new("sms_blast", params(json!({"batch": items(n)})));
        let metrics = ComplexityMetrics {
            recommendation: Recommendation::Refactor,
            ..Default::default()
        };

        let subtasks = analyzer.decompose(&invocation, &metrics);
        prop_assert_eq!(subtasks.len(), n.div_ceil(chunk));

        let ids: Vec<Value> = subtasks
            .iter()
            .flat_map(|s| s.params["batch"].as_array().cloned().unwrap_or_default())
            .map(|item| item["id"].clone())
            .collect();
        let expected: Vec<Value> = (0..n).map(|i| json!(i)).collect();
        prop_assert_eq!(ids, expected);
        prop_assert!(subtasks
            .iter()
            .all(|s| s.params["batch"].as_array().map_or(0, Vec::len) <= chunk));
    }
}
