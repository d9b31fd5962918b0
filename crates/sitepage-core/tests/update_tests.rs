use pretty_assertions::assert_eq;
use serde_json::Value;
use sitepage_core::{Method, MissingTargetPolicy, PipelineConfig, PipelineError, WriteStep};
use sitepage_model::AddressingScheme::{Fallback, Primary};
use sitepage_model::{normalize, ContentDocument, UpdateStage};
use sitepage_test_utils::endpoints::{
    files_of, merge, probe, publish, read_content, CONTEXT_INFO, LISTS,
};
use sitepage_test_utils::fixtures::{
    canvas_read_back, context_info, context_info_verbose, files, list, modern,
};
use sitepage_test_utils::{pipeline, ScriptedTransport};
use std::sync::Arc;

const PAGE: &str = "/sites/X/SitePages/Y.aspx";
const DIGEST: &str = "0xDIGEST,18 May 2024";

fn content() -> ContentDocument {
    ContentDocument::new(r#"[{"controlType":4,"innerHTML":"<p>Hi</p>"}]"#)
}

/// Page exists under the primary scheme and a digest is available
fn reachable() -> ScriptedTransport {
    ScriptedTransport::new()
        .get_json(probe(Primary, PAGE), &serde_json::json!({"UniqueId": "u"}))
        .post_json(CONTEXT_INFO, &context_info(DIGEST))
}

#[tokio::test]
async fn primary_not_found_falls_back_then_publishes() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .get_status(probe(Primary, PAGE), 404)
            .get_json(probe(Fallback, PAGE), &serde_json::json!({"UniqueId": "u"}))
            .post_json(CONTEXT_INFO, &context_info(DIGEST))
            .post_status(merge(Primary, PAGE), 404)
            .post_status(merge(Fallback, PAGE), 204)
            .post_status(publish(Fallback, PAGE), 200),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default());

    let outcome = pipeline.update(&normalize(PAGE), &content(), true).await.unwrap();

    assert_eq!(outcome.scheme, Fallback);
    assert!(outcome.published);
    assert_eq!(outcome.published_scheme, Some(Fallback));
    assert!(!outcome.verified);
    assert_eq!(outcome.resolved_path.as_str(), PAGE);
    assert_eq!(outcome.corrected_from, None);
    assert_eq!(
        outcome.stages,
        vec![
            UpdateStage::Idle,
            UpdateStage::TokenAcquired,
            UpdateStage::PrimaryAttempted,
            UpdateStage::FallbackAttempted,
            UpdateStage::Published,
        ]
    );
    assert_eq!(transport.count(Method::Post, &merge(Primary, PAGE)), 1);
    assert_eq!(transport.count(Method::Post, &merge(Fallback, PAGE)), 1);
    assert_eq!(transport.count(Method::Post, &publish(Primary, PAGE)), 0);
}

#[tokio::test]
async fn merge_request_carries_digest_and_payload() {
    let transport = Arc::new(
        reachable()
            .post_status(merge(Primary, PAGE), 204)
            .post_status(publish(Primary, PAGE), 200),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default());
    let content = content();

    pipeline.update(&normalize(PAGE), &content, true).await.unwrap();

    let requests = transport.requests();
    let write = requests
        .iter()
        .find(|r| r.method == Method::Post && r.url.ends_with("/ListItemAllFields"))
        .unwrap();
    assert_eq!(write.header("X-RequestDigest"), Some(DIGEST));
    assert_eq!(write.header("IF-MATCH"), Some("*"));
    assert_eq!(write.header("X-HTTP-Method"), Some("MERGE"));
    let body: Value = serde_json::from_str(write.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["CanvasContent1"], content.as_str());
    assert_eq!(body["PageLayoutType"], "Article");

    let publish_request = requests.iter().find(|r| r.url.contains("/Publish(")).unwrap();
    assert_eq!(publish_request.header("X-RequestDigest"), Some(DIGEST));
    assert!(publish_request.url.contains("StringParameter='Smoke%20update'"));
}

#[tokio::test]
async fn primary_success_never_touches_fallback() {
    let transport = Arc::new(
        reachable()
            .post_status(merge(Primary, PAGE), 204)
            .post_status(publish(Primary, PAGE), 200),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default());

    let outcome = pipeline.update(&normalize(PAGE), &content(), true).await.unwrap();

    assert_eq!(outcome.scheme, Primary);
    assert_eq!(transport.count(Method::Post, &merge(Fallback, PAGE)), 0);
    assert_eq!(transport.count(Method::Post, &publish(Fallback, PAGE)), 0);
}

#[tokio::test]
async fn both_schemes_missing_is_write_target_missing_without_publish() {
    let transport = Arc::new(reachable());
    let pipeline = pipeline(&transport, PipelineConfig::default());

    let err = pipeline.update(&normalize(PAGE), &content(), true).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::WriteTargetMissing { stage: WriteStep::Write, .. }
    ));
    assert_eq!(transport.count(Method::Post, "/Publish("), 0);
    assert_eq!(transport.count(Method::Post, "/ListItemAllFields"), 2);
}

#[tokio::test]
async fn no_publish_records_written() {
    let transport = Arc::new(reachable().post_status(merge(Primary, PAGE), 204));
    let pipeline = pipeline(&transport, PipelineConfig::default());

    let outcome = pipeline.update(&normalize(PAGE), &content(), false).await.unwrap();

    assert!(!outcome.published);
    assert_eq!(outcome.published_scheme, None);
    assert_eq!(outcome.stages.last(), Some(&UpdateStage::Written));
    assert_eq!(transport.count(Method::Post, "/Publish("), 0);
}

#[tokio::test]
async fn publish_tries_remaining_scheme_then_fails() {
    let transport = Arc::new(
        reachable()
            .post_status(merge(Primary, PAGE), 204)
            .post_status(publish(Primary, PAGE), 404)
            .post_status(publish(Fallback, PAGE), 200),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default());
    let outcome = pipeline.update(&normalize(PAGE), &content(), true).await.unwrap();
    assert!(outcome.published);
    assert_eq!(outcome.scheme, Primary);
    assert_eq!(outcome.published_scheme, Some(Fallback));
    assert_eq!(transport.count(Method::Post, &publish(Primary, PAGE)), 1);

    let exhausted = Arc::new(reachable().post_status(merge(Primary, PAGE), 204));
    let pipeline = sitepage_test_utils::pipeline(&exhausted, PipelineConfig::default());
    let err = pipeline.update(&normalize(PAGE), &content(), true).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::WriteTargetMissing { stage: WriteStep::Publish, .. }
    ));
}

#[tokio::test]
async fn write_server_error_is_not_retried() {
    let transport = Arc::new(reachable().post_status(merge(Primary, PAGE), 500));
    let pipeline = pipeline(&transport, PipelineConfig::default());

    let err = pipeline.update(&normalize(PAGE), &content(), true).await.unwrap_err();

    assert!(matches!(err, PipelineError::Transport(ref e) if e.status() == Some(500)));
    assert_eq!(transport.count(Method::Post, &merge(Fallback, PAGE)), 0);
}

#[tokio::test]
async fn missing_digest_stops_before_writing() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .get_json(probe(Primary, PAGE), &serde_json::json!({}))
            .post_json(CONTEXT_INFO, &serde_json::json!({"WebFullUrl": "x"})),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default());

    let err = pipeline.update(&normalize(PAGE), &content(), true).await.unwrap_err();

    assert!(matches!(err, PipelineError::Auth(_)));
    assert_eq!(transport.count(Method::Post, "/ListItemAllFields"), 0);
}

#[tokio::test]
async fn verbose_digest_is_accepted() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .get_json(probe(Primary, PAGE), &serde_json::json!({}))
            .post_json(CONTEXT_INFO, &context_info_verbose("0xV"))
            .post_status(merge(Primary, PAGE), 204),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default());

    pipeline.update(&normalize(PAGE), &content(), false).await.unwrap();

    let write = transport
        .requests()
        .into_iter()
        .find(|r| r.url.ends_with("/ListItemAllFields"))
        .unwrap();
    assert_eq!(write.header("X-RequestDigest"), Some("0xV"));
}

#[tokio::test]
async fn abort_policy_fails_before_token() {
    let transport = Arc::new(ScriptedTransport::new());
    let config = PipelineConfig::default().with_missing_target(MissingTargetPolicy::Abort);
    let pipeline = pipeline(&transport, config);

    let err = pipeline.update(&normalize(PAGE), &content(), true).await.unwrap_err();

    assert!(matches!(err, PipelineError::TargetNotFound { ref path } if path.as_str() == PAGE));
    assert_eq!(transport.count(Method::Post, CONTEXT_INFO), 0);
}

#[tokio::test]
async fn auto_correct_re_resolves_stale_path() {
    let stale = "/sites/X/SitePages/Old-Name.aspx";
    let fresh = "/sites/X/SitePages/Old-Name-v2.aspx";
    let transport = Arc::new(
        ScriptedTransport::new()
            .get_json(LISTS, &modern(vec![list("s", "Site Pages", 119, "/sites/X/SitePages")]))
            .get_json(files_of("/sites/X/SitePages"), &files("/sites/X/SitePages", &["Home.aspx", "Old-Name-v2.aspx"]))
            .get_json(probe(Primary, fresh), &serde_json::json!({}))
            .post_json(CONTEXT_INFO, &context_info(DIGEST))
            .post_status(merge(Primary, fresh), 204),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default());

    let outcome = pipeline.update(&normalize(stale), &content(), false).await.unwrap();

    assert_eq!(outcome.resolved_path.as_str(), fresh);
    assert_eq!(outcome.corrected_from, Some(normalize(stale)));
    assert_eq!(transport.count(Method::Post, &merge(Primary, stale)), 0);
}

#[tokio::test]
async fn auto_correct_without_match_is_target_not_found() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .get_json(LISTS, &modern(vec![list("s", "Site Pages", 119, "/sites/X/SitePages")]))
            .get_json(files_of("/sites/X/SitePages"), &files("/sites/X/SitePages", &["Home.aspx"])),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default());

    let err = pipeline.update(&normalize(PAGE), &content(), true).await.unwrap_err();

    assert!(matches!(err, PipelineError::TargetNotFound { .. }));
    assert_eq!(transport.count(Method::Post, CONTEXT_INFO), 0);
}

#[tokio::test]
async fn pre_probe_can_be_disabled() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .post_json(CONTEXT_INFO, &context_info(DIGEST))
            .post_status(merge(Primary, PAGE), 204),
    );
    let config = PipelineConfig::default().with_pre_probe(false);
    let pipeline = pipeline(&transport, config);

    pipeline.update(&normalize(PAGE), &content(), false).await.unwrap();

    assert_eq!(transport.count(Method::Get, "?$select=UniqueId"), 0);
}

#[tokio::test]
async fn verification_reads_content_back() {
    let content = content();
    let transport = Arc::new(
        reachable()
            .post_status(merge(Primary, PAGE), 204)
            .post_status(publish(Primary, PAGE), 200)
            .get_json(read_content(Primary, PAGE), &canvas_read_back(content.as_str())),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default().with_verify(true));

    let outcome = pipeline.update(&normalize(PAGE), &content, true).await.unwrap();

    assert!(outcome.verified);
    assert_eq!(outcome.stages.last(), Some(&UpdateStage::Verified));
}

#[tokio::test]
async fn verification_mismatch_fails() {
    let transport = Arc::new(
        reachable()
            .post_status(merge(Primary, PAGE), 204)
            .get_json(read_content(Primary, PAGE), &canvas_read_back("[]")),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default().with_verify(true));

    let err = pipeline.update(&normalize(PAGE), &content(), false).await.unwrap_err();
    assert!(matches!(err, PipelineError::VerificationFailed { .. }));
}

#[tokio::test]
async fn resolve_and_update_end_to_end() {
    let root = "/sites/X/SitePages";
    let page = "/sites/X/SitePages/First-Test-Page-1.aspx";
    let transport = Arc::new(
        ScriptedTransport::new()
            .get_json(LISTS, &modern(vec![list("s", "Site Pages", 119, root)]))
            .get_json(files_of(root), &files(root, &["First-Test-Page-1.aspx"]))
            .get_json(probe(Primary, page), &serde_json::json!({}))
            .post_json(CONTEXT_INFO, &context_info(DIGEST))
            .post_status(merge(Primary, page), 204)
            .post_status(publish(Primary, page), 200),
    );
    let pipeline = pipeline(&transport, PipelineConfig::default());

    let outcome = pipeline
        .resolve_and_update("First Test Page", &content(), true)
        .await
        .unwrap();

    assert_eq!(outcome.resolved_path.as_str(), page);
    assert_eq!(outcome.scheme, Primary);
    assert!(outcome.published);
}
