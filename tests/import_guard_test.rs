// ==========================================
// 集成测试 - 批次级保护
// ==========================================
// 覆盖: 权限检查、文件格式/大小、连续持久化失败中止、通知隔离
// ==========================================

mod helpers;

use helpers::mock_collaborators::{
    FailingNotifier, FailingWriteRepository, RecordingNotifier, SlowNotifier,
};
use helpers::mock_config::MockConfig;
use helpers::test_data_builder::credential_csv;
use license_ledger::config::config_keys;
use license_ledger::domain::{ImportIntent, RowErrorKind};
use license_ledger::gateway::{Role, StaticPermissionChecker, TracingNotifier};
use license_ledger::importer::{
    CredentialImporter, CredentialImporterImpl, ImportError, ImportRequest,
};
use license_ledger::logging;
use license_ledger::repository::{LedgerRepository, LedgerRepositoryImpl};
use std::sync::Arc;
use std::time::{Duration, Instant};
use test_helpers::*;

fn credential_request(bytes: Vec<u8>, file_name: &str) -> ImportRequest {
    ImportRequest {
        bytes,
        file_name: file_name.to_string(),
        mime_type: None,
        intent: ImportIntent::CredentialOnly,
        actor: Some("ops".to_string()),
    }
}

// ==========================================
// 权限
// ==========================================

#[tokio::test]
async fn test_permission_denied_before_any_work() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    seed_packages(&db_path, &["Pro"]).await;

    let importer = create_importer_with(
        &db_path,
        Arc::new(StaticPermissionChecker::for_role(Role::Viewer)),
        Arc::new(TracingNotifier),
    );

    let bytes = credential_csv(&[("a@x.com", "pw", "Pro", None)]);
    let result = importer
        .import_file(credential_request(bytes, "credentials.csv"))
        .await;

    assert!(matches!(result, Err(ImportError::PermissionDenied { .. })));

    let repo = open_repo(&db_path);
    assert_eq!(repo.count_credentials().await.unwrap(), 0);
    assert!(repo.get_recent_batches(10).await.unwrap().is_empty());
}

// ==========================================
// 文件格式与大小
// ==========================================

#[tokio::test]
async fn test_unsupported_format_is_fatal() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let importer = create_importer(&db_path);

    let result = importer
        .import_file(credential_request(b"hello".to_vec(), "notes.txt"))
        .await;
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_oversize_file_is_fatal() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    set_config(&db_path, config_keys::MAX_FILE_BYTES, "32");
    let importer = create_importer(&db_path);

    let bytes = credential_csv(&[
        ("a@x.com", "pw", "Pro", None),
        ("b@x.com", "pw", "Pro", None),
    ]);
    assert!(bytes.len() > 32);

    let result = importer
        .import_file(credential_request(bytes, "credentials.csv"))
        .await;
    assert!(matches!(
        result,
        Err(ImportError::OversizeFile { limit: 32, .. })
    ));
}

#[tokio::test]
async fn test_empty_file_is_fatal() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let importer = create_importer(&db_path);

    let result = importer
        .import_file(credential_request(Vec::new(), "credentials.csv"))
        .await;
    assert!(matches!(result, Err(ImportError::EmptyFile)));
}

#[tokio::test]
async fn test_corrupt_spreadsheet_is_fatal() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let importer = create_importer(&db_path);

    let result = importer
        .import_file(credential_request(b"PK\x03\x04garbage".to_vec(), "ledger.xlsx"))
        .await;
    assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
}

// ==========================================
// 连续持久化失败中止
// ==========================================

#[tokio::test]
async fn test_consecutive_persistence_failures_abort_batch() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    seed_packages(&db_path, &["Pro"]).await;

    let inner: Arc<dyn LedgerRepository> = open_repo(&db_path);
    let failing = Arc::new(FailingWriteRepository::new(inner));
    let importer = CredentialImporterImpl::new(
        failing.clone(),
        MockConfig::with_failure_limit(2),
        Arc::new(StaticPermissionChecker::for_role(Role::Admin)),
        Arc::new(TracingNotifier),
    );

    let bytes = credential_csv(&[
        ("a@x.com", "pw", "Pro", None),
        ("b@x.com", "pw", "Pro", None),
        ("c@x.com", "pw", "Pro", None),
        ("d@x.com", "pw", "Pro", None),
        ("e@x.com", "pw", "Pro", None),
    ]);
    let result = importer
        .import_file(credential_request(bytes, "credentials.csv"))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(failing.attempts(), 2);
    assert_eq!(result.counts.failed, 2);
    assert_eq!(result.counts.skipped, 3);
    assert_eq!(result.counts.succeeded, 0);
    assert!(result
        .failed_rows()
        .all(|r| r.error_kind == Some(RowErrorKind::Persistence)));
    assert!(result.fatal_error.is_some());

    // 批次记录仍由底层仓储写入
    let batches = open_repo(&db_path).get_recent_batches(5).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].skipped_rows, 3);
}

// ==========================================
// 通知
// ==========================================

#[tokio::test]
async fn test_notification_sent_with_batch_summary() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    seed_packages(&db_path, &["Pro"]).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let importer = create_importer_with(
        &db_path,
        Arc::new(StaticPermissionChecker::for_role(Role::Operator)),
        notifier.clone(),
    );

    let bytes = credential_csv(&[("a@x.com", "pw", "Pro", Some(1))]);
    let result = importer
        .import_file(credential_request(bytes, "credentials.csv"))
        .await
        .unwrap();

    let sent = notifier.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "credential-import");
    assert_eq!(sent[0].1["batch_id"], result.batch_id.as_str());
    assert_eq!(sent[0].1["counts"]["succeeded"], 1);
    assert_eq!(sent[0].1["file_name"], "credentials.csv");
}

#[tokio::test]
async fn test_slow_notification_does_not_block_result() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    seed_packages(&db_path, &["Pro"]).await;

    let repo: Arc<dyn LedgerRepository> = Arc::new(LedgerRepositoryImpl::from_connection(
        open_shared_connection(&db_path),
    ));
    let importer = CredentialImporterImpl::new(
        repo,
        MockConfig::with_notify_timeout(20_000),
        Arc::new(StaticPermissionChecker::for_role(Role::Operator)),
        Arc::new(SlowNotifier {
            delay: Duration::from_secs(30),
        }),
    );

    let started = Instant::now();
    let bytes = credential_csv(&[("a@x.com", "pw", "Pro", None)]);
    let result = importer
        .import_file(credential_request(bytes, "credentials.csv"))
        .await
        .unwrap();

    assert!(result.success);
    // 结果不等待通知超时
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_failed_notification_does_not_change_result() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    seed_packages(&db_path, &["Pro"]).await;

    let importer = create_importer_with(
        &db_path,
        Arc::new(StaticPermissionChecker::for_role(Role::Operator)),
        Arc::new(FailingNotifier),
    );

    let bytes = credential_csv(&[("a@x.com", "pw", "Pro", None)]);
    let result = importer
        .import_file(credential_request(bytes, "credentials.csv"))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.counts.succeeded, 1);
}
