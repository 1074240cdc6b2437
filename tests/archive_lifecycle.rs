//! End-to-end archive lifecycle: deposit, edit through the session area,
//! accumulate versions, then purge down to first and latest.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use depvault::{
    ContentType, DataExchange, FileKey, FileSource, FormatType, PathResolver, PurgeType,
    RetentionPolicy, SiteConfig, TaskDispatcher, VersionToken,
};
use std::path::Path;
use tempfile::TempDir;

fn test_config(root: &Path) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.storage.archive_root = root.join("archive");
    config.storage.deposit_root = root.join("deposit");
    config.storage.session_root = root.join("sessions");
    config.storage.workflow_root = root.join("workflow");
    config
}

#[tokio::test]
async fn deposit_edit_and_purge_cycle() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    config.validate().unwrap();

    let key = FileKey::new(
        "D_800042",
        ContentType::Model,
        FormatType::Pdbx,
        FileSource::Archive,
    );
    let exchange = DataExchange::new(&config);

    // Initial deposit lands as V1
    let upload = temp.path().join("uploaded_model.cif");
    std::fs::write(&upload, b"revision 1").unwrap();
    let v1 = exchange
        .export(&upload, &key, VersionToken::Next)
        .await
        .unwrap();
    assert!(v1.to_string_lossy().ends_with(".V1"));

    // Four rounds of annotation through the session area
    for round in 2..=5u32 {
        let session_copy = exchange.copy_to_session(&key).await.unwrap();
        std::fs::write(&session_copy, format!("revision {}", round)).unwrap();
        let archived = exchange.update_archive_from_session(&key).await.unwrap();
        assert!(archived.to_string_lossy().ends_with(&format!(".V{}", round)));
    }

    let resolver = PathResolver::new(&config);
    assert_eq!(resolver.latest_version(&key).unwrap(), Some(5));

    // Retention keeps only the baseline and the latest for experimental content
    let policy = RetentionPolicy::new(&config);
    let decision = policy.purge_candidates(&key, PurgeType::Experimental);
    assert_eq!(decision.latest_version, Some(5));
    assert_eq!(
        decision.remove.iter().map(|f| f.version).collect::<Vec<_>>(),
        vec![2, 3, 4]
    );

    let report = policy.apply(&key, &decision).await;
    assert_eq!(report.removed, 3);
    assert_eq!(report.failed, 0);

    let remaining = resolver.list_versions(&key).unwrap();
    assert_eq!(
        remaining.iter().map(|f| f.version).collect::<Vec<_>>(),
        vec![1, 5]
    );
    let latest = exchange.fetch(&key, VersionToken::Latest).await.unwrap();
    assert_eq!(std::fs::read(latest).unwrap(), b"revision 5");
}

#[tokio::test]
async fn batch_purge_report_over_many_depositions() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());

    // Seed ten depositions with three report versions each
    let resolver = PathResolver::new(&config);
    let mut keys = Vec::new();
    for i in 0..10u32 {
        let key = FileKey::new(
            format!("D_9{:05}", i),
            ContentType::ValidationReport,
            FormatType::Xml,
            FileSource::Archive,
        );
        let dir = resolver.directory_for(&key);
        std::fs::create_dir_all(&dir).unwrap();
        for v in 1..=3u32 {
            std::fs::write(dir.join(resolver.file_name(&key, Some(v))), b"report").unwrap();
        }
        keys.push(key);
    }

    // Fan the reporting pass out over a dispatcher batch
    let config_for_workers = config.clone();
    let dispatcher = TaskDispatcher::new(3);
    let results = dispatcher
        .run_multi(keys, move |chunk| {
            let policy = RetentionPolicy::new(&config_for_workers);
            chunk
                .iter()
                .map(|key| policy.purge_candidates(key, PurgeType::Other))
                .collect::<Vec<_>>()
        })
        .await;

    assert_eq!(results.len(), 3);
    let decisions: Vec<_> = results
        .into_iter()
        .flat_map(|r| r.outcome.unwrap())
        .collect();
    assert_eq!(decisions.len(), 10);
    for decision in &decisions {
        assert_eq!(decision.latest_version, Some(3));
        assert!(decision.remove.is_empty());
        assert_eq!(decision.compress.len(), 1);
        assert_eq!(decision.compress[0].version, 2);
    }
}
