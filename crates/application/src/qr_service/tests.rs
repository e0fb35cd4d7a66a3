use std::sync::Arc;

use herbarium_core::{AppError, UserRole};
use herbarium_domain::{AuditTargetType, QrResolution, QrStatus};

use crate::test_support::{FakeRenderer, FakeStore, request, wire};

use super::{QrOptions, QrService};

fn build_service(store: &Arc<FakeStore>) -> QrService {
    let (authorization_service, audit_logger) = wire(store);
    QrService::new(
        store.clone(),
        store.clone(),
        Arc::new(FakeRenderer),
        authorization_service,
        audit_logger,
        "https://herbario.example/",
    )
}

#[tokio::test]
async fn generation_reuses_the_active_label() {
    let store = FakeStore::shared();
    let curator = store.seed_user(UserRole::Curator).await;
    let specimen = store.seed_specimen(None, true).await;
    let service = build_service(&store);

    let first = service
        .generate_for_specimen(&curator, &request(), specimen.specimen_id, QrOptions::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    let again = service
        .generate_for_specimen(
            &curator,
            &request(),
            specimen.specimen_id,
            QrOptions {
                resolution: QrResolution::Print,
                ..QrOptions::default()
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(first.qr_id, again.qr_id);
    assert_eq!(first.version, 1);
    assert_eq!(first.status, QrStatus::Active);
    assert_eq!(
        first.url,
        format!(
            "https://herbario.example/herbario/specimen/{}",
            specimen.specimen_id
        )
    );
    assert_eq!(first.checksum.len(), 64);

    let entries = store.audit_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].target.target_type, AuditTargetType::QrCode);
}

#[tokio::test]
async fn regeneration_supersedes_the_current_version() {
    let store = FakeStore::shared();
    let curator = store.seed_user(UserRole::Curator).await;
    let specimen = store.seed_specimen(None, true).await;
    let service = build_service(&store);

    let original = service
        .generate_for_specimen(&curator, &request(), specimen.specimen_id, QrOptions::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    let replacement = service
        .regenerate(&curator, &request(), original.qr_id, QrOptions::default())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(replacement.version, 2);
    assert_eq!(replacement.status, QrStatus::Draft);

    let versions = service
        .list_for_specimen(&curator, specimen.specimen_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].qr_id, replacement.qr_id);
    assert!(versions[1].is_obsolete);
    assert_eq!(versions[1].status, QrStatus::Inactive);

    let twice = service
        .regenerate(&curator, &request(), original.qr_id, QrOptions::default())
        .await;
    assert!(matches!(twice, Err(AppError::Validation(_))));

    let reactivated = service
        .activate(&curator, &request(), original.qr_id)
        .await;
    assert!(matches!(reactivated, Err(AppError::Validation(_))));

    let activated = service
        .activate(&curator, &request(), replacement.qr_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(activated.status, QrStatus::Active);
}

#[tokio::test]
async fn second_active_label_conflicts() {
    let store = FakeStore::shared();
    let curator = store.seed_user(UserRole::Curator).await;
    let specimen = store.seed_specimen(None, true).await;
    let service = build_service(&store);

    let first = service
        .generate_for_specimen(&curator, &request(), specimen.specimen_id, QrOptions::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    service
        .deactivate(&curator, &request(), first.qr_id)
        .await
        .unwrap_or_else(|_| unreachable!());

    let second = service
        .generate_for_specimen(&curator, &request(), specimen.specimen_id, QrOptions::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(second.version, 2);

    let reactivated = service.activate(&curator, &request(), first.qr_id).await;
    assert!(matches!(reactivated, Err(AppError::Conflict(_))));

    let deprecated = service
        .deprecate(&curator, &request(), second.qr_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(deprecated.status, QrStatus::Deprecated);
    let revived = service.activate(&curator, &request(), second.qr_id).await;
    assert!(matches!(revived, Err(AppError::Validation(_))));

    service
        .activate(&curator, &request(), first.qr_id)
        .await
        .unwrap_or_else(|_| unreachable!());
}

#[tokio::test]
async fn download_counts_and_names_the_file_after_the_code() {
    let store = FakeStore::shared();
    let curator = store.seed_user(UserRole::Curator).await;
    let specimen = store.seed_specimen(None, true).await;
    let service = build_service(&store);

    let qr = service
        .generate_for_specimen(&curator, &request(), specimen.specimen_id, QrOptions::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    let download = service
        .download(&curator, qr.qr_id)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(download.filename, "QR_CHEP-0000001_v1.png");
    assert!(download.png.starts_with(b"png:https://herbario.example/"));
    assert!(download.png.ends_with(b":H:600:4"));

    let versions = service
        .list_for_specimen(&curator, specimen.specimen_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(versions[0].download_count, 1);
}

#[tokio::test]
async fn scans_are_recorded_only_for_an_active_label() {
    let store = FakeStore::shared();
    let curator = store.seed_user(UserRole::Curator).await;
    let specimen = store.seed_specimen(None, true).await;
    let service = build_service(&store);

    service
        .register_scan_for_specimen(specimen.specimen_id, &request(), None)
        .await
        .unwrap_or_else(|_| unreachable!());

    let qr = service
        .generate_for_specimen(&curator, &request(), specimen.specimen_id, QrOptions::default())
        .await
        .unwrap_or_else(|_| unreachable!());
    service
        .register_scan_for_specimen(specimen.specimen_id, &request(), Some(&curator))
        .await
        .unwrap_or_else(|_| unreachable!());

    let scans = service
        .list_scans(&curator, qr.qr_id, 10)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].ip_address.as_deref(), Some("10.0.0.8"));
    assert_eq!(scans[0].user_subject.as_deref(), Some(curator.subject()));
}

#[tokio::test]
async fn readers_cannot_generate_and_borders_are_bounded() {
    let store = FakeStore::shared();
    let curator = store.seed_user(UserRole::Curator).await;
    let reader = store.seed_user(UserRole::User).await;
    let specimen = store.seed_specimen(None, true).await;
    let service = build_service(&store);

    let forbidden = service
        .generate_for_specimen(&reader, &request(), specimen.specimen_id, QrOptions::default())
        .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    let wide = service
        .generate_for_specimen(
            &curator,
            &request(),
            specimen.specimen_id,
            QrOptions {
                border: 40,
                ..QrOptions::default()
            },
        )
        .await;
    assert!(matches!(wide, Err(AppError::Validation(_))));
}
