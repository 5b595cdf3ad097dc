use super::common::*;
use crate::sorting::{ErrorKind, ImageUpload, SortingOutcome, SortingResult};
use crate::telemetry::capture::CapturedLines;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test]
async fn successful_request_returns_guidance() {
    let (service, verifier, analyzer) =
        build_service(VerifierScript::Accept, AnalyzerScript::Html("<h2>Restmüll</h2>"));

    let outcome = service
        .process(sorting_request("10115", "token-123", "de"), far_deadline())
        .await;

    assert_eq!(
        outcome,
        SortingOutcome::Sorted {
            html: "<h2>Restmüll</h2>".to_string()
        }
    );
    assert_eq!(verifier.tokens(), vec!["token-123".to_string()]);

    let recorded = analyzer.requests();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].postal_code, "10115");
    assert_eq!(recorded[0].language_code, "de");
    assert_eq!(recorded[0].language_name, "German");
    assert_eq!(recorded[0].declared_content_type, "image/jpeg");
    assert_eq!(recorded[0].image, jpeg_bytes());
}

#[tokio::test]
async fn missing_fields_short_circuit_before_validation() {
    for (postal_code, token) in [("", "token"), ("10115", ""), ("", "")] {
        let (service, verifier, analyzer) =
            build_service(VerifierScript::Accept, AnalyzerScript::Html("<p>ok</p>"));

        let outcome = service
            .process(sorting_request(postal_code, token, "fr"), far_deadline())
            .await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::MissingFields));
        assert_eq!(
            outcome.into_result(),
            SortingResult::failure("Champs requis manquants")
        );
        assert_eq!(verifier.calls(), 0);
        assert_eq!(analyzer.calls(), 0);
    }
}

#[tokio::test]
async fn missing_fields_win_over_invalid_postal_code() {
    let (service, _, _) = build_service(VerifierScript::Accept, AnalyzerScript::Html("<p/>"));

    let outcome = service
        .process(sorting_request("999", "", "en"), far_deadline())
        .await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::MissingFields));
}

#[tokio::test]
async fn invalid_postal_code_makes_no_external_calls() {
    let (service, verifier, analyzer) =
        build_service(VerifierScript::Accept, AnalyzerScript::Html("<p>ok</p>"));

    let outcome = service
        .process(sorting_request("999", "token", "en"), far_deadline())
        .await;

    assert_eq!(
        outcome.into_result(),
        SortingResult::failure("Invalid German postal code")
    );
    assert_eq!(verifier.calls(), 0);
    assert_eq!(analyzer.calls(), 0);
}

#[tokio::test]
async fn invalid_or_absent_images_are_rejected_before_verification() {
    let uploads = [
        None,
        Some(ImageUpload {
            bytes: jpeg_bytes(),
            declared_content_type: Some("image/svg+xml".to_string()),
            file_name: Some("logo.svg".to_string()),
        }),
        Some(ImageUpload {
            bytes: jpeg_bytes(),
            declared_content_type: Some("IMAGE/JPEG".to_string()),
            file_name: Some("shout.jpg".to_string()),
        }),
        Some(ImageUpload {
            bytes: jpeg_bytes(),
            declared_content_type: None,
            file_name: Some("untyped".to_string()),
        }),
        Some(ImageUpload {
            bytes: Vec::new(),
            declared_content_type: Some("image/png".to_string()),
            file_name: Some("empty.png".to_string()),
        }),
    ];

    for image in uploads {
        let (service, verifier, analyzer) =
            build_service(VerifierScript::Accept, AnalyzerScript::Html("<p>ok</p>"));
        let mut request = sorting_request("10115", "token", "it");
        request.image = image;

        let outcome = service.process(request, far_deadline()).await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidImage));
        assert_eq!(
            outcome.into_result(),
            SortingResult::failure("File immagine non valido")
        );
        assert_eq!(verifier.calls(), 0);
        assert_eq!(analyzer.calls(), 0);
    }
}

#[tokio::test]
async fn verification_rejections_and_failures_share_one_message() {
    for script in [
        VerifierScript::Reject,
        VerifierScript::Fail,
        VerifierScript::Misconfigured,
    ] {
        let (service, verifier, analyzer) =
            build_service(script, AnalyzerScript::Html("<p>ok</p>"));

        let outcome = service
            .process(sorting_request("10115", "token", "en"), far_deadline())
            .await;

        assert_eq!(
            outcome.into_result(),
            SortingResult::failure("reCAPTCHA verification failed")
        );
        assert_eq!(verifier.calls(), 1);
        assert_eq!(analyzer.calls(), 0, "{script:?} must not reach analysis");
    }
}

#[tokio::test]
async fn analysis_failures_surface_as_processing_error() {
    for script in [AnalyzerScript::Empty, AnalyzerScript::Fail] {
        let (service, _, analyzer) = build_service(VerifierScript::Accept, script);

        let outcome = service
            .process(sorting_request("10115", "token", "tr"), far_deadline())
            .await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::ProcessingError));
        assert_eq!(
            outcome.into_result(),
            SortingResult::failure("İsteğinizi işleme hatası")
        );
        assert_eq!(analyzer.calls(), 1, "no retries are attempted");
    }
}

#[tokio::test]
async fn elapsed_deadline_aborts_the_analysis_call() {
    let (service, _, analyzer) = build_service(VerifierScript::Accept, AnalyzerScript::Hang);
    let deadline = Instant::now() + Duration::from_millis(50);

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        service.process(sorting_request("10115", "token", "en"), deadline),
    )
    .await
    .expect("pipeline honours its deadline");

    assert_eq!(outcome.error_kind(), Some(ErrorKind::ProcessingError));
    assert_eq!(analyzer.calls(), 1);
}

#[tokio::test]
async fn elapsed_deadline_aborts_the_verification_call() {
    let (service, verifier, analyzer) =
        build_service(VerifierScript::Hang, AnalyzerScript::Html("<p/>"));
    let deadline = Instant::now() + Duration::from_millis(50);

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        service.process(sorting_request("10115", "token", "fr"), deadline),
    )
    .await
    .expect("pipeline honours its deadline");

    assert_eq!(outcome.error_kind(), Some(ErrorKind::RecaptchaFailed));
    assert_eq!(verifier.calls(), 1);
    assert_eq!(analyzer.calls(), 0);
}

#[tokio::test]
async fn rejected_image_type_is_logged_with_its_file_name() {
    let (service, verifier, _) =
        build_service(VerifierScript::Accept, AnalyzerScript::Html("<p/>"));
    let mut request = sorting_request("10115", "token", "en");
    request.image = Some(ImageUpload {
        bytes: b"<svg/>".to_vec(),
        declared_content_type: Some("image/svg+xml".to_string()),
        file_name: Some("logo.svg".to_string()),
    });

    let captured = CapturedLines::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(captured.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let outcome = service.process(request, far_deadline()).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidImage));
    assert_eq!(verifier.calls(), 0);
    let logs = captured.text();
    assert!(logs.contains("image type not accepted"), "logs: {logs}");
    assert!(logs.contains("logo.svg"), "logs: {logs}");
    assert!(logs.contains("image/svg+xml"), "logs: {logs}");
}

#[tokio::test]
async fn unsupported_language_behaves_like_english() {
    let (service, _, _) = build_service(VerifierScript::Reject, AnalyzerScript::Html("<p/>"));
    let (english, _, _) = build_service(VerifierScript::Reject, AnalyzerScript::Html("<p/>"));

    let unsupported = service
        .process(sorting_request("10115", "token", "pt"), far_deadline())
        .await;
    let reference = english
        .process(sorting_request("10115", "token", "en"), far_deadline())
        .await;

    assert_eq!(unsupported, reference);
    assert!(matches!(
        unsupported,
        SortingOutcome::Rejected { language: "en", .. }
    ));
}

#[tokio::test]
async fn unsupported_language_is_forwarded_as_english() {
    let (service, _, analyzer) =
        build_service(VerifierScript::Accept, AnalyzerScript::Html("<p>ok</p>"));

    let outcome = service
        .process(sorting_request("10115", "token", ""), far_deadline())
        .await;

    assert!(outcome.is_success());
    let recorded = analyzer.requests();
    assert_eq!(recorded[0].language_code, "en");
    assert_eq!(recorded[0].language_name, "English");
}
