//! Registry lookup policy tests against a mock npm registry.

mod common;

use depconf::registry::NpmChecker;
use depconf::RegistryVerdict;

async fn checker(max_retries: u32) -> (NpmChecker, common::Hits) {
    let (registry_url, hits) = common::spawn_registry().await;
    let mut config = common::test_config("http://127.0.0.1:9", &registry_url);
    config.http.max_retries = max_retries;
    (NpmChecker::new(&config).unwrap(), hits)
}

#[tokio::test]
async fn test_existing_package() {
    let (checker, _) = checker(0).await;

    let verdict = checker.check_package("lodash").await;
    assert_eq!(
        verdict,
        RegistryVerdict::Exists {
            name: "lodash".to_string(),
            latest_version: Some("4.17.21".to_string()),
        }
    );
    assert!(verdict.exists());
}

#[tokio::test]
async fn test_scoped_name_is_appended_verbatim() {
    let (checker, hits) = checker(0).await;

    let verdict = checker.check_package("@scope/thing").await;
    assert_eq!(verdict.latest_version(), Some("1.0.0"));
    assert_eq!(hits.count("@scope/thing"), 1);
}

#[tokio::test]
async fn test_latest_from_versions_map() {
    let (checker, _) = checker(0).await;

    let verdict = checker.check_package("no-dist-tags").await;
    assert_eq!(verdict.latest_version(), Some("0.9.0"));
}

#[tokio::test]
async fn test_unparseable_body_still_exists() {
    let (checker, _) = checker(0).await;

    let verdict = checker.check_package("broken-json").await;
    assert!(matches!(
        verdict,
        RegistryVerdict::Exists {
            latest_version: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_missing_package() {
    let (checker, _) = checker(0).await;

    let verdict = checker.check_package("left-pad-typo-xyz").await;
    assert_eq!(
        verdict,
        RegistryVerdict::NotFound {
            name: "left-pad-typo-xyz".to_string()
        }
    );
    assert!(!verdict.exists());
}

#[tokio::test]
async fn test_timeout_is_treated_as_existing() {
    let (checker, _) = checker(0).await;

    let verdict = checker.check_package("flaky-pkg").await;
    assert!(verdict.is_uncertain());
    assert!(verdict.exists());
    assert_eq!(verdict.latest_version(), None);
}

#[tokio::test]
async fn test_other_statuses_are_treated_as_existing() {
    let (checker, _) = checker(0).await;

    for name in ["rate-limited", "server-error"] {
        let verdict = checker.check_package(name).await;
        assert!(verdict.is_uncertain(), "{name}");
        assert!(verdict.exists(), "{name}");
    }
}

#[tokio::test]
async fn test_unreachable_registry_is_treated_as_existing() {
    let config = common::test_config("http://127.0.0.1:9", "http://127.0.0.1:9/");
    let checker = NpmChecker::new(&config).unwrap();

    let verdict = checker.check_package("anything").await;
    assert!(verdict.is_uncertain());
    assert!(verdict.exists());
}

#[tokio::test]
async fn test_single_attempt_by_default() {
    let (checker, hits) = checker(0).await;

    let verdict = checker.check_package("recovering-pkg").await;
    assert!(verdict.is_uncertain());
    assert_eq!(hits.count("recovering-pkg"), 1);
}

#[tokio::test]
async fn test_uncertain_lookup_is_retried() {
    let (checker, hits) = checker(2).await;

    let verdict = checker.check_package("recovering-pkg").await;
    assert_eq!(verdict.latest_version(), Some("2.0.0"));
    assert_eq!(hits.count("recovering-pkg"), 2);
}

#[tokio::test]
async fn test_not_found_is_never_retried() {
    let (checker, hits) = checker(3).await;

    let verdict = checker.check_package("missing-pkg").await;
    assert!(!verdict.exists());
    assert_eq!(hits.count("missing-pkg"), 1);
}
