use ratekeeper::core::config::AppConfig;
use ratekeeper::sync::{Scheduler, StepError};
use ratekeeper::{AppCommand, build_service, load_config, open_store, run_command};
use std::fs;
use std::time::Duration;
use tracing::info;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod test_utils {
    use super::*;

    pub fn quote_body(ask: f64) -> String {
        format!(
            r#"[{{
                "topo": {{"platform": "SwissquoteLtd", "server": "Live5"}},
                "spreadProfilePrices": [
                    {{"spreadProfile": "prime", "bidSpread": 0.6, "askSpread": 0.6,
                      "bid": {bid}, "ask": {ask}}},
                    {{"spreadProfile": "standard", "bidSpread": 1.0, "askSpread": 1.0,
                      "bid": {bid}, "ask": {wide}}}
                ],
                "ts": 1733150000000
            }}]"#,
            bid = ask - 0.5,
            wide = ask + 1.0
        )
    }

    pub const RATE_TABLE: &str = r#"{
        "success": true,
        "timestamp": 1733150000,
        "base": "USD",
        "rates": {"USD": 1, "EUR": 0.92, "GBP": 0.79, "JPY": 151.3, "XYZ": "bad"}
    }"#;

    pub async fn mount_quote(server: &MockServer, instrument: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/public-quotes/bboquotes/instrument/{instrument}/USD"
            )))
            .respond_with(response)
            .mount(server)
            .await;
    }

    pub async fn mount_rates(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    /// Writes a config pointing both providers at `server` and the store under `dir`.
    pub fn write_config(dir: &std::path::Path, server: &MockServer) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let content = format!(
            r#"
providers:
  swissquote:
    base_url: {uri}
    timeout_secs: 1
  fxrates:
    base_url: {uri}
    timeout_secs: 1
retention_days: 30
data_path: {data}
"#,
            uri = server.uri(),
            data = dir.join("store").display()
        );
        fs::write(&config_path, content).expect("Failed to write config file");
        config_path
    }
}

#[test_log::test(tokio::test)]
async fn test_seed_then_sync_updates_store() {
    let server = MockServer::start().await;
    test_utils::mount_quote(
        &server,
        "XAU",
        ResponseTemplate::new(200).set_body_string(test_utils::quote_body(2650.25)),
    )
    .await;
    test_utils::mount_quote(
        &server,
        "XAG",
        ResponseTemplate::new(200).set_body_string(test_utils::quote_body(31.5)),
    )
    .await;
    test_utils::mount_rates(
        &server,
        ResponseTemplate::new(200).set_body_string(test_utils::RATE_TABLE),
    )
    .await;

    let mut config = AppConfig::default();
    config.providers.swissquote.base_url = server.uri();
    config.providers.fxrates.base_url = server.uri();

    let service = build_service(&config, open_store(&config, true).unwrap()).unwrap();

    let report = service.seed().await.unwrap();
    info!(?report, "Seeded store");
    assert!(report.success);
    assert_eq!(report.live_rates, 4);

    let outcome = service.run_cycle().await;
    assert!(outcome.success, "cycle failed: {outcome:?}");
    assert_eq!(outcome.gold, Ok(2650.25));
    let currencies = outcome.currencies.clone().unwrap();
    assert_eq!(currencies.updated, 4);
    assert_eq!(currencies.skipped, 0);

    let snapshot = service.repository().snapshot().await.unwrap();
    assert_eq!(snapshot.last_fetch_time, Some(outcome.fetched_at));
    assert_eq!(snapshot.metals.len(), 2);
    let silver = snapshot.metals.iter().find(|m| m.name == "silver").unwrap();
    assert_eq!(silver.price_usd, 31.5);
    let eur = snapshot.currencies.iter().find(|c| c.code == "EUR").unwrap();
    assert_eq!(eur.rate_to_usd, 0.92);

    let log = service.repository().fetch_log().await.unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|entry| entry.success));
    assert_eq!(log[1].metals_source, "swissquote");
    assert_eq!(log[1].currency_source, "fxratesapi");
}

#[test_log::test(tokio::test)]
async fn test_partial_failure_keeps_previous_values() {
    let healthy = MockServer::start().await;
    test_utils::mount_quote(
        &healthy,
        "XAU",
        ResponseTemplate::new(200).set_body_string(test_utils::quote_body(2600.0)),
    )
    .await;
    test_utils::mount_quote(
        &healthy,
        "XAG",
        ResponseTemplate::new(200).set_body_string(test_utils::quote_body(29.0)),
    )
    .await;
    test_utils::mount_rates(
        &healthy,
        ResponseTemplate::new(200).set_body_string(test_utils::RATE_TABLE),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = load_config(Some(
        test_utils::write_config(dir.path(), &healthy).to_str().unwrap(),
    ))
    .unwrap();
    let store = open_store(&config, true).unwrap();
    build_service(&config, store.clone())
        .unwrap()
        .seed()
        .await
        .unwrap();

    // Gold is down, silver moved and the rate table hangs past its deadline
    let flaky = MockServer::start().await;
    test_utils::mount_quote(&flaky, "XAU", ResponseTemplate::new(502)).await;
    test_utils::mount_quote(
        &flaky,
        "XAG",
        ResponseTemplate::new(200).set_body_string(test_utils::quote_body(31.5)),
    )
    .await;
    test_utils::mount_rates(
        &flaky,
        ResponseTemplate::new(200)
            .set_body_string(test_utils::RATE_TABLE)
            .set_delay(Duration::from_millis(1500)),
    )
    .await;
    config.providers.swissquote.base_url = flaky.uri();
    config.providers.fxrates.base_url = flaky.uri();
    let service = build_service(&config, store).unwrap();

    let outcome = service.run_cycle().await;
    assert!(!outcome.success);
    assert!(matches!(outcome.gold, Err(StepError::Fetch(_))));
    assert_eq!(outcome.silver, Ok(31.5));
    assert!(matches!(outcome.currencies, Err(StepError::Fetch(_))));

    let repo = service.repository();
    assert_eq!(
        repo.metal_by_name("gold").await.unwrap().unwrap().price_usd,
        2600.0
    );
    assert_eq!(
        repo.metal_by_name("silver").await.unwrap().unwrap().price_usd,
        31.5
    );
    assert_eq!(
        repo.currency_by_code("EUR").await.unwrap().unwrap().rate_to_usd,
        0.92
    );

    let log = repo.fetch_log().await.unwrap();
    assert_eq!(log.len(), 2);
    assert!(log[0].success);
    assert!(!log[1].success);
}

#[test_log::test(tokio::test)]
async fn test_commands_share_the_disk_store() {
    let server = MockServer::start().await;
    test_utils::mount_quote(
        &server,
        "XAU",
        ResponseTemplate::new(200).set_body_string(test_utils::quote_body(2700.0)),
    )
    .await;
    test_utils::mount_quote(
        &server,
        "XAG",
        ResponseTemplate::new(200).set_body_string(test_utils::quote_body(32.0)),
    )
    .await;
    test_utils::mount_rates(
        &server,
        ResponseTemplate::new(200).set_body_string(test_utils::RATE_TABLE),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = test_utils::write_config(dir.path(), &server);
    let config_path = config_path.to_str().unwrap();

    for command in [
        AppCommand::Seed,
        AppCommand::Sync,
        AppCommand::Snapshot { json: true },
    ] {
        let result = run_command(command, Some(config_path), false).await;
        assert!(result.is_ok(), "Command failed with: {:?}", result.err());
    }

    let config = load_config(Some(config_path)).unwrap();
    let service = build_service(&config, open_store(&config, false).unwrap()).unwrap();
    let snapshot = service.repository().snapshot().await.unwrap();
    assert!(snapshot.last_fetch_time.is_some());
    assert_eq!(
        snapshot
            .metals
            .iter()
            .find(|m| m.name == "gold")
            .unwrap()
            .price_usd,
        2700.0
    );
    assert_eq!(service.repository().fetch_log().await.unwrap().len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_sync_command_fails_when_a_provider_fails() {
    let server = MockServer::start().await;
    test_utils::mount_quote(&server, "XAU", ResponseTemplate::new(500)).await;
    test_utils::mount_quote(&server, "XAG", ResponseTemplate::new(500)).await;
    test_utils::mount_rates(&server, ResponseTemplate::new(500)).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = test_utils::write_config(dir.path(), &server);

    let result = run_command(AppCommand::Sync, config_path.to_str(), true).await;
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("finished with failures")
    );
}

#[test_log::test(tokio::test)]
async fn test_manual_refresh_runs_a_cycle() {
    let server = MockServer::start().await;
    test_utils::mount_quote(
        &server,
        "XAU",
        ResponseTemplate::new(200).set_body_string(test_utils::quote_body(2610.0)),
    )
    .await;
    test_utils::mount_quote(
        &server,
        "XAG",
        ResponseTemplate::new(200).set_body_string(test_utils::quote_body(30.5)),
    )
    .await;
    test_utils::mount_rates(
        &server,
        ResponseTemplate::new(200).set_body_string(test_utils::RATE_TABLE),
    )
    .await;

    let mut config = AppConfig::default();
    config.providers.swissquote.base_url = server.uri();
    config.providers.fxrates.base_url = server.uri();
    let service = build_service(&config, open_store(&config, true).unwrap()).unwrap();

    let (handle, worker) = Scheduler::new(service.clone(), config.schedule)
        .unwrap()
        .spawn();
    assert!(handle.refresh_now().scheduled);

    tokio::time::timeout(Duration::from_secs(10), async {
        while service.repository().fetch_log().await.unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("manual refresh never ran");

    // Nothing was seeded, so only the metals exist afterwards
    let snapshot = service.repository().snapshot().await.unwrap();
    assert_eq!(snapshot.metals.len(), 2);
    assert!(snapshot.currencies.is_empty());

    drop(handle);
    worker.await.unwrap();
}
