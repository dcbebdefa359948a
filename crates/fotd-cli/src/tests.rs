use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

use fotd_coordinator::FlavorCoordinator;
use fotd_core::{ProviderConfig, UpdateInterval};
use fotd_providers::{build_shared_client, create_provider};

use super::*;

#[test]
fn parses_flavor_command() {
    let cli = Cli::try_parse_from(["fotd", "flavor", "culvers", "madison-wi-mineral-point-rd"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Flavor {
            provider: ProviderId::Culvers,
            ref location_id,
            ..
        } if location_id == "madison-wi-mineral-point-rd"
    ));
}

#[test]
fn provider_names_are_case_insensitive() {
    let cli = Cli::try_parse_from(["fotd", "check", "Kopps", "kopps-glendale"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Check {
            provider: ProviderId::Kopps,
            ..
        }
    ));
}

#[test]
fn unknown_provider_is_rejected_at_parse_time() {
    let err = Cli::try_parse_from(["fotd", "flavor", "dairy-queen", "x"]).unwrap_err();
    assert!(err.to_string().contains("dairy-queen"), "got: {err}");
}

#[test]
fn search_term_defaults_to_empty_with_optional_state() {
    let cli = Cli::try_parse_from(["fotd", "search", "goodberrys", "--state", "NC"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Search {
            provider: ProviderId::Goodberrys,
            ref term,
            state: Some(ref s),
            ..
        } if term.is_empty() && s == "NC"
    ));
}

#[test]
fn upcoming_days_defaults_to_a_week() {
    let cli = Cli::try_parse_from(["fotd", "upcoming", "oscars", "oscars-franklin"]).unwrap();
    assert!(matches!(cli.command, Commands::Upcoming { days: 7, .. }));

    let cli =
        Cli::try_parse_from(["fotd", "upcoming", "oscars", "oscars-franklin", "--days", "3"])
            .unwrap();
    assert!(matches!(cli.command, Commands::Upcoming { days: 3, .. }));
}

#[test]
fn repeated_options_are_collected() {
    let cli = Cli::try_parse_from([
        "fotd",
        "location",
        "leducs",
        "leducs-wales",
        "-o",
        "base_url=http://localhost:8080",
        "--option",
        "max_attempts=1",
    ])
    .unwrap();
    let Commands::Location { options, .. } = cli.command else {
        panic!("expected location command");
    };
    let config = lookup::parse_options(&options).unwrap();
    assert_eq!(config.get_str("base_url").unwrap(), Some("http://localhost:8080"));
    assert_eq!(config.get_u64("max_attempts").unwrap(), Some(1));
}

#[test]
fn malformed_option_is_an_error() {
    assert!(lookup::parse_options(&["base_url".to_string()]).is_err());
    assert!(lookup::parse_options(&["=x".to_string()]).is_err());
}

#[test]
fn short_search_terms_need_a_fixed_catalog() {
    assert!(lookup::check_search_term("m", false).is_err());
    assert!(lookup::check_search_term("  ", false).is_err());
    assert!(lookup::check_search_term("ma", false).is_ok());
    assert!(lookup::check_search_term("", true).is_ok());
}

#[test]
fn watch_accepts_stores_override() {
    let cli = Cli::try_parse_from(["fotd", "watch", "--stores", "/etc/fotd/stores.yaml"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Watch { stores: Some(ref p) } if p == &PathBuf::from("/etc/fotd/stores.yaml")
    ));
}

fn kopps_coordinator(options: ProviderConfig, shutdown: &CancellationToken) -> FlavorCoordinator {
    let client = build_shared_client("fotd-test", 10, 10).expect("client builds");
    let provider = create_provider(ProviderId::Kopps, client, options);
    FlavorCoordinator::new(provider, "kopps-greenfield", UpdateInterval::default(), shutdown)
}

#[tokio::test]
async fn stop_signal_interrupts_a_slow_first_refresh() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let shutdown = CancellationToken::new();
    let options = ProviderConfig::new()
        .with("base_url", server.uri())
        .with("min_request_interval_ms", 0);
    let coordinator = kopps_coordinator(options, &shutdown);

    let started = Instant::now();
    let stop = tokio::time::sleep(Duration::from_millis(100));
    let completed = watch::first_refresh_all(std::slice::from_ref(&coordinator), stop).await;

    assert!(!completed, "stop signal should win over a 30s response");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!coordinator.snapshot().has_data());
    shutdown.cancel();
}

#[tokio::test]
async fn first_refresh_finishes_without_a_stop_signal() {
    let shutdown = CancellationToken::new();
    let coordinator =
        kopps_coordinator(ProviderConfig::new().with("max_attempts", "lots"), &shutdown);

    let completed =
        watch::first_refresh_all(std::slice::from_ref(&coordinator), std::future::pending()).await;

    assert!(completed);
    assert!(coordinator.snapshot().last_error.is_some());
}
