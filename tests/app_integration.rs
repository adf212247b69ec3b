use rust_decimal::Decimal;
use std::fs;
use stockfolio::core::config::AppConfig;
use stockfolio::core::position::{TradeError, UserId};
use stockfolio::core::price::PriceSource;
use stockfolio::{App, AppCommand};
use tempfile::TempDir;
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server() -> MockServer {
        MockServer::start().await
    }

    pub async fn mount_function(server: &MockServer, function: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", function))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    pub const AAPL_QUOTE: &str = r#"{
        "Global Quote": {
            "01. symbol": "AAPL",
            "05. price": "189.8400",
            "08. previous close": "187.0000"
        }
    }"#;

    pub const AAPL_OVERVIEW: &str = r#"{
        "Symbol": "AAPL",
        "Name": "Apple Inc",
        "Description": "Apple Inc. designs, manufactures and markets smartphones.",
        "MarketCapitalization": "2950000000000",
        "Sector": "TECHNOLOGY",
        "Industry": "ELECTRONIC COMPUTERS",
        "OfficialSite": "None"
    }"#;
}

/// Temp config pointing at `base_url`, with its own data directory.
struct TestEnv {
    _dir: TempDir,
    config_path: String,
}

impl TestEnv {
    fn new(base_url: &str) -> Self {
        Self::with_settings(base_url, "")
    }

    /// Appends top-level YAML `settings` to the generated config.
    fn with_settings(base_url: &str, settings: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = dir.path().join("data");
        let config_path = dir.path().join("config.yaml");
        let config_content = format!(
            r#"
            user: "demo"
            providers:
              alpha_vantage:
                base_url: "{}"
                api_key: "test-key"
                min_interval_ms: 0
                timeout_secs: 2
            data_path: "{}"
            {}
            "#,
            base_url,
            data_path.display(),
            settings
        );
        fs::write(&config_path, config_content).expect("Failed to write config file");
        TestEnv {
            config_path: config_path.to_string_lossy().into_owned(),
            _dir: dir,
        }
    }

    async fn run(&self, command: AppCommand) -> anyhow::Result<()> {
        stockfolio::run_command(command, None, Some(&self.config_path)).await
    }

    fn app(&self) -> App {
        let config = AppConfig::load_from_path(&self.config_path).expect("Failed to load config");
        App::from_config(&config, None).expect("Failed to build app")
    }
}

fn trade(ticker: &str, operator: &str, price: Option<&str>) -> AppCommand {
    AppCommand::Trade {
        ticker: ticker.to_string(),
        operator: operator.to_string(),
        price: price.map(str::to_string),
    }
}

#[test_log::test(tokio::test)]
async fn test_buy_and_sell_flow_with_mock() {
    let server = test_utils::create_mock_server().await;
    test_utils::mount_function(&server, "GLOBAL_QUOTE", 200, test_utils::AAPL_QUOTE).await;
    let env = TestEnv::new(&server.uri());

    env.run(trade("aapl", "buy", None)).await.unwrap();
    env.run(trade("AAPL", "increase", Some("200.00"))).await.unwrap();
    env.run(trade("AAPL", "sell", None)).await.unwrap();
    env.run(AppCommand::Portfolio).await.unwrap();

    let app = env.app();
    let position = app
        .ledger
        .position(&UserId::new("demo"), "AAPL")
        .await
        .unwrap()
        .expect("position should be persisted");
    info!(?position, "Persisted position");
    assert_eq!(position.shares, 1);
    // (189.84 + 200.00) / 2
    assert_eq!(position.basis, Decimal::new(19492, 2));
}

#[test_log::test(tokio::test)]
async fn test_trade_rejections_surface_as_errors() {
    let server = test_utils::create_mock_server().await;
    let env = TestEnv::new(&server.uri());

    let err = env.run(trade("AAPL", "hold", None)).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TradeError>(),
        Some(TradeError::InvalidOperator(op)) if op == "hold"
    ));

    let err = env.run(trade("TSLA", "sell", None)).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TradeError>(),
        Some(TradeError::NoPosition { ticker }) if ticker == "TSLA"
    ));

    let err = env.run(trade("TSLA", "buy", Some("-1"))).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TradeError>(),
        Some(TradeError::InvalidAmount(_))
    ));
}

#[test_log::test(tokio::test)]
async fn test_quote_survives_upstream_outage() {
    let server = test_utils::create_mock_server().await;
    test_utils::mount_function(&server, "GLOBAL_QUOTE", 500, "").await;
    test_utils::mount_function(&server, "OVERVIEW", 500, "").await;
    let env = TestEnv::new(&server.uri());

    env.run(AppCommand::Quote {
        ticker: "AAPL".to_string(),
    })
    .await
    .unwrap();

    let app = env.app();
    let view =
        stockfolio::view::resolve_stock_view(&app.resolver, &app.ledger, &app.user, "AAPL").await;
    assert_eq!(view.price_source, PriceSource::Fallback);
    assert_eq!(view.current_price, Decimal::new(175, 0));
    assert_eq!(view.company_name, "Apple Inc.");
    assert_eq!(view.percent_text, "+0.00%");

    let unknown =
        stockfolio::view::resolve_stock_view(&app.resolver, &app.ledger, &app.user, "ZZZZ").await;
    assert_eq!(unknown.price_source, PriceSource::SyntheticDefault);
    assert_eq!(unknown.current_price, Decimal::ONE_HUNDRED);
}

#[test_log::test(tokio::test)]
async fn test_rate_limited_quote_and_live_profile() {
    let server = test_utils::create_mock_server().await;
    test_utils::mount_function(
        &server,
        "GLOBAL_QUOTE",
        200,
        r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#,
    )
    .await;
    test_utils::mount_function(&server, "OVERVIEW", 200, test_utils::AAPL_OVERVIEW).await;
    let env = TestEnv::new(&server.uri());

    let app = env.app();
    let view =
        stockfolio::view::resolve_stock_view(&app.resolver, &app.ledger, &app.user, "aapl").await;
    assert_eq!(view.price_source, PriceSource::Fallback);
    assert_eq!(view.company_name, "Apple Inc");
    assert_eq!(view.sector, "TECHNOLOGY");
    // "None" upstream, completed from the fallback catalog
    assert_eq!(view.homepage_url, "https://www.apple.com");
}

#[test_log::test(tokio::test)]
async fn test_balance_and_watchlist_commands() {
    let server = test_utils::create_mock_server().await;
    let env = TestEnv::new(&server.uri());

    env.run(AppCommand::Balance {
        amount: "25000".to_string(),
        operator: "add".to_string(),
    })
    .await
    .unwrap();
    env.run(AppCommand::Balance {
        amount: "175.50".to_string(),
        operator: "subtract".to_string(),
    })
    .await
    .unwrap();
    let err = env
        .run(AppCommand::Balance {
            amount: "ten".to_string(),
            operator: "add".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TradeError>(),
        Some(TradeError::InvalidAmount(_))
    ));

    for ticker in ["msft", "NVDA", "MSFT"] {
        env.run(AppCommand::Watch {
            ticker: ticker.to_string(),
        })
        .await
        .unwrap();
    }
    env.run(AppCommand::Watchlist).await.unwrap();

    let app = env.app();
    let user = UserId::new("demo");
    assert_eq!(
        app.accounts.account(&user).await.unwrap().cash_balance,
        Decimal::new(2482450, 2)
    );
    assert_eq!(app.accounts.watchlist(&user).await.unwrap(), vec!["MSFT", "NVDA"]);
}

#[test_log::test(tokio::test)]
async fn test_non_positive_default_price_is_rejected_at_startup() {
    let server = test_utils::create_mock_server().await;
    let env = TestEnv::with_settings(&server.uri(), "default_price: 0");

    let err = env
        .run(AppCommand::Quote {
            ticker: "ZZZZ".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("default_price"), "{err}");
}

#[test_log::test(tokio::test)]
async fn test_sub_cent_explicit_price_is_rejected() {
    let server = test_utils::create_mock_server().await;
    let env = TestEnv::new(&server.uri());

    let err = env.run(trade("PENNY", "buy", Some("0.004"))).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TradeError>(),
        Some(TradeError::InvalidAmount(_))
    ));

    let app = env.app();
    assert!(
        app.ledger
            .position(&UserId::new("demo"), "PENNY")
            .await
            .unwrap()
            .is_none()
    );
}
