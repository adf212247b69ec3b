use super::ui;
use crate::App;
use crate::core::position::{Account, Position};
use crate::core::price::ResolvedPrice;
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;
use rust_decimal::Decimal;

/// A position valued at its resolved price.
pub struct Holding {
    pub position: Position,
    pub price: ResolvedPrice,
}

impl Holding {
    pub fn market_value(&self) -> Decimal {
        self.position.market_value(self.price.price)
    }

    pub fn unrealized_gain(&self) -> Decimal {
        self.position.unrealized_gain(self.price.price)
    }
}

pub struct PortfolioValue {
    pub user: String,
    pub holdings: Vec<Holding>,
    pub cash_balance: Decimal,
}

impl PortfolioValue {
    pub fn total_value(&self) -> Decimal {
        self.holdings
            .iter()
            .map(Holding::market_value)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn total_gain(&self) -> Decimal {
        self.holdings
            .iter()
            .map(Holding::unrealized_gain)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn display_as_table(&self) -> String {
        let mut output = format!(
            "Portfolio: {}\n\n",
            ui::style_text(&self.user, ui::StyleType::Title)
        );

        if self.holdings.is_empty() {
            output.push_str(&ui::style_text("No positions yet", ui::StyleType::Subtle));
        } else {
            let mut table = ui::new_styled_table();
            table.set_header(vec![
                ui::header_cell("Ticker"),
                ui::header_cell("Shares"),
                ui::header_cell("Basis"),
                ui::header_cell("Price"),
                ui::header_cell("Value"),
                ui::header_cell("Gain"),
                ui::header_cell("Source"),
            ]);

            for holding in &self.holdings {
                table.add_row(vec![
                    Cell::new(&holding.position.ticker),
                    Cell::new(holding.position.shares),
                    ui::money_cell(holding.position.basis),
                    ui::money_cell(holding.price.price),
                    ui::money_cell(holding.market_value()),
                    ui::gain_cell(holding.unrealized_gain()),
                    ui::source_cell(holding.price.source),
                ]);
            }
            output.push_str(&table.to_string());
        }

        let total_gain = self.total_gain();
        let gain_style = if total_gain.is_sign_negative() && !total_gain.is_zero() {
            ui::StyleType::Error
        } else {
            ui::StyleType::TotalValue
        };
        output.push_str(&format!(
            "\n\n{} {}\n{} {}\n{} {}",
            ui::style_text("Total Value:", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", self.total_value()), ui::StyleType::TotalValue),
            ui::style_text("Unrealized Gain:", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{total_gain:.2}"), gain_style),
            ui::style_text("Cash Balance:", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", self.cash_balance), ui::StyleType::TotalValue),
        ));
        output
    }
}

/// Values every position of the current user, including fully sold ones.
pub async fn load(app: &App) -> Result<PortfolioValue> {
    let positions = app.ledger.positions(&app.user).await?;
    let account: Account = app.accounts.account(&app.user).await?;

    let pb = ui::new_progress_bar(positions.len() as u64, true);
    pb.set_message("Fetching prices...");

    let holding_futures = positions.into_iter().map(|position| {
        let pb = pb.clone();
        async move {
            let price = app.resolver.resolve_price(&position.ticker).await;
            pb.inc(1);
            Holding { position, price }
        }
    });
    let holdings = join_all(holding_futures).await;
    pb.finish_and_clear();

    Ok(PortfolioValue {
        user: app.user.to_string(),
        holdings,
        cash_balance: account.cash_balance,
    })
}

pub async fn run(app: &App) -> Result<()> {
    let portfolio = load(app).await?;
    println!("{}", portfolio.display_as_table());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::UserId;
    use crate::core::price::PriceSource;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn holding(ticker: &str, shares: u64, basis: &str, price: &str) -> Holding {
        Holding {
            position: Position {
                user: UserId::new("demo"),
                ticker: ticker.to_string(),
                shares,
                basis: d(basis),
            },
            price: ResolvedPrice {
                price: d(price),
                percent_change: None,
                source: PriceSource::Fallback,
            },
        }
    }

    #[test]
    fn test_totals_include_zero_share_rows() {
        let portfolio = PortfolioValue {
            user: "demo".to_string(),
            holdings: vec![
                holding("AAPL", 2, "150.00", "175.00"),
                holding("TSLA", 1, "260.00", "240.00"),
                holding("JPM", 0, "140.00", "145.00"),
            ],
            cash_balance: d("1000"),
        };

        assert_eq!(portfolio.total_value(), d("590.00"));
        assert_eq!(portfolio.total_gain(), d("30.00"));

        let table = portfolio.display_as_table();
        assert!(table.contains("AAPL"));
        assert!(table.contains("JPM"));
        assert!(table.contains("-20.00"));
        assert!(table.contains("1000.00"));
    }

    #[test]
    fn test_empty_portfolio_message() {
        let portfolio = PortfolioValue {
            user: "demo".to_string(),
            holdings: vec![],
            cash_balance: Decimal::ZERO,
        };
        assert!(portfolio.display_as_table().contains("No positions yet"));
    }
}
