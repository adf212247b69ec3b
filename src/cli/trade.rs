use super::ui;
use crate::App;
use crate::core::position::{Position, TradeDirection, parse_amount};
use anyhow::Result;

pub fn format_position(position: &Position) -> String {
    if position.shares == 0 {
        return format!(
            "{}: {}",
            ui::style_text(&position.ticker, ui::StyleType::TotalLabel),
            ui::style_text("no shares held", ui::StyleType::Subtle)
        );
    }
    format!(
        "{}: {} share{} at basis {}",
        ui::style_text(&position.ticker, ui::StyleType::TotalLabel),
        position.shares,
        if position.shares == 1 { "" } else { "s" },
        ui::style_text(&format!("{:.2}", position.basis), ui::StyleType::TotalValue)
    )
}

/// Applies a single-share trade for the current user and prints the result.
pub async fn run(app: &App, ticker: &str, operator: &str, price: Option<&str>) -> Result<()> {
    let direction: TradeDirection = operator.parse()?;
    let price = price.map(parse_amount).transpose()?;

    let position = app
        .ledger
        .apply_trade(&app.user, ticker, direction, price)
        .await?;
    println!("{}", format_position(&position));
    Ok(())
}
