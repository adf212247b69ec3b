use super::ui;
use crate::App;
use crate::view::{StockView, resolve_stock_view};
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;

pub async fn balance(app: &App, amount: &str, operator: &str) -> Result<()> {
    let account = app.accounts.adjust_balance(&app.user, amount, operator).await?;
    println!(
        "{} {}",
        ui::style_text("Cash Balance:", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{:.2}", account.cash_balance), ui::StyleType::TotalValue)
    );
    Ok(())
}

pub async fn watch(app: &App, ticker: &str) -> Result<()> {
    let tickers = app.accounts.watch(&app.user, ticker).await?;
    println!("Watching: {}", tickers.join(", "));
    Ok(())
}

pub async fn unwatch(app: &App, ticker: &str) -> Result<()> {
    let tickers = app.accounts.unwatch(&app.user, ticker).await?;
    if tickers.is_empty() {
        println!("{}", ui::style_text("Watchlist is empty", ui::StyleType::Subtle));
    } else {
        println!("Watching: {}", tickers.join(", "));
    }
    Ok(())
}

pub fn display_watchlist(views: &[StockView]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell("Name"),
        ui::header_cell("Price"),
        ui::header_cell("Change"),
        ui::header_cell("Sector"),
        ui::header_cell("Source"),
    ]);
    for view in views {
        table.add_row(vec![
            Cell::new(&view.ticker),
            Cell::new(&view.short_name),
            ui::money_cell(view.current_price),
            ui::change_cell(&view.percent_text, view.percent_change),
            Cell::new(&view.sector),
            ui::source_cell(view.price_source),
        ]);
    }
    table.to_string()
}

/// Shows a stock row for each watched ticker, in watch order.
pub async fn watchlist(app: &App) -> Result<()> {
    let tickers = app.accounts.watchlist(&app.user).await?;
    if tickers.is_empty() {
        println!("{}", ui::style_text("Watchlist is empty", ui::StyleType::Subtle));
        return Ok(());
    }

    let pb = ui::new_progress_bar(tickers.len() as u64, true);
    pb.set_message("Fetching quotes...");
    let view_futures = tickers.iter().map(|ticker| {
        let pb = pb.clone();
        async move {
            let view = resolve_stock_view(&app.resolver, &app.ledger, &app.user, ticker).await;
            pb.inc(1);
            view
        }
    });
    let views = join_all(view_futures).await;
    pb.finish_and_clear();

    println!("{}", display_watchlist(&views));
    Ok(())
}
