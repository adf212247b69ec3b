use crate::App;
use crate::view::resolve_stock_view;
use anyhow::Result;

/// Prints the full stock record as JSON.
pub async fn run(app: &App, ticker: &str) -> Result<()> {
    let view = resolve_stock_view(&app.resolver, &app.ledger, &app.user, ticker).await;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
