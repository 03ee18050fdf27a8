use maxx::core::config::ExchangeConfig;
use maxx::core::traits::MarketDataSource;
use maxx::MaxBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Public endpoints only; set MAX_API_KEY / MAX_SECRET_KEY for private ones
    let config = ExchangeConfig::from_env("MAX")
        .unwrap_or_else(|_| ExchangeConfig::read_only())
        .adjust_for_time_difference(true);

    let max = MaxBuilder::new().with_config(config).build()?;

    println!("Fetching markets...");
    let markets = max.fetch_markets().await?;
    println!("Found {} markets", markets.len());
    for market in markets.iter().take(5) {
        println!(
            "Market: {} ({} -> {}), amount precision {:?}, price precision {:?}",
            market.symbol,
            market.base,
            market.quote,
            market.precision.amount,
            market.precision.price
        );
    }

    if let Some(market) = markets.first() {
        let ticker = max.fetch_ticker(&market.symbol).await?;
        println!(
            "{:?} last={:?} bid={:?} ask={:?}",
            ticker.symbol, ticker.last, ticker.bid, ticker.ask
        );
    }

    Ok(())
}
