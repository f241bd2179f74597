use anyhow::{Context, Result};
use arbitrage_sizer::{
    aggregator,
    arbitrage::SearchAborted,
    config::AppConfig,
    dex::{GuardedQuoter, PoolReader, UniswapV3Quoter},
    models::{Direction, SearchReport},
    utils::{self, format_amount, format_profit},
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::from_env().context("loading configuration")?;
    info!(
        strategy = %config.arbitrage.search.strategy,
        token_in = ?config.arbitrage.token_in,
        scan_both = config.scan_both_directions,
        "[INIT] arbitrage-sizer starting"
    );

    let reader = PoolReader::new(&config.rpc_url, config.v2_pair, config.v3_pool)
        .await
        .context("connecting to pools")?;
    let mut snapshot = reader.snapshot().await.context("fetching pool state")?;
    if let Some(fee_tier) = config.v3_fee_tier {
        info!(fee_tier, "[INIT] using configured V3 fee tier");
        snapshot = snapshot.with_fee_tier(fee_tier);
    }

    let quoter = GuardedQuoter::new(
        UniswapV3Quoter::with_provider(reader.provider(), config.quoter),
        config.gateway,
    );

    let decimals = config.token_decimals;
    let mut reports = Vec::new();
    if config.scan_both_directions {
        let mut last_error = None;
        for (direction, result) in
            aggregator::scan_both_directions(&snapshot, &quoter, &config.arbitrage)
                .await
                .map_err(|aborted| aborted.error)?
        {
            match result {
                Ok(report) => reports.push(report),
                Err(aborted) => {
                    log_aborted(Some(direction), &aborted, decimals);
                    last_error = Some(aborted.error);
                }
            }
        }
        if let (true, Some(e)) = (reports.is_empty(), last_error) {
            return Err(e.into());
        }
    } else {
        match aggregator::find_opportunity(&snapshot, &quoter, &config.arbitrage).await {
            Ok(report) => reports.push(report),
            Err(aborted) => {
                log_aborted(None, &aborted, decimals);
                return Err(aborted.error.into());
            }
        }
    }

    for report in &reports {
        log_report(report, decimals);
    }
    if config.report_json {
        let summaries: Vec<_> = reports.iter().map(|r| r.summary(decimals)).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }
    Ok(())
}

fn log_report(report: &SearchReport, decimals: u32) {
    let direction = report
        .direction
        .map(|d| d.to_string())
        .unwrap_or_else(|| "none".to_string());
    if report.is_profitable() {
        info!(
            %direction,
            amount_in = %format_amount(report.best_amount_in, decimals),
            profit = %format_profit(report.best_profit, decimals),
            evaluations = report.evaluations,
            termination = ?report.termination,
            "[REPORT] potential profit found"
        );
    } else {
        warn!(
            %direction,
            evaluations = report.evaluations,
            termination = ?report.termination,
            "[REPORT] potential profit is 0: no opportunity for arbitrage"
        );
    }
    info!(
        elapsed_secs = %format!("{:.2}", report.elapsed.as_secs_f64()),
        "[REPORT] time spent looking for an arbitrage opportunity"
    );
}

fn log_aborted(direction: Option<Direction>, aborted: &SearchAborted, decimals: u32) {
    let direction = direction.map(|d| d.to_string());
    error!(
        ?direction,
        error = %aborted.error,
        evaluations = aborted.evaluations,
        "[REPORT] search aborted"
    );
    if let Some(best) = aborted.best_known {
        warn!(
            ?direction,
            amount_in = %format_amount(best.amount_in, decimals),
            profit = %format_profit(best.profit, decimals),
            "[REPORT] best known, run incomplete"
        );
    }
}
