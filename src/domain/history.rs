//! History loading with period degradation.
//!
//! A pull that yields nothing is retried with progressively shorter periods
//! (stepping backward through [`crate::domain::period::VALID_PERIODS`]) before
//! the symbol is reported as having no usable series.

use crate::domain::bar::{Bar, BarSeries};
use crate::domain::indicator::RsiSettings;
use crate::domain::indicator::rsi::calculate_rsi_series;
use crate::domain::session::truncate_regular_hours;
use crate::ports::history_port::{HistoryPort, HistoryRequest};
use tracing::{debug, info, warn};

/// Fetches `request`, degrading the period on empty results, and attaches
/// the oscillator when `rsi` is given. `None` means no data at any period.
pub fn load_series(
    port: &dyn HistoryPort,
    request: &HistoryRequest,
    rsi: Option<RsiSettings>,
) -> Option<BarSeries> {
    let periods = std::iter::once(request.period).chain(request.period.fallbacks());

    for period in periods {
        if period != request.period {
            info!(symbol = %request.symbol, %period, "resetting period");
        }
        let attempt = request.with_period(period);
        let Some(mut series) = fetch_clean(port, &attempt) else {
            continue;
        };

        if let Some(settings) = rsi {
            let column = calculate_rsi_series(&series, settings.window, settings.scope);
            if let Err(e) = series.attach_rsi(column) {
                warn!(symbol = %request.symbol, error = %e, "could not attach oscillator");
                return None;
            }
        }
        debug!(
            symbol = %series.symbol,
            period = %series.period,
            interval = %series.interval,
            bars = series.len(),
            "loaded history"
        );
        return Some(series);
    }

    warn!(
        symbol = %request.symbol,
        period = %request.period,
        interval = %request.interval,
        "no data"
    );
    None
}

/// One provider call: drops incomplete rows, enforces ordering and trims
/// extended hours. Provider failures are treated as no data.
fn fetch_clean(port: &dyn HistoryPort, request: &HistoryRequest) -> Option<BarSeries> {
    let bars = match port.fetch(request) {
        Ok(bars) => bars,
        Err(e) => {
            warn!(symbol = %request.symbol, period = %request.period, error = %e, "fetch failed");
            return None;
        }
    };

    let bars: Vec<Bar> = bars.into_iter().filter(Bar::is_complete).collect();
    let mut series =
        match BarSeries::new(&request.symbol, request.period, request.interval, bars) {
            Ok(s) => s,
            Err(e) => {
                warn!(symbol = %request.symbol, error = %e, "rejected history");
                return None;
            }
        };

    truncate_regular_hours(&mut series);
    if series.is_empty() { None } else { Some(series) }
}
