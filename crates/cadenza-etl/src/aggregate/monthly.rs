use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};

use super::{CombinedRow, MONTH_FORMAT};

/// The months covered by the monthly-artist table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyWindow {
    /// First month; any day within it selects the whole month.
    pub anchor: NaiveDate,
    pub months: u32,
    /// Artists with fewer combined rows than this are left out.
    pub discovery_threshold: usize,
}

impl Default for MonthlyWindow {
    fn default() -> Self {
        Self {
            anchor: NaiveDate::from_ymd_opt(2021, 11, 1).unwrap_or_default(),
            months: 13,
            discovery_threshold: 100,
        }
    }
}

impl MonthlyWindow {
    /// `(first day, cutoff)` for each month in the window.
    ///
    /// The cutoff is midnight at the start of the month's last day, so
    /// events on the last day itself only count towards the next month.
    pub fn periods(&self) -> Vec<(NaiveDate, NaiveDateTime)> {
        let Some(first) = self.anchor.with_day(1) else {
            return Vec::new();
        };

        (0..self.months)
            .map_while(|i| {
                let start = first.checked_add_months(Months::new(i))?;
                let last_day = start.checked_add_months(Months::new(1))?.pred_opt()?;
                Some((start, last_day.and_hms_opt(0, 0, 0)?))
            })
            .collect()
    }
}

/// Cumulative listening time for one artist up to one month's cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyArtistRow {
    pub month: NaiveDate,
    pub artist: String,
    pub total_ms_played: u64,
}

impl MonthlyArtistRow {
    pub fn header() -> Vec<String> {
        ["month", "artist", "total_ms_played"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn record(&self) -> Vec<String> {
        vec![
            self.month.format(MONTH_FORMAT).to_string(),
            self.artist.clone(),
            self.total_ms_played.to_string(),
        ]
    }
}

/// Build the monthly-artist table.
///
/// For each month of `window`, every non-discovery artist with at least one
/// event before the month's cutoff gets a row holding the sum of all their
/// `ms_played` before that cutoff. Totals therefore never decrease from one
/// month to the next. Rows are month-major with artists sorted by name.
pub fn monthly_artist_table(combined: &[CombinedRow], window: &MonthlyWindow) -> Vec<MonthlyArtistRow> {
    let mut by_artist: BTreeMap<&str, Vec<(NaiveDateTime, u64)>> = BTreeMap::new();
    for row in combined {
        by_artist
            .entry(row.artist.as_str())
            .or_default()
            .push((row.end_time, row.ms_played));
    }

    let before = by_artist.len();
    by_artist.retain(|_, plays| plays.len() >= window.discovery_threshold);
    log::debug!(
        "Monthly table covers {} artists ({} below the discovery threshold of {})",
        by_artist.len(),
        before - by_artist.len(),
        window.discovery_threshold
    );

    let mut rows = Vec::new();
    for (month, cutoff) in window.periods() {
        for (artist, plays) in &by_artist {
            let mut seen = false;
            let mut total = 0_u64;
            for (end_time, ms_played) in plays {
                if *end_time < cutoff {
                    seen = true;
                    total += ms_played;
                }
            }
            if seen {
                rows.push(MonthlyArtistRow {
                    month,
                    artist: (*artist).to_string(),
                    total_ms_played: total,
                });
            }
        }
    }

    rows
}
