use chrono::{DateTime, Utc};
use ferrous_analytics_domain::{Granularity, TimeRange};
use std::time::Duration;

const FIVE_MINUTES_SECS: i64 = 5 * 60;
const FIXED_SHORT_WINDOW_SECS: i64 = 15 * 60;

/// TTL for windows that ended more than a day ago.
pub const HISTORICAL_TTL: Duration = Duration::from_secs(6 * 3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snap {
    /// Start rounded to the nearest five minutes, length fixed to fifteen.
    NearestFiveMinutes,
    /// Start floored and end ceiled to the granularity's boundaries.
    Boundary(Granularity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBand {
    pub max_duration_secs: i64,
    pub snap: Snap,
    pub ttl: Duration,
    pub timeline: Granularity,
}

pub const WINDOW_BANDS: [WindowBand; 5] = [
    WindowBand {
        max_duration_secs: 15 * 60,
        snap: Snap::NearestFiveMinutes,
        ttl: Duration::from_secs(30),
        timeline: Granularity::Hour,
    },
    WindowBand {
        max_duration_secs: 86_400,
        snap: Snap::Boundary(Granularity::Hour),
        ttl: Duration::from_secs(2 * 60),
        timeline: Granularity::Hour,
    },
    WindowBand {
        max_duration_secs: 7 * 86_400,
        snap: Snap::Boundary(Granularity::Day),
        ttl: Duration::from_secs(10 * 60),
        timeline: Granularity::Day,
    },
    WindowBand {
        max_duration_secs: 30 * 86_400,
        snap: Snap::Boundary(Granularity::Day),
        ttl: Duration::from_secs(30 * 60),
        timeline: Granularity::Day,
    },
    WindowBand {
        max_duration_secs: i64::MAX,
        snap: Snap::Boundary(Granularity::Month),
        ttl: HISTORICAL_TTL,
        timeline: Granularity::Month,
    },
];

/// Window an overview request is actually computed and cached for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedWindow {
    pub range: TimeRange,
    pub ttl: Duration,
    pub timeline: Granularity,
}

pub fn band_for(range: &TimeRange) -> WindowBand {
    let secs = range.duration().num_seconds();
    WINDOW_BANDS
        .iter()
        .copied()
        .find(|band| secs <= band.max_duration_secs)
        .unwrap_or(WINDOW_BANDS[WINDOW_BANDS.len() - 1])
}

/// Snaps `range` to its band so nearby requests share one cache entry.
pub fn normalize_window(range: &TimeRange, now: DateTime<Utc>) -> NormalizedWindow {
    let band = band_for(range);

    let (from, to) = match band.snap {
        Snap::NearestFiveMinutes => {
            let ts = range.from.timestamp();
            let rounded = (ts + FIVE_MINUTES_SECS / 2).div_euclid(FIVE_MINUTES_SECS)
                * FIVE_MINUTES_SECS;
            let from = DateTime::from_timestamp(rounded, 0).unwrap_or(range.from);
            (from, from + chrono::Duration::seconds(FIXED_SHORT_WINDOW_SECS))
        }
        Snap::Boundary(granularity) => (
            granularity.bucket_start(range.from),
            granularity.ceil(range.to),
        ),
    };

    let ttl = if now - range.to > chrono::Duration::days(1) {
        HISTORICAL_TTL
    } else {
        band.ttl
    };

    NormalizedWindow {
        range: TimeRange { from, to },
        ttl,
        timeline: band.timeline,
    }
}
