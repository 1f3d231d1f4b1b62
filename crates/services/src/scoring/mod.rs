mod aggregator;
mod report;

pub use aggregator::ScoreAggregator;
pub use report::{
    AccuracyBand, FAST_PACE_PER_MINUTE, PaceNote, PerformanceReport, PerformanceSummary,
    REVIEW_THRESHOLD_PERCENT, ReviewFlag, SLOW_PACE_PER_MINUTE, SessionInfo, format_duration,
};
