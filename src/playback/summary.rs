//! End-of-simulation statistics summary.

use std::fmt;

use crate::protocol::Statistics;

/// Statistics received at the end of the stream, plus their display text.
///
/// Rounding to two decimals happens only in the text; the stored values are
/// the doubles exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSummary {
    stats: Statistics,
    text: String,
}

impl StatisticsSummary {
    pub fn new(stats: Statistics) -> Self {
        let text = format!(
            "min={:.2}, max={:.2}, count={}, avg={:.2}, variance={:.2}, std_deviation={:.2}",
            stats.min, stats.max, stats.count, stats.avg, stats.variance, stats.std_deviation
        );
        Self { stats, text }
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for StatisticsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_text_rounds_for_display_only() {
        let stats = Statistics {
            min: 1.0,
            max: 5.0,
            count: 10,
            avg: 3.0,
            variance: 0.5,
            std_deviation: 0.707,
        };
        let summary = StatisticsSummary::new(stats);
        assert_eq!(
            summary.text(),
            "min=1.00, max=5.00, count=10, avg=3.00, variance=0.50, std_deviation=0.71"
        );
        assert_eq!(summary.statistics().std_deviation, 0.707);
        assert_eq!(summary.to_string(), summary.text());
    }
}
