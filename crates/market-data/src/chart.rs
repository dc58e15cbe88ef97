use chrono::NaiveDate;
use core_types::PriceSeries;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// How a bar should be coloured relative to the next day's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarTrend {
    /// The next day closed higher.
    Rising,
    /// The next day closed at or below this price.
    Falling,
    /// The most recent point, highlighted with the current price.
    Latest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartBar {
    pub date: NaiveDate,
    pub price: Decimal,
    /// Height normalised to the series range, from 0 (minimum) to 100 (maximum).
    pub height_pct: Decimal,
    pub trend: BarTrend,
}

/// A bar-chart view of a price series, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartProjection {
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub bars: Vec<ChartBar>,
}

impl ChartProjection {
    pub fn from_series(series: &PriceSeries) -> Self {
        let min_price = series.min_price();
        let max_price = series.max_price();
        let range = max_price - min_price;
        let points = series.points();

        let bars = points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let height_pct = if range.is_zero() {
                    Decimal::ZERO
                } else {
                    ((point.price - min_price) / range * dec!(100)).round_dp(2)
                };
                let trend = match points.get(i + 1) {
                    None => BarTrend::Latest,
                    Some(next) if point.price < next.price => BarTrend::Rising,
                    Some(_) => BarTrend::Falling,
                };
                ChartBar {
                    date: point.date,
                    price: point.price,
                    height_pct,
                    trend,
                }
            })
            .collect();

        Self {
            min_price,
            max_price,
            bars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PricePoint;

    fn series(prices: &[Decimal]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                date: start + chrono::Days::new(i as u64),
                price,
            })
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn normalises_heights_to_the_range() {
        let chart = ChartProjection::from_series(&series(&[dec!(10), dec!(20), dec!(15)]));

        let heights: Vec<Decimal> = chart.bars.iter().map(|b| b.height_pct).collect();
        assert_eq!(heights, vec![dec!(0), dec!(100), dec!(50)]);
        assert_eq!(chart.min_price, dec!(10));
        assert_eq!(chart.max_price, dec!(20));
    }

    #[test]
    fn trends_compare_with_the_next_day() {
        let chart = ChartProjection::from_series(&series(&[dec!(10), dec!(20), dec!(20), dec!(5)]));

        let trends: Vec<BarTrend> = chart.bars.iter().map(|b| b.trend).collect();
        assert_eq!(
            trends,
            vec![
                BarTrend::Rising,
                BarTrend::Falling,
                BarTrend::Falling,
                BarTrend::Latest
            ]
        );
    }

    #[test]
    fn flat_series_has_zero_heights() {
        let chart = ChartProjection::from_series(&series(&[dec!(42), dec!(42)]));
        assert!(chart.bars.iter().all(|b| b.height_pct.is_zero()));
    }
}
