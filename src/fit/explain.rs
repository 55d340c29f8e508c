//! Rule-based explanations of parameter changes between two fitted curves.
//!
//! Parameters are examined in a fixed order (level, slope, curvature, lambda).
//! Values are rounded to 3 decimals before any comparison, and a parameter is
//! reported only when `|forecast - current|` exceeds its threshold. The wording
//! branches on the signs of current, forecast and delta. Values are printed
//! with at least one decimal place (`4.0`, not `4`).

use serde::{Deserialize, Serialize};

use crate::domain::AfnsParams;

pub const NO_SIGNIFICANT_CHANGE: &str =
    "There are no significant changes in the yield curve parameters between the current and forecasted periods.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    Level,
    Slope,
    Curvature,
    Lambda,
}

impl Factor {
    pub const ALL: [Factor; 4] = [Factor::Level, Factor::Slope, Factor::Curvature, Factor::Lambda];

    fn value(self, p: &AfnsParams) -> f64 {
        match self {
            Factor::Level => p.level,
            Factor::Slope => p.slope,
            Factor::Curvature => p.curvature,
            Factor::Lambda => p.lambda,
        }
    }
}

/// Minimum absolute change per factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplainThresholds {
    pub level: f64,
    pub slope: f64,
    pub curvature: f64,
    pub lambda: f64,
}

impl Default for ExplainThresholds {
    fn default() -> Self {
        Self {
            level: 0.05,
            slope: 0.05,
            curvature: 0.05,
            lambda: 0.05,
        }
    }
}

impl ExplainThresholds {
    fn get(&self, f: Factor) -> f64 {
        match f {
            Factor::Level => self.level,
            Factor::Slope => self.slope,
            Factor::Curvature => self.curvature,
            Factor::Lambda => self.lambda,
        }
    }
}

/// One explanation line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// `None` for the "no significant change" message.
    pub factor: Option<Factor>,
    pub text: String,
}

/// Explanation texts in factor order, or the single default message.
pub fn compare_and_explain(
    current: &AfnsParams,
    forecast: &AfnsParams,
    thresholds: &ExplainThresholds,
) -> Vec<String> {
    explain(current, forecast, thresholds)
        .into_iter()
        .map(|e| e.text)
        .collect()
}

pub fn explain(current: &AfnsParams, forecast: &AfnsParams, thresholds: &ExplainThresholds) -> Vec<Explanation> {
    let mut out: Vec<Explanation> = Factor::ALL
        .into_iter()
        .filter_map(|f| {
            let cur = f.value(current);
            let fut = f.value(forecast);
            describe(f, round3(cur), round3(fut), round3(fut - cur), thresholds.get(f)).map(|text| Explanation {
                factor: Some(f),
                text,
            })
        })
        .collect();

    if out.is_empty() {
        out.push(Explanation {
            factor: None,
            text: NO_SIGNIFICANT_CHANGE.to_string(),
        });
    }
    out
}

/// Round to 3 decimals, ties to even.
fn round3(v: f64) -> f64 {
    (v * 1000.0).round_ties_even() / 1000.0
}

fn describe(factor: Factor, cur: f64, fut: f64, diff: f64, threshold: f64) -> Option<String> {
    if diff.abs() <= threshold {
        return None;
    }
    let text = match factor {
        Factor::Level if diff > 0.0 => format!(
            "The level factor increased from {cur:?} to {fut:?}, suggesting that long-term yields are expected to rise. \
             Markets may be pricing higher long-run inflation or stronger growth."
        ),
        Factor::Level => format!(
            "The level factor decreased from {cur:?} to {fut:?}, indicating expectations of lower long-term interest rates. \
             This may signal weaker growth or lower inflation ahead."
        ),

        Factor::Slope if cur < 0.0 && fut < 0.0 && diff > 0.0 => format!(
            "The slope factor increased from {cur:?} to {fut:?}, but both values remain negative. \
             The curve stays inverted, though the inversion is expected to lessen, which may point to easing recession fears."
        ),
        Factor::Slope if cur < 0.0 && fut < 0.0 => format!(
            "The slope factor decreased from {cur:?} to {fut:?}, deepening the yield curve inversion. \
             This may reinforce expectations of an economic slowdown."
        ),
        Factor::Slope if cur < 0.0 && fut > 0.0 => format!(
            "The slope factor shifted from negative ({cur:?}) to positive ({fut:?}), a de-inversion from an inverted curve \
             to a normal upward-sloping one. This often accompanies an improving economic outlook."
        ),
        Factor::Slope if cur > 0.0 && fut < 0.0 => format!(
            "The slope factor flipped from positive ({cur:?}) to negative ({fut:?}), indicating an expected inversion of the \
             yield curve, often read as a recession warning."
        ),
        Factor::Slope if diff > 0.0 => format!(
            "The slope factor increased from {cur:?} to {fut:?}, steepening the yield curve. \
             This could point to stronger economic activity or rising long-term rates."
        ),
        Factor::Slope => format!(
            "The slope factor decreased from {cur:?} to {fut:?}, flattening the curve. \
             A flatter curve may reflect uncertainty or weakening momentum."
        ),

        Factor::Curvature if cur < 0.0 && fut < 0.0 && diff > 0.0 => format!(
            "The curvature factor increased from {cur:?} to {fut:?}, though both values are negative. \
             Mid-term yields are expected to be less depressed than before."
        ),
        Factor::Curvature if cur < 0.0 && fut < 0.0 => format!(
            "The curvature factor decreased further into negative territory ({cur:?} to {fut:?}), \
             indicating a more pronounced dip in medium-term yields."
        ),
        Factor::Curvature if cur > 0.0 && fut < 0.0 => format!(
            "The curvature factor changed from positive ({cur:?}) to negative ({fut:?}), suggesting a shift toward a \
             concave curve and possibly mid-term pessimism."
        ),
        Factor::Curvature if cur < 0.0 && fut > 0.0 => format!(
            "The curvature factor moved from negative ({cur:?}) to positive ({fut:?}), pointing to more convexity \
             and a possible mid-term rate rebound."
        ),
        Factor::Curvature if diff > 0.0 => format!(
            "The curvature factor increased from {cur:?} to {fut:?}, indicating a more pronounced hump at intermediate maturities. \
             This could reflect mixed expectations across horizons."
        ),
        Factor::Curvature => format!(
            "The curvature factor decreased from {cur:?} to {fut:?}, smoothing out the mid-term segment of the curve. \
             Expectations look more consistent across maturities."
        ),

        Factor::Lambda if diff > 0.0 => format!(
            "The lambda parameter rose from {cur:?} to {fut:?}, so the curve factors decay more quickly with maturity. \
             Short-term influences are expected to play a stronger role in shaping yields."
        ),
        Factor::Lambda => format!(
            "The lambda parameter fell from {cur:?} to {fut:?}, so the curve factors decay more slowly. \
             Long-term expectations are expected to carry more influence."
        ),
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(level: f64, slope: f64, curvature: f64, lambda: f64) -> AfnsParams {
        AfnsParams {
            level,
            slope,
            curvature,
            lambda,
        }
    }

    #[test]
    fn slope_de_inversion_is_the_only_explanation() {
        let out = explain(
            &params(4.5, -1.2, 0.8, 0.5),
            &params(4.5, 0.3, 0.8, 0.5),
            &ExplainThresholds::default(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].factor, Some(Factor::Slope));
        assert!(out[0].text.contains("de-inversion"));
        assert!(out[0].text.contains("(-1.2)"));
        assert!(out[0].text.contains("(0.3)"));
    }

    #[test]
    fn no_change_emits_default_message() {
        let p = params(4.5, -1.2, 0.8, 0.5);
        let q = params(4.53, -1.17, 0.79, 0.52);
        assert_eq!(
            compare_and_explain(&p, &q, &ExplainThresholds::default()),
            vec![NO_SIGNIFICANT_CHANGE.to_string()]
        );
    }

    #[test]
    fn explanations_follow_factor_order() {
        let out = explain(
            &params(4.0, 1.0, -0.5, 0.5),
            &params(3.0, -1.0, 0.5, 1.0),
            &ExplainThresholds::default(),
        );
        let factors: Vec<_> = out.iter().filter_map(|e| e.factor).collect();
        assert_eq!(factors, Factor::ALL.to_vec());
        assert!(out[0].text.contains("decreased"));
        assert!(out[1].text.contains("inversion"));
        assert!(out[2].text.contains("convexity"));
        assert!(out[3].text.contains("rose"));
    }

    #[test]
    fn threshold_uses_rounded_delta() {
        // 0.0504 rounds to 0.05, which is not strictly above the threshold.
        let out = explain(
            &params(4.0, 1.0, 1.0, 0.5),
            &params(4.0504, 1.0, 1.0, 0.5),
            &ExplainThresholds::default(),
        );
        assert_eq!(out[0].factor, None);
    }

    #[test]
    fn whole_numbers_keep_a_decimal_place() {
        let out = explain(
            &params(4.0, 1.0, 1.0, 0.5),
            &params(4.5, 1.0, 1.0, 0.5),
            &ExplainThresholds::default(),
        );
        assert!(out[0].text.contains("from 4.0 to 4.5"), "{}", out[0].text);
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(round3(0.0625), 0.062);
        assert_eq!(round3(0.1875), 0.188);
        assert_eq!(round3(-1.2), -1.2);
    }
}
