//! Reference scenarios for dispatch, curve fitting and explanations.

use yield_wizard::domain::{AfnsParams, Maturity};
use yield_wizard::fit::{ExplainThresholds, Factor, NO_SIGNIFICANT_CHANGE, compare_and_explain, explain, fit};
use yield_wizard::models::{artifact_name, model_type_for_columns};

#[test]
fn four_group_columns_without_m1_dispatch_to_ffr_cpi_vix_cs() {
    let columns = ["start_tariff_72", "diff_FFR", "diff_CPI", "VIX_close", "diff_CSD"];
    let model_type = model_type_for_columns(&columns).unwrap();
    assert_eq!(
        artifact_name(model_type, Maturity::Y10),
        "arima_model_10-year_monthly_tariff_ffr_cpi_vix_cs.pkl"
    );
}

#[test]
fn reference_curve_fits_within_tolerance() {
    let maturities = [1.0, 2.0, 3.0, 5.0, 10.0, 20.0, 30.0];
    let yields = [4.9, 4.8, 4.7, 4.5, 4.2, 4.1, 4.0];
    let out = fit(&maturities, &yields).unwrap();

    let mse = out
        .fitted_yields
        .iter()
        .zip(&yields)
        .map(|(f, y)| (f - y).powi(2))
        .sum::<f64>()
        / yields.len() as f64;
    assert!(mse < 1e-3, "mse {mse}");
    assert!((mse - out.mse).abs() < 1e-12);
    assert!(out.params.lambda >= 0.01 && out.params.lambda <= 10.0);
}

#[test]
fn slope_turning_positive_is_a_de_inversion() {
    let current = AfnsParams {
        level: 4.5,
        slope: -1.2,
        curvature: 0.8,
        lambda: 0.5,
    };
    let forecast = AfnsParams { slope: 0.3, ..current };

    let detailed = explain(&current, &forecast, &ExplainThresholds::default());
    assert_eq!(detailed.len(), 1);
    assert_eq!(detailed[0].factor, Some(Factor::Slope));

    let lines = compare_and_explain(&current, &forecast, &ExplainThresholds::default());
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("de-inversion"), "{}", lines[0]);
}

#[test]
fn identical_curves_explain_nothing() {
    let p = AfnsParams {
        level: 4.0,
        slope: -0.5,
        curvature: 0.1,
        lambda: 0.7,
    };
    assert_eq!(
        compare_and_explain(&p, &p, &ExplainThresholds::default()),
        vec![NO_SIGNIFICANT_CHANGE.to_string()]
    );
}
