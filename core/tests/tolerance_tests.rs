mod common;

use chrono::NaiveDate;
use common::{dataset, diff, keyed, modified_columns};
use table_diff::{
    CellValue, ComparisonConfig, DEFAULT_ABSOLUTE_EPSILON, DEFAULT_RELATIVE_EPSILON,
    DateGranularity, NumericTolerance, values_equivalent,
};

fn one_value_diff(old: CellValue, new: CellValue, config: &ComparisonConfig) -> bool {
    let old = dataset(&["id", "v"], vec![vec![1i64.into(), old]]);
    let new = dataset(&["id", "v"], vec![vec![1i64.into(), new]]);
    !diff(&old, &new, config).modified.is_empty()
}

#[test]
fn default_epsilons_are_pinned() {
    assert_eq!(DEFAULT_ABSOLUTE_EPSILON, 1e-9);
    assert_eq!(DEFAULT_RELATIVE_EPSILON, 1e-12);
    let config = ComparisonConfig::default();
    assert_eq!(config.numeric_tolerance, NumericTolerance::default());
    assert_eq!(config.date_granularity, DateGranularity::Exact);
}

#[test]
fn one_one_point_zero_and_text_one_are_equal() {
    let config = keyed("id");
    let values = [
        CellValue::Number(1.0),
        CellValue::from(1i64),
        CellValue::from("1"),
        CellValue::from("1.0"),
        CellValue::from(" 1 "),
    ];
    for a in &values {
        for b in &values {
            assert!(values_equivalent(a, b, &config), "{a:?} vs {b:?}");
        }
    }
    assert!(!one_value_diff(CellValue::Number(1.0), CellValue::from("1"), &config));
}

#[test]
fn absolute_epsilon_governs_small_magnitudes() {
    let config = keyed("id");
    assert!(!one_value_diff(1.0.into(), (1.0 + 5e-10).into(), &config));
    assert!(one_value_diff(1.0.into(), (1.0 + 5e-9).into(), &config));
    assert!(!one_value_diff(0.0.into(), 1e-10.into(), &config));
}

#[test]
fn relative_epsilon_governs_large_magnitudes() {
    let config = keyed("id");
    assert!(!one_value_diff(1e12.into(), (1e12 + 0.5).into(), &config));
    assert!(one_value_diff(1e12.into(), (1e12 + 2.0).into(), &config));
}

#[test]
fn exact_tolerance_reports_any_difference() {
    let config = ComparisonConfig {
        numeric_tolerance: NumericTolerance::exact(),
        ..keyed("id")
    };
    assert!(one_value_diff(1.0.into(), (1.0 + 1e-12).into(), &config));
    assert!(!one_value_diff(2.5.into(), "2.5".into(), &config));
}

#[test]
fn whitespace_and_blank_normalization() {
    let config = keyed("id");
    assert!(!one_value_diff(" A ".into(), "A".into(), &config));
    assert!(!one_value_diff(CellValue::Null, "".into(), &config));
    assert!(one_value_diff(CellValue::Null, "x".into(), &config));
    assert!(one_value_diff("a".into(), "A".into(), &config));
}

#[test]
fn dates_compare_exactly_by_default() {
    let day = NaiveDate::from_ymd_opt(2023, 11, 5).expect("date");
    let at = |h, m, s| CellValue::Date(day.and_hms_opt(h, m, s).expect("time"));

    let exact = keyed("id");
    assert!(one_value_diff(at(10, 0, 0), at(10, 0, 1), &exact));
    assert!(!one_value_diff(at(10, 0, 0), at(10, 0, 0), &exact));

    let minute = ComparisonConfig {
        date_granularity: DateGranularity::Minute,
        ..keyed("id")
    };
    assert!(!one_value_diff(at(10, 0, 0), at(10, 0, 59), &minute));
    assert!(one_value_diff(at(10, 0, 0), at(10, 1, 0), &minute));

    let daily = ComparisonConfig {
        date_granularity: DateGranularity::Day,
        ..keyed("id")
    };
    assert!(!one_value_diff(at(1, 0, 0), at(23, 59, 59), &daily));
    assert!(!one_value_diff(at(0, 0, 0), CellValue::from(day), &daily));
}

#[test]
fn date_never_equals_its_text_rendering() {
    let day = NaiveDate::from_ymd_opt(2023, 11, 5).expect("date");
    assert!(one_value_diff(
        CellValue::from(day),
        CellValue::from("2023-11-05"),
        &keyed("id")
    ));
}

#[test]
fn tolerance_applies_per_cell_within_a_row() {
    let old = dataset(
        &["id", "a", "b"],
        vec![vec![1i64.into(), 0.3.into(), 100.0.into()]],
    );
    let new = dataset(
        &["id", "a", "b"],
        vec![vec![1i64.into(), (0.1 + 0.2).into(), 100.5.into()]],
    );
    let report = diff(&old, &new, &keyed("id"));
    assert_eq!(
        modified_columns(&report),
        vec![("1".to_string(), vec!["b".to_string()])]
    );
}
