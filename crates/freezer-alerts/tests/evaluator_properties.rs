//! Property tests for the window selector and the two evaluators.

use chrono::{DateTime, Duration, TimeZone, Utc};
use freezer_alerts::evaluate::{evaluate_freeze, evaluate_rain, is_wet};
use freezer_alerts::window::{compute_window, MORNING_COMMUTE, OVERNIGHT};
use freezer_weather::{ForecastSample, ForecastSeries, Units};
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap()
}

fn sample(ts: DateTime<Utc>, temp: f64, pop: f64, rain: Option<f64>) -> ForecastSample {
    ForecastSample {
        timestamp: ts,
        temperature: temp,
        feels_like: temp,
        humidity: 70,
        precipitation_probability: pop,
        rain_volume_3h: rain,
        snow_volume_3h: None,
        condition_summary: "Clouds".into(),
        description: "overcast clouds".into(),
    }
}

fn series(samples: Vec<ForecastSample>) -> ForecastSeries {
    ForecastSeries {
        samples,
        city_name: "Duluth".into(),
        country_code: "US".into(),
        units: Units::Imperial,
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// A 5-day series of 3-hour samples starting at `base()`.
fn series_strategy() -> impl Strategy<Value = ForecastSeries> {
    prop::collection::vec(
        (-20.0f64..60.0, 0.0f64..=1.0, prop::option::of(0.0f64..5.0)),
        1..40,
    )
    .prop_map(|points| {
        let samples = points
            .into_iter()
            .enumerate()
            .map(|(i, (temp, pop, rain))| {
                sample(base() + Duration::hours(3 * i as i64), temp, pop, rain)
            })
            .collect();
        series(samples)
    })
}

/// Any minute of the first two days.
fn now_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..(2 * 24 * 60)).prop_map(|minutes| base() + Duration::minutes(minutes))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_window_is_non_empty_and_not_in_past(
        now in now_strategy(),
        sh in 0u32..24, sm in 0u32..60,
        eh in 0u32..24, em in 0u32..60,
        offset in 0u64..2,
    ) {
        let window = compute_window(&now, sh, sm, eh, em, offset);
        prop_assert!(window.start < window.end);
        prop_assert!(now <= window.end);
    }

    #[test]
    fn prop_freeze_ignores_out_of_window_samples(s in series_strategy(), now in now_strategy()) {
        let window = OVERNIGHT.resolve(&now);
        let outside: Vec<ForecastSample> = s
            .samples
            .iter()
            .filter(|x| !window.contains(x.timestamp))
            .map(|x| ForecastSample { temperature: -40.0, ..x.clone() })
            .collect();
        prop_assert_eq!(evaluate_freeze(&series(outside), &window), None);
    }

    #[test]
    fn prop_freeze_low_is_in_window_minimum(s in series_strategy(), now in now_strategy()) {
        let window = OVERNIGHT.resolve(&now);
        let in_window: Vec<&ForecastSample> =
            s.samples.iter().filter(|x| window.contains(x.timestamp)).collect();

        match evaluate_freeze(&s, &window) {
            Some(alert) => {
                prop_assert!(alert.lowest_temp <= 32.0);
                prop_assert!(window.contains(alert.at));
                prop_assert!(in_window.iter().all(|x| alert.lowest_temp <= x.temperature));
                prop_assert!(in_window
                    .iter()
                    .any(|x| x.timestamp == alert.at && x.temperature == alert.lowest_temp));
            }
            None => {
                prop_assert!(in_window.iter().all(|x| x.temperature > 32.0));
            }
        }
    }

    #[test]
    fn prop_rain_picks_first_wet_sample(s in series_strategy(), now in now_strategy()) {
        let window = MORNING_COMMUTE.resolve(&now);
        let first_wet = s
            .samples
            .iter()
            .find(|x| window.contains(x.timestamp) && is_wet(x));

        let alert = evaluate_rain(&s, &window);
        prop_assert_eq!(alert.map(|a| a.at), first_wet.map(|x| x.timestamp));
    }
}

// ============================================================================
// Fixed scenarios
// ============================================================================

#[test]
fn test_exactly_freezing_alerts() {
    let now = base() + Duration::hours(18);
    let window = OVERNIGHT.resolve(&now);
    let s = series(vec![sample(base() + Duration::hours(27), 32.0, 0.0, None)]);
    assert_eq!(evaluate_freeze(&s, &window).unwrap().lowest_temp, 32.0);
}

#[test]
fn test_rain_later_sample_when_earlier_below_threshold() {
    let now = base() + Duration::hours(6);
    let window = MORNING_COMMUTE.resolve(&now);
    let t1 = base() + Duration::hours(8);
    let t2 = base() + Duration::hours(9);

    let only_second = series(vec![sample(t1, 45.0, 0.2, None), sample(t2, 45.0, 0.9, None)]);
    assert_eq!(evaluate_rain(&only_second, &window).unwrap().at, t2);

    let both = series(vec![sample(t1, 45.0, 0.35, None), sample(t2, 45.0, 0.9, None)]);
    assert_eq!(evaluate_rain(&both, &window).unwrap().at, t1);
}

#[test]
fn test_overnight_roll_forward_scenarios() {
    let day = base();
    let late = OVERNIGHT.resolve(&(day + Duration::hours(23)));
    assert_eq!(late.start, day + Duration::hours(22));
    assert_eq!(late.end, day + Duration::hours(32));

    let morning_after = OVERNIGHT.resolve(&(day + Duration::hours(33)));
    assert_eq!(morning_after.start, day + Duration::hours(46));
    assert_eq!(morning_after.end, day + Duration::hours(56));
}
