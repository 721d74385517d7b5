use crate::model::{MalformedDataError, PriceBar, PriceSeries, RawBar};
use crate::utils::{date_from_unix, parse_date_lenient};
use chrono::NaiveDate;
use serde_json::Value;

/// Turns provider records into a date-ordered `PriceSeries`.
///
/// Zero records is not an error; the caller gets an empty series back.
pub fn normalize(raw_bars: &[RawBar]) -> Result<PriceSeries, MalformedDataError> {
    let mut bars = raw_bars
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize_bar(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    // sort_by_key is stable: duplicate dates keep provider order
    bars.sort_by_key(|b| b.date);

    Ok(PriceSeries::from_sorted(bars))
}

fn normalize_bar(index: usize, raw: &RawBar) -> Result<PriceBar, MalformedDataError> {
    let date = coerce_date(index, require(index, "date", &raw.date)?)?;
    let open = coerce_price(index, "open", require(index, "open", &raw.open)?)?;
    let high = coerce_price(index, "high", require(index, "high", &raw.high)?)?;
    let low = coerce_price(index, "low", require(index, "low", &raw.low)?)?;
    let close = coerce_price(index, "close", require(index, "close", &raw.close)?)?;
    let volume = coerce_volume(index, require(index, "volume", &raw.volume)?)?;
    check_range(index, open, high, low, close)?;

    Ok(PriceBar {
        date,
        open,
        high,
        low,
        close,
        volume,
    })
}

/// A bar must satisfy `low <= open, close <= high`.
fn check_range(index: usize, open: f64, high: f64, low: f64, close: f64) -> Result<(), MalformedDataError> {
    if low > high {
        return Err(MalformedDataError::new(
            index,
            format!("`low` {low} is above `high` {high}"),
        ));
    }
    for (field, price) in [("open", open), ("close", close)] {
        if price < low || price > high {
            return Err(MalformedDataError::new(
                index,
                format!("`{field}` {price} is outside the low-high range [{low}, {high}]"),
            ));
        }
    }
    Ok(())
}

fn require<'a>(
    index: usize,
    field: &str,
    value: &'a Option<Value>,
) -> Result<&'a Value, MalformedDataError> {
    match value {
        Some(Value::Null) | None => {
            Err(MalformedDataError::new(index, format!("missing field `{field}`")))
        }
        Some(v) => Ok(v),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn coerce_price(index: usize, field: &str, value: &Value) -> Result<f64, MalformedDataError> {
    let price = coerce_number(value).ok_or_else(|| {
        MalformedDataError::new(index, format!("`{field}` is not numeric: {value}"))
    })?;
    if !price.is_finite() || price <= 0.0 {
        return Err(MalformedDataError::new(
            index,
            format!("`{field}` must be a positive price, got {price}"),
        ));
    }
    Ok(price)
}

fn coerce_volume(index: usize, value: &Value) -> Result<u64, MalformedDataError> {
    if let Some(v) = value.as_u64() {
        return Ok(v);
    }
    let volume = coerce_number(value).ok_or_else(|| {
        MalformedDataError::new(index, format!("`volume` is not numeric: {value}"))
    })?;
    if !volume.is_finite() || volume < 0.0 {
        return Err(MalformedDataError::new(
            index,
            format!("`volume` must be non-negative, got {volume}"),
        ));
    }
    Ok(volume.trunc() as u64)
}

fn coerce_date(index: usize, value: &Value) -> Result<NaiveDate, MalformedDataError> {
    let parsed = match value {
        Value::String(s) => parse_date_lenient(s),
        Value::Number(n) => n.as_i64().and_then(date_from_unix),
        _ => None,
    };
    parsed.ok_or_else(|| MalformedDataError::new(index, format!("unrecognised date: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(date: &str, close: f64, volume: u64) -> RawBar {
        RawBar {
            date: Some(json!(date)),
            open: Some(json!(close)),
            high: Some(json!(close + 1.0)),
            low: Some(json!(close - 1.0)),
            close: Some(json!(close)),
            volume: Some(json!(volume)),
        }
    }

    #[test]
    fn sorts_ascending_by_date() {
        let series = normalize(&[
            raw("2024-01-03", 103.0, 10),
            raw("2024-01-01", 101.0, 10),
            raw("2024-01-02", 102.0, 10),
        ])
        .unwrap();
        assert_eq!(series.closes(), vec![101.0, 102.0, 103.0]);
        assert_eq!(series.last().unwrap().date.to_string(), "2024-01-03");
    }

    #[test]
    fn duplicate_dates_keep_input_order() {
        let series = normalize(&[
            raw("2024-01-02", 12.0, 1),
            raw("2024-01-01", 11.0, 1),
            raw("2024-01-02", 13.0, 1),
        ])
        .unwrap();
        assert_eq!(series.closes(), vec![11.0, 12.0, 13.0]);
    }

    #[test]
    fn empty_input_is_empty_series() {
        let series = normalize(&[]).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn missing_volume_is_malformed() {
        let mut bar = raw("2024-01-01", 10.0, 5);
        bar.volume = None;
        let err = normalize(&[raw("2024-01-02", 11.0, 5), bar]).unwrap_err();
        assert_eq!(err.index, 1);
        assert!(err.reason.contains("volume"));
    }

    #[test]
    fn null_field_counts_as_missing() {
        let mut bar = raw("2024-01-01", 10.0, 5);
        bar.close = Some(Value::Null);
        let err = normalize(&[bar]).unwrap_err();
        assert!(err.reason.contains("missing field `close`"));
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let bar = RawBar {
            date: Some(json!("2024-01-01")),
            open: Some(json!("10.5")),
            high: Some(json!("11")),
            low: Some(json!(" 9.75 ")),
            close: Some(json!("10.25")),
            volume: Some(json!("12000")),
        };
        let series = normalize(&[bar]).unwrap();
        let b = &series.bars()[0];
        assert_eq!(b.open, 10.5);
        assert_eq!(b.low, 9.75);
        assert_eq!(b.volume, 12_000);
    }

    #[test]
    fn float_volume_is_truncated() {
        let mut bar = raw("2024-01-01", 10.0, 0);
        bar.volume = Some(json!(1500.0));
        assert_eq!(normalize(&[bar]).unwrap().bars()[0].volume, 1500);
    }

    #[test]
    fn non_numeric_price_is_malformed() {
        let mut bar = raw("2024-01-01", 10.0, 5);
        bar.high = Some(json!("n/a"));
        assert!(normalize(&[bar]).is_err());

        let mut bar = raw("2024-01-01", 10.0, 5);
        bar.open = Some(json!(true));
        assert!(normalize(&[bar]).is_err());
    }

    #[test]
    fn negative_volume_and_zero_price_are_malformed() {
        let mut bar = raw("2024-01-01", 10.0, 5);
        bar.volume = Some(json!(-3));
        assert!(normalize(&[bar]).is_err());

        let mut bar = raw("2024-01-01", 10.0, 5);
        bar.close = Some(json!(0.0));
        assert!(normalize(&[bar]).is_err());
    }

    #[test]
    fn accepts_unix_timestamps_and_rejects_garbage_dates() {
        let mut bar = raw("ignored", 10.0, 5);
        bar.date = Some(json!(1_704_205_800));
        let series = normalize(&[bar]).unwrap();
        assert_eq!(series.bars()[0].date.to_string(), "2024-01-02");

        let bad = raw("yesterday", 10.0, 5);
        assert!(normalize(&[bad]).is_err());
    }

    #[test]
    fn inverted_high_low_is_malformed() {
        let mut bar = raw("2024-01-01", 50.0, 5);
        bar.high = Some(json!(10.0));
        bar.low = Some(json!(90.0));
        let err = normalize(&[bar]).unwrap_err();
        assert_eq!(err.index, 0);
        assert!(err.reason.contains("above `high`"));
    }

    #[test]
    fn open_outside_range_is_malformed() {
        let mut bar = raw("2024-01-01", 10.0, 5);
        bar.open = Some(json!(12.0));
        let err = normalize(&[raw("2024-01-02", 10.0, 5), bar]).unwrap_err();
        assert_eq!(err.index, 1);
        assert!(err.reason.contains("`open`"));
    }

    #[test]
    fn close_outside_range_is_malformed() {
        let mut bar = raw("2024-01-01", 10.0, 5);
        bar.close = Some(json!(8.5));
        let err = normalize(&[bar]).unwrap_err();
        assert!(err.reason.contains("`close`"));
    }

    #[test]
    fn prices_on_the_range_bounds_are_accepted() {
        let mut bar = raw("2024-01-01", 10.0, 5);
        bar.open = Some(json!(9.0));
        bar.close = Some(json!(11.0));
        let series = normalize(&[bar]).unwrap();
        let b = &series.bars()[0];
        assert_eq!((b.low, b.open, b.close, b.high), (9.0, 9.0, 11.0, 11.0));
    }
}
