//! # Payload Decoders
//!
//! Turn upstream bodies into `PriceRecord` snapshots.
//!
//! - [`decode_rest_payload`]: the REST ticker array (`market`, `trade_price`,
//!   `signed_change_rate`, ...), or an `{"error": {...}}` envelope.
//! - [`decode_stream_payload`]: one event-stream `data` payload, either a
//!   camelCase `PriceRecord` array or the legacy
//!   `{"status": "0000", "data": {SYM: {...}}}` envelope.
//!
//! Records that are not renderable (empty symbol, non-positive price) are
//! dropped here so nothing downstream has to check again.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FeedError;
use crate::models::PriceRecord;

const LEGACY_OK_STATUS: &str = "0000";

/// Marker words that turn an upstream error envelope into a permanent error.
const CREDENTIAL_MARKERS: [&str; 4] = ["credential", "authoriz", "access_key", "jwt"];

#[derive(Debug, Deserialize)]
struct RestTicker {
    #[serde(default)]
    market: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    korean_name: Option<String>,
    #[serde(default)]
    english_name: Option<String>,
    trade_price: f64,
    #[serde(default)]
    signed_change_rate: f64,
    #[serde(default)]
    signed_change_price: f64,
    #[serde(default)]
    high_price: f64,
    #[serde(default)]
    low_price: f64,
    #[serde(default)]
    acc_trade_price_24h: f64,
}

impl RestTicker {
    fn into_record(self) -> PriceRecord {
        let symbol = match (self.symbol, self.market) {
            (Some(s), _) if !s.is_empty() => s,
            (_, Some(market)) => strip_quote_currency(&market).to_string(),
            _ => String::new(),
        };
        PriceRecord {
            symbol,
            korean_name: self.korean_name.unwrap_or_default(),
            english_name: self.english_name.unwrap_or_default(),
            current_price: self.trade_price,
            change_rate: self.signed_change_rate * 100.0,
            change_amount: self.signed_change_price,
            high_price: self.high_price,
            low_price: self.low_price,
            volume: self.acc_trade_price_24h,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

/// `KRW-BTC` -> `BTC`.
fn strip_quote_currency(market: &str) -> &str {
    market.rsplit('-').next().unwrap_or(market)
}

fn reject_html(body: &str) -> Result<(), FeedError> {
    if body.trim_start().starts_with('<') {
        return Err(FeedError::html_body());
    }
    Ok(())
}

fn parse_json(body: &str) -> Result<Value, FeedError> {
    reject_html(body)?;
    serde_json::from_str(body).map_err(|e| FeedError::Parse(format!("invalid JSON: {e}")))
}

fn renderable(records: impl IntoIterator<Item = PriceRecord>) -> Vec<PriceRecord> {
    records.into_iter().filter(PriceRecord::is_renderable).collect()
}

/// Decodes the REST snapshot endpoint.
pub fn decode_rest_payload(body: &str) -> Result<Vec<PriceRecord>, FeedError> {
    let value = parse_json(body)?;

    if value.get("error").is_some() {
        let envelope: ErrorEnvelope =
            serde_json::from_value(value).map_err(|e| FeedError::Parse(format!("malformed error envelope: {e}")))?;
        return Err(envelope_error(envelope.error));
    }

    if !value.is_array() {
        return Err(FeedError::Parse(format!("expected a JSON array, got {}", kind_of(&value))));
    }
    let tickers: Vec<RestTicker> =
        serde_json::from_value(value).map_err(|e| FeedError::Parse(format!("unexpected ticker shape: {e}")))?;

    Ok(renderable(tickers.into_iter().map(RestTicker::into_record)))
}

fn envelope_error(body: ErrorBody) -> FeedError {
    let detail = match (body.name.is_empty(), body.message.is_empty()) {
        (false, false) => format!("{}: {}", body.name, body.message),
        (false, true) => body.name,
        (true, _) => body.message,
    };
    let lowered = detail.to_lowercase();
    if CREDENTIAL_MARKERS.iter().any(|m| lowered.contains(m)) {
        FeedError::Permanent(detail)
    } else {
        FeedError::Transient(format!("upstream error: {detail}"))
    }
}

/// Decodes one event-stream payload.
pub fn decode_stream_payload(body: &str) -> Result<Vec<PriceRecord>, FeedError> {
    match parse_json(body)? {
        value @ Value::Array(_) => {
            let records: Vec<PriceRecord> = serde_json::from_value(value)
                .map_err(|e| FeedError::Parse(format!("unexpected record shape: {e}")))?;
            Ok(renderable(records))
        }
        Value::Object(envelope) if envelope.contains_key("status") => decode_legacy_envelope(&envelope),
        other => Err(FeedError::Parse(format!(
            "expected a record array or status envelope, got {}",
            kind_of(&other)
        ))),
    }
}

fn decode_legacy_envelope(envelope: &Map<String, Value>) -> Result<Vec<PriceRecord>, FeedError> {
    let status = match envelope.get("status") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    if status != LEGACY_OK_STATUS {
        let message = envelope.get("message").and_then(Value::as_str).unwrap_or("no message");
        return Err(FeedError::Transient(format!("upstream status {status}: {message}")));
    }

    let data = envelope
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| FeedError::Parse("status envelope without a data object".to_string()))?;

    let mut records: Vec<PriceRecord> = data
        .iter()
        .filter_map(|(symbol, fields)| fields.as_object().map(|f| legacy_record(symbol, f)))
        .filter(PriceRecord::is_renderable)
        .collect();
    records.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    Ok(records)
}

fn legacy_record(symbol: &str, fields: &Map<String, Value>) -> PriceRecord {
    let num = |key: &str| fields.get(key).and_then(loose_f64);
    let positive = |v: Option<f64>| v.filter(|x| *x > 0.0);

    let current = num("closing_price").unwrap_or(0.0);
    let previous = positive(num("prev_closing_price"))
        .or_else(|| num("opening_price"))
        .unwrap_or(0.0);

    let change_amount = current - previous;
    let change_rate = if previous > 0.0 { change_amount / previous * 100.0 } else { 0.0 };

    PriceRecord {
        symbol: symbol.to_string(),
        current_price: current,
        change_amount,
        change_rate,
        high_price: positive(num("max_price")).unwrap_or(current),
        low_price: positive(num("min_price")).unwrap_or(current),
        volume: num("acc_trade_value_24H").or_else(|| num("units_traded_24H")).unwrap_or(0.0),
        ..Default::default()
    }
}

/// Numbers arrive both as JSON numbers and as numeric strings.
fn loose_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_array_maps_fields() {
        let body = r#"[
            {"market":"KRW-BTC","korean_name":"비트코인","english_name":"Bitcoin","trade_price":95000000,
             "signed_change_rate":-0.0123,"signed_change_price":-1200000,"high_price":97000000,
             "low_price":94000000,"acc_trade_price_24h":123456789012.5},
            {"market":"KRW-DEAD","trade_price":0}
        ]"#;
        let records = decode_rest_payload(body).unwrap();
        assert_eq!(records.len(), 1);
        let btc = &records[0];
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.korean_name, "비트코인");
        assert!((btc.change_rate - -1.23).abs() < 1e-9);
        assert!(!btc.is_positive());
        assert_eq!(btc.volume, 123456789012.5);
    }

    #[test]
    fn empty_array_is_an_empty_snapshot() {
        assert!(decode_rest_payload("[]").unwrap().is_empty());
        assert!(decode_stream_payload(" [ ] ").unwrap().is_empty());
    }

    #[test]
    fn html_is_a_parse_error() {
        let decoders: [fn(&str) -> Result<Vec<PriceRecord>, FeedError>; 2] = [decode_rest_payload, decode_stream_payload];
        for decode in decoders {
            let err = decode("\n  <!DOCTYPE html><html><body>502 Bad Gateway</body></html>").unwrap_err();
            assert!(matches!(err, FeedError::Parse(ref m) if m.contains("HTML")), "{err:?}");
        }
    }

    #[test]
    fn error_envelope_classification() {
        let auth = decode_rest_payload(r#"{"error":{"name":"invalid_access_key","message":"bad key"}}"#).unwrap_err();
        assert_eq!(auth, FeedError::Permanent("invalid_access_key: bad key".into()));

        let busy = decode_rest_payload(r#"{"error":{"name":"too_many_requests","message":"slow down"}}"#).unwrap_err();
        assert!(busy.is_retryable());
    }

    #[test]
    fn rest_rejects_non_array() {
        let err = decode_rest_payload(r#"{"market":"KRW-BTC"}"#).unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[test]
    fn stream_array_drops_unrenderable() {
        let body = r#"[
            {"symbol":"ETH","currentPrice":4000,"changeAmount":10,"volume":5},
            {"symbol":"NOPE","currentPrice":-1},
            {"symbol":"","currentPrice":3}
        ]"#;
        let records = decode_stream_payload(body).unwrap();
        assert_eq!(records.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(), vec!["ETH"]);
    }

    #[test]
    fn legacy_envelope_derives_change() {
        let body = r#"{"status":"0000","data":{
            "XRP":{"closing_price":"550","prev_closing_price":"500","max_price":"560","min_price":"0",
                   "acc_trade_value_24H":"1,234.5"},
            "BTC":{"closing_price":90000000,"opening_price":100000000,"units_traded_24H":"12"},
            "ZERO":{"closing_price":"0"},
            "date":"1700000000000"
        }}"#;
        let records = decode_stream_payload(body).unwrap();
        assert_eq!(records.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>(), vec!["BTC", "XRP"]);

        let btc = &records[0];
        assert_eq!(btc.change_amount, -10_000_000.0);
        assert!((btc.change_rate - -10.0).abs() < 1e-9);
        assert_eq!(btc.high_price, 90_000_000.0);
        assert_eq!(btc.volume, 12.0);

        let xrp = &records[1];
        assert!((xrp.change_rate - 10.0).abs() < 1e-9);
        assert_eq!(xrp.high_price, 560.0);
        assert_eq!(xrp.low_price, 550.0);
        assert_eq!(xrp.volume, 1234.5);
    }

    #[test]
    fn legacy_bad_status_is_transient() {
        let err = decode_stream_payload(r#"{"status":"5600","message":"maintenance"}"#).unwrap_err();
        assert_eq!(err, FeedError::Transient("upstream status 5600: maintenance".into()));
    }

    #[test]
    fn stream_rejects_unknown_shapes() {
        assert!(matches!(decode_stream_payload("42"), Err(FeedError::Parse(_))));
        assert!(matches!(decode_stream_payload(r#"{"foo":1}"#), Err(FeedError::Parse(_))));
        assert!(matches!(decode_stream_payload("not json"), Err(FeedError::Parse(_))));
    }
}
