//! Extraction of typed values from untrusted provider JSON.
//!
//! Nothing here fails loudly: a shape mismatch at any level yields `None`.

use serde_json::Value;
use std::collections::BTreeMap;

fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

/// Extracts `{ success: true, rates: { CODE: number } }` into a rate map.
///
/// Entries whose value is not a finite number are dropped. An empty result is
/// reported as `None`.
pub fn parse_currency_table(value: &Value) -> Option<BTreeMap<String, f64>> {
    let payload = value.as_object()?;
    if payload.get("success").and_then(Value::as_bool) != Some(true) {
        return None;
    }

    let rates = payload.get("rates")?.as_object()?;
    let parsed: BTreeMap<String, f64> = rates
        .iter()
        .filter_map(|(code, rate)| finite_number(rate).map(|r| (code.clone(), r)))
        .collect();

    (!parsed.is_empty()).then_some(parsed)
}

/// Extracts `[0].spreadProfilePrices[0].ask` from a quote feed response.
pub fn parse_quote_ask(value: &Value) -> Option<f64> {
    let first = value.as_array()?.first()?.as_object()?;
    let first_price = first
        .get("spreadProfilePrices")?
        .as_array()?
        .first()?
        .as_object()?;
    finite_number(first_price.get("ask")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_currency_table_keeps_only_numeric_rates() {
        let payload = json!({
            "success": true,
            "rates": { "EUR": 0.92, "XYZ": "bad" }
        });

        let rates = parse_currency_table(&payload).unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates.get("EUR"), Some(&0.92));
    }

    #[test]
    fn test_currency_table_accepts_integer_rates() {
        let payload = json!({
            "success": true,
            "rates": { "USD": 1, "JPY": 151.3, "NUL": null, "OBJ": {"v": 1}, "ARR": [1] }
        });

        let rates = parse_currency_table(&payload).unwrap();
        assert_eq!(rates.keys().collect::<Vec<_>>(), vec!["JPY", "USD"]);
        assert_eq!(rates["USD"], 1.0);
    }

    #[test]
    fn test_currency_table_all_invalid_is_absent() {
        let payload = json!({
            "success": true,
            "rates": { "XYZ": "bad", "ABC": null }
        });
        assert!(parse_currency_table(&payload).is_none());

        let empty = json!({ "success": true, "rates": {} });
        assert!(parse_currency_table(&empty).is_none());
    }

    #[test]
    fn test_currency_table_rejects_bad_envelope() {
        let cases = [
            json!({ "success": false, "rates": { "EUR": 0.92 } }),
            json!({ "success": "true", "rates": { "EUR": 0.92 } }),
            json!({ "rates": { "EUR": 0.92 } }),
            json!({ "success": true }),
            json!({ "success": true, "rates": [0.92] }),
            json!([{ "success": true }]),
            json!(null),
            json!("success"),
        ];

        for case in cases {
            assert!(parse_currency_table(&case).is_none(), "accepted {case}");
        }
    }

    #[test]
    fn test_quote_ask_happy_path() {
        let payload = json!([
            {
                "topo": { "platform": "AT", "server": "Live1" },
                "spreadProfilePrices": [
                    {
                        "spreadProfile": "standard", "bidSpread": 0.3, "askSpread": 0.3,
                        "bid": 31.48, "ask": 31.5
                    },
                    { "spreadProfile": "premium", "bid": 31.49, "ask": 31.49 }
                ],
                "ts": 1730000000000u64
            },
            { "spreadProfilePrices": [ { "ask": 99.0 } ] }
        ]);

        assert_eq!(parse_quote_ask(&payload), Some(31.5));
    }

    #[test]
    fn test_quote_ask_missing_or_empty_prices() {
        let cases = [
            json!([]),
            json!([{}]),
            json!([{ "spreadProfilePrices": [] }]),
            json!([{ "spreadProfilePrices": {} }]),
            json!([{ "spreadProfilePrices": [{}] }]),
            json!([{ "spreadProfilePrices": [{ "ask": "31.5" }] }]),
            json!([{ "spreadProfilePrices": [{ "ask": null }] }]),
            json!([null]),
            json!({ "spreadProfilePrices": [{ "ask": 31.5 }] }),
        ];

        for case in cases {
            assert!(parse_quote_ask(&case).is_none(), "accepted {case}");
        }
    }
}
