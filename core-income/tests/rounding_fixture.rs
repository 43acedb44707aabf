//! Reference rounding fixture for income payloads.

use chrono::{FixedOffset, TimeZone, Utc};
use core_income::{IncomeItem, IncomePayload, IncomeRequest};

fn build(items: Vec<IncomeItem>) -> IncomePayload {
    IncomePayload::build(
        &IncomeRequest::from(items),
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        FixedOffset::east_opt(3 * 3600).unwrap(),
    )
    .unwrap()
}

fn lines(payload: &IncomePayload) -> Vec<String> {
    payload
        .services()
        .iter()
        .map(|line| line.amount.to_string())
        .collect()
}

#[test]
fn fixture_two_lines() {
    let payload = build(vec![
        IncomeItem::new("A", 2, 100.005),
        IncomeItem::new("B", 1, 50.0),
    ]);
    assert_eq!(lines(&payload), ["200.01", "50.00"]);
    assert_eq!(payload.total_amount().to_string(), "250.01");
}

#[test]
fn fixture_tie_rounds_up() {
    let payload = build(vec![IncomeItem::new("C", 1, 0.125)]);
    assert_eq!(lines(&payload), ["0.13"]);
    assert_eq!(payload.total_amount().to_string(), "0.13");
}

#[test]
fn fixture_product_with_float_noise() {
    let payload = build(vec![IncomeItem::new("D", 3, 0.335)]);
    assert_eq!(lines(&payload), ["1.01"]);
    assert_eq!(payload.total_amount().to_string(), "1.01");
}

#[test]
fn fixture_whole_amount() {
    let payload = build(vec![IncomeItem::new("Consult", 1, 1000.0)]);
    assert_eq!(lines(&payload), ["1000.00"]);
    assert_eq!(payload.total_amount().to_string(), "1000.00");
}

#[test]
fn total_is_sum_of_rounded_lines() {
    // The unrounded sum 0.015 would round to 0.02
    let payload = build(vec![
        IncomeItem::new("E", 1, 0.005),
        IncomeItem::new("F", 1, 0.005),
        IncomeItem::new("G", 1, 0.005),
    ]);
    assert_eq!(lines(&payload), ["0.01", "0.01", "0.01"]);
    assert_eq!(payload.total_amount().to_string(), "0.03");
}

#[test]
fn wire_amounts_are_json_numbers() {
    let payload = build(vec![
        IncomeItem::new("A", 2, 100.005),
        IncomeItem::new("B", 1, 50.0),
    ]);
    let json = serde_json::to_value(&payload).unwrap();

    assert_eq!(json["services"][0]["amount"], serde_json::json!(200.01));
    assert_eq!(json["services"][1]["quantity"], serde_json::json!(1));
    assert_eq!(json["totalAmount"], serde_json::json!(250.01));
    assert_eq!(json["operationTime"], "2024-05-01T12:00:00+03:00");
}
