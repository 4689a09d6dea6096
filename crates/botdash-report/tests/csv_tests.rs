use botdash_report::{serialize_csv, Row};
use serde_json::{json, Value};

fn row(v: Value) -> Row {
    v.as_object().cloned().unwrap()
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn parse_csv(text: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes())
        .records()
        .map(|record| {
            record
                .expect("well-formed csv record")
                .iter()
                .map(String::from)
                .collect()
        })
        .collect()
}

#[test]
fn test_unfiltered_export_of_status_rows() {
    let rows = vec![
        row(json!({"status": "SUCCESS", "name": "a"})),
        row(json!({"status": "FAILED", "name": "b"})),
    ];
    let csv = serialize_csv(&rows, &cols(&["name", "status"]));
    assert_eq!(csv, "Name,Status\na,SUCCESS\nb,FAILED\n");
}

#[test]
fn test_round_trip_with_hostile_values() {
    let rows = vec![
        row(json!({"msg": "hello, world", "who": "plain", "n": 7})),
        row(json!({"msg": "she said \"no\"", "who": null, "n": 1.5})),
        row(json!({"msg": "multi\nline\nvalue", "who": "\"", "n": true})),
        row(json!({"msg": ",\",\n", "n": -3})),
        row(json!({"msg": "a\rb", "who": "x\r\ny", "n": 0})),
    ];
    let columns = cols(&["msg", "who", "n"]);
    let parsed = parse_csv(&serialize_csv(&rows, &columns));

    assert_eq!(parsed[0], vec!["Msg", "Who", "N"]);
    assert_eq!(parsed.len(), rows.len() + 1);

    let expected: Vec<Vec<String>> = vec![
        vec!["hello, world".into(), "plain".into(), "7".into()],
        vec!["she said \"no\"".into(), "".into(), "1.5".into()],
        vec!["multi\nline\nvalue".into(), "\"".into(), "true".into()],
        vec![",\",\n".into(), "".into(), "-3".into()],
        vec!["a\rb".into(), "x\r\ny".into(), "0".into()],
    ];
    assert_eq!(&parsed[1..], expected.as_slice());
}

#[test]
fn test_bare_carriage_return_stays_in_one_record() {
    let rows = vec![row(json!({"a": "a\rb", "b": "x"}))];
    let parsed = parse_csv(&serialize_csv(&rows, &cols(&["a", "b"])));
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[1], vec!["a\rb".to_string(), "x".to_string()]);
}

#[test]
fn test_header_with_comma_is_quoted() {
    let rows = vec![row(json!({"a,b": "x"}))];
    let parsed = parse_csv(&serialize_csv(&rows, &cols(&["a,b"])));
    assert_eq!(parsed, vec![vec!["A,b".to_string()], vec!["x".to_string()]]);
}

#[test]
fn test_field_order_follows_columns_not_row_keys() {
    let rows = vec![row(json!({"z": 1, "a": 2}))];
    let csv = serialize_csv(&rows, &cols(&["a", "z", "missing"]));
    assert_eq!(csv, "A,Z,Missing\n2,1,\n");
}
