//! Serialization of the parsed model and the generation options.

#![cfg(feature = "serde")]

use sql_history::{Config, ReferentialAction, Table, UserSource, parse_create_tables};

#[test]
fn test_table_round_trip() {
    let tables = parse_create_tables(
        "CREATE TABLE app.orders (
            id SERIAL PRIMARY KEY,
            user_id INT REFERENCES users(id) ON DELETE CASCADE
        );",
    );

    let json = serde_json::to_string(&tables).unwrap();
    let decoded: Vec<Table> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, tables);
}

#[test]
fn test_table_json_shape() {
    let table = &parse_create_tables("CREATE TABLE t (id INT REFERENCES u(id) ON UPDATE SET NULL);")[0];
    let value = serde_json::to_value(table).unwrap();

    assert_eq!(value["name"], "t");
    assert_eq!(value["schema"], serde_json::Value::Null);
    assert_eq!(value["columns"][0]["data_type"], "INT");
    assert_eq!(value["foreign_keys"][0]["referenced_table"], "u");
    assert_eq!(
        serde_json::from_value::<ReferentialAction>(value["foreign_keys"][0]["on_update"].clone())
            .unwrap(),
        ReferentialAction::SetNull
    );
}

#[test]
fn test_config_json() {
    let config = Config::default()
        .with_track_user(true)
        .with_user_source(UserSource::Session);
    let value = serde_json::to_value(config).unwrap();
    assert_eq!(value["user_source"], "session");
    assert_eq!(value["track_user"], true);

    let decoded: Config = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, config);
}
