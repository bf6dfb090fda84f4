use actix_web::error::ErrorBadRequest;
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed` may appear in the payload; column names are
/// spliced into the statement, values are bound.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ErrorBadRequest(format!("Field cannot be updated: {}", unknown)));
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);

    // Convert JSON values → SqlValue
    for value in obj.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(ErrorBadRequest("Unsupported JSON value type")),
        }
    }

    // WHERE id = ?
    let id = i64::try_from(id_value).map_err(|_| ErrorBadRequest("Id out of range"))?;
    values.push(SqlValue::I64(id));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// True for MySQL integrity constraint violations (duplicate key, bad
/// foreign key).
pub fn is_constraint_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STAFF_COLUMNS: &[&str] = &["name", "location_id", "is_active"];

    #[test]
    fn builds_statement_with_bound_values() {
        let update = build_update_sql(
            "staff",
            &json!({ "name": "佐藤", "location_id": 4, "is_active": false }),
            STAFF_COLUMNS,
            "id",
            9,
        )
        .unwrap();

        assert!(update.sql.starts_with("UPDATE staff SET "));
        assert!(update.sql.ends_with(" WHERE id = ?"));
        assert_eq!(update.values.len(), 4);
        assert_eq!(update.values.last(), Some(&SqlValue::I64(9)));
        assert!(update.values.contains(&SqlValue::String("佐藤".to_string())));
        assert!(update.values.contains(&SqlValue::Bool(false)));
    }

    #[test]
    fn null_clears_a_column() {
        let update =
            build_update_sql("staff", &json!({ "location_id": null }), STAFF_COLUMNS, "id", 1)
                .unwrap();
        assert_eq!(update.sql, "UPDATE staff SET location_id = ? WHERE id = ?");
        assert_eq!(update.values[0], SqlValue::Null);
    }

    #[test]
    fn dates_are_bound_as_dates() {
        let update =
            build_update_sql("t", &json!({ "d": "2026-10-19" }), &["d"], "id", 1).unwrap();
        assert_eq!(
            update.values[0],
            SqlValue::Date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
        );
    }

    #[test]
    fn rejects_columns_outside_the_whitelist() {
        let err = build_update_sql(
            "staff",
            &json!({ "role_id = 1, name": "x" }),
            STAFF_COLUMNS,
            "id",
            1,
        );
        assert!(err.is_err());
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("staff", &json!({}), STAFF_COLUMNS, "id", 1).is_err());
        assert!(build_update_sql("staff", &json!([1, 2]), STAFF_COLUMNS, "id", 1).is_err());
        assert!(
            build_update_sql("staff", &json!({ "name": ["x"] }), STAFF_COLUMNS, "id", 1).is_err()
        );
    }

    #[test]
    fn rejects_ids_beyond_the_signed_range() {
        let payload = json!({ "name": "x" });
        let allowed = ["name"];
        assert!(build_update_sql("staff", &payload, &allowed, "id", u64::MAX).is_err());

        let update =
            build_update_sql("staff", &payload, &allowed, "id", i64::MAX as u64).unwrap();
        assert_eq!(update.values.last(), Some(&SqlValue::I64(i64::MAX)));
    }
}
