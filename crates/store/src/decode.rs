//! Row decoding for statements whose result schema is only known at runtime.

use crate::error::StoreResult;
use isoview_core::{Frame, Value};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::types::time::{Date, OffsetDateTime, PrimitiveDateTime};
use sqlx::{Column, Row, TypeInfo, ValueRef};

fn column_names<R: Row>(rows: &[R], fallback: &[String]) -> Vec<String> {
    match rows.first() {
        Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        None => fallback.to_vec(),
    }
}

fn build_frame<R, F>(rows: &[R], fallback: &[String], decode: F) -> StoreResult<Frame>
where
    R: Row,
    F: Fn(&R, usize) -> StoreResult<Value>,
{
    let columns = column_names(rows, fallback);
    let width = columns.len();
    let mut frame = Frame::new(columns);
    for row in rows {
        let values = (0..width)
            .map(|idx| decode(row, idx))
            .collect::<StoreResult<Vec<_>>>()?;
        frame.push_row(values)?;
    }
    Ok(frame)
}

pub(crate) fn sqlite_frame(rows: &[SqliteRow], fallback: &[String]) -> StoreResult<Frame> {
    build_frame(rows, fallback, sqlite_value)
}

pub(crate) fn postgres_frame(rows: &[PgRow], fallback: &[String]) -> StoreResult<Frame> {
    build_frame(rows, fallback, postgres_value)
}

// SQLite reports the storage class of each value, not the declared type.
fn sqlite_value(row: &SqliteRow, idx: usize) -> StoreResult<Value> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" | "INT" | "INT4" | "INT8" | "BIGINT" => {
            Value::Int(row.try_get_unchecked::<i64, _>(idx)?)
        }
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
            Value::Float(row.try_get_unchecked::<f64, _>(idx)?)
        }
        "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(idx)?),
        "BLOB" => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
            Value::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::Text(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}

fn postgres_value(row: &PgRow, idx: usize) -> StoreResult<Value> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "INT2" => Value::Int(i64::from(row.try_get::<i16, _>(idx)?)),
        "INT4" => Value::Int(i64::from(row.try_get::<i32, _>(idx)?)),
        "INT8" => Value::Int(row.try_get::<i64, _>(idx)?),
        "FLOAT4" => Value::Float(f64::from(row.try_get::<f32, _>(idx)?)),
        "FLOAT8" => Value::Float(row.try_get::<f64, _>(idx)?),
        "BOOL" => Value::Bool(row.try_get::<bool, _>(idx)?),
        "NUMERIC" => match row.try_get::<Decimal, _>(idx) {
            Ok(decimal) => decimal
                .to_f64()
                .map(Value::Float)
                .unwrap_or_else(|| Value::Text(decimal.to_string())),
            // NaN and values beyond 28 significant digits.
            Err(e) => {
                tracing::warn!(
                    column = row.column(idx).name(),
                    error = %e,
                    "NUMERIC value not representable, returning null"
                );
                Value::Null
            }
        },
        "DATE" => Value::Text(row.try_get::<Date, _>(idx)?.to_string()),
        "TIMESTAMP" => Value::Text(row.try_get::<PrimitiveDateTime, _>(idx)?.to_string()),
        "TIMESTAMPTZ" => Value::Text(row.try_get::<OffsetDateTime, _>(idx)?.to_string()),
        _ => match row.try_get::<String, _>(idx) {
            Ok(text) => Value::Text(text),
            Err(e) => {
                tracing::warn!(
                    column = row.column(idx).name(),
                    type_name = %type_name,
                    error = %e,
                    "Unsupported column type, returning null"
                );
                Value::Null
            }
        },
    };
    Ok(value)
}
