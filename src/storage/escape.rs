//! SQL literal rendering for values that cannot be bound as parameters.
//!
//! Statements issued by this crate bind their values through `?` placeholders.
//! [`escape_value`] is for text that cannot be bound, such as a composed query
//! rendered inline for debug logs. It produces literals only, never identifiers.

use rusqlite::types::Value;

/// Render `value` as a SQLite literal. `NULL` renders as the empty string
/// literal `''`, matching how absent upload fields are stored.
pub fn escape_value(value: &Value) -> String {
    match value {
        Value::Null => "''".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) if f.is_finite() => f.to_string(),
        Value::Real(_) => "NULL".to_string(),
        Value::Text(s) => escape_str(s),
        Value::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}

/// Quote a string literal, doubling embedded single quotes.
pub fn escape_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Substitute each positional `?` in `sql` with the escaped form of the
/// matching value. Placeholders inside quoted literals are left untouched.
pub fn inline_params(sql: &str, values: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut values = values.iter();
    let mut in_literal = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => match values.next() {
                Some(v) => out.push_str(&escape_value(v)),
                None => out.push(ch),
            },
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_are_doubled() {
        assert_eq!(
            escape_value(&Value::Text("O'Brien".into())),
            "'O''Brien'"
        );
        assert_eq!(
            escape_value(&Value::Text("x' OR '1'='1".into())),
            "'x'' OR ''1''=''1'"
        );
    }

    #[test]
    fn test_null_renders_empty_literal() {
        assert_eq!(escape_value(&Value::Null), "''");
    }

    #[test]
    fn test_numbers_and_blobs() {
        assert_eq!(escape_value(&Value::Integer(-42)), "-42");
        assert_eq!(escape_value(&Value::Real(1.5)), "1.5");
        assert_eq!(escape_value(&Value::Real(f64::NAN)), "NULL");
        assert_eq!(escape_value(&Value::Blob(vec![0xde, 0xad])), "X'DEAD'");
    }

    #[test]
    fn test_inline_params_skips_quoted_question_marks() {
        let sql = "SELECT '?' FROM data WHERE date >= datetime('now', ?) AND author = ?";
        let inlined = inline_params(
            sql,
            &[Value::Text("-7 days".into()), Value::Text("a'b".into())],
        );
        assert_eq!(
            inlined,
            "SELECT '?' FROM data WHERE date >= datetime('now', '-7 days') AND author = 'a''b'"
        );
    }
}
