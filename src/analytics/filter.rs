use crate::analytics::types::DateRange;
use crate::storage::escape;
use rusqlite::types::Value;

/// WHERE-clause fragment over `data.date` with its bound values, plus the
/// label reported as the response `period`.
#[derive(Debug, Clone, PartialEq)]
pub struct DateFilter {
    pub clause: String,
    pub params: Vec<Value>,
    pub label: String,
}

impl DateFilter {
    pub fn build(range: &DateRange) -> Self {
        match range {
            DateRange::Between { start, end } => Self {
                clause: "date(date) BETWEEN ? AND ?".to_string(),
                params: vec![
                    Value::Text(start.to_string()),
                    Value::Text(end.to_string()),
                ],
                label: format!("{start}_{end}"),
            },
            DateRange::Last { period } => Self {
                clause: "date >= datetime('now', ?)".to_string(),
                params: vec![Value::Text(format!("-{} days", period.days()))],
                label: period.to_string(),
            },
        }
    }

    /// `sql` with this filter's placeholders replaced by escaped literals.
    /// For logging only; execution always binds.
    pub fn inline(&self, sql: &str) -> String {
        escape::inline_params(sql, &self.params)
    }
}
