//! Small SELECT builder that keeps every user-supplied value out of the SQL text.
//!
//! Fragments passed in are `'static` so only code-owned SQL can reach the
//! statement; values travel separately as bound parameters.

use rusqlite::types::Value;

#[derive(Debug, Clone)]
pub(crate) struct SelectQuery {
    columns: &'static str,
    table: &'static str,
    conditions: Vec<String>,
    order_by: Option<&'static str>,
    limit: Option<i64>,
    params: Vec<Value>,
}

impl SelectQuery {
    pub(crate) fn new(columns: &'static str, table: &'static str) -> Self {
        Self {
            columns,
            table,
            conditions: Vec::new(),
            order_by: None,
            limit: None,
            params: Vec::new(),
        }
    }

    /// Add a condition with one `?` placeholder per value in `params`.
    pub(crate) fn filter<I>(mut self, fragment: &'static str, params: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.conditions.push(fragment.to_string());
        self.params.extend(params);
        self
    }

    /// `column IN (?, ?, ...)`. An empty set matches nothing.
    pub(crate) fn filter_in<I>(mut self, column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let values: Vec<Value> = values.into_iter().collect();
        if values.is_empty() {
            self.conditions.push("0 = 1".to_string());
            return self;
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        self.conditions.push(format!("{column} IN ({placeholders})"));
        self.params.extend(values);
        self
    }

    pub(crate) fn order_by(mut self, clause: &'static str) -> Self {
        self.order_by = Some(clause);
        self
    }

    pub(crate) fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX));
        self
    }

    /// SQL text plus parameters in placeholder order.
    pub(crate) fn build(self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {} FROM {}", self.columns, self.table);
        let mut params = self.params;

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }

        if let Some(order_by) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(limit));
        }

        (sql, params)
    }
}

/// Wrap text for a `LIKE ... ESCAPE '\'` substring match, escaping wildcards.
pub(crate) fn like_contains(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
