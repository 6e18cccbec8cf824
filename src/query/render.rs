//! Rendering for the PostgREST-style data API.

use chrono::SecondsFormat;

use super::{Filter, JobQuery, OrderBy, Value};

impl Value {
    fn render(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Text(s) => s.clone(),
            Value::Time(t) => t.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Quote a list member so reserved characters (`,` `(` `)` `"`) survive.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Escape pattern metacharacters so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_' | '*') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Filter {
    /// `(column, operator.value)` query pair.
    pub fn to_pair(&self) -> (String, String) {
        let column = self.column().as_str().to_string();
        let condition = match self {
            Filter::Eq(_, v) => format!("eq.{}", v.render()),
            Filter::In(_, values) => {
                let list: Vec<String> = values.iter().map(|v| quote(v)).collect();
                format!("in.({})", list.join(","))
            }
            Filter::ContainsIgnoreCase(_, text) => format!("ilike.%{}%", escape_like(text)),
            Filter::Gte(_, v) => format!("gte.{}", v.render()),
            Filter::Lte(_, v) => format!("lte.{}", v.render()),
        };
        (column, condition)
    }
}

impl OrderBy {
    fn render(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        if self.nulls_last {
            format!("{}.{}.nullslast", self.column, direction)
        } else {
            format!("{}.{}", self.column, direction)
        }
    }
}

impl JobQuery {
    /// Query-string pairs selecting every column of the matching page.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(self.filters.iter().map(Filter::to_pair));

        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(OrderBy::render).collect();
            pairs.push(("order".to_string(), order.join(",")));
        }

        pairs.push(("offset".to_string(), self.offset.to_string()));
        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs
    }
}
