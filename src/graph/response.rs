//! Classification of query-language response bodies.

use serde_json::Value;

/// Shape of a parsed response body
#[derive(Debug, Clone, PartialEq)]
pub enum GraphResponse {
    /// Body carried `data` and no `errors`
    Data(Value),
    /// Body carried `errors`; holds the whole body
    QueryErrors(Value),
    /// Body carried neither
    Malformed,
}

impl GraphResponse {
    /// `errors` takes precedence over `data`; member presence counts, even when null.
    pub fn classify(body: Value) -> Self {
        let has_errors = body.as_object().is_some_and(|obj| obj.contains_key("errors"));
        if has_errors {
            return GraphResponse::QueryErrors(body);
        }
        match body {
            Value::Object(mut obj) => match obj.remove("data") {
                Some(data) => GraphResponse::Data(data),
                None => GraphResponse::Malformed,
            },
            _ => GraphResponse::Malformed,
        }
    }
}
