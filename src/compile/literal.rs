use async_graphql::Variables;
use async_graphql_value::{ConstValue, Value};
use serde_json::{Map, Value as Json};

/// Converts an argument literal to JSON by its syntactic kind. Variables are
/// looked up in `variables`; an unbound variable reads as `null`.
pub fn parse_literal(value: &Value, variables: &Variables) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.clone()),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Enum(name) => Json::String(name.to_string()),
        Value::List(items) => Json::Array(items.iter().map(|v| parse_literal(v, variables)).collect()),
        Value::Variable(name) => variables
            .get(name)
            .map(|v| const_to_json(v.clone()))
            .unwrap_or(Json::Null),
        Value::Binary(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        Value::Object(fields) => Json::Object(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), parse_literal(v, variables)))
                .collect::<Map<_, _>>(),
        ),
    }
}

/// Const values come from live requests, where variables are already bound.
pub fn const_to_json(value: ConstValue) -> Json {
    match value {
        ConstValue::Null => Json::Null,
        ConstValue::Number(n) => Json::Number(n),
        ConstValue::String(s) => Json::String(s),
        ConstValue::Boolean(b) => Json::Bool(b),
        ConstValue::Enum(name) => Json::String(name.to_string()),
        ConstValue::Binary(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        ConstValue::List(items) => Json::Array(items.into_iter().map(const_to_json).collect()),
        ConstValue::Object(fields) => Json::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), const_to_json(v)))
                .collect(),
        ),
    }
}
