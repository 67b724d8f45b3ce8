use crate::compile::compile_request;
use anyhow::{Context, Result};
use serde_json::{Map, Value as Json};
use std::io::{self, Read};
use tracing::debug;

pub fn handle_compile(
    query: String,
    file: bool,
    variables: Option<String>,
    operation: Option<String>,
) -> Result<()> {
    let query = resolve_query(query, file)?;
    let variables = variables
        .map(|v| serde_json::from_str::<Json>(&v))
        .transpose()
        .context("Variables must be a JSON object")?;

    let compiled = compile_request(&query, operation.as_deref(), variables)?;
    debug!(roots = compiled.len(), "compiled");

    let out: Map<String, Json> = compiled
        .iter()
        .map(|(root, query)| (root.clone(), query.to_json()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&Json::Object(out))?);
    Ok(())
}

fn resolve_query(query: String, file: bool) -> Result<String> {
    if query == "-" {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        return Ok(content);
    }
    if file {
        return std::fs::read_to_string(&query)
            .with_context(|| format!("Failed to read query file {}", query));
    }
    Ok(query)
}
