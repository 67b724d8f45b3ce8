//! Filter and sort compilation.
//!
//! Walks a selection tree and turns the comparison and sort arguments on its
//! fields into a document-query filter plus an ordered sort specification.
//! Paths are dotted storage names and are not checked against any type graph.

mod filter;
mod literal;
mod selection;
mod sort;

pub use filter::{
    ComparisonClause, ComparisonOperator, FilterMap, FilterNode, LogicalOperator,
    compile_filter, filter_to_json,
};
pub use literal::{const_to_json, parse_literal};
pub use selection::{RequestDocument, SelectionContext, SelectionNode};
pub use sort::{SortEntry, SortMap, collect_sort_entries, compile_sort, order_entries, parse_direction};

use crate::error::Result;
use indexmap::IndexMap;
use serde_json::{Value as Json, json};

/// Filter and sort for one root field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub filter: FilterMap,
    pub sort: SortMap,
}

impl CompiledQuery {
    pub fn to_json(&self) -> Json {
        json!({
            "filter": filter_to_json(&self.filter),
            "sort": self.sort,
        })
    }
}

/// Compiles both halves; either failing fails the whole query.
pub fn compile<S: SelectionNode>(ctx: Option<&S>) -> Result<CompiledQuery> {
    Ok(CompiledQuery {
        filter: compile_filter(ctx)?,
        sort: compile_sort(ctx)?,
    })
}

/// Compiles every root field of a request, keyed by response key.
pub fn compile_request(
    query: &str,
    operation: Option<&str>,
    variables: Option<Json>,
) -> Result<IndexMap<String, CompiledQuery>> {
    let document = RequestDocument::parse(query, variables)?;
    let mut compiled = IndexMap::new();
    for root in document.root_fields(operation)? {
        compiled.insert(root.response_key().to_string(), compile(Some(&root))?);
    }
    Ok(compiled)
}
