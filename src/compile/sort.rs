use super::selection::{SelectionNode, walk};
use crate::error::Result;
use crate::graph::args::{SORT_ARG, SORT_ORDER_ARG};
use indexmap::IndexMap;
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEntry {
    pub path: String,
    /// `1` ascending, `-1` descending
    pub direction: i8,
    /// Explicit precedence; `None` sorts after every explicit priority
    pub priority: Option<i64>,
}

/// Ordered path → direction.
pub type SortMap = IndexMap<String, i8>;

pub fn parse_direction(value: &Json) -> i8 {
    match value {
        Json::String(s) if s.eq_ignore_ascii_case("desc") || s == "-1" => -1,
        Json::Number(n) if n.as_f64().is_some_and(|n| n < 0.0) => -1,
        _ => 1,
    }
}

/// Every field below `ctx` carrying a `sort` argument, in selection order.
pub fn collect_sort_entries<S: SelectionNode>(ctx: Option<&S>) -> Result<Vec<SortEntry>> {
    let mut entries = Vec::new();
    let Some(ctx) = ctx else {
        return Ok(entries);
    };
    walk(ctx, "", &mut |path: &str, node: &S| {
        let mut direction = None;
        let mut priority = None;
        for (name, value) in node.arguments()? {
            if name == SORT_ARG {
                direction = Some(parse_direction(&value));
            } else if name == SORT_ORDER_ARG {
                priority = value.as_i64();
            }
        }
        if let Some(direction) = direction {
            entries.push(SortEntry {
                path: path.to_string(),
                direction,
                priority,
            });
        }
        Ok(())
    })?;
    Ok(entries)
}

/// Orders entries by priority, then path, then direction, and folds them into
/// a map. A later entry for the same path overwrites the direction but keeps
/// the position of the first.
pub fn order_entries(mut entries: Vec<SortEntry>) -> SortMap {
    entries.sort_by(|a, b| {
        (a.priority.is_none(), a.priority, &a.path, a.direction).cmp(&(
            b.priority.is_none(),
            b.priority,
            &b.path,
            b.direction,
        ))
    });
    entries.into_iter().fold(SortMap::new(), |mut map, entry| {
        map.insert(entry.path, entry.direction);
        map
    })
}

pub fn compile_sort<S: SelectionNode>(ctx: Option<&S>) -> Result<SortMap> {
    collect_sort_entries(ctx).map(order_entries)
}
