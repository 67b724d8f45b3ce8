use super::selection::{SelectionNode, walk};
use crate::error::Result;
use crate::graph::args::OP_ARG;
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    In,
    Nin,
    All,
    Size,
    ElemMatch,
}

impl ComparisonOperator {
    /// Operator for a field argument name, if it is one.
    pub fn from_argument(name: &str) -> Option<Self> {
        Some(match name {
            "eq" => Self::Eq,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "ne" => Self::Ne,
            "in" => Self::In,
            "nin" => Self::Nin,
            "all" => Self::All,
            "size" => Self::Size,
            "elemMatch" => Self::ElemMatch,
            _ => return None,
        })
    }

    /// Document-query operator key, e.g. `$gte`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Ne => "$ne",
            Self::In => "$in",
            Self::Nin => "$nin",
            Self::All => "$all",
            Self::Size => "$size",
            Self::ElemMatch => "$elemMatch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
    Not,
    Nor,
}

impl LogicalOperator {
    pub fn key(&self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
            Self::Not => "$not",
            Self::Nor => "$nor",
        }
    }
}

impl FromStr for LogicalOperator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "not" => Ok(Self::Not),
            "nor" => Ok(Self::Nor),
            _ => Err(format!("Invalid logical operator: {}", s)),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key()[1..])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonClause {
    pub operator: ComparisonOperator,
    pub value: Json,
}

impl ComparisonClause {
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        map.insert(self.operator.key().to_string(), self.value.clone());
        Json::Object(map)
    }
}

/// Compiled predicate for one field path.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Clause(ComparisonClause),
    Combinator {
        op: LogicalOperator,
        clauses: Vec<ComparisonClause>,
    },
}

impl FilterNode {
    pub fn clauses_mut(&mut self) -> &mut [ComparisonClause] {
        match self {
            FilterNode::Clause(clause) => std::slice::from_mut(clause),
            FilterNode::Combinator { clauses, .. } => clauses,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            FilterNode::Clause(clause) => clause.to_json(),
            FilterNode::Combinator { op, clauses } => {
                let mut map = Map::new();
                map.insert(
                    op.key().to_string(),
                    Json::Array(clauses.iter().map(ComparisonClause::to_json).collect()),
                );
                Json::Object(map)
            }
        }
    }
}

pub type FilterMap = IndexMap<String, FilterNode>;

pub fn filter_to_json(filter: &FilterMap) -> Json {
    Json::Object(
        filter
            .iter()
            .map(|(path, node)| (path.clone(), node.to_json()))
            .collect(),
    )
}

/// Flattens the comparison arguments below `ctx` into one path → node map.
/// No context compiles to an empty map.
pub fn compile_filter<S: SelectionNode>(ctx: Option<&S>) -> Result<FilterMap> {
    let mut filter = FilterMap::new();
    let Some(ctx) = ctx else {
        return Ok(filter);
    };
    walk(ctx, "", &mut |path: &str, node: &S| {
        if let Some(compiled) = field_filter(node)? {
            filter.insert(path.to_string(), compiled);
        }
        Ok(())
    })?;
    Ok(filter)
}

fn field_filter<S: SelectionNode>(node: &S) -> Result<Option<FilterNode>> {
    let mut clauses = Vec::new();
    let mut op = LogicalOperator::default();
    for (name, value) in node.arguments()? {
        if name == OP_ARG {
            if let Some(parsed) = value.as_str().and_then(|s| s.parse().ok()) {
                op = parsed;
            }
            continue;
        }
        if let Some(operator) = ComparisonOperator::from_argument(&name) {
            clauses.push(ComparisonClause { operator, value });
        }
    }
    Ok(match clauses.len() {
        0 => None,
        1 => clauses.pop().map(FilterNode::Clause),
        _ => Some(FilterNode::Combinator { op, clauses }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::selection::{RequestDocument, SelectionContext};
    use serde_json::json;

    fn compile(query: &str) -> Json {
        let doc = RequestDocument::parse(query, None).unwrap();
        let roots = doc.root_fields(None).unwrap();
        filter_to_json(&compile_filter(roots.first()).unwrap())
    }

    #[test]
    fn test_multiple_clauses_group_under_op() {
        assert_eq!(
            compile(r#"{ users { friends(eq: "x", gt: "a", op: OR) } }"#),
            json!({ "friends": { "$or": [{ "$eq": "x" }, { "$gt": "a" }] } })
        );
    }

    #[test]
    fn test_single_clause_is_not_wrapped() {
        assert_eq!(
            compile("{ users { age(gt: 5) } }"),
            json!({ "age": { "$gt": 5 } })
        );
        assert_eq!(
            compile("{ users { age(gt: 5, op: OR) } }"),
            json!({ "age": { "$gt": 5 } })
        );
    }

    #[test]
    fn test_default_op_is_and() {
        assert_eq!(
            compile("{ users { age(gte: 18, lt: 65) } }"),
            json!({ "age": { "$and": [{ "$gte": 18 }, { "$lt": 65 }] } })
        );
        assert_eq!(
            compile(r#"{ users { age(gte: 18, lt: 65, op: "nor") } }"#),
            json!({ "age": { "$nor": [{ "$gte": 18 }, { "$lt": 65 }] } })
        );
    }

    #[test]
    fn test_nested_paths_and_fragments() {
        let query = r#"
            { users { name(in: ["a", "b"]) ...Geo } }
            fragment Geo on User { address { ... on UserAddress { city(ne: null) } } }
        "#;
        assert_eq!(
            compile(query),
            json!({
                "name": { "$in": ["a", "b"] },
                "address.city": { "$ne": null },
            })
        );
    }

    #[test]
    fn test_array_operators() {
        assert_eq!(
            compile(r#"{ posts { comments(size: 2, elemMatch: { body: "hi" }) { body } } }"#),
            json!({ "comments": { "$and": [{ "$size": 2 }, { "$elemMatch": { "body": "hi" } }] } })
        );
    }

    #[test]
    fn test_sort_arguments_are_not_clauses() {
        assert_eq!(compile("{ users { age(sort: DESC, sortOrder: 1) } }"), json!({}));
    }

    #[test]
    fn test_absent_context_is_empty() {
        assert!(compile_filter::<SelectionContext<'_>>(None).unwrap().is_empty());
        assert_eq!(compile("{ users }"), json!({}));
    }

    #[test]
    fn test_unknown_fragment_aborts() {
        let doc = RequestDocument::parse("{ users { age(gt: 1) ...Nope } }", None).unwrap();
        let roots = doc.root_fields(None).unwrap();
        assert!(compile_filter(roots.first()).is_err());
    }

    #[test]
    fn test_logical_operator_parse() {
        assert_eq!("OR".parse::<LogicalOperator>().unwrap(), LogicalOperator::Or);
        assert_eq!("nor".parse::<LogicalOperator>().unwrap(), LogicalOperator::Nor);
        assert!("xor".parse::<LogicalOperator>().is_err());
        assert_eq!(LogicalOperator::Not.to_string(), "not");
    }
}
