//! Selection trees the compiler can walk.
//!
//! [`SelectionNode`] abstracts over a parsed request document
//! ([`SelectionContext`]) and a live request's [`async_graphql::SelectionField`].
//! Fragments are flattened into their parent selection by the node itself.

use super::literal::{const_to_json, parse_literal};
use crate::error::{Result, TypegraphError};
use async_graphql::Variables;
use async_graphql_parser::types::{
    DocumentOperations, ExecutableDocument, Field, OperationDefinition, Selection, SelectionSet,
};
use serde_json::Value as Json;

pub trait SelectionNode: Sized {
    /// Storage-facing name of the selected field
    fn name(&self) -> &str;

    /// Arguments in the order the request wrote them, with literals converted.
    fn arguments(&self) -> Result<Vec<(String, Json)>>;

    /// Child fields, with inline fragments and fragment spreads flattened.
    fn children(&self) -> Result<Vec<Self>>;
}

/// Visits every field below `node` depth-first, with its dotted path.
pub(crate) fn walk<S, F>(node: &S, prefix: &str, visit: &mut F) -> Result<()>
where
    S: SelectionNode,
    F: FnMut(&str, &S) -> Result<()>,
{
    for child in node.children()? {
        let path = if prefix.is_empty() {
            child.name().to_string()
        } else {
            format!("{}.{}", prefix, child.name())
        };
        visit(&path, &child)?;
        walk(&child, &path, visit)?;
    }
    Ok(())
}

/// A parsed request with its variable bindings.
pub struct RequestDocument {
    document: ExecutableDocument,
    variables: Variables,
}

impl RequestDocument {
    pub fn parse(query: &str, variables: Option<Json>) -> Result<Self> {
        let document = async_graphql_parser::parse_query(query)
            .map_err(|e| TypegraphError::Parse(e.to_string()))?;
        let variables = variables.map(Variables::from_json).unwrap_or_default();
        Ok(Self {
            document,
            variables,
        })
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    fn operation(&self, name: Option<&str>) -> Result<&OperationDefinition> {
        match (&self.document.operations, name) {
            (DocumentOperations::Single(op), _) => Ok(&op.node),
            (DocumentOperations::Multiple(ops), Some(name)) => ops
                .get(name)
                .map(|op| &op.node)
                .ok_or_else(|| TypegraphError::UnknownOperation(name.to_string())),
            (DocumentOperations::Multiple(ops), None) if ops.len() == 1 => {
                ops.values().next().map(|op| &op.node).ok_or_else(|| {
                    TypegraphError::UnknownOperation("<anonymous>".to_string())
                })
            }
            (DocumentOperations::Multiple(_), None) => Err(TypegraphError::UnknownOperation(
                "operation name required for a multi-operation document".to_string(),
            )),
        }
    }

    /// One context per top-level field of the chosen operation.
    pub fn root_fields(&self, operation: Option<&str>) -> Result<Vec<SelectionContext<'_>>> {
        let op = self.operation(operation)?;
        let root = SelectionContext {
            field: None,
            document: self,
            fragments: Vec::new(),
        };
        root.flatten(&op.selection_set.node)
    }
}

/// One selected field of a [`RequestDocument`].
#[derive(Clone)]
pub struct SelectionContext<'a> {
    field: Option<&'a Field>,
    document: &'a RequestDocument,
    /// Fragment spreads entered on the way here, for cycle detection
    fragments: Vec<&'a str>,
}

impl<'a> SelectionContext<'a> {
    /// Response key: the alias when given, else the field name.
    pub fn response_key(&self) -> &str {
        self.field
            .map(|f| f.response_key().node.as_str())
            .unwrap_or_default()
    }

    fn flatten(&self, set: &'a SelectionSet) -> Result<Vec<SelectionContext<'a>>> {
        let mut out = Vec::new();
        self.flatten_into(set, &self.fragments, &mut out)?;
        Ok(out)
    }

    fn flatten_into(
        &self,
        set: &'a SelectionSet,
        entered: &[&'a str],
        out: &mut Vec<SelectionContext<'a>>,
    ) -> Result<()> {
        for item in &set.items {
            match &item.node {
                Selection::Field(field) => out.push(SelectionContext {
                    field: Some(&field.node),
                    document: self.document,
                    fragments: entered.to_vec(),
                }),
                Selection::InlineFragment(fragment) => {
                    self.flatten_into(&fragment.node.selection_set.node, entered, out)?
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    if entered.contains(&name) {
                        return Err(TypegraphError::UnsupportedSelection(format!(
                            "fragment `{}` spreads itself",
                            name
                        )));
                    }
                    let definition =
                        self.document.document.fragments.get(name).ok_or_else(|| {
                            TypegraphError::UnsupportedSelection(format!(
                                "unknown fragment `{}`",
                                name
                            ))
                        })?;
                    let mut entered = entered.to_vec();
                    entered.push(name);
                    self.flatten_into(&definition.node.selection_set.node, &entered, out)?;
                }
            }
        }
        Ok(())
    }
}

impl SelectionNode for SelectionContext<'_> {
    fn name(&self) -> &str {
        self.field.map(|f| f.name.node.as_str()).unwrap_or_default()
    }

    fn arguments(&self) -> Result<Vec<(String, Json)>> {
        let Some(field) = self.field else {
            return Ok(Vec::new());
        };
        Ok(field
            .arguments
            .iter()
            .map(|(name, value)| {
                (
                    name.node.to_string(),
                    parse_literal(&value.node, &self.document.variables),
                )
            })
            .collect())
    }

    fn children(&self) -> Result<Vec<Self>> {
        match self.field {
            Some(field) => self.flatten(&field.selection_set.node),
            None => Ok(Vec::new()),
        }
    }
}

impl SelectionNode for async_graphql::SelectionField<'_> {
    fn name(&self) -> &str {
        async_graphql::SelectionField::name(self)
    }

    fn arguments(&self) -> Result<Vec<(String, Json)>> {
        let args = async_graphql::SelectionField::arguments(self)
            .map_err(|e| TypegraphError::UnsupportedSelection(e.message))?;
        Ok(args
            .into_iter()
            .map(|(name, value)| (name.to_string(), const_to_json(value)))
            .collect())
    }

    fn children(&self) -> Result<Vec<Self>> {
        Ok(self.selection_set().collect())
    }
}
