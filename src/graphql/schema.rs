use std::sync::Arc;

use async_graphql::Value as GqlValue;
use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar as ScalarType, Schema, TypeRef,
};
use async_graphql_value::Name;
use serde_json::{Map, Value as Json, json};
use tracing::{debug, trace};

use crate::compile::{self, CompiledQuery, const_to_json};
use crate::error::{Result, TypegraphError};
use crate::graph::args::{LOGICAL_OPERATOR_ENUM, LOGICAL_OPERATORS, SORT_DIRECTION_ENUM, SORT_DIRECTIONS};
use crate::graph::naming::lower_first;
use crate::graph::{
    ArgType, ConnectionType, EnumType, FieldType, NamedType, OutputField, OutputType, Scalar,
    TypeGraph,
};
use crate::hooks::{HookRegistry, ResolveParams, Resolver};

pub const QUERY_TYPE: &str = "Query";

/// Exports `graph` as an executable schema. Root fields hand requests to
/// `resolver`; every other field reads from its parent's JSON value.
pub fn build_schema(
    graph: &TypeGraph,
    resolver: Arc<dyn Resolver>,
    hooks: &HookRegistry,
) -> Result<Schema> {
    // resolvers read enum items and identity sources from it at execution time
    let graph = Arc::new(graph.clone());
    let mut query = Object::new(QUERY_TYPE);
    let mut builder = Schema::build(QUERY_TYPE, None, None);

    for scalar in Scalar::CUSTOM {
        builder = builder.register(ScalarType::new(scalar.name()));
    }
    builder = builder
        .register(enum_type(SORT_DIRECTION_ENUM, SORT_DIRECTIONS))
        .register(enum_type(LOGICAL_OPERATOR_ENUM, LOGICAL_OPERATORS));

    let identity = graph.identity();
    builder = builder.register(
        Interface::new(identity.interface())
            .field(InterfaceField::new(identity.field(), TypeRef::named_nn(TypeRef::ID))),
    );

    for model in graph.models() {
        debug!(model = %model.name, "exporting");
        builder = builder.register(object_type(&graph, model, hooks)?);

        let root = hooks.compose(&model.hooks, resolver.clone())?;
        query = query
            .field(many_field(&graph, model, root.clone()))
            .field(by_id_field(&graph, model, root));
    }

    for named in graph.types() {
        trace!(ty = named.name(), "exporting");
        builder = match named {
            NamedType::Object(ty) => builder.register(object_type(&graph, ty, hooks)?),
            NamedType::Enum(ty) => builder.register(enum_type(&ty.name, ty.item_names())),
            NamedType::Input(ty) => {
                let input = ty.fields.values().fold(InputObject::new(&ty.name), |input, f| {
                    input.field(InputValue::new(&f.name, arg_type_ref(&f.ty)))
                });
                builder.register(input)
            }
            NamedType::Connection(conn) => {
                let (connection, edge) = connection_types(&graph, conn);
                builder.register(connection).register(edge)
            }
        };
    }

    builder
        .register(query)
        .finish()
        .map_err(|e| TypegraphError::Schema(format!("{:?}", e)))
}

fn enum_type<S: AsRef<str>>(name: &str, values: impl IntoIterator<Item = S>) -> Enum {
    values
        .into_iter()
        .fold(Enum::new(name), |e, v| e.item(EnumItem::new(v.as_ref())))
}

fn type_ref(ty: &FieldType) -> Result<TypeRef> {
    Ok(match ty {
        FieldType::Scalar(scalar) => TypeRef::named(scalar.name()),
        FieldType::Enum(name) | FieldType::Object(name) | FieldType::Connection(name) => {
            TypeRef::named(name.clone())
        }
        FieldType::List(inner) => TypeRef::List(Box::new(type_ref(inner)?)),
        FieldType::NonNull(inner) => TypeRef::NonNull(Box::new(type_ref(inner)?)),
        FieldType::Unresolved(slot) => {
            return Err(TypegraphError::UnresolvedReference {
                owner: slot.owner.clone(),
                path: slot.path.clone(),
            });
        }
    })
}

fn arg_type_ref(ty: &ArgType) -> TypeRef {
    match ty {
        ArgType::Named(name) => TypeRef::named(name.clone()),
        ArgType::List(inner) => TypeRef::List(Box::new(arg_type_ref(inner))),
    }
}

fn object_type(graph: &Arc<TypeGraph>, ty: &OutputType, hooks: &HookRegistry) -> Result<Object> {
    let mut object = Object::new(&ty.name);
    if let Some(description) = &ty.description {
        object = object.description(description);
    }
    if ty.identity.is_some() {
        object = object.implement(graph.identity().interface());
    }
    for field in ty.fields.values() {
        object = object.field(output_field(graph, &ty.name, field, hooks)?);
    }
    Ok(object)
}

/// Root resolver for schemas that are only printed, never executed.
pub struct NoData;

#[async_trait::async_trait]
impl Resolver for NoData {
    async fn resolve(&self, _params: &ResolveParams) -> anyhow::Result<Json> {
        Ok(Json::Null)
    }
}

/// Reads the field's source key from the parent value.
struct ParentValue {
    source: String,
}

#[async_trait::async_trait]
impl Resolver for ParentValue {
    async fn resolve(&self, params: &ResolveParams) -> anyhow::Result<Json> {
        Ok(params.parent.get(&self.source).cloned().unwrap_or(Json::Null))
    }
}

fn output_field(
    graph: &Arc<TypeGraph>,
    type_name: &str,
    field: &OutputField,
    hooks: &HookRegistry,
) -> Result<Field> {
    let resolver = hooks.compose(
        &field.hooks,
        Arc::new(ParentValue {
            source: field.source.clone(),
        }),
    )?;
    let graph = graph.clone();
    let ty = field.ty.clone();
    let type_name = type_name.to_string();
    let name = field.name.clone();

    let mut out = Field::new(&field.name, type_ref(&field.ty)?, move |ctx| {
        let graph = graph.clone();
        let resolver = resolver.clone();
        let ty = ty.clone();
        let type_name = type_name.clone();
        let name = name.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<Json>()?.clone();
            let params = ResolveParams {
                type_name,
                field: name,
                args: args_json(&ctx),
                parent,
                ..ResolveParams::default()
            };
            let value = resolver.resolve(&params).await?;
            Ok(field_value(&graph, &ty, value)?)
        })
    });
    if let Some(description) = &field.description {
        out = out.description(description);
    }
    for arg in &field.args {
        out = out.argument(InputValue::new(&arg.name, arg_type_ref(&arg.ty)));
    }
    Ok(out)
}

fn args_json(ctx: &ResolverContext<'_>) -> Json {
    Json::Object(
        ctx.args
            .as_index_map()
            .iter()
            .map(|(k, v)| (k.to_string(), const_to_json(v.clone())))
            .collect::<Map<_, _>>(),
    )
}

/// Params for a root field, carrying the filter and sort compiled from the
/// field's own selection.
fn root_params(
    graph: &TypeGraph,
    ctx: &ResolverContext<'_>,
    model: &str,
    field: &str,
) -> Result<ResolveParams> {
    let selection = ctx.ctx.field();
    let mut query = compile::compile(Some(&selection))?;
    restore_enum_sources(graph, model, &mut query);
    Ok(ResolveParams {
        type_name: model.to_string(),
        field: field.to_string(),
        args: args_json(ctx),
        parent: Json::Null,
        query,
    })
}

/// Rewrites enum items in filter values back to the stored values they name.
fn restore_enum_sources(graph: &TypeGraph, model: &str, query: &mut CompiledQuery) {
    for (path, node) in query.filter.iter_mut() {
        let Some(FieldType::Enum(name)) = graph.field_at(model, path).map(|f| f.ty.innermost())
        else {
            continue;
        };
        let Some(ty) = graph.enum_type(name) else {
            continue;
        };
        for clause in node.clauses_mut() {
            restore_enum_value(ty, &mut clause.value);
        }
    }
}

fn restore_enum_value(ty: &EnumType, value: &mut Json) {
    match value {
        Json::String(item) => {
            if let Some(source) = ty.source_of(item) {
                *item = source.to_string();
            }
        }
        Json::Array(items) => items.iter_mut().for_each(|v| restore_enum_value(ty, v)),
        _ => {}
    }
}

fn many_field(graph: &Arc<TypeGraph>, model: &OutputType, resolver: Arc<dyn Resolver>) -> Field {
    let name = format!("{}Many", lower_first(&model.name));
    let model_name = model.name.clone();
    let field_name = name.clone();
    let ty = FieldType::Object(model.name.clone()).non_null().list().non_null();
    let graph = graph.clone();

    Field::new(name, TypeRef::named_nn_list_nn(model.name.clone()), move |ctx| {
        let graph = graph.clone();
        let resolver = resolver.clone();
        let model_name = model_name.clone();
        let field_name = field_name.clone();
        let ty = ty.clone();
        FieldFuture::new(async move {
            let params = root_params(&graph, &ctx, &model_name, &field_name)?;
            trace!(field = %field_name, filter = ?params.query.filter, "resolving");
            let value = resolver.resolve(&params).await?;
            Ok(field_value(&graph, &ty, value)?)
        })
    })
    .argument(InputValue::new("limit", TypeRef::named(TypeRef::INT)))
    .argument(InputValue::new("skip", TypeRef::named(TypeRef::INT)))
}

fn by_id_field(graph: &Arc<TypeGraph>, model: &OutputType, resolver: Arc<dyn Resolver>) -> Field {
    let name = format!("{}ById", lower_first(&model.name));
    let model_name = model.name.clone();
    let field_name = name.clone();
    let ty = FieldType::Object(model.name.clone());
    let graph = graph.clone();

    Field::new(name, TypeRef::named(model.name.clone()), move |ctx| {
        let graph = graph.clone();
        let resolver = resolver.clone();
        let model_name = model_name.clone();
        let field_name = field_name.clone();
        let ty = ty.clone();
        FieldFuture::new(async move {
            let params = root_params(&graph, &ctx, &model_name, &field_name)?;
            let value = resolver.resolve(&params).await?;
            Ok(field_value(&graph, &ty, first_if_list(value))?)
        })
    })
    .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID)))
}

fn first_if_list(value: Json) -> Json {
    match value {
        Json::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        Json::Array(_) => Json::Null,
        other => other,
    }
}

/// Storage key of the identity field of `model`, if it is a registered model.
fn identity_source(graph: &TypeGraph, model: &str) -> Option<String> {
    graph
        .model(model)
        .and_then(|m| m.field(graph.identity().field()))
        .map(|f| f.source.clone())
}

/// Shapes a JSON result for the output type. Object-like values are passed
/// down as JSON for child resolvers to read. A bare id standing in for a
/// model record is wrapped into a record holding only the identity.
fn field_value(
    graph: &TypeGraph,
    ty: &FieldType,
    value: Json,
) -> Result<Option<FieldValue<'static>>> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(match ty {
        FieldType::NonNull(inner) => return field_value(graph, inner, value),
        FieldType::List(inner) => {
            let items = match value {
                Json::Array(items) => items,
                single => vec![single],
            };
            let values = items
                .into_iter()
                .map(|item| Ok(field_value(graph, inner, item)?.unwrap_or(FieldValue::NULL)))
                .collect::<Result<Vec<_>>>()?;
            FieldValue::list(values)
        }
        FieldType::Scalar(_) => FieldValue::value(GqlValue::from_json(value)?),
        FieldType::Enum(name) => match value {
            Json::String(s) => {
                let item = graph
                    .enum_type(name)
                    .and_then(|e| e.item_for(&s))
                    .map(str::to_string)
                    .unwrap_or(s);
                FieldValue::value(GqlValue::Enum(Name::new(item)))
            }
            other => FieldValue::value(GqlValue::from_json(other)?),
        },
        FieldType::Object(name) => match (value, identity_source(graph, name)) {
            (record @ Json::Object(_), _) | (record, None) => FieldValue::owned_any(record),
            (id, Some(source)) => FieldValue::owned_any(json!({ source: id })),
        },
        FieldType::Connection(_) => FieldValue::owned_any(value),
        FieldType::Unresolved(slot) => {
            return Err(TypegraphError::UnresolvedReference {
                owner: slot.owner.clone(),
                path: slot.path.clone(),
            });
        }
    }))
}

/// `count` and `edges { node cursor }` over the parent's list of referenced
/// records. Bare ids are wrapped into a record holding only the identity.
fn connection_types(graph: &TypeGraph, conn: &ConnectionType) -> (Object, Object) {
    let id_source = identity_source(graph, &conn.node)
        .unwrap_or_else(|| graph.identity().field().to_string());

    let connection = Object::new(&conn.name)
        .field(Field::new("count", TypeRef::named_nn(TypeRef::INT), |ctx| {
            FieldFuture::new(async move {
                let items = ctx.parent_value.try_downcast_ref::<Json>()?;
                let count = items.as_array().map(Vec::len).unwrap_or_default();
                Ok(Some(FieldValue::value(count as i32)))
            })
        }))
        .field(Field::new(
            "edges",
            TypeRef::named_nn_list_nn(conn.edge.clone()),
            |ctx| {
                FieldFuture::new(async move {
                    let items = ctx.parent_value.try_downcast_ref::<Json>()?;
                    let edges = items
                        .as_array()
                        .into_iter()
                        .flatten()
                        .enumerate()
                        .map(|(i, node)| {
                            FieldValue::owned_any(json!({ "node": node, "cursor": i.to_string() }))
                        });
                    Ok(Some(FieldValue::list(edges)))
                })
            },
        ));

    let edge = Object::new(&conn.edge)
        .field(Field::new("node", TypeRef::named_nn(conn.node.clone()), move |ctx| {
            let id_source = id_source.clone();
            FieldFuture::new(async move {
                let edge = ctx.parent_value.try_downcast_ref::<Json>()?;
                let node = match edge.get("node") {
                    Some(Json::Object(record)) => Json::Object(record.clone()),
                    Some(Json::Null) | None => return Ok(None),
                    Some(id) => json!({ id_source: id }),
                };
                Ok(Some(FieldValue::owned_any(node)))
            })
        }))
        .field(Field::new("cursor", TypeRef::named_nn(TypeRef::STRING), |ctx| {
            FieldFuture::new(async move {
                let edge = ctx.parent_value.try_downcast_ref::<Json>()?;
                let cursor = edge.get("cursor").and_then(Json::as_str).unwrap_or_default();
                Ok(Some(FieldValue::value(cursor.to_string())))
            })
        }));

    (connection, edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Synthesizer;
    use crate::hooks::{HookOutcome, PostHook};
    use crate::model::{FieldDescriptor, HookConfig, ModelDescriptor, ScalarKind};
    use parking_lot::Mutex;

    struct Records {
        seen: Arc<Mutex<Vec<ResolveParams>>>,
    }

    #[async_trait::async_trait]
    impl Resolver for Records {
        async fn resolve(&self, params: &ResolveParams) -> anyhow::Result<Json> {
            self.seen.lock().push(params.clone());
            Ok(json!([
                { "_id": "u1", "name": "Ada", "age": 36.5, "status": "active",
                  "address": { "city": "London" }, "friends": ["u2", { "_id": "u3", "name": "Bo" }] },
            ]))
        }
    }

    struct Shout;

    #[async_trait::async_trait]
    impl PostHook for Shout {
        async fn run(&self, result: &Json, _params: &ResolveParams) -> anyhow::Result<HookOutcome> {
            Ok(HookOutcome::from_value(result.as_str().map(|s| json!(s.to_uppercase()))))
        }
    }

    fn models() -> Vec<ModelDescriptor> {
        vec![ModelDescriptor::new(
            "users",
            "User",
            vec![
                FieldDescriptor::scalar("_id", ScalarKind::ObjectId),
                FieldDescriptor::scalar("name", ScalarKind::String).with_hooks(HookConfig {
                    pre: vec![],
                    post: vec!["shout".into()],
                }),
                FieldDescriptor::scalar("age", ScalarKind::Number),
                FieldDescriptor::enumeration("status", ["active", "banned"]),
                FieldDescriptor::nested(
                    "address",
                    vec![FieldDescriptor::scalar("city", ScalarKind::String)],
                ),
                FieldDescriptor::references("friends", "User"),
            ],
        )]
    }

    fn schema(seen: Arc<Mutex<Vec<ResolveParams>>>) -> Schema {
        let graph = Synthesizer::default().synthesize(&models()).unwrap();
        let mut hooks = HookRegistry::new();
        hooks.register_post("shout", Arc::new(Shout));
        build_schema(&graph, Arc::new(Records { seen }), &hooks).unwrap()
    }

    #[test]
    fn test_sdl_contains_graph_types() {
        let sdl = schema(Arc::default()).sdl();
        assert!(sdl.contains("type User implements Node"));
        assert!(sdl.contains("interface Node"));
        assert!(sdl.contains("type UserAddress"));
        assert!(sdl.contains("enum UserStatusEnum"));
        assert!(sdl.contains("type UserFriendsConnection"));
        assert!(sdl.contains("userMany(limit: Int, skip: Int): [User!]!"));
        assert!(sdl.contains("userById(id: ID!): User"));
        assert!(sdl.contains("scalar JSON"));
    }

    #[tokio::test]
    async fn test_execute_resolves_nested_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let response = schema(seen.clone())
            .execute(
                r#"{ userMany(limit: 5) {
                    id name age(gt: 30, sort: DESC) status
                    address { city }
                    friends { count edges { cursor node { id name } } }
                } }"#,
            )
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let data = response.data.into_json().unwrap();
        assert_eq!(
            data,
            json!({ "userMany": [{
                "id": "u1", "name": "ADA", "age": 36.5, "status": "active",
                "address": { "city": "London" },
                "friends": { "count": 2, "edges": [
                    { "cursor": "0", "node": { "id": "u2", "name": null } },
                    { "cursor": "1", "node": { "id": "u3", "name": "BO" } },
                ] },
            }] })
        );

        let params = seen.lock();
        assert_eq!(params[0].type_name, "User");
        assert_eq!(params[0].args, json!({ "limit": 5 }));
        assert_eq!(
            compile::filter_to_json(&params[0].query.filter),
            json!({ "age": { "$gt": 30 } })
        );
        assert_eq!(params[0].query.sort.get("age"), Some(&-1));
    }

    struct Posts {
        seen: Arc<Mutex<Vec<ResolveParams>>>,
    }

    #[async_trait::async_trait]
    impl Resolver for Posts {
        async fn resolve(&self, params: &ResolveParams) -> anyhow::Result<Json> {
            self.seen.lock().push(params.clone());
            Ok(json!([{ "_id": "p1", "author": "u1", "state": "in-progress" }]))
        }
    }

    fn post_schema(seen: Arc<Mutex<Vec<ResolveParams>>>) -> Schema {
        let models = vec![
            ModelDescriptor::new(
                "users",
                "User",
                vec![FieldDescriptor::scalar("_id", ScalarKind::ObjectId)],
            ),
            ModelDescriptor::new(
                "posts",
                "Post",
                vec![
                    FieldDescriptor::scalar("_id", ScalarKind::ObjectId),
                    FieldDescriptor::reference("author", "User").non_null(),
                    FieldDescriptor::enumeration("state", ["in-progress", "done"]),
                ],
            ),
        ];
        let graph = Synthesizer::default().synthesize(&models).unwrap();
        build_schema(&graph, Arc::new(Posts { seen }), &HookRegistry::new()).unwrap()
    }

    #[tokio::test]
    async fn test_bare_id_reference_resolves_to_record() {
        let response = post_schema(Arc::default())
            .execute("{ postMany { id author { id } } }")
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "postMany": [{ "id": "p1", "author": { "id": "u1" } }] })
        );
    }

    #[tokio::test]
    async fn test_enum_items_translate_both_ways() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let response = post_schema(seen.clone())
            .execute("{ postMany { state(in: [in_progress, done]) } }")
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "postMany": [{ "state": "in_progress" }] })
        );
        assert_eq!(
            compile::filter_to_json(&seen.lock()[0].query.filter),
            json!({ "state": { "$in": ["in-progress", "done"] } })
        );
    }

    #[test]
    fn test_hollow_nested_field_exports() {
        let models = vec![ModelDescriptor::new(
            "users",
            "User",
            vec![
                FieldDescriptor::scalar("name", ScalarKind::String),
                FieldDescriptor::nested(
                    "secret",
                    vec![FieldDescriptor::scalar("k", ScalarKind::String).hidden()],
                ),
            ],
        )];
        let graph = Synthesizer::default().synthesize(&models).unwrap();
        let sdl = build_schema(&graph, Arc::new(NoData), &HookRegistry::new())
            .unwrap()
            .sdl();
        assert!(!sdl.contains("UserSecret"));
    }
}
