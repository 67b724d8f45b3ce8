use super::args::ArgumentDeriver;
use super::naming::{
    connection_type_name, edge_type_name, embedded_type_name, enum_type_name, nested_type_name,
    sanitize,
};
use super::types::{
    ArgType, ConnectionType, EnumType, EnumValue, FieldType, IdentityCapability, InputType, ModelTypes,
    NamedType, OutputField, OutputType, ReferenceSlot, Scalar, TypeGraph,
};
use crate::cache::{Caches, schema_key};
use crate::config::SynthSettings;
use crate::error::{Result, TypegraphError};
use crate::graph::args::{LOGICAL_OPERATOR_ENUM, SORT_DIRECTION_ENUM};
use crate::model::{
    Cardinality, DescriptorSource, ElementKind, FieldDescriptor, FieldKind, HookConfig,
    ModelDescriptor, ScalarKind,
};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Builds [`TypeGraph`]s from model descriptors.
///
/// Every synthesizer owns one canonical [`IdentityCapability`]; types it
/// hands out, fresh or cached, always carry that capability.
pub struct Synthesizer {
    caches: Caches,
    settings: SynthSettings,
    identity: IdentityCapability,
}

impl Synthesizer {
    pub fn new(caches: Caches, settings: SynthSettings) -> Self {
        Self {
            caches,
            settings,
            identity: IdentityCapability::new(),
        }
    }

    pub fn identity(&self) -> &IdentityCapability {
        &self.identity
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    /// Fetches every descriptor `source` offers, through the descriptor cache.
    pub fn load_descriptors(&self, source: &dyn DescriptorSource) -> Result<Vec<ModelDescriptor>> {
        source
            .keys()
            .iter()
            .map(|key| {
                self.caches
                    .descriptors
                    .get_or_try_build(key, || source.describe(key).map(Arc::new))
                    .map(|d| d.as_ref().clone())
            })
            .collect()
    }

    pub fn synthesize(&self, models: &[ModelDescriptor]) -> Result<Arc<TypeGraph>> {
        let key = schema_key(models);
        self.caches.schemas.get_or_try_build_with(
            &key,
            |graph| graph.identity().same_as(&self.identity),
            || self.build_graph(models).map(Arc::new),
        )
    }

    fn build_graph(&self, models: &[ModelDescriptor]) -> Result<TypeGraph> {
        let mut ctx = SynthesisContext::new(&self.settings, models)?;
        let mut reused: IndexMap<String, Arc<ModelTypes>> = IndexMap::new();

        for model in models {
            let key = model.cache_identity();
            match self.caches.types.get(&key) {
                Some(cached) if cached.root.has_identity_of(&self.identity) => {
                    // built by an earlier run: its slots were resolved there
                    debug!(model = %model.name, "reusing cached types");
                    reused.insert(model.name.clone(), cached);
                }
                Some(cached) => {
                    debug!(model = %model.name, "cached types carry a foreign identity, rebuilding");
                    let rebuilt = Arc::new(cached.with_identity(&self.identity));
                    self.caches.types.set(&key, rebuilt.clone());
                    reused.insert(model.name.clone(), rebuilt);
                }
                None => {
                    debug!(model = %model.name, "synthesizing");
                    ctx.build_model(model, &self.identity);
                }
            }
        }

        ctx.resolve_references()?;
        ctx.ensure_resolved()?;

        let (graph, fresh) = ctx.finish(self.identity.clone(), models, reused);
        for model_types in fresh {
            let key = models
                .iter()
                .find(|m| m.name == model_types.key)
                .map(ModelDescriptor::cache_identity)
                .unwrap_or_else(|| model_types.key.clone());
            self.caches.types.set(&key, Arc::new(model_types));
        }
        graph.validate()?;
        Ok(graph)
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(Caches::default(), SynthSettings::default())
    }
}

/// Arena for one synthesis run. Phase one fills it with skeleton types whose
/// references are [`FieldType::Unresolved`]; phase two replaces those in place.
struct SynthesisContext<'s> {
    settings: &'s SynthSettings,
    /// model name → output type name, for every model in the run
    model_names: IndexMap<String, String>,
    roots: IndexMap<String, OutputType>,
    /// root type name → model name
    root_models: IndexMap<String, String>,
    objects: IndexMap<String, OutputType>,
    embedded: HashSet<String>,
    /// embedded types whose fields were all excluded
    hollow: HashSet<String>,
    enums: IndexMap<String, EnumType>,
    inputs: IndexMap<String, InputType>,
    connections: IndexMap<String, ConnectionType>,
    pending: Vec<ReferenceSlot>,
}

impl<'s> SynthesisContext<'s> {
    fn new(settings: &'s SynthSettings, models: &[ModelDescriptor]) -> Result<Self> {
        let mut keys = HashSet::new();
        let mut model_names = IndexMap::new();
        for model in models {
            if !keys.insert(model.key.as_str()) {
                return Err(TypegraphError::DuplicateModel(model.key.clone()));
            }
            model_names.insert(model.name.clone(), sanitize(&model.name));
        }
        Ok(Self {
            settings,
            model_names,
            roots: IndexMap::new(),
            root_models: IndexMap::new(),
            objects: IndexMap::new(),
            embedded: HashSet::new(),
            hollow: HashSet::new(),
            enums: IndexMap::new(),
            inputs: IndexMap::new(),
            connections: IndexMap::new(),
            pending: Vec::new(),
        })
    }

    fn build_model(&mut self, model: &ModelDescriptor, identity: &IdentityCapability) {
        let type_name = sanitize(&model.name);
        let identity_source = if model.field(&self.settings.identity_field).is_some() {
            self.settings.identity_field.clone()
        } else {
            self.settings.legacy_identity_field.clone()
        };

        // a declared `id` only feeds the identity field, so it must not leave a slot behind
        let declared = model.fields.iter().filter(|f| sanitize(&f.name) != "id");
        let mut fields = IndexMap::new();
        fields.insert("id".to_string(), OutputField::identity(identity_source));
        fields.extend(self.build_fields(&type_name, &type_name, "", declared));

        let root = OutputType {
            name: type_name.clone(),
            description: model.description.clone(),
            fields,
            identity: Some(identity.clone()),
            embedded: false,
            hooks: model.hooks.clone(),
        };
        self.root_models.insert(type_name.clone(), model.name.clone());
        self.roots.insert(type_name, root);
    }

    fn is_excluded(&self, field: &FieldDescriptor) -> bool {
        field.hidden || field.name.starts_with(&self.settings.reserved_prefix)
    }

    /// Output fields for `descriptors`, which belong to `type_name`. `owner` is
    /// the root type and `prefix` the dotted path from it.
    /// A nested or embedded field left with no visible fields is dropped.
    fn build_fields<'d>(
        &mut self,
        owner: &str,
        type_name: &str,
        prefix: &str,
        descriptors: impl IntoIterator<Item = &'d FieldDescriptor>,
    ) -> IndexMap<String, OutputField> {
        let mut fields = IndexMap::new();
        for descriptor in descriptors {
            if self.is_excluded(descriptor) {
                trace!(field = %descriptor.name, "excluded");
                continue;
            }
            let path = if prefix.is_empty() {
                descriptor.name.clone()
            } else {
                format!("{}.{}", prefix, descriptor.name)
            };

            let Some(ty) = self.field_type(owner, type_name, &path, descriptor) else {
                trace!(field = %descriptor.name, "no visible fields, dropped");
                continue;
            };
            let ty = if descriptor.non_null && !ty.is_unresolved() {
                ty.non_null()
            } else {
                ty
            };
            let args = if ty.is_unresolved() {
                Vec::new()
            } else {
                ArgumentDeriver::new(&self.objects, &mut self.inputs).derive(&ty)
            };

            let name = sanitize(&descriptor.name);
            fields.insert(
                name.clone(),
                OutputField {
                    name,
                    source: descriptor.name.clone(),
                    ty,
                    description: descriptor.description.clone(),
                    args,
                    hooks: descriptor.hooks.clone(),
                    identity: false,
                },
            );
        }
        fields
    }

    fn field_type(
        &mut self,
        owner: &str,
        type_name: &str,
        path: &str,
        descriptor: &FieldDescriptor,
    ) -> Option<FieldType> {
        match &descriptor.kind {
            FieldKind::Scalar {
                scalar,
                enum_values,
            } => Some(self.scalar_type(type_name, &descriptor.name, scalar, enum_values)),
            FieldKind::List { element } => {
                let element = match element {
                    ElementKind::Scalar {
                        scalar,
                        enum_values,
                    } => Some(self.scalar_type(type_name, &descriptor.name, scalar, enum_values)),
                    ElementKind::Nested { fields } => {
                        self.nested_type(owner, type_name, path, &descriptor.name, fields)
                    }
                    ElementKind::Embedded { model, fields } => {
                        self.embedded_type(owner, path, model, fields)
                    }
                };
                element.map(FieldType::list)
            }
            FieldKind::Nested { fields } => {
                self.nested_type(owner, type_name, path, &descriptor.name, fields)
            }
            FieldKind::Embedded { model, fields } => self.embedded_type(owner, path, model, fields),
            FieldKind::Reference {
                target,
                cardinality,
            } => {
                let slot = ReferenceSlot {
                    owner: owner.to_string(),
                    path: path.to_string(),
                    target: target.clone(),
                    cardinality: *cardinality,
                    non_null: descriptor.non_null,
                };
                trace!(owner, path, target = %target, %cardinality, "deferring reference");
                self.pending.push(slot.clone());
                Some(FieldType::Unresolved(slot))
            }
        }
    }

    fn scalar_type(
        &mut self,
        type_name: &str,
        field: &str,
        scalar: &ScalarKind,
        enum_values: &[String],
    ) -> FieldType {
        if enum_values.is_empty() || *scalar != ScalarKind::String {
            return FieldType::Scalar(Scalar::from(scalar));
        }
        let name = enum_type_name(type_name, field);
        self.enums.insert(
            name.clone(),
            EnumType {
                name: name.clone(),
                values: enum_values
                    .iter()
                    .map(|v| EnumValue {
                        name: sanitize(v),
                        source: v.clone(),
                    })
                    .collect(),
            },
        );
        FieldType::Enum(name)
    }

    fn nested_type(
        &mut self,
        owner: &str,
        parent: &str,
        path: &str,
        field: &str,
        descriptors: &[FieldDescriptor],
    ) -> Option<FieldType> {
        let name = nested_type_name(parent, field);
        let fields = self.build_fields(owner, &name, path, descriptors);
        if fields.is_empty() {
            return None;
        }
        self.objects.insert(
            name.clone(),
            OutputType {
                name: name.clone(),
                description: None,
                fields,
                identity: None,
                embedded: false,
                hooks: HookConfig::default(),
            },
        );
        Some(FieldType::Object(name))
    }

    /// One shared type per embedded model name and run.
    fn embedded_type(
        &mut self,
        owner: &str,
        path: &str,
        model: &str,
        descriptors: &[FieldDescriptor],
    ) -> Option<FieldType> {
        let name = embedded_type_name(model);
        if !self.embedded.insert(model.to_string()) {
            return (!self.hollow.contains(&name)).then_some(FieldType::Object(name));
        }
        let fields = self.build_fields(owner, &name, path, descriptors);
        if fields.is_empty() {
            self.hollow.insert(name);
            return None;
        }
        self.objects.insert(
            name.clone(),
            OutputType {
                name: name.clone(),
                description: None,
                fields,
                identity: None,
                embedded: true,
                hooks: HookConfig::default(),
            },
        );
        Some(FieldType::Object(name))
    }

    /// Phase two: replace every pending slot with its target type.
    fn resolve_references(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        for slot in pending {
            let target = self.model_names.get(&slot.target).cloned().ok_or_else(|| {
                TypegraphError::Configuration {
                    owner: slot.owner.clone(),
                    path: slot.path.clone(),
                    target: slot.target.clone(),
                }
            })?;

            let resolved = match slot.cardinality {
                Cardinality::Single => {
                    let ty = FieldType::Object(target);
                    if slot.non_null { ty.non_null() } else { ty }
                }
                Cardinality::Plural => {
                    FieldType::Connection(self.connection(&slot, target)).non_null()
                }
            };

            if self.replace_at(&slot.owner, &slot.path, resolved).is_none() {
                trace!(owner = %slot.owner, path = %slot.path, "path not present, skipping");
            }
        }
        Ok(())
    }

    /// Connection type for a plural slot, built once per owner and path.
    fn connection(&mut self, slot: &ReferenceSlot, node: String) -> String {
        let name = connection_type_name(&slot.owner, &slot.path);
        self.connections
            .entry(name.clone())
            .or_insert_with(|| ConnectionType {
                name: name.clone(),
                edge: edge_type_name(&slot.owner, &slot.path),
                node,
            });
        name
    }

    /// Walks `path` from the `owner` root through nested and list-of-nested
    /// types and replaces the last segment's type.
    fn replace_at(&mut self, owner: &str, path: &str, resolved: FieldType) -> Option<()> {
        let segments: Vec<String> = path.split('.').map(sanitize).collect();
        let (last, parents) = segments.split_last()?;

        let mut current: Option<String> = None;
        for segment in parents {
            let field = self.fields_of(owner, current.as_deref())?.get(segment)?;
            current = Some(field.ty.object_name()?.to_string());
        }
        let field = self.fields_of_mut(owner, current.as_deref())?.get_mut(last)?;
        field.ty = resolved;
        Some(())
    }

    fn fields_of(&self, owner: &str, object: Option<&str>) -> Option<&IndexMap<String, OutputField>> {
        match object {
            None => self.roots.get(owner).map(|t| &t.fields),
            Some(name) => self.objects.get(name).map(|t| &t.fields),
        }
    }

    fn fields_of_mut(
        &mut self,
        owner: &str,
        object: Option<&str>,
    ) -> Option<&mut IndexMap<String, OutputField>> {
        match object {
            None => self.roots.get_mut(owner).map(|t| &mut t.fields),
            Some(name) => self.objects.get_mut(name).map(|t| &mut t.fields),
        }
    }

    fn ensure_resolved(&self) -> Result<()> {
        for ty in self.roots.values().chain(self.objects.values()) {
            if let Some(field) = ty.fields.values().find(|f| f.ty.is_unresolved()) {
                return Err(TypegraphError::UnresolvedReference {
                    owner: ty.name.clone(),
                    path: field.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Freezes the arena into a graph, merging `reused` cached models, and
    /// returns the per-model artifacts of freshly built models for caching.
    fn finish(
        self,
        identity: IdentityCapability,
        models: &[ModelDescriptor],
        reused: IndexMap<String, Arc<ModelTypes>>,
    ) -> (TypeGraph, Vec<ModelTypes>) {
        let mut types: IndexMap<String, NamedType> = IndexMap::new();
        for (name, ty) in self.objects {
            types.insert(name, NamedType::Object(Arc::new(ty)));
        }
        for (name, ty) in self.enums {
            types.insert(name, NamedType::Enum(Arc::new(ty)));
        }
        for (name, ty) in self.inputs {
            types.insert(name, NamedType::Input(Arc::new(ty)));
        }
        for (name, ty) in self.connections {
            types.insert(name, NamedType::Connection(Arc::new(ty)));
        }

        let mut roots: IndexMap<String, Arc<OutputType>> =
            self.roots.into_iter().map(|(k, v)| (k, Arc::new(v))).collect();

        let mut fresh = Vec::new();
        for (type_name, root) in &roots {
            let model_name = self
                .root_models
                .get(type_name)
                .cloned()
                .unwrap_or_else(|| type_name.clone());
            fresh.push(ModelTypes {
                key: model_name,
                root: root.clone(),
                dependents: dependents_of(root, &types),
            });
        }

        let mut graph_models = IndexMap::new();
        for model in models {
            let type_name = sanitize(&model.name);
            if let Some(root) = roots.shift_remove(&type_name) {
                graph_models.insert(type_name, root);
            } else if let Some(cached) = reused.get(&model.name) {
                graph_models.insert(type_name, cached.root.clone());
                for dependent in &cached.dependents {
                    types
                        .entry(dependent.name().to_string())
                        .or_insert_with(|| dependent.clone());
                }
            }
        }

        let graph = TypeGraph {
            identity,
            models: graph_models,
            types,
        };
        (graph, fresh)
    }
}

/// Every unregistered type reachable from `root`, in discovery order.
fn dependents_of(root: &OutputType, types: &IndexMap<String, NamedType>) -> Vec<NamedType> {
    let mut seen: IndexSet<String> = IndexSet::new();
    let mut stack: Vec<String> = referenced_names(root);
    while let Some(name) = stack.pop() {
        let Some(named) = types.get(&name) else {
            continue;
        };
        if !seen.insert(name) {
            continue;
        }
        match named {
            NamedType::Object(ty) => stack.extend(referenced_names(ty)),
            NamedType::Input(input) => {
                stack.extend(input.fields.values().map(|f| f.ty.innermost().to_string()))
            }
            NamedType::Enum(_) | NamedType::Connection(_) => {}
        }
    }
    seen.into_iter()
        .filter_map(|name| types.get(&name).cloned())
        .collect()
}

fn referenced_names(ty: &OutputType) -> Vec<String> {
    let mut names = Vec::new();
    for field in ty.fields.values() {
        match field.ty.innermost() {
            FieldType::Enum(name) | FieldType::Object(name) | FieldType::Connection(name) => {
                names.push(name.clone())
            }
            FieldType::Scalar(_)
            | FieldType::Unresolved(_)
            | FieldType::List(_)
            | FieldType::NonNull(_) => {}
        }
        names.extend(field.args.iter().map(|a| a.ty.innermost().to_string()));
    }
    names
}

impl TypeGraph {
    /// Checks that every named type a field or argument mentions exists.
    pub fn validate(&self) -> Result<()> {
        let dangling = |owner: &str, path: &str, target: &str| TypegraphError::Configuration {
            owner: owner.to_string(),
            path: path.to_string(),
            target: target.to_string(),
        };

        let objects = self.models.values().cloned().chain(self.types.values().filter_map(
            |t| match t {
                NamedType::Object(o) => Some(o.clone()),
                _ => None,
            },
        ));
        for ty in objects {
            for field in ty.fields.values() {
                match field.ty.innermost() {
                    FieldType::Object(name) if self.object(name).is_none() => {
                        return Err(dangling(&ty.name, &field.name, name));
                    }
                    FieldType::Enum(name) if self.enum_type(name).is_none() => {
                        return Err(dangling(&ty.name, &field.name, name));
                    }
                    FieldType::Connection(name) => match self.connection(name) {
                        Some(conn) if self.model(&conn.node).is_some() => {}
                        Some(conn) => return Err(dangling(&ty.name, &field.name, &conn.node)),
                        None => return Err(dangling(&ty.name, &field.name, name)),
                    },
                    FieldType::Unresolved(slot) => {
                        return Err(TypegraphError::UnresolvedReference {
                            owner: slot.owner.clone(),
                            path: slot.path.clone(),
                        });
                    }
                    _ => {}
                }
                for arg in &field.args {
                    if !self.is_input_name(&arg.ty) {
                        return Err(dangling(&ty.name, &field.name, arg.ty.innermost()));
                    }
                }
            }
        }
        Ok(())
    }

    fn is_input_name(&self, ty: &ArgType) -> bool {
        let name = ty.innermost();
        Scalar::is_builtin_name(name)
            || name == SORT_DIRECTION_ENUM
            || name == LOGICAL_OPERATOR_ENUM
            || self.enum_type(name).is_some()
            || self.input(name).is_some()
    }
}
