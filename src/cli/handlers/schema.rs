use super::CommandContext;
use crate::cache::Caches;
use crate::graph::Synthesizer;
use crate::graphql::{NoData, build_schema};
use crate::hooks::HookRegistry;
use crate::model::ModelSet;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub fn handle_schema(ctx: &CommandContext, models: &Path) -> Result<()> {
    let set = ModelSet::load(models)
        .with_context(|| format!("Failed to load models from {}", models.display()))?;

    let synthesizer = Synthesizer::new(
        Caches::from_settings(&ctx.config.cache),
        ctx.config.synth.clone(),
    );
    let descriptors = synthesizer.load_descriptors(&set)?;
    let graph = synthesizer.synthesize(&descriptors)?;
    info!(
        models = graph.models().count(),
        types = graph.types().count(),
        "synthesized"
    );

    let schema = build_schema(&graph, Arc::new(NoData), &HookRegistry::new())?;
    print!("{}", schema.sdl());
    Ok(())
}
