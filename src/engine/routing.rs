use crate::config::ResolverRouting;
use crate::model::model_identity::{ModelIdentity, ModelTable};

/// Picks the backend for each turn from the scene index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRouter {
    narrators: usize,
    resolvers: usize,
    resolver_routing: ResolverRouting,
}

impl ModelRouter {
    pub fn new(models: &ModelTable, resolver_routing: ResolverRouting) -> Self {
        Self {
            narrators: models.narrators.len().max(1),
            resolvers: models.resolvers.len().max(1),
            resolver_routing,
        }
    }

    /// With two narrators, even scenes go to the first and odd to the second.
    pub fn scene_model(&self, scene_index: u32) -> ModelIdentity {
        ModelIdentity::narrator(scene_index as usize % self.narrators)
    }

    pub fn resolution_model(&self, scene_index: u32) -> ModelIdentity {
        match self.resolver_routing {
            ResolverRouting::Fixed => ModelIdentity::resolver(0),
            ResolverRouting::Alternate => {
                ModelIdentity::resolver(scene_index as usize % self.resolvers)
            }
        }
    }
}
