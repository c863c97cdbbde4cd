//! Model catalog: descriptors grouped by alias.

mod variant;

pub use variant::{any_variant, on_device, DeviceType, ModelVariant, RuntimeInfo};

use tracing::debug;

use crate::error::{Error, Result};

/// A model and all of its hardware variants
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    /// Id of the default (first listed) variant
    pub id: String,
    pub alias: String,
    pub variants: Vec<ModelVariant>,
}

impl ModelDescriptor {
    /// Variants accepted by `predicate`, in catalog order
    pub fn matching_variants<P>(&self, predicate: P) -> Vec<&ModelVariant>
    where
        P: Fn(&ModelVariant) -> bool,
    {
        self.variants.iter().filter(|v| predicate(*v)).collect()
    }

    /// First variant accepted by `predicate`
    pub fn select_variant<P>(&self, predicate: P) -> Result<&ModelVariant>
    where
        P: Fn(&ModelVariant) -> bool,
    {
        self.variants
            .iter()
            .find(|v| predicate(*v))
            .ok_or_else(|| Error::NoMatchingVariant(self.alias.clone()))
    }
}

/// Read-only snapshot of the models offered by the service
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    models: Vec<ModelDescriptor>,
}

impl Catalog {
    /// Group flat catalog entries into descriptors, keeping listing order.
    pub fn from_variants(variants: Vec<ModelVariant>) -> Self {
        let mut models: Vec<ModelDescriptor> = Vec::new();

        for variant in variants {
            match models.iter_mut().find(|m| m.alias == variant.alias) {
                Some(model) => model.variants.push(variant),
                None => models.push(ModelDescriptor {
                    id: variant.id.clone(),
                    alias: variant.alias.clone(),
                    variants: vec![variant],
                }),
            }
        }

        debug!("Catalog holds {} models", models.len());
        Self { models }
    }

    pub fn list_models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolve an alias, or the id of one of the model's variants.
    pub fn get_model(&self, alias_or_id: &str) -> Result<&ModelDescriptor> {
        let wanted = alias_or_id.trim();
        self.models
            .iter()
            .find(|m| m.alias.eq_ignore_ascii_case(wanted))
            .or_else(|| {
                self.models
                    .iter()
                    .find(|m| m.variants.iter().any(|v| v.id.eq_ignore_ascii_case(wanted)))
            })
            .ok_or_else(|| Error::ModelNotFound(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str, alias: &str, device: DeviceType) -> ModelVariant {
        ModelVariant {
            id: id.to_string(),
            alias: alias.to_string(),
            display_name: None,
            runtime: Some(RuntimeInfo {
                device_type: device,
                execution_provider: None,
            }),
            file_size_mb: None,
            task: None,
            uri: None,
            publisher: None,
            provider_type: None,
            prompt_template: None,
            cached: false,
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_variants(vec![
            variant("phi-4-cuda-gpu", "phi-4", DeviceType::Gpu),
            variant("whisper-tiny-generic-cpu", "whisper-tiny", DeviceType::Cpu),
            variant("Phi-4-generic-cpu", "phi-4", DeviceType::Cpu),
        ])
    }

    #[test]
    fn test_groups_variants_by_alias() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);

        let phi = &catalog.list_models()[0];
        assert_eq!(phi.alias, "phi-4");
        assert_eq!(phi.id, "phi-4-cuda-gpu");
        assert_eq!(phi.variants.len(), 2);
    }

    #[test]
    fn test_get_model_by_alias_and_variant_id() {
        let catalog = catalog();
        assert_eq!(catalog.get_model("PHI-4").unwrap().alias, "phi-4");
        assert_eq!(
            catalog.get_model("whisper-tiny-generic-cpu").unwrap().alias,
            "whisper-tiny"
        );
    }

    #[test]
    fn test_unknown_alias() {
        let err = catalog().get_model("llama-70b").unwrap_err();
        assert!(matches!(err, Error::ModelNotFound(ref alias) if alias == "llama-70b"));
    }

    #[test]
    fn test_every_alias_resolves_to_matching_variants() {
        let catalog = catalog();
        for model in catalog.list_models() {
            let resolved = catalog.get_model(&model.alias).unwrap();
            assert!(!resolved.matching_variants(on_device(DeviceType::Cpu)).is_empty());
            assert!(resolved.select_variant(any_variant).is_ok());
        }
    }

    #[test]
    fn test_select_variant_by_device() {
        let catalog = catalog();
        let phi = catalog.get_model("phi-4").unwrap();
        let cpu = phi.select_variant(on_device(DeviceType::Cpu)).unwrap();
        assert_eq!(cpu.id, "Phi-4-generic-cpu");

        let whisper = catalog.get_model("whisper-tiny").unwrap();
        let err = whisper.select_variant(on_device(DeviceType::Npu)).unwrap_err();
        assert!(matches!(err, Error::NoMatchingVariant(_)));
    }
}
