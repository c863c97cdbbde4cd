//! Model variant metadata and selection predicates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware a variant is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceType {
    Cpu,
    Gpu,
    Npu,
    #[serde(other)]
    Invalid,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Npu => "NPU",
            Self::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    pub device_type: DeviceType,
    #[serde(default)]
    pub execution_provider: Option<String>,
}

/// One downloadable build of a model, as listed by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVariant {
    #[serde(rename = "name")]
    pub id: String,
    pub alias: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub runtime: Option<RuntimeInfo>,
    #[serde(default)]
    pub file_size_mb: Option<u64>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub prompt_template: Option<serde_json::Value>,
    /// Set from the service's cache listing, never sent by the catalog
    #[serde(skip)]
    pub cached: bool,
}

impl ModelVariant {
    pub fn device_type(&self) -> Option<DeviceType> {
        self.runtime.as_ref().map(|r| r.device_type)
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.device_type() {
            Some(device) => write!(f, "{} ({})", self.id, device),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Predicate matching variants built for `device`
pub fn on_device(device: DeviceType) -> impl Fn(&ModelVariant) -> bool {
    move |variant| variant.device_type() == Some(device)
}

/// Predicate accepting any variant
pub fn any_variant(_: &ModelVariant) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog_entry() {
        let json = r#"{
            "name": "Phi-4-generic-cpu",
            "displayName": "Phi-4 (CPU)",
            "alias": "phi-4",
            "runtime": { "deviceType": "CPU", "executionProvider": "CPUExecutionProvider" },
            "fileSizeMb": 10403,
            "task": "chat-completion",
            "publisher": "Microsoft"
        }"#;

        let variant: ModelVariant = serde_json::from_str(json).unwrap();
        assert_eq!(variant.id, "Phi-4-generic-cpu");
        assert_eq!(variant.device_type(), Some(DeviceType::Cpu));
        assert_eq!(variant.file_size_mb, Some(10403));
        assert!(!variant.cached);
        assert_eq!(variant.to_string(), "Phi-4-generic-cpu (CPU)");
    }

    #[test]
    fn test_unknown_device_is_invalid() {
        let json = r#"{ "name": "x", "alias": "x", "runtime": { "deviceType": "FPGA" } }"#;
        let variant: ModelVariant = serde_json::from_str(json).unwrap();
        assert_eq!(variant.device_type(), Some(DeviceType::Invalid));
        assert!(!on_device(DeviceType::Cpu)(&variant));
    }
}
