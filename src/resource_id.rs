use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceIdError {
    #[error("resource id {id:?} does not begin with '/'")]
    NotRooted { id: String },

    #[error("the number of path segments in {id:?} is not even")]
    UnevenSegments { id: String },

    #[error("path segments cannot be empty (key {key:?}, value {value:?})")]
    EmptySegment { key: String, value: String },

    #[error("no subscription id found in {id:?}")]
    MissingSubscriptionId { id: String },

    #[error("no resource group component found in {id:?}")]
    MissingResourceGroup { id: String },
}

/// A fully-qualified ARM resource id decomposed into its components.
///
/// ARM ids are alternating key/value path segments:
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}`.
/// The well-known components are pulled out; everything after `providers`
/// stays in `path` keyed by segment name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: Option<String>,
    pub provider: Option<String>,
    pub path: HashMap<String, String>,
}

impl ResourceId {
    pub fn parse(id: &str) -> Result<Self, ResourceIdError> {
        if !id.starts_with('/') {
            return Err(ResourceIdError::NotRooted { id: id.to_string() });
        }

        let segments: Vec<&str> = id.trim_matches('/').split('/').collect();
        if segments.len() % 2 != 0 {
            return Err(ResourceIdError::UnevenSegments { id: id.to_string() });
        }

        let mut components = HashMap::new();
        for pair in segments.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() || value.is_empty() {
                return Err(ResourceIdError::EmptySegment {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
            components.insert(key.to_string(), value.to_string());
        }

        let subscription_id = components
            .remove("subscriptions")
            .ok_or_else(|| ResourceIdError::MissingSubscriptionId { id: id.to_string() })?;

        // ARM emits both spellings depending on the API that produced the id.
        let resource_group = components
            .remove("resourceGroups")
            .or_else(|| components.remove("resourcegroups"));
        let provider = components.remove("providers");

        Ok(Self {
            subscription_id,
            resource_group,
            provider,
            path: components,
        })
    }
}
