use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

pub const LATEST_QUALIFIER: &str = "$LATEST";
pub const STATE_SCHEMA_VERSION: &str = "v1";

pub type Triggers = BTreeMap<String, String>;

/// Function invoked when the resource is destroyed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinalizerConfig {
    pub function_name: String,
    #[serde(default = "default_qualifier")]
    pub qualifier: String,
    pub input: String,
}

/// Declared configuration of one resource, as written by the operator.
///
/// `input` here is always the value to send. The persisted copy lives in
/// [`ResourceState::input`] and may have been concealed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceConfig {
    pub function_name: String,
    #[serde(default = "default_qualifier")]
    pub qualifier: String,
    #[serde(default)]
    pub triggers: Triggers,
    pub input: String,
    #[serde(default)]
    pub conceal_input: bool,
    #[serde(default)]
    pub conceal_result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalizer: Option<FinalizerConfig>,
}

/// Last-applied record of a resource that was created successfully.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceState {
    pub id: String,
    pub function_name: String,
    pub qualifier: String,
    #[serde(default)]
    pub triggers: Triggers,
    pub input: String,
    pub conceal_input: bool,
    pub conceal_result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalizer: Option<FinalizerConfig>,
    pub result: String,
}

impl ResourceState {
    /// Builds the record committed after a successful invocation, blanking
    /// concealed fields.
    pub fn from_applied(id: String, config: &ResourceConfig, response: &[u8]) -> Self {
        let input = if config.conceal_input {
            String::new()
        } else {
            config.input.clone()
        };
        let result = if config.conceal_result {
            String::new()
        } else {
            String::from_utf8_lossy(response).into_owned()
        };

        Self {
            id,
            function_name: config.function_name.clone(),
            qualifier: config.qualifier.clone(),
            triggers: config.triggers.clone(),
            input,
            conceal_input: config.conceal_input,
            conceal_result: config.conceal_result,
            finalizer: config.finalizer.clone(),
            result,
        }
    }
}

/// One synchronous call to a named, versioned function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub function_name: String,
    pub qualifier: String,
    pub payload: Vec<u8>,
}

impl ResourceConfig {
    pub fn invocation_request(&self) -> InvocationRequest {
        InvocationRequest {
            function_name: self.function_name.clone(),
            qualifier: self.qualifier.clone(),
            payload: self.input.as_bytes().to_vec(),
        }
    }
}

impl FinalizerConfig {
    pub fn invocation_request(&self) -> InvocationRequest {
        InvocationRequest {
            function_name: self.function_name.clone(),
            qualifier: self.qualifier.clone(),
            payload: self.input.as_bytes().to_vec(),
        }
    }
}

pub fn default_qualifier() -> String {
    LATEST_QUALIFIER.to_string()
}

pub fn default_state_version() -> String {
    STATE_SCHEMA_VERSION.to_string()
}

pub fn new_resource_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn validate_config(config: &ResourceConfig) -> Result<(), ValidationError> {
    validate_function_name("function_name", &config.function_name)?;
    validate_qualifier("qualifier", &config.qualifier)?;
    validate_json("input", &config.input)?;

    if let Some(finalizer) = &config.finalizer {
        validate_function_name("finalizer.function_name", &finalizer.function_name)?;
        validate_qualifier("finalizer.qualifier", &finalizer.qualifier)?;
        validate_json("finalizer.input", &finalizer.input)?;
    }

    Ok(())
}

fn validate_function_name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "cannot be empty"));
    }
    Ok(())
}

fn validate_qualifier(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(
            field,
            format!("cannot be empty (use {LATEST_QUALIFIER} for the unpublished version)"),
        ));
    }
    Ok(())
}

fn validate_json(field: &str, value: &str) -> Result<(), ValidationError> {
    serde_json::from_str::<serde_json::Value>(value)
        .map(|_| ())
        .map_err(|error| ValidationError::new(field, format!("must be valid JSON text: {error}")))
}

/// Hex SHA-256 of a payload, logged in place of the payload itself.
pub fn payload_fingerprint(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}
