#![allow(dead_code)]

use std::collections::BTreeMap;

use invocation_resource_core::contract::{
    FinalizerConfig, InvocationRequest, ResourceConfig, LATEST_QUALIFIER,
};

pub const RESOURCE_NAME: &str = "test";

/// Knobs for the single resource most scenarios manage.
#[derive(Clone, Debug)]
pub struct ConfigParameters {
    pub function_name: String,
    pub trigger_parameter: String,
    pub input: String,
    pub qualifier: String,
    pub conceal_input: bool,
    pub conceal_result: bool,
    pub finalizer_block_on: bool,
    pub finalizer_function_name: String,
    pub finalizer_input: String,
    pub finalizer_qualifier: String,
}

impl Default for ConfigParameters {
    fn default() -> Self {
        Self {
            function_name: "func-createupdate-name-1".to_string(),
            trigger_parameter: "trigger-param-val".to_string(),
            input: "createupdate-input-param-val".to_string(),
            qualifier: LATEST_QUALIFIER.to_string(),
            conceal_input: false,
            conceal_result: false,
            finalizer_block_on: true,
            finalizer_function_name: "func-destroy-name-1".to_string(),
            finalizer_input: "destroy-input-param-val".to_string(),
            finalizer_qualifier: LATEST_QUALIFIER.to_string(),
        }
    }
}

impl ConfigParameters {
    pub fn resource_config(&self) -> ResourceConfig {
        ResourceConfig {
            function_name: self.function_name.clone(),
            qualifier: self.qualifier.clone(),
            triggers: BTreeMap::from([("trig_key".to_string(), self.trigger_parameter.clone())]),
            input: input_json(&self.input),
            conceal_input: self.conceal_input,
            conceal_result: self.conceal_result,
            finalizer: self.finalizer_block_on.then(|| FinalizerConfig {
                function_name: self.finalizer_function_name.clone(),
                qualifier: self.finalizer_qualifier.clone(),
                input: input_json(&self.finalizer_input),
            }),
        }
    }

    pub fn desired(&self) -> BTreeMap<String, ResourceConfig> {
        BTreeMap::from([(RESOURCE_NAME.to_string(), self.resource_config())])
    }

    pub fn primary_request(&self) -> InvocationRequest {
        InvocationRequest {
            function_name: self.function_name.clone(),
            qualifier: self.qualifier.clone(),
            payload: input_json(&self.input).into_bytes(),
        }
    }

    pub fn finalizer_request(&self) -> InvocationRequest {
        InvocationRequest {
            function_name: self.finalizer_function_name.clone(),
            qualifier: self.finalizer_qualifier.clone(),
            payload: input_json(&self.finalizer_input).into_bytes(),
        }
    }
}

pub fn input_json(param: &str) -> String {
    format!("{{\"param\":\"{param}\"}}")
}
