use crate::error::LoadError;
use serde::{Deserialize, Serialize};

/// The complete pipeline document exchanged with the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineDocument {
    #[serde(default)]
    pub pipeline_inputs: Vec<InputDocument>,
    #[serde(default)]
    pub pipeline_steps: Vec<StepDocument>,
    #[serde(default)]
    pub pipeline_outputs: Vec<OutputDocument>,
}

impl PipelineDocument {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A pipeline input. `CDT_pk` is null for raw (untyped) inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDocument {
    pub dataset_name: String,
    #[serde(rename = "CDT_pk", default)]
    pub cdt_pk: Option<u64>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDocument {
    pub transf_pk: u64,
    pub family_pk: u64,
    pub name: String,
    /// 1-based position in execution order. Zero when the producer did not number steps.
    #[serde(default)]
    pub step_num: usize,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub inputs: Vec<PortDocument>,
    #[serde(default)]
    pub outputs: Vec<PortDocument>,
    #[serde(default)]
    pub cables_in: Vec<CableDocument>,
}

/// One declared input or output of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDocument {
    pub dataset_name: String,
    #[serde(rename = "CDT_pk", default)]
    pub cdt_pk: Option<u64>,
}

/// A cable into a step. `source_step` 0 means a pipeline input, matched by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableDocument {
    pub source_step: usize,
    pub source_dataset_name: String,
    /// The step input this cable feeds. When absent, the cable's position in
    /// `cables_in` picks the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_dataset_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub output_name: String,
    pub source_step: usize,
    pub source_dataset_name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub id: Option<u64>,
}
