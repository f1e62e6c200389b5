//! Common test utilities for building canvases and pipeline documents.
use drydock::prelude::*;

/// An 800x600 canvas with default tunables.
#[allow(dead_code)]
pub fn new_canvas() -> CanvasState {
    CanvasState::builder(800.0, 600.0)
        .build()
        .expect("Failed to build canvas")
}

#[allow(dead_code)]
pub fn add_raw(canvas: &mut CanvasState, name: &str, at: (f64, f64)) -> ShapeId {
    canvas.add_shape(
        NodeKind::RawData {
            name: name.to_string(),
        },
        Point::new(at.0, at.1),
    )
}

#[allow(dead_code)]
pub fn add_typed(canvas: &mut CanvasState, name: &str, cdt: u64, at: (f64, f64)) -> ShapeId {
    canvas.add_shape(
        NodeKind::TypedData {
            name: name.to_string(),
            cdt,
        },
        Point::new(at.0, at.1),
    )
}

/// A step whose ports all accept any datatype.
#[allow(dead_code)]
pub fn add_step(
    canvas: &mut CanvasState,
    name: &str,
    inputs: &[&str],
    outputs: &[&str],
    at: (f64, f64),
) -> ShapeId {
    add_typed_step(
        canvas,
        name,
        inputs.iter().map(|n| StepPort::any(n)).collect(),
        outputs.iter().map(|n| StepPort::any(n)).collect(),
        at,
    )
}

#[allow(dead_code)]
pub fn add_typed_step(
    canvas: &mut CanvasState,
    name: &str,
    inputs: Vec<StepPort>,
    outputs: Vec<StepPort>,
    at: (f64, f64),
) -> ShapeId {
    canvas.add_shape(
        NodeKind::Step {
            name: name.to_string(),
            transformation_pk: 12,
            family_pk: 3,
            inputs,
            outputs,
        },
        Point::new(at.0, at.1),
    )
}

#[allow(dead_code)]
pub fn add_output(canvas: &mut CanvasState, name: &str, at: (f64, f64)) -> ShapeId {
    canvas.add_shape(
        NodeKind::Output {
            name: name.to_string(),
            output_id: None,
        },
        Point::new(at.0, at.1),
    )
}

/// Shapes of the `reads.csv -> align -> aligned` pipeline.
#[allow(dead_code)]
pub struct ReadsAlign {
    pub canvas: CanvasState,
    pub reads: ShapeId,
    pub align: ShapeId,
    pub output: ShapeId,
}

/// A raw input feeding one step whose result is a pipeline output.
///
/// Layout on the 800x600 canvas: `reads.csv` at (100, 300), `align` at
/// (400, 300), `aligned` at (650, 300). Nothing overlaps.
#[allow(dead_code)]
pub fn reads_align() -> ReadsAlign {
    let mut canvas = new_canvas();
    let reads = add_raw(&mut canvas, "reads.csv", (100.0, 300.0));
    let align = add_step(&mut canvas, "align", &["reads"], &["alignment"], (400.0, 300.0));
    let output = add_output(&mut canvas, "aligned", (650.0, 300.0));
    canvas
        .connect(MagnetRef::output(reads, 0), MagnetRef::input(align, 0))
        .expect("reads -> align");
    canvas
        .connect(MagnetRef::output(align, 0), MagnetRef::input(output, 0))
        .expect("align -> aligned");
    ReadsAlign {
        canvas,
        reads,
        align,
        output,
    }
}

/// `count` steps with one `in` and one `out` each, cabled in a line in the
/// order they were added. The first step's input is left unfed.
#[allow(dead_code)]
pub fn step_chain(canvas: &mut CanvasState, count: usize) -> Vec<ShapeId> {
    let steps: Vec<ShapeId> = (0..count)
        .map(|i| {
            add_step(
                canvas,
                &format!("step_{}", i + 1),
                &["in"],
                &["out"],
                (80.0 + i as f64 * 140.0, 100.0),
            )
        })
        .collect();
    for pair in steps.windows(2) {
        canvas
            .connect(MagnetRef::output(pair[0], 0), MagnetRef::input(pair[1], 0))
            .expect("chain cable");
    }
    steps
}

/// `reads.csv -> align -> aligned`, as the backend sends it.
#[allow(dead_code)]
pub const READS_ALIGN_JSON: &str = r#"{
    "pipeline_inputs": [
        { "dataset_name": "reads.csv", "CDT_pk": null, "x": 0.125, "y": 0.5 }
    ],
    "pipeline_steps": [
        {
            "transf_pk": 12,
            "family_pk": 3,
            "name": "align",
            "step_num": 1,
            "x": 0.5,
            "y": 0.5,
            "inputs": [ { "dataset_name": "reads", "CDT_pk": null } ],
            "outputs": [ { "dataset_name": "alignment", "CDT_pk": null } ],
            "cables_in": [
                { "source_step": 0, "source_dataset_name": "reads.csv" }
            ]
        }
    ],
    "pipeline_outputs": [
        {
            "output_name": "aligned",
            "source_step": 1,
            "source_dataset_name": "alignment",
            "x": 0.8125,
            "y": 0.5
        }
    ]
}"#;

/// Two steps listed in reverse execution order; `step_num` decides.
#[allow(dead_code)]
pub const TWO_STEP_JSON: &str = r#"{
    "pipeline_inputs": [
        { "dataset_name": "table", "CDT_pk": 5, "x": 0.1, "y": 0.5 }
    ],
    "pipeline_steps": [
        {
            "transf_pk": 2, "family_pk": 1, "name": "summarize", "step_num": 2,
            "x": 0.7, "y": 0.5,
            "inputs": [ { "dataset_name": "rows", "CDT_pk": 5 } ],
            "outputs": [ { "dataset_name": "summary", "CDT_pk": null } ],
            "cables_in": [
                { "source_step": 1, "source_dataset_name": "clean", "dest_dataset_name": "rows" }
            ]
        },
        {
            "transf_pk": 1, "family_pk": 1, "name": "filter", "step_num": 1,
            "x": 0.4, "y": 0.5,
            "inputs": [ { "dataset_name": "raw", "CDT_pk": 5 } ],
            "outputs": [ { "dataset_name": "clean", "CDT_pk": 5 } ],
            "cables_in": [
                { "source_step": 0, "source_dataset_name": "table", "dest_dataset_name": "raw" }
            ]
        }
    ],
    "pipeline_outputs": [
        {
            "output_name": "report", "source_step": 2, "source_dataset_name": "summary",
            "x": 0.9, "y": 0.5, "id": 44
        }
    ]
}"#;
