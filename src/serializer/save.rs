use super::wire::*;
use crate::canvas::CanvasState;
use crate::error::{CanvasError, SerializeError};
use crate::model::{Direction, MagnetRef, NodeKind, Shape, ShapeId, StepPort};
use ahash::AHashMap;
use log::info;

/// Builds the wire document for the canvas.
///
/// Steps are numbered in execution order, so a cyclic step graph cannot be
/// saved. Every output must have a source cable.
pub fn to_document(canvas: &CanvasState) -> Result<PipelineDocument, SerializeError> {
    let order = canvas
        .execution_order()
        .map_err(|cycle| SerializeError::Cycle(cycle.steps))?;
    let step_nums: AHashMap<ShapeId, usize> = order
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i + 1))
        .collect();
    let (width, height) = (canvas.width(), canvas.height());

    let pipeline_inputs = canvas
        .shapes()
        .filter_map(|shape| {
            let cdt_pk = match shape.kind() {
                NodeKind::RawData { .. } => None,
                NodeKind::TypedData { cdt, .. } => Some(*cdt),
                _ => return None,
            };
            let p = shape.position.normalize(width, height);
            Some(InputDocument {
                dataset_name: shape.name().to_string(),
                cdt_pk,
                x: p.x,
                y: p.y,
            })
        })
        .collect();

    let mut pipeline_steps = Vec::with_capacity(order.len());
    for (i, id) in order.iter().enumerate() {
        let shape = canvas.shape(*id).ok_or(CanvasError::UnknownShape(*id))?;
        let NodeKind::Step {
            name,
            transformation_pk,
            family_pk,
            inputs,
            outputs,
        } = shape.kind()
        else {
            continue;
        };

        let cables_in = (0..shape.inputs().len())
            .filter_map(|index| {
                let connector = canvas.incoming(MagnetRef::input(*id, index))?;
                let (source_step, source_dataset_name) =
                    describe_source(canvas, &step_nums, connector.source)?;
                Some(CableDocument {
                    source_step,
                    source_dataset_name,
                    dest_dataset_name: Some(shape.inputs()[index].label.clone()),
                })
            })
            .collect();

        let p = shape.position.normalize(width, height);
        pipeline_steps.push(StepDocument {
            transf_pk: *transformation_pk,
            family_pk: *family_pk,
            name: name.clone(),
            step_num: i + 1,
            x: p.x,
            y: p.y,
            inputs: ports_to_wire(inputs),
            outputs: ports_to_wire(outputs),
            cables_in,
        });
    }

    let mut pipeline_outputs = Vec::new();
    for shape in canvas.shapes() {
        let NodeKind::Output { name, output_id } = shape.kind() else {
            continue;
        };
        let (source_step, source_dataset_name) = canvas
            .incoming(MagnetRef::input(shape.id(), 0))
            .and_then(|c| describe_source(canvas, &step_nums, c.source))
            .ok_or_else(|| SerializeError::UnsourcedOutput(name.clone()))?;
        let p = shape.position.normalize(width, height);
        pipeline_outputs.push(OutputDocument {
            output_name: name.clone(),
            source_step,
            source_dataset_name,
            x: p.x,
            y: p.y,
            id: *output_id,
        });
    }

    info!(
        "Serialized pipeline: {} inputs, {} steps, {} outputs",
        canvas.shapes().filter(|s| s.kind().is_pipeline_input()).count(),
        pipeline_steps.len(),
        pipeline_outputs.len()
    );
    Ok(PipelineDocument {
        pipeline_inputs,
        pipeline_steps,
        pipeline_outputs,
    })
}

pub fn to_json(canvas: &CanvasState) -> Result<String, SerializeError> {
    let document = to_document(canvas)?;
    document
        .to_json_pretty()
        .map_err(|e| SerializeError::Json(e.to_string()))
}

/// The (source_step, source_dataset_name) pair for a cable's source magnet.
/// Pipeline inputs have no step number and are referenced by name with step 0.
fn describe_source(
    canvas: &CanvasState,
    step_nums: &AHashMap<ShapeId, usize>,
    source: MagnetRef,
) -> Option<(usize, String)> {
    let shape: &Shape = canvas.shape(source.shape)?;
    if shape.kind().is_pipeline_input() {
        return Some((0, shape.name().to_string()));
    }
    let step_num = *step_nums.get(&source.shape)?;
    let label = shape.magnet(Direction::Output, source.index)?.label.clone();
    Some((step_num, label))
}

fn ports_to_wire(ports: &[StepPort]) -> Vec<PortDocument> {
    ports
        .iter()
        .map(|p| PortDocument {
            dataset_name: p.name.clone(),
            cdt_pk: p.datatype.pk(),
        })
        .collect()
}
