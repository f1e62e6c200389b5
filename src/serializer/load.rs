use super::wire::*;
use crate::canvas::{CanvasState, CollisionPolicy};
use crate::error::LoadError;
use crate::geometry::Point;
use crate::model::{Datatype, MagnetRef, NodeKind, ShapeId, StepPort};
use ahash::AHashMap;
use log::{debug, info};

/// Document positions closer than this are treated as the same slot.
const SAME_SLOT: f64 = 1e-9;

/// Replaces the canvas contents with the pipeline described by `document`.
///
/// Shapes are created inputs first, then steps in `step_num` order, then
/// outputs. Each step's incoming cables are wired right after the step is
/// created, so a cable may only reference pipeline inputs and earlier steps.
/// The canvas is untouched if loading fails.
pub fn load_document(canvas: &mut CanvasState, document: &PipelineDocument) -> Result<(), LoadError> {
    let mut staged = canvas.clone();
    staged.clear();
    staged.set_updating(true);
    let (width, height) = (staged.width(), staged.height());

    let mut inputs_by_name: AHashMap<&str, ShapeId> = AHashMap::new();
    // Each created shape with its position as written in the document.
    let mut created: Vec<(ShapeId, f64, f64)> = Vec::new();

    for input in &document.pipeline_inputs {
        let kind = match input.cdt_pk {
            Some(cdt) => NodeKind::TypedData {
                name: input.dataset_name.clone(),
                cdt,
            },
            None => NodeKind::RawData {
                name: input.dataset_name.clone(),
            },
        };
        let id = staged.add_shape(kind, denormalize(input.x, input.y, width, height)?);
        inputs_by_name.entry(&input.dataset_name).or_insert(id);
        created.push((id, input.x, input.y));
    }

    // Producers that did not number their steps are taken in document order.
    let mut steps: Vec<&StepDocument> = document.pipeline_steps.iter().collect();
    if steps.iter().all(|s| s.step_num > 0) {
        steps.sort_by_key(|s| s.step_num);
    }

    let mut step_shapes: Vec<ShapeId> = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let step_num = i + 1;
        let kind = NodeKind::Step {
            name: step.name.clone(),
            transformation_pk: step.transf_pk,
            family_pk: step.family_pk,
            inputs: ports_from_wire(&step.inputs),
            outputs: ports_from_wire(&step.outputs),
        };
        let id = staged.add_shape(kind, denormalize(step.x, step.y, width, height)?);

        for (position, cable) in step.cables_in.iter().enumerate() {
            let dest_index = match &cable.dest_dataset_name {
                Some(name) => staged
                    .shape(id)
                    .and_then(|s| s.input_index(name))
                    .ok_or_else(|| LoadError::UnknownStepInput {
                        step_num,
                        name: name.clone(),
                    })?,
                None if position < step.inputs.len() => position,
                None => {
                    return Err(LoadError::TooManyCables {
                        step_num,
                        cables: step.cables_in.len(),
                        inputs: step.inputs.len(),
                    });
                }
            };

            let source = if cable.source_step == 0 {
                let input = inputs_by_name
                    .get(cable.source_dataset_name.as_str())
                    .ok_or_else(|| LoadError::UnknownPipelineInput {
                        step_num,
                        name: cable.source_dataset_name.clone(),
                    })?;
                MagnetRef::output(*input, 0)
            } else {
                let source_id = *step_shapes.get(cable.source_step - 1).ok_or(
                    LoadError::ForwardReference {
                        step_num,
                        source_step: cable.source_step,
                    },
                )?;
                step_output(&staged, source_id, cable.source_step, &cable.source_dataset_name)?
            };

            staged
                .connect(source, MagnetRef::input(id, dest_index))
                .map_err(|rejection| LoadError::RejectedCable {
                    target: step.name.clone(),
                    rejection,
                })?;
        }

        step_shapes.push(id);
        created.push((id, step.x, step.y));
    }

    for output in &document.pipeline_outputs {
        let kind = NodeKind::Output {
            name: output.output_name.clone(),
            output_id: output.id,
        };
        let id = staged.add_shape(kind, denormalize(output.x, output.y, width, height)?);

        let source = if output.source_step == 0 {
            let input = inputs_by_name
                .get(output.source_dataset_name.as_str())
                .ok_or_else(|| LoadError::UnknownOutputSource {
                    output: output.output_name.clone(),
                    name: output.source_dataset_name.clone(),
                })?;
            MagnetRef::output(*input, 0)
        } else {
            let source_id = *step_shapes.get(output.source_step - 1).ok_or_else(|| {
                LoadError::UnknownSourceStep {
                    output: output.output_name.clone(),
                    source_step: output.source_step,
                }
            })?;
            step_output(&staged, source_id, output.source_step, &output.source_dataset_name)?
        };
        staged
            .connect(source, MagnetRef::input(id, 0))
            .map_err(|rejection| LoadError::RejectedCable {
                target: output.output_name.clone(),
                rejection,
            })?;
        created.push((id, output.x, output.y));
    }

    // Only shapes stacked on an earlier one in the document move. Overlaps
    // that come from a smaller canvas are left alone, so a reload at the
    // original size gets the original layout back.
    let policy = staged.config().load_collision;
    if policy != CollisionPolicy::Allow {
        for (i, &(id, x, y)) in created.iter().enumerate() {
            let stacked = created[..i]
                .iter()
                .any(|&(_, ex, ey)| (ex - x).abs() < SAME_SLOT && (ey - y).abs() < SAME_SLOT);
            if !stacked {
                continue;
            }
            if let Some(position) = staged.shape(id).map(|s| s.position) {
                debug!("{} shares its document slot with an earlier shape", id);
                staged.settle(id, position, policy);
            }
        }
    }

    staged.set_updating(false);
    info!(
        "Loaded pipeline: {} inputs, {} steps, {} outputs, {} cables",
        document.pipeline_inputs.len(),
        step_shapes.len(),
        document.pipeline_outputs.len(),
        staged.connector_count()
    );
    *canvas = staged;
    Ok(())
}

pub fn load_json(canvas: &mut CanvasState, json: &str) -> Result<(), LoadError> {
    let document = PipelineDocument::from_json(json)?;
    load_document(canvas, &document)
}

fn step_output(
    canvas: &CanvasState,
    step: ShapeId,
    step_num: usize,
    name: &str,
) -> Result<MagnetRef, LoadError> {
    canvas
        .shape(step)
        .and_then(|s| s.output_index(name))
        .map(|index| MagnetRef::output(step, index))
        .ok_or_else(|| LoadError::UnknownStepOutput {
            source_step: step_num,
            name: name.to_string(),
        })
}

fn denormalize(x: f64, y: f64, width: f64, height: f64) -> Result<Point, LoadError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(LoadError::InvalidCoordinate { x, y });
    }
    let p = Point::new(x, y).denormalize(width, height);
    debug!("Placing shape at {} from ({}, {})", p, x, y);
    Ok(p)
}

fn ports_from_wire(ports: &[PortDocument]) -> Vec<StepPort> {
    ports
        .iter()
        .map(|p| StepPort::new(&p.dataset_name, Datatype::from_pk(p.cdt_pk)))
        .collect()
}
