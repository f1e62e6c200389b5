//! Tests for the pipeline wire format: saving, loading, and round trips.
//!
mod common;
use common::*;
use drydock::prelude::*;
use drydock::serializer::{CableDocument, StepDocument};

#[cfg(test)]
mod save_tests {
    use super::*;

    #[test]
    fn test_document_for_reads_align() {
        let ReadsAlign { canvas, .. } = reads_align();
        let document = serializer::to_document(&canvas).expect("Pipeline should serialize");

        assert_eq!(document.pipeline_inputs.len(), 1);
        let input = &document.pipeline_inputs[0];
        assert_eq!(input.dataset_name, "reads.csv");
        assert_eq!(input.cdt_pk, None);
        assert_eq!((input.x, input.y), (0.125, 0.5));

        let step = &document.pipeline_steps[0];
        assert_eq!(step.name, "align");
        assert_eq!(step.step_num, 1);
        assert_eq!(
            step.cables_in,
            vec![CableDocument {
                source_step: 0,
                source_dataset_name: "reads.csv".to_string(),
                dest_dataset_name: Some("reads".to_string()),
            }]
        );

        let output = &document.pipeline_outputs[0];
        assert_eq!(output.output_name, "aligned");
        assert_eq!(output.source_step, 1);
        assert_eq!(output.source_dataset_name, "alignment");
        assert_eq!(output.x, 0.8125);
    }

    #[test]
    fn test_steps_are_numbered_in_execution_order() {
        let mut canvas = new_canvas();
        let late = add_step(&mut canvas, "late", &["in"], &["out"], (500.0, 100.0));
        let early = add_step(&mut canvas, "early", &["in"], &["out"], (200.0, 100.0));
        canvas
            .connect(MagnetRef::output(early, 0), MagnetRef::input(late, 0))
            .unwrap();

        let document = serializer::to_document(&canvas).unwrap();
        let names: Vec<(&str, usize)> = document
            .pipeline_steps
            .iter()
            .map(|s| (s.name.as_str(), s.step_num))
            .collect();
        assert_eq!(names, vec![("early", 1), ("late", 2)]);
        assert_eq!(document.pipeline_steps[1].cables_in[0].source_step, 1);
        assert_eq!(document.pipeline_steps[1].cables_in[0].source_dataset_name, "out");
    }

    #[test]
    fn test_cycle_and_unsourced_output_cannot_be_saved() {
        let mut canvas = new_canvas();
        let steps = step_chain(&mut canvas, 2);
        canvas
            .connect(MagnetRef::output(steps[1], 0), MagnetRef::input(steps[0], 0))
            .unwrap();
        assert!(matches!(
            serializer::to_document(&canvas),
            Err(SerializeError::Cycle(_))
        ));

        let mut canvas = new_canvas();
        add_output(&mut canvas, "lonely", (400.0, 300.0));
        assert_eq!(
            serializer::to_document(&canvas),
            Err(SerializeError::UnsourcedOutput("lonely".to_string()))
        );
    }

    #[test]
    fn test_json_uses_backend_field_names() {
        let ReadsAlign { canvas, .. } = reads_align();
        let json = serializer::to_json(&canvas).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["pipeline_inputs"][0]["CDT_pk"].is_null());
        assert_eq!(value["pipeline_steps"][0]["transf_pk"], 12);
        assert_eq!(value["pipeline_steps"][0]["cables_in"][0]["source_step"], 0);
        assert_eq!(
            value["pipeline_steps"][0]["cables_in"][0]["source_dataset_name"],
            "reads.csv"
        );
    }
}

#[cfg(test)]
mod load_tests {
    use super::*;

    #[test]
    fn test_load_reads_align() {
        let mut canvas = new_canvas();
        serializer::load_json(&mut canvas, READS_ALIGN_JSON).expect("Document should load");

        assert_eq!(canvas.shape_count(), 3);
        assert_eq!(canvas.connector_count(), 2);
        assert!(canvas.validate().is_empty());
        assert!(!canvas.is_updating());
        assert!(canvas.is_consistent());

        let reads = canvas.find_by_name("reads.csv").unwrap();
        assert_eq!(reads.position, Point::new(100.0, 300.0));
        let align = canvas.find_by_name("align").unwrap();
        assert_eq!(align.position, Point::new(400.0, 300.0));
    }

    #[test]
    fn test_load_sorts_steps_by_step_num() {
        let mut canvas = new_canvas();
        serializer::load_json(&mut canvas, TWO_STEP_JSON).expect("Document should load");

        let order: Vec<&str> = canvas
            .execution_order()
            .unwrap()
            .iter()
            .map(|id| canvas.shape(*id).unwrap().name())
            .collect();
        assert_eq!(order, vec!["filter", "summarize"]);

        let table = canvas.find_by_name("table").unwrap();
        assert_eq!(
            table.kind(),
            &NodeKind::TypedData {
                name: "table".to_string(),
                cdt: 5
            }
        );
        let report = canvas.find_by_name("report").unwrap();
        assert_eq!(
            report.kind(),
            &NodeKind::Output {
                name: "report".to_string(),
                output_id: Some(44)
            }
        );
        assert!(canvas.validate().is_empty());
    }

    #[test]
    fn test_forward_reference_is_an_error() {
        let mut document = PipelineDocument::from_json(TWO_STEP_JSON).unwrap();
        // Make the first step read from the second.
        let filter: &mut StepDocument = document
            .pipeline_steps
            .iter_mut()
            .find(|s| s.name == "filter")
            .unwrap();
        filter.cables_in[0] = CableDocument {
            source_step: 2,
            source_dataset_name: "summary".to_string(),
            dest_dataset_name: Some("raw".to_string()),
        };

        let mut canvas = new_canvas();
        assert_eq!(
            serializer::load_document(&mut canvas, &document),
            Err(LoadError::ForwardReference {
                step_num: 1,
                source_step: 2
            })
        );
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let mut canvas = new_canvas();
        let json = READS_ALIGN_JSON.replace(
            r#""source_dataset_name": "reads.csv""#,
            r#""source_dataset_name": "missing.csv""#,
        );
        assert_eq!(
            serializer::load_json(&mut canvas, &json),
            Err(LoadError::UnknownPipelineInput {
                step_num: 1,
                name: "missing.csv".to_string()
            })
        );

        let json = READS_ALIGN_JSON.replace(
            r#""source_dataset_name": "alignment""#,
            r#""source_dataset_name": "bam""#,
        );
        assert_eq!(
            serializer::load_json(&mut canvas, &json),
            Err(LoadError::UnknownStepOutput {
                source_step: 1,
                name: "bam".to_string()
            })
        );
    }

    #[test]
    fn test_failed_load_leaves_canvas_untouched() {
        let ReadsAlign { mut canvas, .. } = reads_align();
        let before: Vec<String> = canvas.shapes().map(|s| s.name().to_string()).collect();

        let broken = READS_ALIGN_JSON.replace(r#""source_step": 1"#, r#""source_step": 9"#);
        assert!(serializer::load_json(&mut canvas, &broken).is_err());
        assert!(serializer::load_json(&mut canvas, r#"{ "pipeline_steps": 3 }"#).is_err());

        let after: Vec<String> = canvas.shapes().map(|s| s.name().to_string()).collect();
        assert_eq!(before, after);
        assert_eq!(canvas.connector_count(), 2);
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let mut canvas = new_canvas();
        assert!(matches!(
            serializer::load_json(&mut canvas, "{ not json"),
            Err(LoadError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_cables_without_destination_names_fill_inputs_in_order() {
        let json = r#"{
            "pipeline_inputs": [
                { "dataset_name": "a", "CDT_pk": null, "x": 0.1, "y": 0.2 },
                { "dataset_name": "b", "CDT_pk": null, "x": 0.1, "y": 0.8 }
            ],
            "pipeline_steps": [
                {
                    "transf_pk": 1, "family_pk": 1, "name": "join", "step_num": 1,
                    "x": 0.5, "y": 0.5,
                    "inputs": [ { "dataset_name": "left" }, { "dataset_name": "right" } ],
                    "outputs": [ { "dataset_name": "joined" } ],
                    "cables_in": [
                        { "source_step": 0, "source_dataset_name": "b" },
                        { "source_step": 0, "source_dataset_name": "a" }
                    ]
                }
            ]
        }"#;
        let mut canvas = new_canvas();
        serializer::load_json(&mut canvas, json).unwrap();

        let join = canvas.find_by_name("join").unwrap().id();
        let left = canvas.incoming(MagnetRef::input(join, 0)).unwrap();
        let b = canvas.find_by_name("b").unwrap().id();
        assert_eq!(left.source.shape, b);
    }

    #[test]
    fn test_overlapping_shapes_are_spread_on_load() {
        let json = r#"{
            "pipeline_inputs": [
                { "dataset_name": "a", "x": 0.5, "y": 0.5 },
                { "dataset_name": "b", "x": 0.5, "y": 0.5 }
            ]
        }"#;
        let mut canvas = new_canvas();
        serializer::load_json(&mut canvas, json).unwrap();
        assert!(canvas.overlapping_pairs().is_empty());
    }
}

#[cfg(test)]
mod round_trip_tests {
    use super::*;

    #[test]
    fn test_round_trip_across_canvas_sizes() {
        let ReadsAlign { canvas, .. } = reads_align();
        let saved = serializer::to_document(&canvas).unwrap();

        for (width, height) in [(800.0, 600.0), (1600.0, 1200.0), (400.0, 300.0)] {
            let mut other = CanvasState::builder(width, height).build().unwrap();
            serializer::load_document(&mut other, &saved).unwrap();
            let reloaded = serializer::to_document(&other).unwrap();
            assert_eq!(reloaded, saved, "round trip on {}x{}", width, height);
        }
    }

    #[test]
    fn test_round_trip_through_a_crowded_canvas() {
        let ReadsAlign { canvas, .. } = reads_align();
        let saved = serializer::to_document(&canvas).unwrap();

        // Shapes overlap at this size, but the layout must not be rewritten.
        let mut small = CanvasState::builder(200.0, 150.0).build().unwrap();
        serializer::load_document(&mut small, &saved).unwrap();
        assert!(!small.overlapping_pairs().is_empty());
        let from_small = serializer::to_document(&small).unwrap();
        assert_eq!(from_small, saved);

        let mut restored = new_canvas();
        serializer::load_document(&mut restored, &from_small).unwrap();
        assert_eq!(serializer::to_document(&restored).unwrap(), saved);
        let positions: Vec<Point> = ["reads.csv", "align", "aligned"]
            .iter()
            .map(|name| restored.find_by_name(name).unwrap().position)
            .collect();
        assert_eq!(
            positions,
            vec![
                Point::new(100.0, 300.0),
                Point::new(400.0, 300.0),
                Point::new(650.0, 300.0)
            ]
        );
    }

    #[test]
    fn test_reload_keeps_graph_shape() {
        let mut canvas = new_canvas();
        serializer::load_json(&mut canvas, TWO_STEP_JSON).unwrap();
        let json = serializer::to_json(&canvas).unwrap();

        let mut reloaded = new_canvas();
        serializer::load_json(&mut reloaded, &json).unwrap();
        assert_eq!(reloaded.shape_count(), canvas.shape_count());
        assert_eq!(reloaded.connector_count(), canvas.connector_count());
        assert_eq!(
            serializer::to_document(&reloaded).unwrap(),
            serializer::to_document(&canvas).unwrap()
        );
    }
}
