//! Tests for the canvas model: shapes, cables, ordering, validation, and collisions.
//!
mod common;
use common::*;
use drydock::prelude::*;

#[cfg(test)]
mod connection_tests {
    use super::*;

    #[test]
    fn test_connect_accepts_magnets_in_either_order() {
        let mut canvas = new_canvas();
        let reads = add_raw(&mut canvas, "reads.csv", (100.0, 300.0));
        let align = add_step(&mut canvas, "align", &["reads"], &["alignment"], (400.0, 300.0));

        let id = canvas
            .connect(MagnetRef::input(align, 0), MagnetRef::output(reads, 0))
            .expect("Cable should be accepted");

        let cable = canvas.connector(id).expect("Cable should be in the arena");
        assert_eq!(cable.source, MagnetRef::output(reads, 0));
        assert_eq!(cable.dest, MagnetRef::input(align, 0));
        assert!(!cable.type_mismatch);
        assert!(canvas.is_consistent());
    }

    #[test]
    fn test_connect_rejections() {
        let mut canvas = new_canvas();
        let reads = add_raw(&mut canvas, "reads.csv", (100.0, 300.0));
        let other = add_raw(&mut canvas, "other.csv", (100.0, 450.0));
        let align = add_step(&mut canvas, "align", &["reads"], &["alignment"], (400.0, 300.0));

        assert_eq!(
            canvas.connect(MagnetRef::output(align, 0), MagnetRef::input(align, 0)),
            Err(ConnectRejection::SameShape)
        );
        assert_eq!(
            canvas.connect(MagnetRef::output(reads, 0), MagnetRef::output(other, 0)),
            Err(ConnectRejection::SameDirection)
        );
        assert_eq!(
            canvas.connect(MagnetRef::input(reads, 0), MagnetRef::input(align, 0)),
            Err(ConnectRejection::MissingMagnet(MagnetRef::input(reads, 0)))
        );

        canvas
            .connect(MagnetRef::output(reads, 0), MagnetRef::input(align, 0))
            .expect("First cable is fine");
        assert_eq!(
            canvas.connect(MagnetRef::output(reads, 0), MagnetRef::input(align, 0)),
            Err(ConnectRejection::AlreadyConnected)
        );
        assert_eq!(canvas.connector_count(), 1);
    }

    #[test]
    fn test_new_cable_replaces_existing_input_cable() {
        let mut canvas = new_canvas();
        let first = add_raw(&mut canvas, "first.csv", (100.0, 200.0));
        let second = add_raw(&mut canvas, "second.csv", (100.0, 400.0));
        let step = add_step(&mut canvas, "sort", &["rows"], &["sorted"], (400.0, 300.0));

        canvas
            .connect(MagnetRef::output(first, 0), MagnetRef::input(step, 0))
            .unwrap();
        let replacement = canvas
            .connect(MagnetRef::output(second, 0), MagnetRef::input(step, 0))
            .unwrap();

        assert_eq!(canvas.connector_count(), 1);
        let incoming = canvas.incoming(MagnetRef::input(step, 0)).unwrap();
        assert_eq!(incoming.id, replacement);
        assert_eq!(incoming.source.shape, second);
        assert!(!canvas.magnet(MagnetRef::output(first, 0)).unwrap().is_connected());
        assert!(canvas.is_consistent());
    }

    #[test]
    fn test_one_output_feeds_many_inputs() {
        let mut canvas = new_canvas();
        let reads = add_raw(&mut canvas, "reads.csv", (100.0, 300.0));
        let a = add_step(&mut canvas, "a", &["in"], &["out"], (400.0, 150.0));
        let b = add_step(&mut canvas, "b", &["in"], &["out"], (400.0, 450.0));

        canvas
            .connect(MagnetRef::output(reads, 0), MagnetRef::input(a, 0))
            .unwrap();
        canvas
            .connect(MagnetRef::output(reads, 0), MagnetRef::input(b, 0))
            .unwrap();

        assert_eq!(canvas.outgoing(MagnetRef::output(reads, 0)).count(), 2);
        assert_eq!(
            canvas
                .magnet(MagnetRef::output(reads, 0))
                .unwrap()
                .connected()
                .len(),
            2
        );
        assert!(canvas.is_consistent());
    }

    #[test]
    fn test_remove_shape_leaves_no_dangling_cables() {
        let ReadsAlign {
            mut canvas,
            reads,
            align,
            output,
        } = reads_align();
        assert_eq!(canvas.connector_count(), 2);

        let removed = canvas.remove_shape(align).expect("align exists");
        assert_eq!(removed.name(), "align");

        assert_eq!(canvas.connector_count(), 0);
        assert!(canvas.shape(align).is_none());
        assert!(!canvas.magnet(MagnetRef::output(reads, 0)).unwrap().is_connected());
        assert!(!canvas.magnet(MagnetRef::input(output, 0)).unwrap().is_connected());
        assert!(canvas.is_consistent());

        assert_eq!(
            canvas.remove_shape(align).unwrap_err(),
            CanvasError::UnknownShape(align)
        );
    }

    #[test]
    fn test_remove_connector_and_disconnect_shape() {
        let ReadsAlign {
            mut canvas, align, ..
        } = reads_align();
        let first = canvas.connectors().next().unwrap().id;

        canvas.remove_connector(first).expect("cable exists");
        assert_eq!(canvas.connector_count(), 1);
        assert_eq!(
            canvas.remove_connector(first).unwrap_err(),
            CanvasError::UnknownConnector(first)
        );

        assert_eq!(canvas.disconnect_shape(align).unwrap(), 1);
        assert_eq!(canvas.connector_count(), 0);
        assert_eq!(canvas.shape_count(), 3);
        assert!(canvas.is_consistent());
    }
}

#[cfg(test)]
mod datatype_tests {
    use super::*;

    #[test]
    fn test_mismatched_compound_types_are_flagged_not_refused() {
        let mut canvas = new_canvas();
        let table = add_typed(&mut canvas, "table", 5, (100.0, 300.0));
        let step = add_typed_step(
            &mut canvas,
            "load",
            vec![StepPort::new("rows", Datatype::Compound(7))],
            vec![StepPort::any("loaded")],
            (400.0, 300.0),
        );

        let id = canvas
            .connect(MagnetRef::output(table, 0), MagnetRef::input(step, 0))
            .expect("Mismatched cables are still drawn");
        assert!(canvas.connector(id).unwrap().type_mismatch);

        let issues = canvas.validate();
        assert!(issues.contains(&ValidationIssue::TypeMismatch {
            connector: id,
            source_type: Datatype::Compound(5),
            dest_type: Datatype::Compound(7),
        }));
    }

    #[test]
    fn test_matching_or_untyped_cables_are_fine() {
        let mut canvas = new_canvas();
        let table = add_typed(&mut canvas, "table", 5, (100.0, 300.0));
        let step = add_typed_step(
            &mut canvas,
            "load",
            vec![
                StepPort::new("rows", Datatype::Compound(5)),
                StepPort::any("anything"),
            ],
            vec![StepPort::any("loaded")],
            (400.0, 300.0),
        );

        let exact = canvas
            .connect(MagnetRef::output(table, 0), MagnetRef::input(step, 0))
            .unwrap();
        let untyped = canvas
            .connect(MagnetRef::output(table, 0), MagnetRef::input(step, 1))
            .unwrap();

        assert!(!canvas.connector(exact).unwrap().type_mismatch);
        assert!(!canvas.connector(untyped).unwrap().type_mismatch);
        assert!(Datatype::Any.is_compatible_with(&Datatype::Compound(9)));
        assert!(!Datatype::Compound(5).is_compatible_with(&Datatype::Compound(7)));
    }
}

#[cfg(test)]
mod order_tests {
    use super::*;

    #[test]
    fn test_chain_orders_upstream_first() {
        let mut canvas = new_canvas();
        let steps = step_chain(&mut canvas, 3);

        assert_eq!(canvas.execution_order(), Ok(steps.clone()));
        assert_eq!(canvas.step_number(steps[0]), Some(1));
        assert_eq!(canvas.step_number(steps[2]), Some(3));
    }

    #[test]
    fn test_order_follows_cables_not_insertion() {
        let mut canvas = new_canvas();
        let late = add_step(&mut canvas, "late", &["in"], &["out"], (500.0, 100.0));
        let early = add_step(&mut canvas, "early", &["in"], &["out"], (200.0, 100.0));
        canvas
            .connect(MagnetRef::output(early, 0), MagnetRef::input(late, 0))
            .unwrap();

        assert_eq!(canvas.execution_order(), Ok(vec![early, late]));
    }

    #[test]
    fn test_independent_steps_keep_insertion_order() {
        let mut canvas = new_canvas();
        let x = add_step(&mut canvas, "x", &["in"], &["out"], (200.0, 100.0));
        let y = add_step(&mut canvas, "y", &["in"], &["out"], (200.0, 300.0));
        let z = add_step(&mut canvas, "z", &["in"], &["out"], (200.0, 500.0));

        assert_eq!(canvas.execution_order(), Ok(vec![x, y, z]));
    }

    #[test]
    fn test_cycle_is_reported_with_its_members() {
        let mut canvas = new_canvas();
        let steps = step_chain(&mut canvas, 3);
        let tail = add_step(&mut canvas, "tail", &["in"], &["out"], (300.0, 400.0));
        canvas
            .connect(MagnetRef::output(steps[2], 0), MagnetRef::input(tail, 0))
            .unwrap();
        canvas
            .connect(MagnetRef::output(steps[2], 0), MagnetRef::input(steps[0], 0))
            .unwrap();

        let cycle = canvas.execution_order().unwrap_err();
        assert_eq!(cycle.steps, steps);
        assert_eq!(canvas.step_number(steps[0]), None);
        assert!(
            canvas
                .validate()
                .contains(&ValidationIssue::Cycle { steps: steps.clone() })
        );
    }

    #[test]
    fn test_data_nodes_are_not_numbered() {
        let ReadsAlign {
            canvas,
            reads,
            align,
            output,
        } = reads_align();
        assert_eq!(canvas.execution_order(), Ok(vec![align]));
        assert_eq!(canvas.step_number(reads), None);
        assert_eq!(canvas.step_number(output), None);
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_complete_pipeline_has_no_issues() {
        let ReadsAlign { canvas, .. } = reads_align();
        assert!(canvas.validate().is_empty());
    }

    #[test]
    fn test_empty_canvas_has_no_steps() {
        let canvas = new_canvas();
        assert_eq!(canvas.validate(), vec![ValidationIssue::NoSteps]);
    }

    #[test]
    fn test_unfed_inputs_and_outputs() {
        let mut canvas = new_canvas();
        let step = add_step(&mut canvas, "merge", &["left", "right"], &["merged"], (400.0, 300.0));
        let output = add_output(&mut canvas, "result", (650.0, 300.0));

        let issues = canvas.validate();
        assert!(issues.contains(&ValidationIssue::UnfedInput {
            shape: step,
            step_name: "merge".to_string(),
            input: "left".to_string(),
        }));
        assert!(issues.contains(&ValidationIssue::UnfedInput {
            shape: step,
            step_name: "merge".to_string(),
            input: "right".to_string(),
        }));
        assert!(issues.contains(&ValidationIssue::UnfedOutput {
            shape: output,
            name: "result".to_string(),
        }));

        assert_eq!(canvas.issues_for(output).len(), 1);
        assert_eq!(canvas.issues_for(step).len(), 2);
    }

    #[test]
    fn test_duplicate_input_names() {
        let mut canvas = new_canvas();
        add_raw(&mut canvas, "reads.csv", (100.0, 100.0));
        add_raw(&mut canvas, "reads.csv", (100.0, 300.0));

        assert!(canvas.validate().contains(&ValidationIssue::DuplicateName {
            name: "reads.csv".to_string(),
            role: "input",
        }));
    }

    #[test]
    fn test_issue_messages_are_readable() {
        let mut canvas = new_canvas();
        let steps = step_chain(&mut canvas, 2);

        let issue = ValidationIssue::UnfedInput {
            shape: steps[0],
            step_name: "align".to_string(),
            input: "reads".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "Input 'reads' of step 'align' is not connected"
        );
        let cycle = ValidationIssue::Cycle {
            steps: steps.clone(),
        };
        assert_eq!(
            cycle.to_string(),
            format!("Steps {}, {} form a cycle", steps[0], steps[1])
        );
        assert!(steps[0].to_string().starts_with("shape#"));
    }

    #[test]
    fn test_ids_survive_removal_of_other_shapes() {
        let mut canvas = new_canvas();
        let a = add_raw(&mut canvas, "a", (100.0, 100.0));
        let b = add_raw(&mut canvas, "b", (300.0, 100.0));
        canvas.remove_shape(a).unwrap();
        let c = add_raw(&mut canvas, "c", (500.0, 100.0));

        assert_ne!(a, c);
        assert!(canvas.shape(a).is_none());
        assert_eq!(canvas.shape(b).unwrap().name(), "b");
        assert_eq!(canvas.z_index(b), Some(0));
        assert_eq!(canvas.z_index(c), Some(1));
        assert_eq!(ShapeId::from(c.as_u64()), c);
        assert!(canvas.is_consistent());
    }
}

#[cfg(test)]
mod collision_tests {
    use super::*;

    #[test]
    fn test_place_shape_nudges_off_an_occupied_slot() {
        let mut canvas = new_canvas();
        let first = canvas.place_shape(
            NodeKind::RawData {
                name: "a".to_string(),
            },
            Point::new(100.0, 100.0),
        );
        let second = canvas.place_shape(
            NodeKind::RawData {
                name: "b".to_string(),
            },
            Point::new(100.0, 100.0),
        );

        assert_eq!(canvas.shape(first).unwrap().position, Point::new(100.0, 100.0));
        assert_eq!(canvas.shape(second).unwrap().position, Point::new(100.0, 52.0));
        assert!(canvas.overlapping_pairs().is_empty());
        assert!(canvas.collisions(second).unwrap().is_empty());
    }

    #[test]
    fn test_add_shape_allows_overlap() {
        let mut canvas = new_canvas();
        let a = add_raw(&mut canvas, "a", (100.0, 100.0));
        let b = add_raw(&mut canvas, "b", (110.0, 110.0));

        assert_eq!(canvas.overlapping_pairs(), vec![(a, b)]);
        assert_eq!(canvas.collisions(a).unwrap(), vec![b]);
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let mut canvas = new_canvas();
        add_raw(&mut canvas, "a", (100.0, 100.0));
        add_raw(&mut canvas, "b", (148.0, 100.0));
        assert!(canvas.overlapping_pairs().is_empty());
    }

    #[test]
    fn test_placement_allow_policy_leaves_overlap() {
        let mut canvas = CanvasState::builder(800.0, 600.0)
            .with_placement_collision(CollisionPolicy::Allow)
            .build()
            .unwrap();
        canvas.place_shape(
            NodeKind::RawData {
                name: "a".to_string(),
            },
            Point::new(100.0, 100.0),
        );
        canvas.place_shape(
            NodeKind::RawData {
                name: "b".to_string(),
            },
            Point::new(100.0, 100.0),
        );
        assert_eq!(canvas.overlapping_pairs().len(), 1);
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_config_from_partial_json() {
        let config = CanvasConfig::from_json(r#"{ "width": 1024, "drag_collision": "nudge" }"#)
            .expect("Partial config should parse");
        assert_eq!(config.width, 1024.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.drag_collision, CollisionPolicy::Nudge);
        assert_eq!(config.placement_collision, CollisionPolicy::Nudge);
    }

    #[test]
    fn test_invalid_configuration_fails_at_build() {
        assert!(matches!(
            CanvasState::builder(0.0, 600.0).build(),
            Err(CanvasError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            CanvasState::builder(800.0, 600.0)
                .with_magnet_radius(0.0)
                .build(),
            Err(CanvasError::InvalidConfig(_))
        ));
        assert!(CanvasConfig::from_json(r#"{ "height": -1 }"#).is_err());
        assert!(CanvasConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_nudge_search_is_bounded() {
        assert!(matches!(
            CanvasState::builder(800.0, 600.0)
                .with_nudge(8.0, 100_000)
                .build(),
            Err(CanvasError::InvalidConfig(_))
        ));
        assert!(CanvasState::builder(800.0, 600.0)
            .with_nudge(8.0, drydock::canvas::MAX_NUDGE_RINGS)
            .build()
            .is_ok());
        assert!(CanvasConfig::from_json(r#"{ "nudge_max_rings": 65 }"#).is_err());
    }

    #[test]
    fn test_resize_keeps_relative_positions() {
        let ReadsAlign {
            mut canvas, reads, ..
        } = reads_align();
        canvas.resize(1600.0, 1200.0).unwrap();

        assert_eq!(canvas.shape(reads).unwrap().position, Point::new(200.0, 600.0));
        assert!(canvas.resize(-5.0, 10.0).is_err());
        assert_eq!(canvas.width(), 1600.0);
    }

    #[test]
    fn test_updating_flag_invalidates_when_cleared() {
        let mut canvas = new_canvas();
        let mut frame = DisplayList::new();
        canvas.draw(&mut frame);
        assert!(canvas.is_valid());

        canvas.set_updating(true);
        canvas.set_updating(false);
        assert!(!canvas.is_valid());
    }
}
