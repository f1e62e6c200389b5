use super::CanvasState;
use crate::error::ValidationIssue;
use crate::model::{NodeKind, ShapeId};
use itertools::Itertools;

impl CanvasState {
    /// Collects everything that would block submitting this diagram.
    ///
    /// Nothing here fails; an empty list means the pipeline can be submitted.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if !self.shapes().any(|s| s.kind().is_step()) {
            issues.push(ValidationIssue::NoSteps);
        }

        // Cables from pipeline inputs and to outputs are resolved by name.
        for (role, names) in [
            (
                "input",
                self.shapes()
                    .filter(|s| s.kind().is_pipeline_input())
                    .map(|s| s.name())
                    .collect::<Vec<_>>(),
            ),
            (
                "output",
                self.shapes()
                    .filter(|s| s.kind().is_output())
                    .map(|s| s.name())
                    .collect::<Vec<_>>(),
            ),
        ] {
            for name in names.into_iter().duplicates() {
                issues.push(ValidationIssue::DuplicateName {
                    name: name.to_string(),
                    role,
                });
            }
        }

        for connector in self.connectors().filter(|c| c.type_mismatch) {
            if let (Some(source), Some(dest)) =
                (self.magnet(connector.source), self.magnet(connector.dest))
            {
                issues.push(ValidationIssue::TypeMismatch {
                    connector: connector.id,
                    source_type: source.datatype,
                    dest_type: dest.datatype,
                });
            }
        }

        for shape in self.shapes() {
            match shape.kind() {
                NodeKind::Step { name, .. } => {
                    for magnet in shape.inputs().iter().filter(|m| !m.is_connected()) {
                        issues.push(ValidationIssue::UnfedInput {
                            shape: shape.id(),
                            step_name: name.clone(),
                            input: magnet.label.clone(),
                        });
                    }
                }
                NodeKind::Output { name, .. } => {
                    if !shape.inputs().iter().any(|m| m.is_connected()) {
                        issues.push(ValidationIssue::UnfedOutput {
                            shape: shape.id(),
                            name: name.clone(),
                        });
                    }
                }
                _ => {}
            }
        }

        if let Err(cycle) = self.execution_order() {
            issues.push(ValidationIssue::Cycle { steps: cycle.steps });
        }

        issues
    }

    /// Issues to annotate next to one shape.
    pub fn issues_for(&self, id: ShapeId) -> Vec<ValidationIssue> {
        self.validate()
            .into_iter()
            .filter(|issue| match issue {
                ValidationIssue::TypeMismatch { connector, .. } => self
                    .connector(*connector)
                    .is_some_and(|c| c.touches(id)),
                other => other.shapes().contains(&id),
            })
            .collect()
    }
}
