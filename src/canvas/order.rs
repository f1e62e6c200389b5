use super::CanvasState;
use crate::model::ShapeId;
use ahash::AHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// The step graph contains at least one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCycle {
    /// Steps lying on a cycle (or between two cycles), in z-order.
    pub steps: Vec<ShapeId>,
}

impl CanvasState {
    /// Orders the steps so every step comes after the steps feeding it.
    ///
    /// Only step-to-step cables count. Among steps whose inputs are all
    /// satisfied, the one added to the canvas first goes first, so the order is
    /// stable across redraws.
    pub fn execution_order(&self) -> Result<Vec<ShapeId>, StepCycle> {
        let steps: Vec<ShapeId> = self
            .shapes()
            .filter(|s| s.kind().is_step())
            .map(|s| s.id())
            .collect();
        let rank: AHashMap<ShapeId, usize> =
            steps.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut in_degree = vec![0usize; steps.len()];
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];
        for connector in self.connectors() {
            if let (Some(&from), Some(&to)) = (
                rank.get(&connector.source.shape),
                rank.get(&connector.dest.shape),
            ) {
                downstream[from].push(to);
                in_degree[to] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();
        let mut order = Vec::with_capacity(steps.len());
        while let Some(Reverse(i)) = ready.pop() {
            order.push(steps[i]);
            for &next in &downstream[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() == steps.len() {
            return Ok(order);
        }

        // Steps left over are on a cycle or downstream of one. Peel off the ones
        // that feed nothing else that is left over; what remains is cyclic.
        let mut remaining: Vec<bool> = in_degree.iter().map(|d| *d > 0).collect();
        loop {
            let sinks: Vec<usize> = (0..steps.len())
                .filter(|&i| remaining[i] && !downstream[i].iter().any(|&n| remaining[n]))
                .collect();
            if sinks.is_empty() {
                break;
            }
            for i in sinks {
                remaining[i] = false;
            }
        }

        Err(StepCycle {
            steps: (0..steps.len())
                .filter(|&i| remaining[i])
                .map(|i| steps[i])
                .collect(),
        })
    }

    /// The 1-based execution position of a step, when the step graph is acyclic.
    pub fn step_number(&self, id: ShapeId) -> Option<usize> {
        self.execution_order()
            .ok()?
            .iter()
            .position(|s| *s == id)
            .map(|i| i + 1)
    }
}
