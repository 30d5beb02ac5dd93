use crate::block::BlockKind;
use crate::error::ModelError;
use crate::model::Model;

/// Computes an execution order for a model's blocks.
///
/// The order is seeded with every `InputPort` block (they have no inputs,
/// so they're trivially ready). After that, a block becomes ready once every
/// connection into one of its *non-delayed* inputs has its source block
/// already scheduled — a `Delay` block's output is read from the previous
/// tick, so blocks reading from one don't have to wait for it. Ties among
/// several ready blocks are broken by ascending id. If a pass finds no newly
/// ready block while some remain unscheduled, the graph has a cycle that
/// doesn't run through a delay, and scheduling fails with
/// [`ModelError::UnresolvableCycle`].
pub fn schedule(model: &Model) -> Result<Vec<usize>, ModelError> {
    let mut scheduled: Vec<usize> = Vec::new();
    let mut remaining: Vec<usize> = model.blocks().iter().map(|b| b.id()).collect();

    let is_input_port = |id: usize| matches!(model.get_block(id).map(|b| b.kind()), Some(BlockKind::InputPort(_)));

    remaining.retain(|id| {
        if is_input_port(*id) {
            scheduled.push(*id);
            false
        } else {
            true
        }
    });

    loop {
        remaining.sort_unstable();

        let mut ready = Vec::new();
        for &id in &remaining {
            let block = model.get_block(id).expect("remaining ids always refer to a live block");
            let deps_satisfied = (0..block.num_inputs()).all(|port| match model.connections().get_connection_to(id, port) {
                None => true,
                Some(c) => {
                    let source = model.get_block(c.from_block());
                    source.map(|s| s.outputs_are_delayed() || scheduled.contains(&c.from_block())).unwrap_or(true)
                }
            });
            if deps_satisfied {
                ready.push(id);
            }
        }

        if ready.is_empty() {
            if remaining.is_empty() {
                return Ok(scheduled);
            }
            log::warn!("scheduling stalled with {} block(s) still unresolved: {remaining:?}", remaining.len());
            return Err(ModelError::UnresolvableCycle);
        }

        for id in ready {
            scheduled.push(id);
            remaining.retain(|r| *r != id);
        }
    }
}
