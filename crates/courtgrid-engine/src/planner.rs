//! Validation, conflict assessment, and commit of mutations.
//!
//! Every mutation is checked in full against the store before anything is
//! written, so a rejected mutation leaves the store untouched. The engine
//! runs this against its canonical store; simulation runs it against a
//! clone.

use courtgrid_core::{
    court_day_key, Block, BlockId, BlockType, ChangeKind, CourtCatalog, CourtDayKey, EngineConfig,
    MutationError, Placement, TimeRange, ValidationError, Validator,
};
use courtgrid_rails::overlap_range;

use crate::mutation::{
    ApplyBlockOptions, ConflictReport, MoveBlockOptions, Mutation, MutationResult,
    ResizeBlockOptions, TemplateOptions,
};
use crate::store::BlockStore;

/// Result of running a mutation, plus the change to announce if it committed.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub result: MutationResult,
    pub change: Option<ChangeKind>,
}

impl Outcome {
    fn rejected(result: MutationResult) -> Self {
        Self {
            result,
            change: None,
        }
    }

    fn failed(error: impl Into<MutationError>) -> Self {
        Self::rejected(MutationResult::failed(error))
    }
}

pub(crate) fn execute(
    store: &mut BlockStore,
    mutation: &Mutation,
    config: &EngineConfig,
    catalog: &CourtCatalog,
) -> Outcome {
    let mut outcome = match mutation {
        Mutation::ApplyBlock(opts) => apply_block(store, opts, config, catalog),
        Mutation::MoveBlock(opts) => move_block(store, opts, config, catalog),
        Mutation::ResizeBlock(opts) => resize_block(store, opts, config, catalog),
        Mutation::RemoveBlock { block_id } => remove_block(store, *block_id),
        Mutation::ApplyTemplate(opts) => apply_template(store, opts, config, catalog),
    };
    outcome.result.affected.sort();
    outcome.result.affected.dedup();
    outcome
}

/// Priority a new block receives.
pub(crate) fn resolve_priority(
    config: &EngineConfig,
    block_type: BlockType,
    priority: Option<u32>,
) -> u32 {
    priority.unwrap_or_else(|| config.status_precedence.rank(block_type))
}

/// Classify overlaps between an incoming interval and the blocks already on
/// `key`. Returns `(warnings, conflicts)`.
///
/// Overlapping a block of equal or lower priority is a warning. Overlapping a
/// strictly higher-priority block is a warning too, unless the configuration
/// disallows downgrades, in which case it is a conflict.
pub(crate) fn assess_overlaps(
    store: &BlockStore,
    key: &CourtDayKey,
    range: &TimeRange,
    incoming_type: BlockType,
    incoming_priority: u32,
    exclude: Option<BlockId>,
    config: &EngineConfig,
) -> (Vec<ConflictReport>, Vec<ConflictReport>) {
    let mut warnings = Vec::new();
    let mut conflicts = Vec::new();

    for existing in store.for_court_day(key) {
        if Some(existing.id) == exclude {
            continue;
        }
        let Some(overlap) = overlap_range(&existing.range, range) else {
            continue;
        };
        let report = ConflictReport {
            key: key.clone(),
            existing: existing.id,
            existing_type: existing.block_type,
            existing_priority: existing.priority,
            incoming_type,
            incoming_priority,
            overlap,
        };
        if existing.priority > incoming_priority && !config.allow_downgrade {
            conflicts.push(report);
        } else {
            warnings.push(report);
        }
    }

    (warnings, conflicts)
}

fn apply_block(
    store: &mut BlockStore,
    opts: &ApplyBlockOptions,
    config: &EngineConfig,
    catalog: &CourtCatalog,
) -> Outcome {
    if let Err(e) = Validator::validate_placement(&opts.court, &opts.range, config, catalog) {
        return Outcome::failed(e);
    }

    let key = court_day_key(&opts.court, opts.day);
    let priority = resolve_priority(config, opts.block_type, opts.priority);
    let (warnings, conflicts) = assess_overlaps(
        store,
        &key,
        &opts.range,
        opts.block_type,
        priority,
        None,
        config,
    );
    let mut result = MutationResult {
        warnings,
        conflicts,
        ..MutationResult::default()
    };

    if result.has_conflicts() && !opts.override_conflicts {
        tracing::warn!(
            "Rejected {:?} on {}: {} conflicting blocks",
            opts.block_type,
            key,
            result.conflicts.len()
        );
        return Outcome::rejected(result);
    }

    let block = Block {
        id: store.next_id(),
        court: opts.court.clone(),
        day: opts.day,
        range: opts.range,
        block_type: opts.block_type,
        priority,
        metadata: opts.metadata.clone(),
    };
    let id = store.insert(block.clone());
    tracing::debug!("Added {} ({:?} {}) on {}", id, opts.block_type, opts.range, key);

    result.applied = true;
    result.block_ids = vec![id];
    result.affected = vec![key];
    Outcome {
        result,
        change: Some(ChangeKind::BlockAdded {
            block: Block { id, ..block },
        }),
    }
}

/// Shared path for move and resize: validate the target placement, assess
/// overlaps excluding the block itself, then relocate it in place.
fn reposition(
    store: &mut BlockStore,
    block_id: BlockId,
    target: impl FnOnce(&Block) -> Placement,
    override_conflicts: bool,
    config: &EngineConfig,
    catalog: &CourtCatalog,
) -> Result<(MutationResult, Block, Placement), Outcome> {
    let existing = store
        .get(block_id)
        .ok_or_else(|| Outcome::failed(MutationError::BlockNotFound(block_id)))?;
    let to = target(existing);

    Validator::validate_placement(&to.court, &to.range, config, catalog)
        .map_err(Outcome::failed)?;

    let key = court_day_key(&to.court, to.day);
    let (warnings, conflicts) = assess_overlaps(
        store,
        &key,
        &to.range,
        existing.block_type,
        existing.priority,
        Some(block_id),
        config,
    );
    let mut result = MutationResult {
        warnings,
        conflicts,
        ..MutationResult::default()
    };

    if result.has_conflicts() && !override_conflicts {
        tracing::warn!(
            "Rejected repositioning {} to {} {}: {} conflicting blocks",
            block_id,
            key,
            to.range,
            result.conflicts.len()
        );
        return Err(Outcome::rejected(result));
    }

    let previous = store
        .relocate(block_id, to.court.clone(), to.day, to.range)
        .ok_or_else(|| Outcome::failed(MutationError::BlockNotFound(block_id)))?;

    result.applied = true;
    result.block_ids = vec![block_id];
    result.affected = vec![previous.key(), key];
    Ok((result, previous, to))
}

fn move_block(
    store: &mut BlockStore,
    opts: &MoveBlockOptions,
    config: &EngineConfig,
    catalog: &CourtCatalog,
) -> Outcome {
    let target = |b: &Block| Placement {
        court: opts.court.clone().unwrap_or_else(|| b.court.clone()),
        day: opts.day.unwrap_or(b.day),
        range: opts.range,
    };
    match reposition(
        store,
        opts.block_id,
        target,
        opts.override_conflicts,
        config,
        catalog,
    ) {
        Ok((result, previous, to)) => {
            tracing::debug!("Moved {} from {} to {}", opts.block_id, previous.range, to.range);
            Outcome {
                result,
                change: Some(ChangeKind::BlockMoved {
                    block_id: opts.block_id,
                    from: Placement::of(&previous),
                    to,
                }),
            }
        }
        Err(outcome) => outcome,
    }
}

fn resize_block(
    store: &mut BlockStore,
    opts: &ResizeBlockOptions,
    config: &EngineConfig,
    catalog: &CourtCatalog,
) -> Outcome {
    if opts.start.is_none() && opts.end.is_none() {
        return Outcome::failed(ValidationError::EmptyResize);
    }
    let target = |b: &Block| Placement {
        court: b.court.clone(),
        day: b.day,
        range: TimeRange::new(
            opts.start.unwrap_or(b.range.start),
            opts.end.unwrap_or(b.range.end),
        ),
    };
    match reposition(
        store,
        opts.block_id,
        target,
        opts.override_conflicts,
        config,
        catalog,
    ) {
        Ok((result, previous, to)) => {
            tracing::debug!("Resized {} from {} to {}", opts.block_id, previous.range, to.range);
            Outcome {
                result,
                change: Some(ChangeKind::BlockResized {
                    block_id: opts.block_id,
                    from: previous.range,
                    to: to.range,
                }),
            }
        }
        Err(outcome) => outcome,
    }
}

fn remove_block(store: &mut BlockStore, block_id: BlockId) -> Outcome {
    let Some(block) = store.remove(block_id) else {
        return Outcome::failed(MutationError::BlockNotFound(block_id));
    };
    tracing::debug!("Removed {} from {}", block_id, block.key());

    let result = MutationResult {
        applied: true,
        block_ids: vec![block_id],
        affected: vec![block.key()],
        ..MutationResult::default()
    };
    Outcome {
        result,
        change: Some(ChangeKind::BlockRemoved { block }),
    }
}

fn apply_template(
    store: &mut BlockStore,
    opts: &TemplateOptions,
    config: &EngineConfig,
    catalog: &CourtCatalog,
) -> Outcome {
    let placements = opts.placements();
    if placements.is_empty() {
        return Outcome::failed(ValidationError::EmptyTemplate);
    }
    for (court, _) in &placements {
        if let Err(e) = Validator::validate_placement(court, &opts.range, config, catalog) {
            return Outcome::failed(e);
        }
    }

    let priority = resolve_priority(config, opts.block_type, opts.priority);
    let mut result = MutationResult::default();
    let mut clean = Vec::with_capacity(placements.len());

    for (court, day) in placements {
        let key = court_day_key(&court, day);
        let (warnings, conflicts) = assess_overlaps(
            store,
            &key,
            &opts.range,
            opts.block_type,
            priority,
            None,
            config,
        );
        result.warnings.extend(warnings);
        if conflicts.is_empty() || opts.override_conflicts {
            clean.push((court, day));
        } else {
            result.rejected.push(Placement {
                court,
                day,
                range: opts.range,
            });
        }
        result.conflicts.extend(conflicts);
    }

    if !result.rejected.is_empty() && opts.atomic {
        tracing::warn!(
            "Rejected template {:?} {}: {} of {} placements conflict",
            opts.block_type,
            opts.range,
            result.rejected.len(),
            result.rejected.len() + clean.len()
        );
        return Outcome::rejected(result);
    }
    if clean.is_empty() {
        return Outcome::rejected(result);
    }

    for (court, day) in clean {
        let key = court_day_key(&court, day);
        let id = store.insert(Block {
            id: store.next_id(),
            court,
            day,
            range: opts.range,
            block_type: opts.block_type,
            priority,
            metadata: opts.metadata.clone(),
        });
        result.block_ids.push(id);
        result.affected.push(key);
    }
    tracing::info!(
        "Applied template {:?} {} as {} blocks",
        opts.block_type,
        opts.range,
        result.block_ids.len()
    );

    result.applied = true;
    let block_ids = result.block_ids.clone();
    Outcome {
        result,
        change: Some(ChangeKind::TemplateApplied { block_ids }),
    }
}
