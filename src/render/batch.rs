//! Many-line rendering over a single document snapshot.
//!
//! Rendering lines one at a time re-scans block context from line 0 for
//! every line. When all requests share a snapshot the batch walks the
//! document once instead. Large batches are split into partitions whose
//! starting block state is seeded by a sequential pre-pass, then rendered on
//! the rayon pool. Output is always identical to per-request [`render_with`].

use rayon::prelude::*;

use super::block::{BlockState, LineContext};
use super::line::{render_in_context, render_with};
use super::{RenderOptions, RenderRequest, RenderResult, guarded};
use crate::error::RenderError;

/// Render every request with default options. Same order, same length.
pub fn render_batch(requests: &[RenderRequest]) -> Vec<RenderResult> {
    render_batch_with(requests, &RenderOptions::default())
}

pub fn render_batch_with(requests: &[RenderRequest], options: &RenderOptions) -> Vec<RenderResult> {
    let _scope = crate::perf::scope("render.batch");
    let Some(first) = requests.first() else {
        return Vec::new();
    };

    // Mixed snapshots have no shared context to amortize.
    if requests.iter().any(|r| r.all_lines != first.all_lines) {
        crate::perf::log_event("render.batch", format!("requests={} mixed", requests.len()));
        return requests.iter().map(|r| render_with(r, options)).collect();
    }

    let lines = first.all_lines.as_slice();
    let mut order: Vec<usize> = (0..requests.len()).collect();
    order.sort_by_key(|&position| requests[position].line_index);

    let workers = if requests.len() > options.parallel_threshold {
        rayon::current_num_threads().max(1)
    } else {
        1
    };
    let partitions: Vec<&[usize]> = order.chunks(order.len().div_ceil(workers)).collect();
    let seeds = seed_partitions(lines, requests, &partitions);
    crate::perf::log_event(
        "render.batch",
        format!("requests={} partitions={}", requests.len(), partitions.len()),
    );

    let render_partition = |(partition, &(state, start)): (&&[usize], &(BlockState, usize))| {
        let wanted: Vec<usize> = partition.iter().map(|&p| requests[p].line_index).collect();
        let contexts = contexts_from(lines, state, start, &wanted);
        partition
            .iter()
            .zip(contexts)
            .map(|(&position, context)| (position, render_one(&requests[position], context, options)))
            .collect::<Vec<_>>()
    };

    let rendered: Vec<Vec<(usize, RenderResult)>> = if partitions.len() > 1 {
        partitions.par_iter().zip(seeds.par_iter()).map(render_partition).collect()
    } else {
        partitions.iter().zip(seeds.iter()).map(render_partition).collect()
    };

    let mut results = vec![RenderResult::default(); requests.len()];
    for (position, result) in rendered.into_iter().flatten() {
        results[position] = result;
    }
    results
}

/// Sequential pre-pass: block state at the first line of each partition.
fn seed_partitions(
    lines: &[String],
    requests: &[RenderRequest],
    partitions: &[&[usize]],
) -> Vec<(BlockState, usize)> {
    let mut seeds = Vec::with_capacity(partitions.len());
    let mut state = BlockState::default();
    let mut cursor = 0;
    for partition in partitions {
        let start = partition
            .first()
            .map_or(cursor, |&p| requests[p].line_index)
            .min(lines.len());
        while cursor < start {
            state.advance(&lines[cursor]);
            cursor += 1;
        }
        seeds.push((state, start));
    }
    seeds
}

/// Walk forward from `start` with `state`, yielding the context of each
/// wanted index (ascending). Indices past the end yield `None`.
fn contexts_from(
    lines: &[String],
    mut state: BlockState,
    start: usize,
    wanted: &[usize],
) -> Vec<Option<LineContext>> {
    let mut contexts = Vec::with_capacity(wanted.len());
    let mut cursor = start;
    let mut last: Option<(usize, LineContext)> = None;
    for &index in wanted {
        if index >= lines.len() {
            contexts.push(None);
            continue;
        }
        if let Some((_, context)) = last.filter(|&(seen, _)| seen == index) {
            contexts.push(Some(context));
            continue;
        }
        while cursor < index {
            state.advance(&lines[cursor]);
            cursor += 1;
        }
        let context = state.advance(&lines[index]);
        cursor = index + 1;
        last = Some((index, context));
        contexts.push(Some(context));
    }
    contexts
}

fn render_one(
    request: &RenderRequest,
    context: Option<LineContext>,
    options: &RenderOptions,
) -> RenderResult {
    guarded(&request.line, request.line_index, || {
        let context = context.ok_or(RenderError::LineOutOfRange {
            index: request.line_index,
            len: request.all_lines.len(),
        })?;
        Ok(render_in_context(
            &request.line,
            context,
            request.is_editing,
            options,
        ))
    })
}
