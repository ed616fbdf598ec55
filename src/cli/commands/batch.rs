//! batch-delete command - Delete many objects through the batch endpoint

use anyhow::{Context as _, Result};

use super::write::existing;
use super::{client, runtime};
use crate::cli::Context;
use crate::core::Entity;
use crate::remote::Method;

/// Delete every id in `ids`.
pub fn batch_delete(ctx: &Context, class: &str, ids: &[String], slice_size: usize) -> Result<()> {
    let client = client(ctx)?;
    let mut entities: Vec<Entity> = ids.iter().map(|id| existing(class, id)).collect();

    let report = runtime()?
        .block_on(client.try_batch_save(&mut entities, slice_size, Some(Method::Delete)))
        .context("Batch delete failed")?;

    if !ctx.quiet {
        eprintln!(
            "Deleted {} object(s) in {} batch call(s)",
            entities.len(),
            report.slices
        );
    }
    Ok(())
}
