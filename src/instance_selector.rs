use anyhow::Result;
use itertools::Itertools;
use log::{debug, info};
use rusqlite::{params, Connection};

use crate::datastructures::*;
use crate::latest_jobs::latest_jobs;

/// Latest jobs of the selection group that fall into the gap band and carry
/// a solution. Nothing is written.
pub fn selection_candidates(
    conn: &Connection,
    criteria: &SelectionCriteria,
) -> Result<Vec<LatestJob>> {
    Ok(latest_jobs(conn, &criteria.group_name)?
        .into_iter()
        .filter(|job| criteria.accepts(job))
        .collect_vec())
}

/// Clears the selection flag of every instance and sets it for the instances
/// passing `criteria`.
///
/// Both steps share one transaction. When no instance qualifies the cleared
/// state is committed and the report counts zero.
pub fn make_instance_selection(
    conn: &mut Connection,
    criteria: &SelectionCriteria,
) -> Result<SelectionReport> {
    let tx = conn.transaction()?;
    let cleared = tx.execute("UPDATE instances SET selected = 0", [])?;
    debug!("Cleared selection of {cleared} instances");

    let candidates = selection_candidates(&tx, criteria)?;
    if candidates.is_empty() {
        info!("No instances to select");
        tx.commit()?;
        return Ok(SelectionReport::default());
    }

    let mut selected = 0;
    {
        let mut stmt =
            tx.prepare("UPDATE instances SET selected = 1 WHERE id = ?1")?;
        for job in &candidates {
            selected += stmt.execute(params![job.instance_id])?;
        }
    }
    tx.commit()?;
    info!(
        "Selected {selected} instances ({} < mip_gap < {} in group {})",
        criteria.min_mip_gap, criteria.max_mip_gap, criteria.group_name
    );
    Ok(SelectionReport { selected })
}
