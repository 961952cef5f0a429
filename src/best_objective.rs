use anyhow::Result;
use log::{debug, info};
use rusqlite::{params, Connection};

use crate::datastructures::*;

const BEST_OBJ_VAL_QUERY: &str = "
SELECT
    i.id,
    MIN(ga.obj_val) AS min_obj_val
FROM instances i
JOIN jobs j ON i.id = j.instance_id
JOIN grb_attributes ga ON j.id = ga.job_id
WHERE ga.sol_count > 0 AND ga.obj_val IS NOT NULL
GROUP BY i.id
ORDER BY i.id
";

/// Lowest objective value over all solved jobs, per instance with at least
/// one solved job.
pub fn best_objective_values(conn: &Connection) -> Result<Vec<(InstanceId, f64)>> {
    let mut stmt = conn.prepare(BEST_OBJ_VAL_QUERY)?;
    let values = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(values)
}

/// Stores the best objective value of every instance with a solved job.
///
/// Instances without a solved job keep whatever value they had before, so a
/// value is never reset once the job that produced it disappears.
pub fn set_best_obj_val(conn: &mut Connection) -> Result<BestObjectiveReport> {
    let tx = conn.transaction()?;
    let best_values = best_objective_values(&tx)?;
    if best_values.is_empty() {
        info!("No solutions with sol_count > 0 found to update best objective values");
        return Ok(BestObjectiveReport::default());
    }

    let mut updated = 0;
    {
        let mut stmt = tx
            .prepare("UPDATE instances SET best_known_obj_val = ?1 WHERE id = ?2")?;
        for (instance_id, min_obj_val) in &best_values {
            debug!("Updating instance {instance_id} with best_known_obj_val = {min_obj_val}");
            updated += stmt.execute(params![min_obj_val, instance_id])?;
        }
    }
    tx.commit()?;
    info!("Updated best known objective value of {updated} instances");
    Ok(BestObjectiveReport { updated })
}
