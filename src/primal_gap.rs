use anyhow::Result;
use log::{info, warn};
use rusqlite::{params, Connection};

use crate::datastructures::*;

const SOLVED_JOBS_QUERY: &str = "
SELECT
    ga.id,
    ga.obj_val,
    i.best_known_obj_val
FROM grb_attributes ga
JOIN jobs j ON ga.job_id = j.id
JOIN instances i ON j.instance_id = i.id
WHERE ga.sol_count > 0
ORDER BY ga.id
";

/// Relative distance of `obj_val` to the reference objective `best`.
///
/// A missing reference or one within `zero_tolerance` of zero gives
/// positive infinity.
pub fn primal_gap(obj_val: f64, best: Option<f64>, zero_tolerance: f64) -> f64 {
    match best {
        Some(best) if best.abs() > zero_tolerance => {
            (obj_val - best).abs() / best.abs()
        }
        _ => f64::INFINITY,
    }
}

/// Writes the primal gap of every job that found a solution. Run it after
/// the best objective values are up to date.
pub fn set_primal_gap(
    conn: &mut Connection,
    zero_tolerance: f64,
) -> Result<PrimalGapReport> {
    let tx = conn.transaction()?;
    let rows = {
        let mut stmt = tx.prepare(SOLVED_JOBS_QUERY)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };
    if rows.is_empty() {
        info!("No solutions found to compute primal gap");
        return Ok(PrimalGapReport::default());
    }

    let mut report = PrimalGapReport::default();
    {
        let mut stmt =
            tx.prepare("UPDATE grb_attributes SET primal_gap = ?1 WHERE id = ?2")?;
        for (attributes_id, obj_val, best) in rows {
            let Some(obj_val) = obj_val else {
                warn!("grb_attributes row {attributes_id} has solutions but no objective value");
                report.skipped += 1;
                continue;
            };
            let gap = primal_gap(obj_val, best, zero_tolerance);
            if gap.is_infinite() {
                report.infinite += 1;
            }
            report.updated += stmt.execute(params![gap, attributes_id])?;
        }
    }
    tx.commit()?;
    info!("Successfully {report}");
    Ok(report)
}
