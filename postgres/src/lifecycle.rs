//! Bulk conditional updates for the lifecycle scheduler.

use boxoffice_core::LifecycleTransition;

/// Eligibility predicate over `ticket_types`, with `$1` bound to `now`.
///
/// Mirrors [`LifecycleTransition::matches`].
const fn predicate(transition: LifecycleTransition) -> &'static str {
    match transition {
        LifecycleTransition::Open => "status = 'draft' AND sales_start_at <= $1",
        LifecycleTransition::Close => "status = 'on_sale' AND sales_end_at < $1",
        LifecycleTransition::SellOut => {
            "status = 'on_sale' AND sales_end_at >= $1 \
             AND quantity - COALESCE((SELECT SUM(t.quantity) FROM tickets t \
             WHERE t.ticket_type_id = ticket_types.id), 0) <= 0"
        },
    }
}

/// `UPDATE` moving at most `$2` eligible rows to the transition's target.
///
/// Rows locked by another transaction are skipped and picked up by a later
/// run. The predicate is repeated on the outer statement so a row that
/// changed after selection is left alone.
pub(crate) fn batch_update_sql(transition: LifecycleTransition) -> String {
    let predicate = predicate(transition);
    format!(
        "UPDATE ticket_types SET status = '{target}', updated_at = $1 \
         WHERE id IN (SELECT id FROM ticket_types WHERE {predicate} \
                      ORDER BY id LIMIT $2 FOR UPDATE SKIP LOCKED) \
         AND {predicate}",
        target = transition.to_status().as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_target_the_transition_status() {
        assert!(batch_update_sql(LifecycleTransition::Open).contains("SET status = 'on_sale'"));
        assert!(batch_update_sql(LifecycleTransition::Close).contains("SET status = 'closed'"));
        assert!(batch_update_sql(LifecycleTransition::SellOut).contains("SET status = 'soldout'"));
    }

    #[test]
    fn sell_out_requires_open_window() {
        let sql = batch_update_sql(LifecycleTransition::SellOut);
        assert!(sql.contains("sales_end_at >= $1"));
        assert!(sql.contains("SKIP LOCKED"));
    }
}
