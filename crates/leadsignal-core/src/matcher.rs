use crate::alert::NewAlert;
use crate::metrics::AdsetMetrics;
use crate::trigger::DecisionTrigger;

/// Active triggers whose week restriction (if any) equals `week`.
pub fn applicable_triggers(triggers: &[DecisionTrigger], week: u32) -> Vec<&DecisionTrigger> {
    triggers
        .iter()
        .filter(|t| t.is_active && t.applies_in_week(week))
        .collect()
}

/// Evaluate one trigger against one ad set. `None` when the trigger has no
/// threshold, the metric value is not finite, or the condition is false.
pub fn evaluate_trigger(
    trigger: &DecisionTrigger,
    metrics: &AdsetMetrics,
    week: u32,
) -> Option<NewAlert> {
    let threshold = trigger.threshold_value.filter(|t| t.is_finite())?;
    let value = metrics.value(trigger.metric);
    if !value.is_finite() || !trigger.operator.evaluate(value, threshold) {
        return None;
    }
    Some(NewAlert {
        trigger_id: trigger.id.clone(),
        trigger_name: trigger.trigger_name.clone(),
        adset_name: metrics.adset_name.clone(),
        metric: trigger.metric,
        operator: trigger.operator,
        metric_value: value,
        threshold_value: threshold,
        severity: trigger.severity,
        campaign_week: week,
        message: format!(
            "{}: {} {} is {:.2} ({} {:.2})",
            trigger.trigger_name,
            metrics.adset_name,
            trigger.metric,
            value,
            trigger.operator.symbol(),
            threshold
        ),
    })
}

/// Candidate alerts for every (trigger, ad set) pair whose pattern matches
/// and whose condition holds.
pub fn match_triggers(
    triggers: &[&DecisionTrigger],
    metrics: &[AdsetMetrics],
    week: u32,
) -> Vec<NewAlert> {
    triggers
        .iter()
        .flat_map(|trigger| {
            metrics
                .iter()
                .filter(move |m| trigger.matches_adset(&m.adset_name))
                .filter_map(move |m| evaluate_trigger(trigger, m, week))
        })
        .collect()
}
