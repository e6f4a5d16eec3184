use crate::{
    insertion::insertion_context::{ActivityInsertion, JobInsertionContext},
    problem::travel_cost_matrix::Cost,
};

use super::activity_constraint::SoftActivityConstraint;

/// Charges `cost_per_waiting` for every time unit spent waiting at the new activity.
#[derive(Debug, Clone)]
pub struct MaxWaitingSoftConstraint {
    cost_per_waiting: Cost,
}

impl MaxWaitingSoftConstraint {
    pub fn new(cost_per_waiting: Cost) -> Self {
        MaxWaitingSoftConstraint { cost_per_waiting }
    }
}

impl SoftActivityConstraint for MaxWaitingSoftConstraint {
    fn constraint_name(&self) -> &'static str {
        "max_waiting"
    }

    fn costs(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> Cost {
        let arrival = insertion.arrival_at_new(context.problem);
        let waiting = (insertion.new.earliest_start() - arrival).max(0.0);
        waiting * self.cost_per_waiting
    }
}
