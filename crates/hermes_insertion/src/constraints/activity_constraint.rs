use std::sync::Arc;

use crate::{
    insertion::insertion_context::{ActivityInsertion, JobInsertionContext},
    problem::travel_cost_matrix::Cost,
};

use super::{
    constraints_status::ConstraintsStatus, load_constraint::LoadActivityConstraint,
    max_waiting_constraint::MaxWaitingSoftConstraint,
    time_window_constraint::TimeWindowActivityConstraint,
};

pub trait HardActivityConstraint: Send + Sync {
    fn constraint_name(&self) -> &'static str;

    fn fulfilled(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> ConstraintsStatus;
}

pub trait SoftActivityConstraint: Send + Sync {
    fn constraint_name(&self) -> &'static str;

    fn costs(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> Cost;
}

#[derive(Clone)]
pub enum HardActivityConstraintType {
    Load(LoadActivityConstraint),
    TimeWindow(TimeWindowActivityConstraint),
    Custom(Arc<dyn HardActivityConstraint>),
}

impl HardActivityConstraint for HardActivityConstraintType {
    fn constraint_name(&self) -> &'static str {
        match self {
            HardActivityConstraintType::Load(c) => c.constraint_name(),
            HardActivityConstraintType::TimeWindow(c) => c.constraint_name(),
            HardActivityConstraintType::Custom(c) => c.constraint_name(),
        }
    }

    fn fulfilled(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> ConstraintsStatus {
        match self {
            HardActivityConstraintType::Load(c) => c.fulfilled(context, insertion),
            HardActivityConstraintType::TimeWindow(c) => c.fulfilled(context, insertion),
            HardActivityConstraintType::Custom(c) => c.fulfilled(context, insertion),
        }
    }
}

#[derive(Clone)]
pub enum SoftActivityConstraintType {
    MaxWaiting(MaxWaitingSoftConstraint),
    Custom(Arc<dyn SoftActivityConstraint>),
}

impl SoftActivityConstraint for SoftActivityConstraintType {
    fn constraint_name(&self) -> &'static str {
        match self {
            SoftActivityConstraintType::MaxWaiting(c) => c.constraint_name(),
            SoftActivityConstraintType::Custom(c) => c.constraint_name(),
        }
    }

    fn costs(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> Cost {
        match self {
            SoftActivityConstraintType::MaxWaiting(c) => c.costs(context, insertion),
            SoftActivityConstraintType::Custom(c) => c.costs(context, insertion),
        }
    }
}
