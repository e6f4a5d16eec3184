use tracing::trace;

use crate::{
    insertion::insertion_context::{ActivityInsertion, JobInsertionContext},
    problem::travel_cost_matrix::Cost,
};

use super::{
    activity_constraint::{
        HardActivityConstraint, HardActivityConstraintType, SoftActivityConstraint,
        SoftActivityConstraintType,
    },
    constraints_status::ConstraintsStatus,
    load_constraint::{LoadActivityConstraint, LoadRouteConstraint},
    route_constraint::{
        HardRouteConstraint, HardRouteConstraintType, SoftRouteConstraint, SoftRouteConstraintType,
    },
    skill_constraint::SkillConstraint,
    time_window_constraint::TimeWindowActivityConstraint,
    vehicle_break_constraint::VehicleBreakConstraint,
};

/// Registered constraints, evaluated in registration order. Shared read-only by every
/// calculator and worker.
#[derive(Clone, Default)]
pub struct ConstraintManager {
    hard_route_constraints: Vec<HardRouteConstraintType>,
    hard_activity_constraints: Vec<HardActivityConstraintType>,
    soft_route_constraints: Vec<SoftRouteConstraintType>,
    soft_activity_constraints: Vec<SoftActivityConstraintType>,
}

impl ConstraintManager {
    /// Skills, vehicle-bound breaks, capacity and time windows.
    pub fn with_defaults() -> Self {
        let mut manager = ConstraintManager::default();
        manager
            .add_hard_route_constraint(HardRouteConstraintType::Skills(SkillConstraint))
            .add_hard_route_constraint(HardRouteConstraintType::VehicleBreak(
                VehicleBreakConstraint,
            ))
            .add_hard_route_constraint(HardRouteConstraintType::Load(LoadRouteConstraint))
            .add_hard_activity_constraint(HardActivityConstraintType::Load(LoadActivityConstraint))
            .add_hard_activity_constraint(HardActivityConstraintType::TimeWindow(
                TimeWindowActivityConstraint,
            ));
        manager
    }

    pub fn add_hard_route_constraint(&mut self, constraint: HardRouteConstraintType) -> &mut Self {
        self.hard_route_constraints.push(constraint);
        self
    }

    pub fn add_hard_activity_constraint(
        &mut self,
        constraint: HardActivityConstraintType,
    ) -> &mut Self {
        self.hard_activity_constraints.push(constraint);
        self
    }

    pub fn add_soft_route_constraint(&mut self, constraint: SoftRouteConstraintType) -> &mut Self {
        self.soft_route_constraints.push(constraint);
        self
    }

    pub fn add_soft_activity_constraint(
        &mut self,
        constraint: SoftActivityConstraintType,
    ) -> &mut Self {
        self.soft_activity_constraints.push(constraint);
        self
    }

    pub fn hard_route_fulfilled(&self, context: &JobInsertionContext) -> bool {
        for constraint in &self.hard_route_constraints {
            if !constraint.fulfilled(context) {
                trace!(
                    constraint = constraint.constraint_name(),
                    job = %context.job_id,
                    "route constraint not fulfilled"
                );
                return false;
            }
        }
        true
    }

    /// First non-fulfilled status wins, except that [`ConstraintsStatus::NotFulfilledBreak`]
    /// is returned as soon as any constraint reports it.
    pub fn hard_activity_fulfilled(
        &self,
        context: &JobInsertionContext,
        insertion: &ActivityInsertion,
    ) -> ConstraintsStatus {
        let mut status = ConstraintsStatus::Fulfilled;
        for constraint in &self.hard_activity_constraints {
            match constraint.fulfilled(context, insertion) {
                ConstraintsStatus::NotFulfilledBreak => {
                    return ConstraintsStatus::NotFulfilledBreak;
                }
                ConstraintsStatus::NotFulfilled => status = ConstraintsStatus::NotFulfilled,
                ConstraintsStatus::Fulfilled => {}
            }
        }
        status
    }

    pub fn soft_route_costs(&self, context: &JobInsertionContext) -> Cost {
        self.soft_route_constraints
            .iter()
            .map(|constraint| constraint.costs(context))
            .sum()
    }

    pub fn soft_activity_costs(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> Cost {
        self.soft_activity_constraints
            .iter()
            .map(|constraint| constraint.costs(context, insertion))
            .sum()
    }
}
