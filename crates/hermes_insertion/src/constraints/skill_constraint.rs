use crate::insertion::insertion_context::JobInsertionContext;

use super::route_constraint::HardRouteConstraint;

/// The candidate vehicle must carry every skill of the job and, when it replaces the route's
/// vehicle, every skill of the jobs already on the route.
#[derive(Debug, Clone, Default)]
pub struct SkillConstraint;

impl HardRouteConstraint for SkillConstraint {
    fn constraint_name(&self) -> &'static str {
        "skills"
    }

    fn fulfilled(&self, context: &JobInsertionContext) -> bool {
        let vehicle = context.vehicle();
        if !vehicle.is_compatible_with(context.job()) {
            return false;
        }

        if !context.is_vehicle_switch() {
            return true;
        }

        context
            .route
            .job_ids()
            .into_iter()
            .all(|job_id| vehicle.is_compatible_with(context.problem.job(job_id)))
    }
}
