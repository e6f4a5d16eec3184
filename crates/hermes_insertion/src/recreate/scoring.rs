use crate::{
    insertion::insertion_data::InsertionData,
    params::ScoringParams,
    problem::{
        job::{Job, JobIdx},
        location::LocationIdx,
        travel_cost_matrix::Cost,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
};

/// Extra regret score of a job given its best insertion.
pub trait ScoringFunction: Send + Sync {
    fn score(&self, problem: &VehicleRoutingProblem, best: &InsertionData, job_id: JobIdx) -> f64;
}

/// Favours jobs with narrow time windows and jobs far away from the depots of the vehicle
/// of their best insertion.
#[derive(Debug, Clone)]
pub struct DefaultScorer {
    params: ScoringParams,
}

impl DefaultScorer {
    pub fn new(params: ScoringParams) -> Self {
        DefaultScorer { params }
    }

    fn window_score(&self, width: f64) -> f64 {
        (self.params.time_window_param * width).max(self.params.min_time_window_score)
    }
}

impl Default for DefaultScorer {
    fn default() -> Self {
        DefaultScorer::new(ScoringParams::default())
    }
}

impl ScoringFunction for DefaultScorer {
    fn score(&self, problem: &VehicleRoutingProblem, best: &InsertionData, job_id: JobIdx) -> f64 {
        let Some(vehicle_id) = best.vehicle_id else {
            return 0.0;
        };
        let vehicle = problem.vehicle(vehicle_id);
        let depot_distance = |location: LocationIdx| -> Cost {
            problem
                .travel_distance(vehicle.start_location_id(), location)
                .max(problem.travel_distance(vehicle.end_location_id(), location))
        };

        match problem.job(job_id) {
            Job::Service(service) | Job::Pickup(service) | Job::Delivery(service) => {
                self.window_score(service.time_window().width())
                    + self.params.depot_distance_param * depot_distance(service.location_id())
            }
            Job::Shipment(shipment) => {
                let max_depot_distance = depot_distance(shipment.pickup().location_id())
                    .max(depot_distance(shipment.delivery().location_id()));
                let min_width = shipment
                    .pickup()
                    .time_window()
                    .width()
                    .min(shipment.delivery().time_window().width());

                self.window_score(min_width) + self.params.depot_distance_param * max_depot_distance
            }
            Job::Break(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{time_window::TimeWindow, vehicle::VehicleIdx},
        solution::driver::Driver,
        test_utils::{
            assert_close, create_basic_vehicles, create_locations, create_service,
            create_test_problem,
        },
    };

    use super::*;

    #[test]
    fn test_narrow_windows_and_far_jobs_score_higher() {
        let problem = create_test_problem(
            create_locations(vec![(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]),
            vec![
                create_service("near_wide", 1, 0.0, TimeWindow::default()),
                create_service("near_narrow", 1, 0.0, TimeWindow::new(0.0, 10.0)),
                create_service("far_wide", 2, 0.0, TimeWindow::default()),
            ],
            create_basic_vehicles(vec![0]),
        );
        let scorer = DefaultScorer::default();
        let best = InsertionData::new(1.0, None, Some(0), VehicleIdx::new(0), Driver::NoDriver, 0.0);

        let near_wide = scorer.score(&problem, &best, JobIdx::new(0));
        let near_narrow = scorer.score(&problem, &best, JobIdx::new(1));
        let far_wide = scorer.score(&problem, &best, JobIdx::new(2));

        assert_close(near_wide, -100000.0 + 1.0);
        assert_close(near_narrow, -5.0 + 1.0);
        assert!(far_wide > near_wide);
    }
}
