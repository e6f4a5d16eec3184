use crate::{
    problem::{
        travel_cost_matrix::{Cost, Time},
        vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::activity::TourActivity,
};

/// Exact transport and activity cost of driving `path` with a given vehicle.
pub struct AuxiliaryPathCost<'a> {
    problem: &'a VehicleRoutingProblem,
}

impl<'a> AuxiliaryPathCost<'a> {
    pub fn new(problem: &'a VehicleRoutingProblem) -> Self {
        AuxiliaryPathCost { problem }
    }

    /// Cost of visiting `path` in order, leaving its first activity at `departure_time`.
    /// The end of a vehicle that does not return to its depot is free.
    pub fn cost_of_path(&self, path: &[&TourActivity], departure_time: Time, vehicle_id: VehicleIdx) -> Cost {
        let Some((first, rest)) = path.split_first() else {
            return 0.0;
        };
        let return_to_depot = self.problem.vehicle(vehicle_id).return_to_depot();

        let mut previous = *first;
        let mut time = departure_time;
        let mut cost = 0.0;
        for &activity in rest {
            if activity.is_end() && !return_to_depot {
                break;
            }

            let arrival = time + self.problem.travel_time(previous.location_id(), activity.location_id());
            cost += self
                .problem
                .transport_cost(previous.location_id(), activity.location_id(), vehicle_id)
                + self.problem.activity_cost(activity, arrival, vehicle_id);
            time = activity.departure_after(arrival);
            previous = activity;
        }

        cost
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{
            job::JobIdx,
            time_window::TimeWindow,
            vehicle::{VehicleBuilder, VehicleTypeBuilder},
            vehicle_routing_problem::VehicleRoutingProblemBuilder,
        },
        solution::activity::{ActivityType, create_activities},
        test_utils::{create_basic_vehicles, create_locations, create_service},
    };

    use super::*;

    #[test]
    fn test_cost_of_path_includes_waiting() {
        let mut vehicle_type = VehicleTypeBuilder::default();
        vehicle_type.set_cost_per_waiting(2.0);

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_locations(create_locations(vec![(0.0, 0.0), (3.0, 4.0)]))
            .set_services(vec![create_service("s", 1, 0.0, TimeWindow::new(8.0, 20.0))])
            .set_vehicle_types(vec![vehicle_type.build()])
            .set_vehicles(create_basic_vehicles(vec![0]));
        let problem = builder.build();

        let vehicle = problem.vehicle(VehicleIdx::new(0));
        let start = TourActivity::start(vehicle, 0.0);
        let end = TourActivity::end(vehicle);
        let service = create_activities(&problem, JobIdx::new(0)).remove(0);
        assert_eq!(service.activity_type(), ActivityType::Service(JobIdx::new(0)));

        let cost = AuxiliaryPathCost::new(&problem).cost_of_path(
            &[&start, &service, &end],
            0.0,
            VehicleIdx::new(0),
        );

        // 5 + 5 travelled, 3 time units waited at 2 each
        assert_eq!(cost, 16.0);
    }

    #[test]
    fn test_open_route_end_is_free() {
        let mut vehicle = VehicleBuilder::default();
        vehicle
            .set_vehicle_id(String::from("open"))
            .set_start_location_id(0)
            .set_return_to_depot(false);

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_locations(create_locations(vec![(0.0, 0.0), (3.0, 4.0)]))
            .set_services(vec![create_service("s", 1, 0.0, TimeWindow::default())])
            .set_vehicles(vec![vehicle.build()]);
        let problem = builder.build();

        let vehicle = problem.vehicle(VehicleIdx::new(0));
        let start = TourActivity::start(vehicle, 0.0);
        let end = TourActivity::end(vehicle);
        let service = create_activities(&problem, JobIdx::new(0)).remove(0);

        let cost = AuxiliaryPathCost::new(&problem).cost_of_path(
            &[&start, &service, &end],
            0.0,
            VehicleIdx::new(0),
        );
        assert_eq!(cost, 5.0);
    }
}
