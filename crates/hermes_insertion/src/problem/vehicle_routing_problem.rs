use fxhash::{FxHashMap, FxHashSet};

use crate::{solution::activity::TourActivity, utils::enumerate_idx::EnumerateIdx};

use super::{
    job::{Job, JobIdx},
    location::{Location, LocationIdx},
    service::Service,
    shipment::Shipment,
    travel_cost_matrix::{Cost, Distance, Time, TravelMatrices},
    vehicle::{Vehicle, VehicleIdx, VehicleType, VehicleTypeBuilder, VehicleTypeIdx, VehicleTypeKey},
};

/// Vehicles sharing an end location, latest arrival and return flag propagate the same
/// latest start times backwards through a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndGroup {
    pub location_id: LocationIdx,
    pub latest_arrival: Time,
    pub return_to_depot: bool,
}

pub struct VehicleRoutingProblem {
    locations: Vec<Location>,
    travel_matrices: TravelMatrices,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    infinite_fleet: bool,
    vehicle_types: Vec<VehicleType>,
    end_groups: Vec<EndGroup>,
    initial_route_vehicles: FxHashSet<VehicleIdx>,
    has_shipments: bool,
}

impl VehicleRoutingProblem {
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, location_id: LocationIdx) -> &Location {
        &self.locations[location_id]
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    #[inline]
    pub fn job(&self, job_id: JobIdx) -> &Job {
        &self.jobs[job_id]
    }

    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn job_ids(&self) -> impl Iterator<Item = JobIdx> + '_ {
        self.jobs.iter().enumerate_idx().map(|(index, _)| index)
    }

    /// In an infinite fleet every vehicle is a template that can serve any number of routes.
    pub fn is_infinite_fleet(&self) -> bool {
        self.infinite_fleet
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    #[inline]
    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    pub fn vehicle_types(&self) -> &[VehicleType] {
        &self.vehicle_types
    }

    #[inline]
    pub fn vehicle_type(&self, vehicle_type: VehicleTypeIdx) -> &VehicleType {
        &self.vehicle_types[vehicle_type]
    }

    #[inline]
    pub fn vehicle_type_of(&self, vehicle_id: VehicleIdx) -> &VehicleType {
        self.vehicle_type(self.vehicle(vehicle_id).vehicle_type())
    }

    pub fn end_groups(&self) -> &[EndGroup] {
        &self.end_groups
    }

    pub fn is_initial_route_vehicle(&self, vehicle_id: VehicleIdx) -> bool {
        self.initial_route_vehicles.contains(&vehicle_id)
    }

    pub fn has_shipments(&self) -> bool {
        self.has_shipments
    }

    #[inline]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        self.travel_matrices.travel_distance(from, to)
    }

    #[inline]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> Time {
        self.travel_matrices.travel_time(from, to)
    }

    #[inline]
    pub fn transport_cost(&self, from: LocationIdx, to: LocationIdx, vehicle_id: VehicleIdx) -> Cost {
        let vehicle_type = self.vehicle_type_of(vehicle_id);
        self.travel_distance(from, to) * vehicle_type.cost_per_distance()
            + self.travel_time(from, to) * vehicle_type.cost_per_time()
    }

    /// Waiting before the window opens and the operation itself, priced by the vehicle type.
    #[inline]
    pub fn activity_cost(&self, activity: &TourActivity, arrival: Time, vehicle_id: VehicleIdx) -> Cost {
        let vehicle_type = self.vehicle_type_of(vehicle_id);
        let waiting = (activity.earliest_start() - arrival).max(0.0);
        waiting * vehicle_type.cost_per_waiting()
            + activity.operation_time() * vehicle_type.cost_per_service()
    }

    /// Upper bound of a single transport cost, used to scale noise.
    pub fn max_cost(&self) -> Cost {
        self.travel_matrices.max_distance()
    }
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    locations: Option<Vec<Location>>,
    travel_matrices: Option<TravelMatrices>,
    services: Vec<Service>,
    shipments: Vec<Shipment>,
    vehicle_types: Vec<VehicleType>,
    vehicles: Vec<Vehicle>,
    infinite_fleet: bool,
    penalty_factor: Option<f64>,
    initial_route_vehicles: Vec<VehicleIdx>,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut VehicleRoutingProblemBuilder {
        self.locations = Some(locations);
        self
    }

    pub fn set_travel_matrices(
        &mut self,
        travel_matrices: TravelMatrices,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.travel_matrices = Some(travel_matrices);
        self
    }

    pub fn set_services(&mut self, services: Vec<Service>) -> &mut VehicleRoutingProblemBuilder {
        self.services = services;
        self
    }

    pub fn set_shipments(&mut self, shipments: Vec<Shipment>) -> &mut VehicleRoutingProblemBuilder {
        self.shipments = shipments;
        self
    }

    pub fn set_vehicle_types(
        &mut self,
        vehicle_types: Vec<VehicleType>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.vehicle_types = vehicle_types;
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut VehicleRoutingProblemBuilder {
        self.vehicles = vehicles;
        self
    }

    pub fn set_infinite_fleet(&mut self, infinite_fleet: bool) -> &mut VehicleRoutingProblemBuilder {
        self.infinite_fleet = infinite_fleet;
        self
    }

    /// Adds one penalty vehicle per real vehicle, priced with the type costs times `factor`.
    pub fn set_penalty_vehicles(&mut self, factor: f64) -> &mut VehicleRoutingProblemBuilder {
        self.penalty_factor = Some(factor);
        self
    }

    /// Vehicles already committed to a route; they are never swapped for another vehicle.
    pub fn set_initial_route_vehicles(
        &mut self,
        vehicles: Vec<usize>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.initial_route_vehicles = vehicles.into_iter().map(VehicleIdx::new).collect();
        self
    }

    pub fn build(self) -> VehicleRoutingProblem {
        let locations = self.locations.expect("Expected locations");
        let travel_matrices = self
            .travel_matrices
            .unwrap_or_else(|| TravelMatrices::from_euclidean(&locations, false));

        let has_shipments = !self.shipments.is_empty();
        let mut jobs: Vec<Job> = self.services.into_iter().map(Job::from).collect();
        jobs.extend(self.shipments.into_iter().map(Job::from));

        let mut vehicle_types = self.vehicle_types;
        if vehicle_types.is_empty() {
            vehicle_types.push(VehicleTypeBuilder::default().build());
        }

        let mut vehicles = self.vehicles;
        for (vehicle_id, vehicle) in vehicles.iter_mut().enumerate_idx() {
            if let Some(mut vehicle_break) = vehicle.take_break() {
                vehicle_break.set_vehicle_id(vehicle_id);
                vehicle.set_break_job(JobIdx::new(jobs.len()));
                jobs.push(Job::Break(vehicle_break));
            }
        }

        if let Some(factor) = self.penalty_factor {
            let real_types = vehicle_types.len();
            for index in 0..real_types {
                let penalty_type = vehicle_types[index].to_penalty_type(factor);
                vehicle_types.push(penalty_type);
            }

            let penalty_vehicles: Vec<Vehicle> = vehicles
                .iter()
                .map(|vehicle| {
                    vehicle.to_penalty_vehicle(VehicleTypeIdx::new(
                        vehicle.vehicle_type().get() + real_types,
                    ))
                })
                .collect();
            vehicles.extend(penalty_vehicles);
        }

        let mut type_keys: FxHashMap<(usize, usize, usize, u64, u64, bool, Vec<String>), usize> =
            FxHashMap::default();
        let mut end_groups: Vec<EndGroup> = Vec::new();
        for vehicle in vehicles.iter_mut() {
            let mut skills: Vec<String> = vehicle
                .skills()
                .iter()
                .map(|skill| skill.name().to_owned())
                .collect();
            skills.sort_unstable();

            let key = (
                vehicle.vehicle_type().get(),
                vehicle.start_location_id().get(),
                vehicle.end_location_id().get(),
                vehicle.earliest_departure().to_bits(),
                vehicle.latest_arrival().to_bits(),
                vehicle.return_to_depot(),
                skills,
            );
            let next_key = type_keys.len();
            let type_key = *type_keys.entry(key).or_insert(next_key);
            vehicle.set_type_key(VehicleTypeKey::new(type_key));

            let end_group = EndGroup {
                location_id: vehicle.end_location_id(),
                latest_arrival: vehicle.latest_arrival(),
                return_to_depot: vehicle.return_to_depot(),
            };
            let group = match end_groups.iter().position(|group| *group == end_group) {
                Some(group) => group,
                None => {
                    end_groups.push(end_group);
                    end_groups.len() - 1
                }
            };
            vehicle.set_end_group(group);
        }

        VehicleRoutingProblem {
            locations,
            travel_matrices,
            jobs,
            vehicles,
            infinite_fleet: self.infinite_fleet,
            vehicle_types,
            end_groups,
            initial_route_vehicles: self.initial_route_vehicles.into_iter().collect(),
            has_shipments,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{time_window::TimeWindow, vehicle::VehicleBuilder, vehicle_break::VehicleBreak},
        test_utils::{create_basic_services, create_basic_vehicles, create_locations},
    };

    use super::*;

    #[test]
    fn test_breaks_become_jobs_bound_to_their_vehicle() {
        let locations = create_locations(vec![(0.0, 0.0), (1.0, 0.0)]);
        let mut vehicle = VehicleBuilder::default();
        vehicle
            .set_vehicle_id(String::from("v"))
            .set_start_location_id(0)
            .set_break(VehicleBreak::new(
                String::from("break"),
                TimeWindow::new(10.0, 15.0),
                2.0,
            ));

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_locations(locations)
            .set_services(create_basic_services(vec![1]))
            .set_vehicles(vec![vehicle.build()]);
        let problem = builder.build();

        assert_eq!(problem.num_jobs(), 2);
        let break_job = problem.vehicle(VehicleIdx::new(0)).break_job();
        assert_eq!(break_job, Some(JobIdx::new(1)));
        let vehicle_break = problem.job(JobIdx::new(1)).as_break().unwrap();
        assert_eq!(vehicle_break.vehicle_id(), VehicleIdx::new(0));
        assert!(problem.job(JobIdx::new(1)).demand().is_empty());
    }

    #[test]
    fn test_identical_vehicles_share_type_key() {
        let locations = create_locations(vec![(0.0, 0.0), (1.0, 0.0)]);
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_locations(locations)
            .set_vehicles(create_basic_vehicles(vec![0, 0, 1]));
        let problem = builder.build();

        let keys: Vec<_> = problem.vehicles().iter().map(|v| v.type_key()).collect();
        assert_eq!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_eq!(problem.end_groups().len(), 2);
        assert!(!problem.is_infinite_fleet());
    }

    #[test]
    fn test_penalty_vehicles() {
        let locations = create_locations(vec![(0.0, 0.0), (1.0, 0.0)]);
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_locations(locations)
            .set_vehicles(create_basic_vehicles(vec![0]))
            .set_penalty_vehicles(4.0);
        let problem = builder.build();

        assert_eq!(problem.vehicles().len(), 2);
        let penalty = VehicleIdx::new(1);
        assert!(problem.vehicle_type_of(penalty).is_penalty());
        assert_eq!(
            problem.transport_cost(LocationIdx::new(0), LocationIdx::new(1), penalty),
            4.0
        );
        assert_ne!(
            problem.vehicle(penalty).type_key(),
            problem.vehicle(VehicleIdx::new(0)).type_key()
        );
    }
}
