use std::sync::Arc;

use rand::rngs::SmallRng;

use crate::{
    constraints::constraint_manager::ConstraintManager,
    fleet_manager::{FleetLockingListener, FleetManager, create_fleet_manager},
    insertion::{
        calculator_builder::CalculatorBuilder,
        vehicle_type_dependent::VehicleTypeDependentCalculator,
    },
    problem::{
        amount::Amount,
        job::JobIdx,
        location::Location,
        service::{Service, ServiceBuilder},
        shipment::{Shipment, ShipmentBuilder, ShipmentStop},
        time_window::TimeWindow,
        vehicle::{Vehicle, VehicleBuilder, VehicleIdx, VehicleTypeBuilder},
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    recreate::{inserter::Inserter, listeners::InsertionListeners, recreate_context::RecreateContext},
    solution::{activity::create_activities, route::VehicleRoute},
    state::state_updater::StateUpdater,
};

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

pub fn create_location_grid(rows: usize, cols: usize) -> Vec<Location> {
    let mut locations = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            let location = Location::from_cartesian(x as f64, y as f64);
            locations.push(location);
        }
    }

    locations
}

pub fn create_locations(locations: Vec<(f64, f64)>) -> Vec<Location> {
    locations
        .iter()
        .map(|&(x, y)| Location::from_cartesian(x, y))
        .collect()
}

pub fn create_basic_services(location_ids: Vec<usize>) -> Vec<Service> {
    location_ids
        .iter()
        .enumerate()
        .map(|(index, &location_id)| {
            let mut builder = ServiceBuilder::default();

            builder.set_location_id(location_id);
            builder.set_external_id(index.to_string());
            builder.build()
        })
        .collect()
}

pub fn create_service(
    external_id: &str,
    location_id: usize,
    demand: f64,
    time_window: TimeWindow,
) -> Service {
    let mut builder = ServiceBuilder::default();
    builder
        .set_external_id(external_id.to_owned())
        .set_location_id(location_id)
        .set_demand(Amount::from_vec(vec![demand]))
        .set_time_window(time_window);
    builder.build()
}

pub fn create_basic_vehicles(location_ids: Vec<usize>) -> Vec<Vehicle> {
    location_ids
        .iter()
        .enumerate()
        .map(|(index, &location_id)| {
            let mut builder = VehicleBuilder::default();
            builder.set_start_location_id(location_id);
            builder.set_vehicle_id(index.to_string());
            builder.build()
        })
        .collect()
}

pub fn create_test_problem(
    locations: Vec<Location>,
    services: Vec<Service>,
    vehicles: Vec<Vehicle>,
) -> VehicleRoutingProblem {
    let mut builder = VehicleRoutingProblemBuilder::default();

    builder.set_services(services);
    builder.set_locations(locations);
    builder.set_vehicles(vehicles);

    builder.build()
}

pub fn create_shipment(external_id: &str, pickup: usize, delivery: usize, demand: f64) -> Shipment {
    let mut builder = ShipmentBuilder::default();
    builder
        .set_external_id(external_id.to_owned())
        .set_pickup(ShipmentStop::new(pickup, TimeWindow::default(), 0.0))
        .set_delivery(ShipmentStop::new(delivery, TimeWindow::default(), 0.0))
        .set_demand(Amount::from_vec(vec![demand]));
    builder.build()
}

/// Five locations on a line, one vehicle with capacity 10 at location 0.
pub fn create_test_problem_with_shipments(shipments: Vec<Shipment>) -> VehicleRoutingProblem {
    let mut vehicle_type = VehicleTypeBuilder::default();
    vehicle_type.set_capacity(Amount::from_vec(vec![10.0]));

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_locations(create_locations(vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (3.0, 0.0),
            (4.0, 0.0),
        ]))
        .set_shipments(shipments)
        .set_vehicle_types(vec![vehicle_type.build()])
        .set_vehicles(create_basic_vehicles(vec![0]));

    builder.build()
}

/// Route served by `vehicle_id` visiting the activities of `job_ids` in order, with
/// schedule and states up to date.
pub fn create_route_with_services(
    problem: &VehicleRoutingProblem,
    vehicle_id: usize,
    job_ids: Vec<usize>,
) -> VehicleRoute {
    let vehicle_id = VehicleIdx::new(vehicle_id);
    let departure_time = problem.vehicle(vehicle_id).earliest_departure();
    let mut route = VehicleRoute::new(problem, vehicle_id, departure_time);

    for job_id in job_ids {
        for activity in create_activities(problem, JobIdx::new(job_id)) {
            route.insert_activity(route.len(), activity);
        }
    }

    route.set_vehicle(problem, vehicle_id, departure_time);
    StateUpdater::update_route(problem, &mut route);
    route
}

/// Depot at (10, 10) and four unit-demand services around it; vehicles have capacity 2 and
/// a fixed cost of 100.
pub fn create_scenario_a_problem(infinite_fleet: bool) -> Arc<VehicleRoutingProblem> {
    let mut vehicle_type = VehicleTypeBuilder::default();
    vehicle_type
        .set_capacity(Amount::from_vec(vec![2.0]))
        .set_fixed_cost(100.0);

    let services = [1, 2, 3, 4]
        .into_iter()
        .map(|location_id| {
            create_service(
                &format!("s{location_id}"),
                location_id,
                1.0,
                TimeWindow::default(),
            )
        })
        .collect();

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .set_locations(create_locations(vec![
            (10.0, 10.0),
            (5.0, 7.0),
            (5.0, 13.0),
            (15.0, 7.0),
            (15.0, 13.0),
        ]))
        .set_services(services)
        .set_vehicle_types(vec![vehicle_type.build()])
        .set_vehicles(create_basic_vehicles(vec![0]))
        .set_infinite_fleet(infinite_fleet);

    Arc::new(builder.build())
}

/// Loads within capacity and every activity started inside its time window.
pub fn assert_route_feasible(problem: &VehicleRoutingProblem, route: &VehicleRoute) {
    let Some(vehicle_id) = route.vehicle_id() else {
        assert!(route.is_empty());
        return;
    };
    let capacity = problem.vehicle_type_of(vehicle_id).capacity();
    let states = route.states();

    assert!(states.load_at_beginning().fits_in(capacity));
    for (index, activity) in route.activities().iter().enumerate() {
        assert!(
            activity.arrival_time() <= activity.latest_start() + 1e-9,
            "activity {index} starts too late"
        );
        assert!(
            states.load_at(index + 1).fits_in(capacity),
            "capacity exceeded after activity {index}"
        );
    }
}

/// Calculator chain, fleet manager and inserter wired the way the strategy facade wires them.
pub struct RecreateFixture {
    pub problem: Arc<VehicleRoutingProblem>,
    pub fleet_manager: Arc<dyn FleetManager>,
    pub calculator: VehicleTypeDependentCalculator,
    pub inserter: Inserter,
}

impl RecreateFixture {
    pub fn new(problem: Arc<VehicleRoutingProblem>) -> Self {
        RecreateFixture::build(problem, None)
    }

    pub fn with_fixed_costs(problem: Arc<VehicleRoutingProblem>) -> Self {
        RecreateFixture::build(problem, Some(0.5))
    }

    fn build(problem: Arc<VehicleRoutingProblem>, fixed_cost_weight: Option<f64>) -> Self {
        let fleet_manager = create_fleet_manager(&problem);

        let mut builder = CalculatorBuilder::default();
        builder
            .set_problem(Arc::clone(&problem))
            .set_constraints(Arc::new(ConstraintManager::with_defaults()))
            .set_fleet_manager(Arc::clone(&fleet_manager));
        if let Some(weight) = fixed_cost_weight {
            builder.consider_fixed_costs(weight);
        }
        let calculator = builder.build().unwrap();

        let mut listeners = InsertionListeners::default();
        listeners.add(Arc::new(StateUpdater::new(Arc::clone(&problem))));
        listeners.add(Arc::new(FleetLockingListener::new(Arc::clone(&fleet_manager))));
        let inserter = Inserter::new(Arc::clone(&problem), listeners);

        RecreateFixture {
            problem,
            fleet_manager,
            calculator,
            inserter,
        }
    }

    pub fn context<'a>(
        &'a self,
        rng: &'a mut SmallRng,
        thread_pool: Option<&'a rayon::ThreadPool>,
    ) -> RecreateContext<'a> {
        RecreateContext {
            problem: &self.problem,
            calculator: &self.calculator,
            inserter: &self.inserter,
            rng,
            noise_generator: None,
            thread_pool,
            cancellation: None,
        }
    }
}
