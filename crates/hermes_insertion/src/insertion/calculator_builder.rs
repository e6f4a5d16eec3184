use std::sync::Arc;

use tracing::debug;

use crate::{
    constraints::constraint_manager::ConstraintManager,
    error::InsertionError,
    fleet_manager::FleetManager,
    params::InsertionLevel,
    problem::vehicle_routing_problem::VehicleRoutingProblem,
};

use super::{
    activity_insertion_costs::{ActivityInsertionCosts, LocalActivityInsertionCosts},
    break_insertion::BreakInsertionCalculator,
    calculator_switcher::JobCalculatorSwitcher,
    fix_costs::FixCostsCalculator,
    job_insertion_calculator::JobInsertionCostsCalculator,
    penalty_vehicle::PenaltyVehicleCalculator,
    route_level_insertion::RouteLevelServiceInsertionCalculator,
    service_insertion::ServiceInsertionCalculator,
    shipment_insertion::ShipmentInsertionCalculator,
    vehicle_type_dependent::VehicleTypeDependentCalculator,
};

/// Assembles the calculator chain used by the construction strategies: per-kind
/// calculators, penalty vehicles, optional fixed costs and finally vehicle selection.
#[derive(Default)]
pub struct CalculatorBuilder {
    problem: Option<Arc<VehicleRoutingProblem>>,
    constraints: Option<Arc<ConstraintManager>>,
    fleet_manager: Option<Arc<dyn FleetManager>>,
    level: InsertionLevel,
    activity_cost_weight: Option<f64>,
    fixed_cost_weight: Option<f64>,
    allow_vehicle_switch: Option<bool>,
}

impl CalculatorBuilder {
    pub fn set_problem(&mut self, problem: Arc<VehicleRoutingProblem>) -> &mut CalculatorBuilder {
        self.problem = Some(problem);
        self
    }

    pub fn set_constraints(&mut self, constraints: Arc<ConstraintManager>) -> &mut CalculatorBuilder {
        self.constraints = Some(constraints);
        self
    }

    pub fn set_fleet_manager(&mut self, fleet_manager: Arc<dyn FleetManager>) -> &mut CalculatorBuilder {
        self.fleet_manager = Some(fleet_manager);
        self
    }

    pub fn set_level(&mut self, level: InsertionLevel) -> &mut CalculatorBuilder {
        self.level = level;
        self
    }

    pub fn set_activity_cost_weight(&mut self, weight: f64) -> &mut CalculatorBuilder {
        self.activity_cost_weight = Some(weight);
        self
    }

    pub fn consider_fixed_costs(&mut self, weight: f64) -> &mut CalculatorBuilder {
        self.fixed_cost_weight = Some(weight);
        self
    }

    pub fn set_allow_vehicle_switch(&mut self, allow_vehicle_switch: bool) -> &mut CalculatorBuilder {
        self.allow_vehicle_switch = Some(allow_vehicle_switch);
        self
    }

    pub fn build(self) -> Result<VehicleTypeDependentCalculator, InsertionError> {
        let problem = self
            .problem
            .ok_or(InsertionError::MissingConfiguration("problem"))?;
        let constraints = self
            .constraints
            .ok_or(InsertionError::MissingConfiguration("constraint manager"))?;
        let fleet_manager = self
            .fleet_manager
            .ok_or(InsertionError::MissingConfiguration("fleet manager"))?;

        let local_costs = LocalActivityInsertionCosts::new(self.activity_cost_weight.unwrap_or(1.0));
        let service: Arc<dyn JobInsertionCostsCalculator> = match self.level {
            InsertionLevel::Local => Arc::new(ServiceInsertionCalculator::new(
                Arc::clone(&problem),
                Arc::clone(&constraints),
                ActivityInsertionCosts::Local(local_costs.clone()),
            )),
            InsertionLevel::RouteLevel {
                forward_looking,
                memory,
            } => {
                if problem.has_shipments() {
                    return Err(InsertionError::RouteLevelWithShipments);
                }
                Arc::new(RouteLevelServiceInsertionCalculator::new(
                    Arc::clone(&problem),
                    Arc::clone(&constraints),
                    forward_looking,
                    memory,
                ))
            }
        };
        let shipment = Arc::new(ShipmentInsertionCalculator::new(
            Arc::clone(&problem),
            Arc::clone(&constraints),
            ActivityInsertionCosts::Local(local_costs.clone()),
        ));
        let vehicle_break = Arc::new(BreakInsertionCalculator::new(
            Arc::clone(&problem),
            Arc::clone(&constraints),
            ActivityInsertionCosts::Local(local_costs),
        ));

        let switcher = JobCalculatorSwitcher::new(Arc::clone(&problem), service, shipment, vehicle_break);
        let mut calculator: Box<dyn JobInsertionCostsCalculator> = Box::new(
            PenaltyVehicleCalculator::new(Arc::clone(&problem), Box::new(switcher)),
        );
        if let Some(weight) = self.fixed_cost_weight {
            calculator = Box::new(FixCostsCalculator::new(Arc::clone(&problem), calculator, weight));
        }

        debug!(level = ?self.level, fixed_costs = self.fixed_cost_weight.is_some(), "built insertion calculator");

        Ok(VehicleTypeDependentCalculator::new(
            problem,
            fleet_manager,
            calculator,
            self.allow_vehicle_switch.unwrap_or(true),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        fleet_manager::create_fleet_manager,
        test_utils::{create_shipment, create_test_problem_with_shipments},
    };

    use super::*;

    #[test]
    fn test_missing_collaborators_are_reported() {
        let result = CalculatorBuilder::default().build();
        assert!(matches!(
            result,
            Err(InsertionError::MissingConfiguration("problem"))
        ));
    }

    #[test]
    fn test_route_level_rejects_shipments() {
        let problem = Arc::new(create_test_problem_with_shipments(vec![create_shipment(
            "s", 1, 2, 1.0,
        )]));

        let mut builder = CalculatorBuilder::default();
        builder
            .set_fleet_manager(create_fleet_manager(&problem))
            .set_problem(problem)
            .set_constraints(Arc::new(ConstraintManager::with_defaults()))
            .set_level(InsertionLevel::RouteLevel {
                forward_looking: 3,
                memory: 2,
            });

        assert!(matches!(
            builder.build(),
            Err(InsertionError::RouteLevelWithShipments)
        ));
    }
}
