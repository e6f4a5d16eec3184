use std::sync::Arc;

use crate::{insertion::insertion_context::JobInsertionContext, problem::travel_cost_matrix::Cost};

use super::{
    load_constraint::LoadRouteConstraint, skill_constraint::SkillConstraint,
    vehicle_break_constraint::VehicleBreakConstraint,
    vehicle_switch_constraint::VehicleSwitchCostConstraint,
};

/// Route-level feasibility, checked once per route and vehicle before any position is scanned.
pub trait HardRouteConstraint: Send + Sync {
    fn constraint_name(&self) -> &'static str;

    fn fulfilled(&self, context: &JobInsertionContext) -> bool;
}

pub trait SoftRouteConstraint: Send + Sync {
    fn constraint_name(&self) -> &'static str;

    fn costs(&self, context: &JobInsertionContext) -> Cost;
}

#[derive(Clone)]
pub enum HardRouteConstraintType {
    Load(LoadRouteConstraint),
    Skills(SkillConstraint),
    VehicleBreak(VehicleBreakConstraint),
    Custom(Arc<dyn HardRouteConstraint>),
}

impl HardRouteConstraint for HardRouteConstraintType {
    fn constraint_name(&self) -> &'static str {
        match self {
            HardRouteConstraintType::Load(c) => c.constraint_name(),
            HardRouteConstraintType::Skills(c) => c.constraint_name(),
            HardRouteConstraintType::VehicleBreak(c) => c.constraint_name(),
            HardRouteConstraintType::Custom(c) => c.constraint_name(),
        }
    }

    fn fulfilled(&self, context: &JobInsertionContext) -> bool {
        match self {
            HardRouteConstraintType::Load(c) => c.fulfilled(context),
            HardRouteConstraintType::Skills(c) => c.fulfilled(context),
            HardRouteConstraintType::VehicleBreak(c) => c.fulfilled(context),
            HardRouteConstraintType::Custom(c) => c.fulfilled(context),
        }
    }
}

#[derive(Clone)]
pub enum SoftRouteConstraintType {
    VehicleSwitch(VehicleSwitchCostConstraint),
    Custom(Arc<dyn SoftRouteConstraint>),
}

impl SoftRouteConstraint for SoftRouteConstraintType {
    fn constraint_name(&self) -> &'static str {
        match self {
            SoftRouteConstraintType::VehicleSwitch(c) => c.constraint_name(),
            SoftRouteConstraintType::Custom(c) => c.constraint_name(),
        }
    }

    fn costs(&self, context: &JobInsertionContext) -> Cost {
        match self {
            SoftRouteConstraintType::VehicleSwitch(c) => c.costs(context),
            SoftRouteConstraintType::Custom(c) => c.costs(context),
        }
    }
}
