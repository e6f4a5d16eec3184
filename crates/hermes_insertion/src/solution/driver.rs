use serde::Serialize;

/// Driver operating a route. Costs do not depend on it; it travels with insertion decisions
/// so a route keeps its driver across vehicle switches.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Driver {
    #[default]
    NoDriver,
    Assigned(usize),
}
