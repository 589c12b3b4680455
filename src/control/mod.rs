//! Closed-loop auto-driller controller

mod auto_driller;

pub use auto_driller::{
    run_controller, AutoDriller, ControllerRun, NominalSetpoints, StateDistribution,
};
