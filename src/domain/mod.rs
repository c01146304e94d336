// Domain layer: bill model and the ports the façade depends on.

pub mod model;
pub mod ports;
