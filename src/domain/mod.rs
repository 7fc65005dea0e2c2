// Domain layer: source tables, models and the fetcher port.

pub mod model;
pub mod ports;
pub mod sources;
