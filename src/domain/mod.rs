// Domain layer: entity rows, submitted forms and ports (interfaces).

pub mod forms;
pub mod model;
pub mod ports;
