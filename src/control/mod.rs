pub mod assembly;
pub mod environment;
pub mod fuel_management;
pub mod guidance;
pub mod host;
pub mod mission;
pub mod pilot;
pub mod propulsion;
pub mod rocket;
pub mod scheduler;
