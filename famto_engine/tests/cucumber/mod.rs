mod famto_world;
mod setups;
mod steps;

pub use famto_world::FamtoWorld;
