mod cafe_world;
mod setups;
mod steps;

pub use cafe_world::CafeWorld;
