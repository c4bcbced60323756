pub mod assessment;
pub mod core;
pub mod items;
pub mod nav;
pub mod outcomes;
pub mod papers;
pub mod plan;
pub mod setup;
