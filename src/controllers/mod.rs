pub mod consolidation_controller;
pub mod order_controller;
