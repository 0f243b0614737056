pub mod fee_model;
pub mod simulation;
pub mod sweep;
pub mod service;
