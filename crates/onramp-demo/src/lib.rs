/*
[INPUT]:  Public API exports for onramp-demo crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod flow;

// Re-export main types for convenience
pub use config::DemoConfig;
pub use flow::{
    CheckoutLink, FlowOutcome, build_observer, create_checkout, run_checkout_flow, watch_status,
};
