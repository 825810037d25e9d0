pub mod dry_run;
pub mod simulated;

pub use dry_run::DryRunAdapter;
pub use simulated::SimulatedAdapter;
