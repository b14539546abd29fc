//! SMO solver components
//!
//! The solver owns one [`AlphaStore`] and one [`ErrorCache`] per training
//! run. [`PairSelector`] finds KKT violators and partners for them,
//! [`AlphaPairUpdater`] moves each pair, and [`SMOSolver`] alternates full
//! and non-bound sweeps until convergence.

pub mod alpha_store;
pub mod error_cache;
pub mod selector;
pub mod smo;
pub mod state;
pub mod updater;

pub use self::alpha_store::*;
pub use self::error_cache::*;
pub use self::selector::*;
pub use self::smo::*;
pub use self::state::*;
pub use self::updater::*;
