//! Users as the ledger sees them: their purchase and sales totals and the scammer flag.

mod core;
mod gate;
mod projection;
mod scammer_endpoint;
mod status_endpoint;

pub use core::{
    User, adjust_user_counters, count_users, create_user_table, find_user, get_user,
    update_scammer_flag, upsert_user,
};
pub use gate::{GateDecision, check_allowed, set_scammer_flag};
pub use projection::UserStatus;
pub use scammer_endpoint::set_scammer_flag_endpoint;
pub use status_endpoint::{get_gate_decision_endpoint, get_user_status_endpoint};
