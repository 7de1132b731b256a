pub mod commission;
pub mod distribution;
pub mod setting;
pub mod withdrawal;
