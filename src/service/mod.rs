pub mod commission_service;
pub mod distribution_service;
pub mod error;
pub mod setting_service;
pub mod withdrawal_service;
