pub mod payment;
pub mod payment_status;
pub mod team;
