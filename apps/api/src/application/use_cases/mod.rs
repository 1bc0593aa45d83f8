pub mod checkout;
pub mod projection;
pub mod seats;
pub mod subscription_resolver;
pub mod teams;
pub mod webhook;
