pub mod document_store;
pub mod payment_gateway;
