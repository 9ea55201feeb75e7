pub mod error;
pub mod payment_service;
pub mod validator;

pub use error::ApiError;
pub use payment_service::{new_payment_service, PaymentService};
