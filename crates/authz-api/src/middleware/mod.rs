pub mod auth;
pub mod request_id;
pub mod request_shape;
pub mod security_headers;

pub use auth::pipeline_middleware;
pub use request_id::{request_id_middleware, REQUEST_ID_HEADER};
pub use request_shape::request_shape_gate;
pub use security_headers::security_headers_middleware;
