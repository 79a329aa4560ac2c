mod call_status;
mod health;
mod job_status;
mod webhook;

pub use call_status::call_status_handler;
pub use health::health_handler;
pub use job_status::job_status_handler;
pub use webhook::{webhook_handler, WEBHOOK_SECRET_HEADER};

use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
