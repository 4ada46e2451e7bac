pub mod assistant;
pub mod feedback;
pub mod health;
pub mod locale;
pub mod telemetry;

use serde::Serialize;
use utoipa::ToSchema;

/// Minimal acknowledgement body shared by the thin forwarding routes.
#[derive(Serialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}
