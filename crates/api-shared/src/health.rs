use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the health endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service shared by every API surface.
///
/// This service provides a standardised way to check that the fEMR report service is up.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "fEMR reports are alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_serialises_as_flat_json() {
        let json = serde_json::to_value(HealthService::check_health()).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["message"], "fEMR reports are alive");
    }
}
