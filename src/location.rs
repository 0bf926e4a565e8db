// Source of the user's position for geo messages

use async_trait::async_trait;

use crate::error::{ClientError, ClientResult};
use crate::models::GeoPoint;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current position, or `ClientError::Permission` when unavailable.
    async fn current_location(&self) -> ClientResult<GeoPoint>;
}

/// A position configured up front. Without one, geo sharing is unavailable.
#[derive(Debug, Clone, Default)]
pub struct FixedLocation {
    point: Option<GeoPoint>,
}

impl FixedLocation {
    pub fn new(point: Option<GeoPoint>) -> Self {
        FixedLocation { point }
    }

    pub fn unavailable() -> Self {
        FixedLocation { point: None }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> ClientResult<GeoPoint> {
        self.point
            .ok_or_else(|| ClientError::Permission("Geolocation is not available".to_string()))
    }
}
