//! Device capability acquisition for the punch pipeline.
//!
//! Probes resolve to a tri-state outcome and never error out of the
//! pipeline. Location is acquired fresh on every punch (no cached fix) under
//! a timeout; the camera is opened only to prove availability and the lease
//! is released the moment the probe scope ends, unless scan mode holds it.

use crate::utils::geofence::GeoPoint;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use utoipa::ToSchema;

#[derive(Debug)]
pub enum Capability<T> {
    Granted(T),
    Denied,
    Unsupported,
}

impl<T> Capability<T> {
    pub fn is_granted(&self) -> bool {
        matches!(self, Capability::Granted(_))
    }

    pub fn granted(self) -> Option<T> {
        match self {
            Capability::Granted(v) => Some(v),
            _ => None,
        }
    }
}

/// RAII camera hold. Dropping the lease is the release; it happens on every
/// pipeline path, success or failure.
#[derive(Debug)]
pub struct CameraLease {
    released: Option<Arc<AtomicBool>>,
}

impl CameraLease {
    pub fn acquired() -> Self {
        Self { released: None }
    }

    /// Test hook: flips the flag when the lease is dropped.
    pub fn with_release_flag(flag: Arc<AtomicBool>) -> Self {
        Self {
            released: Some(flag),
        }
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        if let Some(flag) = &self.released {
            flag.store(true, Ordering::SeqCst);
        }
        tracing::trace!("camera lease released");
    }
}

#[async_trait]
pub trait CapabilitySource: Send + Sync {
    /// Fresh high-accuracy position; implementations must not serve a cached
    /// fix.
    async fn acquire_location(&self) -> Capability<GeoPoint>;

    /// Opens the capture device to prove availability.
    async fn probe_camera(&self) -> Capability<CameraLease>;
}

/// Bounds location acquisition; a probe that exceeds the deadline counts as
/// denied.
pub async fn acquire_location_within(
    source: &dyn CapabilitySource,
    timeout: Duration,
) -> Capability<GeoPoint> {
    match actix_web::rt::time::timeout(timeout, source.acquire_location()).await {
        Ok(cap) => cap,
        Err(_) => {
            tracing::debug!(timeout_ms = timeout.as_millis() as u64, "location probe timed out");
            Capability::Denied
        }
    }
}

/// Capability state as reported by the punching client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Unsupported,
}

/// Production source: the punching client performs the device probes and
/// reports their results in the request body.
#[derive(Debug, Clone, Copy)]
pub struct ReportedCapabilities {
    pub location: PermissionState,
    pub position: Option<GeoPoint>,
    pub camera: PermissionState,
}

#[async_trait]
impl CapabilitySource for ReportedCapabilities {
    async fn acquire_location(&self) -> Capability<GeoPoint> {
        match (self.location, self.position) {
            (PermissionState::Granted, Some(p)) => Capability::Granted(p),
            // Permission without a fix is indistinguishable from a refusal.
            (PermissionState::Granted, None) => Capability::Denied,
            (PermissionState::Denied, _) => Capability::Denied,
            (PermissionState::Unsupported, _) => Capability::Unsupported,
        }
    }

    async fn probe_camera(&self) -> Capability<CameraLease> {
        match self.camera {
            PermissionState::Granted => Capability::Granted(CameraLease::acquired()),
            PermissionState::Denied => Capability::Denied,
            PermissionState::Unsupported => Capability::Unsupported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowSource;

    #[async_trait]
    impl CapabilitySource for SlowSource {
        async fn acquire_location(&self) -> Capability<GeoPoint> {
            actix_web::rt::time::sleep(Duration::from_millis(200)).await;
            Capability::Granted(GeoPoint { lat: 0.0, lng: 0.0 })
        }

        async fn probe_camera(&self) -> Capability<CameraLease> {
            Capability::Unsupported
        }
    }

    #[actix_web::test]
    async fn slow_location_probe_counts_as_denied() {
        let cap = acquire_location_within(&SlowSource, Duration::from_millis(20)).await;
        assert!(!cap.is_granted());
        assert!(matches!(cap, Capability::Denied));
    }

    #[actix_web::test]
    async fn fast_location_probe_passes_through() {
        let source = ReportedCapabilities {
            location: PermissionState::Granted,
            position: Some(GeoPoint { lat: 1.0, lng: 2.0 }),
            camera: PermissionState::Unsupported,
        };
        let cap = acquire_location_within(&source, Duration::from_secs(10)).await;
        let point = cap.granted().unwrap();
        assert_eq!(point.lat, 1.0);
    }

    #[actix_web::test]
    async fn granted_permission_without_fix_is_denied() {
        let source = ReportedCapabilities {
            location: PermissionState::Granted,
            position: None,
            camera: PermissionState::Unsupported,
        };
        assert!(matches!(
            source.acquire_location().await,
            Capability::Denied
        ));
    }

    #[test]
    fn camera_lease_release_fires_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        {
            let _lease = CameraLease::with_release_flag(flag.clone());
            assert!(!flag.load(Ordering::SeqCst));
        }
        assert!(flag.load(Ordering::SeqCst));
    }
}
