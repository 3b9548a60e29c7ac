//! The punch pipeline: capability acquisition, geofence validation, the
//! NotPunched → PunchedIn → PunchedOut transition, persistence, and the
//! fire-and-forget domain event.
//!
//! Every step is awaited in order because each result can short-circuit the
//! rest. A rejection leaves the stored sheet exactly as it was and the punch
//! can be retried immediately.

pub mod capability;

use crate::model::attendance::{AttendanceStatus, DailyRecord};
use crate::model::branch::Branch;
use crate::model::employee::EmployeeProfile;
use crate::notify::{Notification, NotificationDispatcher, dispatch_fire_and_forget};
use crate::punch::capability::{Capability, CapabilitySource, acquire_location_within};
use crate::store::records::RecordStore;
use crate::utils::clock::{format_clock_time, shift_bounds};
use crate::utils::geofence;
use chrono::{Datelike, NaiveDate};
use derive_more::Display;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Why a punch was refused. Codes are the user-facing rejection categories;
/// none of these is fatal.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum PunchRejection {
    #[display(fmt = "location_denied")]
    LocationDenied { unsupported: bool },
    #[display(fmt = "camera_denied")]
    CameraDenied { unsupported: bool },
    #[display(fmt = "geofence_violation")]
    OutsideGeofence {
        distance_m: f64,
        over_by_m: f64,
        radius_m: f64,
    },
    #[display(fmt = "already_completed")]
    AlreadyCompleted,
    #[display(fmt = "busy")]
    Busy,
}

impl PunchRejection {
    /// Human-readable detail accompanying the rejection code.
    pub fn detail(&self) -> String {
        match self {
            PunchRejection::LocationDenied { unsupported: true } => {
                "location is not supported on this device".into()
            }
            PunchRejection::LocationDenied { unsupported: false } => {
                "location permission was refused or timed out".into()
            }
            PunchRejection::CameraDenied { unsupported: true } => {
                "camera is not supported on this device".into()
            }
            PunchRejection::CameraDenied { unsupported: false } => {
                "camera permission was refused".into()
            }
            PunchRejection::OutsideGeofence {
                over_by_m, radius_m, ..
            } => {
                format!(
                    "{:.0} m outside the {:.0} m branch radius",
                    over_by_m, radius_m
                )
            }
            PunchRejection::AlreadyCompleted => {
                "today is already punched out; ask an admin to amend it".into()
            }
            PunchRejection::Busy => "another punch is already in progress".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum PunchDirection {
    #[display(fmt = "punch_in")]
    #[serde(rename = "punch_in")]
    In,
    #[display(fmt = "punch_out")]
    #[serde(rename = "punch_out")]
    Out,
}

#[derive(Debug, Clone)]
pub struct PunchSuccess {
    pub direction: PunchDirection,
    pub record: DailyRecord,
    /// `Some(true)` when a geofence check ran and passed; `None` when no
    /// check applied.
    pub within_geofence: Option<bool>,
    /// False when the sheet could not be saved; the in-memory result is
    /// still returned.
    pub persisted: bool,
}

#[derive(Debug)]
pub enum PunchOutcome {
    Completed(PunchSuccess),
    Rejected(PunchRejection),
}

static IN_FLIGHT: Lazy<Mutex<HashSet<u64>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Holds the per-employee punch slot; dropping it frees the slot.
pub struct BusyGuard {
    employee_id: u64,
}

impl BusyGuard {
    pub fn acquire(employee_id: u64) -> Option<Self> {
        let mut in_flight = IN_FLIGHT.lock().expect("busy guard poisoned");
        if !in_flight.insert(employee_id) {
            return None;
        }
        Some(Self { employee_id })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        IN_FLIGHT
            .lock()
            .expect("busy guard poisoned")
            .remove(&self.employee_id);
    }
}

pub struct PunchPipeline {
    records: RecordStore,
    notifier: Arc<dyn NotificationDispatcher>,
    location_timeout: Duration,
    late_grace_min: i64,
}

impl PunchPipeline {
    pub fn new(
        records: RecordStore,
        notifier: Arc<dyn NotificationDispatcher>,
        location_timeout: Duration,
        late_grace_min: i64,
    ) -> Self {
        Self {
            records,
            notifier,
            location_timeout,
            late_grace_min,
        }
    }

    /// Runs the full punch sequence for `today` at `now_minutes` wall-clock.
    /// Direction is inferred from today's stored record, so the state order
    /// cannot be forged from outside.
    ///
    /// `Err` is reserved for infrastructure failures on the read path; every
    /// policy refusal comes back as `PunchOutcome::Rejected`.
    pub async fn punch(
        &self,
        profile: &EmployeeProfile,
        branch: Option<&Branch>,
        source: &dyn CapabilitySource,
        scan_mode: bool,
        today: NaiveDate,
        now_minutes: i64,
    ) -> anyhow::Result<PunchOutcome> {
        let Some(_guard) = BusyGuard::acquire(profile.id) else {
            return Ok(PunchOutcome::Rejected(PunchRejection::Busy));
        };

        // Capability acquisition, location first, then camera. Probes are
        // tri-state and never abort the pipeline on their own.
        let location_cap = if profile.needs_location() {
            Some(acquire_location_within(source, self.location_timeout).await)
        } else {
            None
        };
        let camera_cap = if profile.needs_camera() {
            Some(source.probe_camera().await)
        } else {
            None
        };

        // Required-capability gate. The failure names the capability.
        let position = match location_cap {
            Some(Capability::Granted(point)) => Some(point),
            Some(Capability::Denied) => {
                return Ok(PunchOutcome::Rejected(PunchRejection::LocationDenied {
                    unsupported: false,
                }));
            }
            Some(Capability::Unsupported) => {
                return Ok(PunchOutcome::Rejected(PunchRejection::LocationDenied {
                    unsupported: true,
                }));
            }
            None => None,
        };
        // Outside scan mode the lease drops right here, releasing the camera.
        let _scan_lease = match camera_cap {
            Some(Capability::Granted(lease)) => {
                if scan_mode {
                    Some(lease)
                } else {
                    None
                }
            }
            Some(Capability::Denied) => {
                return Ok(PunchOutcome::Rejected(PunchRejection::CameraDenied {
                    unsupported: false,
                }));
            }
            Some(Capability::Unsupported) => {
                return Ok(PunchOutcome::Rejected(PunchRejection::CameraDenied {
                    unsupported: true,
                }));
            }
            None => None,
        };

        // Geofence containment; needs both a fix and a resolved branch.
        let mut within_geofence = None;
        if profile.gps_geofencing {
            if let (Some(point), Some(branch)) = (position, branch) {
                let res = geofence::check(point, branch);
                if !res.within {
                    return Ok(PunchOutcome::Rejected(PunchRejection::OutsideGeofence {
                        distance_m: res.distance_m,
                        over_by_m: res.over_by_m,
                        radius_m: branch.radius_m,
                    }));
                }
                within_geofence = Some(true);
            }
        }

        // State transition on today's record.
        let mut sheet = self
            .records
            .monthly_sheet(profile.id, today.year(), today.month(), today)
            .await?;
        let Some(rec) = sheet.record_mut(today.day()) else {
            anyhow::bail!("sheet for {}-{} has no day {}", today.year(), today.month(), today.day());
        };

        let direction = if rec.is_punched_out() {
            return Ok(PunchOutcome::Rejected(PunchRejection::AlreadyCompleted));
        } else if rec.is_punched_in() {
            // Lateness was fixed at punch-in and stays as it is.
            rec.check_out = Some(format_clock_time(now_minutes));
            PunchDirection::Out
        } else {
            let (shift_start, _) = shift_bounds(profile.working_hours.as_deref());
            rec.status = AttendanceStatus::Present;
            rec.check_in = Some(format_clock_time(now_minutes));
            rec.is_late = now_minutes > shift_start + self.late_grace_min;
            PunchDirection::In
        };
        let record = rec.clone();

        let persisted = match self.records.save_sheet(&sheet).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, employee_id = profile.id, "failed to persist punch");
                false
            }
        };

        self.emit(profile, direction, &record, today);

        Ok(PunchOutcome::Completed(PunchSuccess {
            direction,
            record,
            within_geofence,
            persisted,
        }))
    }

    fn emit(
        &self,
        profile: &EmployeeProfile,
        direction: PunchDirection,
        record: &DailyRecord,
        today: NaiveDate,
    ) {
        let time = match direction {
            PunchDirection::In => record.check_in.clone(),
            PunchDirection::Out => record.check_out.clone(),
        }
        .unwrap_or_default();

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            kind: direction.to_string(),
            title: "Attendance".into(),
            message: format!(
                "{} punched {} at {}",
                profile.full_name(),
                match direction {
                    PunchDirection::In => "in",
                    PunchDirection::Out => "out",
                },
                time
            ),
            target_roles: vec!["admin".into(), "hr".into()],
            employee_id: profile.id,
            link: format!(
                "/attendance/{}/{}/{}",
                profile.id,
                today.year(),
                today.month()
            ),
        };

        dispatch_fire_and_forget(self.notifier.clone(), notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::punch::capability::{PermissionState, ReportedCapabilities};
    use crate::store::MemoryKeyedStore;
    use crate::utils::geofence::GeoPoint;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BRANCH_LAT: f64 = 23.8103;
    const BRANCH_LNG: f64 = 90.4125;

    fn profile(id: u64, geofencing: bool, qr: bool) -> EmployeeProfile {
        EmployeeProfile {
            id,
            employee_code: format!("EMP-{id}"),
            first_name: "Jamie".into(),
            last_name: "Rivera".into(),
            branch: "Head Office".into(),
            gps_geofencing: geofencing,
            qr_scan: qr,
            live_tracking: false,
            working_hours: None,
        }
    }

    fn branch(radius_m: f64) -> Branch {
        Branch {
            name: "Head Office".into(),
            lat: BRANCH_LAT,
            lng: BRANCH_LNG,
            radius_m,
        }
    }

    fn at_branch() -> ReportedCapabilities {
        ReportedCapabilities {
            location: PermissionState::Granted,
            position: Some(GeoPoint {
                lat: BRANCH_LAT,
                lng: BRANCH_LNG,
            }),
            camera: PermissionState::Granted,
        }
    }

    fn metres_north(m: f64) -> ReportedCapabilities {
        ReportedCapabilities {
            position: Some(GeoPoint {
                lat: BRANCH_LAT + m / 111_195.0,
                lng: BRANCH_LNG,
            }),
            ..at_branch()
        }
    }

    #[derive(Default)]
    struct CountingDispatcher {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl NotificationDispatcher for CountingDispatcher {
        async fn dispatch(&self, _notification: Notification) -> anyhow::Result<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingDispatcher;

    #[async_trait]
    impl NotificationDispatcher for FailingDispatcher {
        async fn dispatch(&self, _notification: Notification) -> anyhow::Result<()> {
            Err(anyhow!("dispatch transport down"))
        }
    }

    fn pipeline_with(
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> (PunchPipeline, RecordStore) {
        let records = RecordStore::new(Arc::new(MemoryKeyedStore::new()));
        let pipeline = PunchPipeline::new(
            records.clone(),
            notifier,
            Duration::from_secs(10),
            15,
        );
        (pipeline, records)
    }

    fn pipeline() -> (PunchPipeline, RecordStore) {
        pipeline_with(Arc::new(CountingDispatcher::default()))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()
    }

    fn expect_completed(outcome: PunchOutcome) -> PunchSuccess {
        match outcome {
            PunchOutcome::Completed(s) => s,
            PunchOutcome::Rejected(r) => panic!("rejected: {r} ({})", r.detail()),
        }
    }

    fn expect_rejected(outcome: PunchOutcome) -> PunchRejection {
        match outcome {
            PunchOutcome::Rejected(r) => r,
            PunchOutcome::Completed(s) => panic!("unexpectedly completed: {:?}", s.direction),
        }
    }

    #[actix_web::test]
    async fn punch_in_inside_fence_marks_present() {
        let (pipeline, _) = pipeline();
        let profile = profile(2001, true, false);
        let fence = branch(200.0);

        let outcome = pipeline
            .punch(&profile, Some(&fence), &at_branch(), false, today(), 570)
            .await
            .unwrap();

        let success = expect_completed(outcome);
        assert_eq!(success.direction, PunchDirection::In);
        assert_eq!(success.within_geofence, Some(true));
        assert!(success.persisted);
        assert_eq!(success.record.status, AttendanceStatus::Present);
        assert_eq!(success.record.check_in.as_deref(), Some("09:30 AM"));
        assert!(!success.record.is_late);
    }

    #[actix_web::test]
    async fn outside_fence_rejects_with_over_by_and_leaves_record_untouched() {
        let (pipeline, records) = pipeline();
        let profile = profile(2002, true, false);
        let fence = branch(200.0);

        let outcome = pipeline
            .punch(&profile, Some(&fence), &metres_north(250.0), false, today(), 570)
            .await
            .unwrap();

        match expect_rejected(outcome) {
            PunchRejection::OutsideGeofence {
                over_by_m, radius_m, ..
            } => {
                assert!((over_by_m - 50.0).abs() < 5.0, "over_by {over_by_m}");
                assert_eq!(radius_m, 200.0);
            }
            other => panic!("wrong rejection {other}"),
        }

        let sheet = records.monthly_sheet(2002, 2026, 8, today()).await.unwrap();
        let rec = sheet.record(10).unwrap();
        assert_eq!(rec.status, AttendanceStatus::NotMarked);
        assert!(rec.check_in.is_none());
    }

    #[actix_web::test]
    async fn grace_window_controls_lateness() {
        // 09:44 AM is inside the 15-minute grace, 09:46 AM is past it.
        let (first, _) = pipeline();
        let on_time = first
            .punch(&profile(2003, false, false), None, &at_branch(), false, today(), 584)
            .await
            .unwrap();
        assert!(!expect_completed(on_time).record.is_late);

        let (second, _) = pipeline();
        let late = second
            .punch(&profile(2004, false, false), None, &at_branch(), false, today(), 586)
            .await
            .unwrap();
        assert!(expect_completed(late).record.is_late);
    }

    #[actix_web::test]
    async fn punch_out_stamps_time_and_preserves_lateness() {
        let (pipeline, _) = pipeline();
        let profile = profile(2005, false, false);

        let first = pipeline
            .punch(&profile, None, &at_branch(), false, today(), 600)
            .await
            .unwrap();
        assert!(expect_completed(first).record.is_late);

        let second = pipeline
            .punch(&profile, None, &at_branch(), false, today(), 1110)
            .await
            .unwrap();
        let success = expect_completed(second);
        assert_eq!(success.direction, PunchDirection::Out);
        assert_eq!(success.record.check_out.as_deref(), Some("06:30 PM"));
        assert!(success.record.is_late, "lateness must survive punch-out");
    }

    #[actix_web::test]
    async fn completed_day_rejects_further_punches() {
        let (pipeline, _) = pipeline();
        let profile = profile(2006, false, false);

        for now in [570, 1110] {
            pipeline
                .punch(&profile, None, &at_branch(), false, today(), now)
                .await
                .unwrap();
        }
        let third = pipeline
            .punch(&profile, None, &at_branch(), false, today(), 1200)
            .await
            .unwrap();
        assert_eq!(expect_rejected(third), PunchRejection::AlreadyCompleted);
    }

    #[actix_web::test]
    async fn required_location_denied_rejects_before_any_write() {
        let (pipeline, records) = pipeline();
        let profile = profile(2007, true, false);
        let source = ReportedCapabilities {
            location: PermissionState::Denied,
            position: None,
            camera: PermissionState::Granted,
        };

        let outcome = pipeline
            .punch(&profile, Some(&branch(200.0)), &source, false, today(), 570)
            .await
            .unwrap();
        assert_eq!(
            expect_rejected(outcome),
            PunchRejection::LocationDenied { unsupported: false }
        );

        let sheet = records.monthly_sheet(2007, 2026, 8, today()).await.unwrap();
        assert!(sheet.record(10).unwrap().check_in.is_none());
    }

    #[actix_web::test]
    async fn required_camera_unsupported_names_the_capability() {
        let (pipeline, _) = pipeline();
        let profile = profile(2008, false, true);
        let source = ReportedCapabilities {
            location: PermissionState::Unsupported,
            position: None,
            camera: PermissionState::Unsupported,
        };

        let outcome = pipeline
            .punch(&profile, None, &source, false, today(), 570)
            .await
            .unwrap();
        assert_eq!(
            expect_rejected(outcome),
            PunchRejection::CameraDenied { unsupported: true }
        );
    }

    #[actix_web::test]
    async fn no_required_capabilities_skips_probes_entirely() {
        let (pipeline, _) = pipeline();
        let profile = profile(2009, false, false);
        let source = ReportedCapabilities {
            location: PermissionState::Denied,
            position: None,
            camera: PermissionState::Denied,
        };

        let outcome = pipeline
            .punch(&profile, None, &source, false, today(), 570)
            .await
            .unwrap();
        let success = expect_completed(outcome);
        assert_eq!(success.within_geofence, None);
    }

    #[actix_web::test]
    async fn missing_branch_geofence_skips_the_distance_check() {
        let (pipeline, _) = pipeline();
        let profile = profile(2010, true, false);

        let outcome = pipeline
            .punch(&profile, None, &metres_north(5000.0), false, today(), 570)
            .await
            .unwrap();
        let success = expect_completed(outcome);
        assert_eq!(success.within_geofence, None);
    }

    #[actix_web::test]
    async fn busy_guard_rejects_overlapping_punch() {
        let (pipeline, _) = pipeline();
        let profile = profile(2011, false, false);

        let _held = BusyGuard::acquire(2011).expect("free slot");
        let outcome = pipeline
            .punch(&profile, None, &at_branch(), false, today(), 570)
            .await
            .unwrap();
        assert_eq!(expect_rejected(outcome), PunchRejection::Busy);
        drop(_held);

        // Slot freed: the retry goes through.
        let retry = pipeline
            .punch(&profile, None, &at_branch(), false, today(), 570)
            .await
            .unwrap();
        expect_completed(retry);
    }

    #[actix_web::test]
    async fn success_emits_exactly_one_event() {
        let dispatcher = Arc::new(CountingDispatcher::default());
        let (pipeline, _) = pipeline_with(dispatcher.clone());

        pipeline
            .punch(&profile(2012, false, false), None, &at_branch(), false, today(), 570)
            .await
            .unwrap();

        // Emission is spawned; give it a beat to run.
        actix_web::rt::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(dispatcher.sent.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn notification_failure_never_fails_the_punch() {
        let (pipeline, _) = pipeline_with(Arc::new(FailingDispatcher));

        let outcome = pipeline
            .punch(&profile(2013, false, false), None, &at_branch(), false, today(), 570)
            .await
            .unwrap();
        let success = expect_completed(outcome);
        assert!(success.persisted);

        actix_web::rt::time::sleep(Duration::from_millis(50)).await;
    }
}
