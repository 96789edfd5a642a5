use crate::types::HealthRes;

/// Health reporting shared by the API binaries.
pub struct HealthService;

impl HealthService {
    /// Reports the service as healthy.
    ///
    /// The store is plain files on disk, so there is no backing connection to probe;
    /// answering at all is the health signal.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "postmeta is alive".into(),
        }
    }
}
