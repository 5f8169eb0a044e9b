// Application state for HTTP handlers
use crate::application::firmware_service::FirmwareService;
use crate::application::fleet_service::FleetService;
use crate::application::polling::ShutdownSignal;
use crate::application::session_service::SessionService;

#[derive(Clone)]
pub struct AppState {
    pub fleet: FleetService,
    pub sessions: SessionService,
    pub firmware: FirmwareService,
    pub shutdown: ShutdownSignal,
}
