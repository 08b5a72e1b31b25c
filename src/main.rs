//! Demo peripheral: one label and one button, mirroring the layout the
//! companion app shows in its pairing tutorial.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use ble_remote_ui::infrastructure::logging;
use ble_remote_ui::{BlueZAdapter, Control, ControlColor, Orientation, Registry, SettingsService};

fn main() -> Result<()> {
    let settings_service = SettingsService::new()?;
    let settings = settings_service.get().clone();
    let _logging_guard = logging::init_logger(&settings.log_settings)?;

    info!("Starting remote UI peripheral \"{}\"", settings.device_name);

    let label = Control::label(1, 0, 2, 1, ControlColor::Pink, "...");
    let button = Control::button(0, 0, 1, 1, ControlColor::Orange, "ok");

    let mut remote = Registry::new(&settings.device_name);
    remote.set_orientation(settings.orientation.parse::<Orientation>()?);
    remote.set_grid(settings.grid_columns, settings.grid_rows);
    remote.set_start_timeout(Duration::from_millis(settings.start_timeout_ms));
    remote.add_controls([label.clone(), button.clone()])?;

    let button_handle = button.clone();
    remote.begin(
        move |control, _code, value| {
            if Arc::ptr_eq(control, &button_handle) {
                info!("button state = {}", value);
                label.update_text(if value != 0 { "ok" } else { "..." });
            }
        },
        Box::new(BlueZAdapter::new()),
    )?;

    info!("Remote UI online, press Ctrl-C to stop");
    tokio::runtime::Runtime::new()?.block_on(tokio::signal::ctrl_c())?;

    remote.stop();
    info!("Remote UI stopped");
    Ok(())
}
