use std::sync::Arc;
use std::thread;
use std::time::Duration;

use facegate_lock::{CommandActuator, Door, LockConfig, LockController};
use facegate_node::{run_client, ClientConfig, StopReason};
use facegate_session::{connect_with_config, SessionConfig};
use tracing::info;

use crate::cmd::{install_stop_handler, CameraArgs};
use crate::exit::{lock_error, node_error, session_error, CliResult, SUCCESS};
use crate::images::ImageFileSource;
use crate::output::{print_loop_report, OutputFormat};

pub fn run(args: CameraArgs, format: OutputFormat) -> CliResult<i32> {
    let stop = install_stop_handler()?;

    let lock_config = LockConfig {
        dwell: args.dwell,
        ..LockConfig::default()
    };
    let door = match (&args.unlock_cmd, &args.lock_cmd) {
        (Some(unlock), Some(lock)) => {
            let actuator = CommandActuator::from_command_lines(unlock, lock)
                .map_err(|err| lock_error("invalid lock command", err))?;
            Door::new(actuator, lock_config)
        }
        _ => Door::logging(lock_config),
    };
    let mut controller = LockController::new(Arc::new(door));

    let mut session = connect_with_config(
        args.proto,
        &args.host,
        args.port,
        &SessionConfig::default(),
        Some(stop.clone()),
    )
    .map_err(|err| session_error("connect failed", err))?;
    info!(host = %args.host, port = args.port, transport = %args.proto, "connected to decision node");

    let mut source = ImageFileSource::new(args.images, args.repeat);
    let config = ClientConfig {
        delay: args.delay,
    };

    let result = run_client(&mut session, &mut source, &mut controller, &config, &stop);
    drop(session);

    // Let running cycles relock before the process exits.
    while controller.pending() > 0 {
        thread::sleep(Duration::from_millis(50));
    }

    let report = result.map_err(|err| node_error("camera failed", err))?;
    if report.stop == StopReason::Interrupted {
        eprintln!("Stopped.");
    }
    print_loop_report("camera", &report, format);
    Ok(SUCCESS)
}
