use facegate_decision::{
    CommandDetector, DecisionEngine, DenyFallback, EncodingMatcher, KnownEmbeddingSet,
    TerminalPrompt,
};
use facegate_node::{run_server, StopReason};
use facegate_session::SessionListener;
use tracing::{info, warn};

use crate::cmd::{install_stop_handler, FallbackKind, GateArgs};
use crate::exit::{node_error, session_error, CliResult, SUCCESS};
use crate::output::{print_loop_report, OutputFormat};

pub fn run(args: GateArgs, format: OutputFormat) -> CliResult<i32> {
    let stop = install_stop_handler()?;

    let allow = KnownEmbeddingSet::load_or_empty(&args.allow, "allow");
    let deny = KnownEmbeddingSet::load_or_empty(&args.deny, "deny");
    if allow.is_empty() {
        warn!("allow list is empty; nobody is granted without a human decision");
    }
    if let (Some(a), Some(d)) = (allow.dimension(), deny.dimension()) {
        if a != d {
            warn!(allow = a, deny = d, "allow and deny lists use different embedding sizes");
        }
    }

    let detector = CommandDetector::new(&args.detector)
        .with_args(args.detector_args.iter().cloned())
        .with_model(args.model);
    let matcher = EncodingMatcher::new(args.tolerance);

    let mut engine = match args.fallback {
        FallbackKind::Prompt => DecisionEngine::new(
            detector,
            TerminalPrompt::stdio().with_preview_dir(&args.preview_dir),
            allow,
            deny,
            matcher,
        ),
        FallbackKind::Deny => DecisionEngine::new(detector, DenyFallback, allow, deny, matcher),
    };

    let listener = SessionListener::bind(args.proto, &args.host, args.port)
        .and_then(|listener| listener.with_stop(stop.clone()))
        .map_err(|err| session_error("bind failed", err))?;
    info!(
        addr = %listener.local_addr(),
        transport = %listener.transport(),
        tolerance = %args.tolerance,
        model = %args.model,
        "decision node ready"
    );

    let report =
        run_server(&listener, &mut engine, &stop).map_err(|err| node_error("session failed", err))?;
    if report.stop == StopReason::Interrupted {
        eprintln!("Stopped.");
    }
    print_loop_report("gate", &report, format);
    Ok(SUCCESS)
}
