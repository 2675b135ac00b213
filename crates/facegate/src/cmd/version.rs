use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("facegate {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: facegate");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("FACEGATE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "transports: {}",
        facegate_transport::TransportKind::NAMES
            .iter()
            .filter(|name| name
                .parse::<facegate_transport::TransportKind>()
                .is_ok_and(|kind| kind.is_supported()))
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "wire: negotiation={}B length_prefix={}B frame_header={}B codec_version={}",
        facegate_session::NEGOTIATION_SIZE,
        facegate_frame::LENGTH_PREFIX_SIZE,
        facegate_frame::HEADER_SIZE,
        facegate_frame::codec::CODEC_VERSION
    );

    Ok(SUCCESS)
}
