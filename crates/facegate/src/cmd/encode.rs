use facegate_decision::{CommandDetector, FaceDetector, KnownEmbeddingSet};
use tracing::info;

use crate::cmd::EncodeArgs;
use crate::exit::{decision_error, store_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::images::load_frame;
use crate::output::{print_encode_summary, EncodeSummary, ImageFaces, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut detector = CommandDetector::new(&args.detector)
        .with_args(args.detector_args.iter().cloned())
        .with_model(args.model);

    info!(images = args.images.len(), model = %args.model, "computing face embeddings");

    let mut embeddings = Vec::new();
    let mut per_image = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let frame = load_frame(path)
            .map_err(|err| CliError::new(DATA_INVALID, format!("read image failed: {err}")))?;
        let faces = detector
            .detect(&frame.to_rgb())
            .map_err(|err| decision_error(&format!("detect {}", path.display()), err))?;
        info!(path = %path.display(), faces = faces.len(), "encoded image");

        per_image.push(ImageFaces {
            path: path.display().to_string(),
            faces: faces.len(),
        });
        embeddings.extend(faces.into_iter().map(|face| face.embedding));
    }

    let faces = embeddings.len();
    let set = KnownEmbeddingSet::from_embeddings(embeddings)
        .map_err(|err| store_error("inconsistent embeddings", err))?;
    set.save(&args.encodings)
        .map_err(|err| store_error("write encodings failed", err))?;

    print_encode_summary(
        &EncodeSummary {
            output: args.encodings.display().to_string(),
            model: args.model.to_string(),
            images: args.images.len(),
            faces,
            per_image,
        },
        format,
    );
    Ok(SUCCESS)
}
