//! One handler per subcommand: merge flags into the settings, run the stage,
//! print its result.

use anyhow::{Context, Result, bail};
use ldraw_convert::{LdviewTool, convert_all};
use ml_dataset::{SplitRatio, split_directory};
use ml_training::{OptimizerConfig, predict_with_checkpoint, run_training};
use render_scene::render_directory;
use tracing::info;

use crate::settings::Settings;
use crate::{ConvertArgs, PredictArgs, RenderArgs, SplitArgs, TrainArgs};

pub fn convert(settings: &Settings, args: ConvertArgs) -> Result<()> {
    let mut config = settings.convert.clone();
    if let Some(input) = args.input {
        config.input_root = settings.resolve(input);
    }
    if let Some(output) = args.output {
        config.output_dir = settings.resolve(output);
    }
    if !args.allowed_dirs.is_empty() {
        config.allowed_dirs = args
            .allowed_dirs
            .iter()
            .map(|dir| settings.resolve(dir))
            .collect();
    }
    if let Some(ldview) = args.ldview {
        config.ldview_path = ldview;
    }
    if config.allowed_dirs.is_empty() {
        config = config.with_library_dirs();
    }

    let tool = LdviewTool::from_config(&config);
    let report = convert_all(&config, &tool).context("conversion failed")?;
    println!("{report}");
    Ok(())
}

pub fn render(settings: &Settings, args: RenderArgs) -> Result<()> {
    let mut config = settings.render.clone();
    if let Some(meshes) = args.meshes {
        config.mesh_dir = settings.resolve(meshes);
    }
    if let Some(output) = args.output {
        config.output_dir = settings.resolve(output);
    }
    if let Some(whitelist) = args.whitelist {
        config = config.with_whitelist(settings.resolve(whitelist));
    }
    if args.all {
        config = config.without_whitelist();
    }
    if let Some(angles) = args.angles {
        config = config.with_angles(angles.into());
    }
    if let Some(layout) = args.layout {
        config = config.with_layout(layout.into());
    }
    if let Some(framing) = args.framing {
        config = config.with_framing(framing.into());
    }
    let width = args.width.unwrap_or(config.width);
    let height = args.height.unwrap_or(config.height);
    config = config.with_size(width, height);

    let report = render_directory(&config).context("rendering failed")?;
    println!(
        "Rendered {} images of {} parts into {} ({} not on the whitelist)",
        report.image_count(),
        report.rendered.len(),
        config.output_dir.display(),
        report.skipped.len()
    );
    Ok(())
}

pub fn split(settings: &Settings, args: SplitArgs) -> Result<()> {
    let mut config = settings.split.clone();
    if let Some(source) = args.source {
        config.source_dir = settings.resolve(source);
    }
    if let Some(dest) = args.dest {
        config.dest_dir = settings.resolve(dest);
    }
    if let Some(ratio) = args.ratio {
        config = config.with_ratio(SplitRatio::new(ratio)?);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let summary = split_directory(&config).context("splitting failed")?;
    println!("{summary}");
    Ok(())
}

pub fn train(settings: &Settings, args: TrainArgs) -> Result<()> {
    let mut config = settings.train.clone();
    if let Some(profile) = args.profile {
        let profile: ml_training::TrainingProfile = profile.into();
        info!(profile = %profile, "Applying training profile");
        config = config
            .with_epochs(profile.epochs())
            .with_evaluation_split(profile.evaluation_split());
    }
    if let Some(data) = args.data {
        config = config.with_data_dir(settings.resolve(data));
    }
    if let Some(epochs) = args.epochs {
        config = config.with_epochs(epochs);
    }
    if let Some(batch_size) = args.batch_size {
        config = config.with_batch_size(batch_size);
    }
    if let Some(split) = args.evaluate {
        config = config.with_evaluation_split(split.into());
    }
    let input_size = args.input_size.unwrap_or(config.input_size);
    let width_multiplier = args.width_multiplier.unwrap_or(config.width_multiplier);
    config = config.with_model_size(input_size, width_multiplier);
    if let Some(learning_rate) = args.learning_rate {
        let optimizer = OptimizerConfig {
            learning_rate,
            ..config.optimizer
        };
        config = config.with_optimizer(optimizer);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(weights) = args.backbone_weights {
        config = config.with_backbone_weights(settings.resolve(weights));
    }
    if let Some(checkpoint) = args.checkpoint {
        config = config.with_checkpoint(settings.resolve(checkpoint));
    }

    // An explicit image must classify; the configured one is used if present.
    let image = match args.predict {
        Some(image) => Some(settings.resolve(image)),
        None if settings.predict.image.is_file() => Some(settings.predict.image.clone()),
        None => {
            info!(
                path = %settings.predict.image.display(),
                "Configured prediction image not found; skipping prediction"
            );
            None
        }
    };

    let outcome = run_training(&config).context("training failed")?;
    print!("{}", outcome.metrics.summary());
    println!("{}", outcome.report);
    if let Some(saved) = &outcome.checkpoint {
        println!("Saved model to {}", saved.display());
    }
    if let Some(image) = image {
        let prediction = outcome
            .predict(&image)
            .with_context(|| format!("cannot classify {}", image.display()))?;
        println!("{prediction}");
    }
    Ok(())
}

pub fn predict(settings: &Settings, args: PredictArgs) -> Result<()> {
    let image = args
        .image
        .map_or_else(|| settings.predict.image.clone(), |image| settings.resolve(image));
    let Some(checkpoint) = args
        .checkpoint
        .map(|checkpoint| settings.resolve(checkpoint))
        .or_else(|| settings.predict_checkpoint().map(ToOwned::to_owned))
    else {
        bail!("no checkpoint given; pass --checkpoint or set [train] checkpoint");
    };

    let prediction = predict_with_checkpoint(&checkpoint, &image)
        .with_context(|| format!("cannot classify {}", image.display()))?;
    println!("{prediction}");
    Ok(())
}
