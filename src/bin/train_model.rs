//! Offline training: synthesize a dataset, train the sequence classifier,
//! report test metrics and persist model, scaler and training curves.
//!
//! The dataset comes from `training_profiles()`, whose healthy class spans
//! 6-8 hours and 2-4 meetings; the bootstrap path of the service keeps the
//! narrower default profiles. The curves PNG is written whenever the
//! `plot` feature is on, which it is by default.

#[cfg(not(feature = "lstm"))]
fn main() {
    eprintln!("FATAL: train_model needs the learned backend; rebuild with `--features lstm`");
    std::process::exit(1);
}

#[cfg(feature = "lstm")]
fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = training::run() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "lstm")]
mod training {
    use anyhow::{Context, Result};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use oasis_core::constants::{SCRIPT_EPOCHS, SCRIPT_SAMPLES, SCRIPT_SPLIT_SEED};
    use oasis_core::logic::dataset::{stratified_split, training_profiles, Samples, SequenceGenerator};
    use oasis_core::logic::risk::rules::CLASS_PRIORS;
    use oasis_core::logic::model::BurnoutPredictor;
    use oasis_core::PredictorConfig;

    /// 70 % train, then the remaining 30 % split 2:1 into validation and test
    const HOLDOUT_FRACTION: f32 = 0.3;
    const TEST_FRACTION_OF_HOLDOUT: f32 = 0.33;

    pub fn run() -> Result<()> {
        let config = PredictorConfig::from_env();

        log::info!("Generating {} synthetic sequences", SCRIPT_SAMPLES);
        let mut generator = SequenceGenerator::with_profiles(
            training_profiles(),
            CLASS_PRIORS,
            StdRng::seed_from_u64(SCRIPT_SPLIT_SEED),
        )?;
        let samples: Samples = generator.generate(SCRIPT_SAMPLES).into();

        let (train, holdout) = stratified_split(&samples, HOLDOUT_FRACTION, SCRIPT_SPLIT_SEED)?;
        let (val, test) = stratified_split(&holdout, TEST_FRACTION_OF_HOLDOUT, SCRIPT_SPLIT_SEED)?;
        log::info!("Split: {} train / {} validation / {} test", train.len(), val.len(), test.len());

        let mut predictor = BurnoutPredictor::new(config.clone())?;
        predictor.build()?;
        log::info!("Model built with {} parameters", predictor.param_count());

        let history = predictor
            .train(
                &train.sequences,
                &train.labels,
                &val.sequences,
                &val.labels,
                SCRIPT_EPOCHS,
                config.training.batch_size,
            )
            .context("training")?;
        if history.stopped_early() {
            log::info!("Early stopping after {} epochs", history.epochs());
        }

        let report = predictor.evaluate(&test.sequences, &test.labels)?;
        println!("{}", report);

        let info = predictor.persist().context("saving model")?;
        println!("Model {} saved to {}", info.model_id, config.model_path.display());
        println!("Scaler saved to {}", config.scaler_path.display());

        let history_path = config.history_path();
        history
            .save(&history_path)
            .with_context(|| format!("saving {}", history_path.display()))?;
        println!("Training history saved to {}", history_path.display());

        #[cfg(feature = "plot")]
        {
            let png = history_path.with_extension("png");
            history.plot(&png).with_context(|| format!("plotting {}", png.display()))?;
            println!("Training curves saved to {}", png.display());
        }
        #[cfg(not(feature = "plot"))]
        log::warn!("Built without the `plot` feature; no training curves written");

        Ok(())
    }
}
