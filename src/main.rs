use seq_cnn_rs::seqcnn::settings::settings;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load settings to verify basic functionality
    let config = settings();
    tracing::info!(
        log_every_n_iter = config.logging.every_n_iter,
        "seq-cnn-rs initialized"
    );
}
