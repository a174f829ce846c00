fn main() {
    // stdout carries the rendered output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = stream_graph_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
