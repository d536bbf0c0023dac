use clap::Parser;
use log::{error, info};
use tcpwatch::configuration::args::AnalyzerArgs;
use tcpwatch::controller::controller_handler::Controller;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    info!("Importing configuration");

    let args = AnalyzerArgs::parse();

    let config = args.into_config().unwrap_or_else(|e| {
        error!("Unable to import configuration: {}", e);
        std::process::exit(1);
    });

    info!(
        "Configuration imported: interface={}, control socket={}, output={}",
        config.capture.interface,
        config.control.socket_path.display(),
        config.output.file.display()
    );

    let mut controller = Controller::new(config).unwrap_or_else(|e| {
        error!("Unable to create a controller instance: {}, exiting...", e);
        std::process::exit(1);
    });

    if let Err(e) = controller.run().await {
        error!("Error occured in the controller process: {}, exiting...", e);
        std::process::exit(1);
    }

    info!("Analyzer stopped");
}
