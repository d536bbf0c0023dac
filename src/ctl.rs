use clap::Parser;
use log::error;
use tcpwatch::configuration::args::ClientArgs;
use tcpwatch::controller::control_client::ControlClient;
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_target(false)
        .init();

    let args = ClientArgs::parse();

    let mut client = ControlClient::connect(&args.socket_path, args.max_command_len)
        .await
        .unwrap_or_else(|e| {
            error!("{}: {}", args.socket_path.display(), e);
            std::process::exit(1);
        });

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    if let Err(e) = client.run(stdin, &mut stdout).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
