use clap::Parser;
use std::process::ExitCode;
use stream_restore_volume::{
    ClientConfig, ExitStatus, Mutation, Operation, StreamRestoreClient, SERVER_ENV,
};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Get / set stored volume for an audio server client.
///
/// sink-name is the name of the output device the client should use.
#[derive(Debug, Parser)]
#[command(name = "stream-volume", version, allow_negative_numbers = true)]
#[command(after_help = "Examples:
  # set volume of paplay to 66% on a PCI sound device
  stream-volume paplay 66 alsa_output.pci-0000_00_1f.3.analog-stereo
  stream-volume paplay 50.1   # set volume of paplay to 50.1%
  stream-volume paplay +10    # raise volume of paplay by 10%
  stream-volume paplay toggle # toggle mute status of paplay
  stream-volume paplay        # show current volume of paplay
  stream-volume               # show all client volumes")]
struct Cli {
    /// Client (application name or media role) to show or change
    client: Option<String>,

    /// New volume in percent, +N/-N to adjust, or mute|unmute|toggle
    #[arg(value_parser = parse_mutation, requires = "client")]
    action: Option<Mutation>,

    /// Output device to store for the client
    #[arg(requires = "action")]
    sink_name: Option<String>,

    /// Show name of sink client outputs to
    #[arg(short = 'd', long)]
    show_device: bool,

    /// The name of the server to connect to
    #[arg(short, long, env = SERVER_ENV)]
    server: Option<String>,

    /// Log protocol traffic to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_mutation(s: &str) -> Result<Mutation, String> {
    s.parse().map_err(|e: stream_restore_volume::StreamRestoreError| e.to_string())
}

impl Cli {
    fn operation(&self) -> Operation {
        Operation {
            target: self.client.clone(),
            mutation: self.action,
            device: self.sink_name.clone(),
            show_device: self.show_device,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let operation = cli.operation();
    let mut client = StreamRestoreClient::websocket(ClientConfig::new(cli.server.clone()));

    let status = match client.run(operation, &mut std::io::stdout()).await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitStatus::Failure
        }
    };

    if status == ExitStatus::ClientNotFound {
        if let Some(name) = &cli.client {
            eprintln!("Client '{}' not found.", name);
        }
    }

    ExitCode::from(status.code())
}
