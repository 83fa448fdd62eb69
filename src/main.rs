#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

use crate::command::{acquire, clear, metrics, release, run};
use argh::FromArgs;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use simple_lock::configuration::{
    self, create_granule, create_lock, Configuration, ObservabilityConfig,
};
use std::process::exit;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

mod command;

fn set_tracing(config: Option<ObservabilityConfig>) -> Result<(), configuration::Error> {
    if let Some(ObservabilityConfig {
        tracing: Some(tracing_config),
    }) = config
    {
        let resource = Resource::builder()
            .with_service_name(env!("CARGO_PKG_NAME"))
            .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
            .build();
        let otlp_exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&tracing_config.endpoint)
            .with_timeout(std::time::Duration::from_secs(10))
            .build()?;

        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(otlp_exporter)
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource)
            .with_sampler(Sampler::TraceIdRatioBased(tracing_config.sampling_rate))
            .build();

        let tracer = tracer_provider.tracer("simple-lock");
        let _ = global::set_tracer_provider(tracer_provider);
        let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

        let _ = tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .with(telemetry)
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init();
    }
    Ok(())
}

#[derive(FromArgs, PartialEq, Debug)]
/// A distributed mutual exclusion lock over a shared key-value store
struct GlobalArguments {
    #[argh(option, short = 'c', default = "String::from(\"config.toml\")")]
    /// the path to the configuration file, defaults to `config.toml`
    config: String,

    #[argh(switch, short = 'm')]
    /// print the lock metrics of this run to stderr once the command completes
    metrics: bool,

    #[argh(subcommand)]
    subcommand: SubCommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommand {
    Acquire(acquire::Options),
    Release(release::Options),
    Clear(clear::Options),
    Run(run::Options),
}

fn main() -> Result<(), command::Error> {
    let cli_args: GlobalArguments = argh::from_env();

    let config = Configuration::load(&cli_args.config)?;

    let code = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run_command(cli_args, config))?;

    if code != 0 {
        exit(code);
    }
    Ok(())
}

async fn run_command(
    cli_args: GlobalArguments,
    config: Configuration,
) -> Result<i32, command::Error> {
    set_tracing(config.observability.clone())?;

    let code = match cli_args.subcommand {
        SubCommand::Acquire(options) => {
            let acquire = acquire::Command::new(&options, create_lock(&config)?);
            acquire.run().await?;
            0
        }
        SubCommand::Release(options) => {
            let release = release::Command::new(&options, create_lock(&config)?);
            release.run().await?;
            0
        }
        SubCommand::Clear(_) => {
            clear::Command::new(create_lock(&config)?).run().await;
            0
        }
        SubCommand::Run(options) => {
            let run = run::Command::new(&options, create_granule(&config)?)?;
            run.run().await?
        }
    };

    if cli_args.metrics {
        metrics::report()?;
    }
    Ok(code)
}
