use anyhow::Result;
use backoffice::app::{run_users, user_repository, UsersOutput};
use backoffice::cli::{Cli, Commands};
use backoffice::config::Config;
use backoffice_core::storage::{repository_error_to_status_code, RepositoryError};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "backoffice=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let mut config = Config::from_env();
    cli.apply(&mut config);

    if let Err(err) = run(cli, config).await {
        if let Some(repository_err) = err.downcast_ref::<RepositoryError>() {
            tracing::error!(
                status = repository_error_to_status_code(repository_err),
                "{repository_err}"
            );
        }
        return Err(err);
    }

    Ok(())
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Users(users) => {
            let repository = user_repository(&config).await?;
            let output = run_users(&repository, users.action).await?;
            if !cli.quiet || !matches!(output, UsersOutput::Deleted(_)) {
                println!("{}", output.render(cli.format));
            }
        }
    }

    Ok(())
}
