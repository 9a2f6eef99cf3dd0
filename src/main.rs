use std::{io, process, sync::Arc};

use category_posts::{
    application::error::AppError,
    cache::CacheConfig,
    config::{self, RenderArgs, Settings},
    domain::types::WidgetInstanceId,
    infra::{
        error::InfraError,
        http,
        runtime::{self, Runtime},
        telemetry,
    },
    presentation::views::WidgetChrome,
};
use tokio::{sync::Notify, task::JoinError};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let host = runtime::load_host(&settings.site).await?;
    let runtime = Runtime::new(CacheConfig::from(&settings.cache), &settings.site, host);

    match command {
        config::Command::Serve(_) => run_serve(&settings, runtime).await,
        config::Command::Render(args) => run_render(runtime, &args).await,
    }
}

async fn run_serve(settings: &Settings, runtime: Runtime) -> Result<(), AppError> {
    let router = http::build_router(runtime.http_state());
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        addr = %settings.server.addr,
        scope = %runtime.scope,
        use_cache = runtime.cache.config().use_cache,
        "Serving category posts widgets"
    );

    let sizes = runtime.thumbnails.registered_sizes().await?;
    for size in &sizes {
        info!(
            size_name = %size.name,
            width = size.width,
            height = size.height,
            crop = size.crop,
            "Registered thumbnail size"
        );
    }

    let shutdown = Arc::new(Notify::new());
    let mut server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        }
    });

    tokio::select! {
        joined = &mut server => return finish_server(joined),
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|err| AppError::from(InfraError::from(err)))?;
        }
    }

    let grace = settings.server.graceful_shutdown;
    info!(grace_secs = grace.as_secs(), "Shutdown requested, draining connections");
    shutdown.notify_one();

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => finish_server(joined),
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out");
            server.abort();
            Ok(())
        }
    }
}

fn finish_server(joined: Result<io::Result<()>, JoinError>) -> Result<(), AppError> {
    joined
        .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn run_render(runtime: Runtime, args: &RenderArgs) -> Result<(), AppError> {
    let instance = WidgetInstanceId::new(args.instance.clone());
    let chrome = if args.bare {
        WidgetChrome::default()
    } else {
        WidgetChrome::sidebar(instance.as_str())
    };

    let html = runtime
        .render
        .render(&runtime.scope, &instance, chrome)
        .await?;
    println!("{html}");
    Ok(())
}
