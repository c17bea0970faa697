use crate::cli::ServeArgs;
use crate::infra::{AppState, LogMessenger};
use crate::routes::with_board_routes;
use crate::telegram::{self, TelegramClient};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use job_board::board::{
    AttachmentStore, BoardService, BoardStore, Dispatcher, Messenger, SqliteStore,
};
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::telemetry;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = Arc::new(SqliteStore::open(&config.storage.database_path)?);
    let attachments = Arc::new(AttachmentStore::new(config.storage.uploads_dir.clone()));
    attachments.prepare().await?;
    info!(
        database = %config.storage.database_path.display(),
        uploads = %attachments.root().display(),
        "storage ready"
    );

    match config.transport.token.as_deref() {
        Some(token) => {
            let client = Arc::new(TelegramClient::new(
                &config.transport.api_url,
                token,
                config.transport.poll_timeout,
            )?);
            let service = BoardService::new(store, Arc::clone(&client), attachments);
            let dispatcher = Dispatcher::new(Arc::new(service));
            tokio::spawn(telegram::run_polling(client, dispatcher.clone()));
            serve(&config, dispatcher).await
        }
        None => {
            warn!("BOT_TOKEN is not set; chat polling disabled and replies are only logged");
            let service = BoardService::new(store, Arc::new(LogMessenger::default()), attachments);
            serve(&config, Dispatcher::new(Arc::new(service))).await
        }
    }
}

async fn serve<S, M>(config: &AppConfig, dispatcher: Dispatcher<S, M>) -> Result<(), AppError>
where
    S: BoardStore + 'static,
    M: Messenger + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_board_routes(dispatcher)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job board bot ready");

    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn init_db() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    SqliteStore::open(&config.storage.database_path)?;
    println!("Database ready at {}", config.storage.database_path.display());
    Ok(())
}

pub(crate) fn reset_db() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    reset_database(&config.storage.database_path)?;
    println!(
        "Database recreated at {}",
        config.storage.database_path.display()
    );
    Ok(())
}

/// Removes the database file along with its WAL side files, then recreates
/// the schema.
fn reset_database(path: &Path) -> Result<SqliteStore, AppError> {
    for file in [path.to_path_buf(), side_file(path, "-wal"), side_file(path, "-shm")] {
        match std::fs::remove_file(&file) {
            Ok(()) => info!(file = %file.display(), "removed database file"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(SqliteStore::open(path)?)
}

fn side_file(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_board::board::domain::NewResume;
    use job_board::board::UserId;

    #[test]
    fn reset_discards_existing_rows() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("board.sqlite3");

        let store = SqliteStore::open(&path).expect("store opens");
        store.ensure_user(UserId(1), None).expect("user saved");
        store
            .insert_resume(NewResume {
                owner: UserId(1),
                title: "Rust Developer".to_string(),
                description: "d".to_string(),
                experience: "e".to_string(),
                attachment: None,
            })
            .expect("resume saved");
        drop(store);

        let store = reset_database(&path).expect("reset works");
        assert!(store.user(UserId(1)).expect("lookup works").is_none());
        assert!(store
            .resumes_by_owner(UserId(1))
            .expect("listing works")
            .is_empty());
    }

    #[test]
    fn reset_creates_a_missing_database() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fresh.sqlite3");

        reset_database(&path).expect("reset works");
        assert!(path.exists());
    }
}
