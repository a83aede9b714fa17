//! Procedure server over stdin/stdout
//!
//! Reads one JSON request per line from stdin and writes one JSON response per
//! line to stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! echo '{"id":1,"method":"franchise.list","params":{}}' | cargo run --bin completionist-stdio
//! ```
//!
//! Configuration comes from `COMPLETIONIST_DB_PATH`,
//! `COMPLETIONIST_BUSY_TIMEOUT_MS` and `COMPLETIONIST_LOG`.

use completionist_core::config::CoreConfig;
use completionist_core::db::{DatabaseService, RecordStore, TursoStore};
use completionist_core::logging::init_logging;
use completionist_core::procedures::{run_stdio, ProcedureRouter};
use completionist_core::services::CoreServices;
use std::sync::Arc;
use tokio::io::{stdin, stdout, BufReader, BufWriter};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CoreConfig::from_env()?;
    init_logging(&config.log_filter);

    info!(path = %config.database_path.display(), "opening database");
    let db = Arc::new(DatabaseService::from_config(&config).await?);
    let store: Arc<dyn RecordStore> = Arc::new(TursoStore::new(db));
    let router = ProcedureRouter::new(CoreServices::new(store));

    run_stdio(&router, BufReader::new(stdin()), BufWriter::new(stdout())).await
}
