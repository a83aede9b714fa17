//! Line-delimited JSON transport for the procedure router
//!
//! One request object per input line, one response object per output line.
//! Blank lines are skipped. A line that is not a valid request gets a
//! `PARSE_ERROR` response with a null id; the stream keeps going.

use crate::procedures::router::ProcedureRouter;
use crate::procedures::types::{ProcedureError, ProcedureRequest, ProcedureResponse};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

/// Serve requests from `reader` until EOF, writing responses to `writer`
#[instrument(skip_all)]
pub async fn run_stdio<R, W>(router: &ProcedureRouter, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("procedure stream started");
    let mut lines = reader.lines();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!(line = %line, "request");

        let response = match serde_json::from_str::<ProcedureRequest>(&line) {
            Ok(request) => router.handle(request).await,
            Err(e) => {
                warn!("failed to parse request: {}", e);
                ProcedureResponse::error(
                    Value::Null,
                    ProcedureError::parse_error(format!("Invalid JSON: {}", e)),
                )
            }
        };

        write_response(&mut writer, &response).await?;
        handled += 1;
    }

    info!(handled, "procedure stream closed");
    Ok(())
}

async fn write_response<W>(writer: &mut W, response: &ProcedureResponse) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
