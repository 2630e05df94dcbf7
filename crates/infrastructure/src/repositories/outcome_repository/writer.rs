use super::helpers::TIMESTAMP_FORMAT;
use compact_str::{format_compact, CompactString};
use ferrous_analytics_domain::OutcomeRecord;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

const COLS_PER_ROW: usize = 8;
const ROWS_PER_CHUNK: usize = 999 / COLS_PER_ROW;

pub(super) struct OutcomeEntry {
    created_at: CompactString,
    path: Arc<str>,
    client: Arc<str>,
    node: Option<Arc<str>>,
    status_code: Option<i64>,
    latency_ms: Option<i64>,
    is_error: bool,
    error_message: Option<Arc<str>>,
}

pub(super) enum WriterMessage {
    Entry(OutcomeEntry),
    /// Writes everything queued so far, then acknowledges.
    Flush(oneshot::Sender<()>),
}

impl OutcomeEntry {
    pub fn from_record(r: &OutcomeRecord) -> Self {
        Self {
            created_at: format_compact!("{}", r.timestamp.format(TIMESTAMP_FORMAT)),
            path: Arc::clone(&r.path),
            client: Arc::clone(&r.client),
            node: r.node.clone(),
            status_code: r.status_code.map(i64::from),
            latency_ms: r.latency_ms.and_then(|l| i64::try_from(l).ok()),
            is_error: r.is_error,
            error_message: r.error_message.clone(),
        }
    }
}

fn build_multi_insert_sql(n: usize) -> String {
    debug_assert!(n > 0 && n <= ROWS_PER_CHUNK);
    const HEADER: &str = "INSERT INTO outcome_log \
        (created_at, path, client, node, status_code, latency_ms, is_error, error_message) \
        VALUES ";
    const PLACEHOLDER: &str = "(?,?,?,?,?,?,?,?)";
    let mut sql = String::with_capacity(HEADER.len() + n * (PLACEHOLDER.len() + 1));
    sql.push_str(HEADER);
    for i in 0..n {
        if i > 0 {
            sql.push(',');
        }
        sql.push_str(PLACEHOLDER);
    }
    sql
}

pub(super) async fn flush_loop(
    pool: SqlitePool,
    mut receiver: mpsc::Receiver<WriterMessage>,
    max_batch_size: usize,
    flush_interval_ms: u64,
) {
    let mut batch: Vec<OutcomeEntry> = Vec::with_capacity(max_batch_size);
    let mut flush_interval = tokio::time::interval(Duration::from_millis(flush_interval_ms));

    loop {
        tokio::select! {
            maybe_message = receiver.recv() => {
                match maybe_message {
                    Some(WriterMessage::Entry(entry)) => {
                        batch.push(entry);
                        while batch.len() < max_batch_size {
                            match receiver.try_recv() {
                                Ok(WriterMessage::Entry(e)) => batch.push(e),
                                Ok(WriterMessage::Flush(ack)) => {
                                    flush_batch(&pool, &mut batch).await;
                                    let _ = ack.send(());
                                }
                                Err(_) => break,
                            }
                        }
                        if batch.len() >= max_batch_size {
                            flush_batch(&pool, &mut batch).await;
                        }
                    }
                    Some(WriterMessage::Flush(ack)) => {
                        flush_batch(&pool, &mut batch).await;
                        let _ = ack.send(());
                    }
                    None => {
                        if !batch.is_empty() { flush_batch(&pool, &mut batch).await; }
                        info!("Outcome log flush task shutting down");
                        return;
                    }
                }
            }
            _ = flush_interval.tick() => {
                if !batch.is_empty() { flush_batch(&pool, &mut batch).await; }
            }
        }
    }
}

async fn flush_batch(pool: &SqlitePool, batch: &mut Vec<OutcomeEntry>) {
    let count = batch.len();
    if count == 0 {
        return;
    }

    let start = std::time::Instant::now();

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            error!(error = %e, count, "Failed to begin transaction for outcome batch");
            batch.clear();
            return;
        }
    };

    let mut inserted = 0usize;
    let mut errors = 0usize;

    for chunk in batch.chunks(ROWS_PER_CHUNK) {
        let sql = build_multi_insert_sql(chunk.len());
        let mut q = sqlx::query(&sql);
        for entry in chunk {
            q = q
                .bind(entry.created_at.as_str())
                .bind(entry.path.as_ref())
                .bind(entry.client.as_ref())
                .bind(entry.node.as_deref())
                .bind(entry.status_code)
                .bind(entry.latency_ms)
                .bind(if entry.is_error { 1i64 } else { 0i64 })
                .bind(entry.error_message.as_deref());
        }
        match q.execute(&mut *tx).await {
            Ok(r) => inserted += r.rows_affected() as usize,
            Err(e) => {
                errors += chunk.len();
                warn!(error = %e, chunk_size = chunk.len(), "Failed to insert outcome chunk");
            }
        }
    }

    match tx.commit().await {
        Ok(_) => {
            let elapsed = start.elapsed();
            debug!(
                count = inserted,
                errors,
                duration_ms = elapsed.as_millis(),
                "Outcome batch flushed"
            );
        }
        Err(e) => {
            error!(error = %e, count, "Failed to commit outcome batch");
        }
    }

    batch.clear();
}
