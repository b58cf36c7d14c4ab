//! Ingestion pipeline
//!
//! Each file runs as its own tokio task through
//! `Queued → Validating → Transforming → Uploading → Persisting → Indexing → Completed`,
//! with at most `concurrency_limit` jobs past `Queued` at once. The batch
//! result carries one outcome per submitted file, in input order.

mod job;

pub use job::{ResumeLocation, UploadJob};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetflow_core::{
    AssetKind, AssetRecord, BatchResult, ErrorMetadata, FailedItem, JobReport, JobState,
    TransformStrategy,
};
use assetflow_infra::retry_transient;
use assetflow_processing::transform;
use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::context::PipelineContext;
use crate::error::{IngestError, PersistError};
use crate::upload::UploadRequest;

/// Where the bytes of an item come from. Paths are read lazily, once the job
/// has passed validation.
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Bytes),
    Path(PathBuf),
}

impl FileSource {
    async fn read(&self) -> std::io::Result<Bytes> {
        match self {
            FileSource::Memory(data) => Ok(data.clone()),
            FileSource::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }
}

/// One file submitted for ingestion
#[derive(Debug, Clone)]
pub struct IngestItem {
    pub file_name: String,
    pub declared_size: u64,
    pub mime_type: String,
    pub category: String,
    pub source: FileSource,
}

impl IngestItem {
    pub fn from_bytes(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        category: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            file_name: file_name.into(),
            declared_size: data.len() as u64,
            mime_type: mime_type.into(),
            category: category.into(),
            source: FileSource::Memory(data),
        }
    }

    /// Size comes from file metadata; the mime type is guessed from the
    /// extension unless given.
    pub async fn from_path(
        path: impl AsRef<Path>,
        mime_type: Option<String>,
        category: impl Into<String>,
    ) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let mime_type = mime_type.unwrap_or_else(|| guess_mime_type(path).to_string());

        Ok(Self {
            file_name,
            declared_size: metadata.len(),
            mime_type,
            category: category.into(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }
}

/// Mime type for common extensions; `application/octet-stream` otherwise.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

enum JobOutcome {
    Completed(Box<AssetRecord>, JobReport),
    Failed(FailedItem, JobReport),
    Skipped(String),
}

#[derive(Clone)]
pub struct IngestionPipeline {
    ctx: Arc<PipelineContext>,
}

impl IngestionPipeline {
    pub fn new(ctx: Arc<PipelineContext>) -> Self {
        Self { ctx }
    }

    pub async fn ingest(&self, batch: Vec<IngestItem>) -> BatchResult {
        self.ingest_with_cancel(batch, CancellationToken::new()).await
    }

    /// Run a batch. Jobs still waiting in `Queued` when `cancel` fires are
    /// skipped; jobs already running finish.
    #[tracing::instrument(skip(self, batch, cancel), fields(files = batch.len()))]
    pub async fn ingest_with_cancel(
        &self,
        batch: Vec<IngestItem>,
        cancel: CancellationToken,
    ) -> BatchResult {
        let names: Vec<String> = batch.iter().map(|i| i.file_name.clone()).collect();
        let semaphore = Arc::new(Semaphore::new(self.ctx.config.concurrency_limit.max(1)));
        let mut tasks = JoinSet::new();

        for (position, item) in batch.into_iter().enumerate() {
            let ctx = Arc::clone(&self.ctx);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };
                let outcome = match permit {
                    Some(_permit) if !cancel.is_cancelled() => run_job(&ctx, item).await,
                    _ => {
                        tracing::info!(file = %item.file_name, "Batch cancelled, skipping job");
                        JobOutcome::Skipped(item.file_name)
                    }
                };
                (position, outcome)
            });
        }

        let mut outcomes: Vec<Option<JobOutcome>> = names.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, outcome)) => outcomes[position] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "Ingestion task panicked"),
            }
        }

        let mut result = BatchResult::default();
        for (name, outcome) in names.into_iter().zip(outcomes) {
            match outcome {
                Some(JobOutcome::Completed(record, report)) => {
                    result.succeeded.push(*record);
                    result.jobs.push(report);
                }
                Some(JobOutcome::Failed(item, report)) => {
                    result.failed.push(item);
                    result.jobs.push(report);
                }
                Some(JobOutcome::Skipped(name)) => result.skipped.push(name),
                None => {
                    let err = IngestError::Aborted("task panicked".to_string());
                    result.failed.push(FailedItem {
                        file_name: name,
                        stage: JobState::Queued,
                        error: err.kind().to_string(),
                        code: err.error_code().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            skipped = result.skipped.len(),
            "Batch finished"
        );
        result
    }
}

#[tracing::instrument(skip(ctx, item), fields(file = %item.file_name, category = %item.category))]
async fn run_job(ctx: &PipelineContext, item: IngestItem) -> JobOutcome {
    let mut job = UploadJob::new(&item.file_name);

    match drive(ctx, &item, &mut job).await {
        Ok(record) => {
            tracing::info!(
                asset_id = %record.id,
                key = %record.storage_key,
                size_bytes = record.size_bytes,
                upload_attempts = job.attempt,
                index_pending = job.index_pending,
                "Asset ingested"
            );
            JobOutcome::Completed(Box::new(record), job.report())
        }
        Err(e) => {
            let stage = job.fail(&e);
            assetflow_core::error::log_error(&e, &format!("{} failed at {}", item.file_name, stage));
            let failed = FailedItem {
                file_name: item.file_name.clone(),
                stage,
                error: e.kind().to_string(),
                code: e.error_code().to_string(),
                message: e.to_string(),
            };
            JobOutcome::Failed(failed, job.report())
        }
    }
}

async fn drive(
    ctx: &PipelineContext,
    item: &IngestItem,
    job: &mut UploadJob,
) -> Result<AssetRecord, IngestError> {
    job.transition(JobState::Validating)?;
    let kind = ctx
        .validator
        .validate_all(&item.category, item.declared_size, &item.mime_type)?;
    let strategy = TransformStrategy::for_mime(&item.mime_type);
    job.kind = Some(kind);
    job.strategy = Some(strategy);

    job.transition(JobState::Transforming)?;
    let data = item.source.read().await?;
    let prepared = transform(strategy, data, &item.mime_type, &ctx.transform_settings).await?;

    job.transition(JobState::Uploading)?;
    let request = UploadRequest {
        category: item.category.clone(),
        original_name: item.file_name.clone(),
        uploaded_at: job.uploaded_at,
        data: prepared.data,
        content_type: prepared.content_type.clone(),
        stored_extension: prepared.reencoded.then_some("jpg"),
        thumbnail: prepared.thumbnail,
    };
    let uploaded = match ctx.uploader.upload(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            job.attempt = e.attempts();
            return Err(e.into());
        }
    };
    job.attempt = uploaded.attempts;
    job.resume_location = Some(ResumeLocation {
        primary: uploaded.location,
        thumbnail: uploaded.thumbnail,
    });

    job.transition(JobState::Persisting)?;
    let record = build_record(job, item, kind, &request, prepared.width, prepared.height)?;
    // Held through indexing so the index follows store commit order.
    let writer = ctx.metadata.writer().await;
    let (committed, attempts) = retry_transient(
        &ctx.policy,
        "persist",
        |_| writer.put(&record),
        PersistError::is_transient,
    )
    .await;
    job.persist_attempts = attempts;
    if let Err(source) = committed {
        drop(writer);
        discard_uploads(ctx, job).await;
        return Err(IngestError::Persist { attempts, source });
    }

    job.transition(JobState::Indexing)?;
    if let Err(first) = ctx.index.index(&record).await {
        tracing::debug!(asset_id = %record.id, error = %first, "Index update failed, retrying once");
        if let Err(e) = ctx.index.index(&record).await {
            tracing::warn!(asset_id = %record.id, error = %e, "Indexing failed; queued for reconciliation");
            ctx.reconcile.push(record.id);
            job.index_pending = true;
        }
    }
    drop(writer);
    ctx.analytics.record(&record).await;

    job.transition(JobState::Completed)?;
    Ok(record)
}

fn build_record(
    job: &UploadJob,
    item: &IngestItem,
    kind: AssetKind,
    request: &UploadRequest,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<AssetRecord, IngestError> {
    let resume = job
        .resume_location
        .as_ref()
        .ok_or_else(|| IngestError::Aborted("no uploaded object to persist".to_string()))?;

    Ok(AssetRecord {
        id: job.asset_id,
        category: item.category.clone(),
        original_name: item.file_name.clone(),
        size_bytes: item.declared_size,
        mime_type: assetflow_core::models::normalize_mime(&item.mime_type),
        kind,
        storage_key: resume.primary.key.clone(),
        storage_url: resume.primary.url.clone(),
        etag: resume.primary.etag.clone(),
        stored_content_type: request.content_type.clone(),
        stored_size_bytes: request.data.len() as u64,
        width,
        height,
        thumbnail: resume.thumbnail.clone(),
        uploaded_at: job.uploaded_at,
        is_featured: false,
        sort_order: 0,
        tags: Default::default(),
    })
}

async fn discard_uploads(ctx: &PipelineContext, job: &UploadJob) {
    let Some(resume) = &job.resume_location else {
        return;
    };
    ctx.uploader.delete_best_effort(&resume.primary.key).await;
    if let Some(thumb) = &resume.thumbnail {
        ctx.uploader.delete_best_effort(&thumb.key).await;
    }
}
