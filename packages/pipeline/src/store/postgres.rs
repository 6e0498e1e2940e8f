use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use regwatch_harvester::{NaturalKey, RegulationRecord, Relation, RelationKind};

use super::{JobStore, RegulationStore};
use crate::error::{PipelineError, Result};
use crate::models::{CrawlJob, JobErrorEntry, JobUpdate, NewCrawlJob, StoredArtifacts};

/// PostgreSQL-backed regulation and job store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RegulationStore for PgStore {
    #[tracing::instrument(skip(self), fields(jenis = %key.jenis, nomor = %key.nomor, tahun = key.tahun))]
    async fn exists_by_natural_key(&self, key: &NaturalKey) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM regulations_metadata
                WHERE jenis = $1 AND nomor = $2 AND tahun = $3
            )
            "#,
        )
        .bind(&key.jenis)
        .bind(&key.nomor)
        .bind(key.tahun)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self, record, artifacts), fields(url = %record.detail_url))]
    async fn insert_regulation(
        &self,
        record: &RegulationRecord,
        artifacts: &StoredArtifacts,
    ) -> Result<Uuid> {
        let key = record.natural_key().ok_or_else(|| {
            PipelineError::InvalidInput("Missing required fields (jenis, nomor, or tahun)".into())
        })?;

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO regulations_metadata (
                bpk_detail_url, jenis, nomor, tahun, judul, tentang, status_raw, status,
                issuer, penetapan_date, pengundangan_date, berlaku_date, lokasi, bidang,
                ln, tln, pdf_url, pdf_storage_path, txt_storage_path, pdf_sha256
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8,
                $9, $10::date, $11::date, $12::date, $13, $14,
                $15, $16, $17, $18, $19, $20
            )
            RETURNING id
            "#,
        )
        .bind(&record.detail_url)
        .bind(&key.jenis)
        .bind(&key.nomor)
        .bind(key.tahun)
        .bind(&record.judul)
        .bind(&record.tentang)
        .bind(&record.status_raw)
        .bind(record.status.map(|s| s.as_str()))
        .bind(&record.issuer)
        .bind(&record.penetapan_date)
        .bind(&record.pengundangan_date)
        .bind(&record.berlaku_date)
        .bind(&record.lokasi)
        .bind(&record.bidang)
        .bind(&record.ln)
        .bind(&record.tln)
        .bind(&record.pdf_url)
        .bind(&artifacts.pdf_path)
        .bind(&artifacts.txt_path)
        .bind(&artifacts.pdf_sha256)
        .fetch_one(&mut *tx)
        .await?;

        for (kind, relation) in record.relations.iter() {
            insert_relation(&mut tx, id, kind, relation).await?;
        }

        // dropping an uncommitted transaction rolls it back
        tx.commit().await?;

        tracing::info!(regulation_id = %id, %key, relations = record.relations.len(), "regulation stored");
        Ok(id)
    }
}

async fn insert_relation(
    tx: &mut Transaction<'_, Postgres>,
    regulation_id: Uuid,
    kind: RelationKind,
    relation: &Relation,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO regulation_relations
            (regulation_id, relation_type, related_regulation_text, related_regulation_url)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(regulation_id)
    .bind(kind.as_str())
    .bind(&relation.text)
    .bind(&relation.url)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl JobStore for PgStore {
    #[tracing::instrument(skip(self, job), fields(created_by = %job.created_by))]
    async fn create_job(&self, job: NewCrawlJob) -> Result<CrawlJob> {
        let total_items = job.total_items();
        let created = sqlx::query_as::<_, CrawlJob>(
            r#"
            INSERT INTO crawl_jobs (status, parameters, total_items, created_by)
            VALUES ('pending', $1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Json(&job.parameters))
        .bind(total_items)
        .bind(&job.created_by)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(job_id = %created.id, "crawl job created");
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<CrawlJob> {
        sqlx::query_as::<_, CrawlJob>(
            r#"
            UPDATE crawl_jobs
            SET status = COALESCE($2, status),
                items_crawled = COALESCE($3, items_crawled),
                items_skipped = COALESCE($4, items_skipped),
                started_at = COALESCE($5, started_at),
                completed_at = COALESCE($6, completed_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.status)
        .bind(update.items_crawled)
        .bind(update.items_skipped)
        .bind(update.started_at)
        .bind(update.completed_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PipelineError::JobNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    async fn append_job_error(&self, id: Uuid, message: &str, url: Option<&str>) -> Result<()> {
        let entry = JobErrorEntry {
            timestamp: Utc::now(),
            message: message.to_string(),
            url: url.map(String::from),
        };

        let result = sqlx::query(
            r#"
            UPDATE crawl_jobs
            SET error_log = error_log || jsonb_build_array($2::jsonb)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(&entry))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PipelineError::JobNotFound(id));
        }
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<CrawlJob> {
        sqlx::query_as::<_, CrawlJob>(r#"SELECT * FROM crawl_jobs WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PipelineError::JobNotFound(id))
    }

    async fn list_jobs(&self, page: u32, limit: u32) -> Result<Vec<CrawlJob>> {
        let limit = i64::from(limit.max(1));
        let offset = i64::from(page.max(1) - 1) * limit;

        let jobs = sqlx::query_as::<_, CrawlJob>(
            r#"
            SELECT * FROM crawl_jobs
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }
}
