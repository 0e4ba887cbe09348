use crate::{
    error::Result,
    models::{
        pagination::{PageRequest, Paginated},
        podcast::{Podcast, PodcastFilter, PodcastRow},
    },
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

/// 播客表由音频生成服务写入，表名带引号区分大小写
const PODCAST_TABLE: &str = r#"public."Podcast""#;

const PODCAST_COLUMNS: &str =
    "podcast_id, title, publish_date, script, timestamp_script, audio_url, length_seconds, links";

#[async_trait]
pub trait PodcastRepository: Send + Sync {
    async fn find_and_count(&self, filter: &PodcastFilter, page: PageRequest) -> Result<Paginated<Podcast>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Podcast>>;
}

#[derive(Clone)]
pub struct PgPodcastRepository {
    pool: PgPool,
}

impl PgPodcastRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PodcastFilter) {
    if let Some(range) = &filter.date_range {
        qb.push(" WHERE publish_date >= ")
            .push_bind(range.start())
            .push(" AND publish_date <= ")
            .push_bind(range.end());
    }
}

pub(crate) fn build_list_query(filter: &PodcastFilter, page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", PODCAST_COLUMNS, PODCAST_TABLE));
    push_filter(&mut qb, filter);
    // 没有发布日期的节目排在最后
    qb.push(" ORDER BY publish_date DESC NULLS LAST");
    qb.push(" LIMIT ").push_bind(page.limit());
    qb.push(" OFFSET ").push_bind(page.offset());
    qb
}

#[async_trait]
impl PodcastRepository for PgPodcastRepository {
    async fn find_and_count(&self, filter: &PodcastFilter, page: PageRequest) -> Result<Paginated<Podcast>> {
        debug!("Querying podcasts: filter={:?} page={:?}", filter, page);

        let rows = build_list_query(filter, page)
            .build_query_as::<PodcastRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_query = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", PODCAST_TABLE));
        push_filter(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(Paginated {
            rows: rows.into_iter().map(Podcast::from).collect(),
            count,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Podcast>> {
        let sql = format!("SELECT {} FROM {} WHERE podcast_id = $1", PODCAST_COLUMNS, PODCAST_TABLE);
        let row = sqlx::query_as::<_, PodcastRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Podcast::from))
    }
}
