use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        pagination::{DateRangeQuery, ListResponse, PaginationQuery},
        podcast::{Podcast, PodcastFilter, SubtitleQuery, SubtitleResponse},
    },
    repositories::PodcastRepository,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct PodcastService {
    podcasts: Arc<dyn PodcastRepository>,
    default_page_size: u32,
    max_page_size: u32,
}

impl PodcastService {
    pub fn new(podcasts: Arc<dyn PodcastRepository>, config: &Config) -> Self {
        Self {
            podcasts,
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    pub async fn get_all_podcasts(&self, query: &PaginationQuery) -> Result<ListResponse<Podcast>> {
        let page = query.resolve(self.default_page_size, self.max_page_size)?;
        debug!("Getting all podcasts: {:?}", page);

        let result = self.podcasts.find_and_count(&PodcastFilter::default(), page).await?;
        Ok(ListResponse::from_page(result, page))
    }

    pub async fn get_podcasts_between_dates(&self, query: &DateRangeQuery) -> Result<ListResponse<Podcast>> {
        let range = query.range()?;
        let page = query
            .pagination
            .resolve(self.default_page_size, self.max_page_size)?;
        debug!("Getting podcasts between {} and {}", range.start(), range.end());

        let filter = PodcastFilter {
            date_range: Some(range),
        };
        let result = self.podcasts.find_and_count(&filter, page).await?;
        Ok(ListResponse::from_page(result, page))
    }

    /// 无法解析为 UUID 的 id 按不存在处理
    pub async fn get_podcast_by_id(&self, id: &str) -> Result<Podcast> {
        debug!("Getting podcast by id: {}", id);

        let Ok(id) = Uuid::parse_str(id.trim()) else {
            return Err(AppError::not_found("Podcast"));
        };
        self.podcasts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Podcast"))
    }

    /// 指定时间点正在播放的字幕片段，不在任何片段内时为空
    ///
    /// 只取决于时间点本身，不受音频时长影响。
    pub async fn get_subtitle_at(&self, id: &str, query: &SubtitleQuery) -> Result<SubtitleResponse> {
        if !query.t.is_finite() || query.t < 0.0 {
            return Err(AppError::validation("t must be a non-negative number of seconds"));
        }

        let podcast = self.get_podcast_by_id(id).await?;
        debug!("Subtitle lookup at {}s ({:?} voice)", query.t, query.voice);

        Ok(match podcast.timestamp_script.active_segment(query.t) {
            Some((index, segment)) => SubtitleResponse {
                index: Some(index),
                segment: Some(segment.clone()),
            },
            None => SubtitleResponse { index: None, segment: None },
        })
    }
}
