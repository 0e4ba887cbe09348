use crate::{
    error::Result,
    models::{
        pagination::{DateRangeQuery, ListResponse, PaginationQuery},
        podcast::{Podcast, SubtitleQuery, SubtitleResponse},
    },
    state::AppState,
    utils::extract::ApiQuery,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_podcasts))
        .route("/time", get(get_podcasts_between_dates))
        .route("/:id", get(get_podcast))
        .route("/:id/subtitle", get(get_subtitle))
}

/// 获取播客列表
/// GET /podcasts
pub async fn list_podcasts(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PaginationQuery>,
) -> Result<Json<ListResponse<Podcast>>> {
    debug!("Fetching podcasts list with query: {:?}", query);
    let result = app_state.podcast_service.get_all_podcasts(&query).await?;
    Ok(Json(result))
}

/// GET /podcasts/time?startTime=&endTime=
pub async fn get_podcasts_between_dates(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> Result<Json<ListResponse<Podcast>>> {
    let result = app_state.podcast_service.get_podcasts_between_dates(&query).await?;
    Ok(Json(result))
}

/// GET /podcasts/:id
pub async fn get_podcast(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Podcast>> {
    let podcast = app_state.podcast_service.get_podcast_by_id(&id).await?;
    Ok(Json(podcast))
}

/// 当前时间点的字幕
/// GET /podcasts/:id/subtitle?t=&voice=
pub async fn get_subtitle(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<SubtitleQuery>,
) -> Result<Json<SubtitleResponse>> {
    let subtitle = app_state.podcast_service.get_subtitle_at(&id, &query).await?;
    Ok(Json(subtitle))
}

#[cfg(test)]
mod tests {
    use crate::routes::{create_router, test_support::get_json};
    use crate::services::podcast::tests::podcast;
    use crate::state::test_support::TestStateBuilder;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_list_and_detail() {
        let episode = podcast(Some(3));
        let id = episode.podcast_id;
        let state = TestStateBuilder {
            podcasts: vec![podcast(Some(1)), episode, podcast(None)],
            ..Default::default()
        }
        .build();

        let (status, body) = get_json(create_router(state.clone()), "/podcasts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["items"][0]["podcast_id"], id.to_string());

        let (status, body) = get_json(create_router(state), &format!("/podcasts/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["audio_url"]["male_voice"], "https://cdn.example.com/m.mp3");
        assert_eq!(body["timestamp_script"][1]["startTime"], 3.0);
    }

    #[tokio::test]
    async fn test_subtitle_route() {
        let episode = podcast(Some(3));
        let id = episode.podcast_id;
        let state = TestStateBuilder {
            podcasts: vec![episode],
            ..Default::default()
        }
        .build();

        let (status, body) = get_json(
            create_router(state),
            &format!("/podcasts/{}/subtitle?t=1.5&voice=male_voice", id),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["index"], 0);
        assert_eq!(body["segment"]["text"], "Hello");
    }

    #[tokio::test]
    async fn test_subtitle_past_last_segment_is_empty() {
        let episode = podcast(Some(3));
        let id = episode.podcast_id;
        let state = TestStateBuilder {
            podcasts: vec![episode],
            ..Default::default()
        }
        .build();

        let (status, body) =
            get_json(create_router(state), &format!("/podcasts/{}/subtitle?t=50", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["index"].is_null());
        assert!(body["segment"].is_null());
    }

    #[tokio::test]
    async fn test_bad_query_parameters_use_error_body() {
        let episode = podcast(Some(3));
        let id = episode.podcast_id;
        let state = TestStateBuilder {
            podcasts: vec![episode],
            ..Default::default()
        }
        .build();

        let (status, body) = get_json(create_router(state.clone()), "/podcasts/time?endTime=2024-05-09").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = get_json(create_router(state), &format!("/podcasts/{}/subtitle?t=soon", id)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_podcast_is_404() {
        let app = create_router(TestStateBuilder::default().build());
        let (status, _) = get_json(app, "/podcasts/not-a-uuid").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
