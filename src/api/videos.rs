use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::AppError;
use crate::video::client::{
    category_feed, fallback_details, fallback_videos, search_fallback, CategoryFeed, SearchOrder,
    VideoClient, VideoDetails, VideoSummary,
};

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub success: bool,
    pub videos: Vec<VideoSummary>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl VideoListResponse {
    fn live(videos: Vec<VideoSummary>) -> Self {
        Self {
            success: true,
            videos,
            fallback: false,
        }
    }

    fn fallback(videos: Vec<VideoSummary>) -> Self {
        Self {
            success: false,
            videos,
            fallback: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VideoDetailsResponse {
    pub success: bool,
    pub video: VideoDetails,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub async fn trending(videos: &dyn VideoClient) -> VideoListResponse {
    match videos.trending().await {
        Ok(list) => VideoListResponse::live(list),
        Err(e) => {
            tracing::warn!(error = %e, "Trending videos unavailable, using fallback");
            VideoListResponse::fallback(fallback_videos())
        }
    }
}

pub async fn search(videos: &dyn VideoClient, query: &str) -> Result<VideoListResponse, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("Search query is required".into()));
    }

    Ok(match videos.search(query, SearchOrder::Relevance).await {
        Ok(list) => VideoListResponse::live(list),
        Err(e) => {
            tracing::warn!(error = %e, query, "Video search failed, filtering fallback list");
            VideoListResponse::fallback(search_fallback(query))
        }
    })
}

pub async fn category(videos: &dyn VideoClient, category: &str) -> VideoListResponse {
    let phrase = match category_feed(category) {
        CategoryFeed::Trending => return trending(videos).await,
        CategoryFeed::Search(phrase) => phrase,
    };

    match videos.search(phrase, SearchOrder::ViewCount).await {
        Ok(list) => VideoListResponse::live(list),
        Err(e) => {
            tracing::warn!(error = %e, category, "Category feed failed, using fallback");
            VideoListResponse::fallback(fallback_videos())
        }
    }
}

pub async fn details(videos: &dyn VideoClient, video_id: &str) -> Result<VideoDetailsResponse, AppError> {
    let not_found = || AppError::NotFound(format!("Video '{video_id}' not found"));

    match videos.details(video_id).await {
        Ok(Some(video)) => Ok(VideoDetailsResponse {
            success: true,
            video,
            fallback: false,
        }),
        Ok(None) => Err(not_found()),
        Err(e) => {
            tracing::warn!(error = %e, video_id, "Video details unavailable, using fallback");
            fallback_details(video_id)
                .map(|video| VideoDetailsResponse {
                    success: false,
                    video,
                    fallback: true,
                })
                .ok_or_else(not_found)
        }
    }
}

/// Axum handler for `GET /api/videos/trending`.
pub async fn trending_handler(State(state): State<AppState>) -> Json<VideoListResponse> {
    Json(trending(state.videos.as_ref()).await)
}

/// Axum handler for `GET /api/videos/search?q=`.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<VideoListResponse>, AppError> {
    Ok(Json(search(state.videos.as_ref(), &params.q).await?))
}

/// Axum handler for `GET /api/videos/category/{category}`.
pub async fn category_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<VideoListResponse> {
    Json(category(state.videos.as_ref(), &name).await)
}

/// Axum handler for `GET /api/videos/{video_id}`.
pub async fn details_handler(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoDetailsResponse>, AppError> {
    Ok(Json(details(state.videos.as_ref(), &video_id).await?))
}
