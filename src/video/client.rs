use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A video as listed by trending, search and category feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: String,
    pub thumbnail_url: String,
}

/// A single video with statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: String,
    pub thumbnail_url: String,
    pub view_count: String,
    pub like_count: String,
    pub duration: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    Relevance,
    ViewCount,
}

impl SearchOrder {
    fn as_param(self) -> &'static str {
        match self {
            SearchOrder::Relevance => "relevance",
            SearchOrder::ViewCount => "viewCount",
        }
    }
}

/// Video-platform search API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoClient: Send + Sync {
    async fn trending(&self) -> Result<Vec<VideoSummary>, AppError>;

    async fn search(&self, query: &str, order: SearchOrder) -> Result<Vec<VideoSummary>, AppError>;

    /// `Ok(None)` when the platform knows no video with this id.
    async fn details(&self, video_id: &str) -> Result<Option<VideoDetails>, AppError>;
}

const MAX_RESULTS: &str = "20";
const REGION_CODE: &str = "US";

/// VideoClient for the YouTube Data API v3.
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemId {
    Plain(String),
    Search {
        #[serde(rename = "videoId")]
        video_id: String,
    },
}

impl ItemId {
    fn into_string(self) -> String {
        match self {
            ItemId::Plain(id) => id,
            ItemId::Search { video_id } => video_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    id: ItemId,
    snippet: Snippet,
    #[serde(default)]
    statistics: Option<Statistics>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default)]
    view_count: String,
    #[serde(default)]
    like_count: String,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl Item {
    fn thumbnail_url(&self) -> String {
        self.snippet
            .thumbnails
            .high
            .as_ref()
            .or(self.snippet.thumbnails.medium.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }

    fn into_summary(self) -> VideoSummary {
        let thumbnail_url = self.thumbnail_url();
        VideoSummary {
            id: self.id.into_string(),
            title: self.snippet.title,
            description: self.snippet.description,
            channel_title: self.snippet.channel_title,
            published_at: self.snippet.published_at,
            thumbnail_url,
        }
    }

    fn into_details(self) -> VideoDetails {
        let thumbnail_url = self.thumbnail_url();
        let statistics = self.statistics.unwrap_or_default();
        let content_details = self.content_details.unwrap_or_default();
        VideoDetails {
            id: self.id.into_string(),
            title: self.snippet.title,
            description: self.snippet.description,
            channel_title: self.snippet.channel_title,
            published_at: self.snippet.published_at,
            thumbnail_url,
            view_count: statistics.view_count,
            like_count: statistics.like_count,
            duration: content_details.duration,
        }
    }
}

impl YouTubeClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    async fn list(&self, resource: &str, params: &[(&str, &str)]) -> Result<ListResponse, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Upstream("YouTube API key is not configured".into()))?;

        let response = self
            .http
            .get(format!("{}/{}", self.base_url, resource))
            .query(params)
            .query(&[("key", api_key)])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("YouTube request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("YouTube API error: {}", status.as_u16()));
            return Err(AppError::Upstream(message));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid YouTube response: {e}")))
    }
}

#[async_trait]
impl VideoClient for YouTubeClient {
    async fn trending(&self) -> Result<Vec<VideoSummary>, AppError> {
        let response = self
            .list(
                "videos",
                &[
                    ("part", "snippet"),
                    ("chart", "mostPopular"),
                    ("maxResults", MAX_RESULTS),
                    ("regionCode", REGION_CODE),
                ],
            )
            .await?;
        Ok(response.items.into_iter().map(Item::into_summary).collect())
    }

    async fn search(&self, query: &str, order: SearchOrder) -> Result<Vec<VideoSummary>, AppError> {
        let response = self
            .list(
                "search",
                &[
                    ("part", "snippet"),
                    ("maxResults", MAX_RESULTS),
                    ("q", query),
                    ("type", "video"),
                    ("order", order.as_param()),
                ],
            )
            .await?;
        Ok(response.items.into_iter().map(Item::into_summary).collect())
    }

    async fn details(&self, video_id: &str) -> Result<Option<VideoDetails>, AppError> {
        let response = self
            .list(
                "videos",
                &[("part", "snippet,statistics,contentDetails"), ("id", video_id)],
            )
            .await?;
        Ok(response.items.into_iter().next().map(Item::into_details))
    }
}

/// What a category feed asks the platform for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFeed {
    Trending,
    Search(&'static str),
}

pub fn category_feed(category: &str) -> CategoryFeed {
    match category {
        "all" | "trending" => CategoryFeed::Trending,
        "music" => CategoryFeed::Search("music hits 2024"),
        "gaming" => CategoryFeed::Search("gaming highlights"),
        "education" => CategoryFeed::Search("educational videos"),
        "technology" => CategoryFeed::Search("tech news latest"),
        "entertainment" => CategoryFeed::Search("entertainment news"),
        "sports" => CategoryFeed::Search("sports highlights"),
        "news" => CategoryFeed::Search("breaking news today"),
        "live" => CategoryFeed::Search("live streaming"),
        "ai" => CategoryFeed::Search("artificial intelligence"),
        _ => CategoryFeed::Search("trending videos"),
    }
}

// (id, title, description, channel, published_at)
const FALLBACK_VIDEOS: [(&str, &str, &str, &str, &str); 5] = [
    (
        "dQw4w9WgXcQ",
        "Rick Astley - Never Gonna Give You Up (Official Music Video)",
        "The official music video for \"Never Gonna Give You Up\" by Rick Astley",
        "Rick Astley",
        "2009-10-25T06:57:33Z",
    ),
    (
        "9bZkp7q19f0",
        "PSY - GANGNAM STYLE(강남스타일) M/V",
        "PSY - GANGNAM STYLE(강남스타일) M/V",
        "officialpsy",
        "2012-07-15T07:46:32Z",
    ),
    (
        "kJQP7kiw5Fk",
        "Luis Fonsi - Despacito ft. Daddy Yankee",
        "Luis Fonsi - Despacito ft. Daddy Yankee",
        "Luis Fonsi",
        "2017-01-13T04:20:06Z",
    ),
    (
        "ZZ5LpwO-An4",
        "Baby Shark Dance | Sing and Dance! | Animal Songs | PINKFONG Songs for Children",
        "Baby Shark Dance | Sing and Dance! | Animal Songs | PINKFONG Songs for Children",
        "Pinkfong Baby Shark - Kids' Songs & Stories",
        "2016-06-17T16:00:00Z",
    ),
    (
        "y6120QOlsfU",
        "Sandstorm - Darude",
        "Sandstorm - Darude",
        "Darude",
        "2009-03-31T15:35:38Z",
    ),
];

/// The fixed list served whenever the platform cannot be reached.
pub fn fallback_videos() -> Vec<VideoSummary> {
    FALLBACK_VIDEOS
        .iter()
        .map(|(id, title, description, channel, published_at)| VideoSummary {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            channel_title: channel.to_string(),
            published_at: published_at.to_string(),
            thumbnail_url: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
        })
        .collect()
}

/// Fallback videos whose title or channel contains `query`, case-insensitively.
pub fn search_fallback(query: &str) -> Vec<VideoSummary> {
    let needle = query.to_lowercase();
    fallback_videos()
        .into_iter()
        .filter(|v| {
            v.title.to_lowercase().contains(&needle) || v.channel_title.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn fallback_details(video_id: &str) -> Option<VideoDetails> {
    fallback_videos()
        .into_iter()
        .find(|v| v.id == video_id)
        .map(|v| VideoDetails {
            id: v.id,
            title: v.title,
            description: v.description,
            channel_title: v.channel_title,
            published_at: v.published_at,
            thumbnail_url: v.thumbnail_url,
            view_count: "1000000".into(),
            like_count: "50000".into(),
            duration: "PT3M30S".into(),
        })
}
