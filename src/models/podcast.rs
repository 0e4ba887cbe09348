use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Voice {
    #[serde(rename = "male_voice")]
    Male,
    #[default]
    #[serde(rename = "female_voice")]
    Female,
}

/// 按声音区分的取值 (`male_voice` / `female_voice`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerVoice<T> {
    pub male_voice: T,
    pub female_voice: T,
}

impl<T> PerVoice<T> {
    pub fn get(&self, voice: Voice) -> &T {
        match voice {
            Voice::Male => &self.male_voice,
            Voice::Female => &self.female_voice,
        }
    }
}

/// 字幕片段，区间为 `[start_time, end_time)`，单位秒
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampSegment {
    #[serde(alias = "start")]
    pub start_time: f64,
    #[serde(alias = "end")]
    pub end_time: f64,
    pub text: String,
}

impl TimestampSegment {
    pub fn contains(&self, at: f64) -> bool {
        self.start_time <= at && at < self.end_time
    }
}

/// 按时间排序的字幕脚本
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampScript(pub Vec<TimestampSegment>);

impl TimestampScript {
    /// 第一个包含 `at` 的片段下标
    pub fn active_index(&self, at: f64) -> Option<usize> {
        self.0.iter().position(|segment| segment.contains(at))
    }

    pub fn active_segment(&self, at: f64) -> Option<(usize, &TimestampSegment)> {
        self.active_index(at).map(|index| (index, &self.0[index]))
    }

    pub fn segments(&self) -> &[TimestampSegment] {
        &self.0
    }
}

/// `public."Podcast"` 表中的一行
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PodcastRow {
    pub podcast_id: Uuid,
    pub title: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub script: String,
    pub timestamp_script: Json<TimestampScript>,
    pub audio_url: Json<PerVoice<String>>,
    pub length_seconds: Option<Json<PerVoice<f64>>>,
    pub links: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    pub podcast_id: Uuid,
    pub title: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub script: String,
    pub timestamp_script: TimestampScript,
    pub audio_url: PerVoice<String>,
    pub length_seconds: Option<PerVoice<f64>>,
    pub links: Vec<String>,
}

impl From<PodcastRow> for Podcast {
    fn from(row: PodcastRow) -> Self {
        Self {
            podcast_id: row.podcast_id,
            title: row.title,
            publish_date: row.publish_date,
            script: row.script,
            timestamp_script: row.timestamp_script.0,
            audio_url: row.audio_url.0,
            length_seconds: row.length_seconds.map(|lengths| lengths.0),
            links: row.links.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PodcastFilter {
    pub date_range: Option<crate::models::pagination::DateRange>,
}

impl PodcastFilter {
    /// 没有发布日期的节目不会落入任何日期范围
    #[cfg(test)]
    pub fn matches(&self, podcast: &Podcast) -> bool {
        match (&self.date_range, podcast.publish_date) {
            (Some(range), Some(at)) => range.contains(at),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleQuery {
    pub t: f64,
    #[serde(default)]
    pub voice: Voice,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubtitleResponse {
    pub index: Option<usize>,
    pub segment: Option<TimestampSegment>,
}
