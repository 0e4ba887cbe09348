//! 播放器状态机：播放 / 暂停 / 拖动进度、声音切换与字幕高亮。
//!
//! 播放位置只由时间更新事件与显式的拖动、快进快退操作改变。
//! 这是浏览器端播放器的状态模型，服务端路由不驱动它。
#![cfg_attr(not(test), allow(dead_code))]

use crate::models::podcast::{PerVoice, TimestampScript, Voice};

/// 可选的播放速度档位
pub const PLAYBACK_RATES: [f64; 4] = [0.5, 1.0, 1.5, 2.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    /// 拖动进度条中，`resume` 记录拖动前是否在播放
    Seeking { resume: bool },
}

#[derive(Debug, Clone)]
pub struct Player {
    sources: PerVoice<String>,
    voice: Voice,
    length: f64,
    script: TimestampScript,
    position: f64,
    state: PlaybackState,
    active_segment: Option<usize>,
    volume: f64,
    muted: bool,
    playback_rate: f64,
}

impl Player {
    pub fn new(sources: PerVoice<String>, length: f64, script: TimestampScript) -> Self {
        let active_segment = script.active_index(0.0);
        Self {
            sources,
            voice: Voice::default(),
            length: length.max(0.0),
            script,
            position: 0.0,
            state: PlaybackState::Stopped,
            active_segment,
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn voice(&self) -> Voice {
        self.voice
    }

    pub fn current_source(&self) -> &str {
        self.sources.get(self.voice)
    }

    pub fn active_segment(&self) -> Option<usize> {
        self.active_segment
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// 输出到音频元素的音量，静音时为 0，原音量保留
    pub fn effective_volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// 音量滑块，拖到 0 即静音，拖离 0 解除静音
    pub fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.muted = self.volume == 0.0;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// 只接受预设档位
    pub fn set_playback_rate(&mut self, rate: f64) -> bool {
        if !PLAYBACK_RATES.contains(&rate) {
            return false;
        }
        self.playback_rate = rate;
        true
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing)
    }

    pub fn play(&mut self) {
        if let PlaybackState::Stopped = self.state {
            self.state = PlaybackState::Playing;
        }
    }

    pub fn pause(&mut self) {
        if let PlaybackState::Playing = self.state {
            self.state = PlaybackState::Stopped;
        }
    }

    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Stopped => self.play(),
            PlaybackState::Seeking { resume } => {
                self.state = PlaybackState::Seeking { resume: !resume };
            }
        }
    }

    /// 音频元素上报的时间更新
    pub fn on_time_update(&mut self, at: f64) {
        if let PlaybackState::Seeking { .. } = self.state {
            return;
        }
        self.move_to(at);
    }

    pub fn begin_seek(&mut self) {
        let resume = self.is_playing();
        if !matches!(self.state, PlaybackState::Seeking { .. }) {
            self.state = PlaybackState::Seeking { resume };
        }
    }

    pub fn seek(&mut self, at: f64) {
        self.move_to(at);
    }

    pub fn end_seek(&mut self) {
        if let PlaybackState::Seeking { resume } = self.state {
            self.state = if resume {
                PlaybackState::Playing
            } else {
                PlaybackState::Stopped
            };
        }
    }

    pub fn skip(&mut self, delta: f64) {
        self.move_to(self.position + delta);
    }

    /// 点击字幕跳转到该片段并开始播放
    pub fn jump_to_segment(&mut self, index: usize) -> bool {
        let Some(start) = self.script.segments().get(index).map(|segment| segment.start_time) else {
            return false;
        };
        self.move_to(start);
        self.state = PlaybackState::Playing;
        true
    }

    /// 切换声音，保留播放位置、播放/暂停状态、音量与速度
    pub fn select_voice(&mut self, voice: Voice) {
        self.voice = voice;
    }

    pub fn on_ended(&mut self) {
        self.position = self.length;
        self.active_segment = self.script.active_index(self.position);
        self.state = PlaybackState::Stopped;
    }

    fn move_to(&mut self, at: f64) {
        self.position = at.clamp(0.0, self.length);
        self.active_segment = self.script.active_index(self.position);
    }
}
