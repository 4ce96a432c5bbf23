//! SoundCommander（声音控制）

use crate::error::Result;
use std::sync::Arc;
use thymio_driver::ThymioBridge;
use thymio_protocol::ActionRequest;

/// 声音控制器
///
/// 所有操作都是发出即返回，不等待确认。
#[derive(Clone)]
pub struct SoundCommander {
    bridge: Arc<ThymioBridge>,
}

impl SoundCommander {
    pub(crate) fn new(bridge: Arc<ThymioBridge>) -> Self {
        Self { bridge }
    }

    /// 播放系统声音
    pub fn system(&self, sound: f64) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::sound_system(sound))?)
    }

    /// 以 `hz` 播放 `seconds` 秒
    pub fn freq(&self, hz: f64, seconds: f64) -> Result<()> {
        Ok(self
            .bridge
            .send_action(ActionRequest::sound_freq(hz, seconds))?)
    }

    /// 播放 SD 卡上的声音文件
    pub fn play(&self, sound: f64) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::sound_play(sound))?)
    }

    pub fn record(&self, sound: f64) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::sound_record(sound))?)
    }

    pub fn replay(&self, sound: f64) -> Result<()> {
        Ok(self.bridge.send_action(ActionRequest::sound_replay(sound))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use thymio_driver::{BridgeConfig, MockTransport};

    #[test]
    fn test_freq_scales_duration() {
        let transport = MockTransport::new();
        let bridge =
            ThymioBridge::new(Arc::new(transport.clone()), BridgeConfig::default()).unwrap();
        let sound = SoundCommander::new(Arc::new(bridge));

        sound.freq(440.0, 0.5).unwrap();
        sound.system(3.0).unwrap();
        assert!(transport.wait_for_requests(2, Duration::from_secs(2)));

        let paths: Vec<_> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                "/nodes/thymio-II/A_sound_freq/440/30",
                "/nodes/thymio-II/A_sound_system/3"
            ]
        );
    }
}
