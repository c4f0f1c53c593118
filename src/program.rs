use std::collections::BTreeMap;
use std::path::Path;

use crate::{
    envelope::Envelope,
    error::{LumicubeError, LumicubeResult},
};

pub const PROGRAM_VERSION: &str = "seq.v1";

/// One show segment: a scene + preset held for a duration, with an optional
/// crossfade into the next clip and parameter automation envelopes.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    pub name: String,
    pub renderer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preset: String,
    #[serde(rename = "durationS")]
    pub duration_s: f64,
    #[serde(rename = "xFadeS", default, skip_serializing_if = "is_zero")]
    pub xfade_s: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Envelope>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bools: BTreeMap<String, Envelope>,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Program {
    pub version: String,
    #[serde(rename = "loop", default)]
    pub looped: bool,
    #[serde(default)]
    pub seed: i64,
    pub clips: Vec<Clip>,
}

impl Program {
    pub fn from_str(s: &str) -> LumicubeResult<Self> {
        let prog: Program = serde_json::from_str(s)
            .map_err(|e| LumicubeError::invalid_config(format!("program json: {e}")))?;
        prog.validate()?;
        Ok(prog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> LumicubeResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| LumicubeError::io(format!("read '{}': {e}", path.display())))?;
        Self::from_str(&s)
    }

    pub fn validate(&self) -> LumicubeResult<()> {
        if self.clips.is_empty() {
            return Err(LumicubeError::invalid_config("program has no clips"));
        }
        for clip in &self.clips {
            if clip.renderer.trim().is_empty() {
                return Err(LumicubeError::invalid_config(format!(
                    "clip '{}' has an empty renderer name",
                    clip.name
                )));
            }
            if !clip.duration_s.is_finite() || clip.duration_s < 0.0 {
                return Err(LumicubeError::invalid_config(format!(
                    "clip '{}' duration must be finite and >= 0",
                    clip.name
                )));
            }
            if !clip.xfade_s.is_finite() || clip.xfade_s < 0.0 || clip.xfade_s > clip.duration_s {
                return Err(LumicubeError::invalid_config(format!(
                    "clip '{}' crossfade must be within [0, duration]",
                    clip.name
                )));
            }
            for (name, env) in clip.params.iter().chain(clip.bools.iter()) {
                if name.trim().is_empty() {
                    return Err(LumicubeError::invalid_config(format!(
                        "clip '{}' has an envelope with an empty name",
                        clip.name
                    )));
                }
                let mut last = f64::NEG_INFINITY;
                for k in &env.keys {
                    if !k.t.is_finite() || k.t < last {
                        return Err(LumicubeError::invalid_config(format!(
                            "clip '{}' envelope '{}' keys must be sorted by time",
                            clip.name, name
                        )));
                    }
                    last = k.t;
                }
            }
        }
        Ok(())
    }

    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.duration_s).sum()
    }
}
