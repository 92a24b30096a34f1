use serde::{Deserialize, Serialize};

/// A pre-recorded clone video played over a random background.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneInteraction {
    /// Scene item enabled inside `Facecam Background`; also receives the
    /// `Fade Out` filter when the interaction ends.
    pub scene_name: String,
    pub clone_source_name: String,
    pub bg_image_source_name: String,
    pub backgrounds: Vec<String>,
    pub finite: Vec<CloneInstance>,
    pub roscodes: Vec<CloneInstance>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloneInstance {
    pub file_path: String,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step_type", rename_all = "snake_case")]
pub enum Step {
    Blur {
        start_ms: u64,
        blur: f64,
        duration_ms: u64,
    },
    End {
        end_ms: u64,
    },
}

/// Who is on camera; decides which instance pool plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Streamer {
    #[default]
    FiniteSingularity,
    Roscodes,
}

impl CloneInteraction {
    pub fn instances(&self, streamer: Streamer) -> &[CloneInstance] {
        match streamer {
            Streamer::FiniteSingularity => &self.finite,
            Streamer::Roscodes => &self.roscodes,
        }
    }
}

impl CloneInstance {
    /// When the interaction is over: the `end` step, or the moment the last
    /// blur finishes when there is none.
    pub fn end_ms(&self) -> u64 {
        self.steps
            .iter()
            .find_map(|step| match step {
                Step::End { end_ms } => Some(*end_ms),
                Step::Blur { .. } => None,
            })
            .unwrap_or_else(|| {
                self.steps
                    .iter()
                    .map(|step| match step {
                        Step::Blur {
                            start_ms,
                            duration_ms,
                            ..
                        } => start_ms + duration_ms,
                        Step::End { end_ms } => *end_ms,
                    })
                    .max()
                    .unwrap_or(0)
            })
    }
}
