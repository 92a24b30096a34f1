//! Builders for the OBS request batches behind every overlay effect.
//!
//! Scene, source and filter names are the ones the stream's OBS collection
//! uses.

use crate::{core::obs::ObsRequest, utils::color::Rgb};
use serde_json::{Value, json};

pub const ALERTS_SCENE: &str = "[Output] Alerts";
pub const FACECAM: &str = "Facecam";
pub const FACECAM_BLUR_MASK: &str = "Facecam Blur Mask";
pub const FACECAM_BACKGROUND: &str = "Facecam Background";
pub const FACECAM_KEYED: &str = "Facecam Keyed";
pub const ROSCODES_ITEM: &str = "Roscodes";
pub const COLOR_CHANGE_SOURCE: &str = "Color Change Facecam";

const FACE_SOURCES: &[&str] = &[FACECAM, FACECAM_BLUR_MASK];
const BACKGROUND_SOURCES: &[&str] = &[FACECAM_BACKGROUND];

const BLUR_FILTER: &str = "Blur";
const FOCUS_FILTER: &str = "ChangeFocus";
const FADE_OUT_FILTER: &str = "Fade Out";

/// Blur below this is treated as "off" and the blur filter gets disabled
/// once the transition has run.
const BLUR_OFF_THRESHOLD: f64 = 0.02;
const MIN_BLUR: f64 = 0.01;

pub fn change_scene(scene_name: &str) -> Vec<ObsRequest> {
    vec![ObsRequest::SetCurrentProgramScene {
        scene: scene_name.to_string(),
    }]
}

pub fn toggle_scene_item(scene_name: &str, item_name: &str, enabled: bool) -> Vec<ObsRequest> {
    vec![ObsRequest::SetSceneItemEnabled {
        scene: scene_name.to_string(),
        item: item_name.to_string(),
        enabled,
    }]
}

pub fn set_input_settings(input_name: &str, settings: Value) -> Vec<ObsRequest> {
    vec![ObsRequest::SetInputSettings {
        input: input_name.to_string(),
        settings,
    }]
}

pub fn set_filter_enabled(source_name: &str, filter_name: &str, enabled: bool) -> ObsRequest {
    ObsRequest::SetFilterEnabled {
        source: source_name.to_string(),
        filter: filter_name.to_string(),
        enabled,
    }
}

fn set_filter_settings(source_name: &str, filter_name: &str, settings: Value) -> ObsRequest {
    ObsRequest::SetFilterSettings {
        source: source_name.to_string(),
        filter: filter_name.to_string(),
        settings,
    }
}

pub fn fade_out(source_name: &str) -> Vec<ObsRequest> {
    vec![set_filter_enabled(source_name, FADE_OUT_FILTER, true)]
}

fn focus_settings(source_name: &str, time_ms: u64, blur: f64) -> ObsRequest {
    set_filter_settings(
        source_name,
        FOCUS_FILTER,
        json!({
            "duration": time_ms,
            "Filter.Blur.StepScale.X": blur,
            "Filter.Blur.StepScale.Y": blur,
        }),
    )
}

/// Sources in `targets` transition to their blur over `time_ms`. Any target
/// ending up below the "off" threshold gets its blur filter switched off
/// after the transition.
fn blur_batch(time_ms: u64, targets: &[(&[&str], f64)]) -> Vec<ObsRequest> {
    let mut batch: Vec<ObsRequest> = targets
        .iter()
        .flat_map(|(sources, _)| sources.iter())
        .map(|source| set_filter_enabled(source, BLUR_FILTER, true))
        .collect();
    for (sources, blur) in targets {
        batch.extend(
            sources
                .iter()
                .map(|source| focus_settings(source, time_ms, *blur)),
        );
    }
    batch.extend(
        targets
            .iter()
            .flat_map(|(sources, _)| sources.iter())
            .map(|source| set_filter_enabled(source, FOCUS_FILTER, true)),
    );

    for (sources, blur) in targets {
        if *blur < BLUR_OFF_THRESHOLD {
            batch.push(ObsRequest::Sleep {
                millis: time_ms + 50,
            });
            batch.extend(
                sources
                    .iter()
                    .map(|source| set_filter_enabled(source, BLUR_FILTER, false)),
            );
        }
    }
    batch
}

/// Blurs the facecam (and its mask) to `blur` over `time_ms`.
pub fn timed_face_blur(time_ms: u64, blur: f64) -> Vec<ObsRequest> {
    let face = blur.max(MIN_BLUR);
    blur_batch(time_ms, &[(FACE_SOURCES, face)])
}

/// Blurs the facecam to `blur` and the facecam background to the inverse,
/// `100 - blur`, over `time_ms`.
pub fn timed_blur(time_ms: u64, blur: f64) -> Vec<ObsRequest> {
    let face = blur.max(MIN_BLUR);
    let background = (100.0 - blur).max(MIN_BLUR);
    blur_batch(
        time_ms,
        &[(FACE_SOURCES, face), (BACKGROUND_SOURCES, background)],
    )
}

/// Tints the colour-change facecam copy.
pub fn color_change(color: Rgb) -> Vec<ObsRequest> {
    let Rgb(r, g, b) = color;
    vec![
        set_filter_settings(
            COLOR_CHANGE_SOURCE,
            "Color Correction",
            json!({ "color_multiply": color.to_obs_bgr() }),
        ),
        set_filter_settings(
            COLOR_CHANGE_SOURCE,
            "Color Change Mask",
            json!({
                "Color[0]": r,
                "Color[1]": g,
                "Color[2]": b,
            }),
        ),
    ]
}
