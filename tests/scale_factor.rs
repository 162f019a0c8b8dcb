use esrgan_upscale::UpscaleError;
use esrgan_upscale::plan::{
    FrameSize, MAX_SCALE_STEPS, ResolutionPolicy, SCALE_STEP, VideoDimensions, find_scale_factor,
    plan,
};
use proptest::prelude::*;

/// Exhaustively checks every candidate the search is allowed to try.
fn has_even_candidate(source: VideoDimensions, min_scale: f64, target: FrameSize) -> bool {
    (0..=MAX_SCALE_STEPS).any(|step| {
        let frame = source.scaled(min_scale + f64::from(step) * SCALE_STEP);
        frame.is_even() && frame.covers(target)
    })
}

proptest! {
    #[test]
    fn scale_factor_lands_on_even_frame_or_reports_cap(
        width in 1u32..4000,
        height in 1u32..4000,
        min_scale in 1.0f64..8.0,
    ) {
        let source = VideoDimensions::new(width, height).unwrap();
        let target = source.scaled(min_scale);

        match find_scale_factor(source, min_scale, target) {
            Ok(scale) => {
                prop_assert!(scale >= min_scale);
                let frame = source.scaled(scale);
                prop_assert_eq!(frame.width % 2, 0);
                prop_assert_eq!(frame.height % 2, 0);

                let steps = (scale - min_scale) / SCALE_STEP;
                prop_assert!((steps - steps.round()).abs() < 1e-6);
            }
            Err(err) => {
                prop_assert!(matches!(err, UpscaleError::Planning(_)), "unexpected error: {}", err);
                prop_assert!(!has_even_candidate(source, min_scale, target));
            }
        }
    }
}

#[test]
fn already_even_frame_is_returned_unchanged() {
    let source = VideoDimensions::new(1280, 720).unwrap();
    let target = FrameSize {
        width: 2560,
        height: 1440,
    };
    assert_eq!(find_scale_factor(source, 2.0, target).unwrap(), 2.0);
}

#[test]
fn edge_with_fixed_parity_hits_step_cap() {
    // 200 px grows by exactly 2 px per step, so 201.56 stays odd forever.
    let source = VideoDimensions::new(200, 200).unwrap();
    let min_scale = 1.0078125;
    let target = source.scaled(min_scale);
    assert_eq!(target.width, 201);

    let err = find_scale_factor(source, min_scale, target).unwrap_err();
    assert!(matches!(err, UpscaleError::Planning(_)));
}

#[test]
fn plan_reports_cap_for_pathological_source() {
    let source = VideoDimensions::new(22, 1200).unwrap();
    let err = plan(source, ResolutionPolicy::Fhd).unwrap_err();
    assert!(matches!(err, UpscaleError::Planning(_)), "unexpected error: {err}");
    assert!(err.to_string().contains("22x1200"));
}

#[test]
fn non_finite_minimum_is_a_planning_error() {
    let source = VideoDimensions::new(640, 360).unwrap();
    let target = FrameSize {
        width: 1280,
        height: 720,
    };
    assert!(matches!(
        find_scale_factor(source, f64::NAN, target),
        Err(UpscaleError::Planning(_))
    ));
}
