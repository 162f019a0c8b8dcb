use esrgan_upscale::UpscaleError;
use esrgan_upscale::plan::{
    FrameSize, Orientation, ResolutionPolicy, VideoDimensions, minimum_scale, plan,
};

fn dims(width: u32, height: u32) -> VideoDimensions {
    VideoDimensions::new(width, height).expect("valid dimensions")
}

#[test]
fn portrait_source_gets_portrait_4k_target() {
    let plan = plan(dims(1080, 1920), ResolutionPolicy::FourK).unwrap();
    assert_eq!((plan.final_width, plan.final_height), (2160, 3840));
    assert_eq!(plan.scale_factor, 2.0);
}

#[test]
fn square_source_gets_square_target() {
    let plan = plan(dims(1000, 1000), ResolutionPolicy::Fhd).unwrap();
    assert_eq!((plan.final_width, plan.final_height), (1920, 1920));
    let raw = plan.raw_frame();
    assert!(raw.is_even());
    assert!(raw.covers(plan.final_size()));
}

#[test]
fn relative_policy_never_adjusts_orientation() {
    let plan = plan(dims(1080, 1920), ResolutionPolicy::Double).unwrap();
    assert_eq!((plan.final_width, plan.final_height), (2160, 3840));
    assert!(!plan.requires_crop());

    let square = esrgan_upscale::plan(dims(500, 500), ResolutionPolicy::Triple).unwrap();
    assert_eq!((square.final_width, square.final_height), (1500, 1500));
}

#[test]
fn landscape_source_keeps_nominal_target() {
    let plan = plan(dims(1920, 1080), ResolutionPolicy::TwoK).unwrap();
    assert_eq!((plan.final_width, plan.final_height), (2560, 1440));
    assert!(plan.requires_crop());
}

#[test]
fn hd_to_4k_uses_exact_factor_and_no_offset() {
    let plan = plan(dims(1280, 720), ResolutionPolicy::FourK).unwrap();
    assert_eq!((plan.final_width, plan.final_height), (3840, 2160));
    assert_eq!(plan.scale_factor, 3.0);
    assert_eq!(
        plan.raw_frame(),
        FrameSize {
            width: 3840,
            height: 2160
        }
    );
    assert_eq!(plan.crop_offsets(), (0, 0));
}

#[test]
fn uneven_aspect_ratio_is_padded_to_even_frame() {
    let source = dims(1366, 768);
    let plan = plan(source, ResolutionPolicy::FourK).unwrap();
    let min = minimum_scale(
        source,
        FrameSize {
            width: 3840,
            height: 2160,
        },
    );
    assert!(plan.scale_factor >= min);
    let raw = plan.raw_frame();
    assert!(raw.is_even(), "raw frame {raw} must be even");
    assert!(raw.covers(plan.final_size()));

    let (x, y) = plan.crop_offsets();
    assert_eq!(x, (raw.width - 3840) / 2);
    assert_eq!(y, (raw.height - 2160) / 2);
}

#[test]
fn odd_source_with_relative_policy_still_even() {
    let plan = plan(dims(641, 361), ResolutionPolicy::Triple).unwrap();
    assert_eq!((plan.final_width, plan.final_height), (1923, 1083));
    assert!(plan.scale_factor > 3.0);
    assert!(plan.raw_frame().is_even());
}

#[test]
fn zero_dimensions_are_rejected() {
    assert!(matches!(
        VideoDimensions::new(0, 720),
        Err(UpscaleError::Input(_))
    ));

    let bogus = VideoDimensions {
        width: 1280,
        height: 0,
    };
    assert!(matches!(
        plan(bogus, ResolutionPolicy::FourK),
        Err(UpscaleError::Input(_))
    ));
}

#[test]
fn every_policy_produces_even_frame_for_common_sources() {
    let sources = [dims(1280, 720), dims(720, 1280), dims(854, 480), dims(640, 640)];
    for source in sources {
        for policy in ResolutionPolicy::ALL {
            let plan = plan(source, policy).unwrap();
            let raw = plan.raw_frame();
            assert!(raw.is_even(), "{policy} on {source} gave {raw}");
            assert!(raw.covers(plan.final_size()), "{policy} on {source} gave {raw}");
        }
    }
}

#[test]
fn orientation_and_parsing() {
    assert_eq!(dims(1920, 1080).orientation(), Orientation::Landscape);
    assert_eq!(dims(1080, 1920).orientation(), Orientation::Portrait);
    assert_eq!(dims(720, 720).orientation(), Orientation::Square);

    let parsed: VideoDimensions = "1280x720".parse().unwrap();
    assert_eq!(parsed, dims(1280, 720));
    assert!("1280".parse::<VideoDimensions>().is_err());
    assert!("0x720".parse::<VideoDimensions>().is_err());
}

#[test]
fn plan_serializes_with_policy_names() {
    let plan = plan(dims(1280, 720), ResolutionPolicy::Fhd).unwrap();
    let value = serde_json::to_value(plan).unwrap();
    assert_eq!(value["policy"], "FHD");
    assert_eq!(value["source"]["width"], 1280);
    assert_eq!(value["final_height"], 1080);
}
