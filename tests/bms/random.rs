use bms_chart::prelude::*;
use pretty_assertions::assert_eq;

use super::{lane_sounds, warnings};

const BRANCHES: &str = r"
    #BPM 120
    #TOTAL 300
    #WAV01 a.wav
    #WAV02 b.wav
    #RANDOM 2
    #IF 1
    #00111:01
    #ENDIF
    #IF 2
    #00112:02
    #ENDIF
    #ENDRANDOM
";

#[test]
fn explicit_choice_selects_branch() {
    let first = decode_bms_str(
        BRANCHES,
        &DecodeConfig::default().with_random(vec![1]),
        RngMock([2]),
    );
    let chart = first.chart.unwrap();
    assert_eq!(lane_sounds(&chart, 0), vec![(2_000_000, Some(0))]);
    assert_eq!(lane_sounds(&chart, 1), vec![]);

    let second = decode_bms_str(
        BRANCHES,
        &DecodeConfig::default().with_random(vec![2]),
        RngMock([1]),
    );
    let chart = second.chart.unwrap();
    assert_eq!(lane_sounds(&chart, 0), vec![]);
    assert_eq!(lane_sounds(&chart, 1), vec![(2_000_000, Some(1))]);
}

#[test]
fn sampled_values_replay_the_chart() {
    let sampled = decode_bms_str(BRANCHES, &DecodeConfig::default(), RngMock([2]));
    let chart = sampled.chart.unwrap();
    assert_eq!(chart.random, vec![2]);
    assert!(sampled.log.iter().any(|entry| {
        entry.message == LogMessage::Info(DecodeInfo::BranchSampled { max: 2, value: 2 })
    }));

    let replayed = decode_bms_str(
        BRANCHES,
        &DecodeConfig::default().with_random(chart.random.clone()),
        RngMock([1]),
    );
    assert_eq!(replayed.chart.unwrap().timelines, chart.timelines);
}

#[test]
fn generator_decodes_other_variants() {
    let output = decode_bms(BRANCHES.as_bytes(), &DecodeConfig::default(), RngMock([1]));
    let generator = output.generator.unwrap();
    assert_eq!(generator.random_ranges(), &[2]);

    let variant = generator.generate(&[2]);
    assert_eq!(variant.generator, None);
    let chart = variant.chart.unwrap();
    assert_eq!(chart.random, vec![2]);
    assert_eq!(lane_sounds(&chart, 1), vec![(2_000_000, Some(1))]);
}

#[test]
fn nested_random_follows_outer_choice() {
    let source = r"
        #BPM 120
        #TOTAL 300
        #WAV01 a.wav
        #RANDOM 2
        #IF 1
        #RANDOM 2
        #IF 2
        #00113:01
        #ENDIF
        #ENDRANDOM
        #ENDIF
        #IF 2
        #00114:01
        #ENDIF
        #ENDRANDOM
    ";
    let output = decode_bms_str(source, &DecodeConfig::default(), RngMock([1, 2]));
    let chart = output.chart.unwrap();
    assert_eq!(chart.random, vec![1, 2]);
    assert_eq!(lane_sounds(&chart, 2), vec![(2_000_000, Some(0))]);
    assert_eq!(lane_sounds(&chart, 3), vec![]);
}

#[test]
fn stray_directives_warn() {
    let source = r"
        #BPM 120
        #TOTAL 300
        #IF 1
        #ENDIF
        #ENDRANDOM
        #RANDOM 0
    ";
    let output = decode_bms_str(source, &DecodeConfig::default(), RngMock([1]));
    assert_eq!(
        warnings(&output.log),
        vec![
            DecodeWarning::IfWithoutRandom,
            DecodeWarning::UnbalancedEndIf,
            DecodeWarning::UnbalancedEndRandom,
            DecodeWarning::InvalidRandom {
                argument: "0".to_string()
            },
        ]
    );
    assert!(output.chart.is_some());
}
